pub mod engine;
pub mod session;

pub use engine::{SearchEngine, SearchSummary, SkipOutcome};
pub use session::SearchSession;
