pub mod models;
pub mod provider;

pub use provider::YouTubeProvider;
