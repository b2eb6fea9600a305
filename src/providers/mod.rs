pub mod traits;

pub use traits::VideoProvider;
