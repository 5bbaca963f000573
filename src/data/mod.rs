pub mod feed;
pub mod loader;

pub use feed::FeatureFeed;
pub use loader::FrameLoader;
