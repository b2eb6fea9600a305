use crate::models::Video;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Unique identifier (e.g., "youtube")
    fn id(&self) -> &str;

    /// User-friendly name
    fn name(&self) -> &str;

    /// Search for videos matching a single term.
    ///
    /// `max_results` is the page size to request (the aggregator never asks
    /// for more than 20). `prefer_new` biases results toward recent uploads
    /// without discarding relevance ordering.
    async fn search(&self, term: &str, max_results: u32, prefer_new: bool) -> Result<Vec<Video>>;
}
