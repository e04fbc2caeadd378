use crate::types::{ParsedEntry, Result};
use async_trait::async_trait;

/// Trait for pulling entries from a named feed source
#[async_trait]
pub trait PullFeed: Send + Sync {
    /// Human-readable name stored on every record this source produces
    fn source_name(&self) -> &str;

    fn feed_url(&self) -> &str;

    /// Fetch the current entries, newest-first as the feed lists them.
    /// Implementations cap the count themselves.
    async fn pull(&self) -> Result<Vec<ParsedEntry>>;
}
