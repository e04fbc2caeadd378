use crate::traits::PullFeed;
use crate::types::{FeedSourceSpec, ParsedEntry, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// RSS/Atom feed reached over HTTP
pub struct RssFeedSource {
    spec: FeedSourceSpec,
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
    max_entries: usize,
}

impl RssFeedSource {
    pub fn new(spec: FeedSourceSpec, fetcher: Arc<Fetcher>, max_entries: usize) -> Self {
        Self {
            spec,
            fetcher,
            parser: FeedParser::new(),
            max_entries,
        }
    }
}

#[async_trait]
impl PullFeed for RssFeedSource {
    fn source_name(&self) -> &str {
        &self.spec.name
    }

    fn feed_url(&self) -> &str {
        &self.spec.url
    }

    async fn pull(&self) -> Result<Vec<ParsedEntry>> {
        info!("Pulling RSS feed {}: {}", self.spec.name, self.spec.url);

        let content = self.fetcher.fetch_feed(&self.spec.url).await?;
        let parsed_feed = self.parser.parse_feed(&content)?;

        let mut entries = parsed_feed.entries;
        entries.truncate(self.max_entries);

        info!(
            "Pulled {} entries from {} ({})",
            entries.len(),
            self.spec.name,
            parsed_feed.title.as_deref().unwrap_or("untitled feed")
        );
        Ok(entries)
    }
}
