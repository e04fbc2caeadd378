use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch the raw body of a feed. One attempt only: a slow source is cut
    /// off by the client timeout and reported as an error.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let parsed_url = Url::parse(url)?;

        debug!("Fetching feed: {}", parsed_url);

        let response = self.client.get(parsed_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length)?;
        }

        let content = response.text().await?;
        self.check_size(content.len() as u64)?;

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }

    fn check_size(&self, size_bytes: u64) -> Result<()> {
        let limit_bytes = self.config.max_feed_size_mb as u64 * 1024 * 1024;
        if size_bytes > limit_bytes {
            return Err(AggregatorError::FeedTooLarge {
                size_bytes,
                limit_bytes,
            });
        }
        Ok(())
    }
}
