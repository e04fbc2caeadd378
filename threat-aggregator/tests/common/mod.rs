#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Once};
use threat_aggregator::{
    AggregatorError, IngestionPipeline, ParsedEntry, PullFeed, Result, ThreatClassifier,
    ThreatStore,
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Canned source: always returns the same entries, or always fails.
pub struct StubSource {
    name: String,
    entries: Vec<ParsedEntry>,
    failure: Option<String>,
}

impl StubSource {
    pub fn with_entries(name: &str, entries: Vec<ParsedEntry>) -> Self {
        Self {
            name: name.to_string(),
            entries,
            failure: None,
        }
    }

    pub fn failing(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            failure: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl PullFeed for StubSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn feed_url(&self) -> &str {
        "stub://feed"
    }

    async fn pull(&self) -> Result<Vec<ParsedEntry>> {
        match &self.failure {
            Some(reason) => Err(AggregatorError::Parse(reason.clone())),
            None => Ok(self.entries.clone()),
        }
    }
}

pub fn entry(title: &str, link: &str, summary: &str) -> ParsedEntry {
    ParsedEntry {
        title: title.to_string(),
        link: link.to_string(),
        published: Some("Mon, 06 Sep 2021 16:45:00 +0000".to_string()),
        summary: summary.to_string(),
    }
}

/// `count` distinct, keyword-free entries under one link prefix.
pub fn numbered_entries(prefix: &str, count: usize) -> Vec<ParsedEntry> {
    (0..count)
        .map(|i| entry(&format!("Item {}", i), &format!("{}/{}", prefix, i), "nothing notable"))
        .collect()
}

pub async fn memory_store() -> Arc<ThreatStore> {
    Arc::new(ThreatStore::in_memory().await.expect("in-memory store"))
}

pub fn seeded_pipeline(store: Arc<ThreatStore>, max_entries: usize) -> IngestionPipeline {
    IngestionPipeline::new(store, Box::new(ThreatClassifier::seeded(42)), max_entries)
}
