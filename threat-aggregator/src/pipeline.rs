use crate::sources::RssFeedSource;
use crate::store::ThreatStore;
use crate::traits::PullFeed;
use crate::types::{
    Classifier, NewThreatRecord, ParsedEntry, Result, ScanConfig, ScanReport, SourceOutcome,
    SourceReport, SUMMARY_MAX_CHARS,
};
use crate::utils::{today_local, truncate_chars};
use crate::Fetcher;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ingestion pipeline: pulls every source, classifies unseen entries and
/// stores them in one batch per scan.
pub struct IngestionPipeline {
    sources: Vec<Box<dyn PullFeed>>,
    classifier: Box<dyn Classifier + Send + Sync>,
    store: Arc<ThreatStore>,
    max_entries_per_feed: usize,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<ThreatStore>,
        classifier: Box<dyn Classifier + Send + Sync>,
        max_entries_per_feed: usize,
    ) -> Self {
        Self {
            sources: Vec::new(),
            classifier,
            store,
            max_entries_per_feed,
        }
    }

    /// One RSS source per configured feed, all sharing the same HTTP client.
    pub fn from_config(
        scan_config: &ScanConfig,
        fetcher: Arc<Fetcher>,
        store: Arc<ThreatStore>,
        classifier: Box<dyn Classifier + Send + Sync>,
    ) -> Self {
        let mut pipeline = Self::new(store, classifier, scan_config.max_entries_per_feed);
        for spec in &scan_config.sources {
            pipeline.add_source(Box::new(RssFeedSource::new(
                spec.clone(),
                fetcher.clone(),
                scan_config.max_entries_per_feed,
            )));
        }
        pipeline
    }

    pub fn add_source(&mut self, source: Box<dyn PullFeed>) {
        info!("Registered source {} ({})", source.source_name(), source.feed_url());
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn PullFeed>) -> Self {
        self.add_source(source);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    /// Pull every source in order. Failures are logged and reported per
    /// source; they never abort the others.
    pub async fn pull_all(&self) -> Vec<(String, SourceOutcome)> {
        let mut outcomes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.source_name().to_string();
            let outcome = match source.pull().await {
                Ok(mut entries) => {
                    entries.truncate(self.max_entries_per_feed);
                    SourceOutcome::Fetched { entries }
                }
                Err(e) => {
                    warn!("Skipping source {} for this scan: {}", name, e);
                    SourceOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push((name, outcome));
        }

        outcomes
    }

    /// Run one full ingestion pass and return how many records were added.
    ///
    /// All inserts of a scan are committed together. A store error aborts
    /// the scan and the uncommitted batch is rolled back.
    pub async fn scan(&mut self) -> Result<ScanReport> {
        info!("Starting scan over {} sources", self.sources.len());

        let outcomes = self.pull_all().await;
        let mut batch = self.store.begin_scan().await?;
        let mut report = ScanReport::default();

        for (source, outcome) in outcomes {
            let entries = match outcome {
                SourceOutcome::Fetched { entries } => entries,
                SourceOutcome::Failed { reason } => {
                    report.sources.push(SourceReport {
                        source,
                        fetched: 0,
                        inserted: 0,
                        error: Some(reason),
                    });
                    continue;
                }
            };

            let fetched = entries.len();
            let mut inserted = 0;

            for entry in entries {
                if batch.exists_by_link(&entry.link).await? {
                    debug!("Already stored, skipping: {}", entry.link);
                    continue;
                }

                let record = self.build_record(&source, entry);
                let id = batch.insert(&record).await?;
                debug!(
                    "Stored record {} [{} / {} / {}]: {}",
                    id, record.threat_type, record.severity, record.threat_score, record.title
                );
                inserted += 1;
            }

            info!("Source {}: {} entries, {} new", source, fetched, inserted);
            report.sources.push(SourceReport {
                source,
                fetched,
                inserted,
                error: None,
            });
        }

        report.new_records = batch.commit().await?;
        info!("Scan finished with {} new records", report.new_records);
        Ok(report)
    }

    fn build_record(&mut self, source: &str, entry: ParsedEntry) -> NewThreatRecord {
        // Classification sees the full summary; only the stored copy is cut.
        let classification = self.classifier.classify(&entry.title, &entry.summary);

        NewThreatRecord {
            source: source.to_string(),
            summary: truncate_chars(&entry.summary, SUMMARY_MAX_CHARS),
            published_date: entry.published.unwrap_or_else(today_local),
            title: entry.title,
            link: entry.link,
            threat_type: classification.threat_type,
            severity: classification.severity,
            threat_score: classification.threat_score,
            target_sector: classification.target_sector,
        }
    }
}
