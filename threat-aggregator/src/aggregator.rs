use crate::classifier::ThreatClassifier;
use crate::config::AppConfig;
use crate::pipeline::IngestionPipeline;
use crate::store::ThreatStore;
use crate::types::{DashboardData, Result, ScanReport, Severity, ThreatRecord, ThreatStats};
use crate::Fetcher;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct ThreatAggregator {
    store: Arc<ThreatStore>,
    pipeline: Mutex<IngestionPipeline>,
    recent_limit: usize,
}

impl ThreatAggregator {
    pub fn new(store: Arc<ThreatStore>, pipeline: IngestionPipeline, recent_limit: usize) -> Self {
        Self {
            store,
            pipeline: Mutex::new(pipeline),
            recent_limit,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(ThreatStore::new(&config.database_url).await?);
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let classifier = ThreatClassifier::from_seed_option(config.classifier_seed);

        let pipeline = IngestionPipeline::from_config(
            &config.scan,
            fetcher,
            store.clone(),
            Box::new(classifier),
        );

        info!(
            "Aggregator ready with {} sources",
            pipeline.source_names().len()
        );
        Ok(Self::new(store, pipeline, config.recent_limit))
    }

    /// Run one ingestion pass. Concurrent callers queue up behind each
    /// other; scans never overlap.
    pub async fn scan(&self) -> Result<ScanReport> {
        let mut pipeline = self.pipeline.lock().await;
        pipeline.scan().await
    }

    pub async fn stats(&self) -> Result<ThreatStats> {
        let records = self.store.all().await?;
        Ok(compute_stats(&records))
    }

    /// Most recent records, capped at the configured limit.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ThreatRecord>> {
        self.store.recent(limit.min(self.recent_limit)).await
    }

    pub async fn dashboard(&self) -> Result<DashboardData> {
        let threats = self.store.recent(self.recent_limit).await?;
        let stats = self.stats().await?;
        Ok(DashboardData { stats, threats })
    }
}

/// Summary figures over every record, not just the recent window.
pub fn compute_stats(records: &[ThreatRecord]) -> ThreatStats {
    let mut stats = ThreatStats {
        total: records.len() as u64,
        ..ThreatStats::default()
    };

    let mut score_sum: u64 = 0;
    for record in records {
        if record.severity == Severity::Critical {
            stats.critical += 1;
        }
        score_sum += u64::from(record.threat_score);
        *stats
            .types
            .entry(record.threat_type.label().to_string())
            .or_insert(0) += 1;
    }

    stats.avg_score = rounded_mean(score_sum, stats.total);
    stats
}

/// `sum / count` rounded to the nearest integer, ties to even; 0 for an
/// empty set.
pub fn rounded_mean(sum: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }

    let quotient = sum / count;
    let twice_remainder = (sum % count) * 2;

    if twice_remainder > count || (twice_remainder == count && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
