use serde::Serialize;
// Use the interfaces crate for core types
pub use interfaces::defs::{
    Classification, Classifier, FeedSourceSpec, NewThreatRecord, Sector, Severity, ThreatRecord,
    ThreatStats, ThreatType, UnknownLabel,
};

/// Maximum number of characters of an entry summary that get persisted.
pub const SUMMARY_MAX_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "ThreatLens-Aggregator/1.0".to_string(),
            timeout_seconds: 5,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Static description of one scan: which feeds, and how much of each.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub sources: Vec<FeedSourceSpec>,
    pub max_entries_per_feed: usize,
}

impl ScanConfig {
    pub fn default_sources() -> Vec<FeedSourceSpec> {
        vec![
            FeedSourceSpec::new("TheHackerNews", "https://feeds.feedburner.com/TheHackersNews"),
            FeedSourceSpec::new("BleepingComputer", "https://www.bleepingcomputer.com/feed/"),
            FeedSourceSpec::new("CISA Alerts", "https://www.cisa.gov/uscert/ncas/alerts.xml"),
            FeedSourceSpec::new("ThreatPost", "https://threatpost.com/feed/"),
        ]
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sources: Self::default_sources(),
            max_entries_per_feed: 4,
        }
    }
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub summary: String,
}

/// What one source produced during a scan. A failed source contributes no
/// entries; the scan carries on with the others.
#[derive(Debug)]
pub enum SourceOutcome {
    Fetched { entries: Vec<ParsedEntry> },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub inserted: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub new_records: usize,
    pub sources: Vec<SourceReport>,
}

/// Payload behind `GET /api/data`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub stats: ThreatStats,
    pub threats: Vec<ThreatRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed size {size_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    FeedTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UnknownLabel> for AggregatorError {
    fn from(err: UnknownLabel) -> Self {
        AggregatorError::InvalidRecord(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
