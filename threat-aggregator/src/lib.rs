pub mod types;
pub mod classifier;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod sources;
pub mod store;
pub mod pipeline;
pub mod aggregator;
pub mod config;
pub mod server;
pub mod utils;

pub use types::*;
pub use classifier::ThreatClassifier;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::PullFeed;
pub use sources::RssFeedSource;
pub use store::{ScanBatch, ThreatStore};
pub use pipeline::IngestionPipeline;
pub use aggregator::{compute_stats, ThreatAggregator};
pub use config::AppConfig;
