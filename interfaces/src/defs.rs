use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {label}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Declares a closed set of labelled variants. The label is what gets
/// serialized, persisted and shown on the dashboard.
macro_rules! labelled_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownLabel { kind: $kind, label: other.to_string() }),
                }
            }
        }
    };
}

labelled_enum!(ThreatType, "threat type", {
    General => "General",
    Ransomware => "Ransomware",
    Phishing => "Phishing",
    DDoS => "DDoS",
    Vulnerability => "Vulnerability (CVE)",
    Botnet => "Botnet",
    DataBreach => "Data Breach",
});

labelled_enum!(Severity, "severity", {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

labelled_enum!(Sector, "sector", {
    General => "General",
    Finance => "Finance",
    Healthcare => "Healthcare",
    Government => "Government",
});

/// Result of running the keyword classifier over one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub threat_type: ThreatType,
    pub severity: Severity,
    pub threat_score: u8,
    pub target_sector: Sector,
}

/// A named feed the ingestion pipeline pulls from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSourceSpec {
    pub name: String,
    pub url: String,
}

impl FeedSourceSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A classified entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewThreatRecord {
    pub source: String,
    pub title: String,
    pub link: String,
    pub published_date: String,
    pub summary: String,
    pub threat_type: ThreatType,
    pub severity: Severity,
    pub threat_score: u8,
    pub target_sector: Sector,
}

/// A persisted, classified feed item. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub link: String,
    pub published_date: String,
    pub summary: String,
    pub threat_type: ThreatType,
    pub severity: Severity,
    pub threat_score: u8,
    pub target_sector: Sector,
}

impl ThreatRecord {
    pub fn from_new(id: i64, record: NewThreatRecord) -> Self {
        Self {
            id,
            source: record.source,
            title: record.title,
            link: record.link,
            published_date: record.published_date,
            summary: record.summary,
            threat_type: record.threat_type,
            severity: record.severity,
            threat_score: record.threat_score,
            target_sector: record.target_sector,
        }
    }
}

/// Aggregate figures over the whole record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatStats {
    pub total: u64,
    pub critical: u64,
    pub avg_score: u64,
    /// Only types that were actually observed appear here.
    pub types: BTreeMap<String, u64>,
}

// Object style note:
// Classifiers are driven by the ingestion pipeline one article at a time.
// They may carry state (a random source), hence `&mut self`.

pub trait Classifier {
    fn classify(&mut self, title: &str, summary: &str) -> Classification;
}
