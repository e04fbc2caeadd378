use crate::types::{Classification, Classifier, Sector, Severity, ThreatType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct KeywordRule<T> {
    keywords: &'static [&'static str],
    value: T,
}

/// Type keywords in priority order; the first rule with a hit wins.
const TYPE_RULES: &[KeywordRule<ThreatType>] = &[
    KeywordRule { keywords: &["ransomware"], value: ThreatType::Ransomware },
    KeywordRule { keywords: &["phishing"], value: ThreatType::Phishing },
    KeywordRule { keywords: &["ddos"], value: ThreatType::DDoS },
    KeywordRule { keywords: &["cve", "vulnerability"], value: ThreatType::Vulnerability },
    KeywordRule { keywords: &["botnet"], value: ThreatType::Botnet },
    KeywordRule { keywords: &["leak", "breach"], value: ThreatType::DataBreach },
];

/// Severity groups in priority order, with the score bonus each one adds.
/// Only the first matching group ever applies.
const SEVERITY_RULES: &[KeywordRule<(Severity, u8)>] = &[
    KeywordRule {
        keywords: &["zero-day", "rce", "critical", "exploit", "active attack", "unpatched"],
        value: (Severity::Critical, 50),
    },
    KeywordRule {
        keywords: &["malware", "backdoor", "root", "admin", "bank", "password"],
        value: (Severity::High, 30),
    },
    KeywordRule { keywords: &["update", "patch"], value: (Severity::Medium, 10) },
];

const SECTOR_RULES: &[KeywordRule<Sector>] = &[
    KeywordRule { keywords: &["bank", "finance"], value: Sector::Finance },
    KeywordRule { keywords: &["hospital", "health"], value: Sector::Healthcare },
    KeywordRule { keywords: &["government", "federal"], value: Sector::Government },
];

pub const BASE_SCORE_MIN: u8 = 10;
pub const BASE_SCORE_MAX: u8 = 40;
pub const MAX_SCORE: u8 = 100;

fn first_match<T: Copy>(text: &str, rules: &[KeywordRule<T>]) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
        .map(|rule| rule.value)
}

pub fn detect_type(text: &str) -> ThreatType {
    first_match(text, TYPE_RULES).unwrap_or(ThreatType::General)
}

pub fn detect_sector(text: &str) -> Sector {
    first_match(text, SECTOR_RULES).unwrap_or(Sector::General)
}

/// Severity bucket and score bonus for already lowercased text.
pub fn detect_severity(text: &str) -> (Severity, u8) {
    first_match(text, SEVERITY_RULES).unwrap_or((Severity::Low, 0))
}

/// Classify with a caller-supplied base score (the random noise component).
pub fn classify_with_base(title: &str, summary: &str, base_score: u8) -> Classification {
    let text = format!("{} {}", title, summary).to_lowercase();

    let threat_type = detect_type(&text);
    let (severity, bonus) = detect_severity(&text);
    let threat_score = base_score.saturating_add(bonus).min(MAX_SCORE);
    let target_sector = detect_sector(&text);

    Classification {
        threat_type,
        severity,
        threat_score,
        target_sector,
    }
}

/// Keyword classifier. The base score is drawn uniformly from
/// `BASE_SCORE_MIN..=BASE_SCORE_MAX`, so two calls with the same article
/// can disagree on the score unless the random source is seeded.
pub struct ThreatClassifier<R: Rng = StdRng> {
    rng: R,
}

impl ThreatClassifier<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }
}

impl Default for ThreatClassifier<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ThreatClassifier<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn classify(&mut self, title: &str, summary: &str) -> Classification {
        let base = self.rng.gen_range(BASE_SCORE_MIN..=BASE_SCORE_MAX);
        classify_with_base(title, summary, base)
    }
}

impl<R: Rng> Classifier for ThreatClassifier<R> {
    fn classify(&mut self, title: &str, summary: &str) -> Classification {
        ThreatClassifier::classify(self, title, summary)
    }
}
