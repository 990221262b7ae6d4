//! Structured classification of raw model findings.
//!
//! The derived [`FindingDetails`] is the key used to decide whether two
//! findings describe the same underlying issue.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Slide references such as "Slide 3". Case-sensitive on "Slide".
static SLIDE_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Slide (\d+)").unwrap());

/// Numeric and comparative claims: "$5M", "3x faster", "40 mins",
/// "2 hours per consultant". The per-consultant form comes first so it wins
/// over the bare duration.
static KEY_DATA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\d+M|\d+x faster|\d+ min(?:ute)?s|\d+ hours? per consultant|\d+ hours?",
    )
    .unwrap()
});

/// Words marking a logical (non-numeric) finding.
const LOGICAL_MARKERS: &[&str] = &["inconsistent", "contradiction"];

/// Kind of inconsistency a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FindingCategory {
    Numerical,
    Logical,
    Unknown,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Logical => "logical",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplication key derived from one raw finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindingDetails {
    /// Canonical slide numbers mentioned in the text.
    pub slides: BTreeSet<String>,

    /// Finding category.
    pub category: FindingCategory,

    /// Matched numeric/comparative tokens, as they appear in the text.
    pub key_data: BTreeSet<String>,
}

/// Classify one raw finding. Pure and infallible.
pub fn classify(raw_text: &str) -> FindingDetails {
    let slides = SLIDE_REF_REGEX
        .captures_iter(raw_text)
        .filter_map(|caps| caps.get(1))
        .map(|m| canonical_number(m.as_str()))
        .collect();

    let key_data: BTreeSet<String> = KEY_DATA_REGEX
        .find_iter(raw_text)
        .map(|m| m.as_str().to_string())
        .collect();

    let category = if !key_data.is_empty() {
        FindingCategory::Numerical
    } else if mentions_logical_issue(raw_text) {
        FindingCategory::Logical
    } else {
        FindingCategory::Unknown
    };

    FindingDetails {
        slides,
        category,
        key_data,
    }
}

fn mentions_logical_issue(text: &str) -> bool {
    let lowered = text.to_lowercase();
    LOGICAL_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Strip leading zeros so "Slide 03" and "Slide 3" refer to the same slide.
fn canonical_number(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
