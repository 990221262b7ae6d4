//! Consolidation of raw findings into the final report text.
//!
//! Findings that say nothing was found are dropped, the rest are
//! deduplicated on their [`FindingDetails`] (first occurrence wins) and
//! rendered as numbered Markdown sections.

use crate::classify::{classify, FindingDetails};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Separator lines the model sometimes inserts between findings.
static MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)--- Inconsistency \d+ ---").unwrap());

/// Phrase marking a clean comparison. Matched case-insensitively.
const NO_FINDINGS_PHRASE: &str = "no inconsistencies found";

/// Report body used when every finding was filtered out.
pub const EMPTY_REPORT: &str = "No significant inconsistencies were found in the presentation.\n";

/// Heading of a non-empty report.
pub const REPORT_HEADING: &str = "### Inconsistency Report";

/// Whether a raw finding reports a clean comparison.
pub fn is_clean(raw_finding: &str) -> bool {
    raw_finding.to_lowercase().contains(NO_FINDINGS_PHRASE)
}

/// Keep the first finding for each distinct [`FindingDetails`], in order.
pub fn unique_findings<S: AsRef<str>>(raw_findings: &[S]) -> Vec<&str> {
    let mut seen: HashSet<FindingDetails> = HashSet::new();

    raw_findings
        .iter()
        .map(AsRef::as_ref)
        .filter(|raw| !is_clean(raw))
        .filter(|raw| seen.insert(classify(raw)))
        .collect()
}

/// Remove marker lines and surrounding whitespace from a finding body.
pub fn clean_finding(raw_finding: &str) -> String {
    MARKER_REGEX.replace_all(raw_finding, "").trim().to_string()
}

/// Build the final report text from raw findings.
///
/// # Example output
/// ```text
/// ### Inconsistency Report
///
/// #### 1. Inconsistency
///
/// Slide 1 and Slide 2 disagree on revenue ($5M vs $7M).
///
/// ```
pub fn consolidate<S: AsRef<str>>(raw_findings: &[S]) -> String {
    let kept = unique_findings(raw_findings);
    if kept.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let mut report = format!("{}\n\n", REPORT_HEADING);
    for (idx, finding) in kept.iter().enumerate() {
        report.push_str(&format!("#### {}. Inconsistency\n\n", idx + 1));
        report.push_str(&clean_finding(finding));
        report.push_str("\n\n");
    }

    log::debug!(
        "Consolidated {} raw findings into {} unique findings",
        raw_findings.len(),
        kept.len()
    );

    report
}
