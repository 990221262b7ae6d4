//! Core domain types, finding classification, report consolidation and the
//! pairwise analysis pipeline for slide-deck inconsistency detection.

pub mod analysis;
pub mod classify;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod workspace;

pub use analysis::{build_comparison_prompt, PairwiseAnalyzer, PairwiseRun, SlidePairs};
pub use classify::{classify, FindingCategory, FindingDetails};
pub use error::{Error, LlmError, Result};
pub use llm::LlmClient;
pub use pipeline::{Analysis, ProgressEvent, SlideExtractor, Upload};
pub use report::consolidate;
pub use types::SlideRecord;
pub use workspace::{ReportStore, RunId, RunWorkspace, REPORT_FILE_NAME};
