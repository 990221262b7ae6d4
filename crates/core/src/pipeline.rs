//! One analysis run as a lazy sequence of progress events.
//!
//! [`Analysis`] is an iterator: each call to `next` performs at most one unit
//! of work (extraction, one model call, or consolidation) and returns the
//! event describing it. The transport pulls events and forwards them, so the
//! run suspends between pulls and stops as soon as the consumer does.

use crate::analysis::{extraction_message, PairwiseAnalyzer, PairwiseRun};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::report::consolidate;
use crate::types::SlideRecord;
use crate::workspace::{ReportStore, RunId, RunWorkspace};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Terminal frame payload of a successful stream.
pub const END_OF_STREAM: &str = "END_STREAM";

/// Parses a presentation into slide records.
///
/// Pictures are written into `workspace`; the records only hold their paths.
pub trait SlideExtractor {
    fn extract(&self, path: &Path, workspace: &RunWorkspace) -> Result<Vec<SlideRecord>>;
}

impl<T: SlideExtractor + ?Sized> SlideExtractor for &T {
    fn extract(&self, path: &Path, workspace: &RunWorkspace) -> Result<Vec<SlideRecord>> {
        (**self).extract(path, workspace)
    }
}

/// One event pushed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Human-readable status line.
    Status(String),
    /// The consolidated report of a finished run.
    FinalReport { run_id: RunId, content: String },
    /// The run was aborted.
    Failed(String),
    /// The run finished successfully; nothing follows.
    EndOfStream,
}

impl ProgressEvent {
    /// Payload placed after the `data:` prefix.
    pub fn payload(&self) -> String {
        match self {
            Self::Status(message) => message.clone(),
            Self::FinalReport { run_id, content } => serde_json::json!({
                "type": "final_report",
                "content": content,
                "run_id": run_id.to_string(),
            })
            .to_string(),
            Self::Failed(cause) => format!("An unexpected error occurred: {}", cause),
            Self::EndOfStream => END_OF_STREAM.to_string(),
        }
    }

    /// Event-stream frame: `data:{payload}` followed by a blank line.
    ///
    /// Newlines inside the payload would split the frame, so status and
    /// failure messages are flattened. JSON payloads never contain raw
    /// newlines.
    pub fn to_frame(&self) -> String {
        let payload = self.payload().replace("\r\n", " ").replace(['\r', '\n'], " ");
        format!("data:{}\n\n", payload)
    }
}

/// The uploaded presentation to analyze.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name shown to the user.
    pub display_name: String,
    /// Location of the file, normally inside the run workspace.
    pub path: PathBuf,
}

enum Stage {
    Start,
    Extract,
    Compare {
        run: PairwiseRun,
    },
    Consolidate {
        findings: Vec<String>,
    },
    Deliver {
        content: String,
    },
    Finish,
    Done,
}

/// A single analysis run, driven by iteration.
pub struct Analysis<E, C> {
    upload: Upload,
    workspace: Option<RunWorkspace>,
    run_id: RunId,
    extractor: E,
    analyzer: PairwiseAnalyzer<C>,
    reports: Arc<ReportStore>,
    stage: Stage,
}

impl<E: SlideExtractor, C: LlmClient> Analysis<E, C> {
    /// Set up a run. Nothing happens until the first event is pulled.
    ///
    /// The run takes ownership of `workspace` and removes it once the
    /// final event has been produced, or when the run is dropped early.
    pub fn new(
        upload: Upload,
        workspace: RunWorkspace,
        extractor: E,
        client: C,
        reports: Arc<ReportStore>,
    ) -> Self {
        Self {
            upload,
            run_id: workspace.run_id(),
            workspace: Some(workspace),
            extractor,
            analyzer: PairwiseAnalyzer::new(client),
            reports,
            stage: Stage::Start,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    fn release_workspace(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            if let Err(e) = workspace.close() {
                log::warn!("Failed to clean up workspace of run {}: {}", self.run_id, e);
            }
        }
    }

    fn fail(&mut self, cause: String) -> ProgressEvent {
        log::error!("Run {} failed: {}", self.run_id, cause);
        self.release_workspace();
        ProgressEvent::Failed(cause)
    }

    fn extract(&self) -> Result<Vec<SlideRecord>> {
        match &self.workspace {
            Some(workspace) => self.extractor.extract(&self.upload.path, workspace),
            None => Ok(Vec::new()),
        }
    }

    fn advance(&mut self) -> Option<ProgressEvent> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Start => {
                log::info!("Run {} started for {}", self.run_id, self.upload.display_name);
                self.stage = Stage::Extract;
                Some(ProgressEvent::Status(format!(
                    "Analysis started for {}...",
                    self.upload.display_name
                )))
            }
            Stage::Extract => match self.extract() {
                Ok(slides) => {
                    log::info!("Run {} extracted {} slides", self.run_id, slides.len());
                    let message = extraction_message(slides.len());
                    self.stage = Stage::Compare {
                        run: PairwiseRun::new(slides),
                    };
                    Some(ProgressEvent::Status(message))
                }
                Err(e) => Some(self.fail(e.to_string())),
            },
            Stage::Compare { mut run } => match run.step(&self.analyzer) {
                Some(message) => {
                    self.stage = Stage::Compare { run };
                    Some(ProgressEvent::Status(message))
                }
                None => {
                    self.stage = Stage::Consolidate {
                        findings: run.into_findings(),
                    };
                    self.advance()
                }
            },
            Stage::Consolidate { findings } => {
                let content = consolidate(&findings);
                match self.reports.save(self.run_id, &content) {
                    Ok(_) => {
                        self.release_workspace();
                        self.stage = Stage::Deliver { content };
                        Some(ProgressEvent::Status(
                            "Consolidating all findings and generating final report...".to_string(),
                        ))
                    }
                    Err(e) => Some(self.fail(e.to_string())),
                }
            }
            Stage::Deliver { content } => {
                self.stage = Stage::Finish;
                Some(ProgressEvent::FinalReport {
                    run_id: self.run_id,
                    content,
                })
            }
            Stage::Finish => {
                log::info!("Run {} finished", self.run_id);
                Some(ProgressEvent::EndOfStream)
            }
            Stage::Done => None,
        }
    }
}

impl<E: SlideExtractor, C: LlmClient> Iterator for Analysis<E, C> {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
