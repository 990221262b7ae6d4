//! Per-run scoping of everything an analysis writes to disk.
//!
//! Each run gets a [`RunId`]. Temporary files (the uploaded deck and the
//! decoded slide pictures) live in a [`RunWorkspace`] that is removed when
//! dropped. Reports are kept by [`ReportStore`] under the run's id.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tempfile::TempDir;
use uuid::Uuid;

/// File name the uploaded deck is stored under inside a run workspace.
const UPLOAD_FILE_NAME: &str = "upload.pptx";

/// File name of a persisted report, also used for downloads.
pub const REPORT_FILE_NAME: &str = "inconsistency_report.txt";

/// Unique identifier of one upload → analyze → report cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Temporary directory owned by a single run.
#[derive(Debug)]
pub struct RunWorkspace {
    run_id: RunId,
    dir: TempDir,
}

impl RunWorkspace {
    /// Create a fresh workspace for `run_id` under `root`.
    pub fn create(root: &Path, run_id: RunId) -> Result<Self> {
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("run-{}-", run_id))
            .tempdir_in(root)?;

        log::debug!("Created run workspace {}", dir.path().display());
        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where to store the uploaded file. The client's file name is never
    /// used on disk, so it cannot collide with extracted pictures.
    pub fn upload_path(&self) -> PathBuf {
        self.dir.path().join(UPLOAD_FILE_NAME)
    }

    /// Where to store picture `index` (0-based) of slide `slide_number`.
    pub fn image_path(&self, slide_number: usize, index: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("slide_{}_image_{}.png", slide_number, index + 1))
    }

    /// Remove the workspace now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("Removed run workspace {}", path.display());
        Ok(())
    }
}

/// Persists final reports, one per run.
#[derive(Debug)]
pub struct ReportStore {
    root: PathBuf,
    latest: Mutex<Option<PathBuf>>,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            latest: Mutex::new(None),
        }
    }

    /// Write the report for `run_id` and mark it as the latest one.
    pub fn save(&self, run_id: RunId, content: &str) -> Result<PathBuf> {
        let dir = self.root.join(run_id.to_string());
        fs::create_dir_all(&dir).map_err(|e| {
            Error::ReportError(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(REPORT_FILE_NAME);
        fs::write(&path, content).map_err(|e| {
            Error::ReportError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(path.clone());
        log::info!("Report for run {} written to {}", run_id, path.display());
        Ok(path)
    }

    /// Path of the report for `run_id`, if it exists on disk.
    pub fn report_path(&self, run_id: RunId) -> Option<PathBuf> {
        let path = self.root.join(run_id.to_string()).join(REPORT_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Most recently written report of this process, if still on disk.
    pub fn latest(&self) -> Option<PathBuf> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .filter(|path| path.is_file())
    }
}
