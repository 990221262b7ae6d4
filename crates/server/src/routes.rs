use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use deckcheck_core::{
    Analysis, ProgressEvent, ReportStore, RunId, RunWorkspace, Upload, REPORT_FILE_NAME,
};
use deckcheck_gemini::{GeminiClient, GeminiConfig};
use deckcheck_pptx::PptxExtractor;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Multipart field carrying the presentation.
const UPLOAD_FIELD: &str = "pptx_file";

/// Frames buffered between the analysis thread and the response body.
const FRAME_BUFFER: usize = 16;

const NOT_FOUND_MESSAGE: &str = "The report file was not found.";

#[derive(Clone)]
pub struct AppState {
    pub gemini: GeminiConfig,
    pub reports: Arc<ReportStore>,
    pub work_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("missing multipart field '{}'", UPLOAD_FIELD)]
    MissingUpload,

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Core(#[from] deckcheck_core::Error),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingUpload => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Core(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::warn!("Request failed: {}", self);
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(upload_form))
        .route("/stream", post(stream_analysis))
        .route("/stream/", post(stream_analysis))
        .route("/download", get(download_latest))
        .route("/download/", get(download_latest))
        .route("/download/:run_id", get(download_run))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(Arc::new(state))
}

async fn upload_form() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Store the upload in a fresh run workspace, then stream the run's
/// progress frames as `text/event-stream`.
async fn stream_analysis(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let workspace = RunWorkspace::create(&state.work_dir, RunId::new())?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let display_name = field.file_name().unwrap_or("upload.pptx").to_string();
        let data = field.bytes().await?;
        let path = workspace.upload_path();
        tokio::fs::write(&path, &data).await?;

        log::info!(
            "Run {}: received {} ({} bytes)",
            workspace.run_id(),
            display_name,
            data.len()
        );
        upload = Some(Upload { display_name, path });
        break;
    }
    let upload = upload.ok_or(AppError::MissingUpload)?;

    let (tx, rx) = mpsc::channel::<String>(FRAME_BUFFER);
    let gemini = state.gemini.clone();
    let reports = state.reports.clone();
    tokio::task::spawn_blocking(move || run_analysis(upload, workspace, gemini, reports, tx));

    let frames = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (Ok::<_, Infallible>(frame), rx))
    });

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(frames),
    )
        .into_response())
}

/// Drive one run on a blocking thread, forwarding each event as a frame.
///
/// Stops as soon as the receiving side is gone; dropping the run removes
/// its workspace.
fn run_analysis(
    upload: Upload,
    workspace: RunWorkspace,
    gemini: GeminiConfig,
    reports: Arc<ReportStore>,
    tx: mpsc::Sender<String>,
) {
    let run_id = workspace.run_id();
    let client = match GeminiClient::new(gemini) {
        Ok(client) => client,
        Err(e) => {
            let _ = tx.blocking_send(ProgressEvent::Failed(e.to_string()).to_frame());
            return;
        }
    };

    let analysis = Analysis::new(upload, workspace, PptxExtractor::new(), client, reports);
    for event in analysis {
        if tx.blocking_send(event.to_frame()).is_err() {
            log::info!("Run {}: client disconnected, stopping", run_id);
            break;
        }
    }
}

async fn download_latest(State(state): State<Arc<AppState>>) -> Response {
    match state.reports.latest() {
        Some(path) => serve_report(path).await,
        None => report_not_found(),
    }
}

async fn download_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Response {
    let path = run_id
        .parse::<RunId>()
        .ok()
        .and_then(|run_id| state.reports.report_path(run_id));

    match path {
        Some(path) => serve_report(path).await,
        None => report_not_found(),
    }
}

async fn serve_report(path: PathBuf) -> Response {
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            log::warn!("Failed to read report {}: {}", path.display(), e);
            report_not_found()
        }
    }
}

fn report_not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
}
