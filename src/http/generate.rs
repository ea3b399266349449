use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{State, rejection::JsonRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::Response,
};
use futures_util::stream::{Stream, StreamExt as _};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    foundation::error::{CountdownError, CountdownResult},
    format::OutputFormat,
    http::{errors::ApiError, state::ServiceState},
    model::GenerationRequest,
    render::pipeline::assemble,
};

/// Request body of `POST /generate`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GeneratePayload {
    pub duration: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub format: Option<String>,
}

impl GeneratePayload {
    /// Zero counts as absent, like a falsy JSON value.
    pub fn into_request(self) -> CountdownResult<GenerationRequest> {
        let present = |v: Option<f64>| v.filter(|v| *v != 0.0);
        let (Some(duration), Some(width), Some(height)) = (
            present(self.duration),
            present(self.width),
            present(self.height),
        ) else {
            return Err(CountdownError::MissingParameter);
        };

        let format: OutputFormat = self.format.as_deref().unwrap_or("mp4").parse()?;
        GenerationRequest::with_format(
            duration,
            pixel_dimension("width", width)?,
            pixel_dimension("height", height)?,
            format,
        )
    }
}

fn pixel_dimension(name: &str, value: f64) -> CountdownResult<u32> {
    if value.fract() != 0.0 || value < 1.0 || value > f64::from(u32::MAX) {
        return Err(CountdownError::validation(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    Ok(value as u32)
}

pub(crate) async fn generate(
    State(state): State<Arc<ServiceState>>,
    payload: Result<Json<GeneratePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = payload.into_request()?;

    let name_base = request.output_name_base();
    let request_id = Uuid::new_v4();
    let disk_base = state
        .generator
        .output_name_base(&format!("{name_base}-{request_id}"));
    tracing::info!(
        %request_id,
        duration_secs = request.duration_secs,
        resolution = %request.resolution,
        format = %request.format,
        "generate request accepted"
    );

    let permit = Arc::clone(&state.generations)
        .acquire_owned()
        .await
        .map_err(|e| ApiError::internal(format!("generation queue closed: {e}")))?;
    let factory = Arc::clone(&state.text);
    // The guard travels with the task output, so the file is removed even if the client goes
    // away before generation finishes.
    let output = tokio::task::spawn_blocking(move || -> CountdownResult<RemoveOnDrop> {
        let _permit = permit;
        let mut text = factory.create()?;
        assemble(&request, &disk_base, text.as_mut()).map(RemoveOnDrop)
    })
    .await
    .map_err(|e| ApiError::internal(format!("generation task failed: {e}")))??;

    let file = tokio::fs::File::open(output.path()).await.map_err(|e| {
        ApiError::from(CountdownError::Other(anyhow::anyhow!(
            "open generated file '{}': {e}",
            output.path().display()
        )))
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, request.format.mime_type())
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", request.file_name(&name_base)),
        )
        .body(Body::from_stream(stream_then_remove(file, output)))
        .map_err(|e| ApiError::internal(format!("build response: {e}")))
}

/// Per-request output file, deleted when dropped.
struct RemoveOnDrop(PathBuf);

impl RemoveOnDrop {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.0.display(), error = %e, "failed to remove served file");
        }
    }
}

/// Stream `file`; the guarded path is removed once the stream is dropped, i.e. after the body
/// was sent or the client disconnected.
fn stream_then_remove(
    file: tokio::fs::File,
    guard: RemoveOnDrop,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    ReaderStream::new(file).map(move |chunk| {
        let _guard = &guard;
        chunk
    })
}
