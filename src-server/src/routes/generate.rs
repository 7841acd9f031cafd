//! Document generation upload endpoint.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;

use store::{ARCHIVE_FILE_NAME, ARCHIVE_MIME_TYPE};

use crate::error::AppError;
use crate::pipeline::{self, Upload};
use crate::routes::Session;
use crate::state::AppState;

/// Multipart field carrying the `.docx` template.
pub const TEMPLATE_FIELD: &str = "template";

/// Multipart field carrying the spreadsheet.
pub const DATA_FIELD: &str = "data";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/generate", post(generate))
}

/// `POST /generate`: render the template once per spreadsheet row and
/// return the zip archive as a download.
async fn generate(
    _session: Session,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut template = None;
    let mut data = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().unwrap_or_default().to_owned();
        match name.as_str() {
            TEMPLATE_FIELD => template = Some(Upload::new(file_name, field.bytes().await?)),
            DATA_FIELD => data = Some(Upload::new(file_name, field.bytes().await?)),
            _ => tracing::debug!(field = %name, "Ignoring unexpected upload field"),
        }
    }

    let template = template.ok_or_else(|| missing_field(TEMPLATE_FIELD))?;
    let data = data.ok_or_else(|| missing_field(DATA_FIELD))?;
    tracing::info!(
        template = %template.file_name,
        data = %data.file_name,
        "Received batch upload"
    );

    let work_dir = state.work_dir.clone();
    let output = tokio::task::spawn_blocking(move || pipeline::run_batch(&work_dir, &template, &data))
        .await
        .map_err(|e| AppError::Internal(format!("batch task failed: {e}")))??;

    Ok((
        [
            (CONTENT_TYPE, ARCHIVE_MIME_TYPE.to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
        ],
        output.archive,
    ))
}

fn missing_field(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing upload field \"{field}\""))
}
