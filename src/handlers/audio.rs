use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::state::AppState;

/// Serves the pre-recorded prompts for locales the platform cannot
/// synthesize. Assets are flat files under the configured audio directory.
pub async fn serve_prompt(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::NotFound(format!("no such asset: {name}")));
    }

    let path = FsPath::new(&state.config.audio_dir).join(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response()),
        Err(e) => {
            tracing::debug!(asset = %name, error = %e, "audio asset not found");
            Err(AppError::NotFound(format!("no such asset: {name}")))
        }
    }
}
