use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState, uploads::services};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload (multipart, single `image` field)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("unreadable image field: {}", e)))?;
        if data.is_empty() {
            return Err(ApiError::validation("image file is empty"));
        }

        let url = services::store_image(&state, user_id, data, &content_type).await?;
        info!(owner_id = %user_id, url = %url, "image uploaded");
        return Ok(Json(UploadResponse { url }));
    }

    warn!("upload without image field");
    Err(ApiError::validation("image field is required"))
}
