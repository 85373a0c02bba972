//! Image upload.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use riviu_common::{AppError, AppResult};
use riviu_core::UploadedImage;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Upload an image from the multipart field `file`.
///
/// The media service enforces the configured size limit. The server's outer body
/// limit sits slightly above it.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadedImage>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((content_type, data.to_vec()));
    }

    let (content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let image = state
        .media_service
        .upload_image(&user.id, &content_type, &data)
        .await?;
    Ok(ApiResponse::created(image))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::disable())
}
