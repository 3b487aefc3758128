use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Accepts a multipart upload with an `image` field and returns the model's
/// inventory analysis as JSON.
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Expected a multipart form upload: {}", e))
    })?;

    let image = read_image_field(&mut multipart).await?;

    tracing::info!(size = image.len(), "Analyzing uploaded image");

    let analysis = state.relay.analyze(&image).await.map_err(|e| {
        tracing::error!(error = %e, "Image analysis failed");
        AppError::from(e)
    })?;

    tracing::info!("Image analysis succeeded");
    Ok(Json(analysis))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        if field.file_name() == Some("") {
            return Err(AppError::BadRequest(anyhow::anyhow!("No file selected")));
        }

        return field.bytes().await.map_err(multipart_error);
    }

    Err(AppError::BadRequest(anyhow::anyhow!(
        "No image file provided"
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(
            "Failed to read multipart body: {}",
            err.body_text()
        ))
    }
}
