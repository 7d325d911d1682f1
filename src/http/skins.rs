//! Skin upload endpoint
//!
//! Accepts a base64 data URL, validates the PNG dimensions, and persists
//! the image under the configured skins directory. The returned path is
//! what clients pass as the `skin` value when joining.

use axum::{extract::State, response::Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::routes::AppError;

/// Required skin dimensions in pixels
pub const SKIN_WIDTH: u32 = 90;
pub const SKIN_HEIGHT: u32 = 90;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSkinRequest {
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSkinResponse {
    pub success: bool,
    pub skin_path: String,
    pub file_name: String,
}

pub async fn save_skin_handler(
    State(state): State<AppState>,
    Json(req): Json<SaveSkinRequest>,
) -> Result<Json<SaveSkinResponse>, AppError> {
    if req.image_data.is_empty() || req.player_name.is_empty() {
        return Err(AppError::BadRequest(
            "imageData and playerName are required".to_string(),
        ));
    }

    let encoded = req
        .image_data
        .strip_prefix("data:image/png;base64,")
        .unwrap_or(&req.image_data);
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::BadRequest("invalid base64 image data".to_string()))?;

    let (width, height) = png_dimensions(&bytes)
        .map_err(|_| AppError::BadRequest("not a valid PNG image".to_string()))?;
    if (width, height) != (SKIN_WIDTH, SKIN_HEIGHT) {
        return Err(AppError::BadRequest(format!(
            "image must be exactly {SKIN_WIDTH}x{SKIN_HEIGHT} pixels, got {width}x{height}"
        )));
    }

    let file_name = format!("{}_{}.png", sanitize_name(&req.player_name), Uuid::new_v4());
    let dir = std::path::Path::new(&state.config.skins_dir);
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        error!(error = %e, "Failed to create skins directory");
        return Err(AppError::Internal("failed to save skin".to_string()));
    }
    if let Err(e) = tokio::fs::write(dir.join(&file_name), &bytes).await {
        error!(error = %e, "Failed to write skin file");
        return Err(AppError::Internal("failed to save skin".to_string()));
    }

    info!(file = %file_name, "Skin saved");
    Ok(Json(SaveSkinResponse {
        success: true,
        skin_path: format!("assets/skins/{file_name}"),
        file_name,
    }))
}

/// Read the dimensions from a PNG header
fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32), png::DecodingError> {
    let decoder = png::Decoder::new(bytes);
    let reader = decoder.read_info()?;
    let info = reader.info();
    Ok((info.width, info.height))
}

/// Uploaded names end up in filenames; keep them filesystem-safe
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "player".to_string()
    } else {
        cleaned
    }
}
