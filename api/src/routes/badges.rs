use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use songdrop_render::render_badge;
use songdrop_types::{BadgeRequest, ImageBlob};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(generate))
        .route("/mint", post(mint))
}

/// Fields are optional so that an absent field maps to a 400 with a clear
/// message instead of a body deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgePayload {
    artist: Option<String>,
    track: Option<String>,
    date: Option<String>,
    background_base64: Option<String>,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BadgePayload>,
) -> Result<Json<Value>, ApiError> {
    let request = badge_request(payload)?;

    let badge = render_badge(&request, &state.assets).map_err(|e| {
        error!("Badge render failed: {}", e);
        ApiError::internal("Failed to generate badge")
    })?;

    tokio::fs::create_dir_all(&state.output_dir).await.map_err(|e| {
        error!("Could not create output directory: {}", e);
        ApiError::internal("Failed to generate badge")
    })?;
    let path = state.output_dir.join(&badge.suggested_file_name);
    tokio::fs::write(&path, &badge.image_bytes).await.map_err(|e| {
        error!("Could not write badge to {}: {}", path.display(), e);
        ApiError::internal("Failed to generate badge")
    })?;

    info!("Badge written to {}", path.display());
    Ok(Json(json!({
        "message": "Badge created",
        "file": badge.suggested_file_name,
    })))
}

async fn mint(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BadgePayload>,
) -> Result<Json<Value>, ApiError> {
    let request = badge_request(payload)?;
    info!(
        "Preparing badge for minting: {} - {}",
        request.artist, request.track
    );

    let badge = render_badge(&request, &state.assets).map_err(|e| {
        error!("Badge render failed: {}", e);
        ApiError::internal("Failed to mint NFT")
    })?;

    let minted = state.pipeline.mint_badge(&request, &badge).await.map_err(|e| {
        error!("Mint pipeline stalled at {}: {}", e.stage, e.source);
        ApiError::internal("Failed to mint NFT")
    })?;

    Ok(Json(json!({
        "message": "NFT minted",
        "tokenId": minted.token_id,
        "tokenURI": minted.token_uri,
    })))
}

fn badge_request(payload: BadgePayload) -> Result<BadgeRequest, ApiError> {
    let (artist, track, date, background) = match (
        payload.artist,
        payload.track,
        payload.date,
        payload.background_base64,
    ) {
        (Some(artist), Some(track), Some(date), Some(background))
            if !artist.is_empty()
                && !track.is_empty()
                && !date.is_empty()
                && !background.is_empty() =>
        {
            (artist, track, date, background)
        }
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };

    let (bytes, mime_type) = decode_background(&background)?;
    let request = BadgeRequest {
        artist,
        track,
        date,
        background: ImageBlob::new(bytes, mime_type),
    };
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(request)
}

/// Accept either a raw base64 payload or a `data:<mime>;base64,<payload>`
/// data URL, defaulting the mime type to PNG.
fn decode_background(data: &str) -> Result<(Vec<u8>, String), ApiError> {
    let (mime_type, payload) = match data.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((mime, payload)) if !mime.is_empty() => (mime.to_string(), payload),
            Some((_, payload)) => ("image/png".to_string(), payload),
            None => return Err(ApiError::bad_request("Background must be base64 encoded")),
        },
        None => ("image/png".to_string(), data),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::bad_request("Background is not valid base64"))?;
    Ok((bytes, mime_type))
}
