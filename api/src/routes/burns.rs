use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use songdrop_types::{BatchStatus, SerialNumber, TokenHandle};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/burn", post(burn))
        .route("/burnAll", post(burn_all))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BurnPayload {
    token_id: Option<String>,
    serial_number: Option<SerialNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BurnAllPayload {
    token_id: Option<String>,
}

async fn burn(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BurnPayload>,
) -> Result<Json<Value>, ApiError> {
    let (token_id, serial) = match (payload.token_id, payload.serial_number) {
        (Some(token_id), Some(serial)) if !token_id.is_empty() => (token_id, serial),
        _ => {
            return Err(ApiError::bad_request(
                "tokenId and serialNumber are required",
            ))
        }
    };

    let token = TokenHandle::new(token_id);
    let status = state.lifecycle.burn_one(&token, serial).await.map_err(|e| {
        error!("Burn of {} serial {} failed: {}", token, serial, e);
        ApiError::internal("Failed to burn NFT")
    })?;

    Ok(Json(json!({
        "message": "NFT burned",
        "tokenId": token.token_id,
        "serialNumber": serial,
        "status": status,
    })))
}

async fn burn_all(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BurnAllPayload>,
) -> Result<Json<Value>, ApiError> {
    let token_id = match payload.token_id {
        Some(token_id) if !token_id.is_empty() => token_id,
        _ => return Err(ApiError::bad_request("tokenId is required")),
    };

    let token = TokenHandle::new(token_id);
    let outcomes = state.lifecycle.burn_all(&token).await.map_err(|e| {
        error!("Burn-all on {} failed: {}", token, e);
        ApiError::internal("Failed to burn all NFTs")
    })?;

    if outcomes.is_empty() {
        return Ok(Json(json!({ "message": "No NFTs to burn for this tokenId" })));
    }

    let burned: Vec<Value> = outcomes
        .iter()
        .map(|outcome| {
            let status = match &outcome.status {
                BatchStatus::Success { status } => status.clone(),
                BatchStatus::Failed { reason } => format!("FAILED: {}", reason),
            };
            json!({ "batch": outcome.serials, "status": status })
        })
        .collect();

    Ok(Json(json!({ "message": "All NFTs burned", "burned": burned })))
}
