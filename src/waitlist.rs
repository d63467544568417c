use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::{store, AppState};

#[derive(Deserialize)]
pub struct WaitlistRequest {
    pub email: String,
}

pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<WaitlistRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    if store::waitlist_contains(&state.pool, &email)? {
        return Ok(Json(json!({ "message": "Already on waitlist" })));
    }

    store::insert_waitlist_entry(&state.pool, &email)?;
    log::info!("waitlist signup: {email}");
    Ok(Json(json!({ "message": "Added to waitlist" })))
}
