use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{NewParkingSpace, SpaceChanges};
use crate::{store, AppState};

#[derive(Deserialize)]
pub struct SearchParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) else {
        return Err(ApiError::validation("Latitude and longitude are required"));
    };
    let radius = params.radius.unwrap_or(5000.0);

    let spots = store::search_spaces(&state.pool, latitude, longitude, radius)?;
    Ok(Json(json!({
        "count": spots.len(),
        "spots": spots,
    })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(space_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let (space, owner_first_name, owner_last_name, owner_email) =
        store::find_space_with_owner(&state.pool, space_id)?
            .ok_or_else(|| ApiError::not_found("Parking spot not found"))?;

    let mut body = serde_json::to_value(&space)
        .map_err(|e| ApiError::internal(format!("failed to serialize space: {e}")))?;
    body["owner_first_name"] = json!(owner_first_name);
    body["owner_last_name"] = json!(owner_last_name);
    body["owner_email"] = json!(owner_email);
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct CreateSpaceRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub hourly_rate: f64,
    pub daily_rate: Option<f64>,
    pub weekly_rate: Option<f64>,
    pub monthly_rate: Option<f64>,
    pub space_type: String,
    pub features: Option<Vec<String>>,
}

fn validate_rates(
    hourly_rate: f64,
    optional_rates: [Option<f64>; 3],
) -> Result<(), ApiError> {
    if !(hourly_rate > 0.0) {
        return Err(ApiError::validation("Hourly rate must be greater than zero"));
    }
    for rate in optional_rates.into_iter().flatten() {
        if !(rate > 0.0) {
            return Err(ApiError::validation("Rates must be greater than zero"));
        }
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSpaceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.title.trim().is_empty()
        || req.description.trim().is_empty()
        || req.address.trim().is_empty()
        || req.space_type.trim().is_empty()
    {
        return Err(ApiError::validation("Missing required fields"));
    }
    validate_rates(
        req.hourly_rate,
        [req.daily_rate, req.weekly_rate, req.monthly_rate],
    )?;

    let (parsed_city, parsed_state, parsed_zip) = parse_address(&req.address);
    let space = store::insert_space(
        &state.pool,
        NewParkingSpace {
            owner_id: auth.user_id,
            title: req.title,
            description: req.description,
            address: req.address,
            city: req.city.or(parsed_city),
            state: req.state.or(parsed_state),
            zip_code: req.zip_code.or(parsed_zip),
            latitude: req.latitude,
            longitude: req.longitude,
            hourly_rate: req.hourly_rate,
            daily_rate: req.daily_rate,
            weekly_rate: req.weekly_rate,
            monthly_rate: req.monthly_rate,
            space_type: req.space_type,
            features: req.features,
            available: true,
        },
    )?;

    log::info!("parking space created: {} (owner {})", space.id, auth.user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Parking space created successfully",
            "space": space,
        })),
    ))
}

pub async fn my_spaces(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let spaces = store::spaces_by_owner(&state.pool, auth.user_id)?;
    Ok(Json(json!({ "spaces": spaces })))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(space_id): Path<i32>,
    Json(changes): Json<SpaceChanges>,
) -> Result<Json<Value>, ApiError> {
    store::verify_space_owner(&state.pool, space_id, auth.user_id)?;
    validate_rates(
        changes.hourly_rate,
        [changes.daily_rate, changes.weekly_rate, changes.monthly_rate],
    )?;

    let space = store::update_space(&state.pool, space_id, &changes)?;
    Ok(Json(serde_json::to_value(&space).map_err(|e| {
        ApiError::internal(format!("failed to serialize space: {e}"))
    })?))
}

pub async fn toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(space_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    store::verify_space_owner(&state.pool, space_id, auth.user_id)?;
    let space = store::toggle_space(&state.pool, space_id)?;
    Ok(Json(json!({
        "message": if space.available { "Space activated" } else { "Space deactivated" },
        "space": space,
    })))
}

/// Extracts city/state/zip from a "123 Main St, Austin, TX 78701" style
/// address. Anything that doesn't fit the pattern is left unset.
fn parse_address(address: &str) -> (Option<String>, Option<String>, Option<String>) {
    static STATE_ZIP_RE: OnceLock<Regex> = OnceLock::new();
    let re = STATE_ZIP_RE
        .get_or_init(|| Regex::new(r"([A-Z]{2})\s+(\d{5})").expect("static regex"));

    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return (None, None, None);
    }
    let city = Some(parts[1].to_string());
    let last_part = parts[parts.len() - 1];
    match re.captures(last_part) {
        Some(caps) => (
            city,
            Some(caps[1].to_string()),
            Some(caps[2].to_string()),
        ),
        None => (city, None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_address;

    #[test]
    fn full_address_yields_city_state_zip() {
        let (city, state, zip) = parse_address("123 Main St, Austin, TX 78701");
        assert_eq!(city.as_deref(), Some("Austin"));
        assert_eq!(state.as_deref(), Some("TX"));
        assert_eq!(zip.as_deref(), Some("78701"));
    }

    #[test]
    fn short_address_yields_nothing() {
        assert_eq!(parse_address("123 Main St"), (None, None, None));
        assert_eq!(parse_address("123 Main St, Austin"), (None, None, None));
    }

    #[test]
    fn missing_state_zip_still_yields_city() {
        let (city, state, zip) = parse_address("123 Main St, Austin, Texas");
        assert_eq!(city.as_deref(), Some("Austin"));
        assert_eq!(state, None);
        assert_eq!(zip, None);
    }
}
