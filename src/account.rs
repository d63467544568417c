use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::models::{NewUser, PublicUser};
use crate::{store, AppState};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.is_empty()
    {
        return Err(ApiError::validation("Missing required fields"));
    }

    let email = req.email.trim().to_lowercase();
    if store::find_user_by_email(&state.pool, &email)?.is_some() {
        return Err(ApiError::validation("User already exists"));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = store::insert_user(
        &state.pool,
        NewUser {
            email,
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: req.phone,
            user_type: "driver".to_string(),
        },
    )?;

    let token = auth::create_token(user.id, &user.email, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(format!("failed to sign token: {e}")))?;

    log::info!("user registered: {}", user.email);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
            "user": PublicUser::from(&user),
        })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let email = req.email.trim().to_lowercase();
    let user = store::find_user_by_email(&state.pool, &email)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = auth::create_token(user.id, &user.email, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(format!("failed to sign token: {e}")))?;

    log::info!("user logged in: {}", user.email);
    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": PublicUser::from(&user),
    })))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::validation("First name and last name are required"));
    }

    let user = store::update_profile(
        &state.pool,
        auth.user_id,
        req.first_name.trim(),
        req.last_name.trim(),
        req.phone.as_deref(),
    )?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": PublicUser::from(&user),
    })))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.new_password.len() < 6 {
        return Err(ApiError::validation(
            "New password must be at least 6 characters",
        ));
    }

    let user = store::find_user_by_id(&state.pool, auth.user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !auth::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = auth::hash_password(&req.new_password)?;
    store::update_password(&state.pool, auth.user_id, &password_hash)?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    store::delete_user_cascade(&state.pool, auth.user_id)?;
    log::info!("account deleted: {}", auth.email);
    Ok(Json(json!({ "message": "Account deleted" })))
}
