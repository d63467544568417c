//! Stored-card management, backed by Stripe customer objects. The Stripe
//! customer is created lazily on the first add and its id kept on the user
//! row.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::User;
use crate::{store, AppState};

fn require_user(state: &AppState, user_id: i32) -> Result<User, ApiError> {
    store::find_user_by_id(&state.pool, user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(&state, auth.user_id)?;

    let Some(customer_id) = user.stripe_customer_id.as_deref() else {
        return Ok(Json(json!({ "paymentMethods": [] })));
    };

    let methods = state
        .stripe
        .list_card_payment_methods(customer_id)
        .await
        .map_err(|e| {
            log::error!("listing payment methods failed for user {}: {e}", user.id);
            ApiError::payment("Failed to get payment methods")
        })?;
    let customer = state
        .stripe
        .retrieve_customer(customer_id)
        .await
        .map_err(|e| {
            log::error!("customer lookup failed for user {}: {e}", user.id);
            ApiError::payment("Failed to get payment methods")
        })?;
    let default_id = customer
        .invoice_settings
        .and_then(|settings| settings.default_payment_method);

    let formatted: Vec<Value> = methods
        .data
        .into_iter()
        .map(|pm| {
            let is_default = default_id.as_deref() == Some(pm.id.as_str());
            json!({
                "id": pm.id,
                "card": pm.card,
                "is_default": is_default,
            })
        })
        .collect();

    Ok(Json(json!({ "paymentMethods": formatted })))
}

#[derive(Deserialize)]
pub struct AddPaymentMethodRequest {
    pub payment_method_id: String,
}

pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddPaymentMethodRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(&state, auth.user_id)?;

    let customer_id = match user.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let customer = state.stripe.create_customer(&user.email).await.map_err(|e| {
                log::error!("customer creation failed for user {}: {e}", user.id);
                ApiError::payment("Failed to add payment method")
            })?;
            store::set_stripe_customer_id(&state.pool, user.id, &customer.id)?;
            customer.id
        }
    };

    state
        .stripe
        .attach_payment_method(&req.payment_method_id, &customer_id)
        .await
        .map_err(|e| {
            log::error!("attach failed for user {}: {e}", user.id);
            ApiError::payment("Failed to add payment method")
        })?;

    // The first stored card becomes the default.
    let methods = state
        .stripe
        .list_card_payment_methods(&customer_id)
        .await
        .map_err(|e| {
            log::error!("listing payment methods failed for user {}: {e}", user.id);
            ApiError::payment("Failed to add payment method")
        })?;
    if methods.data.len() == 1 {
        state
            .stripe
            .set_default_payment_method(&customer_id, &req.payment_method_id)
            .await
            .map_err(|e| {
                log::error!("setting default failed for user {}: {e}", user.id);
                ApiError::payment("Failed to add payment method")
            })?;
    }

    Ok(Json(json!({ "message": "Payment method added successfully" })))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_method_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(&state, auth.user_id)?;
    if user.stripe_customer_id.is_none() {
        return Err(ApiError::not_found("Customer not found"));
    }

    state
        .stripe
        .detach_payment_method(&payment_method_id)
        .await
        .map_err(|e| {
            log::error!("detach failed for user {}: {e}", user.id);
            ApiError::payment("Failed to remove payment method")
        })?;

    Ok(Json(json!({ "message": "Payment method removed successfully" })))
}

pub async fn set_default(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_method_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(&state, auth.user_id)?;
    let Some(customer_id) = user.stripe_customer_id.as_deref() else {
        return Err(ApiError::not_found("Customer not found"));
    };

    state
        .stripe
        .set_default_payment_method(customer_id, &payment_method_id)
        .await
        .map_err(|e| {
            log::error!("setting default failed for user {}: {e}", user.id);
            ApiError::payment("Failed to set default payment method")
        })?;

    Ok(Json(json!({ "message": "Default payment method updated" })))
}
