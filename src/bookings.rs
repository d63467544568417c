//! Booking lifecycle: pending -> confirmed -> completed/cancelled.
//!
//! A booking is created in `pending` together with a Stripe payment intent,
//! confirmed once the client reports the capture, and may later be cancelled
//! (full refund, only with more than two hours of lead time) or extended
//! (incremental charge, only while the booking is active). Completion is
//! inferred from the end time; no explicit transition records it.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::NewBooking;
use crate::pricing::{self, RateType};
use crate::{store, AppState};

/// Lead time below which a cancellation is refused.
const CANCELLATION_LEAD_HOURS: i64 = 2;

fn cancellation_allowed(start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start - now > Duration::hours(CANCELLATION_LEAD_HOURS)
}

fn within_active_window(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    now >= start && now <= end
}

#[derive(Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub parking_space_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub rate_type: Option<RateType>,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> Result<Json<Value>, ApiError> {
    let space = store::find_space(&state.pool, req.parking_space_id)?
        .filter(|s| s.available)
        .ok_or_else(|| ApiError::not_found("Parking spot not available"))?;

    let rate_type = req.rate_type.unwrap_or(RateType::Hourly);
    let rate = space.rate(rate_type).ok_or_else(|| {
        ApiError::validation(format!("No {} rate configured for this space", rate_type.as_str()))
    })?;

    // Amounts are computed server-side from the stored rate, never taken
    // from the client.
    let quantity = pricing::billable_quantity(rate_type, req.start_time, req.end_time)?;
    let quote = pricing::quote_booking(rate, quantity)?;

    let booking = store::insert_booking(
        &state.pool,
        NewBooking {
            space_id: space.id,
            renter_id: auth.user_id,
            start_datetime: req.start_time,
            end_datetime: req.end_time,
            rate_type: rate_type.as_str().to_string(),
            total_price: quote.total_price,
            commission_amount: quote.platform_fee,
            veteran_donation: quote.veteran_donation,
            owner_payout: quote.owner_payout,
            status: "pending".to_string(),
            payment_status: "pending".to_string(),
        },
    )?;

    let metadata = [
        ("booking_id", booking.id.to_string()),
        ("parking_space_id", space.id.to_string()),
        ("renter_id", auth.user_id.to_string()),
    ];
    match state
        .stripe
        .create_payment_intent(pricing::to_cents(quote.total_price), &metadata)
        .await
    {
        Ok(intent) => {
            log::info!(
                "booking {} pending, payment intent {} for {} cents",
                booking.id,
                intent.id,
                pricing::to_cents(quote.total_price)
            );
            Ok(Json(json!({
                "clientSecret": intent.client_secret,
                "bookingId": booking.id,
            })))
        }
        Err(e) => {
            log::error!("payment intent failed for booking {}: {e}", booking.id);
            // Don't leave an orphaned pending booking behind.
            store::delete_booking(&state.pool, booking.id)?;
            Err(ApiError::payment("Failed to create payment intent"))
        }
    }
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub booking_id: i32,
    pub payment_intent_id: String,
}

pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(booking) =
        store::confirm_booking(&state.pool, req.booking_id, auth.user_id, &req.payment_intent_id)?
    {
        log::info!("booking {} confirmed", booking.id);
        return Ok(Json(json!(booking)));
    }

    // No pending row matched; a repeated confirm of an already-confirmed
    // booking returns the stored row untouched instead of re-charging.
    match store::find_booking_for_renter(&state.pool, req.booking_id, auth.user_id)? {
        Some(booking) if booking.status == "confirmed" => Ok(Json(json!(booking))),
        _ => Err(ApiError::not_found("Booking not found")),
    }
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let booking = store::find_booking_for_renter(&state.pool, booking_id, auth.user_id)?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if !cancellation_allowed(booking.start_datetime, Utc::now()) {
        return Err(ApiError::validation(
            "Cannot cancel within 2 hours of start time",
        ));
    }
    if booking.status == "cancelled" {
        return Err(ApiError::validation("Booking already cancelled"));
    }

    // Refund first; only a successful refund may change booking state.
    if let Some(payment_intent_id) = booking.stripe_payment_id.as_deref() {
        state
            .stripe
            .refund_payment_intent(payment_intent_id)
            .await
            .map_err(|e| {
                log::error!("refund failed for booking {booking_id}: {e}");
                ApiError::payment("Failed to process refund")
            })?;
    }

    let updated = store::mark_cancelled(&state.pool, booking.id)?;
    log::info!("booking {} cancelled and refunded", updated.id);
    Ok(Json(json!({
        "message": "Booking cancelled and refunded",
        "booking": updated,
    })))
}

#[derive(Deserialize)]
pub struct ExtendRequest {
    /// Whole rate units to add; mobile clients still send `additional_hours`.
    #[serde(alias = "additional_hours")]
    pub additional_quantity: i64,
}

pub async fn extend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<i32>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.additional_quantity < 1 {
        return Err(ApiError::validation("Invalid additional quantity"));
    }

    let booking = store::find_booking_for_renter(&state.pool, booking_id, auth.user_id)?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if !within_active_window(Utc::now(), booking.start_datetime, booking.end_datetime) {
        return Err(ApiError::validation("Can only extend active bookings"));
    }

    let space = store::find_space(&state.pool, booking.space_id)?
        .ok_or_else(|| ApiError::not_found("Space not found"))?;
    let rate_type = RateType::parse(&booking.rate_type).ok_or_else(|| {
        ApiError::internal(format!(
            "booking {} has unknown rate type {}",
            booking.id, booking.rate_type
        ))
    })?;
    let rate = space.rate(rate_type).ok_or_else(|| {
        ApiError::validation(format!("No {} rate configured for this space", rate_type.as_str()))
    })?;

    let quote = pricing::quote_extension(rate, req.additional_quantity as f64)?;

    let metadata = [
        ("booking_id", booking.id.to_string()),
        ("type", "extension".to_string()),
        ("additional_quantity", req.additional_quantity.to_string()),
    ];
    let intent = state
        .stripe
        .create_payment_intent(pricing::to_cents(quote.additional_cost), &metadata)
        .await
        .map_err(|e| {
            log::error!("extension charge failed for booking {booking_id}: {e}");
            ApiError::payment("Failed to charge for extension")
        })?;

    let new_end = booking.end_datetime + rate_type.unit() * req.additional_quantity as i32;
    let updated = store::apply_extension(
        &state.pool,
        booking.id,
        new_end,
        booking.total_price + quote.additional_cost,
        booking.commission_amount + quote.additional_platform_fee,
        booking.owner_payout + quote.additional_owner_payout,
    )?;

    log::info!(
        "booking {} extended by {} {} unit(s), intent {}",
        updated.id,
        req.additional_quantity,
        rate_type.as_str(),
        intent.id
    );
    Ok(Json(json!({
        "message": "Booking extended successfully",
        "booking": updated,
        "charged": quote.additional_cost,
    })))
}

pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let rows = store::bookings_for_renter(&state.pool, auth.user_id)?;
    let bookings: Vec<Value> = rows
        .into_iter()
        .map(|(booking, title, address, latitude, longitude)| {
            let mut value = json!(booking);
            value["parking_title"] = json!(title);
            value["parking_address"] = json!(address);
            value["latitude"] = json!(latitude);
            value["longitude"] = json!(longitude);
            value
        })
        .collect();
    Ok(Json(json!({
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

pub async fn owner_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    if user_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to view these bookings"));
    }
    let rows = store::owner_bookings(&state.pool, user_id)?;
    Ok(Json(json!(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn cancellation_needs_more_than_two_hours_of_lead_time() {
        let now = at(10, 0);
        assert!(cancellation_allowed(at(12, 30), now));
        // Exactly two hours is already too late.
        assert!(!cancellation_allowed(at(12, 0), now));
        assert!(!cancellation_allowed(at(11, 0), now));
        assert!(!cancellation_allowed(at(9, 0), now));
    }

    #[test]
    fn extension_requires_an_active_window() {
        let start = at(10, 0);
        let end = at(14, 0);
        assert!(within_active_window(at(10, 0), start, end));
        assert!(within_active_window(at(12, 0), start, end));
        assert!(within_active_window(at(14, 0), start, end));
        assert!(!within_active_window(at(9, 59), start, end));
        assert!(!within_active_window(at(14, 1), start, end));
    }
}
