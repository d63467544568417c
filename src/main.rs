use axum::extract::State;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

mod account;
mod auth;
mod bookings;
mod config;
mod db;
mod error;
mod models;
mod payment_methods;
mod payments;
mod pricing;
mod schema;
mod spots;
mod store;
mod waitlist;

#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub pool: db::DbPool,
    pub stripe: payments::StripeGateway,
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "stripe": if state.stripe.is_configured() { "configured" } else { "not configured" },
    }))
}

async fn stripe_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "publishableKey": state.config.stripe_publishable_key }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = config::AppConfig::load()?;
    let pool = db::init_pool(&config.database_url)?;
    let stripe = payments::StripeGateway::new(&config.stripe_secret_key);
    log::info!(
        "Stripe {}",
        if stripe.is_configured() { "configured" } else { "NOT configured" }
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState { config, pool, stripe };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/stripe/config", get(stripe_config))
        .route("/api/auth/register", post(account::register))
        .route("/api/auth/login", post(account::login))
        .route("/api/auth/update-profile", patch(account::update_profile))
        .route("/api/auth/change-password", post(account::change_password))
        .route("/api/auth/delete-account", delete(account::delete_account))
        .route("/api/spots/search", get(spots::search))
        .route("/api/spots", post(spots::create))
        .route("/api/spots/my-spaces", get(spots::my_spaces))
        .route("/api/spots/:id", get(spots::get_one).put(spots::update))
        .route("/api/spots/:id/toggle", patch(spots::toggle))
        .route("/api/bookings", get(bookings::list_mine))
        .route(
            "/api/bookings/create-payment-intent",
            post(bookings::create_payment_intent),
        )
        .route("/api/bookings/confirm", post(bookings::confirm))
        .route("/api/bookings/:id/cancel", post(bookings::cancel))
        .route("/api/bookings/:id/extend", post(bookings::extend))
        .route("/api/bookings/owner/:user_id", get(bookings::owner_bookings))
        .route(
            "/api/payment-methods",
            get(payment_methods::list).post(payment_methods::add),
        )
        .route("/api/payment-methods/:id", delete(payment_methods::remove))
        .route(
            "/api/payment-methods/:id/set-default",
            post(payment_methods::set_default),
        )
        .route("/api/waitlist", post(waitlist::join))
        .layer(CorsLayer::permissive())
        .with_state(state);

    log::info!("Server running on {addr}");
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
