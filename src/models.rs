use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Double, Integer, Nullable, Text, Timestamptz};
use serde::Serialize;

use crate::schema::{bookings, parking_spaces, users, waitlist};

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_connect_account_id: Option<String>,
    pub stripe_onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The shape of a user returned to clients: everything except credentials
/// and Stripe references.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            user_type: user.user_type.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub user_type: String,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct ParkingSpace {
    pub id: i32,
    pub owner_id: i32,
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
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSpace {
    /// Rate for the selected billing granularity; optional rates may simply
    /// not be offered for a space.
    pub fn rate(&self, rate_type: crate::pricing::RateType) -> Option<f64> {
        use crate::pricing::RateType::*;
        match rate_type {
            Hourly => Some(self.hourly_rate),
            Daily => self.daily_rate,
            Weekly => self.weekly_rate,
            Monthly => self.monthly_rate,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = parking_spaces)]
pub struct NewParkingSpace {
    pub owner_id: i32,
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
    pub available: bool,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Booking {
    pub id: i32,
    pub space_id: i32,
    pub renter_id: i32,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub rate_type: String,
    pub total_price: f64,
    /// Platform's net retained fee: 15% commission minus the platform's
    /// $0.50 donation contribution. total_price = commission_amount +
    /// veteran_donation + owner_payout.
    pub commission_amount: f64,
    pub veteran_donation: f64,
    pub owner_payout: f64,
    pub status: String,
    pub payment_status: String,
    pub stripe_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub space_id: i32,
    pub renter_id: i32,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub rate_type: String,
    pub total_price: f64,
    pub commission_amount: f64,
    pub veteran_donation: f64,
    pub owner_payout: f64,
    pub status: String,
    pub payment_status: String,
}

/// Editable fields of a space; doubles as the update request body. `None`
/// overwrites optional rates and features with NULL, mirroring a full-form
/// submit from the client.
#[derive(Debug, AsChangeset, serde::Deserialize)]
#[diesel(table_name = parking_spaces)]
#[diesel(treat_none_as_null = true)]
pub struct SpaceChanges {
    pub title: String,
    pub description: String,
    pub address: String,
    pub hourly_rate: f64,
    pub daily_rate: Option<f64>,
    pub weekly_rate: Option<f64>,
    pub monthly_rate: Option<f64>,
    pub space_type: String,
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = waitlist)]
pub struct NewWaitlistEntry {
    pub email: String,
}

/// Row shape of the haversine search query (raw SQL, see `store::search_spaces`).
#[derive(Debug, QueryableByName, Serialize)]
pub struct SpaceSearchRow {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub description: String,
    #[diesel(sql_type = Text)]
    pub address: String,
    #[diesel(sql_type = Double)]
    pub hourly_rate: f64,
    #[diesel(sql_type = Nullable<Double>)]
    pub daily_rate: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub weekly_rate: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub monthly_rate: Option<f64>,
    #[diesel(sql_type = Text)]
    pub space_type: String,
    #[diesel(sql_type = Bool)]
    pub available: bool,
    #[diesel(sql_type = Double)]
    pub latitude: f64,
    #[diesel(sql_type = Double)]
    pub longitude: f64,
    #[diesel(sql_type = Text)]
    pub owner_first_name: String,
    #[diesel(sql_type = Text)]
    pub owner_last_name: String,
    #[diesel(sql_type = Double)]
    pub distance_meters: f64,
}

/// Row shape of the owner-dashboard query (raw SQL, see `store::owner_bookings`).
#[derive(Debug, QueryableByName, Serialize)]
pub struct OwnerBookingRow {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Integer)]
    pub space_id: i32,
    #[diesel(sql_type = Integer)]
    pub user_id: i32,
    #[diesel(sql_type = Timestamptz)]
    pub start_date: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub end_date: DateTime<Utc>,
    #[diesel(sql_type = Double)]
    pub total_price: f64,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Text)]
    pub rate_type: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    pub space_title: String,
    #[diesel(sql_type = Text)]
    pub space_address: String,
    #[diesel(sql_type = Text)]
    pub renter_name: String,
    #[diesel(sql_type = Text)]
    pub renter_email: String,
}
