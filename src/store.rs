//! Typed query methods over the shared connection pool. Handlers never touch
//! SQL directly except through here.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Double, Integer};

use crate::db::{DbConn, DbPool};
use crate::error::ApiError;
use crate::models::{
    Booking, NewBooking, NewParkingSpace, NewUser, NewWaitlistEntry, OwnerBookingRow,
    ParkingSpace, SpaceChanges, SpaceSearchRow, User,
};
use crate::schema::{bookings, parking_spaces, users, waitlist};

fn conn(pool: &DbPool) -> Result<DbConn, ApiError> {
    pool.get()
        .map_err(|e| ApiError::internal(format!("connection pool error: {e}")))
}

// ---- users ----

pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(users::table
        .filter(users::email.eq(email))
        .first::<User>(&mut conn)
        .optional()?)
}

pub fn find_user_by_id(pool: &DbPool, user_id: i32) -> Result<Option<User>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(users::table
        .find(user_id)
        .first::<User>(&mut conn)
        .optional()?)
}

pub fn insert_user(pool: &DbPool, new_user: NewUser) -> Result<User, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?)
}

pub fn update_profile(
    pool: &DbPool,
    user_id: i32,
    first_name: &str,
    last_name: &str,
    phone: Option<&str>,
) -> Result<User, ApiError> {
    let mut conn = conn(pool)?;
    let target = diesel::update(users::table.find(user_id));
    let user = match phone {
        Some(phone) => target
            .set((
                users::first_name.eq(first_name),
                users::last_name.eq(last_name),
                users::phone.eq(phone),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .get_result(&mut conn)?,
        None => target
            .set((
                users::first_name.eq(first_name),
                users::last_name.eq(last_name),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .get_result(&mut conn)?,
    };
    Ok(user)
}

pub fn update_password(pool: &DbPool, user_id: i32, password_hash: &str) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    diesel::update(users::table.find(user_id))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)?;
    Ok(())
}

pub fn set_stripe_customer_id(
    pool: &DbPool,
    user_id: i32,
    customer_id: &str,
) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    diesel::update(users::table.find(user_id))
        .set((
            users::stripe_customer_id.eq(customer_id),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)?;
    Ok(())
}

/// Deletes a user together with their spaces and every booking touching
/// either side, atomically. A partial failure rolls the whole cascade back.
pub fn delete_user_cascade(pool: &DbPool, user_id: i32) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let owned_spaces = parking_spaces::table
            .filter(parking_spaces::owner_id.eq(user_id))
            .select(parking_spaces::id);
        diesel::delete(bookings::table.filter(
            bookings::renter_id
                .eq(user_id)
                .or(bookings::space_id.eq_any(owned_spaces)),
        ))
        .execute(conn)?;
        diesel::delete(parking_spaces::table.filter(parking_spaces::owner_id.eq(user_id)))
            .execute(conn)?;
        let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
        if deleted == 0 {
            return Err(diesel::result::Error::NotFound);
        }
        Ok(())
    })?;
    Ok(())
}

// ---- parking spaces ----

pub fn insert_space(pool: &DbPool, new_space: NewParkingSpace) -> Result<ParkingSpace, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::insert_into(parking_spaces::table)
        .values(&new_space)
        .get_result(&mut conn)?)
}

pub fn spaces_by_owner(pool: &DbPool, owner_id: i32) -> Result<Vec<ParkingSpace>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(parking_spaces::table
        .filter(parking_spaces::owner_id.eq(owner_id))
        .order(parking_spaces::created_at.desc())
        .load(&mut conn)?)
}

pub fn find_space(pool: &DbPool, space_id: i32) -> Result<Option<ParkingSpace>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(parking_spaces::table
        .find(space_id)
        .first::<ParkingSpace>(&mut conn)
        .optional()?)
}

pub fn find_space_with_owner(
    pool: &DbPool,
    space_id: i32,
) -> Result<Option<(ParkingSpace, String, String, String)>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(parking_spaces::table
        .inner_join(users::table)
        .filter(parking_spaces::id.eq(space_id))
        .select((
            parking_spaces::all_columns,
            users::first_name,
            users::last_name,
            users::email,
        ))
        .first(&mut conn)
        .optional()?)
}

/// One reusable ownership check: absent space -> NotFound, someone else's
/// space -> Forbidden.
pub fn verify_space_owner(pool: &DbPool, space_id: i32, user_id: i32) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    let owner: Option<i32> = parking_spaces::table
        .find(space_id)
        .select(parking_spaces::owner_id)
        .first(&mut conn)
        .optional()?;
    match owner {
        None => Err(ApiError::not_found("Space not found")),
        Some(owner_id) if owner_id != user_id => {
            Err(ApiError::forbidden("Not authorized to edit this space"))
        }
        Some(_) => Ok(()),
    }
}

pub fn update_space(
    pool: &DbPool,
    space_id: i32,
    changes: &SpaceChanges,
) -> Result<ParkingSpace, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::update(parking_spaces::table.find(space_id))
        .set((changes, parking_spaces::updated_at.eq(diesel::dsl::now)))
        .get_result(&mut conn)?)
}

pub fn toggle_space(pool: &DbPool, space_id: i32) -> Result<ParkingSpace, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::update(parking_spaces::table.find(space_id))
        .set((
            parking_spaces::available.eq(diesel::dsl::not(parking_spaces::available)),
            parking_spaces::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)?)
}

/// Haversine distance per row with a bounding-box prefilter; only available
/// spaces, nearest first, capped at 50. Raw SQL because the trigonometric
/// expression is beyond the DSL.
const SEARCH_SQL: &str = r#"
SELECT * FROM (
    SELECT
        ps.id,
        ps.title,
        ps.description,
        ps.address,
        ps.hourly_rate,
        ps.daily_rate,
        ps.weekly_rate,
        ps.monthly_rate,
        ps.space_type,
        ps.available,
        ps.latitude,
        ps.longitude,
        u.first_name AS owner_first_name,
        u.last_name AS owner_last_name,
        (
            6371000 * acos(
                LEAST(1.0, GREATEST(-1.0,
                    cos(radians($1)) * cos(radians(ps.latitude)) *
                    cos(radians(ps.longitude) - radians($2)) +
                    sin(radians($1)) * sin(radians(ps.latitude))
                ))
            )
        ) AS distance_meters
    FROM parking_spaces ps
    JOIN users u ON ps.owner_id = u.id
    WHERE ps.available = true
      AND ps.latitude BETWEEN $1 - $3 AND $1 + $3
      AND ps.longitude BETWEEN $2 - $3 AND $2 + $3
) AS nearby_spots
WHERE distance_meters <= $4
ORDER BY distance_meters
LIMIT 50
"#;

pub fn search_spaces(
    pool: &DbPool,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
) -> Result<Vec<SpaceSearchRow>, ApiError> {
    let mut conn = conn(pool)?;
    // 1 degree ≈ 111km
    let radius_degrees = radius_meters / 111_000.0;
    Ok(diesel::sql_query(SEARCH_SQL)
        .bind::<Double, _>(latitude)
        .bind::<Double, _>(longitude)
        .bind::<Double, _>(radius_degrees)
        .bind::<Double, _>(radius_meters)
        .load(&mut conn)?)
}

// ---- bookings ----

pub fn insert_booking(pool: &DbPool, new_booking: NewBooking) -> Result<Booking, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::insert_into(bookings::table)
        .values(&new_booking)
        .get_result(&mut conn)?)
}

pub fn delete_booking(pool: &DbPool, booking_id: i32) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    diesel::delete(bookings::table.find(booking_id)).execute(&mut conn)?;
    Ok(())
}

pub fn find_booking_for_renter(
    pool: &DbPool,
    booking_id: i32,
    renter_id: i32,
) -> Result<Option<Booking>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(bookings::table
        .filter(bookings::id.eq(booking_id).and(bookings::renter_id.eq(renter_id)))
        .first::<Booking>(&mut conn)
        .optional()?)
}

/// Confirms only a still-pending booking; a second confirm matches no row,
/// which is what makes the operation idempotent at the call site.
pub fn confirm_booking(
    pool: &DbPool,
    booking_id: i32,
    renter_id: i32,
    payment_intent_id: &str,
) -> Result<Option<Booking>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::update(
        bookings::table.filter(
            bookings::id
                .eq(booking_id)
                .and(bookings::renter_id.eq(renter_id))
                .and(bookings::status.eq("pending")),
        ),
    )
    .set((
        bookings::status.eq("confirmed"),
        bookings::payment_status.eq("completed"),
        bookings::stripe_payment_id.eq(payment_intent_id),
        bookings::updated_at.eq(diesel::dsl::now),
    ))
    .get_result::<Booking>(&mut conn)
    .optional()?)
}

pub fn mark_cancelled(pool: &DbPool, booking_id: i32) -> Result<Booking, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::update(bookings::table.find(booking_id))
        .set((
            bookings::status.eq("cancelled"),
            bookings::payment_status.eq("refunded"),
            bookings::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)?)
}

pub fn apply_extension(
    pool: &DbPool,
    booking_id: i32,
    new_end: DateTime<Utc>,
    total_price: f64,
    commission_amount: f64,
    owner_payout: f64,
) -> Result<Booking, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::update(bookings::table.find(booking_id))
        .set((
            bookings::end_datetime.eq(new_end),
            bookings::total_price.eq(total_price),
            bookings::commission_amount.eq(commission_amount),
            bookings::owner_payout.eq(owner_payout),
            bookings::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)?)
}

pub fn bookings_for_renter(
    pool: &DbPool,
    renter_id: i32,
) -> Result<Vec<(Booking, String, String, f64, f64)>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(bookings::table
        .inner_join(parking_spaces::table)
        .filter(bookings::renter_id.eq(renter_id))
        .order(bookings::created_at.desc())
        .select((
            bookings::all_columns,
            parking_spaces::title,
            parking_spaces::address,
            parking_spaces::latitude,
            parking_spaces::longitude,
        ))
        .load(&mut conn)?)
}

const OWNER_BOOKINGS_SQL: &str = r#"
SELECT
    b.id,
    b.space_id,
    b.renter_id AS user_id,
    b.start_datetime AS start_date,
    b.end_datetime AS end_date,
    b.total_price,
    b.status,
    b.rate_type,
    b.created_at,
    ps.title AS space_title,
    ps.address AS space_address,
    CONCAT(u.first_name, ' ', u.last_name) AS renter_name,
    u.email AS renter_email
FROM bookings b
JOIN parking_spaces ps ON b.space_id = ps.id
JOIN users u ON b.renter_id = u.id
WHERE ps.owner_id = $1
ORDER BY b.created_at DESC
"#;

pub fn owner_bookings(pool: &DbPool, owner_id: i32) -> Result<Vec<OwnerBookingRow>, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::sql_query(OWNER_BOOKINGS_SQL)
        .bind::<Integer, _>(owner_id)
        .load(&mut conn)?)
}

// ---- waitlist ----

pub fn waitlist_contains(pool: &DbPool, email: &str) -> Result<bool, ApiError> {
    let mut conn = conn(pool)?;
    Ok(diesel::select(diesel::dsl::exists(
        waitlist::table.filter(waitlist::email.eq(email)),
    ))
    .get_result(&mut conn)?)
}

pub fn insert_waitlist_entry(pool: &DbPool, email: &str) -> Result<(), ApiError> {
    let mut conn = conn(pool)?;
    diesel::insert_into(waitlist::table)
        .values(NewWaitlistEntry {
            email: email.to_string(),
        })
        .execute(&mut conn)?;
    Ok(())
}
