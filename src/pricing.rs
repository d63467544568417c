//! Monetary split for bookings and extensions.
//!
//! The renter pays only `rate * quantity`; the fixed $1 veteran donation is
//! absorbed out of the 15% platform commission (half) and the owner payout
//! (half), never charged on top. Extensions carry no donation. Amounts stay
//! fractional dollars internally and become integer cents only at the Stripe
//! boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const COMMISSION_RATE: f64 = 0.15;
pub const VETERAN_DONATION: f64 = 1.00;
pub const PLATFORM_CONTRIBUTION: f64 = 0.50;
pub const OWNER_CONTRIBUTION: f64 = 0.50;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Rate must be greater than zero")]
    NonPositiveRate,
    #[error("Quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("End time must be after start time")]
    EmptyWindow,
}

/// Billing granularity selected for a booking. Determines the duration unit
/// and which space rate applies, never the commission formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl RateType {
    pub fn unit(self) -> Duration {
        match self {
            RateType::Hourly => Duration::hours(1),
            RateType::Daily => Duration::days(1),
            RateType::Weekly => Duration::weeks(1),
            // Months are billed as 30 days.
            RateType::Monthly => Duration::days(30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RateType::Hourly => "hourly",
            RateType::Daily => "daily",
            RateType::Weekly => "weekly",
            RateType::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hourly" => Some(RateType::Hourly),
            "daily" => Some(RateType::Daily),
            "weekly" => Some(RateType::Weekly),
            "monthly" => Some(RateType::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BookingQuote {
    /// What the renter is charged.
    pub total_price: f64,
    /// Gross 15% commission before the donation split.
    pub commission: f64,
    /// What the platform keeps: commission minus its $0.50 donation share.
    pub platform_fee: f64,
    pub veteran_donation: f64,
    /// What the owner receives: total minus commission minus the owner's
    /// $0.50 donation share.
    pub owner_payout: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtensionQuote {
    pub additional_cost: f64,
    pub additional_platform_fee: f64,
    pub additional_owner_payout: f64,
}

/// Split for an initial booking. `total_price == platform_fee + 0.50 + 0.50 +
/// owner_payout` holds by construction.
pub fn quote_booking(rate: f64, quantity: f64) -> Result<BookingQuote, PricingError> {
    if !(rate > 0.0) {
        return Err(PricingError::NonPositiveRate);
    }
    if !(quantity > 0.0) {
        return Err(PricingError::NonPositiveQuantity);
    }
    let total_price = rate * quantity;
    let commission = total_price * COMMISSION_RATE;
    let platform_fee = commission - PLATFORM_CONTRIBUTION;
    let owner_payout = total_price - commission - OWNER_CONTRIBUTION;
    Ok(BookingQuote {
        total_price,
        commission,
        platform_fee,
        veteran_donation: VETERAN_DONATION,
        owner_payout,
    })
}

/// Split for extending an active booking. No donation is charged on
/// extensions, so the platform keeps the full 15%.
pub fn quote_extension(rate: f64, additional_quantity: f64) -> Result<ExtensionQuote, PricingError> {
    if !(rate > 0.0) {
        return Err(PricingError::NonPositiveRate);
    }
    if !(additional_quantity > 0.0) {
        return Err(PricingError::NonPositiveQuantity);
    }
    let additional_cost = rate * additional_quantity;
    let additional_platform_fee = additional_cost * COMMISSION_RATE;
    Ok(ExtensionQuote {
        additional_cost,
        additional_platform_fee,
        additional_owner_payout: additional_cost - additional_platform_fee,
    })
}

/// Number of rate units covered by a booking window, rounded up to whole
/// units. A partial unit bills as a full one.
pub fn billable_quantity(
    rate_type: RateType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<f64, PricingError> {
    let window = end - start;
    if window <= Duration::zero() {
        return Err(PricingError::EmptyWindow);
    }
    let unit_seconds = rate_type.unit().num_seconds() as f64;
    Ok((window.num_seconds() as f64 / unit_seconds).ceil())
}

/// Rounding to integer cents happens only here, at the point of submission
/// to the payment processor.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn worked_example_six_dollar_booking() {
        let quote = quote_booking(6.0, 1.0).unwrap();
        assert_close(quote.total_price, 6.0);
        assert_close(quote.commission, 0.90);
        assert_close(quote.platform_fee, 0.40);
        assert_close(quote.owner_payout, 4.60);
        assert_close(quote.veteran_donation, 1.00);
    }

    #[test]
    fn split_identity_holds_for_a_spread_of_inputs() {
        for rate in [0.75, 2.0, 5.5, 12.0, 99.99] {
            for quantity in [1.0, 2.0, 3.0, 8.0, 24.0] {
                let q = quote_booking(rate, quantity).unwrap();
                assert_close(q.total_price, rate * quantity);
                assert_close(
                    q.total_price,
                    q.platform_fee + PLATFORM_CONTRIBUTION + OWNER_CONTRIBUTION + q.owner_payout,
                );
            }
        }
    }

    #[test]
    fn extension_charges_no_donation() {
        let quote = quote_extension(5.0, 2.0).unwrap();
        assert_close(quote.additional_cost, 10.0);
        assert_close(quote.additional_platform_fee, 1.50);
        assert_close(quote.additional_owner_payout, 8.50);
        assert_close(
            quote.additional_cost,
            quote.additional_platform_fee + quote.additional_owner_payout,
        );
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        assert_eq!(quote_booking(0.0, 2.0), Err(PricingError::NonPositiveRate));
        assert_eq!(quote_booking(-5.0, 2.0), Err(PricingError::NonPositiveRate));
        assert_eq!(
            quote_booking(5.0, 0.0),
            Err(PricingError::NonPositiveQuantity)
        );
        assert_eq!(
            quote_extension(5.0, -1.0),
            Err(PricingError::NonPositiveQuantity)
        );
        assert_eq!(quote_booking(f64::NAN, 1.0), Err(PricingError::NonPositiveRate));
    }

    #[test]
    fn quantity_rounds_up_to_whole_units() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(billable_quantity(RateType::Hourly, start, end).unwrap(), 3.0);

        let end = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        assert_eq!(billable_quantity(RateType::Daily, start, end).unwrap(), 2.0);
        assert_eq!(billable_quantity(RateType::Weekly, start, end).unwrap(), 1.0);
    }

    #[test]
    fn empty_or_inverted_windows_are_rejected() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(
            billable_quantity(RateType::Hourly, start, start),
            Err(PricingError::EmptyWindow)
        );
        let earlier = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(
            billable_quantity(RateType::Hourly, start, earlier),
            Err(PricingError::EmptyWindow)
        );
    }

    #[test]
    fn cents_are_rounded_only_at_the_boundary() {
        assert_eq!(to_cents(6.0), 600);
        assert_eq!(to_cents(4.605), 461);
        assert_eq!(to_cents(0.004), 0);
        // Three hours at $1.115/h accumulate before rounding.
        let quote = quote_booking(1.115, 3.0).unwrap();
        assert_eq!(to_cents(quote.total_price), 335);
    }
}
