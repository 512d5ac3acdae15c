//! Cancellation penalty schedule.
//!
//! The day count is the calendar-day difference between "now" and the
//! departure, both viewed in the deployment's reference timezone. Same-day
//! and past-departure cancellations refund nothing regardless of the amount
//! paid; every other bracket charges a flat penalty clamped at the payment.

use chrono::{DateTime, FixedOffset, Utc};

pub const PENALTY_OVER_15_DAYS: i64 = 150_000;
pub const PENALTY_4_TO_15_DAYS: i64 = 180_000;
pub const PENALTY_1_TO_3_DAYS: i64 = 250_000;

pub fn days_until_departure(
    now: DateTime<Utc>,
    departure: DateTime<Utc>,
    reference_tz: FixedOffset,
) -> i64 {
    let today = now.with_timezone(&reference_tz).date_naive();
    let departure_day = departure.with_timezone(&reference_tz).date_naive();
    (departure_day - today).num_days()
}

pub fn refund_for(payment: i64, days_until_departure: i64) -> i64 {
    if days_until_departure < 1 {
        return 0;
    }
    let penalty = if days_until_departure > 15 {
        PENALTY_OVER_15_DAYS
    } else if days_until_departure >= 4 {
        PENALTY_4_TO_15_DAYS
    } else {
        PENALTY_1_TO_3_DAYS
    };
    (payment - penalty).max(0)
}
