use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BookingError;

/// Cabin tier. External input is free text in any casing; `parse` normalizes
/// it to the canonical form before any lookup or persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatClass {
    Economy,
    Business,
}

impl SeatClass {
    pub fn parse(input: &str) -> Result<Self, BookingError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(SeatClass::Economy),
            "business" => Ok(SeatClass::Business),
            other => Err(BookingError::Validation(format!(
                "unknown seat class: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Economy => "Economy",
            SeatClass::Business => "Business",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled departure of a flight number. Read-only to the booking core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightInstance {
    pub airline: String,
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_airport: String,
    pub arrival_airport: String,
}

/// Remaining bookable capacity for one cabin class on one flight instance.
/// Mutated only by the reservation and cancellation workflows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatInventory {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: SeatClass,
    pub price: i64,
    pub seats_remaining: i32,
}

impl SeatInventory {
    pub fn key(&self) -> SeatKey {
        SeatKey {
            flight_no: self.flight_no.clone(),
            departure_time: self.departure_time,
            seat_class: self.seat_class,
        }
    }
}

/// Composite key of one seat inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatKey {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: SeatClass,
}

/// Composite key of one reservation or cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingKey {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: SeatClass,
    pub cno: String,
}

impl BookingKey {
    pub fn seat_key(&self) -> SeatKey {
        SeatKey {
            flight_no: self.flight_no.clone(),
            departure_time: self.departure_time,
            seat_class: self.seat_class,
        }
    }
}

/// An active booking of one seat-class unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: SeatClass,
    pub payment: i64,
    pub reserved_at: DateTime<Utc>,
    pub cno: String,
}

impl Reservation {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            flight_no: self.flight_no.clone(),
            departure_time: self.departure_time,
            seat_class: self.seat_class,
            cno: self.cno.clone(),
        }
    }
}

/// Audit record left after a reservation is refunded. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: SeatClass,
    pub refund: i64,
    pub cancelled_at: DateTime<Utc>,
    pub cno: String,
}

impl Cancellation {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            flight_no: self.flight_no.clone(),
            departure_time: self.departure_time,
            seat_class: self.seat_class,
            cno: self.cno.clone(),
        }
    }
}

/// Total payments and reservation count per airline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlineRevenue {
    pub airline: String,
    pub total_revenue: i64,
    pub reservation_count: i64,
}

/// Airline revenue ranked within one departure airport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportAirlineRevenue {
    pub departure_airport: String,
    pub airline: String,
    pub total_revenue: i64,
    pub revenue_rank: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_class_parses_any_casing() {
        assert_eq!(SeatClass::parse("business").unwrap(), SeatClass::Business);
        assert_eq!(SeatClass::parse("BUSINESS").unwrap(), SeatClass::Business);
        assert_eq!(SeatClass::parse("Business").unwrap(), SeatClass::Business);
        assert_eq!(SeatClass::parse(" economy ").unwrap(), SeatClass::Economy);
    }

    #[test]
    fn seat_class_rejects_unknown_values() {
        let err = SeatClass::parse("first").unwrap_err();
        assert!(matches!(err, crate::BookingError::Validation(_)));
    }

    #[test]
    fn seat_class_canonical_form() {
        assert_eq!(SeatClass::Business.as_str(), "Business");
        assert_eq!(SeatClass::Economy.to_string(), "Economy");
    }
}
