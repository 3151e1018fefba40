use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, DateRange};

pub fn find_conflict(
    conn: &Connection,
    car_id: &str,
    range: DateRange,
    exclude_booking_id: Option<&str>,
) -> rusqlite::Result<Option<Booking>> {
    let active = queries::active_bookings_for_car(conn, car_id, exclude_booking_id)?;
    Ok(active.into_iter().find(|b| b.range().overlaps(&range)))
}

/// Fails with `Conflict` when the car is already held for any day of `range`.
///
/// Only meaningful inside the caller's write transaction: the answer is
/// stale as soon as the lock is released.
pub fn check_available(
    conn: &Connection,
    car_id: &str,
    range: DateRange,
    exclude_booking_id: Option<&str>,
) -> AppResult<()> {
    match find_conflict(conn, car_id, range, exclude_booking_id)? {
        Some(existing) => {
            tracing::warn!(
                car_id,
                existing_booking = %existing.id,
                start = %range.start,
                end = %range.end,
                "requested dates overlap an existing booking"
            );
            Err(AppError::Conflict(format!(
                "car is already booked from {} to {}",
                existing.start_date, existing.end_date
            )))
        }
        None => Ok(()),
    }
}

pub fn overlap_violation(err: rusqlite::Error) -> AppError {
    match &err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("booking_overlap") => {
            AppError::Conflict("car is already booked for the requested dates".into())
        }
        _ => AppError::Database(err),
    }
}
