use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, DateRange, NewBooking, Party};
use crate::services::availability;

pub fn booking_total(range: &DateRange, price_per_day: i64) -> AppResult<i64> {
    range
        .days()
        .checked_mul(price_per_day)
        .ok_or_else(|| AppError::validation("endDate", "booking total is too large"))
}

pub fn validate_dates(input: &NewBooking, today: NaiveDate) -> AppResult<DateRange> {
    if input.start_date < today {
        return Err(AppError::validation(
            "startDate",
            "startDate cannot be in the past",
        ));
    }
    DateRange::new(input.start_date, input.end_date)
}

pub fn create_booking(
    conn: &mut Connection,
    renter_id: &str,
    input: &NewBooking,
    today: NaiveDate,
) -> AppResult<Booking> {
    let range = validate_dates(input, today)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let car = queries::get_car(&tx, &input.car_id)?
        .ok_or_else(|| AppError::NotFound(format!("car {}", input.car_id)))?;

    availability::check_available(&tx, &car.id, range, None)?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        car_id: car.id.clone(),
        renter_id: renter_id.to_string(),
        start_date: range.start,
        end_date: range.end,
        total_price: booking_total(&range, car.price_per_day)?,
        status: BookingStatus::Pending,
        created_at: Utc::now(),
    };

    queries::insert_booking(&tx, &booking).map_err(availability::overlap_violation)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        car_id = %booking.car_id,
        renter_id,
        total_price = booking.total_price,
        "booking requested"
    );

    Ok(booking)
}

/// Moves a booking to `requested` on behalf of `actor_id`.
///
/// Terminal bookings are rejected before the actor is considered. Then the
/// renter alone may cancel and the car owner alone may approve, reject or
/// complete; finally the move itself must be a legal edge.
pub fn transition(
    conn: &mut Connection,
    booking_id: &str,
    requested: BookingStatus,
    actor_id: &str,
) -> AppResult<Booking> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking(&tx, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
    let current = booking.status;

    let invalid = || AppError::InvalidTransition {
        from: current,
        to: requested,
    };

    if current.is_terminal() {
        return Err(invalid());
    }

    let party = requested.requested_by().ok_or_else(invalid)?;
    let allowed = match party {
        Party::Renter => actor_id == booking.renter_id,
        Party::Owner => {
            let car = queries::get_car(&tx, &booking.car_id)?.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "booking {booking_id} references missing car {}",
                    booking.car_id
                ))
            })?;
            actor_id == car.owner_id
        }
    };
    if !allowed {
        tracing::warn!(booking_id, actor_id, %requested, "status change by wrong party");
        return Err(AppError::Forbidden(match party {
            Party::Renter => "only the renter may cancel this booking".into(),
            Party::Owner => format!("only the car owner may mark this booking {requested}"),
        }));
    }

    if !current.can_transition_to(requested) {
        return Err(invalid());
    }

    if requested == BookingStatus::Approved {
        availability::check_available(&tx, &booking.car_id, booking.range(), Some(booking_id))?;
    }

    if !queries::update_booking_status(&tx, booking_id, current, requested)? {
        return Err(AppError::Internal(anyhow::anyhow!(
            "booking {booking_id} left {current} during a locked transition"
        )));
    }
    tx.commit()?;

    tracing::info!(booking_id, actor_id, from = %current, to = %requested, "booking status changed");

    Ok(Booking {
        status: requested,
        ..booking
    })
}
