use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Booking, BookingStatus, Car, CarFilter, Profile, ProfileUpdate};

pub fn ping(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT 1", [], |_| Ok(()))
}

// ── Cars ──

const CAR_COLUMNS: &str = "id, owner_id, make, model, year, price_per_day, location, description, image_url, \
     is_electric, is_keyless, has_seven_seats, rating, trip_count, badges, created_at";

pub fn insert_car(conn: &Connection, car: &Car) -> rusqlite::Result<()> {
    let badges = serde_json::to_string(&car.badges)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO cars (id, owner_id, make, model, year, price_per_day, location, description, image_url,
                           is_electric, is_keyless, has_seven_seats, rating, trip_count, badges, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            car.id,
            car.owner_id,
            car.make,
            car.model,
            car.year,
            car.price_per_day,
            car.location,
            car.description,
            car.image_url,
            car.is_electric,
            car.is_keyless,
            car.has_seven_seats,
            car.rating,
            car.trip_count,
            badges,
            car.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_car(conn: &Connection, id: &str) -> rusqlite::Result<Option<Car>> {
    conn.query_row(
        &format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?1"),
        params![id],
        parse_car_row,
    )
    .optional()
}

pub fn list_cars(conn: &Connection, filter: &CarFilter) -> rusqlite::Result<Vec<Car>> {
    let mut clauses: Vec<&str> = vec![];
    let mut values: Vec<Box<dyn ToSql>> = vec![];

    if let Some(location) = &filter.location {
        clauses.push("icontains(location, ?)");
        values.push(Box::new(location.clone()));
    }
    if let Some(v) = filter.is_electric {
        clauses.push("is_electric = ?");
        values.push(Box::new(v));
    }
    if let Some(v) = filter.is_keyless {
        clauses.push("is_keyless = ?");
        values.push(Box::new(v));
    }
    if let Some(v) = filter.has_seven_seats {
        clauses.push("has_seven_seats = ?");
        values.push(Box::new(v));
    }
    if let Some(day) = filter.available_on {
        clauses.push(
            "NOT EXISTS (SELECT 1 FROM bookings b WHERE b.car_id = cars.id \
             AND b.status IN ('pending', 'approved') AND b.start_date <= ? AND ? < b.end_date)",
        );
        values.push(Box::new(day));
        values.push(Box::new(day));
    }

    let mut sql = format!("SELECT {CAR_COLUMNS} FROM cars");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC, rowid DESC");

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), parse_car_row)?;
    rows.collect()
}

fn parse_car_row(row: &Row) -> rusqlite::Result<Car> {
    let badges_json: String = row.get(14)?;
    let badges = serde_json::from_str(&badges_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e)))?;

    Ok(Car {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        make: row.get(2)?,
        model: row.get(3)?,
        year: row.get(4)?,
        price_per_day: row.get(5)?,
        location: row.get(6)?,
        description: row.get(7)?,
        image_url: row.get(8)?,
        is_electric: row.get(9)?,
        is_keyless: row.get(10)?,
        has_seven_seats: row.get(11)?,
        rating: row.get(12)?,
        trip_count: row.get(13)?,
        badges,
        created_at: row.get(15)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "b.id, b.car_id, b.renter_id, b.start_date, b.end_date, b.total_price, b.status, b.created_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, car_id, renter_id, start_date, end_date, total_price, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            booking.id,
            booking.car_id,
            booking.renter_id,
            booking.start_date,
            booking.end_date,
            booking.total_price,
            booking.status,
            booking.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

pub fn active_bookings_for_car(
    conn: &Connection,
    car_id: &str,
    exclude_id: Option<&str>,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE b.car_id = ?1 AND b.status IN ('pending', 'approved')
           AND (?2 IS NULL OR b.id != ?2)
         ORDER BY b.start_date ASC"
    ))?;
    let rows = stmt.query_map(params![car_id, exclude_id], parse_booking_row)?;
    rows.collect()
}

pub fn bookings_for_renter(conn: &Connection, renter_id: &str) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE b.renter_id = ?1
         ORDER BY b.created_at DESC, b.rowid DESC"
    ))?;
    let rows = stmt.query_map(params![renter_id], parse_booking_row)?;
    rows.collect()
}

pub fn bookings_for_owner(conn: &Connection, owner_id: &str) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         JOIN cars c ON c.id = b.car_id
         WHERE c.owner_id = ?1
         ORDER BY b.created_at DESC, b.rowid DESC"
    ))?;
    let rows = stmt.query_map(params![owner_id], parse_booking_row)?;
    rows.collect()
}

/// Compare-and-set on status; returns false if the row was not in `from`.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    from: BookingStatus,
    to: BookingStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to, id, from],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        car_id: row.get(1)?,
        renter_id: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        total_price: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

// ── Profiles ──

const PROFILE_COLUMNS: &str = "id, user_id, bio, phone_number, is_owner, city";

pub fn get_profile(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
        params![user_id],
        parse_profile_row,
    )
    .optional()
}

/// Single-statement upsert keyed by `user_id`. `new_id` is only used when
/// the row does not exist yet.
pub fn upsert_profile(
    conn: &Connection,
    new_id: &str,
    user_id: &str,
    update: &ProfileUpdate,
) -> rusqlite::Result<Profile> {
    conn.query_row(
        &format!(
            "INSERT INTO profiles (id, user_id, bio, phone_number, is_owner, city)
             VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 0), ?6)
             ON CONFLICT(user_id) DO UPDATE SET
               bio = COALESCE(excluded.bio, profiles.bio),
               phone_number = COALESCE(excluded.phone_number, profiles.phone_number),
               is_owner = COALESCE(?5, profiles.is_owner),
               city = COALESCE(excluded.city, profiles.city)
             RETURNING {PROFILE_COLUMNS}"
        ),
        params![
            new_id,
            user_id,
            update.bio,
            update.phone_number,
            update.is_owner,
            update.city,
        ],
        parse_profile_row,
    )
}

fn parse_profile_row(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        bio: row.get(2)?,
        phone_number: row.get(3)?,
        is_owner: row.get(4)?,
        city: row.get(5)?,
    })
}
