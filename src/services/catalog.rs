use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::car::{DEFAULT_RATING, MIN_YEAR};
use crate::models::{Car, CarFilter, DateRange, NewCar, PriceQuote};
use crate::services::lifecycle::booking_total;

/// Validator field name, wire name, message; checked in this order.
const CAR_FIELD_RULES: &[(&str, &str, &str)] = &[
    ("make", "make", "make is required"),
    ("model", "model", "model is required"),
    ("price_per_day", "pricePerDay", "pricePerDay must be at least 1"),
    ("location", "location", "location is required"),
    ("image_url", "imageUrl", "imageUrl is required"),
];

pub fn list_cars(conn: &Connection, filter: &CarFilter) -> AppResult<Vec<Car>> {
    Ok(queries::list_cars(conn, filter)?)
}

pub fn get_car(conn: &Connection, id: &str) -> AppResult<Car> {
    queries::get_car(conn, id)?.ok_or_else(|| AppError::NotFound(format!("car {id}")))
}

pub fn validate_new_car(input: &NewCar, today: NaiveDate) -> AppResult<()> {
    if let Err(errors) = input.validate() {
        return Err(first_invalid_field(&errors));
    }

    let max_year = today.year() + 1;
    if input.year < MIN_YEAR || input.year > max_year {
        return Err(AppError::validation(
            "year",
            format!("year must be between {MIN_YEAR} and {max_year}"),
        ));
    }
    Ok(())
}

fn first_invalid_field(errors: &ValidationErrors) -> AppError {
    let failed = errors.field_errors();
    CAR_FIELD_RULES
        .iter()
        .find(|(name, _, _)| failed.keys().any(|k| k.to_string() == *name))
        .map(|(_, field, message)| AppError::validation(*field, *message))
        .unwrap_or_else(|| AppError::validation("body", errors.to_string()))
}

pub fn create_car(
    conn: &Connection,
    owner_id: &str,
    input: NewCar,
    today: NaiveDate,
) -> AppResult<Car> {
    validate_new_car(&input, today)?;

    let car = Car {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        make: input.make,
        model: input.model,
        year: input.year,
        price_per_day: input.price_per_day,
        location: input.location,
        description: input.description.filter(|d| !d.trim().is_empty()),
        image_url: input.image_url,
        is_electric: input.is_electric,
        is_keyless: input.is_keyless,
        has_seven_seats: input.has_seven_seats,
        rating: DEFAULT_RATING,
        trip_count: 0,
        badges: input.badges,
        created_at: Utc::now(),
    };

    queries::insert_car(conn, &car)?;
    tracing::info!(car_id = %car.id, owner_id, make = %car.make, model = %car.model, "car listed");

    Ok(car)
}

pub fn quote(
    conn: &Connection,
    car_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    service_fee_percent: i64,
) -> AppResult<PriceQuote> {
    let range = DateRange::new(start, end)?;
    let car = get_car(conn, car_id)?;
    let subtotal = booking_total(&range, car.price_per_day)?;
    let service_fee = service_fee(subtotal, service_fee_percent)
        .ok_or_else(|| AppError::validation("endDate", "booking total is too large"))?;

    Ok(PriceQuote {
        days: range.days(),
        price_per_day: car.price_per_day,
        subtotal,
        service_fee,
        total: subtotal + service_fee,
    })
}

/// `subtotal * percent / 100`, rounded half up.
fn service_fee(subtotal: i64, percent: i64) -> Option<i64> {
    let scaled = subtotal.checked_mul(percent)?;
    let fee = scaled.checked_add(50)? / 100;
    fee.checked_add(subtotal).map(|_| fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn new_car(make: &str, location: &str) -> NewCar {
        NewCar {
            make: make.to_string(),
            model: "Model".to_string(),
            year: 2022,
            price_per_day: 150,
            location: location.to_string(),
            description: None,
            image_url: "https://img.example/car.jpg".to_string(),
            is_electric: false,
            is_keyless: false,
            has_seven_seats: false,
            badges: vec![],
        }
    }

    #[test]
    fn test_create_sets_defaults_and_owner() {
        let conn = setup_db();
        let car = create_car(&conn, "owner-1", new_car("Mazda", "Jerusalem"), today()).unwrap();

        assert_eq!(car.owner_id, "owner-1");
        assert_eq!(car.rating, 5.0);
        assert_eq!(car.trip_count, 0);
        assert_eq!(get_car(&conn, &car.id).unwrap(), car);
    }

    #[test]
    fn test_create_validates_fields() {
        let conn = setup_db();

        let mut input = new_car("Mazda", "Jerusalem");
        input.price_per_day = 0;
        let err = create_car(&conn, "owner-1", input, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "pricePerDay", .. }));

        let mut input = new_car("", "Jerusalem");
        input.year = 1800;
        let err = create_car(&conn, "owner-1", input, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "make", .. }));

        let mut input = new_car("Mazda", "Jerusalem");
        input.year = 1899;
        let err = create_car(&conn, "owner-1", input, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "year", .. }));

        let mut input = new_car("Mazda", "Jerusalem");
        input.year = 2026;
        let err = create_car(&conn, "owner-1", input, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "year", .. }));

        // next model year is allowed
        let mut input = new_car("Mazda", "Jerusalem");
        input.year = 2025;
        assert!(create_car(&conn, "owner-1", input, today()).is_ok());
    }

    #[test]
    fn test_get_missing_car() {
        let conn = setup_db();
        assert!(matches!(get_car(&conn, "nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_list_newest_first() {
        let conn = setup_db();
        let a = create_car(&conn, "o", new_car("A", "Haifa"), today()).unwrap();
        let b = create_car(&conn, "o", new_car("B", "Eilat"), today()).unwrap();
        let c = create_car(&conn, "o", new_car("C", "Haifa"), today()).unwrap();

        let ids: Vec<String> = list_cars(&conn, &CarFilter::default())
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_list_filters_are_anded() {
        let conn = setup_db();

        let mut ev = new_car("Tesla", "Tel Aviv");
        ev.is_electric = true;
        ev.is_keyless = true;
        let ev = create_car(&conn, "o", ev, today()).unwrap();

        let mut van = new_car("Kia", "Tel Aviv-Yafo");
        van.has_seven_seats = true;
        let van = create_car(&conn, "o", van, today()).unwrap();

        let plain = create_car(&conn, "o", new_car("Fiat", "Haifa"), today()).unwrap();

        let electric = list_cars(
            &conn,
            &CarFilter {
                is_electric: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(electric, vec![ev.clone()]);

        let not_electric = list_cars(
            &conn,
            &CarFilter {
                is_electric: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(not_electric.len(), 2);
        assert!(not_electric.iter().all(|c| !c.is_electric));

        // substring, case-insensitive
        let tel_aviv = list_cars(
            &conn,
            &CarFilter {
                location: Some("tel aviv".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tel_aviv, vec![van.clone(), ev.clone()]);

        let seven_in_tel_aviv = list_cars(
            &conn,
            &CarFilter {
                location: Some("TEL".into()),
                has_seven_seats: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(seven_in_tel_aviv, vec![van]);

        let nothing = list_cars(
            &conn,
            &CarFilter {
                location: Some("haifa".into()),
                is_keyless: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(nothing.is_empty());

        let haifa = list_cars(
            &conn,
            &CarFilter {
                location: Some("haifa".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(haifa, vec![plain]);
    }

    #[test]
    fn test_location_match_folds_unicode_case() {
        let conn = setup_db();
        let zurich = create_car(&conn, "o", new_car("Kia", "Zürich"), today()).unwrap();
        let munich = create_car(&conn, "o", new_car("BMW", "München"), today()).unwrap();

        let by_location = |location: &str| {
            list_cars(
                &conn,
                &CarFilter {
                    location: Some(location.to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<_>>()
        };

        assert_eq!(by_location("ZÜRICH"), vec![zurich.id.clone()]);
        assert_eq!(by_location("zürich"), vec![zurich.id.clone()]);
        assert_eq!(by_location("MÜNCH"), vec![munich.id.clone()]);
        assert!(by_location("zurich").is_empty());
    }

    #[test]
    fn test_list_available_on_date() {
        use crate::models::{Booking, BookingStatus};

        let conn = setup_db();
        let busy = create_car(&conn, "o", new_car("Busy", "Haifa"), today()).unwrap();
        let free = create_car(&conn, "o", new_car("Free", "Haifa"), today()).unwrap();

        let booking = Booking {
            id: "bk-1".to_string(),
            car_id: busy.id.clone(),
            renter_id: "r".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            total_price: 450,
            status: BookingStatus::Approved,
            created_at: Utc::now(),
        };
        queries::insert_booking(&conn, &booking).unwrap();

        let on = |y, m, d| {
            list_cars(
                &conn,
                &CarFilter {
                    available_on: NaiveDate::from_ymd_opt(y, m, d),
                    ..Default::default()
                },
            )
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<_>>()
        };

        assert_eq!(on(2024, 6, 2), vec![free.id.clone()]);
        // return day is free
        assert_eq!(on(2024, 6, 4), vec![free.id.clone(), busy.id.clone()]);
    }

    #[test]
    fn test_quote_breakdown() {
        let conn = setup_db();
        let mut input = new_car("Kia", "Haifa");
        input.price_per_day = 200;
        let car = create_car(&conn, "o", input, today()).unwrap();

        let q = quote(
            &conn,
            &car.id,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            10,
        )
        .unwrap();
        assert_eq!(
            q,
            PriceQuote {
                days: 3,
                price_per_day: 200,
                subtotal: 600,
                service_fee: 60,
                total: 660,
            }
        );
    }

    #[test]
    fn test_service_fee_rounds_half_up() {
        assert_eq!(service_fee(155, 10), Some(16));
        assert_eq!(service_fee(154, 10), Some(15));
        assert_eq!(service_fee(100, 0), Some(0));
        assert_eq!(service_fee(i64::MAX, 10), None);
    }
}
