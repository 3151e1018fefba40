use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::{AppError, AppResult};
use crate::handlers::{body_rejection, today};
use crate::models::{Car, CarFilter, NewCar, PriceQuote};
use crate::services::catalog;
use crate::state::AppState;

// GET /api/cars
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarQuery {
    pub location: Option<String>,
    pub date: Option<String>,
    pub is_electric: Option<String>,
    pub is_keyless: Option<String>,
    pub has_seven_seats: Option<String>,
}

impl CarQuery {
    pub fn into_filter(self) -> AppResult<CarFilter> {
        Ok(CarFilter {
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            is_electric: parse_flag("isElectric", self.is_electric.as_deref())?,
            is_keyless: parse_flag("isKeyless", self.is_keyless.as_deref())?,
            has_seven_seats: parse_flag("hasSevenSeats", self.has_seven_seats.as_deref())?,
            available_on: self
                .date
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| parse_date("date", d))
                .transpose()?,
        })
    }
}

fn parse_flag(field: &'static str, value: Option<&str>) -> AppResult<Option<bool>> {
    match value {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(AppError::validation(
            field,
            format!("{field} must be \"true\" or \"false\", got \"{other}\""),
        )),
    }
}

fn parse_date(field: &'static str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::validation(field, format!("{field} must be a YYYY-MM-DD date")))
}

pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CarQuery>,
) -> AppResult<Json<Vec<Car>>> {
    let filter = query.into_filter()?;
    let cars = state
        .db
        .run(move |conn| catalog::list_cars(conn, &filter))
        .await?;
    Ok(Json(cars))
}

// GET /api/cars/:id
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Car>> {
    let car = state.db.run(move |conn| catalog::get_car(conn, &id)).await?;
    Ok(Json(car))
}

// POST /api/cars
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    body: Result<Json<NewCar>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Car>)> {
    let Json(input) = body.map_err(body_rejection)?;
    let car = state
        .db
        .run(move |conn| catalog::create_car(conn, &user.id, input, today()))
        .await?;
    Ok((StatusCode::CREATED, Json(car)))
}

// GET /api/cars/:id/quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> AppResult<Json<PriceQuote>> {
    let start = parse_date("startDate", query.start_date.as_deref().unwrap_or_default())?;
    let end = parse_date("endDate", query.end_date.as_deref().unwrap_or_default())?;
    let fee_percent = state.config.service_fee_percent;

    let quote = state
        .db
        .run(move |conn| catalog::quote(conn, &id, start, end, fee_percent))
        .await?;
    Ok(Json(quote))
}
