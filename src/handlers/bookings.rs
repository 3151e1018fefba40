use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::handlers::{body_rejection, today};
use crate::models::{Booking, NewBooking, StatusUpdate};
use crate::services::lifecycle;
use crate::state::AppState;

// GET /api/bookings
#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub role: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<BookingsQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let as_owner = match query.role.as_deref() {
        None | Some("") | Some("renter") => false,
        Some("owner") => true,
        Some(_) => {
            return Err(AppError::validation(
                "role",
                "role must be \"renter\" or \"owner\"",
            ))
        }
    };

    let bookings = state
        .db
        .run(move |conn| {
            let rows = if as_owner {
                queries::bookings_for_owner(conn, &user.id)?
            } else {
                queries::bookings_for_renter(conn, &user.id)?
            };
            Ok(rows)
        })
        .await?;

    Ok(Json(bookings))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    body: Result<Json<NewBooking>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let Json(input) = body.map_err(body_rejection)?;
    let booking = state
        .db
        .run(move |conn| lifecycle::create_booking(conn, &user.id, &input, today()))
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> AppResult<Json<Booking>> {
    let Json(update) = body.map_err(body_rejection)?;
    let booking = state
        .db
        .run(move |conn| lifecycle::transition(conn, &id, update.status, &user.id))
        .await?;
    Ok(Json(booking))
}
