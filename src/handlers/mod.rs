pub mod bookings;
pub mod cars;
pub mod health;
pub mod profiles;

use axum::extract::rejection::JsonRejection;
use chrono::{NaiveDate, Utc};

use crate::errors::AppError;

/// Malformed bodies are reported like any other validation failure.
pub(crate) fn body_rejection(rejection: JsonRejection) -> AppError {
    AppError::validation("body", rejection.body_text())
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
