use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::errors::AppResult;
use crate::handlers::body_rejection;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

// GET /api/profiles/me
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Option<Profile>>> {
    let profile = state
        .db
        .run(move |conn| Ok(queries::get_profile(conn, &user.id)?))
        .await?;
    Ok(Json(profile))
}

// POST /api/profiles
pub async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> AppResult<Json<Profile>> {
    let Json(update) = body.map_err(body_rejection)?;
    let profile = state
        .db
        .run(move |conn| {
            let new_id = Uuid::new_v4().to_string();
            Ok(queries::upsert_profile(conn, &new_id, &user.id, &update)?)
        })
        .await?;

    tracing::info!(user_id = %profile.user_id, "profile saved");
    Ok(Json(profile))
}
