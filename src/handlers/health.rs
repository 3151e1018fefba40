use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::db::queries;
use crate::errors::AppResult;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    state.db.run(|conn| Ok(queries::ping(conn)?)).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
