//! Preference API endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::preferences::{Preferences, UpdatePreferencesRequest};
use crate::AppState;

/// GET /api/preferences - Current display preferences.
pub async fn get_preferences(State(state): State<AppState>) -> ApiResult<Preferences> {
    success(state.preferences.get().await)
}

/// PUT /api/preferences - Change and persist display preferences.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> ApiResult<Preferences> {
    success(state.preferences.update(&request).await?)
}
