//! One saved submission draft per user

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use scfm_common::models::ReleaseDraft;
use scfm_common::time::now;
use serde::Serialize;
use tracing::debug;

use crate::api::CurrentUser;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: Option<ReleaseDraft>,
}

#[derive(Debug, Serialize)]
pub struct ClearDraftResponse {
    pub cleared: bool,
}

/// GET /api/drafts
pub async fn load_draft(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<DraftResponse>> {
    let draft = state.repo.load_draft(user.id).await?;
    Ok(Json(DraftResponse { draft }))
}

/// PUT /api/drafts
///
/// Drafts are stored as-is; validation happens on submit.
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ReleaseDraft>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(draft) = payload?;
    state.repo.save_draft(user.id, &draft, now()).await?;
    debug!(user_id = %user.id, "Draft saved");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/drafts
pub async fn clear_draft(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ClearDraftResponse>> {
    let cleared = state.repo.clear_draft(user.id).await?;
    Ok(Json(ClearDraftResponse { cleared }))
}
