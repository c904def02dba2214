//! Artist release endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use scfm_common::models::{Release, ReleaseDraft, ReleaseStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::CurrentUser;
use crate::services::distribution::PlatformStatus;
use crate::services::submission;
use crate::{ApiResult, AppState};

/// Edit payload: the full form plus the version the client last saw
#[derive(Debug, Deserialize)]
pub struct EditReleaseRequest {
    #[serde(flatten)]
    pub draft: ReleaseDraft,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub release_id: Uuid,
    pub status: ReleaseStatus,
    pub platforms: Vec<PlatformStatus>,
}

/// GET /api/releases
pub async fn list_releases(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Release>>> {
    Ok(Json(submission::list_releases(&state, &user).await?))
}

/// POST /api/releases
pub async fn submit_release(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ReleaseDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Release>)> {
    let Json(draft) = payload?;
    let release = submission::submit_release(&state, &user, &draft).await?;
    Ok((StatusCode::CREATED, Json(release)))
}

/// GET /api/releases/:id
pub async fn get_release(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Release>> {
    Ok(Json(submission::get_release(&state, &user, id).await?))
}

/// PUT /api/releases/:id
///
/// Any edit sends the release back to review.
pub async fn edit_release(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<EditReleaseRequest>, JsonRejection>,
) -> ApiResult<Json<Release>> {
    let Json(request) = payload?;
    let release =
        submission::edit_release(&state, &user, id, &request.draft, request.version).await?;
    Ok(Json(release))
}

/// GET /api/releases/:id/distribution
pub async fn get_distribution(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DistributionResponse>> {
    let release = submission::get_release(&state, &user, id).await?;
    let platforms = state.distribution.snapshot(&release).await;
    Ok(Json(DistributionResponse {
        release_id: release.id,
        status: release.status,
        platforms,
    }))
}
