//! Artist profile endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use scfm_common::models::{Artist, NewArtist};
use uuid::Uuid;

use crate::api::CurrentUser;
use crate::services::artists;
use crate::{ApiResult, AppState};

/// GET /api/artists
pub async fn list_artists(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Artist>>> {
    Ok(Json(artists::list_artists(&state, &user).await?))
}

/// POST /api/artists
pub async fn create_artist(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<NewArtist>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let Json(input) = payload?;
    let artist = artists::create_artist(&state, &user, input).await?;
    Ok((StatusCode::CREATED, Json(artist)))
}

/// DELETE /api/artists/:id
pub async fn delete_artist(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    artists::delete_artist(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
