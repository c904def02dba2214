//! Audio and artwork uploads
//!
//! The body is the raw file; its type comes from `Content-Type`. The
//! returned key is what a release draft references.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use scfm_common::assets::{AssetKind, AssetRef};
use tracing::info;

use crate::api::CurrentUser;
use crate::{ApiResult, AppState};

/// POST /api/assets/audio
pub async fn upload_audio(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AssetRef>)> {
    let max = state.config.limits.max_audio_bytes;
    let asset = upload(&state, AssetKind::Audio, &headers, &body, max).await?;
    info!(user_id = %user.id, key = %asset.key, "Audio uploaded");
    Ok((StatusCode::CREATED, Json(asset)))
}

/// POST /api/assets/artwork
pub async fn upload_artwork(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AssetRef>)> {
    let max = state.config.limits.max_artwork_bytes;
    let asset = upload(&state, AssetKind::Artwork, &headers, &body, max).await?;
    info!(user_id = %user.id, key = %asset.key, "Artwork uploaded");
    Ok((StatusCode::CREATED, Json(asset)))
}

async fn upload(
    state: &AppState,
    kind: AssetKind,
    headers: &HeaderMap,
    body: &[u8],
    max_bytes: u64,
) -> ApiResult<AssetRef> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    // Drop parameters such as `; charset=...`
    let content_type = content_type.split(';').next().unwrap_or("").trim();
    Ok(state.assets.store(kind, content_type, body, max_bytes).await?)
}
