//! Release submission and artist edits
//!
//! Resolves asset keys against the store, validates the form, writes the
//! release and notifies subscribers. Edits always send the release back to
//! review and stop any running distribution.

use scfm_common::assets::{AssetRef, AssetStore};
use scfm_common::events::ScfmEvent;
use scfm_common::models::{Release, ReleaseDraft, User};
use scfm_common::time::now;
use scfm_common::validation::{validate_release, AssetResolution, ResolvedAssets};
use scfm_common::{Error, Result};
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

/// Create a new release from a complete form
///
/// Clears the submitter's saved draft on success.
pub async fn submit_release(state: &AppState, user: &User, draft: &ReleaseDraft) -> Result<Release> {
    let assets = resolve_assets(&state.assets, draft, None).await?;
    let validated = validate_release(draft, assets)?;
    let release = Release::submit(user.id, validated, now());

    state.repo.create_release(&release).await?;
    info!(release_id = %release.id, user_id = %user.id, title = %release.song_title, "Release submitted");

    if let Err(e) = state.repo.clear_draft(user.id).await {
        warn!(user_id = %user.id, "Failed to clear draft after submission: {}", e);
    }

    state.events.emit_lossy(ScfmEvent::ReleaseSubmitted {
        release_id: release.id,
        user_id: user.id,
        song_title: release.song_title.clone(),
        timestamp: release.submission_date,
    });
    Ok(release)
}

/// Replace a release's metadata; it returns to Pending Approval
///
/// `expected_version`, when given, must match the stored version.
/// Assets not re-uploaded keep their current reference.
pub async fn edit_release(
    state: &AppState,
    user: &User,
    release_id: Uuid,
    draft: &ReleaseDraft,
    expected_version: Option<i64>,
) -> Result<Release> {
    let mut release = find_owned_release(state, user, release_id).await?;
    if let Some(expected) = expected_version {
        if expected != release.version {
            return Err(Error::Conflict(format!(
                "release {} is at version {}, not {}",
                release.id, release.version, expected
            )));
        }
    }

    let assets = resolve_assets(&state.assets, draft, Some(&release)).await?;
    let validated = validate_release(draft, assets)?;
    release.apply_edit(validated, now());
    release.version = state.repo.update_release(&release).await?;

    state.distribution.cancel(&release).await;
    info!(release_id = %release.id, version = release.version, "Release edited, pending re-review");

    state.events.emit_lossy(ScfmEvent::ReleaseUpdated {
        release_id: release.id,
        user_id: release.user_id,
        version: release.version,
        timestamp: now(),
    });
    Ok(release)
}

/// The caller's own releases, newest first
pub async fn list_releases(state: &AppState, user: &User) -> Result<Vec<Release>> {
    state.repo.list_releases(Some(user.id)).await
}

/// Fetch a release the caller may see
pub async fn get_release(state: &AppState, user: &User, release_id: Uuid) -> Result<Release> {
    let release = state
        .repo
        .find_release(release_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("release {}", release_id)))?;
    if release.user_id != user.id && !user.is_admin() {
        return Err(Error::NotFound(format!("release {}", release_id)));
    }
    Ok(release)
}

async fn find_owned_release(state: &AppState, user: &User, release_id: Uuid) -> Result<Release> {
    let release = get_release(state, user, release_id).await?;
    if release.user_id != user.id {
        return Err(Error::Forbidden("only the owner can edit a release".to_string()));
    }
    Ok(release)
}

/// Look up both asset slots; `existing` supplies the fallback when editing
async fn resolve_assets(
    store: &AssetStore,
    draft: &ReleaseDraft,
    existing: Option<&Release>,
) -> Result<ResolvedAssets> {
    Ok(ResolvedAssets {
        audio: resolve_slot(store, draft.audio_file.as_deref(), existing.map(|r| &r.audio_file)).await?,
        artwork: resolve_slot(store, draft.artwork.as_deref(), existing.map(|r| &r.artwork)).await?,
    })
}

async fn resolve_slot(
    store: &AssetStore,
    key: Option<&str>,
    on_file: Option<&AssetRef>,
) -> Result<AssetResolution> {
    match key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            if let Some(current) = on_file.filter(|current| current.key == key) {
                return Ok(AssetResolution::Found(current.clone()));
            }
            Ok(match store.resolve(key).await? {
                Some(asset) => AssetResolution::Found(asset),
                None => AssetResolution::Unknown(key.to_string()),
            })
        }
        None => Ok(on_file
            .cloned()
            .map(AssetResolution::Found)
            .unwrap_or(AssetResolution::Missing)),
    }
}
