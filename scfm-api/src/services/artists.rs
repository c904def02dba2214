//! Artist profiles, capped per account by `limits.max_artists_per_user`

use scfm_common::models::{Artist, NewArtist, User};
use scfm_common::time::now;
use scfm_common::{Error, Result};
use tracing::info;
use uuid::Uuid;

use crate::AppState;

pub async fn create_artist(state: &AppState, user: &User, input: NewArtist) -> Result<Artist> {
    if input.name.trim().is_empty() {
        return Err(Error::field("name", "Artist name is required."));
    }
    let artist = Artist::new(user.id, input, now());
    state
        .repo
        .create_artist(&artist, state.config.limits.max_artists_per_user)
        .await?;
    info!(artist_id = %artist.id, user_id = %user.id, name = %artist.name, "Artist profile created");
    Ok(artist)
}

pub async fn list_artists(state: &AppState, user: &User) -> Result<Vec<Artist>> {
    state.repo.list_artists(user.id).await
}

/// Owners only; another user's profile is reported as missing
pub async fn delete_artist(state: &AppState, user: &User, artist_id: Uuid) -> Result<()> {
    let artist = state
        .repo
        .find_artist(artist_id)
        .await?
        .filter(|a| a.user_id == user.id)
        .ok_or_else(|| Error::NotFound(format!("artist {}", artist_id)))?;
    state.repo.delete_artist(artist.id).await?;
    info!(artist_id = %artist.id, user_id = %user.id, "Artist profile deleted");
    Ok(())
}
