//! Artist profiles owned by a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Artist profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub spotify_url: Option<String>,
    pub instagram_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Artist profile creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArtist {
    pub name: String,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
}

impl Artist {
    /// Create a profile for `user_id`; blank optional links are dropped
    pub fn new(user_id: Uuid, input: NewArtist, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.trim().to_string(),
            spotify_url: non_blank(input.spotify_url),
            instagram_url: non_blank(input.instagram_url),
            created_at: now,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_artist_drops_blank_links() {
        let artist = Artist::new(
            Uuid::new_v4(),
            NewArtist {
                name: " The Weeknd ".to_string(),
                spotify_url: Some("   ".to_string()),
                instagram_url: Some("@theweeknd".to_string()),
            },
            crate::time::now(),
        );
        assert_eq!(artist.name, "The Weeknd");
        assert_eq!(artist.spotify_url, None);
        assert_eq!(artist.instagram_url.as_deref(), Some("@theweeknd"));
    }
}
