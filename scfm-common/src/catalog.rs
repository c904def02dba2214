//! Static reference lists served to clients
//!
//! Genres are suggestions only; validation accepts any non-empty genre.

use serde::Serialize;

use crate::models::ticket::CATEGORIES;
use crate::models::ArtistRole;

/// Streaming platform a release can be delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamingService {
    pub id: &'static str,
    pub name: &'static str,
}

pub const SERVICES: [StreamingService; 16] = [
    StreamingService { id: "spotify", name: "Spotify" },
    StreamingService { id: "apple-music", name: "Apple Music" },
    StreamingService { id: "youtube-music", name: "YouTube Music" },
    StreamingService { id: "amazon-music", name: "Amazon Music" },
    StreamingService { id: "pandora", name: "Pandora" },
    StreamingService { id: "tidal", name: "Tidal" },
    StreamingService { id: "deezer", name: "Deezer" },
    StreamingService { id: "iheartradio", name: "iHeartRadio" },
    StreamingService { id: "napster", name: "Napster" },
    StreamingService { id: "tencent", name: "Tencent" },
    StreamingService { id: "meta", name: "Meta" },
    StreamingService { id: "tiktok", name: "TikTok" },
    StreamingService { id: "soundcloud", name: "SoundCloud" },
    StreamingService { id: "shazam", name: "Shazam" },
    StreamingService { id: "beatport", name: "Beatport" },
    StreamingService { id: "juno-download", name: "Juno Download" },
];

pub const GENRES: [&str; 35] = [
    "Pop", "Rock", "Hip Hop", "Rap", "R&B", "Country", "Electronic", "Dance",
    "House", "Techno", "Jazz", "Blues", "Classical", "Folk", "Indie",
    "Alternative", "Metal", "Punk", "Reggae", "Latin", "K-Pop", "J-Pop",
    "Soul", "Funk", "Disco", "Gospel", "Ambient", "Lo-Fi", "Trap", "Dubstep",
    "World", "Cinematic", "Afrobeats", "Reggaeton", "Singer-Songwriter",
];

/// Look up a platform by id
pub fn service(id: &str) -> Option<&'static StreamingService> {
    SERVICES.iter().find(|s| s.id == id)
}

/// Everything `GET /api/catalog` returns
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub services: &'static [StreamingService],
    pub genres: &'static [&'static str],
    pub artist_roles: Vec<&'static str>,
    pub ticket_categories: &'static [&'static str],
}

pub fn catalog() -> Catalog {
    Catalog {
        services: &SERVICES,
        genres: &GENRES,
        artist_roles: ArtistRole::ALL.iter().map(ArtistRole::as_str).collect(),
        ticket_categories: &CATEGORIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_service_ids_unique() {
        let ids: HashSet<_> = SERVICES.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), SERVICES.len());
    }

    #[test]
    fn test_service_lookup() {
        assert_eq!(service("apple-music").map(|s| s.name), Some("Apple Music"));
        assert!(service("myspace").is_none());
    }

    #[test]
    fn test_catalog_roles_in_form_order() {
        let catalog = catalog();
        assert_eq!(catalog.artist_roles.first(), Some(&"Main Artist"));
        assert_eq!(catalog.artist_roles.len(), 6);
        assert_eq!(catalog.ticket_categories.len(), 5);
    }
}
