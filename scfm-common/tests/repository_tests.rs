//! Repository contract tests
//!
//! The same checks run against the in-memory and SQLite adapters.

use std::sync::Arc;

use chrono::Duration;
use scfm_common::assets::AssetRef;
use scfm_common::auth::new_credentials;
use scfm_common::db::{connect_in_memory, init_database};
use scfm_common::models::{
    Artist, ArtistRole, NewArtist, PaymentDetails, Release, ReleaseArtist, ReleaseDraft,
    ReleaseStatus, Role, RoyaltySplit, Ticket, TicketStatus, User,
};
use scfm_common::repository::{MemoryRepository, SqliteRepository};
use scfm_common::time::now;
use scfm_common::validation::{validate_release, AssetResolution, ResolvedAssets};
use scfm_common::{Error, Repository};
use tempfile::TempDir;
use uuid::Uuid;

// ========================================
// Fixtures
// ========================================

fn draft(title: &str) -> ReleaseDraft {
    ReleaseDraft {
        song_title: title.to_string(),
        genre: "Synthwave".to_string(),
        release_date: "2024-06-01".to_string(),
        artists: vec![
            ReleaseArtist {
                name: "Ava".to_string(),
                role: ArtistRole::MainArtist,
                bio: String::new(),
            },
            ReleaseArtist {
                name: "Bo".to_string(),
                role: ArtistRole::FeaturedArtist,
                bio: "Guest vocals".to_string(),
            },
        ],
        contact_email: "ava@example.com".to_string(),
        support_phone: Some("+1 555 010 2030".to_string()),
        pitchfork_score: Some("8.1".to_string()),
        copyright_year: "2024".to_string(),
        copyright_holder: "Ava".to_string(),
        publishing_year: "2024".to_string(),
        publishing_holder: "Ava Publishing".to_string(),
        selected_services: vec!["spotify".to_string(), "tidal".to_string()],
        royalty_splits: vec![
            RoyaltySplit {
                collaborator_name: "Ava".to_string(),
                role: "Artist".to_string(),
                share: 70.0,
            },
            RoyaltySplit {
                collaborator_name: "Bo".to_string(),
                role: "Featured".to_string(),
                share: 30.0,
            },
        ],
        audio_file: Some("a.wav".to_string()),
        artwork: Some("b.png".to_string()),
        promo_text: Some("Late-night synth drive.".to_string()),
    }
}

fn release_for(user_id: Uuid, title: &str) -> Release {
    let assets = ResolvedAssets {
        audio: AssetResolution::Found(AssetRef {
            key: format!("{}.wav", Uuid::new_v4()),
            content_type: "audio/wav".to_string(),
            size_bytes: 2048,
        }),
        artwork: AssetResolution::Found(AssetRef {
            key: format!("{}.png", Uuid::new_v4()),
            content_type: "image/png".to_string(),
            size_bytes: 512,
        }),
    };
    let validated = validate_release(&draft(title), assets).unwrap();
    Release::submit(user_id, validated, now())
}

async fn seeded_user(repo: &dyn Repository, name: &str, role: Role) -> User {
    let user = User::new(
        name.to_string(),
        format!("{}@example.com", name.to_lowercase()),
        role,
        now(),
    );
    repo.create_user(&user, &new_credentials("secret1")).await.unwrap();
    user
}

async fn adapters() -> Vec<(&'static str, Arc<dyn Repository>, Option<TempDir>)> {
    let temp = TempDir::new().unwrap();
    let pool = init_database(&temp.path().join("scfm.db")).await.unwrap();
    vec![
        ("memory", Arc::new(MemoryRepository::new()) as Arc<dyn Repository>, None),
        ("sqlite", Arc::new(SqliteRepository::new(pool)) as Arc<dyn Repository>, Some(temp)),
    ]
}

// ========================================
// Users and sessions
// ========================================

#[tokio::test]
async fn test_user_round_trip_and_unique_email() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;

        let found = repo.find_user_by_email("ava@example.com").await.unwrap();
        assert_eq!(found.as_ref().map(|u| u.id), Some(ava.id), "{name}");
        let creds = repo.find_credentials(ava.id).await.unwrap().unwrap();
        assert!(scfm_common::auth::verify_password("secret1", &creds), "{name}");

        let twin = User::new("Twin".to_string(), "ava@example.com".to_string(), Role::Artist, now());
        let err = repo.create_user(&twin, &new_credentials("x")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{name}: {err:?}");

        let mut banned = ava.clone();
        banned.is_banned = true;
        banned.role = Role::Admin;
        repo.update_user(&banned).await.unwrap();
        let stored = repo.find_user(ava.id).await.unwrap().unwrap();
        assert!(stored.is_banned, "{name}");
        assert_eq!(stored.role, Role::Admin, "{name}");
        assert_eq!(repo.list_users().await.unwrap().len(), 1, "{name}");
    }
}

#[tokio::test]
async fn test_update_unknown_user_is_not_found() {
    for (name, repo, _guard) in adapters().await {
        let ghost = User::new("Ghost".to_string(), "ghost@example.com".to_string(), Role::Artist, now());
        let err = repo.update_user(&ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{name}: {err:?}");
    }
}

#[tokio::test]
async fn test_sessions() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        repo.create_session("t1", ava.id, now()).await.unwrap();
        repo.create_session("t2", ava.id, now()).await.unwrap();

        assert_eq!(repo.find_session("t1").await.unwrap(), Some(ava.id), "{name}");
        repo.delete_session("t1").await.unwrap();
        assert_eq!(repo.find_session("t1").await.unwrap(), None, "{name}");

        assert_eq!(repo.delete_sessions_for_user(ava.id).await.unwrap(), 1, "{name}");
        assert_eq!(repo.find_session("t2").await.unwrap(), None, "{name}");
    }
}

// ========================================
// Artists
// ========================================

#[tokio::test]
async fn test_artist_limit_enforced() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        for i in 0..3 {
            let artist = Artist::new(
                ava.id,
                NewArtist {
                    name: format!("Alias {i}"),
                    ..Default::default()
                },
                now() + Duration::milliseconds(i),
            );
            repo.create_artist(&artist, 3).await.unwrap();
        }

        let fourth = Artist::new(
            ava.id,
            NewArtist {
                name: "Alias 4".to_string(),
                ..Default::default()
            },
            now(),
        );
        let err = repo.create_artist(&fourth, 3).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{name}: {err:?}");

        let listed = repo.list_artists(ava.id).await.unwrap();
        assert_eq!(listed.len(), 3, "{name}");
        assert_eq!(listed[0].name, "Alias 0", "{name}");

        assert!(repo.delete_artist(listed[0].id).await.unwrap(), "{name}");
        assert!(!repo.delete_artist(listed[0].id).await.unwrap(), "{name}");
        repo.create_artist(&fourth, 3).await.unwrap();
    }
}

// ========================================
// Releases
// ========================================

#[tokio::test]
async fn test_release_round_trip() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        let release = release_for(ava.id, "Night Drive");
        repo.create_release(&release).await.unwrap();

        let stored = repo.find_release(release.id).await.unwrap().unwrap();
        assert_eq!(stored, release, "{name}");
        assert_eq!(stored.artist_name, "Ava feat. Bo", "{name}");
        assert_eq!(stored.pitchfork_score, Some(8.1), "{name}");
    }
}

#[tokio::test]
async fn test_release_compare_and_swap() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        let release = release_for(ava.id, "Night Drive");
        repo.create_release(&release).await.unwrap();

        let mut approved = release.clone();
        approved.approve(None, now()).unwrap();
        approved.update_financials(1_200, 4.8, now()).unwrap();
        assert_eq!(repo.update_release(&approved).await.unwrap(), 1, "{name}");

        let mut stale = release.clone();
        stale.reject(None, now()).unwrap();
        let err = repo.update_release(&stale).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{name}: {err:?}");

        let stored = repo.find_release(release.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReleaseStatus::Approved, "{name}");
        assert_eq!(stored.streams, 1_200, "{name}");
        assert_eq!(stored.version, 1, "{name}");
        assert_eq!(stored.status_history.len(), 3, "{name}");
    }
}

#[tokio::test]
async fn test_release_streams_must_fit_storage() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;

        let mut oversized = release_for(ava.id, "Night Drive");
        oversized.streams = u64::MAX;
        let err = repo.create_release(&oversized).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{name}: {err:?}");
        assert!(repo.find_release(oversized.id).await.unwrap().is_none(), "{name}");

        let release = release_for(ava.id, "Night Drive");
        repo.create_release(&release).await.unwrap();
        let mut grown = release.clone();
        grown.streams = i64::MAX as u64 + 1;
        let err = repo.update_release(&grown).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{name}: {err:?}");

        let stored = repo.find_release(release.id).await.unwrap().unwrap();
        assert_eq!(stored.streams, 0, "{name}");
        assert_eq!(stored.version, 0, "{name}");

        let mut largest = release.clone();
        largest.streams = i64::MAX as u64;
        repo.update_release(&largest).await.unwrap();
        let stored = repo.find_release(release.id).await.unwrap().unwrap();
        assert_eq!(stored.streams, i64::MAX as u64, "{name}");
    }
}

#[tokio::test]
async fn test_update_missing_release_is_not_found() {
    for (name, repo, _guard) in adapters().await {
        let release = release_for(Uuid::new_v4(), "Ghost");
        let err = repo.update_release(&release).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{name}: {err:?}");
    }
}

#[tokio::test]
async fn test_list_releases_filters_by_owner() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        let bo = seeded_user(repo.as_ref(), "Bo", Role::Artist).await;
        let mut first = release_for(ava.id, "First");
        first.submission_date = now() - Duration::minutes(5);
        repo.create_release(&first).await.unwrap();
        repo.create_release(&release_for(ava.id, "Second")).await.unwrap();
        repo.create_release(&release_for(bo.id, "Other")).await.unwrap();

        let mine = repo.list_releases(Some(ava.id)).await.unwrap();
        assert_eq!(mine.len(), 2, "{name}");
        assert_eq!(mine[0].song_title, "Second", "{name}");
        assert_eq!(repo.list_releases(None).await.unwrap().len(), 3, "{name}");
    }
}

// ========================================
// Tickets
// ========================================

#[tokio::test]
async fn test_ticket_round_trip_and_cas() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        let support = seeded_user(repo.as_ref(), "Support", Role::Admin).await;
        let ticket = Ticket::open(&ava, &ava, "Missing payout", "Financial / Royalties", "Where is it?", now())
            .unwrap();
        repo.create_ticket(&ticket).await.unwrap();

        let mut replied = ticket.clone();
        replied.reply(&support, "Sent today.", now()).unwrap();
        assert_eq!(repo.update_ticket(&replied).await.unwrap(), 1, "{name}");

        let stored = repo.find_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Resolved, "{name}");
        assert_eq!(stored.messages.len(), 2, "{name}");
        assert!(!stored.read_by_artist, "{name}");

        let err = repo.update_ticket(&replied).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{name}: {err:?}");

        assert_eq!(repo.list_tickets(Some(ava.id)).await.unwrap().len(), 1, "{name}");
        assert!(repo.list_tickets(Some(support.id)).await.unwrap().is_empty(), "{name}");
        assert_eq!(repo.list_tickets(None).await.unwrap().len(), 1, "{name}");
    }
}

// ========================================
// Drafts and payment details
// ========================================

#[tokio::test]
async fn test_draft_save_load_clear() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        assert_eq!(repo.load_draft(ava.id).await.unwrap(), None, "{name}");

        let mut partial = ReleaseDraft {
            song_title: "Half done".to_string(),
            ..Default::default()
        };
        repo.save_draft(ava.id, &partial, now()).await.unwrap();
        partial.genre = "Pop".to_string();
        repo.save_draft(ava.id, &partial, now()).await.unwrap();

        assert_eq!(repo.load_draft(ava.id).await.unwrap(), Some(partial), "{name}");
        assert!(repo.clear_draft(ava.id).await.unwrap(), "{name}");
        assert!(!repo.clear_draft(ava.id).await.unwrap(), "{name}");
    }
}

#[tokio::test]
async fn test_payment_details_upsert() {
    for (name, repo, _guard) in adapters().await {
        let ava = seeded_user(repo.as_ref(), "Ava", Role::Artist).await;
        let mut details = PaymentDetails {
            paypal_email: "pay@ava.example".to_string(),
            city: "Lisbon".to_string(),
            ..Default::default()
        };
        repo.save_payment_details(ava.id, &details).await.unwrap();
        details.country = "Portugal".to_string();
        repo.save_payment_details(ava.id, &details).await.unwrap();

        assert_eq!(repo.load_payment_details(ava.id).await.unwrap(), Some(details), "{name}");
    }
}

#[tokio::test]
async fn test_in_memory_sqlite_pool() {
    let repo = SqliteRepository::new(connect_in_memory().await.unwrap());
    let ava = seeded_user(&repo, "Ava", Role::Artist).await;
    assert_eq!(repo.find_user(ava.id).await.unwrap().map(|u| u.name), Some("Ava".to_string()));
}
