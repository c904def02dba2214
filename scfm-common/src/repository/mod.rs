//! Persistence port
//!
//! Services depend on `Arc<dyn Repository>` and never on a concrete store.
//! Two adapters exist: [`MemoryRepository`] and [`SqliteRepository`].
//!
//! Releases and tickets are written with compare-and-swap on `version`: an
//! update succeeds only if the stored version equals the version the caller
//! read, and the stored version is then incremented.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Artist, Credentials, PaymentDetails, Release, ReleaseDraft, Ticket, User};
use crate::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    // Users

    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, user: &User, credentials: &Credentials) -> Result<()>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    /// `email` must already be normalized
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>>;
    /// Fails with `NotFound` for unknown ids and `Conflict` for a taken email
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn list_users(&self) -> Result<Vec<User>>;

    // Sessions

    async fn create_session(&self, token: &str, user_id: Uuid, now: DateTime<Utc>) -> Result<()>;
    async fn find_session(&self, token: &str) -> Result<Option<Uuid>>;
    async fn delete_session(&self, token: &str) -> Result<()>;
    /// Returns the number of revoked sessions
    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64>;

    // Artist profiles

    /// Insert unless the owner already has `max_per_user` profiles (`Conflict`)
    async fn create_artist(&self, artist: &Artist, max_per_user: usize) -> Result<()>;
    /// Oldest first
    async fn list_artists(&self, user_id: Uuid) -> Result<Vec<Artist>>;
    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>>;
    /// Returns whether a profile was removed
    async fn delete_artist(&self, id: Uuid) -> Result<bool>;

    // Releases

    async fn create_release(&self, release: &Release) -> Result<()>;
    async fn find_release(&self, id: Uuid) -> Result<Option<Release>>;
    /// Compare-and-swap write; returns the new version
    async fn update_release(&self, release: &Release) -> Result<i64>;
    /// Newest submission first; `None` lists every user's releases
    async fn list_releases(&self, user_id: Option<Uuid>) -> Result<Vec<Release>>;

    // Tickets

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()>;
    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>>;
    /// Compare-and-swap write; returns the new version
    async fn update_ticket(&self, ticket: &Ticket) -> Result<i64>;
    /// Most recently updated first
    async fn list_tickets(&self, user_id: Option<Uuid>) -> Result<Vec<Ticket>>;

    // Drafts

    async fn save_draft(&self, user_id: Uuid, draft: &ReleaseDraft, now: DateTime<Utc>) -> Result<()>;
    async fn load_draft(&self, user_id: Uuid) -> Result<Option<ReleaseDraft>>;
    /// Returns whether a draft existed
    async fn clear_draft(&self, user_id: Uuid) -> Result<bool>;

    // Payment details

    async fn save_payment_details(&self, user_id: Uuid, details: &PaymentDetails) -> Result<()>;
    async fn load_payment_details(&self, user_id: Uuid) -> Result<Option<PaymentDetails>>;
}

/// Error for a compare-and-swap write that lost the race
pub(crate) fn stale_write(kind: &str, id: Uuid, expected: i64) -> crate::Error {
    crate::Error::Conflict(format!(
        "{} {} was modified concurrently (expected version {})",
        kind, id, expected
    ))
}

/// Stream counts are stored as SQLite INTEGER; anything past `i64::MAX` is refused
pub(crate) fn storable_streams(streams: u64) -> crate::Result<i64> {
    i64::try_from(streams).map_err(|_| {
        crate::Error::InvalidInput(format!("stream count {} is out of range", streams))
    })
}

pub(crate) fn artist_limit_reached(max_per_user: usize) -> crate::Error {
    crate::Error::Conflict(format!(
        "Artist limit reached ({} profiles per account)",
        max_per_user
    ))
}
