//! In-memory repository adapter
//!
//! Everything lives behind one `RwLock`, so each method is atomic. Used by
//! tests and by the `memory` storage backend; contents are lost on exit.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{artist_limit_reached, stale_write, storable_streams, Repository};
use crate::models::{Artist, Credentials, PaymentDetails, Release, ReleaseDraft, Ticket, User};
use crate::{Error, Result};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    credentials: HashMap<Uuid, Credentials>,
    sessions: HashMap<String, Uuid>,
    artists: HashMap<Uuid, Artist>,
    releases: HashMap<Uuid, Release>,
    tickets: HashMap<Uuid, Ticket>,
    drafts: HashMap<Uuid, ReleaseDraft>,
    payment_details: HashMap<Uuid, PaymentDetails>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: &User, credentials: &Credentials) -> Result<()> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(Error::Conflict(format!("email {} is already registered", user.email)));
        }
        state.users.insert(user.id, user.clone());
        state.credentials.insert(user.id, credentials.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>> {
        Ok(self.state.read().await.credentials.get(&user_id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(Error::NotFound(format!("user {}", user.id)));
        }
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(Error::Conflict(format!("email {} is already registered", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.state.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn create_session(&self, token: &str, user_id: Uuid, _now: DateTime<Utc>) -> Result<()> {
        self.state.write().await.sessions.insert(token.to_string(), user_id);
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.state.read().await.sessions.get(token).copied())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.state.write().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, owner| *owner != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn create_artist(&self, artist: &Artist, max_per_user: usize) -> Result<()> {
        let mut state = self.state.write().await;
        let owned = state
            .artists
            .values()
            .filter(|a| a.user_id == artist.user_id)
            .count();
        if owned >= max_per_user {
            return Err(artist_limit_reached(max_per_user));
        }
        state.artists.insert(artist.id, artist.clone());
        Ok(())
    }

    async fn list_artists(&self, user_id: Uuid) -> Result<Vec<Artist>> {
        let state = self.state.read().await;
        let mut artists: Vec<Artist> = state
            .artists
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        artists.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(artists)
    }

    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>> {
        Ok(self.state.read().await.artists.get(&id).cloned())
    }

    async fn delete_artist(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.write().await.artists.remove(&id).is_some())
    }

    async fn create_release(&self, release: &Release) -> Result<()> {
        storable_streams(release.streams)?;
        let mut state = self.state.write().await;
        if state.releases.contains_key(&release.id) {
            return Err(Error::Conflict(format!("release {} already exists", release.id)));
        }
        state.releases.insert(release.id, release.clone());
        Ok(())
    }

    async fn find_release(&self, id: Uuid) -> Result<Option<Release>> {
        Ok(self.state.read().await.releases.get(&id).cloned())
    }

    async fn update_release(&self, release: &Release) -> Result<i64> {
        storable_streams(release.streams)?;
        let mut state = self.state.write().await;
        let stored = state
            .releases
            .get_mut(&release.id)
            .ok_or_else(|| Error::NotFound(format!("release {}", release.id)))?;
        if stored.version != release.version {
            return Err(stale_write("release", release.id, release.version));
        }
        let mut next = release.clone();
        next.version = release.version + 1;
        *stored = next;
        Ok(release.version + 1)
    }

    async fn list_releases(&self, user_id: Option<Uuid>) -> Result<Vec<Release>> {
        let state = self.state.read().await;
        let mut releases: Vec<Release> = state
            .releases
            .values()
            .filter(|r| user_id.map_or(true, |owner| r.user_id == owner))
            .cloned()
            .collect();
        releases.sort_by(|a, b| b.submission_date.cmp(&a.submission_date));
        Ok(releases)
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut state = self.state.write().await;
        if state.tickets.contains_key(&ticket.id) {
            return Err(Error::Conflict(format!("ticket {} already exists", ticket.id)));
        }
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<i64> {
        let mut state = self.state.write().await;
        let stored = state
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| Error::NotFound(format!("ticket {}", ticket.id)))?;
        if stored.version != ticket.version {
            return Err(stale_write("ticket", ticket.id, ticket.version));
        }
        let mut next = ticket.clone();
        next.version = ticket.version + 1;
        *stored = next;
        Ok(ticket.version + 1)
    }

    async fn list_tickets(&self, user_id: Option<Uuid>) -> Result<Vec<Ticket>> {
        let state = self.state.read().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| user_id.map_or(true, |owner| t.user_id == owner))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(tickets)
    }

    async fn save_draft(&self, user_id: Uuid, draft: &ReleaseDraft, _now: DateTime<Utc>) -> Result<()> {
        self.state.write().await.drafts.insert(user_id, draft.clone());
        Ok(())
    }

    async fn load_draft(&self, user_id: Uuid) -> Result<Option<ReleaseDraft>> {
        Ok(self.state.read().await.drafts.get(&user_id).cloned())
    }

    async fn clear_draft(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.state.write().await.drafts.remove(&user_id).is_some())
    }

    async fn save_payment_details(&self, user_id: Uuid, details: &PaymentDetails) -> Result<()> {
        self.state
            .write()
            .await
            .payment_details
            .insert(user_id, details.clone());
        Ok(())
    }

    async fn load_payment_details(&self, user_id: Uuid) -> Result<Option<PaymentDetails>> {
        Ok(self.state.read().await.payment_details.get(&user_id).cloned())
    }
}
