//! SQLite repository adapter
//!
//! Scalar fields map to columns; nested lists and asset references are stored
//! as JSON text. UUIDs are stored as their hyphenated string form.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{artist_limit_reached, stale_write, storable_streams, Repository};
use crate::models::{
    Artist, Credentials, PaymentDetails, Release, ReleaseDraft, ReleaseStatus, Role, Ticket,
    TicketStatus, User,
};
use crate::{Error, Result};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Wrap a pool whose schema was created by [`crate::db::init_database`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ========================================
// Column helpers
// ========================================

fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| Error::Internal(format!("bad uuid in {}: {}", column, e)))
}

fn json_col<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw)?)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Map a UNIQUE violation to `Conflict`
fn unique_conflict(err: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(message()),
        _ => Error::Database(err),
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: Role::parse(&role).ok_or_else(|| Error::Internal(format!("unknown role '{}'", role)))?,
        is_banned: row.try_get("is_banned")?,
        created_at: row.try_get("created_at")?,
    })
}

fn artist_from_row(row: &SqliteRow) -> Result<Artist> {
    Ok(Artist {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        name: row.try_get("name")?,
        spotify_url: row.try_get("spotify_url")?,
        instagram_url: row.try_get("instagram_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn release_from_row(row: &SqliteRow) -> Result<Release> {
    let status: String = row.try_get("status")?;
    let streams: i64 = row.try_get("streams")?;
    let release_date: NaiveDate = row.try_get("release_date")?;
    Ok(Release {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        song_title: row.try_get("song_title")?,
        artist_name: row.try_get("artist_name")?,
        artists: json_col(row, "artists")?,
        genre: row.try_get("genre")?,
        release_date,
        contact_email: row.try_get("contact_email")?,
        support_phone: row.try_get("support_phone")?,
        pitchfork_score: row.try_get("pitchfork_score")?,
        copyright_year: row.try_get("copyright_year")?,
        copyright_holder: row.try_get("copyright_holder")?,
        publishing_year: row.try_get("publishing_year")?,
        publishing_holder: row.try_get("publishing_holder")?,
        composer: row.try_get("composer")?,
        lyricist: row.try_get("lyricist")?,
        producer_credits: row.try_get("producer_credits")?,
        selected_services: json_col(row, "selected_services")?,
        royalty_splits: json_col(row, "royalty_splits")?,
        audio_file: json_col(row, "audio_file")?,
        artwork: json_col(row, "artwork")?,
        promo_text: row.try_get("promo_text")?,
        status: ReleaseStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("unknown release status '{}'", status)))?,
        status_history: json_col(row, "status_history")?,
        submission_date: row.try_get("submission_date")?,
        status_update_date: row.try_get("status_update_date")?,
        streams: u64::try_from(streams)
            .map_err(|_| Error::Internal(format!("negative stream count {}", streams)))?,
        revenue: row.try_get("revenue")?,
        version: row.try_get("version")?,
    })
}

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket> {
    let status: String = row.try_get("status")?;
    Ok(Ticket {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        user_name: row.try_get("user_name")?,
        subject: row.try_get("subject")?,
        category: row.try_get("category")?,
        status: TicketStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("unknown ticket status '{}'", status)))?,
        last_updated: row.try_get("last_updated")?,
        messages: json_col(row, "messages")?,
        read_by_artist: row.try_get("read_by_artist")?,
        read_by_admin: row.try_get("read_by_admin")?,
        version: row.try_get("version")?,
    })
}

impl SqliteRepository {
    /// Distinguish a lost compare-and-swap from a missing row
    async fn cas_failure(&self, table: &str, kind: &str, id: Uuid, expected: i64) -> Error {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", table);
        match sqlx::query_scalar::<_, i64>(&sql)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
        {
            Ok(0) => Error::NotFound(format!("{} {}", kind, id)),
            Ok(_) => stale_write(kind, id, expected),
            Err(e) => Error::Database(e),
        }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    // ========================================
    // Users
    // ========================================

    async fn create_user(&self, user: &User, credentials: &Credentials) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, role, is_banned, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_banned)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_conflict(e, || format!("email {} is already registered", user.email)))?;

        sqlx::query("INSERT INTO credentials (user_id, password_hash, password_salt) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&credentials.password_hash)
            .bind(&credentials.password_salt)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT password_hash, password_salt FROM credentials WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(password_hash, password_salt)| Credentials {
            password_hash,
            password_salt,
        }))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query("UPDATE users SET name = ?, email = ?, role = ?, is_banned = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(user.is_banned)
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| unique_conflict(e, || format!("email {} is already registered", user.email)))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    // ========================================
    // Sessions
    // ========================================

    async fn create_session(&self, token: &str, user_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id.to_string())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Uuid>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(|s| {
            Uuid::parse_str(&s).map_err(|e| Error::Internal(format!("bad session owner: {}", e)))
        })
        .transpose()
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ========================================
    // Artist profiles
    // ========================================

    async fn create_artist(&self, artist: &Artist, max_per_user: usize) -> Result<()> {
        // Count and insert in one statement so concurrent creates cannot overshoot
        let result = sqlx::query(
            r#"
            INSERT INTO artists (id, user_id, name, spotify_url, instagram_url, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE (SELECT COUNT(*) FROM artists WHERE user_id = ?) < ?
            "#,
        )
        .bind(artist.id.to_string())
        .bind(artist.user_id.to_string())
        .bind(&artist.name)
        .bind(&artist.spotify_url)
        .bind(&artist.instagram_url)
        .bind(artist.created_at)
        .bind(artist.user_id.to_string())
        .bind(max_per_user as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(artist_limit_reached(max_per_user));
        }
        Ok(())
    }

    async fn list_artists(&self, user_id: Uuid) -> Result<Vec<Artist>> {
        sqlx::query("SELECT * FROM artists WHERE user_id = ? ORDER BY created_at")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(artist_from_row)
            .collect()
    }

    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>> {
        sqlx::query("SELECT * FROM artists WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(artist_from_row)
            .transpose()
    }

    async fn delete_artist(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artists WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================================
    // Releases
    // ========================================

    async fn create_release(&self, r: &Release) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO releases (
                id, user_id, song_title, artist_name, artists, genre, release_date,
                contact_email, support_phone, pitchfork_score,
                copyright_year, copyright_holder, publishing_year, publishing_holder,
                composer, lyricist, producer_credits, selected_services, royalty_splits,
                audio_file, artwork, promo_text, status, status_history,
                submission_date, status_update_date, streams, revenue, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(r.id.to_string())
        .bind(r.user_id.to_string())
        .bind(&r.song_title)
        .bind(&r.artist_name)
        .bind(to_json(&r.artists)?)
        .bind(&r.genre)
        .bind(r.release_date)
        .bind(&r.contact_email)
        .bind(&r.support_phone)
        .bind(r.pitchfork_score)
        .bind(&r.copyright_year)
        .bind(&r.copyright_holder)
        .bind(&r.publishing_year)
        .bind(&r.publishing_holder)
        .bind(&r.composer)
        .bind(&r.lyricist)
        .bind(&r.producer_credits)
        .bind(to_json(&r.selected_services)?)
        .bind(to_json(&r.royalty_splits)?)
        .bind(to_json(&r.audio_file)?)
        .bind(to_json(&r.artwork)?)
        .bind(&r.promo_text)
        .bind(r.status.as_str())
        .bind(to_json(&r.status_history)?)
        .bind(r.submission_date)
        .bind(r.status_update_date)
        .bind(storable_streams(r.streams)?)
        .bind(r.revenue)
        .bind(r.version)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_conflict(e, || format!("release {} already exists", r.id)))?;
        Ok(())
    }

    async fn find_release(&self, id: Uuid) -> Result<Option<Release>> {
        sqlx::query("SELECT * FROM releases WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(release_from_row)
            .transpose()
    }

    async fn update_release(&self, r: &Release) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE releases SET
                song_title = ?, artist_name = ?, artists = ?, genre = ?, release_date = ?,
                contact_email = ?, support_phone = ?, pitchfork_score = ?,
                copyright_year = ?, copyright_holder = ?, publishing_year = ?, publishing_holder = ?,
                composer = ?, lyricist = ?, producer_credits = ?,
                selected_services = ?, royalty_splits = ?, audio_file = ?, artwork = ?,
                promo_text = ?, status = ?, status_history = ?, status_update_date = ?,
                streams = ?, revenue = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&r.song_title)
        .bind(&r.artist_name)
        .bind(to_json(&r.artists)?)
        .bind(&r.genre)
        .bind(r.release_date)
        .bind(&r.contact_email)
        .bind(&r.support_phone)
        .bind(r.pitchfork_score)
        .bind(&r.copyright_year)
        .bind(&r.copyright_holder)
        .bind(&r.publishing_year)
        .bind(&r.publishing_holder)
        .bind(&r.composer)
        .bind(&r.lyricist)
        .bind(&r.producer_credits)
        .bind(to_json(&r.selected_services)?)
        .bind(to_json(&r.royalty_splits)?)
        .bind(to_json(&r.audio_file)?)
        .bind(to_json(&r.artwork)?)
        .bind(&r.promo_text)
        .bind(r.status.as_str())
        .bind(to_json(&r.status_history)?)
        .bind(r.status_update_date)
        .bind(storable_streams(r.streams)?)
        .bind(r.revenue)
        .bind(r.id.to_string())
        .bind(r.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure("releases", "release", r.id, r.version).await);
        }
        Ok(r.version + 1)
    }

    async fn list_releases(&self, user_id: Option<Uuid>) -> Result<Vec<Release>> {
        let rows = match user_id {
            Some(owner) => {
                sqlx::query("SELECT * FROM releases WHERE user_id = ? ORDER BY submission_date DESC")
                    .bind(owner.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM releases ORDER BY submission_date DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(release_from_row).collect()
    }

    // ========================================
    // Tickets
    // ========================================

    async fn create_ticket(&self, t: &Ticket) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, user_id, user_name, subject, category, status, last_updated,
                messages, read_by_artist, read_by_admin, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(t.id.to_string())
        .bind(t.user_id.to_string())
        .bind(&t.user_name)
        .bind(&t.subject)
        .bind(&t.category)
        .bind(t.status.as_str())
        .bind(t.last_updated)
        .bind(to_json(&t.messages)?)
        .bind(t.read_by_artist)
        .bind(t.read_by_admin)
        .bind(t.version)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_conflict(e, || format!("ticket {} already exists", t.id)))?;
        Ok(())
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        sqlx::query("SELECT * FROM tickets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(ticket_from_row)
            .transpose()
    }

    async fn update_ticket(&self, t: &Ticket) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET
                user_name = ?, subject = ?, category = ?, status = ?, last_updated = ?,
                messages = ?, read_by_artist = ?, read_by_admin = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&t.user_name)
        .bind(&t.subject)
        .bind(&t.category)
        .bind(t.status.as_str())
        .bind(t.last_updated)
        .bind(to_json(&t.messages)?)
        .bind(t.read_by_artist)
        .bind(t.read_by_admin)
        .bind(t.id.to_string())
        .bind(t.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure("tickets", "ticket", t.id, t.version).await);
        }
        Ok(t.version + 1)
    }

    async fn list_tickets(&self, user_id: Option<Uuid>) -> Result<Vec<Ticket>> {
        let rows = match user_id {
            Some(owner) => {
                sqlx::query("SELECT * FROM tickets WHERE user_id = ? ORDER BY last_updated DESC")
                    .bind(owner.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM tickets ORDER BY last_updated DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(ticket_from_row).collect()
    }

    // ========================================
    // Drafts and payment details
    // ========================================

    async fn save_draft(&self, user_id: Uuid, draft: &ReleaseDraft, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO drafts (user_id, data, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(to_json(draft)?)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_draft(&self, user_id: Uuid) -> Result<Option<ReleaseDraft>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT data FROM drafts WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(raw.map(|data| serde_json::from_str(&data)).transpose()?)
    }

    async fn clear_draft(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drafts WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_payment_details(&self, user_id: Uuid, d: &PaymentDetails) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_details (user_id, paypal_email, street, city, state, zip_code, country)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                paypal_email = excluded.paypal_email,
                street = excluded.street,
                city = excluded.city,
                state = excluded.state,
                zip_code = excluded.zip_code,
                country = excluded.country
            "#,
        )
        .bind(user_id.to_string())
        .bind(&d.paypal_email)
        .bind(&d.street)
        .bind(&d.city)
        .bind(&d.state)
        .bind(&d.zip_code)
        .bind(&d.country)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_payment_details(&self, user_id: Uuid) -> Result<Option<PaymentDetails>> {
        let row = sqlx::query_as::<_, (String, String, String, String, String, String)>(
            "SELECT paypal_email, street, city, state, zip_code, country FROM payment_details WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(paypal_email, street, city, state, zip_code, country)| PaymentDetails {
            paypal_email,
            street,
            city,
            state,
            zip_code,
            country,
        }))
    }
}
