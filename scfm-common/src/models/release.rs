//! Releases and their review lifecycle
//!
//! A release is one song submitted by an artist. Every status change is
//! appended to `status_history`; the last entry always mirrors `status`.
//!
//! Transitions:
//! - submit: (new) -> PendingApproval
//! - edit: any -> PendingApproval (edits always force re-review)
//! - approve: PendingApproval | Rejected -> Approved
//! - reject: PendingApproval | Approved -> Rejected
//! - update financials: no status change, history entry only

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::assets::AssetRef;
use crate::{Error, Result};

pub const NOTE_SUBMITTED: &str = "Submission received";
pub const NOTE_EDITED: &str = "Updated by artist, pending re-review";
pub const NOTE_APPROVED: &str = "Approved by admin";
pub const NOTE_REJECTED: &str = "Rejected by admin";
pub const NOTE_FINANCIALS: &str = "Financials updated";

/// Review status of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Approved,
    Rejected,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::PendingApproval => "Pending Approval",
            ReleaseStatus::Approved => "Approved",
            ReleaseStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending Approval" => Some(ReleaseStatus::PendingApproval),
            "Approved" => Some(ReleaseStatus::Approved),
            "Rejected" => Some(ReleaseStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the append-only audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: ReleaseStatus,
    pub date: DateTime<Utc>,
    pub note: String,
}

/// Credit role of an artist on a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtistRole {
    #[serde(rename = "Main Artist")]
    MainArtist,
    #[serde(rename = "Featured Artist")]
    FeaturedArtist,
    Composer,
    Lyricist,
    Producer,
    Remixer,
}

impl ArtistRole {
    pub const ALL: [ArtistRole; 6] = [
        ArtistRole::MainArtist,
        ArtistRole::FeaturedArtist,
        ArtistRole::Composer,
        ArtistRole::Lyricist,
        ArtistRole::Producer,
        ArtistRole::Remixer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistRole::MainArtist => "Main Artist",
            ArtistRole::FeaturedArtist => "Featured Artist",
            ArtistRole::Composer => "Composer",
            ArtistRole::Lyricist => "Lyricist",
            ArtistRole::Producer => "Producer",
            ArtistRole::Remixer => "Remixer",
        }
    }
}

/// Artist credited on a release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseArtist {
    pub name: String,
    pub role: ArtistRole,
    #[serde(default)]
    pub bio: String,
}

/// Named revenue share; shares across a release total 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoyaltySplit {
    pub collaborator_name: String,
    #[serde(default)]
    pub role: String,
    pub share: f64,
}

/// Raw submission form, possibly incomplete
///
/// Also the shape of a saved draft. Assets are referenced by the key returned
/// from the upload endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDraft {
    pub song_title: String,
    pub genre: String,
    pub release_date: String,
    pub artists: Vec<ReleaseArtist>,
    pub contact_email: String,
    pub support_phone: Option<String>,
    #[serde(deserialize_with = "number_or_text")]
    pub pitchfork_score: Option<String>,
    pub copyright_year: String,
    pub copyright_holder: String,
    pub publishing_year: String,
    pub publishing_holder: String,
    pub selected_services: Vec<String>,
    pub royalty_splits: Vec<RoyaltySplit>,
    pub audio_file: Option<String>,
    pub artwork: Option<String>,
    pub promo_text: Option<String>,
}

/// Accept `"8.4"`, `8.4` or null for a score field
fn number_or_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::Text(s)) => Some(s),
        None => None,
    })
}

/// Submission payload after every field rule passed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRelease {
    pub song_title: String,
    pub artist_name: String,
    pub artists: Vec<ReleaseArtist>,
    pub genre: String,
    pub release_date: NaiveDate,
    pub contact_email: String,
    pub support_phone: Option<String>,
    pub pitchfork_score: Option<f64>,
    pub copyright_year: String,
    pub copyright_holder: String,
    pub publishing_year: String,
    pub publishing_holder: String,
    pub composer: String,
    pub lyricist: String,
    pub producer_credits: String,
    pub selected_services: Vec<String>,
    pub royalty_splits: Vec<RoyaltySplit>,
    pub audio_file: AssetRef,
    pub artwork: AssetRef,
    pub promo_text: Option<String>,
}

/// Persisted release record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: Uuid,
    pub user_id: Uuid,
    pub song_title: String,
    pub artist_name: String,
    pub artists: Vec<ReleaseArtist>,
    pub genre: String,
    pub release_date: NaiveDate,
    pub contact_email: String,
    pub support_phone: Option<String>,
    pub pitchfork_score: Option<f64>,
    pub copyright_year: String,
    pub copyright_holder: String,
    pub publishing_year: String,
    pub publishing_holder: String,
    pub composer: String,
    pub lyricist: String,
    pub producer_credits: String,
    pub selected_services: Vec<String>,
    pub royalty_splits: Vec<RoyaltySplit>,
    pub audio_file: AssetRef,
    pub artwork: AssetRef,
    pub promo_text: Option<String>,
    pub status: ReleaseStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub submission_date: DateTime<Utc>,
    pub status_update_date: Option<DateTime<Utc>>,
    pub streams: u64,
    pub revenue: f64,
    /// Incremented by the repository on every successful write
    pub version: i64,
}

impl Release {
    /// Create a new submission in `PendingApproval`
    pub fn submit(user_id: Uuid, input: ValidatedRelease, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            song_title: input.song_title,
            artist_name: input.artist_name,
            artists: input.artists,
            genre: input.genre,
            release_date: input.release_date,
            contact_email: input.contact_email,
            support_phone: input.support_phone,
            pitchfork_score: input.pitchfork_score,
            copyright_year: input.copyright_year,
            copyright_holder: input.copyright_holder,
            publishing_year: input.publishing_year,
            publishing_holder: input.publishing_holder,
            composer: input.composer,
            lyricist: input.lyricist,
            producer_credits: input.producer_credits,
            selected_services: input.selected_services,
            royalty_splits: input.royalty_splits,
            audio_file: input.audio_file,
            artwork: input.artwork,
            promo_text: input.promo_text,
            status: ReleaseStatus::PendingApproval,
            status_history: vec![StatusHistoryEntry {
                status: ReleaseStatus::PendingApproval,
                date: now,
                note: NOTE_SUBMITTED.to_string(),
            }],
            submission_date: now,
            status_update_date: None,
            streams: 0,
            revenue: 0.0,
            version: 0,
        }
    }

    /// Replace the metadata and force the release back into review
    pub fn apply_edit(&mut self, input: ValidatedRelease, now: DateTime<Utc>) {
        self.assign(input);
        self.transition(ReleaseStatus::PendingApproval, NOTE_EDITED.to_string(), now);
    }

    /// Admin approval; allowed from `PendingApproval` and `Rejected`
    pub fn approve(&mut self, note: Option<String>, now: DateTime<Utc>) -> Result<()> {
        if self.status == ReleaseStatus::Approved {
            return Err(Error::InvalidTransition(format!(
                "release {} is already {}",
                self.id, self.status
            )));
        }
        let note = note.unwrap_or_else(|| NOTE_APPROVED.to_string());
        self.transition(ReleaseStatus::Approved, note, now);
        Ok(())
    }

    /// Admin rejection; allowed from `PendingApproval` and `Approved`
    pub fn reject(&mut self, note: Option<String>, now: DateTime<Utc>) -> Result<()> {
        if self.status == ReleaseStatus::Rejected {
            return Err(Error::InvalidTransition(format!(
                "release {} is already {}",
                self.id, self.status
            )));
        }
        let note = note.unwrap_or_else(|| NOTE_REJECTED.to_string());
        self.transition(ReleaseStatus::Rejected, note, now);
        Ok(())
    }

    /// Set streams and revenue; status is unchanged
    ///
    /// Whether the release must be approved first is the caller's policy.
    pub fn update_financials(&mut self, streams: u64, revenue: f64, now: DateTime<Utc>) -> Result<()> {
        if !revenue.is_finite() || revenue < 0.0 {
            return Err(Error::InvalidInput(format!(
                "revenue must be a non-negative amount, got {}",
                revenue
            )));
        }
        if i64::try_from(streams).is_err() {
            return Err(Error::InvalidInput(format!("stream count {} is out of range", streams)));
        }
        self.streams = streams;
        self.revenue = revenue;
        self.push_history(self.status, NOTE_FINANCIALS.to_string(), now);
        Ok(())
    }

    /// Latest history entry (always present after creation)
    pub fn latest_history(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }

    /// Check the history invariants: non-empty, ordered, last entry matches `status`
    pub fn history_is_consistent(&self) -> bool {
        let ordered = self
            .status_history
            .windows(2)
            .all(|pair| pair[0].date <= pair[1].date);
        ordered
            && self
                .latest_history()
                .is_some_and(|entry| entry.status == self.status)
    }

    fn transition(&mut self, status: ReleaseStatus, note: String, now: DateTime<Utc>) {
        let stamp = self.push_history(status, note, now);
        self.status = status;
        self.status_update_date = Some(stamp);
    }

    fn push_history(&mut self, status: ReleaseStatus, note: String, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = crate::time::not_before(now, self.latest_history().map(|e| e.date));
        self.status_history.push(StatusHistoryEntry {
            status,
            date: stamp,
            note,
        });
        stamp
    }

    fn assign(&mut self, input: ValidatedRelease) {
        self.song_title = input.song_title;
        self.artist_name = input.artist_name;
        self.artists = input.artists;
        self.genre = input.genre;
        self.release_date = input.release_date;
        self.contact_email = input.contact_email;
        self.support_phone = input.support_phone;
        self.pitchfork_score = input.pitchfork_score;
        self.copyright_year = input.copyright_year;
        self.copyright_holder = input.copyright_holder;
        self.publishing_year = input.publishing_year;
        self.publishing_holder = input.publishing_holder;
        self.composer = input.composer;
        self.lyricist = input.lyricist;
        self.producer_credits = input.producer_credits;
        self.selected_services = input.selected_services;
        self.royalty_splits = input.royalty_splits;
        self.audio_file = input.audio_file;
        self.artwork = input.artwork;
        self.promo_text = input.promo_text;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn validated(title: &str) -> ValidatedRelease {
        ValidatedRelease {
            song_title: title.to_string(),
            artist_name: "Ava".to_string(),
            artists: vec![ReleaseArtist {
                name: "Ava".to_string(),
                role: ArtistRole::MainArtist,
                bio: String::new(),
            }],
            genre: "Synthwave".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            contact_email: "ava@example.com".to_string(),
            support_phone: None,
            pitchfork_score: None,
            copyright_year: "2024".to_string(),
            copyright_holder: "Ava".to_string(),
            publishing_year: "2024".to_string(),
            publishing_holder: "Ava Publishing".to_string(),
            composer: String::new(),
            lyricist: String::new(),
            producer_credits: String::new(),
            selected_services: vec!["spotify".to_string()],
            royalty_splits: vec![RoyaltySplit {
                collaborator_name: "Ava".to_string(),
                role: "Artist".to_string(),
                share: 100.0,
            }],
            audio_file: AssetRef::for_tests("audio/wav"),
            artwork: AssetRef::for_tests("image/png"),
            promo_text: None,
        }
    }

    #[test]
    fn test_submit_starts_pending_with_one_entry() {
        let now = crate::time::now();
        let release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);

        assert_eq!(release.status, ReleaseStatus::PendingApproval);
        assert_eq!(release.status_history.len(), 1);
        assert_eq!(release.status_history[0].note, NOTE_SUBMITTED);
        assert_eq!(release.submission_date, now);
        assert_eq!(release.status_update_date, None);
        assert_eq!(release.streams, 0);
        assert_eq!(release.revenue, 0.0);
        assert!(release.history_is_consistent());
    }

    #[test]
    fn test_night_drive_approval_scenario() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);

        release.approve(None, now + Duration::seconds(1)).unwrap();

        assert_eq!(release.status, ReleaseStatus::Approved);
        assert_eq!(release.status_history.len(), 2);
        assert!(release.status_update_date.is_some());
        assert!(release.history_is_consistent());
    }

    #[test]
    fn test_edit_forces_pending_from_every_status() {
        let now = crate::time::now();
        for prior in [
            ReleaseStatus::PendingApproval,
            ReleaseStatus::Approved,
            ReleaseStatus::Rejected,
        ] {
            let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
            match prior {
                ReleaseStatus::Approved => release.approve(None, now).unwrap(),
                ReleaseStatus::Rejected => release.reject(None, now).unwrap(),
                ReleaseStatus::PendingApproval => {}
            }
            let before = release.status_history.len();

            release.apply_edit(validated("Night Drive (Remaster)"), now + Duration::seconds(5));

            assert_eq!(release.status, ReleaseStatus::PendingApproval);
            assert_eq!(release.status_history.len(), before + 1);
            assert_eq!(release.latest_history().unwrap().note, NOTE_EDITED);
            assert_eq!(release.song_title, "Night Drive (Remaster)");
            assert!(release.history_is_consistent());
        }
    }

    #[test]
    fn test_approve_rejected_release_appends_history() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        release.reject(Some("Artwork too small".to_string()), now).unwrap();
        let snapshot = release.status_history.clone();

        release.approve(None, now + Duration::seconds(1)).unwrap();

        assert_eq!(release.status, ReleaseStatus::Approved);
        assert_eq!(release.status_history.len(), 3);
        assert_eq!(&release.status_history[..2], &snapshot[..]);
        assert_eq!(release.status_history[1].note, "Artwork too small");
    }

    #[test]
    fn test_reject_approved_release() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        release.approve(None, now).unwrap();
        release.reject(None, now).unwrap();
        assert_eq!(release.status, ReleaseStatus::Rejected);
        assert_eq!(release.status_history.len(), 3);
    }

    #[test]
    fn test_repeated_transition_is_invalid() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        release.approve(None, now).unwrap();

        let err = release.approve(None, now).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(release.status_history.len(), 2);

        release.reject(None, now).unwrap();
        assert!(matches!(release.reject(None, now), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_update_financials_keeps_status() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        release.approve(None, now).unwrap();
        let stamped = release.status_update_date;

        release.update_financials(12_000, 48.5, now).unwrap();

        assert_eq!(release.status, ReleaseStatus::Approved);
        assert_eq!(release.streams, 12_000);
        assert_eq!(release.revenue, 48.5);
        assert_eq!(release.status_update_date, stamped);
        assert_eq!(release.latest_history().unwrap().note, NOTE_FINANCIALS);
        assert!(release.history_is_consistent());
    }

    #[test]
    fn test_update_financials_rejects_negative_revenue() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        assert!(matches!(
            release.update_financials(1, -3.0, now),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(release.status_history.len(), 1);
    }

    #[test]
    fn test_update_financials_rejects_oversized_streams() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);
        release.approve(None, now).unwrap();

        assert!(matches!(
            release.update_financials(u64::MAX, 1.0, now),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(release.streams, 0);

        release.update_financials(i64::MAX as u64, 1.0, now).unwrap();
        assert_eq!(release.streams, i64::MAX as u64);
    }

    #[test]
    fn test_history_never_goes_backwards() {
        let now = crate::time::now();
        let mut release = Release::submit(Uuid::new_v4(), validated("Night Drive"), now);

        release.approve(None, now - Duration::hours(1)).unwrap();

        assert_eq!(release.status_history[1].date, now);
        assert_eq!(release.status_update_date, Some(now));
        assert!(release.history_is_consistent());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReleaseStatus::PendingApproval).unwrap(),
            "\"Pending Approval\""
        );
        assert_eq!(ReleaseStatus::parse("Approved"), Some(ReleaseStatus::Approved));
        assert_eq!(ReleaseStatus::parse("approved"), None);
    }

    #[test]
    fn test_draft_accepts_numeric_score() {
        let draft: ReleaseDraft =
            serde_json::from_str(r#"{"song_title":"Night Drive","pitchfork_score":8.4}"#).unwrap();
        assert_eq!(draft.pitchfork_score.as_deref(), Some("8.4"));

        let draft: ReleaseDraft = serde_json::from_str(r#"{"pitchfork_score":"7.0"}"#).unwrap();
        assert_eq!(draft.pitchfork_score.as_deref(), Some("7.0"));

        let draft: ReleaseDraft = serde_json::from_str("{}").unwrap();
        assert_eq!(draft.pitchfork_score, None);
    }
}
