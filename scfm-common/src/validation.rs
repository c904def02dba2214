//! Release submission validation
//!
//! Pure checks over a [`ReleaseDraft`]. Every rule is evaluated so the caller
//! gets the full per-field error map in one pass. On success the draft is
//! turned into a typed [`ValidatedRelease`] with the derived credit fields.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::assets::AssetRef;
use crate::catalog;
use crate::error::FieldErrors;
use crate::models::{ArtistRole, ReleaseArtist, ReleaseDraft, RoyaltySplit, ValidatedRelease};
use crate::{Error, Result};

/// Absolute tolerance when checking that royalty shares total 100
pub const SHARE_TOLERANCE: f64 = 0.01;

// Digits are ASCII only; `\d` also matches non-Latin digits
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-\+\(\)]{7,}$").expect("phone pattern must compile"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("year pattern must compile"));

/// Email shape shared by submissions, registration and payout details
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Outcome of looking up one asset slot before validation
#[derive(Debug, Clone, PartialEq)]
pub enum AssetResolution {
    /// No key supplied and nothing on file
    Missing,
    /// A key was supplied but the store has no such asset
    Unknown(String),
    Found(AssetRef),
}

/// Both asset slots of a submission
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAssets {
    pub audio: AssetResolution,
    pub artwork: AssetResolution,
}

/// Validate a submission form
///
/// Returns [`Error::Validation`] with one message per failing field.
pub fn validate_release(draft: &ReleaseDraft, assets: ResolvedAssets) -> Result<ValidatedRelease> {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &str, message: String| {
        errors.entry(field.to_string()).or_insert(message);
    };

    let song_title = draft.song_title.trim().to_string();
    if song_title.is_empty() {
        fail("song_title", "Song title is required.".to_string());
    }

    let artists = credited_artists(&draft.artists);
    if !artists.iter().any(|a| a.role == ArtistRole::MainArtist) {
        fail("artists", "At least one Main Artist is required.".to_string());
    }

    let genre = draft.genre.trim().to_string();
    if genre.is_empty() {
        fail("genre", "Genre is required.".to_string());
    }

    let release_date = match draft.release_date.trim() {
        "" => {
            fail("release_date", "Release date is required.".to_string());
            None
        }
        raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                fail("release_date", "Release date must be a valid date (YYYY-MM-DD).".to_string());
                None
            }
        },
    };

    let contact_email = draft.contact_email.trim().to_string();
    if !is_valid_email(&contact_email) {
        fail("contact_email", "Please enter a valid email address.".to_string());
    }

    let support_phone = optional_text(&draft.support_phone);
    if let Some(phone) = &support_phone {
        if !PHONE.is_match(phone) {
            fail("support_phone", "Please enter a valid phone number (min 7 digits).".to_string());
        }
    }

    let pitchfork_score = match optional_text(&draft.pitchfork_score) {
        None => None,
        Some(raw) => match raw.parse::<f64>() {
            Ok(score) if (0.0..=10.0).contains(&score) => Some(score),
            _ => {
                fail("pitchfork_score", "Score must be a number between 0.0 and 10.0".to_string());
                None
            }
        },
    };

    let copyright_year = draft.copyright_year.trim().to_string();
    if !YEAR.is_match(&copyright_year) {
        fail("copyright_year", "Enter a valid 4-digit year (e.g. 2024).".to_string());
    }
    let publishing_year = draft.publishing_year.trim().to_string();
    if !YEAR.is_match(&publishing_year) {
        fail("publishing_year", "Enter a valid 4-digit year (e.g. 2024).".to_string());
    }

    let copyright_holder = draft.copyright_holder.trim().to_string();
    if copyright_holder.is_empty() {
        fail("copyright_holder", "Copyright holder is required.".to_string());
    }
    let publishing_holder = draft.publishing_holder.trim().to_string();
    if publishing_holder.is_empty() {
        fail("publishing_holder", "Publishing holder is required.".to_string());
    }

    let mut selected_services: Vec<String> = Vec::new();
    for id in &draft.selected_services {
        let id = id.trim();
        if catalog::service(id).is_none() {
            fail("selected_services", format!("Unknown streaming service '{}'.", id));
        } else if !selected_services.iter().any(|s| s == id) {
            selected_services.push(id.to_string());
        }
    }

    if draft.royalty_splits.iter().any(|s| !s.share.is_finite() || s.share < 0.0) {
        fail("royalty_splits", "Royalty shares must be non-negative numbers.".to_string());
    }
    let total = split_total(&draft.royalty_splits);
    if (total - 100.0).abs() > SHARE_TOLERANCE {
        fail(
            "royalty_splits",
            format!("Total splits must equal 100%. Current: {}%", display_share(total)),
        );
    }

    let audio_file = resolve_slot(assets.audio, "audio_file", "Audio file is required.", &mut fail);
    let artwork = resolve_slot(assets.artwork, "artwork", "Artwork is required.", &mut fail);

    match (release_date, audio_file, artwork) {
        (Some(release_date), Some(audio_file), Some(artwork)) if errors.is_empty() => {
            Ok(ValidatedRelease {
                song_title,
                artist_name: display_artist_name(&artists),
                composer: credits_for(&artists, ArtistRole::Composer),
                lyricist: credits_for(&artists, ArtistRole::Lyricist),
                producer_credits: credits_for(&artists, ArtistRole::Producer),
                artists,
                genre,
                release_date,
                contact_email,
                support_phone,
                pitchfork_score,
                copyright_year,
                copyright_holder,
                publishing_year,
                publishing_holder,
                selected_services,
                royalty_splits: draft
                    .royalty_splits
                    .iter()
                    .map(|s| RoyaltySplit {
                        collaborator_name: s.collaborator_name.trim().to_string(),
                        role: s.role.trim().to_string(),
                        share: s.share,
                    })
                    .collect(),
                audio_file,
                artwork,
                promo_text: optional_text(&draft.promo_text),
            })
        }
        _ => Err(Error::Validation(errors)),
    }
}

fn resolve_slot(
    resolution: AssetResolution,
    field: &str,
    required: &str,
    fail: &mut impl FnMut(&str, String),
) -> Option<AssetRef> {
    match resolution {
        AssetResolution::Found(asset) => Some(asset),
        AssetResolution::Missing => {
            fail(field, required.to_string());
            None
        }
        AssetResolution::Unknown(key) => {
            fail(field, format!("Uploaded file '{}' was not found. Please upload it again.", key));
            None
        }
    }
}

/// Credited artists with blank names dropped and names trimmed
fn credited_artists(artists: &[ReleaseArtist]) -> Vec<ReleaseArtist> {
    artists
        .iter()
        .filter(|a| !a.name.trim().is_empty())
        .map(|a| ReleaseArtist {
            name: a.name.trim().to_string(),
            role: a.role,
            bio: a.bio.trim().to_string(),
        })
        .collect()
}

/// `Ava feat. Bo`: main and featured artists in form order
pub fn display_artist_name(artists: &[ReleaseArtist]) -> String {
    artists
        .iter()
        .filter_map(|a| match a.role {
            ArtistRole::MainArtist => Some(a.name.clone()),
            ArtistRole::FeaturedArtist => Some(format!("feat. {}", a.name)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn credits_for(artists: &[ReleaseArtist], role: ArtistRole) -> String {
    artists
        .iter()
        .filter(|a| a.role == role)
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn split_total(splits: &[RoyaltySplit]) -> f64 {
    splits.iter().map(|s| s.share).sum()
}

/// `90` for whole numbers, otherwise two decimals at most
fn display_share(total: f64) -> String {
    let rounded = (total * 100.0).round() / 100.0;
    format!("{}", rounded)
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
