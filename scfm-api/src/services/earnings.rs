//! Payouts, profile statistics and payout details

use std::collections::HashSet;

use scfm_common::models::{PaymentDetails, Release, ReleaseStatus, User};
use scfm_common::validation::is_valid_email;
use scfm_common::{Error, Result};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutLine {
    pub release_id: Uuid,
    pub song_title: String,
    pub artist_name: String,
    pub streams: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutSummary {
    pub releases: Vec<PayoutLine>,
    pub total_streams: u64,
    pub total_earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub total_releases: usize,
    /// Distinct artist display names across the releases
    pub total_artists: usize,
    pub total_streams: u64,
    pub total_revenue: f64,
}

/// Approved releases with their earnings
pub fn payout_summary(releases: &[Release]) -> PayoutSummary {
    let lines: Vec<PayoutLine> = releases
        .iter()
        .filter(|r| r.status == ReleaseStatus::Approved)
        .map(|r| PayoutLine {
            release_id: r.id,
            song_title: r.song_title.clone(),
            artist_name: r.artist_name.clone(),
            streams: r.streams,
            revenue: r.revenue,
        })
        .collect();
    PayoutSummary {
        total_streams: lines.iter().map(|l| l.streams).sum(),
        total_earnings: lines.iter().map(|l| l.revenue).sum(),
        releases: lines,
    }
}

pub fn profile_stats(releases: &[Release]) -> ProfileStats {
    let artists: HashSet<&str> = releases.iter().map(|r| r.artist_name.as_str()).collect();
    ProfileStats {
        total_releases: releases.len(),
        total_artists: artists.len(),
        total_streams: releases.iter().map(|r| r.streams).sum(),
        total_revenue: releases.iter().map(|r| r.revenue).sum(),
    }
}

pub async fn payouts(state: &AppState, user: &User) -> Result<PayoutSummary> {
    Ok(payout_summary(&state.repo.list_releases(Some(user.id)).await?))
}

pub async fn stats(state: &AppState, user: &User) -> Result<ProfileStats> {
    Ok(profile_stats(&state.repo.list_releases(Some(user.id)).await?))
}

pub async fn get_payment_details(state: &AppState, user: &User) -> Result<Option<PaymentDetails>> {
    state.repo.load_payment_details(user.id).await
}

pub async fn save_payment_details(
    state: &AppState,
    user: &User,
    details: PaymentDetails,
) -> Result<PaymentDetails> {
    if !is_valid_email(&details.paypal_email) {
        return Err(Error::field("paypal_email", "Please enter a valid PayPal email address."));
    }
    let details = PaymentDetails {
        paypal_email: details.paypal_email.trim().to_string(),
        street: details.street.trim().to_string(),
        city: details.city.trim().to_string(),
        state: details.state.trim().to_string(),
        zip_code: details.zip_code.trim().to_string(),
        country: details.country.trim().to_string(),
    };
    state.repo.save_payment_details(user.id, &details).await?;
    info!(user_id = %user.id, "Payment details saved");
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scfm_common::assets::AssetRef;
    use scfm_common::models::ValidatedRelease;
    use scfm_common::time::now;

    fn release(artist_name: &str, approved: bool, streams: u64, revenue: f64) -> Release {
        let asset = AssetRef {
            key: "k.wav".to_string(),
            content_type: "audio/wav".to_string(),
            size_bytes: 1,
        };
        let mut release = Release::submit(
            Uuid::new_v4(),
            ValidatedRelease {
                song_title: "Song".to_string(),
                artist_name: artist_name.to_string(),
                artists: Vec::new(),
                genre: "Pop".to_string(),
                release_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                contact_email: "a@b.co".to_string(),
                support_phone: None,
                pitchfork_score: None,
                copyright_year: "2024".to_string(),
                copyright_holder: "A".to_string(),
                publishing_year: "2024".to_string(),
                publishing_holder: "A".to_string(),
                composer: String::new(),
                lyricist: String::new(),
                producer_credits: String::new(),
                selected_services: Vec::new(),
                royalty_splits: Vec::new(),
                audio_file: asset.clone(),
                artwork: asset,
                promo_text: None,
            },
            now(),
        );
        if approved {
            release.approve(None, now()).unwrap();
        }
        release.streams = streams;
        release.revenue = revenue;
        release
    }

    #[test]
    fn test_payouts_only_count_approved() {
        let releases = vec![
            release("Ava", true, 1_000, 4.0),
            release("Ava", false, 50, 0.5),
            release("Ava feat. Bo", true, 2_000, 8.5),
        ];
        let summary = payout_summary(&releases);
        assert_eq!(summary.releases.len(), 2);
        assert_eq!(summary.total_streams, 3_000);
        assert_eq!(summary.total_earnings, 12.5);
    }

    #[test]
    fn test_profile_stats_count_distinct_artists() {
        let releases = vec![
            release("Ava", true, 1_000, 4.0),
            release("Ava", false, 0, 0.0),
            release("Bo", true, 10, 0.25),
        ];
        let stats = profile_stats(&releases);
        assert_eq!(stats.total_releases, 3);
        assert_eq!(stats.total_artists, 2);
        assert_eq!(stats.total_streams, 1_010);
        assert_eq!(stats.total_revenue, 4.25);
    }
}
