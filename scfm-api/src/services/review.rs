//! Admin review of releases
//!
//! Approval starts the distribution simulation, rejection cancels it.
//! Financial figures can only be set on approved releases.

use scfm_common::events::ScfmEvent;
use scfm_common::models::{Release, ReleaseStatus, User};
use scfm_common::time::now;
use scfm_common::{Error, Result};
use tracing::info;
use uuid::Uuid;

use crate::AppState;

/// Admin decision on a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Every release in the system, newest first
pub async fn list_all(state: &AppState) -> Result<Vec<Release>> {
    state.repo.list_releases(None).await
}

/// Approve or reject a release, appending to its history
pub async fn decide(
    state: &AppState,
    admin: &User,
    release_id: Uuid,
    decision: Decision,
    note: Option<String>,
    expected_version: Option<i64>,
) -> Result<Release> {
    let mut release = load(state, release_id, expected_version).await?;
    let old_status = release.status;
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    match decision {
        Decision::Approve => release.approve(note, now())?,
        Decision::Reject => release.reject(note, now())?,
    }
    release.version = state.repo.update_release(&release).await?;

    match release.status {
        ReleaseStatus::Approved => {
            state.distribution.start(&release).await;
        }
        _ => state.distribution.cancel(&release).await,
    }

    let note = release
        .latest_history()
        .map(|entry| entry.note.clone())
        .unwrap_or_default();
    info!(
        release_id = %release.id,
        admin_id = %admin.id,
        from = %old_status,
        to = %release.status,
        "Release reviewed"
    );
    state.events.emit_lossy(ScfmEvent::ReleaseStatusChanged {
        release_id: release.id,
        user_id: release.user_id,
        old_status,
        new_status: release.status,
        note,
        timestamp: release.status_update_date.unwrap_or_else(now),
    });
    Ok(release)
}

/// Set streams and revenue on an approved release
pub async fn update_financials(
    state: &AppState,
    release_id: Uuid,
    streams: u64,
    revenue: f64,
    expected_version: Option<i64>,
) -> Result<Release> {
    let mut release = load(state, release_id, expected_version).await?;
    if release.status != ReleaseStatus::Approved {
        return Err(Error::InvalidTransition(format!(
            "financials can only be updated on approved releases (release {} is {})",
            release.id, release.status
        )));
    }

    release.update_financials(streams, revenue, now())?;
    release.version = state.repo.update_release(&release).await?;
    info!(release_id = %release.id, streams, revenue, "Financials updated");

    state.events.emit_lossy(ScfmEvent::FinancialsUpdated {
        release_id: release.id,
        user_id: release.user_id,
        streams,
        revenue,
        timestamp: now(),
    });
    Ok(release)
}

async fn load(state: &AppState, release_id: Uuid, expected_version: Option<i64>) -> Result<Release> {
    let release = state
        .repo
        .find_release(release_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("release {}", release_id)))?;
    match expected_version {
        Some(expected) if expected != release.version => Err(Error::Conflict(format!(
            "release {} is at version {}, not {}",
            release.id, release.version, expected
        ))),
        _ => Ok(release),
    }
}

/// Restart the simulation for releases approved before a restart
pub async fn resume_distribution(state: &AppState) -> Result<usize> {
    let approved: Vec<Release> = state
        .repo
        .list_releases(None)
        .await?
        .into_iter()
        .filter(|r| r.status == ReleaseStatus::Approved)
        .collect();
    for release in &approved {
        state.distribution.start(release).await;
    }
    Ok(approved.len())
}
