//! Simulated store delivery
//!
//! Once a release is approved every selected platform walks
//! Pending -> Processing -> In Review -> Live on randomized delays. Progress
//! lives in memory only and is broadcast as `DistributionProgress` events.
//! Rejecting or editing the release cancels the run and forgets its state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use scfm_common::events::{EventBus, ScfmEvent};
use scfm_common::models::{DistributionStatus, Release, ReleaseStatus};
use scfm_common::time::{now, scaled_millis};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

const PROCESSING_AFTER_MS: u64 = 1_500;
const IN_REVIEW_AFTER_MS: (u64, u64) = (5_000, 7_000);
const LIVE_AFTER_MS: (u64, u64) = (10_000, 14_000);

/// Delivery status of one platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStatus {
    pub service: String,
    pub status: DistributionStatus,
}

struct Run {
    id: Uuid,
    platforms: Vec<PlatformStatus>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Runs {
    active: HashMap<Uuid, Run>,
    /// Highest release version each start/cancel was issued for
    latest: HashMap<Uuid, i64>,
}

impl Runs {
    /// Record `version` for the release unless a newer one was already seen
    fn claim(&mut self, release_id: Uuid, version: i64) -> bool {
        match self.latest.get(&release_id) {
            Some(&seen) if seen > version => false,
            _ => {
                self.latest.insert(release_id, version);
                true
            }
        }
    }
}

/// One scheduled status change
#[derive(Debug, Clone, PartialEq)]
struct Step {
    at: Duration,
    service: String,
    status: DistributionStatus,
}

#[derive(Clone)]
pub struct DistributionSimulator {
    runs: Arc<RwLock<Runs>>,
    events: EventBus,
    time_scale: f64,
}

impl DistributionSimulator {
    pub fn new(events: EventBus, time_scale: f64) -> Self {
        Self {
            runs: Arc::new(RwLock::new(Runs::default())),
            events,
            time_scale,
        }
    }

    /// Start (or restart) the pipeline for an approved release
    ///
    /// Returns false when a newer version of the release has already been
    /// started or cancelled; the caller's write lost the race.
    pub async fn start(&self, release: &Release) -> bool {
        let mut runs = self.runs.write().await;
        if !runs.claim(release.id, release.version) {
            debug!(release_id = %release.id, version = release.version, "Distribution start superseded");
            return false;
        }

        let run_id = Uuid::new_v4();
        let platforms: Vec<PlatformStatus> = release
            .selected_services
            .iter()
            .map(|service| PlatformStatus {
                service: service.clone(),
                status: DistributionStatus::Pending,
            })
            .collect();
        let steps = schedule(&release.selected_services, self.time_scale, &mut rand::thread_rng());

        if let Some(previous) = runs.active.remove(&release.id) {
            previous.handle.abort();
        }
        let handle = tokio::spawn(drive(
            self.clone(),
            run_id,
            release.id,
            release.user_id,
            steps,
        ));
        runs.active.insert(
            release.id,
            Run {
                id: run_id,
                platforms,
                handle,
            },
        );
        info!(release_id = %release.id, services = release.selected_services.len(), "Distribution started");
        true
    }

    /// Stop the pipeline and drop its state
    ///
    /// A cancel for an older version than the running one is ignored.
    pub async fn cancel(&self, release: &Release) {
        let mut runs = self.runs.write().await;
        if !runs.claim(release.id, release.version) {
            debug!(release_id = %release.id, version = release.version, "Distribution cancel superseded");
            return;
        }
        if let Some(run) = runs.active.remove(&release.id) {
            run.handle.abort();
            info!(release_id = %release.id, "Distribution cancelled");
        }
    }

    /// Current per-platform status
    ///
    /// Releases that are not approved report every platform as Pending.
    pub async fn snapshot(&self, release: &Release) -> Vec<PlatformStatus> {
        if release.status == ReleaseStatus::Approved {
            if let Some(run) = self.runs.read().await.active.get(&release.id) {
                return run.platforms.clone();
            }
        }
        release
            .selected_services
            .iter()
            .map(|service| PlatformStatus {
                service: service.clone(),
                status: DistributionStatus::Pending,
            })
            .collect()
    }

    pub async fn is_running(&self, release_id: Uuid) -> bool {
        self.runs.read().await.active.contains_key(&release_id)
    }

    /// Apply a step if `run_id` is still the current run for the release
    async fn advance(&self, run_id: Uuid, release_id: Uuid, step: &Step) -> bool {
        let mut runs = self.runs.write().await;
        let Some(run) = runs.active.get_mut(&release_id).filter(|run| run.id == run_id) else {
            return false;
        };
        if let Some(platform) = run.platforms.iter_mut().find(|p| p.service == step.service) {
            platform.status = step.status;
        }
        true
    }
}

async fn drive(
    simulator: DistributionSimulator,
    run_id: Uuid,
    release_id: Uuid,
    user_id: Uuid,
    steps: Vec<Step>,
) {
    let started = tokio::time::Instant::now();
    for step in steps {
        tokio::time::sleep_until(started + step.at).await;
        if !simulator.advance(run_id, release_id, &step).await {
            debug!(release_id = %release_id, "Distribution run superseded");
            return;
        }
        simulator.events.emit_lossy(ScfmEvent::DistributionProgress {
            release_id,
            user_id,
            service: step.service,
            status: step.status,
            timestamp: now(),
        });
    }
    info!(release_id = %release_id, "Distribution complete");
}

/// Randomized timeline for every platform, ordered by time
fn schedule(services: &[String], time_scale: f64, rng: &mut impl Rng) -> Vec<Step> {
    let mut steps = Vec::with_capacity(services.len() * 3);
    for service in services {
        let in_review = rng.gen_range(IN_REVIEW_AFTER_MS.0..=IN_REVIEW_AFTER_MS.1);
        let live = rng.gen_range(LIVE_AFTER_MS.0..=LIVE_AFTER_MS.1);
        for (millis, status) in [
            (PROCESSING_AFTER_MS, DistributionStatus::Processing),
            (in_review, DistributionStatus::InReview),
            (live, DistributionStatus::Live),
        ] {
            steps.push(Step {
                at: scaled_millis(millis, time_scale),
                service: service.clone(),
                status,
            });
        }
    }
    // Stable sort keeps Processing < InReview < Live per platform even at scale 0
    steps.sort_by_key(|step| step.at);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn services(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stale_start_or_cancel_is_refused() {
        let mut runs = Runs::default();
        let release_id = Uuid::new_v4();

        // Reject at v2 landed before the approve at v1 got to start
        assert!(runs.claim(release_id, 2));
        assert!(!runs.claim(release_id, 1));

        // Re-approval at v3, then a late cancel from v2
        assert!(runs.claim(release_id, 3));
        assert!(!runs.claim(release_id, 2));

        // Restart of the same version is allowed
        assert!(runs.claim(release_id, 3));
        assert!(runs.claim(Uuid::new_v4(), 0));
    }

    #[test]
    fn test_schedule_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let steps = schedule(&services(&["spotify", "tidal"]), 1.0, &mut rng);
        assert_eq!(steps.len(), 6);

        for step in &steps {
            let ms = step.at.as_millis() as u64;
            match step.status {
                DistributionStatus::Processing => assert_eq!(ms, 1_500),
                DistributionStatus::InReview => assert!((5_000..=7_000).contains(&ms)),
                DistributionStatus::Live => assert!((10_000..=14_000).contains(&ms)),
                other => panic!("unexpected step {other:?}"),
            }
        }
        assert!(steps.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_schedule_zero_scale_keeps_per_platform_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let steps = schedule(&services(&["spotify"]), 0.0, &mut rng);
        let order: Vec<_> = steps.iter().map(|s| s.status).collect();
        assert_eq!(
            order,
            vec![
                DistributionStatus::Processing,
                DistributionStatus::InReview,
                DistributionStatus::Live
            ]
        );
    }
}
