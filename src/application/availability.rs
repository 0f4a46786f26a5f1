//! Whether the forum tables can currently be read.
//!
//! The first request probes the store. A successful probe is remembered for the
//! life of the process; a failed one is retried once `recheck_after` has passed.

use std::time::{Duration, Instant};

use metrics::counter;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::repos::ForumRepo;

pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
enum ProbeState {
    Unchecked,
    Ready,
    Failed { at: Instant },
}

#[derive(Debug)]
pub struct AvailabilityGate {
    recheck_after: Duration,
    state: Mutex<ProbeState>,
}

impl Default for AvailabilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_RECHECK_INTERVAL)
    }
}

impl AvailabilityGate {
    pub fn new(recheck_after: Duration) -> Self {
        Self {
            recheck_after,
            state: Mutex::new(ProbeState::Unchecked),
        }
    }

    /// Concurrent callers share one probe; the lock is held across it.
    pub async fn check(&self, repo: &dyn ForumRepo) -> bool {
        let mut state = self.state.lock().await;
        match *state {
            ProbeState::Ready => return true,
            ProbeState::Failed { at } if at.elapsed() < self.recheck_after => return false,
            ProbeState::Failed { .. } | ProbeState::Unchecked => {}
        }

        counter!("forum_sitemap_availability_probe_total").increment(1);
        match repo.check_installed().await {
            Ok(()) => {
                info!(target = "forum_sitemap::availability", "forum tables available");
                *state = ProbeState::Ready;
                true
            }
            Err(err) => {
                warn!(
                    target = "forum_sitemap::availability",
                    error = %err,
                    recheck_secs = self.recheck_after.as_secs(),
                    "forum tables unavailable"
                );
                *state = ProbeState::Failed { at: Instant::now() };
                false
            }
        }
    }
}
