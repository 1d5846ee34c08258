//! Bounded readiness polling.
//!
//! The store needs time after mutating management operations (bucket
//! creation, first startup) before it accepts requests. Instead of a blind
//! settle sleep, every wait in this crate polls an explicit readiness
//! predicate at a fixed interval with a maximum attempt count.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;

/// Configuration for a bounded poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive probes.
    pub interval: Duration,
    /// Maximum number of probes before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

/// Polls `probe` until it reports readiness or attempts run out.
///
/// A probe returning `Ok(false)` means "not ready yet"; a probe error is
/// treated the same way (the store may still be coming up) but logged at
/// WARN. Returns `true` if the predicate held within the attempt budget.
pub async fn poll_until<F, Fut>(config: &PollConfig, what: &str, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for attempt in 1..=config.max_attempts {
        match probe().await {
            Ok(true) => {
                if attempt > 1 {
                    debug!("{}: ready after {} attempts", what, attempt);
                }
                return true;
            }
            Ok(false) => {
                debug!(
                    "{}: not ready (attempt {}/{})",
                    what, attempt, config.max_attempts
                );
            }
            Err(e) => {
                warn!(
                    "{}: probe failed (attempt {}/{}): {}",
                    what, attempt, config.max_attempts, e
                );
            }
        }
        if attempt < config.max_attempts {
            sleep(config.interval).await;
        }
    }
    false
}
