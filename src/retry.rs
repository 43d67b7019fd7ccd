//! Polling driver for convergence checks
//!
//! A check is a single attempt at comparing observed with desired state. The
//! store converges in the background, so a failing attempt usually just means
//! "not yet". [`eventually`] re-runs a check at a fixed interval until it passes
//! or its deadline passes.
//!
//! # Example
//!
//! ```ignore
//! use lattice_verify::retry::{eventually, ConvergenceConfig};
//!
//! eventually(&ConvergenceConfig::default(), "cluster health", || async {
//!     check_cluster_health(&cluster, &reader).await
//! })
//! .await?;
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Default time a check may take to converge
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default time between two attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Deadline and polling interval for a convergence check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvergenceConfig {
    /// How long a check may keep failing before its last error is returned
    pub timeout: Duration,
    /// Fixed delay between attempts
    pub interval: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl ConvergenceConfig {
    /// Create a config with the given timeout and interval
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Replace the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Run a check until it succeeds or the deadline passes
///
/// The check always runs at least once. Attempts are independent: each one must
/// fully pass. When the deadline passes, the error of the final attempt is
/// returned unchanged so the caller sees the precise failing condition rather
/// than a generic timeout.
///
/// A timeout too large to add to the current instant means no deadline: the
/// check is polled until it passes.
///
/// # Arguments
/// * `config` - Deadline and polling interval
/// * `operation_name` - Name for logging purposes
/// * `check` - The async check to poll
pub async fn eventually<F, Fut, T, E>(
    config: &ConvergenceConfig,
    operation_name: &str,
    mut check: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let deadline = Instant::now().checked_add(config.timeout);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match check().await {
            Ok(result) => {
                debug!(operation = %operation_name, attempt, "check passed");
                return Ok(result);
            }
            Err(e) => e,
        };

        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            warn!(
                operation = %operation_name,
                attempt,
                error = %err,
                "check did not converge before deadline"
            );
            return Err(err);
        }

        debug!(
            operation = %operation_name,
            attempt,
            error = %err,
            "check not converged yet, retrying"
        );

        let delay = deadline.map_or(config.interval, |d| config.interval.min(d - now));
        tokio::time::sleep(delay).await;
    }
}
