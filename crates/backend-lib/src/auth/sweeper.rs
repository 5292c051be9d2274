// ============================
// canary-backend-lib/src/auth/sweeper.rs
// ============================
//! Background removal of expired sessions.
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::session::SessionManager;
use crate::clock::Clock;
use crate::error::AppError;

/// Periodically sweeps expired sessions through a [`SessionManager`]
#[derive(Clone)]
pub struct SessionSweeper {
    manager: SessionManager,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(manager: SessionManager, interval: Duration) -> Self {
        Self { manager, interval }
    }

    /// Sweep once against the manager's clock
    pub async fn run_once(&self) -> Result<u64, AppError> {
        let now = self.manager.clock().utc();
        self.manager.sweep_expired(now).await
    }

    /// Start sweeping on a background task. The first sweep runs one
    /// interval after start.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = self.interval.as_secs(), "Session sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // A failed sweep is retried on the next tick
                        match self.run_once().await {
                            Ok(removed) => debug!(removed, "Sweep finished"),
                            Err(e) => warn!("Session sweep failed: {}", e),
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Session sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running sweeper. Dropping it also stops the task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit. An in-flight sweep
    /// finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Session sweeper task failed: {}", e);
        }
    }
}
