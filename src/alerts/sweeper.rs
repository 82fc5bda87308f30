use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::store::AlertStore;

/// How often the maintenance sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Alerts older than this are dropped by the sweep.
pub const MAX_ALERT_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Owns the hourly prune sweep over an [`AlertStore`]. One sweeper per
/// application session; start it after wiring and stop it on shutdown.
pub struct AlertSweeper {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AlertSweeper {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(&mut self, store: AlertStore) -> Result<()> {
        if self.handle.is_some() {
            bail!("alert sweeper already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(sweep_loop(store, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("alert sweep task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for AlertSweeper {
    fn default() -> Self {
        Self::new()
    }
}

async fn sweep_loop(store: AlertStore, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; an extra prune at startup is harmless.

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                store.prune_older_than(MAX_ALERT_AGE);
            }
            _ = cancel_token.cancelled() => {
                info!("alert sweep shutting down");
                break;
            }
        }
    }
}
