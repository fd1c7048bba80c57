//! Synthetic upload progress.
//!
//! The upload port reports no progress, so the bar is driven by a periodic
//! task that adds a random step each tick and stalls at the cap until the
//! upload settles. The task is owned through a [`TickerHandle`]; stopping the
//! handle (or dropping it) ends the task, so a ticker can never outlive the
//! upload it belongs to.

use crate::config::UploadConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// One tick's worth of progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advance {
    /// Amount to add
    pub step: u8,
    /// Ceiling before the upload settles
    pub cap: u8,
}

impl Advance {
    /// Apply to `current`. Never decreases, never passes the cap from below.
    #[must_use]
    pub fn apply(self, current: u8) -> u8 {
        if current >= self.cap {
            return current;
        }
        current.saturating_add(self.step).min(self.cap)
    }
}

/// Periodic random-step progress generator
#[derive(Debug)]
pub struct ProgressTicker {
    period: Duration,
    min_step: u8,
    max_step: u8,
    cap: u8,
    rng: StdRng,
}

impl ProgressTicker {
    /// Ticker from upload settings; seeded when the config carries a seed
    pub fn from_config(config: &UploadConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            period: config.tick_interval(),
            min_step: config.min_step.min(config.max_step),
            max_step: config.max_step,
            cap: config.progress_cap,
            rng,
        }
    }

    /// Draw the next advance
    pub fn next_advance(&mut self) -> Advance {
        Advance {
            step: self.rng.gen_range(self.min_step..=self.max_step),
            cap: self.cap,
        }
    }

    /// Start ticking. `on_tick` runs once per period with a fresh advance and
    /// returns `false` to end the ticker from the inside.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(mut self, mut on_tick: F) -> TickerHandle
    where
        F: FnMut(Advance) -> bool + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticks.tick() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                        let advance = self.next_advance();
                        if !on_tick(advance) {
                            break;
                        }
                    }
                }
            }
            tracing::trace!("progress ticker exited");
        });

        TickerHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owner of a running ticker
#[derive(Debug)]
pub struct TickerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Stop the ticker. No tick runs after this returns.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Whether the background task has ended
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown_tx.send(true);
            task.abort();
            tracing::debug!("progress ticker stopped");
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
