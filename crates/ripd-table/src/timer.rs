//! Timer primitives for the routing table. Every timer is a spawned task that sleeps for a
//! fixed delay and then posts a [`TableEvent`] onto the shared channel the event loop drains.
//! Timers never touch the table directly, which is what lets every mutation serialize through
//! a single owner (see the crate-level docs).

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::{mpsc, oneshot};

/// Which of the three protocol timers a [`TimerHandle`] represents. Carried alongside the
/// handle so invariant checks (an entry always has exactly one armed timer, and its kind must
/// match whether the entry is poisoned) can be verified without inspecting the task itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Timeout,
    Garbage,
    Update,
}

/// Events a fired timer (or an inbound datagram reader) posts to the single task that owns
/// the routing table.
#[derive(Debug, Clone, Copy)]
pub enum TableEvent {
    Timeout(u32),
    Garbage(u32),
    PeriodicUpdate,
}

/// A single-shot timer. Dropping a handle without calling [`cancel`](TimerHandle::cancel) has
/// the same effect as calling it explicitly, since the cancel channel closes either way, but
/// `cancel` is used at call sites so the intent reads plainly next to the replacement timer
/// that follows it.
pub struct TimerHandle {
    kind: TimerKind,
    started_at: Instant,
    delay: Duration,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl TimerHandle {
    pub fn spawn(
        kind: TimerKind,
        delay: Duration,
        event: TableEvent,
        events_tx: mpsc::UnboundedSender<TableEvent>,
    ) -> Self {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = events_tx.send(event);
                }
                _ = cancel_rx => {}
            }
        });

        Self {
            kind,
            started_at: Instant::now(),
            delay,
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.delay.saturating_sub(self.started_at.elapsed())
    }
}

/// UPDATE/TIMEOUT/GARBAGECOLLECTION durations, configurable for tests that need shorter
/// windows than the protocol defaults.
#[derive(Debug, Clone, Copy)]
pub struct TimerConstants {
    pub update: Duration,
    pub timeout: Duration,
    pub garbage: Duration,
}

impl Default for TimerConstants {
    fn default() -> Self {
        Self {
            update: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            garbage: Duration::from_secs(20),
        }
    }
}

impl TimerConstants {
    /// A jittered delay in [0.8, 1.2] x `update`, so neighbors advertising on the same nominal
    /// period don't converge on sending at the same instant.
    pub fn jittered_update(&self) -> Duration {
        let low = self.update.mul_f64(0.8);
        let high = self.update.mul_f64(1.2);
        let low_nanos = low.as_nanos() as u64;
        let high_nanos = high.as_nanos() as u64;
        let nanos = rand::rng().random_range(low_nanos..=high_nanos);
        Duration::from_nanos(nanos)
    }
}
