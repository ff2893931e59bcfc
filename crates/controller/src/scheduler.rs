//! Tick schedulers.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Source of ticks for the control loop
#[trait_variant::make(Scheduler: Send)]
pub trait LocalScheduler {
    /// Wait for the next tick. Returns false once no more ticks will come.
    async fn next_tick(&mut self) -> bool;
}

/// Fixed-interval scheduler
///
/// The first tick fires immediately and later ticks keep a fixed cadence.
/// When a tick overruns its period the next one comes a full period after
/// the overrunning tick completes; missed ticks are never made up.
#[derive(Debug)]
pub struct IntervalScheduler {
    period: Duration,
    due: Option<Instant>,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, due: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Scheduler for IntervalScheduler {
    async fn next_tick(&mut self) -> bool {
        let now = Instant::now();
        let deadline = match self.due {
            None => now,
            Some(due) if due < now => now + self.period,
            Some(due) => due,
        };
        sleep_until(deadline).await;
        self.due = Some(deadline + self.period);
        true
    }
}

/// Scheduler driven by hand through a [`TickDriver`]
#[derive(Debug)]
pub struct ManualScheduler {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Sending half of a [`ManualScheduler`]; dropping it ends the schedule
#[derive(Debug, Clone)]
pub struct TickDriver {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualScheduler {
    pub fn new() -> (Self, TickDriver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, TickDriver { tx })
    }
}

impl TickDriver {
    /// Release one tick; false if the scheduler is gone
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    /// Release `n` ticks
    pub fn ticks(&self, n: usize) -> bool {
        (0..n).all(|_| self.tick())
    }
}

impl Scheduler for ManualScheduler {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}
