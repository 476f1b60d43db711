//! Periodic work driven by an injected clock, so tests can step time.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use chrono::{Duration, NaiveDateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Resets, streak break checks and score recompute.
    Recompute,
    /// Push local state to the remote.
    Sync,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct PeriodicTask {
    kind: TaskKind,
    every: Duration,
    next_due: NaiveDateTime,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
}

impl Scheduler {
    /// Every task first fires at `start`.
    pub fn from_config(config: &ScheduleConfig, start: NaiveDateTime, sync_enabled: bool) -> Self {
        let mut scheduler = Self::default();
        let defaults = ScheduleConfig::default();
        scheduler.every(
            TaskKind::Recompute,
            interval(config.recompute_secs, defaults.recompute_secs),
            start,
        );
        if sync_enabled {
            scheduler.every(TaskKind::Sync, interval(config.sync_secs, defaults.sync_secs), start);
        }
        scheduler
    }

    pub fn every(&mut self, kind: TaskKind, every: Duration, start: NaiveDateTime) {
        let every = every.max(Duration::seconds(1));
        self.tasks.retain(|t| t.kind != kind);
        self.tasks.push(PeriodicTask {
            kind,
            every,
            next_due: start,
        });
    }

    /// Tasks whose deadline has passed, in registration order. Ticks missed
    /// while the caller was busy collapse into one run.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<TaskKind> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            if task.next_due <= now {
                due.push(task.kind);
                task.next_due = now + task.every;
            }
        }
        due
    }

    pub fn next_wake(&self) -> Option<NaiveDateTime> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Sleep until the next deadline, run what is due, repeat until the token
    /// is cancelled.
    pub fn run_until_cancelled(
        &mut self,
        clock: &dyn Clock,
        token: &CancellationToken,
        mut sleep: impl FnMut(std::time::Duration),
        mut on_due: impl FnMut(TaskKind, NaiveDateTime),
    ) {
        while !token.is_cancelled() {
            let now = clock.now();
            for kind in self.due(now) {
                on_due(kind, now);
                if token.is_cancelled() {
                    return;
                }
            }
            let Some(wake) = self.next_wake() else {
                return;
            };
            let wait = (wake - clock.now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            if !wait.is_zero() {
                sleep(wait);
            }
        }
    }
}

/// Seconds from config as a `Duration`, or `fallback` when the value does
/// not fit.
fn interval(secs: u64, fallback: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| {
            log::warn!("Interval of {}s is out of range; using {}s", secs, fallback);
            Duration::seconds(fallback as i64)
        })
}
