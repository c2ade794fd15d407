//! Cooperative timers for slowOS widgets
//!
//! slow apps run everything on the egui frame loop, so there is no timer
//! thread. A `TimerSet` only remembers deadlines: its owner calls
//! [`TimerSet::poll`] with the current instant once per frame and handles
//! whatever came due. Because the clock is passed in, the same code runs
//! against a simulated clock in tests.
//!
//! Every timer belongs to exactly one `TimerSet`, and every `TimerSet`
//! belongs to the component that started the timers. Dropping or clearing
//! the set is how a component guarantees none of its timers outlive it.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Repeating timers never run faster than this.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStateError {
    #[error("timer {0:?} is not running")]
    NotRunning(TimerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Once,
    Every(Duration),
}

#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    due: Instant,
    schedule: Schedule,
}

/// A set of one-shot and repeating timers, each tagged with a key `K`
/// telling the owner what to do when it fires.
#[derive(Debug, Clone)]
pub struct TimerSet<K> {
    next_id: u64,
    entries: BTreeMap<TimerId, Entry<K>>,
}

impl<K: Clone> Default for TimerSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> TimerSet<K> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: K, due: Instant, schedule: Schedule) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Entry { key, due, schedule });
        id
    }

    /// Fire once, `delay` after `now`.
    pub fn once(&mut self, key: K, delay: Duration, now: Instant) -> TimerId {
        self.insert(key, now + delay, Schedule::Once)
    }

    /// Fire every `period`, first time one period after `now`.
    pub fn every(&mut self, key: K, period: Duration, now: Instant) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(key, now + period, Schedule::Every(period))
    }

    /// Cancel a timer. Cancelling a timer that already fired (one-shot) or
    /// was already cancelled is reported, never fatal.
    pub fn cancel(&mut self, id: TimerId) -> Result<K, TimerStateError> {
        self.entries
            .remove(&id)
            .map(|entry| entry.key)
            .ok_or(TimerStateError::NotRunning(id))
    }

    /// Cancel whatever timer `slot` holds and leave it empty.
    pub fn stop(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            if let Err(e) = self.cancel(id) {
                log::debug!("{}", e);
            }
        }
    }

    /// Cancel every timer. Returns how many were running.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline, used to schedule the next frame.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.due).min()
    }

    /// Collect every timer due at `now`, in deadline order.
    ///
    /// One-shot timers are removed. A repeating timer fires at most once
    /// per poll; if the loop stalled for several periods the missed ticks
    /// are dropped and the next one is scheduled a full period after `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<(TimerId, K)> {
        let mut due: Vec<(Instant, TimerId)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.due <= now)
            .map(|(id, e)| (e.due, *id))
            .collect();
        due.sort();

        let mut fired = Vec::with_capacity(due.len());
        for (_, id) in due {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            fired.push((id, entry.key.clone()));
            match entry.schedule {
                Schedule::Once => {
                    self.entries.remove(&id);
                }
                Schedule::Every(period) => {
                    let next = entry.due + period;
                    entry.due = if next <= now { now + period } else { next };
                }
            }
        }
        fired
    }
}
