//! One-shot timer system for Parley.
//!
//! Timers do not run callbacks. The owner asks the manager how long until the
//! next deadline, waits however it likes, and then collects the IDs of the
//! timers that expired. This keeps retry timing deterministic under a
//! [`ManualClock`](crate::ManualClock).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};

use crate::clock::{Clock, SystemClock};
use crate::error::TimerError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// Something that can schedule cancellable delayed wake-ups.
///
/// This is the seam the connection manager schedules reconnections through.
pub trait Scheduler {
    /// Schedule a one-shot timer that expires after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;

    /// Time until the earliest pending timer expires, if any.
    fn time_until_next(&mut self) -> Option<Duration>;

    /// Remove and return every timer whose deadline has passed, earliest first.
    fn take_expired(&mut self) -> Vec<TimerId>;
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    /// When this timer fires.
    deadline: Instant,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages one-shot timers against a [`Clock`].
pub struct TimerManager<C: Clock = SystemClock> {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending fires. May hold entries for cancelled timers.
    queue: BinaryHeap<TimerQueueEntry>,
    clock: C,
}

impl TimerManager<SystemClock> {
    /// Create a timer manager driven by the real clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TimerManager<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimerManager<C> {
    /// Create a timer manager driven by the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            clock,
        }
    }

    /// The clock this manager reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start a one-shot timer that fires after the specified duration.
    pub fn start_one_shot(&mut self, duration: Duration) -> TimerId {
        let deadline = self.clock.now() + duration;
        let id = self.timers.insert(TimerData { deadline });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: deadline,
        });
        tracing::trace!(target: targets::TIMER, ?id, ?duration, "timer started");
        id
    }

    /// Stop and remove a timer.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        match self.timers.remove(id) {
            Some(_) => {
                tracing::trace!(target: targets::TIMER, ?id, "timer stopped");
                Ok(())
            }
            None => Err(TimerError::InvalidTimerId),
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// When a pending timer is due.
    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.timers.get(id).map(|t| t.deadline)
    }

    /// Get the duration until the next timer fires, if any.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(self.clock.now()))
    }

    /// Remove all timers whose deadline has passed and return their IDs.
    pub fn process_expired(&mut self) -> Vec<TimerId> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            // Cancelled timers leave their queue entry behind.
            if self.timers.remove(entry.id).is_some() {
                tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
                fired.push(entry.id);
            }
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<C: Clock> Scheduler for TimerManager<C> {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.start_one_shot(delay)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.stop(id).is_ok()
    }

    fn time_until_next(&mut self) -> Option<Duration> {
        TimerManager::time_until_next(self)
    }

    fn take_expired(&mut self) -> Vec<TimerId> {
        self.process_expired()
    }
}

impl<C: Clock> std::fmt::Debug for TimerManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerManager")
            .field("active", &self.timers.len())
            .finish()
    }
}
