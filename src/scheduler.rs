//! Cooperative tick scheduling.
//!
//! Stands in for a display's per-frame callback and a coarse interval timer.
//! Frame requests are one-shot: a chain asks for its next frame only after its
//! body ran, so a chain can never run re-entrantly. Intervals repeat until
//! cancelled. Time is always passed in, which lets tests drive the clock.

use std::time::{Duration, Instant};

/// Handle identifying one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Frame,
    Every(Duration),
}

#[derive(Debug)]
struct Entry<K> {
    handle: TickHandle,
    key: K,
    cadence: Cadence,
    due: Instant,
}

/// Scheduler keyed by the owner of each chain.
#[derive(Debug)]
pub struct Scheduler<K> {
    frame_interval: Duration,
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K: Copy> Scheduler<K> {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_interval: Duration::from_secs(1) / fps.max(1),
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn next_handle(&mut self) -> TickHandle {
        self.next_id += 1;
        TickHandle(self.next_id)
    }

    /// Run `key` once on the next frame after `now`.
    pub fn request_frame(&mut self, key: K, now: Instant) -> TickHandle {
        let handle = self.next_handle();
        self.entries.push(Entry {
            handle,
            key,
            cadence: Cadence::Frame,
            due: now + self.frame_interval,
        });
        handle
    }

    /// Run `key` every `period`, first at `now + period`.
    pub fn set_interval(&mut self, key: K, period: Duration, now: Instant) -> TickHandle {
        let handle = self.next_handle();
        self.entries.push(Entry {
            handle,
            key,
            cadence: Cadence::Every(period),
            due: now + period,
        });
        handle
    }

    /// Remove a pending callback. Returns false if it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TickHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_pending(&self, handle: TickHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Earliest time anything is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Callbacks due at `now`, in registration order.
    ///
    /// Frame entries are consumed; interval entries move to their next slot.
    /// An interval that fell several periods behind fires once.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TickHandle, K)> {
        let mut due = Vec::new();
        self.entries.retain_mut(|entry| {
            if entry.due > now {
                return true;
            }
            due.push((entry.handle, entry.key));
            match entry.cadence {
                Cadence::Frame => false,
                Cadence::Every(period) => {
                    while entry.due <= now {
                        entry.due += period;
                    }
                    true
                }
            }
        });
        due
    }
}
