//! Measurements waiting for delivery
//!
//! Every measurement of a cycle, failed ones included, is pushed here and
//! stays until the uplink confirms it. When the uplink is down for longer
//! than `capacity` cycles the oldest entry is overwritten: the buffer is
//! lossy on purpose and [`HistoryBuffer::evicted_total`] counts what was
//! lost so the health report can say so.
//!
//! The buffer lives in retained memory across deep sleep, so with `serde`
//! it serializes as a plain list of entries plus its capacity.

use alloc::vec::Vec;

use crate::buffer::CircularBuffer;
use crate::constants::buffers::MAX_HISTORY_CAPACITY;
use crate::constants::time::MS_PER_HOUR;
use crate::errors::{ConfigError, ConfigResult};
use crate::sampler::DistanceMeasurement;
use crate::stats;

/// Bounded FIFO of [`DistanceMeasurement`]s
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    ring: CircularBuffer<DistanceMeasurement, MAX_HISTORY_CAPACITY>,
    evicted_total: u32,
}

impl HistoryBuffer {
    /// Empty buffer holding up to `capacity` entries (1..=255)
    pub fn new(capacity: usize) -> ConfigResult<Self> {
        let ring = CircularBuffer::with_capacity(capacity)
            .ok_or(ConfigError::InvalidCapacity { capacity })?;
        Ok(Self {
            ring,
            evicted_total: 0,
        })
    }

    /// Append a measurement. Returns the entry that was overwritten when the
    /// buffer was already full.
    pub fn push(&mut self, measurement: DistanceMeasurement) -> Option<DistanceMeasurement> {
        let evicted = self.ring.push(measurement);
        if let Some(old) = &evicted {
            self.evicted_total = self.evicted_total.saturating_add(1);
            log_warn!(
                "History full ({}), dropped reading from {}",
                self.ring.capacity() as u32,
                old.timestamp_ms
            );
        }
        evicted
    }

    /// Remove and return every pending entry, oldest first
    pub fn drain(&mut self) -> Vec<DistanceMeasurement> {
        let mut out = Vec::with_capacity(self.ring.len());
        while let Some(m) = self.ring.pop_front() {
            out.push(m);
        }
        out
    }

    /// Offer entries oldest first to `publish`. Each entry it confirms is
    /// removed; the first refusal stops the walk so later entries keep
    /// their place behind it.
    pub fn drain_confirmed<F>(&mut self, mut publish: F) -> Vec<DistanceMeasurement>
    where
        F: FnMut(&DistanceMeasurement) -> bool,
    {
        let mut confirmed = Vec::new();
        while let Some(front) = self.ring.front().copied() {
            if !publish(&front) {
                break;
            }
            self.ring.pop_front();
            confirmed.push(front);
        }
        confirmed
    }

    /// Pending entries, oldest first, without removing them
    pub fn peek_all(&self) -> impl Iterator<Item = &DistanceMeasurement> + '_ {
        self.ring.iter()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&DistanceMeasurement> {
        self.ring.last()
    }

    /// Buffered measurements
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Nothing buffered
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// The next push evicts the oldest entry
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Entries overwritten since the buffer was created
    pub fn evicted_total(&self) -> u32 {
        self.evicted_total
    }

    /// Least-squares level trend over the successful entries, in metres per
    /// hour. Positive means the surface is moving away (tank emptying).
    pub fn trend_m_per_hour(&self) -> Option<f32> {
        let first_ts = self.ring.front()?.timestamp_ms;
        let mut points: heapless::Vec<(f32, f32), MAX_HISTORY_CAPACITY> = heapless::Vec::new();
        for m in self.ring.iter() {
            if let Some(d) = m.distance_m {
                let hours = m.timestamp_ms.saturating_sub(first_ts) as f32 / MS_PER_HOUR;
                // Ring never holds more than MAX_HISTORY_CAPACITY
                let _ = points.push((hours, d));
            }
        }
        stats::linear_slope(&points)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Snapshot<'a> {
        capacity: usize,
        evicted_total: u32,
        entries: Vec<&'a DistanceMeasurement>,
    }

    #[derive(Deserialize)]
    struct OwnedSnapshot {
        capacity: usize,
        #[serde(default)]
        evicted_total: u32,
        entries: Vec<DistanceMeasurement>,
    }

    impl Serialize for HistoryBuffer {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            Snapshot {
                capacity: self.capacity(),
                evicted_total: self.evicted_total,
                entries: self.peek_all().collect(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for HistoryBuffer {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let snapshot = OwnedSnapshot::deserialize(deserializer)?;
            let mut history = HistoryBuffer::new(snapshot.capacity)
                .map_err(|_| serde::de::Error::custom("history capacity outside 1..=255"))?;
            for entry in snapshot.entries {
                history.ring.push(entry);
            }
            history.evicted_total = snapshot.evicted_total;
            Ok(history)
        }
    }
}
