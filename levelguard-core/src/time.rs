//! Time management for the wake cycle
//!
//! Provides clock abstraction for the different time sources a sensor node
//! may have:
//! - System clock (hosted builds)
//! - Network time from the modem (implemented by the board crate)
//! - Fixed clock for tests
//!
//! Echo timing needs a separate, finer clock: [`MicrosClock`] is a
//! free-running microsecond counter (a hardware timer on the board).

/// Timestamp in milliseconds since epoch (or device boot for monotonic)
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&mut self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&mut self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Manually driven time source.
///
/// Optionally advances by a fixed step on every read, which lets tests
/// simulate the time a cycle spends awake.
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
    step_ms: u64,
}

impl FixedTime {
    /// Clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp, step_ms: 0 }
    }

    /// Clock that advances `step_ms` after every read
    pub fn stepping(timestamp: Timestamp, step_ms: u64) -> Self {
        Self { timestamp, step_ms }
    }

    /// Jump to an absolute time
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&mut self) -> Timestamp {
        let now = self.timestamp;
        self.timestamp += self.step_ms;
        now
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    fn now(&mut self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// Instant on a 1 MHz monotonic timer
pub type MicrosInstant = fugit::TimerInstantU64<1_000_000>;

/// Monotonic microsecond counter used to timestamp echo edges
pub trait MicrosClock {
    /// Current counter value
    fn now_us(&mut self) -> MicrosInstant;
}

impl<T: MicrosClock + ?Sized> MicrosClock for &mut T {
    fn now_us(&mut self) -> MicrosInstant {
        (**self).now_us()
    }
}

/// Microsecond counter on the host's monotonic clock
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct HostMicros {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl HostMicros {
    /// Counter starting at zero now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for HostMicros {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl MicrosClock for HostMicros {
    fn now_us(&mut self) -> MicrosInstant {
        let micros = u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX);
        MicrosInstant::from_ticks(micros)
    }
}

/// Microseconds from `earlier` to `later`, zero if the counter went backwards
pub fn elapsed_us(earlier: MicrosInstant, later: MicrosInstant) -> u64 {
    later
        .checked_duration_since(earlier)
        .map_or(0, |elapsed| elapsed.to_micros())
}

/// Elapsed milliseconds, zero if the clock went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn stepping_time_moves_on_each_read() {
        let mut time = FixedTime::stepping(0, 250);
        assert_eq!(time.now(), 0);
        assert_eq!(time.now(), 250);
        assert_eq!(time.now(), 500);
    }

    #[test]
    fn elapsed_us_between_instants() {
        let earlier = MicrosInstant::from_ticks(1_000);
        let later = MicrosInstant::from_ticks(3_500);
        assert_eq!(elapsed_us(earlier, later), 2_500);
        assert_eq!(elapsed_us(later, earlier), 0);
    }

    #[test]
    fn host_micros_is_monotonic() {
        let mut clock = HostMicros::new();
        let first = clock.now_us();
        let second = clock.now_us();
        assert!(second >= first);
    }

    #[test]
    fn elapsed_never_underflows() {
        assert_eq!(elapsed_ms(2000, 1000), 0);
        assert_eq!(elapsed_ms(1000, 2500), 1500);
    }
}
