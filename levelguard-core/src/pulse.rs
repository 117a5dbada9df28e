//! Trigger/echo handshake with the ultrasonic transducer
//!
//! ```text
//! trigger ──┐  ┌──────┐
//!           └──┘10 µs └──────────────────────────────
//! echo    ────────────────┐               ┌──────────
//!                          └── time of flight ──┘
//!          (wait for rising edge)  (measure high time)
//! ```
//!
//! The echo pin is polled in 1 µs delay steps and both edges are
//! timestamped on a [`MicrosClock`], so the time spent reading the pin and
//! looping counts towards the echo width. Either phase exceeding
//! `echo_timeout_us` produces a [`PulseStatus::Timeout`] sample. A
//! timeout is an expected outcome, not an error: the sampler excludes it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::LevelGuardConfig;
use crate::constants::sensors::{ECHO_POLL_STEP_US, TRIGGER_SETTLE_US};
use crate::time::{elapsed_us, MicrosClock, MicrosInstant};
use crate::traits::PulseSource;

/// Outcome of one trigger/echo exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseStatus {
    /// Echo captured, duration is meaningful
    Valid,
    /// No echo (or no end of echo) before the timeout
    Timeout,
    /// A pin operation failed
    PinFault,
}

/// One raw time-of-flight sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPulseSample {
    /// Echo high time in microseconds. Zero unless `status` is `Valid`.
    pub duration_us: u32,
    /// Outcome of the exchange
    pub status: PulseStatus,
}

impl RawPulseSample {
    /// Captured echo. A zero-length echo is reported as a timeout so that a
    /// zero distance can never come out of the sampler.
    pub const fn valid(duration_us: u32) -> Self {
        if duration_us == 0 {
            return Self::timeout();
        }
        Self {
            duration_us,
            status: PulseStatus::Valid,
        }
    }

    /// No echo
    pub const fn timeout() -> Self {
        Self {
            duration_us: 0,
            status: PulseStatus::Timeout,
        }
    }

    /// Pin failure
    pub const fn pin_fault() -> Self {
        Self {
            duration_us: 0,
            status: PulseStatus::PinFault,
        }
    }

    /// Usable for distance conversion
    pub const fn is_valid(&self) -> bool {
        matches!(self.status, PulseStatus::Valid)
    }

    /// Time of flight in seconds, `None` when invalid
    pub fn time_of_flight_s(&self) -> Option<f32> {
        self.is_valid()
            .then(|| self.duration_us as f32 / crate::constants::time::US_PER_SECOND)
    }
}

/// Bit-banged driver for AJ-SR04M / HC-SR04 style transducers
pub struct PulseTimer<T, E, D, K> {
    trigger: T,
    echo: E,
    delay: D,
    clock: K,
    trigger_width_us: u32,
    timeout_us: u32,
}

impl<T, E, D, K> PulseTimer<T, E, D, K>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    K: MicrosClock,
{
    /// Build with pulse width and timeout from the configuration
    pub fn new(trigger: T, echo: E, delay: D, clock: K, config: &LevelGuardConfig) -> Self {
        Self {
            trigger,
            echo,
            delay,
            clock,
            trigger_width_us: config.trigger_width_us.max(1),
            timeout_us: config.echo_timeout_us,
        }
    }

    /// Give the pins, delay and clock back
    pub fn release(self) -> (T, E, D, K) {
        (self.trigger, self.echo, self.delay, self.clock)
    }

    fn fire_trigger(&mut self) -> Result<(), ()> {
        self.trigger.set_low().map_err(|_| ())?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high().map_err(|_| ())?;
        self.delay.delay_us(self.trigger_width_us);
        self.trigger.set_low().map_err(|_| ())
    }

    /// Poll until the echo pin reads `level` and return the instant it was
    /// seen, or `None` once `timeout_us` has passed since `since`.
    ///
    /// The poll count also bounds the wait, so a stalled counter cannot
    /// hang the cycle.
    fn wait_for(&mut self, level: bool, since: MicrosInstant) -> Result<Option<MicrosInstant>, ()> {
        let mut polls = 0u32;
        loop {
            if self.echo.is_high().map_err(|_| ())? == level {
                return Ok(Some(self.clock.now_us()));
            }
            let waited = elapsed_us(since, self.clock.now_us());
            if waited >= u64::from(self.timeout_us) || polls >= self.timeout_us {
                return Ok(None);
            }
            self.delay.delay_us(ECHO_POLL_STEP_US);
            polls = polls.saturating_add(ECHO_POLL_STEP_US);
        }
    }
}

impl<T, E, D, K> PulseSource for PulseTimer<T, E, D, K>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    K: MicrosClock,
{
    fn measure(&mut self) -> RawPulseSample {
        if self.fire_trigger().is_err() {
            log_warn!("Trigger pin fault");
            return RawPulseSample::pin_fault();
        }

        let fired = self.clock.now_us();
        let rise = match self.wait_for(true, fired) {
            Ok(Some(at)) => at,
            Ok(None) => return RawPulseSample::timeout(),
            Err(()) => return RawPulseSample::pin_fault(),
        };

        match self.wait_for(false, rise) {
            Ok(Some(fall)) => {
                let high_us = u32::try_from(elapsed_us(rise, fall)).unwrap_or(u32::MAX);
                RawPulseSample::valid(high_us)
            }
            Ok(None) => RawPulseSample::timeout(),
            Err(()) => RawPulseSample::pin_fault(),
        }
    }
}
