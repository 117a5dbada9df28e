//! Duty-Cycle Scheduling
//!
//! ## Overview
//!
//! The node spends almost all of its life asleep. Each wake runs through a
//! fixed sequence of phases and ends by choosing how long to sleep:
//!
//! ```text
//!  ┌────────┐   ┌─────────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//!  │ Waking │──▶│ Calibrating │──▶│ Sampling │──▶│ Publishing │──▶│ Sleeping │
//!  └────────┘   └─────────────┘   └──────────┘   └────────────┘   └──────────┘
//!       │                              ▲                               │
//!       └──────── (no calibration) ────┘                               │
//!       ▲                                                              │
//!       └──────────────────────────── wake() ──────────────────────────┘
//! ```
//!
//! ## Sleep Policies
//!
//! | Policy             | Duration                                   | Use case              |
//! |--------------------|--------------------------------------------|-----------------------|
//! | `Fixed`            | baseline                                   | reference behaviour   |
//! | `DriftCompensated` | baseline − time awake                      | wall-clock cadence    |
//! | `Backoff`          | baseline · min(2^k, max_factor)            | save power offline    |
//!
//! `k` is the number of consecutive cycles whose publish failed. Whatever
//! the policy, the result is never below [`MIN_SLEEP_SECONDS`]; a zero or
//! negative configured interval is floored to one minute rather than
//! spinning the radio.

use thiserror_no_std::Error;

use crate::config::LevelGuardConfig;
use crate::constants::time::{
    DEFAULT_BACKOFF_MAX_FACTOR, MIN_SLEEP_SECONDS, MS_PER_SECOND, SECONDS_PER_MINUTE,
};

/// Phase of the wake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CyclePhase {
    /// Just out of deep sleep
    Waking,
    /// Refreshing the speed-of-sound estimate
    Calibrating,
    /// Taking the measurement window
    Sampling,
    /// Sending health and buffered readings
    Publishing,
    /// Cycle finished, waiting for the power manager
    Sleeping,
}

impl CyclePhase {
    /// Whether `next` may follow `self`
    pub fn can_advance_to(self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        matches!(
            (self, next),
            (Waking, Calibrating)
                | (Waking, Sampling)
                | (Calibrating, Sampling)
                | (Sampling, Publishing)
                | (Publishing, Sleeping)
        )
    }

    /// Short name for logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waking => "waking",
            Self::Calibrating => "calibrating",
            Self::Sampling => "sampling",
            Self::Publishing => "publishing",
            Self::Sleeping => "sleeping",
        }
    }
}

/// Refused phase change
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Illegal phase transition {from:?} -> {to:?}")]
pub struct TransitionError {
    /// Phase the scheduler was in
    pub from: CyclePhase,
    /// Phase that was requested
    pub to: CyclePhase,
}

/// How the sleep duration reacts to the cycle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SleepPolicy {
    /// Always the configured interval
    #[default]
    Fixed,
    /// Configured interval minus the time spent awake
    DriftCompensated,
    /// Stretch the interval while publishing keeps failing
    Backoff {
        /// Upper bound on the multiplier
        max_factor: u32,
    },
}

impl SleepPolicy {
    /// Backoff with the default multiplier cap
    pub const fn backoff() -> Self {
        Self::Backoff {
            max_factor: DEFAULT_BACKOFF_MAX_FACTOR,
        }
    }
}

/// Why a sleep duration was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SleepReason {
    /// Plain configured interval
    Scheduled,
    /// Interval shortened by the time spent awake
    DriftCompensated,
    /// Interval stretched after publish failures
    PublishBackoff,
    /// The computed duration was below the one-minute floor
    FloorApplied,
}

/// The decision handed to the power manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SleepPlan {
    /// Always `>= MIN_SLEEP_SECONDS`
    pub duration_seconds: u32,
    /// Which rule produced the duration
    pub reason: SleepReason,
}

/// What happened during the cycle that is ending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleOutcome {
    /// Every pending message was delivered
    pub publish_ok: bool,
    /// Readings still waiting in the history buffer
    pub readings_pending: usize,
    /// Time from wake to the end of publishing (ms)
    pub active_ms: u64,
}

/// Phase tracking and sleep planning
#[derive(Debug, Clone)]
pub struct DutyCycleScheduler {
    phase: CyclePhase,
    policy: SleepPolicy,
    sleep_interval_min: i32,
    consecutive_publish_failures: u32,
}

impl DutyCycleScheduler {
    /// Scheduler with no failure history
    pub fn new(config: &LevelGuardConfig) -> Self {
        Self {
            phase: CyclePhase::Waking,
            policy: config.sleep_policy,
            sleep_interval_min: config.sleep_interval_min,
            consecutive_publish_failures: 0,
        }
    }

    /// Resume with a failure streak carried over from retained memory
    pub fn with_failures(config: &LevelGuardConfig, consecutive_publish_failures: u32) -> Self {
        Self {
            consecutive_publish_failures,
            ..Self::new(config)
        }
    }

    /// Current phase
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Cycles in a row that ended with unsent data
    pub fn consecutive_publish_failures(&self) -> u32 {
        self.consecutive_publish_failures
    }

    /// Move to `next` if the transition is legal
    pub fn advance(&mut self, next: CyclePhase) -> Result<(), TransitionError> {
        if !self.phase.can_advance_to(next) {
            log_error!(
                "Refused phase transition {} -> {}",
                self.phase.as_str(),
                next.as_str()
            );
            return Err(TransitionError {
                from: self.phase,
                to: next,
            });
        }
        log_debug!("Phase {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        Ok(())
    }

    /// Start a new cycle
    pub fn wake(&mut self) {
        self.phase = CyclePhase::Waking;
    }

    /// Configured interval in seconds, floored at one minute
    pub fn baseline_seconds(&self) -> u32 {
        let minutes = self.sleep_interval_min.max(1) as u32;
        minutes.saturating_mul(SECONDS_PER_MINUTE)
    }

    /// Decide the next sleep and update the publish failure streak
    pub fn plan_next_sleep(&mut self, outcome: &CycleOutcome) -> SleepPlan {
        if outcome.publish_ok {
            self.consecutive_publish_failures = 0;
        } else {
            self.consecutive_publish_failures = self.consecutive_publish_failures.saturating_add(1);
        }

        let baseline = self.baseline_seconds();
        let (duration, reason) = match self.policy {
            SleepPolicy::Fixed => (baseline, SleepReason::Scheduled),
            SleepPolicy::DriftCompensated => {
                let awake_s = (outcome.active_ms / MS_PER_SECOND).min(u32::MAX as u64) as u32;
                if awake_s == 0 {
                    (baseline, SleepReason::Scheduled)
                } else {
                    (baseline.saturating_sub(awake_s), SleepReason::DriftCompensated)
                }
            }
            SleepPolicy::Backoff { max_factor } => {
                let k = self.consecutive_publish_failures;
                if k == 0 {
                    (baseline, SleepReason::Scheduled)
                } else {
                    let factor = backoff_factor(k, max_factor);
                    (baseline.saturating_mul(factor), SleepReason::PublishBackoff)
                }
            }
        };

        let plan = if duration < MIN_SLEEP_SECONDS || self.sleep_interval_min < 1 {
            SleepPlan {
                duration_seconds: duration.max(MIN_SLEEP_SECONDS),
                reason: SleepReason::FloorApplied,
            }
        } else {
            SleepPlan {
                duration_seconds: duration,
                reason,
            }
        };

        log_info!(
            "Sleeping {} s (publish failures: {}, pending: {})",
            plan.duration_seconds,
            self.consecutive_publish_failures,
            outcome.readings_pending as u32
        );
        plan
    }
}

/// `min(2^k, max_factor)` without overflow, never below 1
fn backoff_factor(k: u32, max_factor: u32) -> u32 {
    let exp = 1u32.checked_shl(k).filter(|f| *f != 0).unwrap_or(u32::MAX);
    exp.min(max_factor.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(interval_min: i32, policy: SleepPolicy) -> DutyCycleScheduler {
        DutyCycleScheduler::new(&LevelGuardConfig {
            sleep_interval_min: interval_min,
            sleep_policy: policy,
            ..Default::default()
        })
    }

    fn ok() -> CycleOutcome {
        CycleOutcome {
            publish_ok: true,
            readings_pending: 0,
            active_ms: 0,
        }
    }

    fn failed_publish() -> CycleOutcome {
        CycleOutcome {
            publish_ok: false,
            readings_pending: 1,
            ..ok()
        }
    }

    #[test]
    fn fixed_policy_uses_interval() {
        let mut s = scheduler(10, SleepPolicy::Fixed);
        let plan = s.plan_next_sleep(&ok());
        assert_eq!(plan, SleepPlan { duration_seconds: 600, reason: SleepReason::Scheduled });

        // Failure does not change a fixed plan
        assert_eq!(s.plan_next_sleep(&failed_publish()).duration_seconds, 600);
        assert_eq!(s.consecutive_publish_failures(), 1);
    }

    #[test]
    fn non_positive_interval_is_floored() {
        for interval in [0, -1, -600] {
            let mut s = scheduler(interval, SleepPolicy::Fixed);
            let plan = s.plan_next_sleep(&ok());
            assert_eq!(plan.duration_seconds, 60);
            assert_eq!(plan.reason, SleepReason::FloorApplied);
        }
    }

    #[test]
    fn drift_compensation_subtracts_awake_time() {
        let mut s = scheduler(10, SleepPolicy::DriftCompensated);
        let plan = s.plan_next_sleep(&CycleOutcome { active_ms: 45_500, ..ok() });
        assert_eq!(plan.duration_seconds, 555);
        assert_eq!(plan.reason, SleepReason::DriftCompensated);
    }

    #[test]
    fn drift_compensation_respects_floor() {
        let mut s = scheduler(1, SleepPolicy::DriftCompensated);
        let plan = s.plan_next_sleep(&CycleOutcome { active_ms: 30_000, ..ok() });
        assert_eq!(plan.duration_seconds, 60);
        assert_eq!(plan.reason, SleepReason::FloorApplied);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let mut s = scheduler(10, SleepPolicy::Backoff { max_factor: 6 });
        let durations: Vec<u32> = (0..4)
            .map(|_| s.plan_next_sleep(&failed_publish()).duration_seconds)
            .collect();
        assert_eq!(durations, vec![1200, 2400, 3600, 3600]);

        let plan = s.plan_next_sleep(&ok());
        assert_eq!(plan, SleepPlan { duration_seconds: 600, reason: SleepReason::Scheduled });
        assert_eq!(s.consecutive_publish_failures(), 0);
    }

    #[test]
    fn backoff_factor_never_overflows() {
        assert_eq!(backoff_factor(40, u32::MAX), u32::MAX);
        assert_eq!(backoff_factor(3, 0), 1);
        assert_eq!(backoff_factor(1, 1024), 2);
    }

    #[test]
    fn restores_failure_streak() {
        let config = LevelGuardConfig {
            sleep_policy: SleepPolicy::backoff(),
            ..Default::default()
        };
        let mut s = DutyCycleScheduler::with_failures(&config, 2);
        // Third consecutive failure: 2^3 = 8, capped at 6
        assert_eq!(s.plan_next_sleep(&failed_publish()).duration_seconds, 3600);
    }

    #[test]
    fn phase_sequence() {
        let mut s = scheduler(10, SleepPolicy::Fixed);
        assert_eq!(s.phase(), CyclePhase::Waking);
        for next in [
            CyclePhase::Calibrating,
            CyclePhase::Sampling,
            CyclePhase::Publishing,
            CyclePhase::Sleeping,
        ] {
            assert!(s.advance(next).is_ok());
        }
        assert_eq!(s.phase(), CyclePhase::Sleeping);

        s.wake();
        assert!(s.advance(CyclePhase::Sampling).is_ok());
    }

    #[test]
    fn illegal_transitions_refused() {
        let mut s = scheduler(10, SleepPolicy::Fixed);
        assert_eq!(
            s.advance(CyclePhase::Publishing),
            Err(TransitionError { from: CyclePhase::Waking, to: CyclePhase::Publishing })
        );
        assert_eq!(s.phase(), CyclePhase::Waking);

        s.advance(CyclePhase::Sampling).unwrap();
        s.advance(CyclePhase::Publishing).unwrap();
        s.advance(CyclePhase::Sleeping).unwrap();
        assert!(s.advance(CyclePhase::Waking).is_err());
    }
}
