//! Simulated Tank Example
//!
//! Runs a LevelGuard node against a simulated tank on the host: the
//! surface drops 1 cm per wake, the environment sensor drifts a little,
//! and the uplink is down for cycles 3 to 5.
//!
//! ## What You'll Learn
//!
//! - Wiring board collaborators into a [`Device`]
//! - How readings pile up in the history buffer while the uplink is down
//!   and drain oldest-first once it is back
//! - How the backoff policy stretches sleep after failed publishes
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example simulated_tank
//! ```

use levelguard_core::{
    device::{Collaborators, Device},
    errors::{SensorError, UplinkError},
    pulse::RawPulseSample,
    retained::RtcRetainedStore,
    scheduler::SleepPolicy,
    telemetry::{Message, Topic},
    time::FixedTime,
    traits::{EnvironmentReading, EnvironmentSensor, PowerManager, PulseSource, TelemetryUplink},
    LevelGuardConfig,
};

/// Speed the simulated echo travels at (m/s)
const AIR_SPEED: f32 = 343.4;

/// Tank whose surface sinks a little every wake
struct Tank {
    distance_m: f32,
    wake: u32,
}

impl PulseSource for Tank {
    fn measure(&mut self) -> RawPulseSample {
        // Every fifth ping misses the surface
        self.wake += 1;
        if self.wake % 5 == 0 {
            return RawPulseSample::timeout();
        }
        let round_trip_s = 2.0 * self.distance_m / AIR_SPEED;
        RawPulseSample::valid((round_trip_s * 1_000_000.0) as u32)
    }
}

struct Dht22 {
    tick: u32,
}

impl EnvironmentSensor for Dht22 {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.tick += 1;
        let wobble = (self.tick % 3) as f32 * 0.1;
        Ok(EnvironmentReading::new(19.9 + wobble, 50.0 - wobble, 101.6))
    }
}

/// Prints every message and goes offline on request
struct ConsoleUplink {
    online: bool,
}

impl TelemetryUplink for ConsoleUplink {
    fn publish(&mut self, topic: Topic, message: &Message) -> Result<(), UplinkError> {
        if !self.online {
            return Err(UplinkError::NotConnected);
        }
        match message {
            Message::Reading(r) => println!(
                "  -> {:9} t={} distance={:?} c={:.2}",
                topic.name(),
                r.timestamp_ms,
                r.distance_m,
                r.speed_of_sound_m_per_s
            ),
            Message::Health(h) => println!(
                "  -> {:9} buffer {}/{} failures={}",
                topic.name(),
                h.buffer_len,
                h.buffer_capacity,
                h.consecutive_publish_failures
            ),
            Message::Diagnostic(text) => println!("  -> {:9} {}", topic.name(), text),
        }
        Ok(())
    }
}

struct HostDelay;

impl embedded_hal::delay::DelayNs for HostDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Records the requested sleep instead of sleeping
struct Hibernate {
    total_seconds: u64,
}

impl PowerManager for Hibernate {
    fn sleep(&mut self, duration_seconds: u32) {
        self.total_seconds += u64::from(duration_seconds);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== LevelGuard Simulated Tank ===\n");

    let config = LevelGuardConfig {
        sleep_policy: SleepPolicy::Backoff { max_factor: 4 },
        calibrate_every_n_cycles: 4,
        ..Default::default()
    };

    let parts = Collaborators {
        pulses: Tank { distance_m: 0.80, wake: 0 },
        environment: Dht22 { tick: 0 },
        uplink: ConsoleUplink { online: true },
        delay: HostDelay,
        clock: FixedTime::stepping(1_700_000_000_000, 50),
    };
    let mut device = Device::new(config, parts, RtcRetainedStore::new())?;
    let mut power = Hibernate { total_seconds: 0 };

    for cycle in 1..=8u32 {
        let offline = (3..=5).contains(&cycle);
        device.collaborators_mut().uplink.online = !offline;

        let report = device.run_cycle();
        let plan = device.sleep(&mut power);

        println!(
            "cycle {}: distance={:?} calibrated={:?} published={} pending={} sleep={}s ({:?})",
            report.cycle,
            report.measurement.distance_m,
            report.calibration.map(|c| c.accepted),
            report.readings_published,
            report.pending,
            plan.duration_seconds,
            plan.reason,
        );

        let parts = device.collaborators_mut();
        parts.pulses.distance_m += 0.01;
        // Time spent asleep
        parts.clock.advance(u64::from(plan.duration_seconds) * 1000);
    }

    println!("\nEstimate in use: {:?}", device.estimate());
    if let Some(trend) = device.history().trend_m_per_hour() {
        println!("Surface trend: {:+.3} m/h (distance grows as the tank empties)", trend);
    }
    println!("Total time asleep: {} s", power.total_seconds);

    Ok(())
}
