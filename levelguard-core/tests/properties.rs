//! Property tests for the buffering and scheduling laws

use proptest::prelude::*;

use levelguard_core::{
    history::HistoryBuffer,
    scheduler::{CycleOutcome, DutyCycleScheduler, SleepPolicy},
    sound::{lookup::SoundSpeedTable, CalculatedSpeedModel, InterpolatedSpeedModel},
    traits::{EnvironmentReading, SpeedOfSoundModel},
    DistanceMeasurement, LevelGuardConfig,
};

fn measurement(ts: u64) -> DistanceMeasurement {
    DistanceMeasurement {
        distance_m: Some(1.0 + ts as f32 / 1000.0),
        timestamp_ms: ts,
        source_sample_count: 10,
        rejected_sample_count: 0,
        speed_of_sound_m_per_s: 343.9,
        environment: EnvironmentReading::new(20.0, 50.0, 101.6),
    }
}

fn policy() -> impl Strategy<Value = SleepPolicy> {
    prop_oneof![
        Just(SleepPolicy::Fixed),
        Just(SleepPolicy::DriftCompensated),
        (1u32..=1024).prop_map(|max_factor| SleepPolicy::Backoff { max_factor }),
    ]
}

proptest! {
    #[test]
    fn history_keeps_the_newest_capacity_entries(capacity in 1usize..=255, pushes in 0usize..600) {
        let mut history = HistoryBuffer::new(capacity).unwrap();
        let mut evicted = 0u32;
        for ts in 0..pushes as u64 {
            if let Some(old) = history.push(measurement(ts)) {
                // Always the oldest entry still held
                prop_assert_eq!(old.timestamp_ms, ts - capacity as u64);
                evicted += 1;
            }
        }

        let kept = pushes.min(capacity);
        prop_assert_eq!(history.len(), kept);
        prop_assert_eq!(history.evicted_total(), evicted);

        let timestamps: Vec<u64> = history.peek_all().map(|m| m.timestamp_ms).collect();
        let expected: Vec<u64> = ((pushes - kept) as u64..pushes as u64).collect();
        prop_assert_eq!(timestamps, expected);

        let drained = history.drain();
        prop_assert_eq!(drained.len(), kept);
        prop_assert_eq!(history.peek_all().count(), 0);
    }

    #[test]
    fn sleep_is_never_below_a_minute(
        interval in -10_000i32..=10_000,
        policy in policy(),
        publish_ok in any::<bool>(),
        active_ms in 0u64..10_000_000,
        cycles in 1usize..12,
    ) {
        let config = LevelGuardConfig {
            sleep_interval_min: interval,
            sleep_policy: policy,
            ..Default::default()
        };
        let mut scheduler = DutyCycleScheduler::new(&config);
        let outcome = CycleOutcome {
            publish_ok,
            readings_pending: 0,
            active_ms,
        };
        for _ in 0..cycles {
            let plan = scheduler.plan_next_sleep(&outcome);
            prop_assert!(plan.duration_seconds >= 60);
        }
    }

    #[test]
    fn both_models_stay_in_the_audible_air_range(t in 0.0f32..50.0, rh in 0.0f32..100.0) {
        let calculated = CalculatedSpeedModel::new();
        let interpolated = InterpolatedSpeedModel::new(SoundSpeedTable::standard(51, 2).unwrap());

        let c = calculated.estimate(t, rh, 101.6);
        let i = interpolated.estimate(t, rh, 101.6);
        prop_assert!(c > 331.0 && c < 370.0);
        prop_assert!((c - i).abs() < 0.5, "calculated {} vs interpolated {}", c, i);
    }
}

#[test]
fn reference_point_in_range_for_both_models() {
    let calculated = CalculatedSpeedModel::new().estimate(20.0, 50.0, 101.6);
    let interpolated = InterpolatedSpeedModel::new(SoundSpeedTable::standard(51, 2).unwrap())
        .estimate(20.0, 50.0, 101.6);

    for c in [calculated, interpolated] {
        assert!((331.0..=346.0).contains(&c), "c = {}", c);
    }
}

#[test]
fn interpolation_is_exact_on_grid_points() {
    let table = SoundSpeedTable::standard(51, 2).unwrap();
    let (rows, cols) = table.dimensions();
    for row in 0..rows {
        for col in 0..cols {
            let expected = table.value_at(row, col).unwrap();
            let got = table.lookup(table.temperature_at(col), table.humidity_at(row));
            assert_eq!(got, expected, "row {} col {}", row, col);
        }
    }
}
