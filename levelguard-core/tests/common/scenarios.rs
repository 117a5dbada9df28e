//! Canned sensor data for the cycle tests

use levelguard_core::pulse::RawPulseSample;

/// Echo time for ~1 m at 343 m/s
pub const ONE_METRE_US: u32 = 5830;

/// The reference calibration: five temperatures around 20 °C repeated,
/// humidity alternating 49/51 (population σ = 1.0).
pub fn stable_calibration() -> Vec<(f32, f32)> {
    let temps = [19.8, 20.1, 19.9, 20.0, 20.2];
    (0..10).map(|i| (temps[i % 5], if i % 2 == 0 { 49.0 } else { 51.0 })).collect()
}

/// Temperature jumping between 10 °C and 30 °C
pub fn unstable_calibration() -> Vec<(f32, f32)> {
    (0..10).map(|i| (if i % 2 == 0 { 10.0 } else { 30.0 }, 50.0)).collect()
}

/// Ten attempts, the 4th and 8th time out, the rest see `duration_us`
pub fn two_timeouts_in_ten(duration_us: u32) -> Vec<RawPulseSample> {
    (0..10)
        .map(|i| {
            if i == 3 || i == 7 {
                RawPulseSample::timeout()
            } else {
                RawPulseSample::valid(duration_us)
            }
        })
        .collect()
}

/// Eight attempts with distinct echoes, then two timeouts
pub fn varied_with_two_timeouts() -> Vec<RawPulseSample> {
    let mut script: Vec<RawPulseSample> = [5800, 5810, 5820, 5830, 5840, 5850, 5860, 5870]
        .into_iter()
        .map(RawPulseSample::valid)
        .collect();
    script.push(RawPulseSample::timeout());
    script.push(RawPulseSample::pin_fault());
    script
}
