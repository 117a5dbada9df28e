//! Closed-form speed of sound in humid air
//!
//! Treats air as an ideal mixture of dry air and water vapour:
//!
//! ```text
//! p_sat = 0.61078 · exp(17.27·T / (T + 237.3))      [kPa, Magnus-Tetens]
//! x     = RH/100 · p_sat / P                         [vapour mole fraction]
//! M     = M_dry·(1 − x) + M_w·x                      [kg/mol]
//! γ     = (7 + x) / (5 + x)                          [diatomic + triatomic]
//! c     = sqrt(γ · R · T_K / M)                      [m/s]
//! ```
//!
//! At 20 °C, 50 % RH, 101.6 kPa this gives 343.9 m/s. Inputs are clamped to
//! the plausibility envelope in [`constants::physics`](crate::constants::physics)
//! so a bad sensor value degrades to a boundary estimate instead of nonsense.

use libm::{expf, sqrtf};

use crate::constants::physics::*;
use crate::traits::SpeedOfSoundModel;

/// Ideal-gas humid air model
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatedSpeedModel;

impl CalculatedSpeedModel {
    /// Create the model
    pub const fn new() -> Self {
        Self
    }

    /// Saturation vapour pressure over water (kPa)
    pub fn saturation_vapour_pressure_kpa(temperature_c: f32) -> f32 {
        MAGNUS_BASE_KPA * expf(MAGNUS_A * temperature_c / (temperature_c + MAGNUS_B_C))
    }
}

fn clamp_reported(value: f32, min: f32, max: f32) -> (f32, bool) {
    if value < min {
        (min, true)
    } else if value > max {
        (max, true)
    } else {
        (value, false)
    }
}

impl SpeedOfSoundModel for CalculatedSpeedModel {
    fn estimate(&self, temperature_c: f32, humidity_pct: f32, pressure_kpa: f32) -> f32 {
        if !(temperature_c.is_finite() && humidity_pct.is_finite() && pressure_kpa.is_finite()) {
            log_warn!("Speed of sound: non-finite input, using 20 C dry-air value");
            return SPEED_OF_SOUND_AIR_20C_M_PER_S;
        }

        let (t, t_clamped) = clamp_reported(temperature_c, MODEL_TEMP_MIN_C, MODEL_TEMP_MAX_C);
        let (rh, rh_clamped) =
            clamp_reported(humidity_pct, MODEL_HUMIDITY_MIN_PCT, MODEL_HUMIDITY_MAX_PCT);
        let (p, p_clamped) =
            clamp_reported(pressure_kpa, MODEL_PRESSURE_MIN_KPA, MODEL_PRESSURE_MAX_KPA);

        if t_clamped || rh_clamped || p_clamped {
            log_warn!(
                "Speed of sound: inputs clamped (T: {}->{}, RH: {}->{}, P: {}->{})",
                temperature_c, t, humidity_pct, rh, pressure_kpa, p
            );
        }

        let p_sat = Self::saturation_vapour_pressure_kpa(t);
        // Above ~95 °C p_sat can exceed P; the envelope keeps us below that
        let x = (rh / 100.0 * p_sat / p).clamp(0.0, 1.0);

        let molar_mass = MOLAR_MASS_DRY_AIR * (1.0 - x) + MOLAR_MASS_WATER * x;
        let gamma = (7.0 + x) / (5.0 + x);
        let t_kelvin = t - ABSOLUTE_ZERO_CELSIUS;

        sqrtf(gamma * MOLAR_GAS_CONSTANT * t_kelvin / molar_mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: CalculatedSpeedModel = CalculatedSpeedModel::new();

    #[test]
    fn reference_point_is_plausible() {
        let c = MODEL.estimate(20.0, 50.0, 101.6);
        assert!(c > 331.0 && c < 346.0, "c = {}", c);
        assert!((c - 343.87).abs() < 0.1, "c = {}", c);
    }

    #[test]
    fn dry_air_at_freezing() {
        let c = MODEL.estimate(0.0, 0.0, 101.325);
        assert!((c - 331.3).abs() < 0.2, "c = {}", c);
    }

    #[test]
    fn humidity_raises_speed() {
        let dry = MODEL.estimate(30.0, 0.0, 101.6);
        let wet = MODEL.estimate(30.0, 100.0, 101.6);
        assert!(wet > dry);
    }

    #[test]
    fn monotonic_in_temperature() {
        let mut last = 0.0;
        let mut t = -40.0;
        while t <= 85.0 {
            let c = MODEL.estimate(t, 50.0, 101.6);
            assert!(c > last);
            last = c;
            t += 5.0;
        }
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(MODEL.estimate(-100.0, 50.0, 101.6), MODEL.estimate(-40.0, 50.0, 101.6));
        assert_eq!(MODEL.estimate(20.0, 150.0, 101.6), MODEL.estimate(20.0, 100.0, 101.6));
        assert_eq!(MODEL.estimate(20.0, 50.0, 0.0), MODEL.estimate(20.0, 50.0, 30.0));
    }

    #[test]
    fn nan_falls_back_to_reference() {
        assert_eq!(MODEL.estimate(f32::NAN, 50.0, 101.6), SPEED_OF_SOUND_AIR_20C_M_PER_S);
    }
}
