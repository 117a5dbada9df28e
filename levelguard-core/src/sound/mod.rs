//! Speed-of-Sound Compensation
//!
//! ## Overview
//!
//! The transducer measures time, not distance. Converting one into the other
//! needs the local speed of sound, which moves by ~0.6 m/s per °C and a
//! little with humidity. Over a 3 m tank, a 10 °C error is ~5 cm of level.
//!
//! ## Strategies
//!
//! | Strategy        | Inputs        | Cost                 | Accuracy vs. model |
//! |-----------------|---------------|----------------------|--------------------|
//! | `Calculated`    | T, RH, P      | `expf` + `sqrtf`     | reference          |
//! | `Interpolated`  | T, RH         | 4 loads, 8 flops     | < 0.05 m/s in grid |
//!
//! Exactly one is active. The board firmware used to choose with two
//! mutually exclusive build macros; here the choice is a configuration
//! value and [`SpeedModel::from_config`] refuses zero or two selections.
//!
//! ```rust
//! use levelguard_core::{LevelGuardConfig, SpeedModel, SpeedOfSoundModel};
//!
//! let model = SpeedModel::from_config(&LevelGuardConfig::default()).unwrap();
//! let c = model.estimate(20.0, 50.0, 101.6);
//! assert!(c > 331.0 && c < 346.0);
//! ```

mod calculated;
pub mod lookup;

pub use calculated::CalculatedSpeedModel;
pub use lookup::{InterpolatedSpeedModel, SoundSpeedTable};

use crate::config::{LevelGuardConfig, SpeedStrategy};
use crate::errors::ConfigResult;
use crate::traits::{EnvironmentReading, SpeedOfSoundModel};

/// The strategy selected at startup
#[derive(Debug, Clone, Copy)]
pub enum SpeedModel {
    /// Closed-form humid-air model
    Calculated(CalculatedSpeedModel),
    /// Precomputed grid
    Interpolated(InterpolatedSpeedModel),
}

impl SpeedModel {
    /// Build the configured strategy, failing fast on a bad selection
    pub fn from_config(config: &LevelGuardConfig) -> ConfigResult<Self> {
        match config.speed_strategy()? {
            SpeedStrategy::Calculated => Ok(Self::Calculated(CalculatedSpeedModel::new())),
            SpeedStrategy::Interpolated => {
                let table =
                    SoundSpeedTable::standard(config.speed_grid_cols, config.speed_grid_rows)?;
                Ok(Self::Interpolated(InterpolatedSpeedModel::new(table)))
            }
        }
    }

    /// Which strategy this is
    pub fn strategy(&self) -> SpeedStrategy {
        match self {
            Self::Calculated(_) => SpeedStrategy::Calculated,
            Self::Interpolated(_) => SpeedStrategy::Interpolated,
        }
    }
}

impl SpeedOfSoundModel for SpeedModel {
    fn estimate(&self, temperature_c: f32, humidity_pct: f32, pressure_kpa: f32) -> f32 {
        match self {
            Self::Calculated(model) => model.estimate(temperature_c, humidity_pct, pressure_kpa),
            Self::Interpolated(model) => model.estimate(temperature_c, humidity_pct, pressure_kpa),
        }
    }
}

/// Where the active estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EstimateSource {
    /// No accepted calibration yet; nominal conditions assumed
    ColdStart,
    /// Derived from an accepted calibration pass
    Calibrated,
}

/// Speed of sound in force for a measurement pass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedOfSoundEstimate {
    /// Speed of sound (m/s)
    pub speed_m_per_s: f32,
    /// Conditions the speed was computed for
    pub environment: EnvironmentReading,
    /// Cold start or calibration
    pub source: EstimateSource,
}

/// Temperature assumed before the first accepted calibration (°C)
pub const COLD_START_TEMPERATURE_C: f32 = 20.0;

/// Humidity assumed before the first accepted calibration (%RH)
pub const COLD_START_HUMIDITY_PCT: f32 = 50.0;

impl SpeedOfSoundEstimate {
    /// Nominal estimate used until a calibration is accepted
    pub fn cold_start<M: SpeedOfSoundModel>(model: &M, pressure_kpa: f32) -> Self {
        let environment = EnvironmentReading::new(
            COLD_START_TEMPERATURE_C,
            COLD_START_HUMIDITY_PCT,
            pressure_kpa,
        );
        Self {
            speed_m_per_s: model.estimate_for(&environment),
            environment,
            source: EstimateSource::ColdStart,
        }
    }

    /// Estimate for calibrated conditions
    pub fn calibrated<M: SpeedOfSoundModel>(model: &M, environment: EnvironmentReading) -> Self {
        Self {
            speed_m_per_s: model.estimate_for(&environment),
            environment,
            source: EstimateSource::Calibrated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn both_strategies_agree_at_reference_point() {
        let calculated = SpeedModel::from_config(&LevelGuardConfig::default()).unwrap();
        let interpolated = SpeedModel::from_config(&LevelGuardConfig {
            calculate_speed_of_sound: false,
            interpolate_speed_of_sound: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(calculated.strategy(), SpeedStrategy::Calculated);
        assert_eq!(interpolated.strategy(), SpeedStrategy::Interpolated);

        for model in [calculated, interpolated] {
            let c = model.estimate(20.0, 50.0, 101.6);
            assert!(c > 331.0 && c < 346.0, "c = {}", c);
        }
    }

    #[test]
    fn selection_fails_fast() {
        let both = LevelGuardConfig {
            interpolate_speed_of_sound: true,
            ..Default::default()
        };
        assert!(matches!(
            SpeedModel::from_config(&both),
            Err(ConfigError::ConflictingSpeedStrategy)
        ));

        let neither = LevelGuardConfig {
            calculate_speed_of_sound: false,
            ..Default::default()
        };
        assert!(matches!(
            SpeedModel::from_config(&neither),
            Err(ConfigError::MissingSpeedStrategy)
        ));
    }

    #[test]
    fn cold_start_uses_nominal_conditions() {
        let model = CalculatedSpeedModel::new();
        let estimate = SpeedOfSoundEstimate::cold_start(&model, 101.6);
        assert_eq!(estimate.source, EstimateSource::ColdStart);
        assert_eq!(estimate.speed_m_per_s, model.estimate(20.0, 50.0, 101.6));
    }
}
