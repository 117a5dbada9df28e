//! Physical Constants for Acoustic Ranging
//!
//! Values used by the speed-of-sound models. All are SI unless the name
//! says otherwise.

// ===== GAS CONSTANTS =====

/// Absolute zero in Celsius (°C).
///
/// Source: NIST Special Publication 330 (2019)
pub const ABSOLUTE_ZERO_CELSIUS: f32 = -273.15;

/// Molar gas constant (J/(mol·K)).
///
/// Source: CODATA 2018 (exact since the 2019 SI redefinition)
pub const MOLAR_GAS_CONSTANT: f32 = 8.314_462;

/// Molar mass of dry air (kg/mol).
///
/// Source: ISO 2533 standard atmosphere
pub const MOLAR_MASS_DRY_AIR: f32 = 0.028_964_5;

/// Molar mass of water vapour (kg/mol).
pub const MOLAR_MASS_WATER: f32 = 0.018_015;

// ===== MAGNUS-TETENS SATURATION VAPOUR PRESSURE =====

/// Saturation vapour pressure at 0 °C (kPa).
pub const MAGNUS_BASE_KPA: f32 = 0.610_78;

/// Magnus coefficient a (dimensionless).
pub const MAGNUS_A: f32 = 17.27;

/// Magnus coefficient b (°C).
pub const MAGNUS_B_C: f32 = 237.3;

// ===== REFERENCE VALUES =====

/// Speed of sound in dry air at 20°C (m/s).
///
/// Used as the fallback when model inputs are not numbers.
/// Varies with temperature: c ≈ 331.3 + 0.606 * T(°C).
///
/// Source: ISO 9613-1:1993
pub const SPEED_OF_SOUND_AIR_20C_M_PER_S: f32 = 343.2;

/// Mean barometric pressure at the reference deployment site (kPa).
///
/// Itajubá, MG, Brazil (~850 m). Used when the environment sensor has no
/// barometer and as the pressure the lookup table was generated for.
pub const MEAN_SITE_PRESSURE_KPA: f32 = 101.6;

// ===== PLAUSIBILITY ENVELOPE FOR THE CALCULATED MODEL =====

/// Lowest air temperature the model accepts before clamping (°C).
pub const MODEL_TEMP_MIN_C: f32 = -40.0;

/// Highest air temperature the model accepts before clamping (°C).
pub const MODEL_TEMP_MAX_C: f32 = 85.0;

/// Lowest relative humidity (%).
pub const MODEL_HUMIDITY_MIN_PCT: f32 = 0.0;

/// Highest relative humidity (%).
pub const MODEL_HUMIDITY_MAX_PCT: f32 = 100.0;

/// Lowest accepted pressure (kPa). Roughly the summit of Everest.
pub const MODEL_PRESSURE_MIN_KPA: f32 = 30.0;

/// Highest accepted pressure (kPa).
pub const MODEL_PRESSURE_MAX_KPA: f32 = 110.0;
