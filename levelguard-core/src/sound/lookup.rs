//! Pre-Computed Speed-of-Sound Grid
//!
//! ## Motivation
//!
//! The closed-form model needs `expf` and `sqrtf`, which cost thousands of
//! cycles on an FPU-less core. The grid trades ~400 bytes of flash for a
//! handful of multiplies.
//!
//! ## Table Layout
//!
//! Rows are humidity bands, columns are temperatures:
//!
//! ```text
//!            0 °C    1 °C    2 °C  ...  50 °C      (51 columns, 1 °C step)
//!   0 % RH  331.32  331.93  332.53 ... 360.37
//! 100 % RH  331.64  332.27  332.90 ... 367.69      (at most 2 rows)
//! ```
//!
//! Values come from the calculated model at the site mean pressure
//! (101.6 kPa). Pressure is not an input of this strategy.
//!
//! ## Bilinear Interpolation
//!
//! ```text
//! f(u,v) = f00 + (f10 − f00)·u + (f01 − f00)·v + (f11 − f10 − f01 + f00)·u·v
//! ```
//!
//! With `u = v = 0` this reduces to `f00`, so a lookup exactly on a grid
//! point returns the stored value bit for bit. Inputs outside the grid are
//! clamped to its edge and a warning is logged.

use libm::floorf;

use crate::errors::{ConfigError, ConfigResult};
use crate::traits::SpeedOfSoundModel;

/// Temperature columns of the shipped grid
pub const STANDARD_GRID_COLS: usize = 51;

/// Humidity rows supported (linear between at most two bands)
pub const MAX_GRID_ROWS: usize = 2;

/// First temperature column of the shipped grid (°C)
pub const STANDARD_GRID_TEMP_MIN_C: f32 = 0.0;

/// Temperature step of the shipped grid (°C)
pub const STANDARD_GRID_TEMP_STEP_C: f32 = 1.0;

/// Humidity bands of the shipped grid (%RH)
pub const STANDARD_GRID_HUMIDITY_BANDS: [f32; MAX_GRID_ROWS] = [0.0, 100.0];

/// Speed of sound (m/s) at 101.6 kPa, row-major `[band][temperature]`
pub static SPEED_OF_SOUND_GRID: [f32; STANDARD_GRID_COLS * MAX_GRID_ROWS] = [
    // 0 % RH, 0..50 °C
    331.32, 331.93, 332.53, 333.14, 333.74, 334.34, 334.94, 335.54, 336.14, 336.73,
    337.33, 337.93, 338.52, 339.11, 339.71, 340.30, 340.89, 341.48, 342.06, 342.65,
    343.24, 343.82, 344.41, 344.99, 345.57, 346.15, 346.73, 347.31, 347.89, 348.47,
    349.04, 349.62, 350.19, 350.76, 351.34, 351.91, 352.48, 353.05, 353.62, 354.18,
    354.75, 355.32, 355.88, 356.45, 357.01, 357.57, 358.13, 358.69, 359.25, 359.81,
    360.37,
    // 100 % RH, 0..50 °C
    331.64, 332.27, 332.90, 333.53, 334.17, 334.80, 335.44, 336.07, 336.71, 337.35,
    337.99, 338.63, 339.27, 339.92, 340.57, 341.22, 341.87, 342.53, 343.19, 343.85,
    344.51, 345.18, 345.86, 346.53, 347.21, 347.90, 348.59, 349.29, 349.99, 350.70,
    351.41, 352.13, 352.86, 353.60, 354.34, 355.09, 355.85, 356.62, 357.40, 358.19,
    358.99, 359.80, 360.62, 361.45, 362.30, 363.16, 364.03, 364.92, 365.83, 366.75,
    367.69,
];

/// Two-dimensional speed-of-sound grid
#[derive(Debug, Clone, Copy)]
pub struct SoundSpeedTable {
    temp_min_c: f32,
    temp_step_c: f32,
    humidity_bands: [f32; MAX_GRID_ROWS],
    rows: usize,
    cols: usize,
    values: &'static [f32],
}

impl SoundSpeedTable {
    /// Build a table over row-major `values`
    ///
    /// Fails with [`ConfigError::InvalidGrid`] for zero or more than two
    /// humidity bands, fewer than two columns, a size mismatch, a
    /// non-positive step or unordered bands.
    pub fn new(
        temp_min_c: f32,
        temp_step_c: f32,
        humidity_bands: &[f32],
        cols: usize,
        values: &'static [f32],
    ) -> ConfigResult<Self> {
        let rows = humidity_bands.len();
        let invalid = ConfigError::InvalidGrid { cols, rows };

        if rows == 0 || rows > MAX_GRID_ROWS || cols < 2 {
            return Err(invalid);
        }
        if values.len() != rows * cols || !(temp_step_c > 0.0) {
            return Err(invalid);
        }
        if rows == 2 && !(humidity_bands[1] > humidity_bands[0]) {
            return Err(invalid);
        }

        let mut bands = [humidity_bands[0]; MAX_GRID_ROWS];
        bands[..rows].copy_from_slice(humidity_bands);

        Ok(Self {
            temp_min_c,
            temp_step_c,
            humidity_bands: bands,
            rows,
            cols,
            values,
        })
    }

    /// The shipped grid with `cols` columns and the first `rows` bands
    pub fn standard(cols: usize, rows: usize) -> ConfigResult<Self> {
        if cols != STANDARD_GRID_COLS || rows == 0 || rows > MAX_GRID_ROWS {
            return Err(ConfigError::InvalidGrid { cols, rows });
        }
        Self::new(
            STANDARD_GRID_TEMP_MIN_C,
            STANDARD_GRID_TEMP_STEP_C,
            &STANDARD_GRID_HUMIDITY_BANDS[..rows],
            cols,
            &SPEED_OF_SOUND_GRID[..rows * cols],
        )
    }

    /// Stored grid value
    pub fn value_at(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }

    /// Temperature of column `col` (°C)
    pub fn temperature_at(&self, col: usize) -> f32 {
        self.temp_min_c + col as f32 * self.temp_step_c
    }

    /// Humidity of band `row` (%RH)
    pub fn humidity_at(&self, row: usize) -> f32 {
        self.humidity_bands[row.min(self.rows - 1)]
    }

    /// Grid dimensions as (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Interpolated speed of sound, clamped to the grid
    pub fn lookup(&self, temperature_c: f32, humidity_pct: f32) -> f32 {
        let (col, temp_frac, temp_clamped) = self.temperature_index(temperature_c);
        let (row, rh_frac, rh_clamped) = self.humidity_index(humidity_pct);

        if temp_clamped || rh_clamped {
            log_warn!(
                "Speed of sound lookup: inputs clamped (T: {}, RH: {})",
                temperature_c, humidity_pct
            );
        }

        self.interpolate_bilinear(row, col, temp_frac, rh_frac)
    }

    /// Column index and fraction toward the next column
    fn temperature_index(&self, temperature_c: f32) -> (usize, f32, bool) {
        let last = self.cols - 1;
        let position = (temperature_c - self.temp_min_c) / self.temp_step_c;

        if !(position > 0.0) {
            // Also catches NaN
            return (0, 0.0, position < 0.0 || position.is_nan());
        }
        if position >= last as f32 {
            return (last, 0.0, position > last as f32);
        }

        let idx = floorf(position);
        (idx as usize, position - idx, false)
    }

    /// Band index and fraction toward the next band
    fn humidity_index(&self, humidity_pct: f32) -> (usize, f32, bool) {
        if self.rows == 1 {
            return (0, 0.0, false);
        }

        let low = self.humidity_bands[0];
        let high = self.humidity_bands[1];
        let frac = (humidity_pct - low) / (high - low);

        if !(frac > 0.0) {
            (0, 0.0, frac < 0.0 || frac.is_nan())
        } else if frac >= 1.0 {
            (1, 0.0, frac > 1.0)
        } else {
            (0, frac, false)
        }
    }

    fn interpolate_bilinear(&self, row: usize, col: usize, temp_frac: f32, rh_frac: f32) -> f32 {
        let at = |r: usize, c: usize| self.values[r * self.cols + c];

        let base = at(row, col);
        let next_col = (col + 1).min(self.cols - 1);
        let next_row = (row + 1).min(self.rows - 1);

        let temp_next = at(row, next_col);
        let rh_next = at(next_row, col);
        let corner = at(next_row, next_col);

        base + (temp_next - base) * temp_frac
            + (rh_next - base) * rh_frac
            + (corner - temp_next - rh_next + base) * temp_frac * rh_frac
    }
}

/// Speed-of-sound strategy backed by a [`SoundSpeedTable`]
#[derive(Debug, Clone, Copy)]
pub struct InterpolatedSpeedModel {
    table: SoundSpeedTable,
}

impl InterpolatedSpeedModel {
    /// Wrap a table
    pub const fn new(table: SoundSpeedTable) -> Self {
        Self { table }
    }

    /// The underlying grid
    pub fn table(&self) -> &SoundSpeedTable {
        &self.table
    }
}

impl SpeedOfSoundModel for InterpolatedSpeedModel {
    fn estimate(&self, temperature_c: f32, humidity_pct: f32, _pressure_kpa: f32) -> f32 {
        self.table.lookup(temperature_c, humidity_pct)
    }
}
