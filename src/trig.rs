//! One-degree sine/cosine lookup tables in fixed point.
//!
//! Headings are quantised to whole degrees before rotation, so every ray is
//! cast along one of 360 directions. The tables are built on first use and
//! never mutated afterwards.

use std::sync::LazyLock;

use glam::IVec2;

use crate::types::TRIG_SCALE;

static TABLES: LazyLock<TrigTables> = LazyLock::new(TrigTables::build);

/// Shared lookup tables.
#[inline]
pub fn tables() -> &'static TrigTables {
    &TABLES
}

/// Wrap an integer angle into `[0, 360)`.
#[inline]
pub fn wrap_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

pub struct TrigTables {
    sin: [i32; 360],
    cos: [i32; 360],
}

impl TrigTables {
    fn build() -> Self {
        let mut sin = [0; 360];
        let mut cos = [0; 360];
        for deg in 0..360 {
            let rad = (deg as f64).to_radians();
            sin[deg] = (rad.sin() * TRIG_SCALE as f64).round() as i32;
            cos[deg] = (rad.cos() * TRIG_SCALE as f64).round() as i32;
        }
        Self { sin, cos }
    }

    /// Sine of `degrees`, scaled by [`TRIG_SCALE`].
    #[inline]
    pub fn sin(&self, degrees: i32) -> i32 {
        self.sin[wrap_degrees(degrees) as usize]
    }

    /// Cosine of `degrees`, scaled by [`TRIG_SCALE`].
    #[inline]
    pub fn cos(&self, degrees: i32) -> i32 {
        self.cos[wrap_degrees(degrees) as usize]
    }

    /// Offset of a point `range_mm` away along compass `heading_degrees`
    /// (0 = +Y, clockwise towards +X).
    pub fn rotate(&self, range_mm: i32, heading_degrees: i32) -> IVec2 {
        let range = range_mm as i64;
        let scale = TRIG_SCALE as i64;
        IVec2::new(
            (range * self.sin(heading_degrees) as i64 / scale) as i32,
            (range * self.cos(heading_degrees) as i64 / scale) as i32,
        )
    }
}
