//! Coordinate formatter shared by both emitters
//!
//! One instance per run. Both the MPR and G-code emitters format every number
//! through it so the two documents can be diffed value by value.

use mprkit_core::{ArcDirection, Point3};
use mprkit_settings::{AxisSigns, PostOptions};

/// Fixed-precision number formatting with an axis sign convention
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFormatter {
    precision: usize,
    signs: AxisSigns,
}

impl CoordinateFormatter {
    /// Create a formatter
    pub fn new(precision: u32, signs: AxisSigns) -> Self {
        Self {
            precision: precision as usize,
            signs,
        }
    }

    /// Formatter configured from run options
    pub fn from_options(options: &PostOptions) -> Self {
        Self::new(options.precision, options.axis_signs)
    }

    /// Decimal places
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Round half away from zero to the configured precision
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        let rounded = (value * factor).round() / factor;
        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }

    /// Format a plain number (dimension, feed, angle)
    pub fn number(&self, value: f64) -> String {
        format!("{:.*}", self.precision, self.round(value))
    }

    /// Format a value as an integer (spindle speed, tool numbers)
    pub fn integer(&self, value: f64) -> String {
        let rounded = value.round();
        format!("{}", if rounded == 0.0 { 0 } else { rounded as i64 })
    }

    /// Apply the axis sign convention to a point
    pub fn apply(&self, p: Point3) -> Point3 {
        Point3::new(p.x * self.signs.x, p.y * self.signs.y, p.z * self.signs.z)
    }

    /// Arc direction after the sign convention; one mirrored axis flips it
    pub fn direction(&self, direction: ArcDirection) -> ArcDirection {
        if self.signs.x * self.signs.y < 0.0 {
            match direction {
                ArcDirection::Clockwise => ArcDirection::CounterClockwise,
                ArcDirection::CounterClockwise => ArcDirection::Clockwise,
            }
        } else {
            direction
        }
    }
}

impl Default for CoordinateFormatter {
    fn default() -> Self {
        Self::new(3, AxisSigns::default())
    }
}
