//! Arc geometry helpers
//!
//! Sweep angles, centre reconstruction from an `R` word, and expansion of
//! helical arcs into line segments for formats that cannot express them.

use mprkit_core::{ArcDirection, Point3, POSITION_TOLERANCE};
use std::f64::consts::PI;

/// Signed sweep angle (radians) from `start` to `end` around `center`.
///
/// Negative for clockwise arcs. Coincident endpoints describe a full circle.
pub fn sweep_angle(start: Point3, end: Point3, center: Point3, direction: ArcDirection) -> f64 {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);

    let mut angle_delta = end_angle - start_angle;
    if direction.is_clockwise() && angle_delta > -1e-9 {
        angle_delta -= 2.0 * PI;
    } else if !direction.is_clockwise() && angle_delta < 1e-9 {
        angle_delta += 2.0 * PI;
    }
    angle_delta
}

/// Centre of the arc through `start` and `end` with radius word `r`.
///
/// A negative `r` selects the solution sweeping more than 180 degrees.
/// Returns `None` when the endpoints coincide or `|r|` is shorter than half
/// the chord.
pub fn center_from_radius(
    start: Point3,
    end: Point3,
    r: f64,
    direction: ArcDirection,
) -> Option<Point3> {
    let chord = start.distance_xy(&end);
    let half = chord / 2.0;
    let radius = r.abs();
    if chord < POSITION_TOLERANCE || radius + POSITION_TOLERANCE < half {
        return None;
    }

    let h = (radius * radius - half * half).max(0.0).sqrt();
    let ux = (end.x - start.x) / chord;
    let uy = (end.y - start.y) / chord;
    let mid_x = (start.x + end.x) / 2.0;
    let mid_y = (start.y + end.y) / 2.0;

    let mut side = if direction.is_clockwise() { -1.0 } else { 1.0 };
    if r < 0.0 {
        side = -side;
    }

    Some(Point3::new(
        mid_x - side * h * uy,
        mid_y + side * h * ux,
        start.z,
    ))
}

/// Helix expansion configuration
#[derive(Debug, Clone)]
pub struct ArcExpanderConfig {
    /// Largest sweep covered by one segment (degrees)
    pub max_step_degrees: f64,
    /// Lower bound on the number of segments
    pub min_segments: usize,
}

impl Default for ArcExpanderConfig {
    fn default() -> Self {
        Self {
            max_step_degrees: 5.0,
            min_segments: 8,
        }
    }
}

/// Converts helical arcs to line segments
#[derive(Debug)]
pub struct ArcExpander {
    config: ArcExpanderConfig,
}

impl ArcExpander {
    /// Create a new arc expander
    pub fn new(config: ArcExpanderConfig) -> Self {
        Self { config }
    }

    /// Number of segments used for a given sweep
    pub fn segment_count(&self, sweep: f64) -> usize {
        let steps = sweep.abs().to_degrees() / self.config.max_step_degrees;
        let by_angle = (steps - 1e-9).ceil().max(0.0) as usize;
        by_angle.max(self.config.min_segments)
    }

    /// Expand an arc into segment endpoints, interpolating Z linearly.
    ///
    /// The last point is exactly `end`.
    pub fn expand(
        &self,
        start: Point3,
        end: Point3,
        center: Point3,
        direction: ArcDirection,
    ) -> Vec<Point3> {
        let radius = start.distance_xy(&center);
        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let angle_delta = sweep_angle(start, end, center, direction);
        let num_segments = self.segment_count(angle_delta);

        let mut points = Vec::with_capacity(num_segments);
        for i in 1..num_segments {
            let fraction = i as f64 / num_segments as f64;
            let angle = start_angle + angle_delta * fraction;
            points.push(Point3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                start.z + (end.z - start.z) * fraction,
            ));
        }
        points.push(end);
        points
    }
}

impl Default for ArcExpander {
    fn default() -> Self {
        Self::new(ArcExpanderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_sweep_quarter_circles() {
        let c = Point3::origin();
        let s = Point3::new(10.0, 0.0, 0.0);
        let e = Point3::new(0.0, 10.0, 0.0);
        assert!((sweep_angle(s, e, c, ArcDirection::CounterClockwise) - PI / 2.0).abs() < EPS);
        assert!((sweep_angle(s, e, c, ArcDirection::Clockwise) + 1.5 * PI).abs() < EPS);
    }

    #[test]
    fn test_sweep_full_circle() {
        let c = Point3::origin();
        let s = Point3::new(5.0, 0.0, 0.0);
        assert!((sweep_angle(s, s, c, ArcDirection::Clockwise) + 2.0 * PI).abs() < EPS);
        assert!((sweep_angle(s, s, c, ArcDirection::CounterClockwise) - 2.0 * PI).abs() < EPS);
    }

    #[test]
    fn test_center_from_radius_short_and_long() {
        let s = Point3::new(0.0, 0.0, 0.0);
        let e = Point3::new(10.0, 0.0, 0.0);

        // half circle: centre on the chord midpoint either way
        let c = center_from_radius(s, e, 5.0, ArcDirection::Clockwise).unwrap();
        assert!(c.approx_eq(&Point3::new(5.0, 0.0, 0.0)));

        let short_ccw = center_from_radius(s, e, 10.0, ArcDirection::CounterClockwise).unwrap();
        assert!(short_ccw.y > 0.0);
        let sweep = sweep_angle(s, e, short_ccw, ArcDirection::CounterClockwise);
        assert!(sweep > 0.0 && sweep < PI);

        let long_ccw = center_from_radius(s, e, -10.0, ArcDirection::CounterClockwise).unwrap();
        assert!(long_ccw.y < 0.0);
        let sweep = sweep_angle(s, e, long_ccw, ArcDirection::CounterClockwise);
        assert!(sweep > PI);

        let short_cw = center_from_radius(s, e, 10.0, ArcDirection::Clockwise).unwrap();
        assert!(short_cw.y < 0.0);
        let sweep = sweep_angle(s, e, short_cw, ArcDirection::Clockwise);
        assert!(sweep < 0.0 && sweep > -PI);
    }

    #[test]
    fn test_center_from_radius_rejects_impossible() {
        let s = Point3::origin();
        let e = Point3::new(10.0, 0.0, 0.0);
        assert!(center_from_radius(s, e, 4.0, ArcDirection::Clockwise).is_none());
        assert!(center_from_radius(s, s, 4.0, ArcDirection::Clockwise).is_none());
    }

    #[test]
    fn test_expand_helix() {
        let expander = ArcExpander::default();
        let s = Point3::new(10.0, 0.0, 0.0);
        let e = Point3::new(-10.0, 0.0, -4.0);
        let points = expander.expand(s, e, Point3::origin(), ArcDirection::CounterClockwise);

        // 180 degrees at 5 degrees per step
        assert_eq!(points.len(), 36);
        assert_eq!(*points.last().unwrap(), e);
        for p in &points {
            assert!((p.distance_xy(&Point3::origin()) - 10.0).abs() < 1e-6);
        }
        assert!((points[17].z + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_expand_small_sweep_uses_minimum() {
        let expander = ArcExpander::default();
        let s = Point3::new(10.0, 0.0, 0.0);
        let angle: f64 = 10f64.to_radians();
        let e = Point3::new(10.0 * angle.cos(), 10.0 * angle.sin(), -1.0);
        let points = expander.expand(s, e, Point3::origin(), ArcDirection::CounterClockwise);
        assert_eq!(points.len(), 8);
    }
}
