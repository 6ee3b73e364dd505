//! Work coordinate system offset for the MPR program
//!
//! With a `G54`..`G59` system active the MPR coordinates are shifted so the
//! part minimum becomes the origin. The G-code listing is never shifted.

use mprkit_core::{Bounds3, Point3};
use mprkit_settings::PostOptions;

use crate::features::{ContourElement, ElementGeometry, Feature};

/// Offset applied to every MPR coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateOffset {
    /// Active system, if any
    pub system: Option<String>,
    /// Translation added to MPR coordinates
    pub offset: Point3,
}

impl CoordinateOffset {
    /// No system, no translation
    pub fn none() -> Self {
        Self {
            system: None,
            offset: Point3::origin(),
        }
    }

    /// Translate a point
    pub fn apply(&self, p: Point3) -> Point3 {
        p.offset(&self.offset)
    }
}

fn is_work_system(name: &str) -> bool {
    matches!(
        name.trim().to_ascii_uppercase().as_str(),
        "G54" | "G55" | "G56" | "G57" | "G58" | "G59"
    )
}

/// Active work coordinate system: the job's first fixture, else the option
pub fn active_system(options: &PostOptions, fixtures: &[String]) -> Option<String> {
    fixtures
        .iter()
        .find(|f| is_work_system(f))
        .map(|f| f.trim().to_ascii_uppercase())
        .or_else(|| options.coordinate_system.clone())
}

fn grow(bounds: &mut Option<Bounds3>, p: Point3) {
    *bounds = Some(match bounds.take() {
        Some(mut b) => {
            b.include(p);
            b
        }
        None => Bounds3::from_point(p),
    });
}

fn include_elements(bounds: &mut Option<Bounds3>, start: Point3, elements: &[ContourElement]) {
    grow(bounds, start);
    for element in elements {
        if let Some(p) = element.reentry {
            grow(bounds, p);
        }
        grow(bounds, element.geometry.end());
        if let ElementGeometry::Arc { center, radius, .. } = &element.geometry {
            let r = radius.abs();
            grow(bounds, Point3::new(center.x - r, center.y - r, center.z));
        }
    }
}

/// Lowest X, Y and Z reached by any feature
pub fn part_minimum(features: &[Feature]) -> Option<Point3> {
    let mut bounds: Option<Bounds3> = None;
    for feature in features {
        match feature {
            Feature::Contour(c) => include_elements(&mut bounds, c.start, &c.elements),
            Feature::Pocket(p) => include_elements(&mut bounds, p.start, &p.elements),
            Feature::Drilling(d) => grow(&mut bounds, d.position),
        }
    }
    bounds.map(|b| b.min)
}

/// Resolve the MPR offset for a run
pub fn resolve_offset(
    options: &PostOptions,
    fixtures: &[String],
    features: &[Feature],
) -> CoordinateOffset {
    let Some(system) = active_system(options, fixtures) else {
        return CoordinateOffset::none();
    };

    let min = part_minimum(features).unwrap_or_default();
    let offset = Point3::new(-min.x, -min.y, -min.z);
    tracing::info!(
        "{} active: part minimum {}, MPR offset {}",
        system,
        min,
        offset
    );
    CoordinateOffset {
        system: Some(system),
        offset,
    }
}
