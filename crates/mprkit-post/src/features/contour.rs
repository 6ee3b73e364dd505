//! Contour features: chained line and arc elements

use mprkit_core::{ArcDirection, MotionCommand, Point3};
use serde::{Deserialize, Serialize};

use crate::arc_expander::ArcExpander;
use crate::compensation::{AnnotatedCommand, CompensationState};

/// Motion kind of a run of elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Straight segments (helices expand into these)
    Line,
    /// Planar arcs
    Arc,
}

/// Geometry of one contour element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementGeometry {
    /// Straight segment to `end`
    Line {
        /// Endpoint
        end: Point3,
    },
    /// Planar arc to `end`
    Arc {
        /// Endpoint
        end: Point3,
        /// Absolute centre
        center: Point3,
        /// Radius, negative when sweeping more than 180 degrees
        radius: f64,
        /// Turning direction
        direction: ArcDirection,
    },
}

impl ElementGeometry {
    /// Endpoint of the element
    pub fn end(&self) -> Point3 {
        match self {
            Self::Line { end } | Self::Arc { end, .. } => *end,
        }
    }

    /// Motion kind of the element
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Line { .. } => SegmentKind::Line,
            Self::Arc { .. } => SegmentKind::Arc,
        }
    }
}

/// One element with the compensation state it was cut under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourElement {
    /// Geometry
    pub geometry: ElementGeometry,
    /// Compensation snapshot
    pub compensation: CompensationState,
    /// Point the tool rapids to before cutting this element, when the cut
    /// does not continue from the previous element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentry: Option<Point3>,
}

/// Split a cutting command into contour geometry.
///
/// Returns `None` for zero-length lines. Helical arcs come back as a run of
/// line segments.
pub fn segment_geometry(
    cmd: &AnnotatedCommand,
    expander: &ArcExpander,
) -> Option<(SegmentKind, Vec<ElementGeometry>)> {
    match &cmd.command {
        MotionCommand::Line { end, .. } => {
            if end.approx_eq(&cmd.start) {
                tracing::debug!("#{} zero-length line dropped", cmd.source_index);
                None
            } else {
                Some((SegmentKind::Line, vec![ElementGeometry::Line { end: *end }]))
            }
        }
        MotionCommand::Arc {
            end,
            center,
            radius,
            direction,
            ..
        } => {
            if (end.z - cmd.start.z).abs() > mprkit_core::POSITION_TOLERANCE {
                let points = expander.expand(cmd.start, *end, *center, *direction);
                tracing::debug!(
                    "#{} helix expanded into {} line segments",
                    cmd.source_index,
                    points.len()
                );
                Some((
                    SegmentKind::Line,
                    points
                        .into_iter()
                        .map(|end| ElementGeometry::Line { end })
                        .collect(),
                ))
            } else {
                Some((
                    SegmentKind::Arc,
                    vec![ElementGeometry::Arc {
                        end: *end,
                        center: Point3::new(center.x, center.y, end.z),
                        radius: *radius,
                        direction: *direction,
                    }],
                ))
            }
        }
        _ => None,
    }
}

/// A chained run of elements sharing motion kind, compensation and tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourFeature {
    /// Contour number (`]N` block)
    pub id: u32,
    /// Tool position where the run starts
    pub start: Point3,
    /// Elements in machining order
    pub elements: Vec<ContourElement>,
    /// Compensation state of the run
    pub compensation: CompensationState,
    /// Tool cutting the run
    pub tool: u32,
    /// Feed at the start of the run
    pub feed: Option<f64>,
    /// Operation label, if tagged
    pub label: Option<String>,
    /// Motion kind of every element
    pub kind: SegmentKind,
    #[serde(skip)]
    pub(crate) operation_id: Option<String>,
}

impl ContourFeature {
    /// Open a feature starting at `cmd`'s start position
    pub(crate) fn open(id: u32, cmd: &AnnotatedCommand, kind: SegmentKind) -> Self {
        let feed = match &cmd.command {
            MotionCommand::Line { feed, .. } | MotionCommand::Arc { feed, .. } => *feed,
            _ => None,
        };
        Self {
            id,
            start: cmd.start,
            elements: Vec::new(),
            compensation: cmd.compensation,
            tool: cmd.tool,
            feed,
            label: cmd.operation.as_ref().map(|t| t.display_label().to_string()),
            kind,
            operation_id: cmd.operation.as_ref().map(|t| t.id.clone()),
        }
    }

    /// Whether `cmd` of the given kind continues this run
    pub(crate) fn accepts(&self, cmd: &AnnotatedCommand, kind: SegmentKind) -> bool {
        self.kind == kind
            && self.compensation == cmd.compensation
            && self.tool == cmd.tool
            && self.operation_id.as_deref() == cmd.operation.as_ref().map(|t| t.id.as_str())
    }

    /// Append geometry under the feature's compensation state
    pub(crate) fn extend(&mut self, geometry: Vec<ElementGeometry>) {
        let compensation = self.compensation;
        self.elements.extend(
            geometry
                .into_iter()
                .map(|geometry| ContourElement {
                    geometry,
                    compensation,
                    reentry: None,
                }),
        );
    }

    /// Number of line elements
    pub fn line_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.geometry.kind() == SegmentKind::Line)
            .count()
    }

    /// Number of arc elements
    pub fn arc_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.geometry.kind() == SegmentKind::Arc)
            .count()
    }
}
