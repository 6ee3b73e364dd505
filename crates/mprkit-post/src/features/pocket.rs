//! Pocket entities built from host-tagged command groups
//!
//! Rapids inside a group add no element. The cutting move that follows one
//! carries the rapid's end as its re-entry point, so the boundary never
//! gains a segment the tool did not cut.

use mprkit_core::{OperationTag, Point3};
use serde::{Deserialize, Serialize};

use super::contour::{ContourElement, ElementGeometry};
use crate::compensation::AnnotatedCommand;

/// A pocket-clearing operation with its boundary and depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketEntity {
    /// Contour number of the boundary (`]N` block)
    pub id: u32,
    /// Start of the first cutting move
    pub start: Point3,
    /// Cutting moves of the group in order
    pub elements: Vec<ContourElement>,
    /// Deepest cutting Z
    pub bottom: f64,
    /// Pocket depth as a positive magnitude
    pub depth: f64,
    /// Tool number
    pub tool: u32,
    /// Operation label
    pub label: Option<String>,
}

/// Commands collected for one pocket until a boundary is reached
#[derive(Debug, Clone)]
pub(crate) struct PocketGroup {
    pub(crate) tag: OperationTag,
    tool: u32,
    start: Option<Point3>,
    elements: Vec<ContourElement>,
    bottom: f64,
}

impl PocketGroup {
    pub(crate) fn open(tag: OperationTag, tool: u32) -> Self {
        Self {
            tag,
            tool,
            start: None,
            elements: Vec::new(),
            bottom: f64::INFINITY,
        }
    }

    /// Add the cutting geometry of `cmd`
    pub(crate) fn push(&mut self, cmd: &AnnotatedCommand, geometry: Vec<ElementGeometry>) {
        if self.start.is_none() {
            self.start = Some(cmd.start);
        }
        let mut reentry = self
            .elements
            .last()
            .filter(|last| !last.geometry.end().approx_eq(&cmd.start))
            .map(|_| cmd.start);
        for g in geometry {
            self.bottom = self.bottom.min(g.end().z);
            self.elements.push(ContourElement {
                geometry: g,
                compensation: cmd.compensation,
                reentry: reentry.take(),
            });
        }
    }

    /// Finish the group; `None` when it had no cutting moves
    pub(crate) fn finish(self, id: u32) -> Option<PocketEntity> {
        let start = self.start?;
        if self.elements.is_empty() {
            return None;
        }
        Some(PocketEntity {
            id,
            start,
            elements: self.elements,
            bottom: self.bottom,
            depth: self.bottom.abs(),
            tool: self.tool,
            label: Some(self.tag.display_label().to_string()),
        })
    }
}
