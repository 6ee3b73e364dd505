//! Drilling entities

use mprkit_core::{DrillCycle, DrillCycleKind, Point3};
use serde::{Deserialize, Serialize};

use crate::compensation::AnnotatedCommand;

/// One vertical drilling operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillingEntity {
    /// Hole position; `z` is the bottom
    pub position: Point3,
    /// Drilling depth as a positive magnitude
    pub depth: f64,
    /// Retract plane, if given
    pub retract: Option<f64>,
    /// Dwell at the bottom (seconds), zero when absent
    pub dwell: f64,
    /// Peck increment
    pub peck: Option<f64>,
    /// Cycle variant
    pub cycle: DrillCycleKind,
    /// Tool number
    pub tool: u32,
    /// Operation label, if tagged
    pub label: Option<String>,
}

impl DrillingEntity {
    /// Map a drill cycle command 1:1 to an entity
    pub fn from_cycle(cycle: &DrillCycle, cmd: &AnnotatedCommand) -> Self {
        Self {
            position: cycle.position,
            depth: cycle.depth(),
            retract: cycle.retract,
            dwell: cycle.dwell,
            peck: cycle.peck,
            cycle: cycle.kind,
            tool: cmd.tool,
            label: cmd.operation.as_ref().map(|t| t.display_label().to_string()),
        }
    }

    /// Hole bottom Z
    pub fn bottom(&self) -> f64 {
        self.position.z
    }
}
