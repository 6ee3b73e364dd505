//! Cutter radius compensation state machine
//!
//! Walks the normalized stream and annotates every command with the
//! compensation state and active tool in force at its position.

use mprkit_core::{CompensationKind, MotionCommand, NormalizedCommand, OperationTag, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compensation mode with its corrector register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompensationState {
    /// No compensation (G40)
    #[default]
    Off,
    /// Tool left of the path (G41)
    Left(u32),
    /// Tool right of the path (G42)
    Right(u32),
}

impl CompensationState {
    /// Corrector register, if compensation is active
    pub fn corrector(&self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Left(d) | Self::Right(d) => Some(*d),
        }
    }

    /// WoodWOP `RK` value
    pub fn mpr_code(&self) -> &'static str {
        match self {
            Self::Off => "NOWRK",
            Self::Left(_) => "WRKL",
            Self::Right(_) => "WRKR",
        }
    }
}

impl fmt::Display for CompensationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Left(d) => write!(f, "left D{}", d),
            Self::Right(d) => write!(f, "right D{}", d),
        }
    }
}

/// A normalized command with the machine state in force at its position
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedCommand {
    /// Index of the originating raw command
    pub source_index: usize,
    /// The canonical command
    pub command: MotionCommand,
    /// Operation tag from the host
    pub operation: Option<OperationTag>,
    /// Compensation state; a directive carries the state it establishes
    pub compensation: CompensationState,
    /// Active tool; a tool change carries the tool it selects
    pub tool: u32,
    /// Tool position before this command
    pub start: Point3,
}

/// Tracks compensation mode and the active tool
#[derive(Debug, Clone)]
pub struct CompensationTracker {
    state: CompensationState,
    active_tool: u32,
    position: Point3,
}

impl CompensationTracker {
    /// Start with compensation off and the given default tool
    pub fn new(default_tool: u32) -> Self {
        Self {
            state: CompensationState::Off,
            active_tool: default_tool,
            position: Point3::origin(),
        }
    }

    /// Current state
    pub fn state(&self) -> CompensationState {
        self.state
    }

    /// Current tool
    pub fn active_tool(&self) -> u32 {
        self.active_tool
    }

    /// Consume one command and return its annotation
    pub fn step(&mut self, cmd: &NormalizedCommand) -> AnnotatedCommand {
        match &cmd.command {
            MotionCommand::ToolChange { number } => {
                self.active_tool = *number;
            }
            MotionCommand::CompensationDirective { kind, corrector } => {
                let register = corrector.unwrap_or(self.active_tool);
                let next = match kind {
                    CompensationKind::Off => CompensationState::Off,
                    CompensationKind::Left => CompensationState::Left(register),
                    CompensationKind::Right => CompensationState::Right(register),
                };
                if next != self.state {
                    tracing::debug!(
                        "#{} compensation {} -> {}",
                        cmd.source_index,
                        self.state,
                        next
                    );
                }
                self.state = next;
            }
            _ => {}
        }

        let start = self.position;
        self.position = cmd.command.position_after(start);

        AnnotatedCommand {
            source_index: cmd.source_index,
            command: cmd.command.clone(),
            operation: cmd.operation.clone(),
            compensation: self.state,
            tool: self.active_tool,
            start,
        }
    }
}

/// Annotate a whole normalized stream
pub fn annotate(commands: &[NormalizedCommand], default_tool: u32) -> Vec<AnnotatedCommand> {
    let mut tracker = CompensationTracker::new(default_tool);
    commands.iter().map(|c| tracker.step(c)).collect()
}
