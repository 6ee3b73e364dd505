//! Command types on both sides of the normalizer
//!
//! [`RawCommand`] is what the host hands over: a command word plus loosely
//! typed parameter words. [`MotionCommand`] is the canonical, fully resolved
//! form every later stage works on.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::data::Point3;

/// Kind of machining operation a command belongs to, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Profile or contour milling
    Profile,
    /// Pocket clearing
    Pocket,
    /// Drilling
    Drilling,
    /// Anything else (facing, engraving, ...)
    Other,
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "profile" | "contour" => Ok(Self::Profile),
            "pocket" => Ok(Self::Pocket),
            "drilling" | "drill" => Ok(Self::Drilling),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown operation kind: {}", s)),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Pocket => write!(f, "pocket"),
            Self::Drilling => write!(f, "drilling"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Operation membership tag supplied by the host for a command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationTag {
    /// Identifier that is equal for all commands of one operation
    pub id: String,
    /// Operation kind
    pub kind: OperationKind,
    /// Human readable label, used in comments
    #[serde(default)]
    pub label: Option<String>,
}

impl OperationTag {
    /// Create a tag whose label equals its id
    pub fn new(id: impl Into<String>, kind: OperationKind) -> Self {
        let id = id.into();
        Self {
            label: Some(id.clone()),
            id,
            kind,
        }
    }

    /// Label for comments, falling back to the id
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Whether the tag marks a pocket-clearing operation
    pub fn is_pocket(&self) -> bool {
        self.kind == OperationKind::Pocket
    }
}

/// A command as received from the host, before any validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    /// Command word, e.g. `G1`, `G02`, `G41`, `M3`, `T5`
    pub name: String,
    /// Parameter words keyed by their letter
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    /// Operation this command belongs to, if the host knows
    #[serde(default)]
    pub operation: Option<OperationTag>,
}

impl RawCommand {
    /// Create a command with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
            operation: None,
        }
    }

    /// Builder-style parameter setter
    pub fn with(mut self, letter: char, value: f64) -> Self {
        self.params
            .insert(letter.to_ascii_uppercase().to_string(), value);
        self
    }

    /// Builder-style operation tag setter
    pub fn tagged(mut self, tag: OperationTag) -> Self {
        self.operation = Some(tag);
        self
    }

    /// Look up a parameter word, case-insensitively
    pub fn param(&self, letter: char) -> Option<f64> {
        let upper = letter.to_ascii_uppercase().to_string();
        self.params.get(&upper).copied().or_else(|| {
            self.params
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&upper))
                .map(|(_, v)| *v)
        })
    }

    /// Split the command word into its letter and numeric code.
    ///
    /// `G01` and `g1` both give `('G', 1)`; `G41.1` gives `('G', 41)`.
    pub fn word(&self) -> Option<(char, u32)> {
        let trimmed = self.name.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let rest: &str = chars.as_str();
        let integer = rest.split('.').next()?;
        if integer.is_empty() || !integer.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        integer.parse::<u32>().ok().map(|code| (letter, code))
    }
}

impl fmt::Display for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in &self.params {
            write!(f, " {}{}", k, v)?;
        }
        Ok(())
    }
}

/// Parser for G-code style text listings into [`RawCommand`]s
///
/// Recognizes `(operation <kind> <label>)` comments as operation tags for the
/// following commands and `(end operation)` to clear the tag. Other comments
/// are discarded. A line starting with an axis word repeats the last motion
/// word, as modal G-code does.
#[derive(Debug, Default)]
pub struct ProgramParser {
    current_tag: Option<OperationTag>,
    last_motion: Option<String>,
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z])\s*([-+]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    })
}

fn operation_regex() -> &'static Regex {
    static OPERATION_REGEX: OnceLock<Regex> = OnceLock::new();
    OPERATION_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\(\s*operation\s+(\w+)\s+([^)]*?)\s*\)$").expect("invalid regex pattern")
    })
}

fn end_operation_regex() -> &'static Regex {
    static END_REGEX: OnceLock<Regex> = OnceLock::new();
    END_REGEX
        .get_or_init(|| Regex::new(r"(?i)^\(\s*end\s+operation\s*\)$").expect("invalid regex pattern"))
}

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)|;.*").expect("invalid regex pattern"))
}

impl ProgramParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole listing
    pub fn parse_program(&mut self, text: &str) -> Vec<RawCommand> {
        text.lines().flat_map(|line| self.parse_line(line)).collect()
    }

    /// Parse a single line; a line may hold several command words
    pub fn parse_line(&mut self, line: &str) -> Vec<RawCommand> {
        let trimmed = line.trim();
        if let Some(caps) = operation_regex().captures(trimmed) {
            match caps[1].parse::<OperationKind>() {
                Ok(kind) => {
                    let label = caps[2].trim();
                    self.current_tag = Some(OperationTag::new(label, kind));
                }
                Err(e) => tracing::warn!("Ignoring operation marker: {}", e),
            }
            return Vec::new();
        }
        if end_operation_regex().is_match(trimmed) {
            self.current_tag = None;
            return Vec::new();
        }

        let cleaned = comment_regex().replace_all(trimmed, "");
        let mut commands: Vec<RawCommand> = Vec::new();

        for caps in word_regex().captures_iter(&cleaned) {
            let letter = caps[1].to_ascii_uppercase();
            let text = &caps[2];
            let starts_command = match letter.as_str() {
                "G" | "M" | "N" => true,
                "T" => commands.is_empty(),
                _ => false,
            };

            if letter == "N" {
                // Block numbers carry no meaning for the generator
                continue;
            }

            if starts_command {
                let name = format!("{}{}", letter, text);
                if let Some(tool) = pending_tool(&commands, &name) {
                    // "T5 M6" is one tool change
                    if let Some(last) = commands.last_mut() {
                        *last = RawCommand::new(name).with('T', tool);
                        last.operation = self.current_tag.clone();
                    }
                    continue;
                }
                if letter == "G" && is_motion_word(&name) {
                    self.last_motion = Some(name.clone());
                }
                let mut cmd = RawCommand::new(name);
                cmd.operation = self.current_tag.clone();
                commands.push(cmd);
                continue;
            }

            let value: f64 = match text.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };

            if commands.is_empty() {
                let name = self
                    .last_motion
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", letter, text));
                let mut cmd = RawCommand::new(name);
                cmd.operation = self.current_tag.clone();
                commands.push(cmd);
                if self.last_motion.is_none() {
                    continue;
                }
            }

            if let Some(cmd) = commands.last_mut() {
                cmd.params.insert(letter, value);
            }
        }

        commands
    }
}

/// Tool number of a bare `T` command that an `M6` word completes
fn pending_tool(commands: &[RawCommand], name: &str) -> Option<f64> {
    if RawCommand::new(name).word() != Some(('M', 6)) {
        return None;
    }
    let last = commands.last()?;
    if !last.params.is_empty() {
        return None;
    }
    match last.word() {
        Some(('T', number)) => Some(number as f64),
        _ => None,
    }
}

fn is_motion_word(name: &str) -> bool {
    let cmd = RawCommand::new(name);
    matches!(cmd.word(), Some(('G', 0..=3)) | Some(('G', 81..=83)))
}

/// Arc direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcDirection {
    /// Clockwise (G2)
    Clockwise,
    /// Counter-clockwise (G3)
    CounterClockwise,
}

impl ArcDirection {
    /// Whether the arc turns clockwise
    pub fn is_clockwise(&self) -> bool {
        matches!(self, Self::Clockwise)
    }

    /// G-code motion word
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Clockwise => "G2",
            Self::CounterClockwise => "G3",
        }
    }
}

impl fmt::Display for ArcDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clockwise => write!(f, "CW"),
            Self::CounterClockwise => write!(f, "CCW"),
        }
    }
}

/// Cutter radius compensation directive kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompensationKind {
    /// G40
    Off,
    /// G41
    Left,
    /// G42
    Right,
}

/// Spindle rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpindleDirection {
    /// M3
    Clockwise,
    /// M4
    CounterClockwise,
    /// M5
    Off,
}

/// Canned drilling cycle variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrillCycleKind {
    /// G81 simple drilling
    Simple,
    /// G82 drilling with dwell
    Dwell,
    /// G83 peck drilling
    Peck,
}

impl DrillCycleKind {
    /// G-code word for the cycle
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Simple => "G81",
            Self::Dwell => "G82",
            Self::Peck => "G83",
        }
    }
}

/// Parameters of one drilling cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillCycle {
    /// Hole position; `z` is the hole bottom
    pub position: Point3,
    /// Retract plane (R word), if given
    pub retract: Option<f64>,
    /// Dwell at the bottom in seconds
    pub dwell: f64,
    /// Peck increment (Q word)
    pub peck: Option<f64>,
    /// Cycle variant
    pub kind: DrillCycleKind,
}

impl DrillCycle {
    /// Drilling depth as a positive magnitude.
    ///
    /// Measured from the retract plane when one is set, otherwise from Z0.
    pub fn depth(&self) -> f64 {
        match self.retract {
            Some(r) if r != 0.0 => (self.position.z - r).abs(),
            _ => self.position.z.abs(),
        }
    }
}

/// Canonical command produced by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Cutting move in a straight line
    Line {
        /// Absolute endpoint
        end: Point3,
        /// Active feed rate (mm/min)
        feed: Option<f64>,
    },
    /// Cutting move along a circular arc in the XY plane
    Arc {
        /// Absolute endpoint
        end: Point3,
        /// Absolute centre
        center: Point3,
        /// Radius; negative when the arc sweeps more than 180 degrees
        radius: f64,
        /// Turning direction
        direction: ArcDirection,
        /// Active feed rate (mm/min)
        feed: Option<f64>,
    },
    /// Non-cutting positioning move
    Rapid {
        /// Absolute endpoint
        end: Point3,
    },
    /// Canned drilling cycle
    DrillCycle(DrillCycle),
    /// Spindle state change
    SpindleState {
        /// Rotation
        direction: SpindleDirection,
        /// Speed (RPM), if known
        speed: Option<f64>,
    },
    /// Tool change
    ToolChange {
        /// Tool number
        number: u32,
    },
    /// Cutter radius compensation directive
    CompensationDirective {
        /// Requested mode
        kind: CompensationKind,
        /// Explicit corrector register (D word)
        corrector: Option<u32>,
    },
}

impl MotionCommand {
    /// Whether this is a cutting move (line or arc)
    pub fn is_cutting(&self) -> bool {
        matches!(self, Self::Line { .. } | Self::Arc { .. })
    }

    /// Endpoint for commands that move the tool
    pub fn endpoint(&self) -> Option<Point3> {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } | Self::Rapid { end } => Some(*end),
            Self::DrillCycle(cycle) => Some(cycle.position),
            _ => None,
        }
    }

    /// Tool position once this command has executed.
    ///
    /// Drill cycles leave the tool above the hole at the retract plane, or at
    /// the previous height when no retract plane is given.
    pub fn position_after(&self, previous: Point3) -> Point3 {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } | Self::Rapid { end } => *end,
            Self::DrillCycle(cycle) => Point3::new(
                cycle.position.x,
                cycle.position.y,
                cycle.retract.unwrap_or(previous.z),
            ),
            _ => previous,
        }
    }

    /// Short name for logs and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Arc { .. } => "arc",
            Self::Rapid { .. } => "rapid",
            Self::DrillCycle(_) => "drill",
            Self::SpindleState { .. } => "spindle",
            Self::ToolChange { .. } => "tool-change",
            Self::CompensationDirective { .. } => "compensation",
        }
    }
}

/// A normalized command together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCommand {
    /// Index of the originating raw command
    pub source_index: usize,
    /// The canonical command
    pub command: MotionCommand,
    /// Operation tag carried over from the raw command
    pub operation: Option<OperationTag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_parsing() {
        assert_eq!(RawCommand::new("G01").word(), Some(('G', 1)));
        assert_eq!(RawCommand::new("g2").word(), Some(('G', 2)));
        assert_eq!(RawCommand::new("G41.1").word(), Some(('G', 41)));
        assert_eq!(RawCommand::new("T12").word(), Some(('T', 12)));
        assert_eq!(RawCommand::new("(comment)").word(), None);
        assert_eq!(RawCommand::new("G").word(), None);
    }

    #[test]
    fn test_param_lookup_is_case_insensitive() {
        let mut cmd = RawCommand::new("G1").with('x', 5.0);
        cmd.params.insert("y".to_string(), 7.0);
        assert_eq!(cmd.param('X'), Some(5.0));
        assert_eq!(cmd.param('Y'), Some(7.0));
        assert_eq!(cmd.param('Z'), None);
    }

    #[test]
    fn test_parse_line_multiple_words() {
        let mut parser = ProgramParser::new();
        let cmds = parser.parse_line("N10 G90 G0 X1 Y2.5 ; go");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].name, "G90");
        assert!(cmds[0].params.is_empty());
        assert_eq!(cmds[1].name, "G0");
        assert_eq!(cmds[1].param('X'), Some(1.0));
        assert_eq!(cmds[1].param('Y'), Some(2.5));
    }

    #[test]
    fn test_parse_tool_change_forms() {
        let mut parser = ProgramParser::new();
        let cmds = parser.parse_line("M6 T5");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name, "M6");
        assert_eq!(cmds[0].param('T'), Some(5.0));

        let cmds = parser.parse_line("T7");
        assert_eq!(cmds[0].name, "T7");

        let cmds = parser.parse_line("T3 M6");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name, "M6");
        assert_eq!(cmds[0].param('T'), Some(3.0));
    }

    #[test]
    fn test_parse_modal_motion_continuation() {
        let mut parser = ProgramParser::new();
        parser.parse_line("G1 X0 Y0 F500");
        let cmds = parser.parse_line("X10 Y-2");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name, "G1");
        assert_eq!(cmds[0].param('Y'), Some(-2.0));
    }

    #[test]
    fn test_parse_operation_markers() {
        let program = "(operation pocket Pocket001)\nG1 X1 Y1\n(end operation)\nG1 X2 Y2\n";
        let cmds = ProgramParser::new().parse_program(program);
        assert_eq!(cmds.len(), 2);
        let tag = cmds[0].operation.as_ref().expect("tag");
        assert_eq!(tag.kind, OperationKind::Pocket);
        assert_eq!(tag.id, "Pocket001");
        assert!(cmds[1].operation.is_none());
    }

    #[test]
    fn test_position_after() {
        let prev = Point3::new(1.0, 2.0, 5.0);
        let rapid = MotionCommand::Rapid {
            end: Point3::new(4.0, 4.0, 5.0),
        };
        assert_eq!(rapid.position_after(prev), Point3::new(4.0, 4.0, 5.0));

        let drill = MotionCommand::DrillCycle(DrillCycle {
            position: Point3::new(10.0, 20.0, -8.0),
            retract: Some(2.0),
            dwell: 0.0,
            peck: None,
            kind: DrillCycleKind::Simple,
        });
        assert_eq!(drill.position_after(prev), Point3::new(10.0, 20.0, 2.0));

        let tool = MotionCommand::ToolChange { number: 3 };
        assert_eq!(tool.position_after(prev), prev);
    }

    #[test]
    fn test_drill_depth() {
        let mut cycle = DrillCycle {
            position: Point3::new(10.0, 10.0, -12.0),
            retract: Some(3.0),
            dwell: 0.0,
            peck: None,
            kind: DrillCycleKind::Simple,
        };
        assert_eq!(cycle.depth(), 15.0);
        cycle.retract = None;
        assert_eq!(cycle.depth(), 12.0);
    }
}
