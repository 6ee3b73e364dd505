//! Command normalizer
//!
//! Turns the host's raw command list into [`NormalizedCommand`]s while
//! tracking modal position, feed and spindle speed. Each raw command either
//! produces exactly one normalized command or one [`CommandError`]; nothing is
//! merged, reordered or deduplicated.

use mprkit_core::{
    ArcDirection, CommandError, CompensationKind, DrillCycle, DrillCycleKind, MotionCommand,
    NormalizedCommand, Point3, RawCommand, SpindleDirection, POSITION_TOLERANCE,
};

use crate::arc_expander::{center_from_radius, sweep_angle};

/// Outcome of normalizing one command stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedStream {
    /// Canonical commands in input order
    pub commands: Vec<NormalizedCommand>,
    /// One entry per raw command that was skipped
    pub rejected: Vec<CommandError>,
}

impl NormalizedStream {
    /// Total number of raw commands accounted for
    pub fn accounted(&self) -> usize {
        self.commands.len() + self.rejected.len()
    }
}

/// Setup words that are expected in host output and carry no information for
/// the generator. They are still rejected, only logged more quietly.
const SETUP_WORDS: &[(char, u32)] = &[
    ('G', 17),
    ('G', 21),
    ('G', 90),
    ('G', 54),
    ('G', 55),
    ('G', 56),
    ('G', 57),
    ('G', 58),
    ('G', 59),
    ('G', 80),
    ('G', 94),
    ('G', 98),
    ('G', 99),
    ('M', 2),
    ('M', 30),
];

/// Modal state carried between commands
#[derive(Debug, Clone)]
pub struct Normalizer {
    position: Point3,
    feed: Option<f64>,
    spindle_speed: Option<f64>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a normalizer positioned at the origin
    pub fn new() -> Self {
        Self {
            position: Point3::origin(),
            feed: None,
            spindle_speed: None,
        }
    }

    /// Current modal position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Normalize a whole command list
    pub fn normalize(&mut self, raw: &[RawCommand]) -> NormalizedStream {
        let mut stream = NormalizedStream::default();

        for (index, cmd) in raw.iter().enumerate() {
            match self.normalize_one(index, cmd) {
                Ok(command) => {
                    tracing::debug!("#{} {} -> {}", index, cmd, command.kind_name());
                    self.position = command.position_after(self.position);
                    stream.commands.push(NormalizedCommand {
                        source_index: index,
                        command,
                        operation: cmd.operation.clone(),
                    });
                }
                Err(err) => {
                    match &err {
                        CommandError::Unrecognized { .. } if is_setup_word(cmd) => {
                            tracing::debug!("Skipping setup word: {}", err)
                        }
                        _ => tracing::warn!("Skipping command: {}", err),
                    }
                    stream.rejected.push(err);
                }
            }
        }

        tracing::debug!(
            "Normalized {} commands, rejected {}",
            stream.commands.len(),
            stream.rejected.len()
        );
        stream
    }

    /// Normalize a single command against the current modal state
    pub fn normalize_one(
        &mut self,
        index: usize,
        cmd: &RawCommand,
    ) -> Result<MotionCommand, CommandError> {
        for (letter, value) in &cmd.params {
            if !value.is_finite() {
                return Err(CommandError::malformed(
                    index,
                    &cmd.name,
                    format!("parameter {} is not a finite number", letter),
                ));
            }
        }

        let name = cmd.name.trim();
        if name.starts_with(['T', 't']) {
            return tool_from_word(index, name);
        }

        let word = cmd
            .word()
            .ok_or_else(|| CommandError::unrecognized(index, &cmd.name))?;

        let previous_feed = self.feed;
        if let Some(f) = cmd.param('F') {
            if f <= 0.0 {
                return Err(CommandError::malformed(index, &cmd.name, "feed must be positive"));
            }
            self.feed = Some(f);
        }

        let result = self.dispatch(index, cmd, word);
        if result.is_err() {
            self.feed = previous_feed;
        }
        result
    }

    fn dispatch(
        &mut self,
        index: usize,
        cmd: &RawCommand,
        word: (char, u32),
    ) -> Result<MotionCommand, CommandError> {
        match word {
            ('G', 0) => Ok(MotionCommand::Rapid {
                end: self.target(cmd),
            }),
            ('G', 1) => Ok(MotionCommand::Line {
                end: self.target(cmd),
                feed: self.feed,
            }),
            ('G', 2) => self.arc(index, cmd, ArcDirection::Clockwise),
            ('G', 3) => self.arc(index, cmd, ArcDirection::CounterClockwise),
            ('G', 40) => Ok(MotionCommand::CompensationDirective {
                kind: CompensationKind::Off,
                corrector: None,
            }),
            ('G', 41) => self.compensation(index, cmd, CompensationKind::Left),
            ('G', 42) => self.compensation(index, cmd, CompensationKind::Right),
            ('G', 81) => self.drill(index, cmd, DrillCycleKind::Simple),
            ('G', 82) => self.drill(index, cmd, DrillCycleKind::Dwell),
            ('G', 83) => self.drill(index, cmd, DrillCycleKind::Peck),
            ('M', 3) => Ok(self.spindle(cmd, SpindleDirection::Clockwise)),
            ('M', 4) => Ok(self.spindle(cmd, SpindleDirection::CounterClockwise)),
            ('M', 5) => Ok(MotionCommand::SpindleState {
                direction: SpindleDirection::Off,
                speed: None,
            }),
            ('M', 6) => match cmd.param('T') {
                Some(t) => tool_number(index, &cmd.name, t)
                    .map(|number| MotionCommand::ToolChange { number }),
                None => Err(CommandError::unrecognized(index, &cmd.name)),
            },
            _ => Err(CommandError::unrecognized(index, &cmd.name)),
        }
    }

    fn target(&self, cmd: &RawCommand) -> Point3 {
        Point3::new(
            cmd.param('X').unwrap_or(self.position.x),
            cmd.param('Y').unwrap_or(self.position.y),
            cmd.param('Z').unwrap_or(self.position.z),
        )
    }

    fn arc(
        &self,
        index: usize,
        cmd: &RawCommand,
        direction: ArcDirection,
    ) -> Result<MotionCommand, CommandError> {
        let start = self.position;
        let end = self.target(cmd);

        let (center, abs_radius) = match (cmd.param('I'), cmd.param('J'), cmd.param('R')) {
            (None, None, Some(r)) => {
                if r.abs() < POSITION_TOLERANCE {
                    return Err(CommandError::malformed(index, &cmd.name, "zero arc radius"));
                }
                let center = center_from_radius(start, end, r, direction).ok_or_else(|| {
                    CommandError::malformed(
                        index,
                        &cmd.name,
                        format!(
                            "radius {} cannot reach from {} to {}",
                            r.abs(),
                            start,
                            end
                        ),
                    )
                })?;
                (center, r.abs())
            }
            (None, None, None) => {
                return Err(CommandError::malformed(
                    index,
                    &cmd.name,
                    "arc needs I/J offsets or R",
                ))
            }
            (i, j, _) => {
                let center = Point3::new(
                    start.x + i.unwrap_or(0.0),
                    start.y + j.unwrap_or(0.0),
                    start.z,
                );
                let radius = start.distance_xy(&center);
                if radius < POSITION_TOLERANCE {
                    return Err(CommandError::malformed(index, &cmd.name, "zero arc radius"));
                }
                (center, radius)
            }
        };

        let sweep = sweep_angle(start, end, center, direction);
        let radius = if sweep.abs() > std::f64::consts::PI + 1e-9 {
            -abs_radius
        } else {
            abs_radius
        };

        Ok(MotionCommand::Arc {
            end,
            center,
            radius,
            direction,
            feed: self.feed,
        })
    }

    fn compensation(
        &self,
        index: usize,
        cmd: &RawCommand,
        kind: CompensationKind,
    ) -> Result<MotionCommand, CommandError> {
        let corrector = match cmd.param('D') {
            Some(d) => Some(non_negative_integer(d).ok_or_else(|| {
                CommandError::malformed(index, &cmd.name, format!("invalid corrector D{}", d))
            })?),
            None => None,
        };
        Ok(MotionCommand::CompensationDirective { kind, corrector })
    }

    fn drill(
        &self,
        index: usize,
        cmd: &RawCommand,
        kind: DrillCycleKind,
    ) -> Result<MotionCommand, CommandError> {
        let bottom = cmd.param('Z').ok_or_else(|| {
            CommandError::malformed(index, &cmd.name, "drill cycle needs a Z bottom")
        })?;
        let dwell = cmd.param('P').unwrap_or(0.0);
        if dwell < 0.0 {
            return Err(CommandError::malformed(index, &cmd.name, "negative dwell"));
        }
        let peck = cmd.param('Q');
        if peck.is_some_and(|q| q <= 0.0) {
            return Err(CommandError::malformed(index, &cmd.name, "peck increment must be positive"));
        }

        Ok(MotionCommand::DrillCycle(DrillCycle {
            position: Point3::new(
                cmd.param('X').unwrap_or(self.position.x),
                cmd.param('Y').unwrap_or(self.position.y),
                bottom,
            ),
            retract: cmd.param('R'),
            dwell,
            peck,
            kind,
        }))
    }

    fn spindle(&mut self, cmd: &RawCommand, direction: SpindleDirection) -> MotionCommand {
        if let Some(s) = cmd.param('S') {
            self.spindle_speed = Some(s);
        }
        MotionCommand::SpindleState {
            direction,
            speed: self.spindle_speed,
        }
    }
}

fn non_negative_integer(value: f64) -> Option<u32> {
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

fn tool_number(index: usize, name: &str, value: f64) -> Result<u32, CommandError> {
    non_negative_integer(value)
        .ok_or_else(|| CommandError::malformed(index, name, format!("invalid tool number {}", value)))
}

fn tool_from_word(index: usize, name: &str) -> Result<MotionCommand, CommandError> {
    let digits = &name[1..];
    match digits.parse::<u32>() {
        Ok(number) => Ok(MotionCommand::ToolChange { number }),
        Err(_) => Err(CommandError::malformed(
            index,
            name,
            format!("invalid tool number '{}'", digits),
        )),
    }
}

fn is_setup_word(cmd: &RawCommand) -> bool {
    cmd.word().is_some_and(|w| SETUP_WORDS.contains(&w))
}

/// Normalize a command list with a fresh modal state
pub fn normalize(raw: &[RawCommand]) -> NormalizedStream {
    Normalizer::new().normalize(raw)
}
