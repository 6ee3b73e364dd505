//! G-code listing emitter
//!
//! Replays the annotated stream as plain G-code so the MPR program can be
//! checked against a familiar format. Coordinates go through the shared
//! formatter but are never shifted by the work coordinate offset.

use mprkit_core::{DrillCycle, DrillCycleKind, MotionCommand, Point3, SpindleDirection};

use crate::compensation::{AnnotatedCommand, CompensationState};
use crate::document::Document;
use crate::formatter::CoordinateFormatter;

/// G-code serializer for one run
#[derive(Debug)]
pub struct GcodeEmitter<'a> {
    formatter: &'a CoordinateFormatter,
    generated_at: String,
}

/// Modal values already written to the listing
#[derive(Debug, Default)]
struct ModalState {
    feed: Option<f64>,
    operation: Option<String>,
    in_drill_cycle: bool,
}

impl<'a> GcodeEmitter<'a> {
    /// Create an emitter; `generated_at` is the timestamp written to the header
    pub fn new(formatter: &'a CoordinateFormatter, generated_at: impl Into<String>) -> Self {
        Self {
            formatter,
            generated_at: generated_at.into(),
        }
    }

    fn xyz(&self, p: Point3) -> String {
        let p = self.formatter.apply(p);
        format!(
            "X{} Y{} Z{}",
            self.formatter.number(p.x),
            self.formatter.number(p.y),
            self.formatter.number(p.z)
        )
    }

    fn feed_word(&self, feed: Option<f64>, modal: &mut ModalState) -> String {
        match feed {
            Some(f) if modal.feed != Some(f) => {
                modal.feed = Some(f);
                format!(" F{}", self.formatter.number(f))
            }
            _ => String::new(),
        }
    }

    /// Build the full listing
    pub fn document(&self, commands: &[AnnotatedCommand]) -> Document {
        let mut doc = Document::new();
        doc.comment(format!("(Generated by MPRKit {})", env!("CARGO_PKG_VERSION")));
        doc.comment(format!("(Date: {})", self.generated_at));
        doc.entity("G21");
        doc.entity("G90");
        doc.entity("G40");

        let mut modal = ModalState::default();
        for cmd in commands {
            let is_drill = matches!(cmd.command, MotionCommand::DrillCycle(_));
            if modal.in_drill_cycle && !is_drill {
                doc.entity("G80");
                modal.in_drill_cycle = false;
            }

            self.operation_change(&mut doc, cmd, &mut modal);
            self.command(&mut doc, cmd, &mut modal);
        }

        if modal.in_drill_cycle {
            doc.entity("G80");
        }
        if modal.operation.is_some() {
            doc.comment("(End operation)");
        }
        doc.entity("M2");
        doc
    }

    fn operation_change(&self, doc: &mut Document, cmd: &AnnotatedCommand, modal: &mut ModalState) {
        let id = cmd.operation.as_ref().map(|t| t.id.clone());
        if id == modal.operation {
            return;
        }
        if modal.operation.is_some() {
            doc.comment("(End operation)");
        }
        if let Some(tag) = &cmd.operation {
            doc.comment(format!(
                "(Operation: {})",
                tag.display_label().replace(['(', ')'], "")
            ));
        }
        modal.operation = id;
    }

    fn command(&self, doc: &mut Document, cmd: &AnnotatedCommand, modal: &mut ModalState) {
        match &cmd.command {
            MotionCommand::Rapid { end } => {
                doc.entity(format!("G0 {}", self.xyz(*end)));
            }
            MotionCommand::Line { end, feed } => {
                let f = self.feed_word(*feed, modal);
                doc.entity(format!("G1 {}{}", self.xyz(*end), f));
            }
            MotionCommand::Arc {
                end,
                center,
                direction,
                feed,
                ..
            } => {
                let start = self.formatter.apply(cmd.start);
                let c = self.formatter.apply(*center);
                let word = self.formatter.direction(*direction).gcode();
                let f = self.feed_word(*feed, modal);
                doc.entity(format!(
                    "{} {} I{} J{}{}",
                    word,
                    self.xyz(*end),
                    self.formatter.number(c.x - start.x),
                    self.formatter.number(c.y - start.y),
                    f
                ));
            }
            MotionCommand::DrillCycle(cycle) => {
                doc.entity(self.drill_line(cycle));
                modal.in_drill_cycle = true;
            }
            MotionCommand::SpindleState { direction, speed } => {
                let word = match direction {
                    SpindleDirection::Clockwise => "M3",
                    SpindleDirection::CounterClockwise => "M4",
                    SpindleDirection::Off => "M5",
                };
                match speed {
                    Some(s) if *direction != SpindleDirection::Off => {
                        doc.entity(format!("{} S{}", word, self.formatter.integer(*s)))
                    }
                    _ => doc.entity(word),
                }
            }
            MotionCommand::ToolChange { number } => {
                doc.entity(format!("T{} M6", number));
            }
            MotionCommand::CompensationDirective { .. } => match cmd.compensation {
                CompensationState::Off => doc.entity("G40"),
                CompensationState::Left(d) => doc.entity(format!("G41 D{}", d)),
                CompensationState::Right(d) => doc.entity(format!("G42 D{}", d)),
            },
        }
    }

    fn drill_line(&self, cycle: &DrillCycle) -> String {
        let mut line = format!("{} {}", cycle.kind.gcode(), self.xyz(cycle.position));
        if let Some(r) = cycle.retract {
            let r = self.formatter.apply(Point3::new(0.0, 0.0, r)).z;
            line.push_str(&format!(" R{}", self.formatter.number(r)));
        }
        if cycle.kind == DrillCycleKind::Dwell || cycle.dwell > 0.0 {
            line.push_str(&format!(" P{}", self.formatter.number(cycle.dwell)));
        }
        if let Some(q) = cycle.peck {
            line.push_str(&format!(" Q{}", self.formatter.number(q)));
        }
        line
    }
}
