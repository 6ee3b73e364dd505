//! Feature builders
//!
//! Partition the annotated command stream into the ordered feature list that
//! forms the MPR body:
//! - contours: maximal runs of lines or arcs sharing compensation and tool
//! - drillings: one per drill cycle
//! - pockets: contiguous commands carrying the same pocket tag

pub mod contour;
pub mod drilling;
pub mod pocket;

pub use contour::{ContourElement, ContourFeature, ElementGeometry, SegmentKind};
pub use drilling::DrillingEntity;
pub use pocket::PocketEntity;

use mprkit_core::MotionCommand;
use serde::{Deserialize, Serialize};

use crate::arc_expander::ArcExpander;
use crate::compensation::AnnotatedCommand;
use contour::segment_geometry;
use pocket::PocketGroup;

/// One entry of the MPR body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// Contour milling
    Contour(ContourFeature),
    /// Vertical drilling
    Drilling(DrillingEntity),
    /// Pocket clearing
    Pocket(PocketEntity),
}

impl Feature {
    /// Short name for logs and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Feature::Contour(_) => "contour",
            Feature::Drilling(_) => "drilling",
            Feature::Pocket(_) => "pocket",
        }
    }

    /// Contour number for features with a geometry block
    pub fn contour_id(&self) -> Option<u32> {
        match self {
            Feature::Contour(c) => Some(c.id),
            Feature::Pocket(p) => Some(p.id),
            Feature::Drilling(_) => None,
        }
    }

    /// Tool cutting the feature
    pub fn tool(&self) -> u32 {
        match self {
            Feature::Contour(c) => c.tool,
            Feature::Drilling(d) => d.tool,
            Feature::Pocket(p) => p.tool,
        }
    }

    /// Operation label, if tagged
    pub fn label(&self) -> Option<&str> {
        match self {
            Feature::Contour(c) => c.label.as_deref(),
            Feature::Drilling(d) => d.label.as_deref(),
            Feature::Pocket(p) => p.label.as_deref(),
        }
    }
}

/// Single-pass feature builder
#[derive(Debug)]
pub struct FeatureBuilder {
    expander: ArcExpander,
    next_id: u32,
    features: Vec<Feature>,
    contour: Option<ContourFeature>,
    pocket: Option<PocketGroup>,
    last_index: Option<usize>,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(ArcExpander::default())
    }
}

impl FeatureBuilder {
    /// Create a builder; contour ids start at 1
    pub fn new(expander: ArcExpander) -> Self {
        Self {
            expander,
            next_id: 1,
            features: Vec::new(),
            contour: None,
            pocket: None,
            last_index: None,
        }
    }

    /// Consume one annotated command
    pub fn push(&mut self, cmd: &AnnotatedCommand) {
        let contiguous = self
            .last_index
            .is_none_or(|last| cmd.source_index == last + 1);
        let pocket_tag = cmd.operation.as_ref().filter(|t| t.is_pocket());
        let ends_groups = matches!(
            cmd.command,
            MotionCommand::ToolChange { .. } | MotionCommand::DrillCycle(_)
        );

        if let Some(group) = &self.pocket {
            let same_tag = pocket_tag.is_some_and(|t| t.id == group.tag.id);
            if !same_tag || !contiguous || ends_groups {
                tracing::debug!("#{} closes pocket group {}", cmd.source_index, group.tag.id);
                self.close_pocket();
            }
        }

        if let (Some(tag), false) = (pocket_tag, ends_groups) {
            self.close_contour();
            let group = self
                .pocket
                .get_or_insert_with(|| PocketGroup::open(tag.clone(), cmd.tool));
            if let Some((_, geometry)) = segment_geometry(cmd, &self.expander) {
                group.push(cmd, geometry);
            }
            self.last_index = Some(cmd.source_index);
            return;
        }

        match &cmd.command {
            MotionCommand::ToolChange { .. } => self.close_contour(),
            MotionCommand::DrillCycle(cycle) => {
                self.close_contour();
                self.features
                    .push(Feature::Drilling(DrillingEntity::from_cycle(cycle, cmd)));
            }
            MotionCommand::Rapid { .. } => self.close_contour(),
            MotionCommand::Line { .. } | MotionCommand::Arc { .. } => self.push_cutting(cmd),
            MotionCommand::SpindleState { .. } | MotionCommand::CompensationDirective { .. } => {}
        }

        self.last_index = Some(cmd.source_index);
    }

    fn push_cutting(&mut self, cmd: &AnnotatedCommand) {
        let Some((kind, geometry)) = segment_geometry(cmd, &self.expander) else {
            return;
        };

        if self.contour.as_ref().is_some_and(|c| !c.accepts(cmd, kind)) {
            self.close_contour();
        }

        if self.contour.is_none() {
            let id = self.next_id;
            self.next_id += 1;
            self.contour = Some(ContourFeature::open(id, cmd, kind));
        }
        if let Some(contour) = self.contour.as_mut() {
            contour.extend(geometry);
        }
    }

    fn close_contour(&mut self) {
        if let Some(contour) = self.contour.take() {
            tracing::debug!(
                "Contour {} closed with {} elements ({})",
                contour.id,
                contour.elements.len(),
                contour.compensation
            );
            self.features.push(Feature::Contour(contour));
        }
    }

    fn close_pocket(&mut self) {
        if let Some(group) = self.pocket.take() {
            let label = group.tag.id.clone();
            match group.finish(self.next_id) {
                Some(entity) => {
                    self.next_id += 1;
                    self.features.push(Feature::Pocket(entity));
                }
                None => tracing::debug!("Pocket group {} had no cutting moves", label),
            }
        }
    }

    /// Close open features and return the ordered list
    pub fn finish(mut self) -> Vec<Feature> {
        self.close_contour();
        self.close_pocket();
        self.features
    }
}

/// Build the feature list for an annotated stream
pub fn build_features(commands: &[AnnotatedCommand]) -> Vec<Feature> {
    let mut builder = FeatureBuilder::default();
    for cmd in commands {
        builder.push(cmd);
    }
    builder.finish()
}
