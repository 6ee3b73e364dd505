//! # MPRKit Post
//!
//! Toolpath post-processing pipeline. Turns a host's raw machining commands
//! into a WoodWOP MPR program, a G-code listing of the same operations and a
//! job report, all sharing one resolved output identity.
//!
//! Stages, in order:
//! 1. [`normalizer`]: raw commands to canonical motion commands
//! 2. [`compensation`]: cutter compensation and tool annotation
//! 3. [`features`]: contours, drillings and pockets
//! 4. [`mpr`] and [`gcode`]: serializers sharing one [`CoordinateFormatter`]
//! 5. [`identity`] and [`writer`]: naming and atomic output

pub mod arc_expander;
pub mod compensation;
pub mod coordinate_system;
pub mod document;
pub mod features;
pub mod formatter;
pub mod gcode;
pub mod generator;
pub mod identity;
pub mod mpr;
pub mod normalizer;
pub mod report;
pub mod workpiece;
pub mod writer;

pub use arc_expander::{ArcExpander, ArcExpanderConfig};
pub use compensation::{annotate, AnnotatedCommand, CompensationState, CompensationTracker};
pub use coordinate_system::{resolve_offset, CoordinateOffset};
pub use document::{Document, LineClass};
pub use features::{
    build_features, ContourElement, ContourFeature, DrillingEntity, ElementGeometry, Feature,
    FeatureBuilder, PocketEntity, SegmentKind,
};
pub use formatter::CoordinateFormatter;
pub use gcode::GcodeEmitter;
pub use generator::{GenerationOutput, PostProcessor};
pub use identity::{
    confirm_identity, resolve_base_name, resolve_directory, resolve_identity, DirectoryProbe,
    DirectoryRule, IdentityResolution, NameRule, StdFilesystem,
};
pub use mpr::MprEmitter;
pub use normalizer::{normalize, NormalizedStream, Normalizer};
pub use report::{render_report, ReportContext};
pub use workpiece::infer_stock;
pub use writer::{write_artifacts, write_atomic};
