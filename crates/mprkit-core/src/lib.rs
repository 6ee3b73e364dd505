//! # MPRKit Core
//!
//! Core types shared by the MPRKit post processor.
//! Provides the command model on both sides of normalization, the naming
//! and stock snapshots supplied by the host, the artifact result type and
//! the error taxonomy.

pub mod artifact;
pub mod command;
pub mod data;
pub mod error;
pub mod job;
pub mod naming;
pub mod stock;

pub use artifact::{ArtifactContent, ArtifactKind, ArtifactSet, OutputArtifact};

pub use command::{
    ArcDirection, CompensationKind, DrillCycle, DrillCycleKind, MotionCommand, NormalizedCommand,
    OperationKind, OperationTag, ProgramParser, RawCommand, SpindleDirection,
};

pub use data::{Bounds3, Point3, POSITION_TOLERANCE};

pub use error::{CommandError, PostError, Result};

pub use job::{check_adapter, HostAdapter, PostJob, HOST_API_VERSION};

pub use naming::{NamingContext, OutputIdentity};

pub use stock::{Dimension, DimensionSource, StockGeometry, WorkpieceStock};
