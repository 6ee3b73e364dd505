//! # MPRKit
//!
//! Post processor that turns machining toolpaths into WoodWOP MPR programs
//! for HOMAG CNC machines, together with a G-code listing of the same
//! operations and a job report.
//!
//! ## Architecture
//!
//! MPRKit is organized as a workspace with multiple crates:
//!
//! 1. **mprkit-core** - Command model, naming and stock snapshots, artifacts, errors
//! 2. **mprkit-settings** - Post-processor options and configuration files
//! 3. **mprkit-post** - Normalization, feature building, emitters, output identity
//! 4. **mprkit** - Logging setup and the command line binary

pub use mprkit_core::{
    ArtifactKind, ArtifactSet, HostAdapter, NamingContext, OutputIdentity, PostError, PostJob,
    ProgramParser, RawCommand, Result, StockGeometry,
};
pub use mprkit_post::{write_artifacts, GenerationOutput, PostProcessor};
pub use mprkit_settings::{default_config_path, PostOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Installs a `tracing` subscriber writing to stderr so the artifacts printed
/// on stdout by `--dry-run` stay clean. `RUST_LOG` is honoured; otherwise the
/// level is INFO, or DEBUG when `verbose` is set.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
