//! Post-processing pipeline
//!
//! One run: resolve the output identity, normalize the command stream,
//! annotate compensation, build features, then emit the MPR program, the
//! G-code listing and the report. Everything is held in memory; writing the
//! artifacts is left to the caller.

use chrono::{Local, NaiveDateTime};
use mprkit_core::{
    check_adapter, ArtifactContent, ArtifactKind, ArtifactSet, HostAdapter, PostError, PostJob,
    Result, WorkpieceStock,
};
use mprkit_settings::PostOptions;

use crate::compensation::annotate;
use crate::coordinate_system::{resolve_offset, CoordinateOffset};
use crate::features::{build_features, Feature};
use crate::formatter::CoordinateFormatter;
use crate::gcode::GcodeEmitter;
use crate::identity::{
    confirm_identity, resolve_identity, DirectoryProbe, IdentityResolution, StdFilesystem,
};
use crate::mpr::MprEmitter;
use crate::normalizer::normalize;
use crate::report::{render_report, ReportContext};
use crate::workpiece::infer_stock;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of one run
#[derive(Debug)]
pub struct GenerationOutput {
    /// Validated artifacts in `Mpr`, `Gcode`, `Report` order
    pub artifacts: ArtifactSet,
    /// Output identity with the rules that fired
    pub resolution: IdentityResolution,
    /// Resolved stock block
    pub stock: WorkpieceStock,
    /// MPR coordinate offset
    pub offset: CoordinateOffset,
    /// Features in emission order
    pub features: Vec<Feature>,
    /// Problems recovered from during the run
    pub diagnostics: Vec<PostError>,
}

/// Runs the pipeline with one set of options
#[derive(Debug)]
pub struct PostProcessor<P: DirectoryProbe = StdFilesystem> {
    options: PostOptions,
    probe: P,
}

impl PostProcessor<StdFilesystem> {
    /// Processor resolving directories against the real filesystem
    pub fn new(options: PostOptions) -> Self {
        Self::with_probe(options, StdFilesystem)
    }
}

impl<P: DirectoryProbe> PostProcessor<P> {
    /// Processor with a custom directory probe
    pub fn with_probe(options: PostOptions, probe: P) -> Self {
        Self { options, probe }
    }

    /// Options of this processor
    pub fn options(&self) -> &PostOptions {
        &self.options
    }

    /// Run with the current local time as timestamp
    pub fn run_now(&self, job: &PostJob) -> Result<GenerationOutput> {
        self.run(job, Local::now().naive_local())
    }

    /// Run through a host adapter.
    ///
    /// The host confirms or replaces the resolved identity before anything
    /// is emitted, so all three artifacts describe the confirmed one.
    pub fn run_adapter(
        &self,
        adapter: &dyn HostAdapter,
        generated_at: NaiveDateTime,
    ) -> Result<GenerationOutput> {
        check_adapter(adapter)?;
        let job = adapter.collect_job()?;
        self.validate()?;

        let resolved = self.resolve(&job)?;
        let confirmed = adapter.confirm_identity(resolved.identity.clone());
        let resolution = confirm_identity(resolved, confirmed, &self.probe)?;
        self.generate(&job, resolution, generated_at)
    }

    /// Run the full pipeline for one job
    pub fn run(&self, job: &PostJob, generated_at: NaiveDateTime) -> Result<GenerationOutput> {
        self.validate()?;
        let resolution = self.resolve(job)?;
        self.generate(job, resolution, generated_at)
    }

    fn validate(&self) -> Result<()> {
        self.options
            .validate()
            .map_err(|e| PostError::Config(e.to_string()))
    }

    fn resolve(&self, job: &PostJob) -> Result<IdentityResolution> {
        resolve_identity(&job.naming, self.options.use_part_name, &self.probe)
    }

    fn generate(
        &self,
        job: &PostJob,
        resolution: IdentityResolution,
        generated_at: NaiveDateTime,
    ) -> Result<GenerationOutput> {
        let options = &self.options;
        let stream = normalize(&job.commands);
        let mut diagnostics: Vec<PostError> = stream
            .rejected
            .iter()
            .cloned()
            .map(PostError::from)
            .collect();

        let annotated = annotate(&stream.commands, options.default_tool);
        let features = build_features(&annotated);
        let stock = infer_stock(options, job.stock.as_ref());
        let offset = resolve_offset(options, &job.fixtures, &features);
        let formatter = CoordinateFormatter::from_options(options);
        let timestamp = generated_at.format(TIMESTAMP_FORMAT).to_string();

        let mpr = MprEmitter::new(&formatter, &offset, timestamp.clone())
            .document(&features, &stock)
            .render(options.output_comments);
        let gcode = GcodeEmitter::new(&formatter, timestamp.clone())
            .document(&annotated)
            .render(options.output_comments);

        let report = render_report(&ReportContext {
            generated_at: &timestamp,
            job_name: job.naming.job_name(),
            resolution: &resolution,
            stock: &stock,
            options,
            formatter: &formatter,
            offset: &offset,
            features: &features,
            input_commands: job.commands.len(),
            normalized_commands: stream.commands.len(),
            diagnostics: &diagnostics,
        });

        let artifacts = ArtifactSet::assemble(
            vec![
                (ArtifactKind::Mpr, ArtifactContent::Text(mpr)),
                (ArtifactKind::Gcode, ArtifactContent::Text(gcode)),
                (ArtifactKind::Report, ArtifactContent::Text(report)),
            ],
            features.len(),
            &mut diagnostics,
        )?;

        tracing::info!(
            "Generated {} features from {} commands ({} skipped)",
            features.len(),
            job.commands.len(),
            stream.rejected.len()
        );

        Ok(GenerationOutput {
            artifacts,
            resolution,
            stock,
            offset,
            features,
            diagnostics,
        })
    }
}
