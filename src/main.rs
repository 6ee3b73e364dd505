//! MPRKit command line
//!
//! ```bash
//! mprkit job.json --args "--no-comments --precision=2"
//! mprkit program.nc --output-file /tmp/out/panel.mpr --dry-run
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use mprkit::{
    default_config_path, init_logging, write_artifacts, PostJob, PostOptions, PostProcessor,
    ProgramParser, BUILD_DATE, VERSION,
};

#[derive(Parser, Debug)]
#[command(name = "mprkit")]
#[command(about = "Generate WoodWOP MPR programs, G-code listings and job reports")]
#[command(version)]
struct Args {
    /// Job description (.json) or G-code listing
    input: PathBuf,

    /// Post-processor argument string, e.g. "--no-comments --precision=2"
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    args: String,

    /// Options file (.toml or .json); defaults to the user config file if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file hint; its directory and stem take part in naming
    #[arg(short, long)]
    output_file: Option<String>,

    /// Model name used for naming
    #[arg(long)]
    model_name: Option<String>,

    /// Part name used for naming
    #[arg(long)]
    part_name: Option<String>,

    /// Print the artifacts instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(long)]
    log: bool,
}

fn wants_log(args: &str) -> bool {
    args.split_whitespace()
        .any(|a| a.trim_start_matches(['-', '/']).eq_ignore_ascii_case("log"))
}

fn load_options(args: &Args) -> anyhow::Result<PostOptions> {
    let mut options = match &args.config {
        Some(path) => PostOptions::load_from_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => match default_config_path() {
            Ok(path) if path.is_file() => {
                tracing::debug!("Using options file {}", path.display());
                PostOptions::load_from_file(&path)?
            }
            _ => PostOptions::default(),
        },
    };
    options.apply_args(&args.args)?;
    options.verbose |= args.log;
    Ok(options)
}

fn load_job(path: &Path) -> anyhow::Result<PostJob> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return Ok(PostJob::from_json(&text)?);
    }

    let commands = ProgramParser::new().parse_program(&text);
    tracing::info!("Parsed {} commands from {}", commands.len(), path.display());
    let mut job = PostJob::from_commands(commands);
    job.naming.dialog_filename = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    job.naming.document_path = std::path::absolute(path).ok();
    Ok(job)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log || wants_log(&args.args))?;
    tracing::debug!("MPRKit {} (built {})", VERSION, BUILD_DATE);

    let options = load_options(&args)?;
    let mut job = load_job(&args.input)?;
    if let Some(hint) = &args.output_file {
        job.naming.output_file_hint = Some(hint.clone());
    }
    if let Some(model) = &args.model_name {
        job.naming.model_name = Some(model.clone());
    }
    if let Some(part) = &args.part_name {
        job.naming.part_name = Some(part.clone());
    }

    let output = PostProcessor::new(options).run_now(&job)?;
    if !output.diagnostics.is_empty() {
        tracing::warn!(
            "{} problems recovered from; see the job report",
            output.diagnostics.len()
        );
    }

    if args.dry_run {
        for artifact in output.artifacts.iter() {
            let path = output.resolution.identity.path_for(artifact.kind);
            println!("==> {} <==", path.display());
            print!("{}", artifact.content);
        }
        return Ok(());
    }

    let written = write_artifacts(&output.artifacts, &output.resolution.identity)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
