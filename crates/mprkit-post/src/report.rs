//! Plain-text job report
//!
//! Records how the run was resolved: the naming and directory rules that
//! fired, where each stock dimension came from, the active options and every
//! diagnostic recovered from.

use mprkit_core::{ArtifactKind, PostError, WorkpieceStock};
use mprkit_settings::PostOptions;
use std::fmt::Write;

use crate::coordinate_system::CoordinateOffset;
use crate::features::Feature;
use crate::formatter::CoordinateFormatter;
use crate::identity::IdentityResolution;

const RULE_WIDTH: usize = 80;

/// Everything the report describes
#[derive(Debug)]
pub struct ReportContext<'a> {
    /// Timestamp of the run
    pub generated_at: &'a str,
    /// Host job name, if the host supplied one
    pub job_name: Option<&'a str>,
    /// Resolved identity and the rules that fired
    pub resolution: &'a IdentityResolution,
    /// Resolved stock block
    pub stock: &'a WorkpieceStock,
    /// Run options
    pub options: &'a PostOptions,
    /// Formatter of the run, so report numbers match the programs
    pub formatter: &'a CoordinateFormatter,
    /// MPR coordinate offset
    pub offset: &'a CoordinateOffset,
    /// Features in emission order
    pub features: &'a [Feature],
    /// Raw commands received
    pub input_commands: usize,
    /// Commands that survived normalization
    pub normalized_commands: usize,
    /// Recovered problems
    pub diagnostics: &'a [PostError],
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Render the report text
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    let identity = &ctx.resolution.identity;
    let num = |v: f64| ctx.formatter.number(v);

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "MPRKit Job Report");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "Generated: {}", ctx.generated_at);
    let _ = writeln!(out, "Post Processor: WoodWOP MPR {}", env!("CARGO_PKG_VERSION"));
    if let Some(job) = ctx.job_name {
        let _ = writeln!(out, "Job: {}", job);
    }
    let _ = writeln!(out);

    section(&mut out, "OUTPUT");
    let _ = writeln!(out, "Base name: {}", identity.base_name);
    let _ = writeln!(out, "Naming rule: {}", ctx.resolution.name_rule);
    let _ = writeln!(out, "Directory: {}", identity.directory.display());
    let _ = writeln!(out, "Directory rule: {}", ctx.resolution.directory_rule);
    for kind in ArtifactKind::ALL {
        let _ = writeln!(out, "File ({}): {}", kind, identity.path_for(kind).display());
    }
    let _ = writeln!(out);

    section(&mut out, "WORKPIECE");
    for (name, dimension) in ctx.stock.named_dimensions() {
        match dimension.value {
            Some(v) => {
                let _ = writeln!(out, "{}: {} ({})", name, num(v), dimension.source);
            }
            None => {
                let _ = writeln!(out, "{}: - ({})", name, dimension.source);
            }
        }
    }
    let _ = writeln!(
        out,
        "Stock extents: X={}, Y={}",
        num(ctx.stock.extent_x),
        num(ctx.stock.extent_y)
    );
    let _ = writeln!(out);

    section(&mut out, "OPTIONS");
    let options = ctx.options;
    let _ = writeln!(out, "Comments: {}", on_off(options.output_comments));
    let _ = writeln!(out, "Precision: {}", options.precision);
    let _ = writeln!(out, "Use part name: {}", on_off(options.use_part_name));
    let _ = writeln!(out, "Default tool: {}", options.default_tool);
    let _ = writeln!(
        out,
        "Axis signs: X={} Y={} Z={}",
        options.axis_signs.x, options.axis_signs.y, options.axis_signs.z
    );
    let _ = writeln!(out, "Verbose: {}", on_off(options.verbose));
    let _ = writeln!(out);

    section(&mut out, "COORDINATE SYSTEM");
    match &ctx.offset.system {
        Some(system) => {
            let o = ctx.offset.offset;
            let _ = writeln!(
                out,
                "{} (MPR offset: X={}, Y={}, Z={})",
                system,
                num(o.x),
                num(o.y),
                num(o.z)
            );
        }
        None => {
            let _ = writeln!(out, "none");
        }
    }
    let _ = writeln!(out);

    section(&mut out, "FEATURES");
    let _ = writeln!(
        out,
        "Commands: {} received, {} used, {} skipped",
        ctx.input_commands,
        ctx.normalized_commands,
        ctx.input_commands.saturating_sub(ctx.normalized_commands)
    );
    let _ = writeln!(out, "Features: {}", ctx.features.len());
    for (index, feature) in ctx.features.iter().enumerate() {
        let _ = write!(out, "  [{}] {} T{}", index + 1, feature.kind_name(), feature.tool());
        match feature {
            Feature::Contour(c) => {
                let _ = write!(
                    out,
                    " contour {}: {} lines, {} arcs, compensation {}",
                    c.id,
                    c.line_count(),
                    c.arc_count(),
                    c.compensation
                );
            }
            Feature::Drilling(d) => {
                let _ = write!(
                    out,
                    " at ({}, {}) depth {} {}",
                    num(d.position.x),
                    num(d.position.y),
                    num(d.depth),
                    d.cycle.gcode()
                );
            }
            Feature::Pocket(p) => {
                let _ = write!(
                    out,
                    " contour {}: {} elements, depth {}",
                    p.id,
                    p.elements.len(),
                    num(p.depth)
                );
            }
        }
        if let Some(label) = feature.label() {
            let _ = write!(out, " [{}]", label);
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out);

    section(&mut out, "DIAGNOSTICS");
    if ctx.diagnostics.is_empty() {
        let _ = writeln!(out, "none");
    }
    for diagnostic in ctx.diagnostics {
        let _ = writeln!(out, "{}", diagnostic);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "End of Report");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DirectoryRule, NameRule};
    use mprkit_core::{CommandError, Dimension, OutputIdentity, Point3};

    #[test]
    fn test_dimension_sources_and_rules() {
        let resolution = IdentityResolution {
            identity: OutputIdentity::new("door", "/tmp/out"),
            name_rule: NameRule::PartName,
            directory_rule: DirectoryRule::CurrentDirectory,
        };
        let stock = WorkpieceStock {
            length: Dimension::configured(600.0),
            width: Dimension::inferred(400.0),
            thickness: Dimension::omitted(),
            extent_x: 0.0,
            extent_y: 0.0,
        };
        let diagnostics = vec![PostError::from(CommandError::unrecognized(3, "G17"))];
        let ctx = ReportContext {
            generated_at: "2026-01-01 00:00:00",
            job_name: Some("Kitchen"),
            resolution: &resolution,
            stock: &stock,
            options: &PostOptions::default(),
            formatter: &CoordinateFormatter::from_options(&PostOptions::default()),
            offset: &CoordinateOffset::none(),
            features: &[],
            input_commands: 4,
            normalized_commands: 3,
            diagnostics: &diagnostics,
        };
        let text = render_report(&ctx);

        assert!(text.contains("length: 600.000 (configured)"));
        assert!(text.contains("width: 400.000 (inferred)"));
        assert!(text.contains("thickness: - (omitted)"));
        assert!(text.contains("Job: Kitchen\n"));
        assert!(text.contains("Naming rule: part name"));
        assert!(text.contains("Directory rule: current working directory"));
        assert!(text.contains("Commands: 4 received, 3 used, 1 skipped"));
        assert!(text.contains("G17"));
        assert!(text.trim_end().ends_with(&"=".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_numbers_follow_run_precision() {
        let resolution = IdentityResolution {
            identity: OutputIdentity::new("door", "/tmp/out"),
            name_rule: NameRule::PartName,
            directory_rule: DirectoryRule::CurrentDirectory,
        };
        let stock = WorkpieceStock {
            length: Dimension::inferred(812.46),
            width: Dimension::omitted(),
            thickness: Dimension::omitted(),
            extent_x: 0.0,
            extent_y: 0.0,
        };
        let options = PostOptions::from_args("--precision=1 --g54").unwrap();
        let offset = CoordinateOffset {
            system: Some("G54".to_string()),
            offset: Point3::new(-100.25, 0.0, 9.0),
        };
        let ctx = ReportContext {
            generated_at: "2026-01-01 00:00:00",
            job_name: None,
            resolution: &resolution,
            stock: &stock,
            options: &options,
            formatter: &CoordinateFormatter::from_options(&options),
            offset: &offset,
            features: &[],
            input_commands: 0,
            normalized_commands: 0,
            diagnostics: &[],
        };
        let text = render_report(&ctx);

        assert!(text.contains("length: 812.5 (inferred)"));
        assert!(text.contains("Stock extents: X=0.0, Y=0.0"));
        assert!(text.contains("G54 (MPR offset: X=-100.3, Y=0.0, Z=9.0)"));
        assert!(!text.contains("Job:"));
    }
}
