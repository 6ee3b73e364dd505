//! Output identity resolution
//!
//! Picks one base name and one directory per run. Naming is a pure priority
//! list over the [`NamingContext`]; directory resolution consults the
//! filesystem through [`DirectoryProbe`] and never yields the root.

use mprkit_core::{NamingContext, OutputIdentity, PostError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Base name used when no other source is available
pub const FALLBACK_BASE_NAME: &str = "export";

const MODEL_PREFIX: &str = "Model-";

/// Which naming rule produced the base name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameRule {
    /// Stem of an output hint that carries a directory
    HintWithDirectory,
    /// Model name without its `Model-` prefix
    ModelName,
    /// Part name
    PartName,
    /// Stem of a bare output hint
    BareHint,
    /// Name typed into the export dialog
    DialogFilename,
    /// Literal fallback
    Fallback,
    /// Name supplied by the host when confirming the output
    HostConfirmed,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::HintWithDirectory => "output file hint with directory",
            Self::ModelName => "model name",
            Self::PartName => "part name",
            Self::BareHint => "bare output file hint",
            Self::DialogFilename => "dialog file name",
            Self::Fallback => "fallback",
            Self::HostConfirmed => "confirmed by host",
        };
        write!(f, "{}", text)
    }
}

/// Which directory rule produced the target directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DirectoryRule {
    /// Directory embedded in the output hint
    HintDirectory,
    /// Directory of the host document
    DocumentDirectory,
    /// Current working directory
    CurrentDirectory,
    /// Directory supplied by the host when confirming the output
    HostConfirmed,
}

impl fmt::Display for DirectoryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::HintDirectory => "output file hint directory",
            Self::DocumentDirectory => "document directory",
            Self::CurrentDirectory => "current working directory",
            Self::HostConfirmed => "confirmed by host",
        };
        write!(f, "{}", text)
    }
}

/// Filesystem queries needed by directory resolution
pub trait DirectoryProbe {
    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Current working directory, if it can be determined
    fn current_dir(&self) -> Option<PathBuf>;
}

/// [`DirectoryProbe`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl DirectoryProbe for StdFilesystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }
}

/// Resolved identity plus the rules that fired, for the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolution {
    /// Base name and directory
    pub identity: OutputIdentity,
    /// Naming rule that fired
    pub name_rule: NameRule,
    /// Directory rule that fired
    pub directory_rule: DirectoryRule,
}

fn is_root(path: &Path) -> bool {
    path.has_root() && path.parent().is_none()
}

/// Directory component of an output hint, if it has a usable one
fn hint_directory(hint: &str) -> Option<&Path> {
    Path::new(hint)
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && *p != Path::new(".") && !is_root(p))
}

fn hint_stem(hint: &str) -> Option<&str> {
    Path::new(hint)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Replace path separators and characters invalid in file names with `_`
pub fn sanitize_base_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn usable(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Pick the base name. Pure and total: always returns a non-empty name.
pub fn resolve_base_name(naming: &NamingContext, use_part_name: bool) -> (String, NameRule) {
    let hint = naming.output_file_hint();
    let model = naming
        .model_name()
        .map(|m| m.strip_prefix(MODEL_PREFIX).unwrap_or(m))
        .and_then(usable);
    let part = naming.part_name().and_then(usable);

    let (second, third) = if use_part_name {
        ((part, NameRule::PartName), (model, NameRule::ModelName))
    } else {
        ((model, NameRule::ModelName), (part, NameRule::PartName))
    };

    let candidates = [
        (
            hint.filter(|h| hint_directory(h).is_some())
                .and_then(hint_stem),
            NameRule::HintWithDirectory,
        ),
        second,
        third,
        (hint.and_then(hint_stem), NameRule::BareHint),
        (naming.dialog_filename().and_then(usable), NameRule::DialogFilename),
    ];

    for (candidate, rule) in candidates {
        if let Some(name) = candidate.and_then(usable) {
            let base = sanitize_base_name(name);
            tracing::debug!("Base name '{}' from {}", base, rule);
            return (base, rule);
        }
    }

    tracing::debug!("No naming source available, using '{}'", FALLBACK_BASE_NAME);
    (FALLBACK_BASE_NAME.to_string(), NameRule::Fallback)
}

/// Pick the target directory.
///
/// Tries the hint directory, the document directory and the current
/// directory in that order. Relative candidates are joined to the current
/// directory. Root and non-existent candidates fall through.
pub fn resolve_directory(
    naming: &NamingContext,
    probe: &dyn DirectoryProbe,
) -> Result<(PathBuf, DirectoryRule)> {
    let cwd = probe.current_dir();
    let absolute = |p: &Path| -> Option<PathBuf> {
        if p.is_absolute() {
            Some(p.to_path_buf())
        } else {
            cwd.as_ref().map(|c| c.join(p))
        }
    };

    let candidates = [
        (
            naming
                .output_file_hint()
                .and_then(hint_directory)
                .and_then(|d| absolute(d)),
            DirectoryRule::HintDirectory,
        ),
        (
            naming.document_dir().and_then(|d| absolute(d)),
            DirectoryRule::DocumentDirectory,
        ),
        (cwd.clone(), DirectoryRule::CurrentDirectory),
    ];

    let mut rejected = Vec::new();
    for (candidate, rule) in candidates {
        let Some(dir) = candidate else {
            continue;
        };
        if is_root(&dir) {
            tracing::warn!("Skipping {} {}: filesystem root", rule, dir.display());
            rejected.push(format!("{} {} is the filesystem root", rule, dir.display()));
            continue;
        }
        if !probe.is_dir(&dir) {
            tracing::warn!("Skipping {} {}: not a directory", rule, dir.display());
            rejected.push(format!("{} {} is not a directory", rule, dir.display()));
            continue;
        }
        tracing::debug!("Output directory {} from {}", dir.display(), rule);
        return Ok((dir, rule));
    }

    let reason = if rejected.is_empty() {
        "no candidate directory available".to_string()
    } else {
        rejected.join("; ")
    };
    Err(PostError::UnresolvableDirectory { reason })
}

/// Resolve the full identity for a run
pub fn resolve_identity(
    naming: &NamingContext,
    use_part_name: bool,
    probe: &dyn DirectoryProbe,
) -> Result<IdentityResolution> {
    let (base_name, name_rule) = resolve_base_name(naming, use_part_name);
    let (directory, directory_rule) = resolve_directory(naming, probe)?;
    tracing::info!(
        "Output identity: {} in {} ({}, {})",
        base_name,
        directory.display(),
        name_rule,
        directory_rule
    );
    Ok(IdentityResolution {
        identity: OutputIdentity::new(base_name, directory),
        name_rule,
        directory_rule,
    })
}

/// Apply the identity a host confirmed on top of the resolved one.
///
/// The confirmed base name is sanitized and must stay usable. The confirmed
/// directory goes through the same checks as a resolved one.
pub fn confirm_identity(
    resolved: IdentityResolution,
    confirmed: OutputIdentity,
    probe: &dyn DirectoryProbe,
) -> Result<IdentityResolution> {
    if confirmed == resolved.identity {
        return Ok(resolved);
    }

    let base_name = sanitize_base_name(&confirmed.base_name);
    if usable(&base_name).is_none() {
        return Err(PostError::other(format!(
            "Host confirmed an unusable base name '{}'",
            confirmed.base_name
        )));
    }

    let directory = if confirmed.directory.is_absolute() {
        confirmed.directory
    } else {
        match probe.current_dir() {
            Some(cwd) => cwd.join(&confirmed.directory),
            None => confirmed.directory,
        }
    };
    if is_root(&directory) {
        return Err(PostError::UnresolvableDirectory {
            reason: format!("host confirmed the filesystem root {}", directory.display()),
        });
    }
    if !probe.is_dir(&directory) {
        return Err(PostError::UnresolvableDirectory {
            reason: format!("host confirmed {} which is not a directory", directory.display()),
        });
    }

    let name_rule = if base_name == resolved.identity.base_name {
        resolved.name_rule
    } else {
        NameRule::HostConfirmed
    };
    let directory_rule = if directory == resolved.identity.directory {
        resolved.directory_rule
    } else {
        DirectoryRule::HostConfirmed
    };
    tracing::info!(
        "Host replaced output identity {} with {} in {}",
        resolved.identity.base_name,
        base_name,
        directory.display()
    );
    Ok(IdentityResolution {
        identity: OutputIdentity::new(base_name, directory),
        name_rule,
        directory_rule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct FakeFs {
        dirs: HashSet<PathBuf>,
        cwd: Option<PathBuf>,
    }

    impl FakeFs {
        fn new(dirs: &[&str], cwd: Option<&str>) -> Self {
            Self {
                dirs: dirs.iter().map(PathBuf::from).collect(),
                cwd: cwd.map(PathBuf::from),
            }
        }
    }

    impl DirectoryProbe for FakeFs {
        fn is_dir(&self, path: &Path) -> bool {
            path == Path::new("/") || self.dirs.contains(path)
        }

        fn current_dir(&self) -> Option<PathBuf> {
            self.cwd.clone()
        }
    }

    fn naming(hint: Option<&str>, model: Option<&str>) -> NamingContext {
        NamingContext {
            output_file_hint: hint.map(String::from),
            model_name: model.map(String::from),
            document_path: Some(PathBuf::from("/home/user/projects/cabinet.FCStd")),
            ..Default::default()
        }
    }

    #[test]
    fn test_hint_with_directory_wins() {
        let fs = FakeFs::new(&["/tmp/foo", "/home/user/projects"], Some("/work"));
        let res = resolve_identity(&naming(Some("/tmp/foo/bar"), Some("Model-Widget")), false, &fs)
            .unwrap();
        assert_eq!(res.identity.base_name, "bar");
        assert_eq!(res.identity.directory, PathBuf::from("/tmp/foo"));
        assert_eq!(res.name_rule, NameRule::HintWithDirectory);
        assert_eq!(res.directory_rule, DirectoryRule::HintDirectory);
    }

    #[test]
    fn test_bare_hint_yields_to_model_name() {
        let fs = FakeFs::new(&["/home/user/projects"], Some("/work"));
        let res =
            resolve_identity(&naming(Some("bar"), Some("Model-Widget")), false, &fs).unwrap();
        assert_eq!(res.identity.base_name, "Widget");
        assert_eq!(res.identity.directory, PathBuf::from("/home/user/projects"));
        assert_eq!(res.name_rule, NameRule::ModelName);
        assert_eq!(res.directory_rule, DirectoryRule::DocumentDirectory);
    }

    #[test]
    fn test_priority_order() {
        let mut ctx = NamingContext {
            output_file_hint: Some("bare.mpr".into()),
            model_name: Some("Model-Widget".into()),
            part_name: Some("Door".into()),
            dialog_filename: Some("dialog".into()),
            ..Default::default()
        };
        assert_eq!(resolve_base_name(&ctx, false).0, "Widget");
        assert_eq!(resolve_base_name(&ctx, true).0, "Door");

        ctx.model_name = Some("Model-".into());
        assert_eq!(resolve_base_name(&ctx, false), ("Door".to_string(), NameRule::PartName));

        ctx.part_name = None;
        assert_eq!(resolve_base_name(&ctx, false), ("bare".to_string(), NameRule::BareHint));

        ctx.output_file_hint = None;
        assert_eq!(
            resolve_base_name(&ctx, false),
            ("dialog".to_string(), NameRule::DialogFilename)
        );

        ctx.dialog_filename = Some("-".into());
        assert_eq!(
            resolve_base_name(&ctx, false),
            ("export".to_string(), NameRule::Fallback)
        );
    }

    #[test]
    fn test_root_hint_is_bare() {
        let ctx = NamingContext {
            output_file_hint: Some("/panel.mpr".into()),
            part_name: Some("Door".into()),
            ..Default::default()
        };
        assert_eq!(resolve_base_name(&ctx, false).1, NameRule::PartName);

        let fs = FakeFs::new(&[], Some("/work"));
        let err = resolve_directory(&ctx, &fs).unwrap_err();
        assert!(matches!(err, PostError::UnresolvableDirectory { .. }));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_base_name("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_base_name(" tab\there "), "tab_here");
        let ctx = NamingContext {
            part_name: Some("Side: left".into()),
            ..Default::default()
        };
        assert_eq!(resolve_base_name(&ctx, false).0, "Side_ left");
    }

    #[test]
    fn test_directory_fallbacks() {
        let ctx = NamingContext {
            output_file_hint: Some("/missing/dir/x.mpr".into()),
            ..Default::default()
        };
        let fs = FakeFs::new(&["/work"], Some("/work"));
        let (dir, rule) = resolve_directory(&ctx, &fs).unwrap();
        assert_eq!(dir, PathBuf::from("/work"));
        assert_eq!(rule, DirectoryRule::CurrentDirectory);

        let relative = NamingContext {
            output_file_hint: Some("out/x.mpr".into()),
            ..Default::default()
        };
        let fs = FakeFs::new(&["/work", "/work/out"], Some("/work"));
        assert_eq!(
            resolve_directory(&relative, &fs).unwrap(),
            (PathBuf::from("/work/out"), DirectoryRule::HintDirectory)
        );
    }

    #[test]
    fn test_never_returns_root() {
        let fs = FakeFs::new(&[], Some("/"));
        let err = resolve_directory(&NamingContext::default(), &fs).unwrap_err();
        assert!(err.to_string().contains("filesystem root"));

        let fs = FakeFs::new(&[], None);
        assert!(resolve_directory(&NamingContext::default(), &fs).is_err());
    }

    fn resolved() -> IdentityResolution {
        IdentityResolution {
            identity: OutputIdentity::new("Shelf", "/work"),
            name_rule: NameRule::PartName,
            directory_rule: DirectoryRule::CurrentDirectory,
        }
    }

    #[test]
    fn test_confirmed_identity_is_validated() {
        let fs = FakeFs::new(&["/work", "/srv/cnc"], Some("/work"));

        let same = confirm_identity(resolved(), resolved().identity, &fs).unwrap();
        assert_eq!(same, resolved());

        let renamed =
            confirm_identity(resolved(), OutputIdentity::new("left/door", "/work"), &fs).unwrap();
        assert_eq!(renamed.identity, OutputIdentity::new("left_door", "/work"));
        assert_eq!(renamed.name_rule, NameRule::HostConfirmed);
        assert_eq!(renamed.directory_rule, DirectoryRule::CurrentDirectory);

        let moved = confirm_identity(resolved(), OutputIdentity::new("Shelf", "/srv/cnc"), &fs)
            .unwrap();
        assert_eq!(moved.name_rule, NameRule::PartName);
        assert_eq!(moved.directory_rule, DirectoryRule::HostConfirmed);

        assert!(confirm_identity(resolved(), OutputIdentity::new("  ", "/work"), &fs).is_err());
        assert!(matches!(
            confirm_identity(resolved(), OutputIdentity::new("Shelf", "/"), &fs),
            Err(PostError::UnresolvableDirectory { .. })
        ));
        assert!(matches!(
            confirm_identity(resolved(), OutputIdentity::new("Shelf", "/missing"), &fs),
            Err(PostError::UnresolvableDirectory { .. })
        ));
    }
}
