//! Naming metadata snapshot and the resolved output identity

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactKind;

/// Metadata the host collected for naming the output files.
///
/// Assembled once per run by the host boundary; the generator only reads it.
/// Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingContext {
    /// Output file path the host was asked to write, possibly bare
    pub output_file_hint: Option<String>,
    /// Name of the model object, often prefixed with `Model-`
    pub model_name: Option<String>,
    /// Name of the part or body being machined
    pub part_name: Option<String>,
    /// Name typed into the host's export dialog; `-` means none
    pub dialog_filename: Option<String>,
    /// Name of the machining job
    pub job_name: Option<String>,
    /// Path of the host document, used for its directory
    pub document_path: Option<PathBuf>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl NamingContext {
    /// Trimmed output file hint, if any
    pub fn output_file_hint(&self) -> Option<&str> {
        present(&self.output_file_hint)
    }

    /// Trimmed model name, if any
    pub fn model_name(&self) -> Option<&str> {
        present(&self.model_name)
    }

    /// Trimmed part name, if any
    pub fn part_name(&self) -> Option<&str> {
        present(&self.part_name)
    }

    /// Trimmed dialog file name; `-` is treated as absent
    pub fn dialog_filename(&self) -> Option<&str> {
        present(&self.dialog_filename).filter(|v| *v != "-")
    }

    /// Trimmed job name, if any
    pub fn job_name(&self) -> Option<&str> {
        present(&self.job_name)
    }

    /// Directory containing the host document
    pub fn document_dir(&self) -> Option<&Path> {
        self.document_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Base name and directory shared by every artifact of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputIdentity {
    /// File stem shared by all artifacts
    pub base_name: String,
    /// Target directory
    pub directory: PathBuf,
}

impl OutputIdentity {
    /// Create an identity
    pub fn new(base_name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            base_name: base_name.into(),
            directory: directory.into(),
        }
    }

    /// Full path of the artifact of the given kind
    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.directory.join(kind.file_name(&self.base_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let ctx = NamingContext {
            model_name: Some("   ".to_string()),
            part_name: Some("  Panel ".to_string()),
            dialog_filename: Some("-".to_string()),
            ..Default::default()
        };
        assert_eq!(ctx.model_name(), None);
        assert_eq!(ctx.part_name(), Some("Panel"));
        assert_eq!(ctx.dialog_filename(), None);
    }

    #[test]
    fn test_document_dir() {
        let ctx = NamingContext {
            document_path: Some(PathBuf::from("/home/user/cabinet.FCStd")),
            ..Default::default()
        };
        assert_eq!(ctx.document_dir(), Some(Path::new("/home/user")));

        let bare = NamingContext {
            document_path: Some(PathBuf::from("cabinet.FCStd")),
            ..Default::default()
        };
        assert_eq!(bare.document_dir(), None);
    }

    #[test]
    fn test_identity_paths() {
        let id = OutputIdentity::new("door", "/tmp/out");
        assert_eq!(id.path_for(ArtifactKind::Mpr), PathBuf::from("/tmp/out/door.mpr"));
        assert_eq!(
            id.path_for(ArtifactKind::Report),
            PathBuf::from("/tmp/out/door_job_report.txt")
        );
    }
}
