//! Artifact writer
//!
//! Each artifact is written to a temporary file in the target directory and
//! renamed over the destination, so a reader never sees a partial file.

use mprkit_core::{ArtifactSet, OutputIdentity, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically replace `path` with `content`
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write every artifact of a run and return the written paths in order
pub fn write_artifacts(artifacts: &ArtifactSet, identity: &OutputIdentity) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts.iter() {
        let path = identity.path_for(artifact.kind);
        write_atomic(&path, &artifact.content)?;
        tracing::info!(
            "Wrote {} ({} bytes)",
            path.display(),
            artifact.content.len()
        );
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mprkit_core::{ArtifactContent, ArtifactKind};
    use tempfile::TempDir;

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("part.mpr");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "new content").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new content");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut diagnostics = Vec::new();
        let set = ArtifactSet::assemble(
            vec![
                (ArtifactKind::Mpr, ArtifactContent::Text("[H\n!\n".into())),
                (ArtifactKind::Gcode, ArtifactContent::Text("G21\nM2\n".into())),
                (ArtifactKind::Report, ArtifactContent::Text("report\n".into())),
            ],
            1,
            &mut diagnostics,
        )
        .unwrap();
        let identity = OutputIdentity::new("door", dir.path());

        let written = write_artifacts(&set, &identity).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("door.mpr"));
        assert!(written[1].ends_with("door.nc"));
        assert!(written[2].ends_with("door_job_report.txt"));
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "G21\nM2\n");
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("part.mpr");
        assert!(write_atomic(&path, "x").is_err());
    }
}
