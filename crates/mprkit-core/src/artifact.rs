//! Output artifacts returned to the host
//!
//! A run produces exactly one artifact of each [`ArtifactKind`]. The set is
//! validated before it crosses the host boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PostError, Result};

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// WoodWOP program
    Mpr,
    /// G-code listing of the same operations
    Gcode,
    /// Diagnostic job report
    Report,
}

impl ArtifactKind {
    /// All kinds in emission order
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Mpr, ArtifactKind::Gcode, ArtifactKind::Report];

    /// File name of this artifact for a base name
    pub fn file_name(&self, base: &str) -> String {
        match self {
            Self::Mpr => format!("{}.mpr", base),
            Self::Gcode => format!("{}.nc", base),
            Self::Report => format!("{}_job_report.txt", base),
        }
    }

    /// Whether an empty body is an error when there are features
    pub fn requires_content(&self) -> bool {
        matches!(self, Self::Mpr | Self::Gcode)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpr => write!(f, "mpr"),
            Self::Gcode => write!(f, "nc"),
            Self::Report => write!(f, "report"),
        }
    }
}

/// Content as produced by an emitter, before validation
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactContent {
    /// Text content
    Text(String),
    /// Raw bytes; coerced to text with a logged lossy conversion
    Bytes(Vec<u8>),
}

impl From<String> for ArtifactContent {
    fn from(s: String) -> Self {
        ArtifactContent::Text(s)
    }
}

impl From<Vec<u8>> for ArtifactContent {
    fn from(b: Vec<u8>) -> Self {
        ArtifactContent::Bytes(b)
    }
}

impl ArtifactContent {
    /// Turn the content into text, returning the mismatch that was recovered
    /// from when a conversion was needed
    pub fn into_text(self, kind: ArtifactKind) -> (String, Option<PostError>) {
        match self {
            ArtifactContent::Text(s) => (s, None),
            ArtifactContent::Bytes(bytes) => {
                let len = bytes.len();
                let (text, lossy) = match String::from_utf8(bytes) {
                    Ok(s) => (s, false),
                    Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
                };
                let detail = if lossy {
                    format!("{} bytes decoded as UTF-8 with replacement characters", len)
                } else {
                    format!("{} bytes decoded as UTF-8", len)
                };
                tracing::warn!("Artifact {} supplied as bytes: {}", kind, detail);
                (
                    text,
                    Some(PostError::TypeMismatch {
                        kind: kind.to_string(),
                        detail,
                    }),
                )
            }
        }
    }
}

/// One validated artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Text content
    pub content: String,
}

/// The validated `{kind, content}` list of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    artifacts: Vec<OutputArtifact>,
}

impl ArtifactSet {
    /// Validate emitter output into an artifact set.
    ///
    /// Every kind must appear exactly once. `Mpr` and `Gcode` must be
    /// non-empty whenever `feature_count` is non-zero. Byte content is
    /// converted to text and the recovered mismatch pushed onto `diagnostics`.
    pub fn assemble(
        parts: Vec<(ArtifactKind, ArtifactContent)>,
        feature_count: usize,
        diagnostics: &mut Vec<PostError>,
    ) -> Result<Self> {
        let mut artifacts: Vec<OutputArtifact> = Vec::with_capacity(ArtifactKind::ALL.len());

        for (kind, content) in parts {
            if artifacts.iter().any(|a| a.kind == kind) {
                return Err(PostError::other(format!("Duplicate {} artifact", kind)));
            }
            let (content, mismatch) = content.into_text(kind);
            if let Some(err) = mismatch {
                diagnostics.push(err);
            }
            if feature_count > 0 && kind.requires_content() && content.trim().is_empty() {
                return Err(PostError::EmptyContent {
                    kind: kind.to_string(),
                });
            }
            artifacts.push(OutputArtifact { kind, content });
        }

        for kind in ArtifactKind::ALL {
            if !artifacts.iter().any(|a| a.kind == kind) {
                return Err(PostError::other(format!("Missing {} artifact", kind)));
            }
        }

        artifacts.sort_by_key(|a| a.kind);
        Ok(Self { artifacts })
    }

    /// Content of the artifact of the given kind
    pub fn content(&self, kind: ArtifactKind) -> &str {
        self.artifacts
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.content.as_str())
            .unwrap_or_default()
    }

    /// Iterate in `Mpr`, `Gcode`, `Report` order
    pub fn iter(&self) -> impl Iterator<Item = &OutputArtifact> {
        self.artifacts.iter()
    }

    /// Number of artifacts (always three)
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(mpr: &str, nc: &str) -> Vec<(ArtifactKind, ArtifactContent)> {
        vec![
            (ArtifactKind::Report, ArtifactContent::Text("report".into())),
            (ArtifactKind::Mpr, ArtifactContent::Text(mpr.into())),
            (ArtifactKind::Gcode, ArtifactContent::Text(nc.into())),
        ]
    }

    #[test]
    fn test_file_names() {
        assert_eq!(ArtifactKind::Mpr.file_name("a"), "a.mpr");
        assert_eq!(ArtifactKind::Gcode.file_name("a"), "a.nc");
        assert_eq!(ArtifactKind::Report.file_name("a"), "a_job_report.txt");
    }

    #[test]
    fn test_assemble_orders_by_kind() {
        let mut diags = Vec::new();
        let set = ArtifactSet::assemble(parts("[H", "G21"), 1, &mut diags).unwrap();
        let kinds: Vec<_> = set.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
        assert_eq!(set.content(ArtifactKind::Gcode), "G21");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_empty_content_is_fatal_with_features() {
        let mut diags = Vec::new();
        let err = ArtifactSet::assemble(parts("", "G21"), 2, &mut diags).unwrap_err();
        assert!(matches!(err, PostError::EmptyContent { ref kind } if kind == "mpr"));

        // an empty feature list is a legitimate empty body
        assert!(ArtifactSet::assemble(parts("", ""), 0, &mut diags).is_ok());
    }

    #[test]
    fn test_bytes_are_coerced_and_recorded() {
        let mut diags = Vec::new();
        let mut p = parts("[H", "G21");
        p[2] = (ArtifactKind::Gcode, ArtifactContent::Bytes(vec![b'G', b'1', 0xff]));
        let set = ArtifactSet::assemble(p, 1, &mut diags).unwrap();
        assert_eq!(set.content(ArtifactKind::Gcode), "G1\u{fffd}");
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], PostError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_kind_rejected() {
        let mut diags = Vec::new();
        let mut p = parts("[H", "G21");
        p.pop();
        assert!(ArtifactSet::assemble(p, 1, &mut diags).is_err());
    }
}
