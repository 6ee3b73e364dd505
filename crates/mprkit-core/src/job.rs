//! Job description and the host adapter seam

use serde::{Deserialize, Serialize};

use crate::command::RawCommand;
use crate::error::{PostError, Result};
use crate::naming::{NamingContext, OutputIdentity};
use crate::stock::StockGeometry;

/// Version of the host adapter interface understood by this generator
pub const HOST_API_VERSION: u32 = 1;

/// Everything a host hands over for one post-processing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostJob {
    /// Ordered raw commands
    pub commands: Vec<RawCommand>,
    /// Naming metadata snapshot
    pub naming: NamingContext,
    /// Stock bounding geometry, if the host has it
    pub stock: Option<StockGeometry>,
    /// Work coordinate fixtures of the job (`G54`, `G55`, ...)
    pub fixtures: Vec<String>,
}

impl PostJob {
    /// Create a job from commands with empty metadata
    pub fn from_commands(commands: Vec<RawCommand>) -> Self {
        Self {
            commands,
            ..Default::default()
        }
    }

    /// Decode a job from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Versioned interface between a host application and the generator.
///
/// Hosts translate their own object model into a [`PostJob`] and may confirm
/// or replace the resolved identity before files are written.
pub trait HostAdapter {
    /// Interface version the adapter was written against
    fn api_version(&self) -> u32 {
        HOST_API_VERSION
    }

    /// Build the job snapshot for this run
    fn collect_job(&self) -> Result<PostJob>;

    /// Naming confirmation step; the default accepts the proposal
    fn confirm_identity(&self, proposed: OutputIdentity) -> OutputIdentity {
        proposed
    }
}

/// Reject adapters built against another interface version
pub fn check_adapter(adapter: &dyn HostAdapter) -> Result<()> {
    let version = adapter.api_version();
    if version != HOST_API_VERSION {
        return Err(PostError::other(format!(
            "Host adapter API version {} is not supported (expected {})",
            version, HOST_API_VERSION
        )));
    }
    Ok(())
}

impl HostAdapter for PostJob {
    fn collect_job(&self) -> Result<PostJob> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LegacyHost;

    impl HostAdapter for LegacyHost {
        fn api_version(&self) -> u32 {
            0
        }

        fn collect_job(&self) -> Result<PostJob> {
            Ok(PostJob::default())
        }
    }

    #[test]
    fn test_job_from_json() {
        let json = r#"{
            "commands": [
                {"name": "G0", "params": {"X": 0.0, "Y": 0.0}},
                {"name": "G1", "params": {"X": 10.0},
                 "operation": {"id": "Profile", "kind": "profile"}}
            ],
            "naming": {"model_name": "Model-Door"},
            "fixtures": ["G54"]
        }"#;
        let job = PostJob::from_json(json).unwrap();
        assert_eq!(job.commands.len(), 2);
        assert_eq!(job.commands[1].param('X'), Some(10.0));
        assert_eq!(job.naming.model_name(), Some("Model-Door"));
        assert_eq!(job.fixtures, vec!["G54".to_string()]);
        assert!(job.stock.is_none());
    }

    #[test]
    fn test_adapter_version_check() {
        let job = PostJob::default();
        assert!(check_adapter(&job).is_ok());
        assert!(check_adapter(&LegacyHost).is_err());
    }
}
