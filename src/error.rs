use crate::process::CommandOutput;
use thiserror::Error;

/// Failures of the Terraform and OpenStack wrappers.
#[derive(Debug, Error)]
pub enum Error {
    /// A required path or binary is missing. Raised before anything is executed.
    #[error("{0}")]
    Precondition(String),

    #[error("Failed to execute '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{cmd}' failed with exit code {}: {}", .output.rc, .output.stderr.trim())]
    CommandFailed { cmd: String, output: CommandOutput },

    #[error("Failed to parse output of '{cmd}': {source}")]
    Parse {
        cmd: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Workspace '{0}' does not exist.")]
    WorkspaceMissing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
