//! CLI error type and exit codes.

use std::fmt;
use std::path::PathBuf;

use tilemosaic::MosaicError;

/// Exit code for a rejected request (bad input, unknown project).
pub const EXIT_CLIENT_ERROR: i32 = 2;

/// Exit code for any other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or logging setup was invalid.
    Config(String),
    /// Project definition could not be loaded.
    Project(String),
    /// Service failed to start.
    Startup(String),
    /// Rendering failed.
    Render(MosaicError),
    /// Output could not be written.
    Output { path: PathBuf, reason: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Project(_) => EXIT_CLIENT_ERROR,
            CliError::Render(e) if e.is_client_error() => EXIT_CLIENT_ERROR,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Project(msg) => write!(f, "Failed to load project: {}", msg),
            CliError::Startup(msg) => write!(f, "Failed to start renderer: {}", msg),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
            CliError::Output { path, reason } => {
                write!(f, "Failed to write {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Render(e)
    }
}
