//! Transcoder executable lookup.

use std::path::{Path, PathBuf};

use mediagate_core::{Error, Result};

/// Availability information for a profile's command.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Command as written in the profile.
    pub name: String,
    /// Whether the command resolves to an executable.
    pub available: bool,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Resolve a profile command to an executable path.
///
/// Commands containing a path separator are used as given and must exist;
/// bare names are searched in `PATH` via [`which::which`].
pub fn resolve_tool(command: &str) -> Result<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        return Err(Error::tool(command, "executable does not exist"));
    }

    which::which(command)
        .map_err(|_| Error::tool(command, format!("{command} not found; is it installed and in PATH?")))
}

/// Check whether a command is available.
pub fn check_tool(command: &str) -> ToolInfo {
    match resolve_tool(command) {
        Ok(path) => ToolInfo {
            name: command.to_string(),
            available: true,
            path: Some(path),
        },
        Err(_) => ToolInfo {
            name: command.to_string(),
            available: false,
            path: None,
        },
    }
}
