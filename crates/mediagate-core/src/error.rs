//! Unified error type for the mediagate request pipeline.
//!
//! Every expected failure of a file request is its own variant so the
//! transport layer can pick a protocol-appropriate response without looking
//! at messages. [`Error::http_status`] gives the conventional mapping.

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes of a file request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request path carried malformed or missing parameters.
    #[error("Invalid request parameter: {0}")]
    Parameter(String),

    /// No content object exists for the requested id.
    #[error("Object not found: {id}")]
    ObjectNotFound {
        /// The object id that was looked up.
        id: String,
    },

    /// The handler/index combination does not address an existing resource.
    #[error("Resource not found on object {object_id}: {reason}")]
    ResourceNotFound {
        /// The object the resource was looked up on.
        object_id: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// A container was addressed without a resource handler.
    #[error("Requested object {id} is not an item")]
    NotAnItem {
        /// The container's id.
        id: String,
    },

    /// The primary media file is missing or unreadable.
    #[error("Failed to access {}: {source}", path.display())]
    PathNotAccessible {
        /// The path that was checked.
        path: PathBuf,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// An optional side file (subtitle, fanart, ...) is missing.
    #[error("Side resource file {} is not available", path.display())]
    SideResourceUnavailable {
        /// The side file path declared on the resource.
        path: PathBuf,
    },

    /// No transcoding profile matches the requested name exactly.
    #[error("No transcoding profile named '{name}'")]
    ProfileNotFound {
        /// The requested profile name.
        name: String,
    },

    /// Write access was requested. Never supported.
    #[error("Write mode is not supported")]
    UnsupportedWriteMode,

    /// A stream handle was used in a state that does not allow the operation.
    #[error("Stream handle {handle}: {message}")]
    HandleState {
        /// Description of the handle's backing source.
        handle: String,
        /// What went wrong.
        message: String,
    },

    /// The external transcoder could not be located or started.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Parameter(_) => 400,
            Error::NotAnItem { .. } => 400,
            Error::ObjectNotFound { .. } => 404,
            Error::ResourceNotFound { .. } => 404,
            Error::PathNotAccessible { .. } => 404,
            Error::SideResourceUnavailable { .. } => 404,
            Error::ProfileNotFound { .. } => 404,
            Error::UnsupportedWriteMode => 405,
            Error::Tool { .. } => 502,
            Error::HandleState { .. } => 500,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
        }
    }

    /// True when only optional enrichment (e.g. subtitles) is missing and
    /// the caller may degrade instead of failing the whole response.
    pub fn is_side_resource(&self) -> bool {
        matches!(self, Error::SideResourceUnavailable { .. })
    }

    /// Convenience constructor for [`Error::Parameter`].
    pub fn parameter(message: impl Into<String>) -> Self {
        Error::Parameter(message.into())
    }

    /// Convenience constructor for [`Error::ObjectNotFound`].
    pub fn object_not_found(id: impl fmt::Display) -> Self {
        Error::ObjectNotFound { id: id.to_string() }
    }

    /// Convenience constructor for [`Error::ResourceNotFound`].
    pub fn resource_not_found(object_id: impl fmt::Display, reason: impl Into<String>) -> Self {
        Error::ResourceNotFound {
            object_id: object_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::NotAnItem`].
    pub fn not_an_item(id: impl fmt::Display) -> Self {
        Error::NotAnItem { id: id.to_string() }
    }

    /// Convenience constructor for [`Error::ProfileNotFound`].
    pub fn profile_not_found(name: impl Into<String>) -> Self {
        Error::ProfileNotFound { name: name.into() }
    }

    /// Convenience constructor for [`Error::HandleState`].
    pub fn handle_state(handle: impl Into<String>, message: impl Into<String>) -> Self {
        Error::HandleState {
            handle: handle.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_display() {
        let err = Error::parameter("object_id is missing");
        assert_eq!(
            err.to_string(),
            "Invalid request parameter: object_id is missing"
        );
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn object_not_found_display() {
        let err = Error::object_not_found(42);
        assert_eq!(err.to_string(), "Object not found: 42");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn resource_not_found_display() {
        let err = Error::resource_not_found(7, "index 3 out of range (2 resources)");
        assert_eq!(
            err.to_string(),
            "Resource not found on object 7: index 3 out of range (2 resources)"
        );
    }

    #[test]
    fn side_resource_is_distinguishable() {
        let side = Error::SideResourceUnavailable {
            path: PathBuf::from("/media/movie.srt"),
        };
        let primary = Error::PathNotAccessible {
            path: PathBuf::from("/media/movie.mkv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(side.is_side_resource());
        assert!(!primary.is_side_resource());
        assert_eq!(
            side.to_string(),
            "Side resource file /media/movie.srt is not available"
        );
    }

    #[test]
    fn write_mode_status() {
        assert_eq!(Error::UnsupportedWriteMode.http_status(), 405);
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "not found in PATH");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: not found in PATH");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }
}
