//! Error types for the migration core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors raised while loading a script set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The script directory does not exist.
    #[error("Script source not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The script source exists but is not a directory.
    #[error("Script source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Two scripts share the same name.
    #[error("Duplicate script name '{0}'")]
    DuplicateName(String),

    /// Reading a directory entry or script body failed.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while deriving a connection descriptor.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The endpoint reference does not have the expected shape.
    #[error("Malformed endpoint '{endpoint}': {reason}")]
    MalformedEndpoint {
        /// The rejected endpoint reference.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ResolutionError {
    /// Create a malformed endpoint error.
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Script set could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Endpoint could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A single-script run named a script that is not in the set.
    #[error("Script '{0}' not found")]
    ScriptNotFound(String),
}

impl MigrationError {
    /// Check if this error came from loading the script set.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Load(_))
    }

    /// Check if this error came from endpoint resolution.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = LoadError::NotFound(PathBuf::from("/nowhere/sql"));
        assert!(err.to_string().contains("/nowhere/sql"));
    }

    #[test]
    fn test_malformed_display() {
        let err = ResolutionError::malformed("not-a-url", "missing scheme");
        let msg = err.to_string();
        assert!(msg.contains("not-a-url"));
        assert!(msg.contains("missing scheme"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: MigrationError = ResolutionError::malformed("x", "y").into();
        assert!(err.is_resolution_error());
        assert!(!err.is_load_error());

        let err: MigrationError = LoadError::DuplicateName("01_init.sql".into()).into();
        assert!(err.is_load_error());
        assert!(err.to_string().contains("01_init.sql"));
    }
}
