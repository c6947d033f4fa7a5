use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for yamlinc operations
#[derive(Error, Debug)]
pub enum YamlincError {
    /// Invalid option value, reported before any document is processed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A specifier appears again in its own ancestor chain
    #[error("Cyclic include detected: {specifier} (chain: {chain})")]
    CyclicInclude { specifier: String, chain: String },

    /// IO error when reading files or standard input
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File not found error with specific path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Shell command exited unsuccessfully
    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Non-success HTTP response
    #[error("HTTP {status} {reason}: {url}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },

    /// Transport-level failure while fetching a URL
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid glob pattern
    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),

    /// `WalkDir` error when expanding a glob
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl YamlincError {
    /// Shorthand for a [`YamlincError::Config`] with the given message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error was raised while validating options
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, YamlincError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = YamlincError::FileNotFound {
            path: PathBuf::from("/test/file.yaml"),
        };
        assert_eq!(format!("{err}"), "File not found: /test/file.yaml");

        let err = YamlincError::config("indent width must be a positive integer");
        assert_eq!(
            format!("{err}"),
            "Configuration error: indent width must be a positive integer"
        );
        assert!(err.is_config());

        let err = YamlincError::CyclicInclude {
            specifier: "a.yaml".to_string(),
            chain: "a.yaml -> b.yaml".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Cyclic include detected: a.yaml (chain: a.yaml -> b.yaml)"
        );
        assert!(!err.is_config());

        let err = YamlincError::Http {
            url: "http://localhost/x.yaml".to_string(),
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 404 Not Found: http://localhost/x.yaml");

        let err = YamlincError::CommandFailed {
            command: "false".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "boom".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Command `false` failed (exit status: 1): boom"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: YamlincError = io_err.into();
        assert!(matches!(err, YamlincError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: YamlincError = json_err.into();
        assert!(matches!(err, YamlincError::Json(_)));
    }
}
