//! Content resolution: turns one specifier into lines of text.
//!
//! Five specifier shapes are recognised, checked in this order:
//!
//! | Specifier                 | Source                                   |
//! |---------------------------|------------------------------------------|
//! | `-` or empty              | standard input                           |
//! | `$(shell <command>)`      | stdout of `<command>` run through a shell |
//! | `$(json <path>)`, `*.json` | JSON file re-emitted as YAML             |
//! | `http://…`, `https://…`   | body of an HTTP GET, as YAML for `.json` |
//! | anything else             | file on disk                             |
//!
//! Relative paths resolve against the base directory of the including context,
//! never against the process working directory.

use crate::error::{Result, YamlincError};
use crate::fs_utils::{read_file_contents, resolve_path, split_lines};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

const SHELL_PREFIX: &str = "$(shell";
const JSON_PREFIX: &str = "$(json";

/// A classified specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Standard input
    Stdin,
    /// Output of a shell command
    Shell(String),
    /// JSON file converted to YAML
    Json(String),
    /// HTTP(S) resource
    Http(String),
    /// Plain file or glob pattern
    File(String),
}

impl Source {
    /// Classifies a specifier by shape
    pub fn parse(specifier: &str) -> Self {
        let specifier = specifier.trim();
        if specifier.is_empty() || specifier == "-" {
            Self::Stdin
        } else if let Some(command) = unwrap_call(specifier, SHELL_PREFIX) {
            Self::Shell(command.to_string())
        } else if let Some(path) = unwrap_call(specifier, JSON_PREFIX) {
            Self::Json(path.to_string())
        } else if specifier.starts_with("http://") || specifier.starts_with("https://") {
            Self::Http(specifier.to_string())
        } else if specifier.ends_with(".json") {
            Self::Json(specifier.to_string())
        } else {
            Self::File(specifier.to_string())
        }
    }

    /// Whether the specifier names exactly one source and must not be glob-expanded
    pub fn is_singular(specifier: &str) -> bool {
        let specifier = specifier.trim();
        unwrap_call(specifier, SHELL_PREFIX).is_some()
            || unwrap_call(specifier, JSON_PREFIX).is_some()
            || specifier.starts_with("http://")
            || specifier.starts_with("https://")
    }
}

/// Extracts `<arg>` from `$(<keyword> <arg>)`
fn unwrap_call<'a>(specifier: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = specifier.strip_prefix(prefix)?.strip_suffix(')')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let arg = rest.trim();
    (!arg.is_empty()).then_some(arg)
}

/// Lines produced by one source, plus the directory nested relative specifiers resolve against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub lines: Vec<String>,
    pub base_dir: PathBuf,
}

/// Resolves specifiers into lines.
///
/// Holds the shared HTTP client and the standard input stream, which can be read
/// to exhaustion once; later reads produce no lines.
pub struct Resolver {
    client: reqwest::Client,
    stdin: Box<dyn AsyncRead + Unpin>,
}

impl Resolver {
    /// Creates a resolver reading from the process's standard input
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Network` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_stdin(tokio::io::stdin())
    }

    /// Creates a resolver reading "standard input" from the given stream
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Network` if the HTTP client cannot be built.
    pub fn with_stdin(stdin: impl AsyncRead + Unpin + 'static) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("yamlinc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| YamlincError::Network {
                url: String::new(),
                message: format!("client build: {e}"),
            })?;
        Ok(Self {
            client,
            stdin: Box::new(stdin),
        })
    }

    /// Resolves one specifier relative to `base_dir`
    ///
    /// # Errors
    ///
    /// - `YamlincError::FileNotFound` / `YamlincError::Io` for unreadable files or stdin.
    /// - `YamlincError::CommandFailed` if a shell command exits unsuccessfully.
    /// - `YamlincError::Http` / `YamlincError::Network` for failed fetches.
    /// - `YamlincError::Json` / `YamlincError::Yaml` if JSON conversion fails.
    pub async fn resolve(&mut self, specifier: &str, base_dir: &Path) -> Result<Resolved> {
        let source = Source::parse(specifier);
        debug!(?source, base_dir = %base_dir.display(), "resolving source");

        match source {
            Source::Stdin => {
                let mut buffer = String::new();
                self.stdin.read_to_string(&mut buffer).await?;
                Ok(Resolved {
                    lines: split_lines(&buffer),
                    base_dir: base_dir.to_path_buf(),
                })
            }
            Source::Shell(command) => Ok(Resolved {
                lines: run_shell(&command, base_dir).await?,
                base_dir: base_dir.to_path_buf(),
            }),
            Source::Json(path) => {
                let path = resolve_path(&path, base_dir);
                let text = read_file_contents(&path).await?;
                Ok(Resolved {
                    lines: json_to_yaml_lines(&text)?,
                    base_dir: parent_dir(&path, base_dir),
                })
            }
            Source::Http(url) => Ok(Resolved {
                lines: self.fetch(&url).await?,
                base_dir: base_dir.to_path_buf(),
            }),
            Source::File(path) => {
                let path = resolve_path(&path, base_dir);
                let text = read_file_contents(&path).await?;
                Ok(Resolved {
                    lines: split_lines(&text),
                    base_dir: parent_dir(&path, base_dir),
                })
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| YamlincError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(YamlincError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let is_json = response.url().path().ends_with(".json");
        let body = response.text().await.map_err(|e| YamlincError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if is_json && !body.trim().is_empty() {
            return json_to_yaml_lines(&body);
        }
        Ok(split_lines(&body))
    }
}

fn parent_dir(path: &Path, fallback: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf)
}

async fn run_shell(command: &str, base_dir: &Path) -> Result<Vec<String>> {
    let mut cmd = if cfg!(windows) {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command).stdin(std::process::Stdio::null());
    if base_dir.is_dir() {
        cmd.current_dir(base_dir);
    }

    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(YamlincError::CommandFailed {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(split_lines(&String::from_utf8_lossy(&output.stdout)))
}

/// Re-serializes a JSON document as YAML lines
///
/// # Errors
///
/// Returns `YamlincError::Json` for malformed input.
pub fn json_to_yaml_lines(text: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let yaml = serde_yaml::to_string(&value)?;
    Ok(split_lines(&yaml))
}
