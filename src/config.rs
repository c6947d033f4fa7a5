use crate::error::{Result, YamlincError};
use std::path::PathBuf;

/// Default number of spaces added per include nesting level
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Default directive keyword that emits its label and nests the content
pub const DEFAULT_INCLUDE_TAG: &str = "!include";

/// Default directive keyword that substitutes content in place
pub const DEFAULT_REPLACE_TAG: &str = "!replace";

/// Separator written between top-level documents in multi-document mode
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Configuration for document expansion
#[derive(Debug, Clone)]
pub struct ExpandConfig {
    /// Spaces appended to the indent for every labelled include
    pub indent_width: usize,
    /// Emit `---` before every top-level document except the first
    pub multi_document: bool,
    /// Keyword for label-preserving includes
    pub include_tag: String,
    /// Keyword for in-place replacement
    pub replace_tag: String,
    /// Base directory for relative top-level specifiers
    pub base_dir: PathBuf,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            multi_document: false,
            include_tag: DEFAULT_INCLUDE_TAG.to_string(),
            replace_tag: DEFAULT_REPLACE_TAG.to_string(),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl ExpandConfig {
    /// Checks option values before any document is touched
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Config` if the indent width is zero, a tag is empty or
    /// contains whitespace, or both tags are the same keyword.
    pub fn validate(&self) -> Result<()> {
        if self.indent_width == 0 {
            return Err(YamlincError::config(
                "indent width must be a positive integer",
            ));
        }

        for (name, tag) in [
            ("include", &self.include_tag),
            ("replace", &self.replace_tag),
        ] {
            if tag.is_empty() {
                return Err(YamlincError::config(format!("{name} tag must not be empty")));
            }
            if tag.chars().any(char::is_whitespace) {
                return Err(YamlincError::config(format!(
                    "{name} tag must not contain whitespace: {tag:?}"
                )));
            }
        }

        if self.include_tag == self.replace_tag {
            return Err(YamlincError::config(format!(
                "include and replace tags must differ (both are {:?})",
                self.include_tag
            )));
        }

        Ok(())
    }

    /// The whitespace added to a child's indent by a labelled include
    pub fn indent_unit(&self) -> String {
        " ".repeat(self.indent_width)
    }
}
