//! # yamlinc
//!
//! A line-oriented preprocessor that expands `!include` and `!replace` directives in
//! YAML documents, recursively, while keeping the nesting level implied by where the
//! directive sits.
//!
//! ## Features
//!
//! - `key: !include part.yaml` nests the included content under `key:`
//! - `- !include item.yaml` continues the included content on the list item line
//! - `!replace other.yaml` substitutes content in place
//! - Glob fan-out (`!include parts/*.yaml`), JSON conversion (`$(json data.json)`),
//!   shell output (`$(shell cmd)`), HTTP(S) resources and standard input
//! - Cyclic includes are detected and reported
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use yamlinc::{ExpandConfig, expand_text};
//!
//! # async fn demo() -> yamlinc::Result<()> {
//! let document = "services:\n  web: !include services/web.yaml\n";
//! let expanded = expand_text(document, ExpandConfig::default()).await?;
//! print!("{expanded}");
//! # Ok(())
//! # }
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Expand a document
//! yamlinc compose.yaml
//!
//! # Expand from stdin
//! cat compose.yaml | yamlinc
//!
//! # Several documents separated by ---
//! yamlinc -m a.yaml b.yaml
//! ```

pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod fs_utils;
pub mod source;

// Re-export main types and functions for convenience
pub use config::ExpandConfig;
pub use directive::{Directive, DirectiveKind, DirectiveMatcher};
pub use engine::{ExpansionContext, Expander, expand_text};
pub use error::{Result, YamlincError};
pub use source::{Resolved, Resolver, Source};
