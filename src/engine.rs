//! Recursive expansion of `!include` / `!replace` directives.
//!
//! Every source being expanded is an [`ExpansionContext`]. A context carries the
//! whitespace prefix for the lines it writes, an optional different prefix for its
//! very first line (used after a `- ` list marker), and the directory relative
//! specifiers inside it resolve against. The specifiers of all contexts currently
//! being expanded are kept on a stack; meeting one of them again is a cycle.

use crate::config::{DOCUMENT_SEPARATOR, ExpandConfig};
use crate::directive::{Directive, DirectiveKind, DirectiveMatcher};
use crate::error::{Result, YamlincError};
use crate::fs_utils::{expand_glob, is_glob_pattern, resolve_path};
use crate::source::{Resolved, Resolver, Source};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// One node of the recursive descent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionContext {
    /// Concrete source identifier (resolved path, URL, wrapper or `-`)
    pub specifier: String,
    /// Prefix for every line this context writes
    pub indent: String,
    /// Prefix for the first line only, if it differs
    pub first_indent: Option<String>,
    /// Directory relative specifiers resolve against
    pub base_dir: PathBuf,
    /// Output offset when this context started; anything past it was written by this context
    start: u64,
}

/// Writer that remembers how many bytes went through it
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Drives expansion of top-level documents into a single output stream
pub struct Expander<W: Write> {
    config: ExpandConfig,
    matcher: DirectiveMatcher,
    resolver: Resolver,
    out: CountingWriter<W>,
    active: Vec<String>,
    documents: usize,
}

impl<W: Write> Expander<W> {
    /// Creates an expander reading standard input from the process
    ///
    /// # Errors
    ///
    /// - `YamlincError::Config` if the configuration is invalid.
    /// - `YamlincError::Network` if the HTTP client cannot be built.
    pub fn new(config: ExpandConfig, writer: W) -> Result<Self> {
        Self::with_resolver(config, Resolver::new()?, writer)
    }

    /// Creates an expander with a caller-supplied resolver
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Config` if the configuration is invalid.
    pub fn with_resolver(config: ExpandConfig, resolver: Resolver, writer: W) -> Result<Self> {
        config.validate()?;
        let matcher = DirectiveMatcher::new(&config.include_tag, &config.replace_tag)?;
        Ok(Self {
            config,
            matcher,
            resolver,
            out: CountingWriter {
                inner: writer,
                written: 0,
            },
            active: Vec::new(),
            documents: 0,
        })
    }

    /// Expands every input in order; no inputs means standard input.
    /// Output is flushed even when a document fails.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any document. Documents already written stay written.
    pub async fn run<S: AsRef<str>>(&mut self, inputs: &[S]) -> Result<()> {
        let result = if inputs.is_empty() {
            self.process_input("-").await
        } else {
            let mut result = Ok(());
            for input in inputs {
                result = self.process_input(input.as_ref()).await;
                if result.is_err() {
                    break;
                }
            }
            result
        };
        let flushed = self.out.flush();
        result?;
        flushed.map_err(Into::into)
    }

    /// Expands one top-level argument. A glob expands to every matching file, each
    /// processed as its own document.
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Glob` for malformed patterns and any error from [`Self::process_document`].
    pub async fn process_input(&mut self, input: &str) -> Result<()> {
        let base_dir = self.config.base_dir.clone();
        let sources = fan_out(input, &base_dir)?;
        if sources.is_empty() {
            warn!(pattern = input, "input pattern matched nothing");
        }
        for specifier in sources {
            self.process_document(&specifier).await?;
        }
        Ok(())
    }

    /// Expands one top-level document
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::CyclicInclude` on cycles and any resolver error from nested sources.
    pub async fn process_document(&mut self, specifier: &str) -> Result<()> {
        if self.config.multi_document && self.documents > 0 {
            writeln!(self.out, "{DOCUMENT_SEPARATOR}")?;
        }
        self.documents += 1;

        info!(specifier, "processing document");
        let base_dir = self.config.base_dir.clone();
        let root = ExpansionContext {
            specifier: identify(specifier, &base_dir),
            indent: String::new(),
            first_indent: None,
            base_dir,
            start: self.out.written,
        };
        self.expand(root).await
    }

    /// Consumes the expander and returns the underlying writer
    pub fn into_inner(self) -> W {
        self.out.inner
    }

    async fn expand(&mut self, context: ExpansionContext) -> Result<()> {
        if self.active.contains(&context.specifier) {
            let mut chain = self.active.clone();
            chain.push(context.specifier.clone());
            return Err(YamlincError::CyclicInclude {
                specifier: context.specifier,
                chain: chain.join(" -> "),
            });
        }

        let resolved = self
            .resolver
            .resolve(&context.specifier, &context.base_dir)
            .await?;
        debug!(
            specifier = %context.specifier,
            lines = resolved.lines.len(),
            depth = self.active.len(),
            "expanding source"
        );

        self.active.push(context.specifier.clone());
        let result = self.expand_lines(&context, &resolved).await;
        self.active.pop();
        result
    }

    async fn expand_lines(
        &mut self,
        context: &ExpansionContext,
        resolved: &Resolved,
    ) -> Result<()> {
        for line in &resolved.lines {
            let Some(directive) = self.matcher.find(line) else {
                self.emit(context, line)?;
                continue;
            };
            trace!(?directive, "directive matched");

            let sources = fan_out(directive.specifier, &resolved.base_dir)?;
            if sources.is_empty() {
                warn!(pattern = directive.specifier, "include pattern matched nothing");
            }

            for specifier in sources {
                let (child, dangling_marker) =
                    self.child_context(context, &directive, specifier, &resolved.base_dir)?;
                let child_start = child.start;

                Box::pin(self.expand(child)).await?;

                if dangling_marker && self.out.written == child_start {
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    /// Writes the label line if the directive has one and builds the child context.
    /// The flag is set when the label was a `-` left without a line terminator.
    fn child_context(
        &mut self,
        parent: &ExpansionContext,
        directive: &Directive<'_>,
        specifier: String,
        base_dir: &Path,
    ) -> Result<(ExpansionContext, bool)> {
        let new_indent = format!("{}{}", parent.indent, directive.indent);
        let label = directive
            .label
            .filter(|_| directive.kind == DirectiveKind::Include);

        let (indent, first_indent, dangling_marker) = match label {
            Some(label) => {
                let prefix = self.prefix_for(parent);
                let indent = format!("{new_indent}{}", self.config.indent_unit());
                if label == "-" {
                    write!(self.out, "{prefix}{}{label}", directive.indent)?;
                    (indent, Some(" ".to_string()), true)
                } else {
                    writeln!(self.out, "{prefix}{}{label}", directive.indent)?;
                    (indent, None, false)
                }
            }
            None => {
                // Nothing written yet: the child's first line takes over the pending prefix
                let first_indent = parent
                    .first_indent
                    .as_ref()
                    .filter(|_| self.out.written == parent.start)
                    .map(|first| format!("{first}{}", directive.indent));
                (new_indent, first_indent, false)
            }
        };

        let child = ExpansionContext {
            specifier,
            indent,
            first_indent,
            base_dir: base_dir.to_path_buf(),
            start: self.out.written,
        };
        Ok((child, dangling_marker))
    }

    fn prefix_for(&self, context: &ExpansionContext) -> String {
        match &context.first_indent {
            Some(first) if self.out.written == context.start => first.clone(),
            _ => context.indent.clone(),
        }
    }

    fn emit(&mut self, context: &ExpansionContext, line: &str) -> Result<()> {
        let prefix = self.prefix_for(context);
        writeln!(self.out, "{prefix}{line}")?;
        Ok(())
    }
}

/// Expands a directive specifier into the concrete sources it names, in order
fn fan_out(specifier: &str, base_dir: &Path) -> Result<Vec<String>> {
    let on_disk = !Source::is_singular(specifier)
        && matches!(Source::parse(specifier), Source::File(_) | Source::Json(_));
    if on_disk && is_glob_pattern(specifier) {
        let matches = expand_glob(specifier, base_dir)?;
        debug!(pattern = specifier, count = matches.len(), "glob expanded");
        return Ok(matches
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect());
    }
    Ok(vec![identify(specifier, base_dir)])
}

/// Canonical identifier for a single specifier: filesystem sources become normalized
/// paths so one file reached by different spellings compares equal
fn identify(specifier: &str, base_dir: &Path) -> String {
    match Source::parse(specifier) {
        Source::File(path) => resolve_path(&path, base_dir).to_string_lossy().into_owned(),
        Source::Json(path) if !Source::is_singular(specifier) => {
            resolve_path(&path, base_dir).to_string_lossy().into_owned()
        }
        _ => specifier.trim().to_string(),
    }
}

/// Expands a document given as text, with relative specifiers resolved against `config.base_dir`
///
/// # Errors
///
/// Returns any error raised while expanding the directives inside `text`.
pub async fn expand_text(text: &str, config: ExpandConfig) -> Result<String> {
    let resolver = Resolver::with_stdin(io::Cursor::new(text.as_bytes().to_vec()))?;
    let mut expander = Expander::with_resolver(config, resolver, Vec::new())?;
    expander.run(&["-"]).await?;
    Ok(String::from_utf8_lossy(&expander.into_inner()).into_owned())
}
