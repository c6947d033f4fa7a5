use clap::Parser;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use yamlinc::config::{DEFAULT_INCLUDE_TAG, DEFAULT_INDENT_WIDTH, DEFAULT_REPLACE_TAG};
use yamlinc::{ExpandConfig, Expander, Result, YamlincError};

const LONG_HELP: &str = r#"
Directives:
  key: !include file.yaml       - Nest file contents under `key:`
  - !include item.yaml          - Continue file contents on the list item line
  !include file.yaml            - Insert file contents at the directive's indent
  key: !replace file.yaml       - Replace the whole line with file contents

Specifiers:
  path/to/file.yaml             - File, relative to the including file
  parts/*.yaml                  - Every matching file, in lexical order
  $(json data.json), data.json  - JSON file converted to YAML
  $(shell command)              - Output of a shell command
  https://host/file.yaml        - HTTP(S) resource
  -                             - Standard input

Examples:
  # Expand a document
  yamlinc compose.yaml
  # Expand from stdin
  cat compose.yaml | yamlinc
  # Several documents, separated by ---
  yamlinc --multi-doc base.yaml overlay.yaml
  # Four-space nesting
  yamlinc -i 4 compose.yaml
  # Save output to file
  yamlinc compose.yaml -o expanded.yaml
"#;

/// Recursive !include / !replace preprocessor for YAML documents.
///
/// Copyright 2025 0x484558 @ aleph0 s.r.o.
/// Licensed under the EUPL v1.2.
#[derive(Parser, Debug)]
#[command(
    name = "yamlinc",
    version,
    about = "Recursive !include / !replace preprocessor for YAML documents.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Documents to expand; none or '-' reads stdin
    #[arg(value_name = "INPUTS")]
    inputs: Vec<String>,

    /// Spaces added per include nesting level
    #[arg(short, long, value_name = "N", env = "YAMLINC_INDENT", default_value_t = DEFAULT_INDENT_WIDTH)]
    indent: usize,

    /// Write `---` between top-level documents
    #[arg(short, long = "multi-doc", env = "YAMLINC_MULTI_DOC")]
    multi_doc: bool,

    /// Directive keyword that keeps the label and nests the content
    #[arg(long, value_name = "TAG", default_value = DEFAULT_INCLUDE_TAG)]
    include_tag: String,

    /// Directive keyword that replaces the line with the content
    #[arg(long, value_name = "TAG", default_value = DEFAULT_REPLACE_TAG)]
    replace_tag: String,

    /// Base directory for relative top-level inputs
    #[arg(short, long, value_name = "DIR", env = "YAMLINC_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(if e.is_config() { 2 } else { 1 });
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ExpandConfig {
        indent_width: cli.indent,
        multi_document: cli.multi_doc,
        include_tag: cli.include_tag,
        replace_tag: cli.replace_tag,
        ..ExpandConfig::default()
    };
    if let Some(dir) = cli.base_dir {
        config.base_dir = dir.canonicalize().map_err(|e| {
            YamlincError::config(format!("invalid base directory {}: {e}", dir.display()))
        })?;
    }
    config.validate()?;

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => {
            tracing::info!(path = %path.display(), "writing output to file");
            Box::new(io::BufWriter::new(File::create(path)?))
        }
        None => Box::new(io::stdout()),
    };

    let mut expander = Expander::new(config, writer)?;
    expander.run(&cli.inputs).await?;

    tracing::info!("processing complete");
    Ok(())
}
