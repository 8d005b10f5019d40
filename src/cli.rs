//! Command-line interface: replay caret scripts against a file
//!
//! ```text
//! sprig notes.sp --script edits.yaml --offset 4 --json
//! ```
//!
//! The script is a YAML list of [`CaretMsg`]s. Messages that do nothing are
//! logged and skipped, like a key press with no effect in an editor.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;
use serde::Serialize;

use crate::caret::{Caret, Position};
use crate::config::EditConfig;
use crate::messages::CaretMsg;
use crate::source::Source;
use crate::update::{update, Context};

/// Structural editing core for a small expression language
#[derive(Parser, Debug)]
#[command(name = "sprig", version, about = "Replay caret edits against a source file")]
pub struct CliArgs {
    /// Source file to edit
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// YAML list of caret messages to apply
    #[arg(short, long, value_name = "YAML")]
    pub script: Option<PathBuf>,

    /// Grapheme offset to start the caret at
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: usize,

    /// Print a JSON summary instead of the edited text
    #[arg(long)]
    pub json: bool,

    /// Write the edited text back to FILE
    #[arg(short, long)]
    pub write: bool,

    /// Read preferences from this file instead of the default location
    #[arg(long, value_name = "YAML")]
    pub config: Option<PathBuf>,
}

/// Final caret state, as printed with `--json`
#[derive(Debug, Serialize)]
pub struct Summary {
    pub code: String,
    pub offset: Option<usize>,
    pub selection: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub applied: usize,
    pub skipped: usize,
}

impl Summary {
    fn new(caret: &Caret, applied: usize, skipped: usize) -> Self {
        let selection = match caret.position() {
            Position::Node(_) => caret.node().map(|node| node.kind().label().to_string()),
            Position::Offset(_) => None,
        };
        Self {
            code: caret.source().code(),
            offset: caret.offset(),
            selection,
            line: caret.line(),
            column: caret.column(),
            applied,
            skipped,
        }
    }
}

pub fn load_script(path: &Path) -> Result<Vec<CaretMsg>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse script {}", path.display()))
}

/// Replay the script and return the final caret with its summary
pub fn replay(source: Source, offset: usize, script: &[CaretMsg], config: &EditConfig) -> (Caret, Summary) {
    let layout = config.layout();
    let ctx = Context::new(config, &layout);
    let mut caret = Caret::at_offset(source.clone(), offset.min(source.len()));
    let (mut applied, mut skipped) = (0, 0);
    for msg in script {
        match update(&caret, msg, &ctx) {
            Some(edit) => {
                caret = edit.into_caret();
                applied += 1;
            }
            None => {
                tracing::info!(?msg, "skipped message with no effect");
                skipped += 1;
            }
        }
    }
    let summary = Summary::new(&caret, applied, skipped);
    (caret, summary)
}

/// Run the command and return what should be printed
pub fn run(args: &CliArgs) -> Result<String> {
    let config = match &args.config {
        Some(path) => EditConfig::load_from(path),
        None => EditConfig::load(),
    };
    let code = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let script = match &args.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    let name = args.file.display().to_string();
    let (caret, summary) = replay(Source::new(&name, &code), args.offset, &script, &config);
    tracing::info!(applied = summary.applied, skipped = summary.skipped, "replayed script");

    if args.write {
        std::fs::write(&args.file, caret.source().code())
            .with_context(|| format!("Failed to write {}", args.file.display()))?;
    }

    if args.json {
        serde_json::to_string_pretty(&summary).context("Failed to serialize summary")
    } else {
        Ok(summary.code)
    }
}
