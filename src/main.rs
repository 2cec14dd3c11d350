//! grammar-check - command-line driver for the analysis engine.
//!
//! Reads text from a file (or stdin), builds the language model from the
//! configured corpora and prints the analysis as JSON.
//!
//! # Corpora
//!
//! In load order:
//! - the built-in corpus (unless `--no-builtin` or disabled in the config)
//! - `corpus_paths` from the config file
//! - every `*.txt` in the per-user corpus directory
//! - `--corpus` files from the command line
//!
//! Word-frequency lists come from `word_lists` in the config and `--word-list`.

use anyhow::Context;
use clap::Parser;
use grammar_check::{Analyzer, Config, CorpusBuilder, NgramMode};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "grammar-check")]
#[command(about = "Statistical spelling, grammar and punctuation checker")]
#[command(version)]
struct Args {
    /// Text file to check (reads stdin when omitted)
    input: Option<PathBuf>,

    /// N-gram order used for scoring: bigram or trigram
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<NgramMode>,

    /// Additional plain-text corpus (repeatable)
    #[arg(long = "corpus", value_name = "PATH")]
    corpora: Vec<PathBuf>,

    /// Additional word-frequency list (repeatable)
    #[arg(long = "word-list", value_name = "PATH")]
    word_lists: Vec<PathBuf>,

    /// Do not load the built-in corpus
    #[arg(long)]
    no_builtin: bool,

    /// Print model health instead of analyzing text
    #[arg(long)]
    health: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log per-sentence decisions
    #[arg(short, long)]
    verbose: bool,
}

fn parse_mode(value: &str) -> Result<NgramMode, String> {
    value.parse().map_err(|err: grammar_check::Error| err.to_string())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    // Persist defaults so users get a concrete config file on first run.
    if let Err(err) = config.save() {
        tracing::warn!("Failed to persist config defaults: {err}");
    }

    let mut builder = CorpusBuilder::new();
    if config.use_builtin_corpus && !args.no_builtin {
        builder.add_builtin_corpus();
    }
    for path in config.discover_corpora().iter().chain(&args.corpora) {
        builder.add_file(path)?;
    }
    for path in config.word_lists.iter().chain(&args.word_lists) {
        builder.add_word_list_file(path)?;
    }
    let model = builder
        .build()
        .context("no corpus words available; pass --corpus or enable the built-in corpus")?;

    let analyzer = Analyzer::from_config(model, &config);

    if args.health {
        print_json(&analyzer.health(), args.pretty)?;
        return Ok(());
    }

    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    let mode = args.mode.unwrap_or(config.default_mode);
    let result = analyzer.analyze(&text, mode)?;
    info!(
        errors = result.errors.len(),
        confidence = result.confidence_score,
        rating = grammar_check::score_label(result.confidence_score),
        "analysis complete"
    );

    print_json(&result, args.pretty)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
