#![forbid(unsafe_code)]

//! Command-line driver for the Slate assembly optimiser.
//!
//! Reads a textual listing, runs the inlining pass with the given lifetime
//! assumptions, and prints the optimised listing to stdout. Diagnostics and
//! `RUST_LOG`-controlled pass tracing go to stderr so the output stays
//! pipeable.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use slate_asm::{text, VmVersion};
use slate_opt::{optimise, InlineConfig};

#[derive(Debug, Parser)]
#[command(about = "Inline-optimise a Slate assembly listing")]
struct Args {
    /// Input listing (`-` reads stdin).
    input: PathBuf,

    /// Assumed number of program executions over its lifetime.
    #[arg(long, default_value_t = 200)]
    runs: u64,

    /// Price code bytes as constructor (transaction-data) bytes.
    #[arg(long)]
    constructor: bool,

    /// Target VM revision (`v1` or `v2`).
    #[arg(long, default_value = "v2")]
    vm: String,

    /// Report item counts to stderr.
    #[arg(long)]
    stats: bool,
}

fn parse_version(token: &str) -> Result<VmVersion> {
    match token {
        "v1" => Ok(VmVersion::V1),
        "v2" => Ok(VmVersion::V2),
        other => bail!("unknown VM revision `{other}` (expected `v1` or `v2`)"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = if args.input.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading stdin")?
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?
    };

    let mut items = text::parse_program(&source)?;
    let before = items.len();

    let config = InlineConfig {
        version: parse_version(&args.vm)?,
        expected_runs: args.runs,
        is_constructor_context: args.constructor,
    };
    let changed = optimise(&mut items, &config);

    if args.stats {
        eprintln!(
            "{} items in, {} items out ({})",
            before,
            items.len(),
            if changed { "changed" } else { "unchanged" }
        );
    }

    print!("{}", text::format_program(&items));
    Ok(())
}
