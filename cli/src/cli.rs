//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for finqa
#[derive(Parser, Debug)]
#[command(name = "finqa")]
#[command(author, version, about = "Cited question answering over indexed financial filings")]
#[command(long_about = r#"
finqa answers a question against an indexed corpus of financial filings and
returns an answer with bracketed citations of the source documents.

Each run generates query variants, decomposes them into routed sub-questions,
retrieves evidence with progressive filter relaxation, synthesizes a cited
draft per variant, scores the drafts, and returns the best one. Runs that
cannot produce a cited answer fail with a typed error instead of guessing.

Configuration files are loaded from (in priority order):
1. FINQA_* environment variables (FINQA_LLM__API_KEY etc.)
2. --config <path>     Explicit config file
3. ./finqa.toml        Project-level config
4. ~/.config/finqa/config.toml   Global config

Example:
  finqa "Tesla total revenue 2019 vs 2018?"
  finqa --year 2019 --filter form=10-k "What risks did Tesla disclose?"
  finqa --json --no-traces "Apple services margin trend?"
"#)]
pub struct Cli {
    /// The question to answer
    pub question: String,

    /// Run variant pipelines one after another instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Answer only the original question, without generated query variants
    #[arg(long)]
    pub no_variants: bool,

    /// Skip answer scoring (selection falls back to the first cited variant)
    #[arg(long)]
    pub no_scoring: bool,

    /// Maximum number of generated query variants
    #[arg(long, value_name = "N")]
    pub max_variants: Option<usize>,

    /// Self-reflection iterations per variant
    #[arg(long, value_name = "N")]
    pub iterations: Option<usize>,

    /// Hits requested per retrieval call
    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,

    /// Preferred fiscal year, merged into the retrieval filter
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    /// Metadata filter entry as key=value (can be specified multiple times)
    #[arg(long, value_name = "KEY=VALUE")]
    pub filter: Vec<String>,

    /// Named scoring strategy
    #[arg(long, value_name = "NAME")]
    pub scoring_model: Option<String>,

    /// Drop per-variant trace detail from the envelope
    #[arg(long)]
    pub no_traces: bool,

    /// Print the full JSON envelope instead of the plain answer
    #[arg(long)]
    pub json: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,
}
