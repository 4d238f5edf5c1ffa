//! Command-line argument definitions
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use clap::{Args, Parser, Subcommand, ValueEnum};
use salvor_core::FallbackMode;
use std::path::PathBuf;

/// Validate and salvage model outputs against response schemas
#[derive(Debug, Parser)]
#[command(name = "salvor", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a JSONL corpus of model outputs against a schema
    Validate(ValidateArgs),
    /// Summarize validator pass rates from a results CSV
    PassRates(PassRatesArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Directory containing schema JSON files
    #[arg(long, value_name = "DIR")]
    pub schemas: PathBuf,

    /// Schema name to validate against (the schema file's stem)
    #[arg(long, value_name = "NAME")]
    pub schema: String,

    /// JSONL file of outputs: {"prompt_id": "...", "output": ...}
    #[arg(long, value_name = "FILE")]
    pub outputs: PathBuf,

    /// Write per-item results to this CSV file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Attempt embedded-JSON extraction before validating text outputs
    /// that do not parse directly
    #[arg(long)]
    pub extract_embedded: bool,

    /// Fallback policy applied to items that fail validation
    #[arg(long, value_enum, default_value_t = FallbackModeArg::None)]
    pub fallback_mode: FallbackModeArg,

    /// Append items needing manual adjudication to this queue CSV
    /// (used with --fallback-mode human-review)
    #[arg(long, value_name = "FILE")]
    pub review_queue: Option<PathBuf>,

    /// Prompt type recorded for entries that do not carry their own
    #[arg(long, default_value = "unknown")]
    pub prompt_type: String,
}

#[derive(Debug, Args)]
pub struct PassRatesArgs {
    /// Results CSV produced by the validate command or the eval harness
    #[arg(long, value_name = "FILE")]
    pub results: PathBuf,

    /// Pass-rate threshold (percent) below which a prompt type is flagged
    #[arg(long, default_value_t = 98.0)]
    pub threshold: f64,
}

/// Clap-facing mirror of the engine's fallback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackModeArg {
    None,
    Salvage,
    HumanReview,
}

impl From<FallbackModeArg> for FallbackMode {
    fn from(arg: FallbackModeArg) -> Self {
        match arg {
            FallbackModeArg::None => FallbackMode::None,
            FallbackModeArg::Salvage => FallbackMode::Salvage,
            FallbackModeArg::HumanReview => FallbackMode::HumanReview,
        }
    }
}
