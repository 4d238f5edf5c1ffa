//! Validator pass-rate summary over a results CSV
//!
//! Reads a results file produced by the validate command or the eval
//! harness and prints per-prompt-type pass rates, flagging any type
//! that falls under the acceptance threshold.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::cli::PassRatesArgs;
use crate::csvio;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Default)]
struct TypeCounts {
    total: usize,
    validated: usize,
    passed: usize,
    failing_rows: Vec<String>,
}

pub fn handle_pass_rates(args: PassRatesArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.results)
        .with_context(|| format!("reading results from {}", args.results.display()))?;
    let mut lines = raw.lines();

    let header = match lines.next() {
        Some(header) => csvio::split(header),
        None => bail!("results file is empty"),
    };
    let col = |name: &str| header.iter().position(|h| h == name);

    let id_col = col("id").or_else(|| col("prompt_id"));
    let type_col = col("prompt_type");
    let pass_col = col("validator_pass").or_else(|| col("status"));
    let run_col = col("validator_run");
    let error_col = col("validator_error_type").or_else(|| col("error_type"));
    let Some(pass_col) = pass_col else {
        bail!("results file has no validator_pass or status column");
    };

    let mut by_type: BTreeMap<String, TypeCounts> = BTreeMap::new();
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let fields = csvio::split(line);
        let field = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i)).map(String::as_str).unwrap_or("")
        };

        let prompt_type = match field(type_col) {
            "" => "unknown".to_string(),
            t => t.to_string(),
        };
        let counts = by_type.entry(prompt_type).or_default();
        counts.total += 1;

        // rows without a validator_run column count as validated
        let ran = match field(run_col) {
            "" => run_col.is_none(),
            v => is_truthy(v),
        };
        if !ran {
            continue;
        }
        counts.validated += 1;

        let passed = match field(Some(pass_col)) {
            "pass" => true,
            "fail" => false,
            v => is_truthy(v),
        };
        if passed {
            counts.passed += 1;
        } else {
            counts.failing_rows.push(format!(
                "id={} error_type={}",
                field(id_col),
                field(error_col),
            ));
        }
    }

    println!("Validator pass rates by prompt_type:");
    let mut all_ok = true;
    for (prompt_type, counts) in &by_type {
        let rate = if counts.validated > 0 {
            counts.passed as f64 / counts.validated as f64 * 100.0
        } else {
            100.0
        };
        let line = format!(
            "- {}: validated={} passed={} pass_rate={:.2}%",
            prompt_type, counts.validated, counts.passed, rate
        );
        if counts.validated > 0 && rate < args.threshold {
            all_ok = false;
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }

    if !all_ok {
        println!("\nFailures (sample rows):");
        for counts in by_type.values() {
            for row in counts.failing_rows.iter().take(10) {
                println!("  {row}");
            }
        }
    }

    Ok(())
}

fn is_truthy(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_harness_conventions() {
        assert!(is_truthy("true"));
        assert!(is_truthy("True"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
    }

    #[test]
    fn reads_results_from_validate_command_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            "id,prompt_type,status,error_type,info,salvaged_fields,fallback_action\n\
             a,interview_qa,pass,,,,none\n\
             b,interview_qa,fail,format_error,invalid_json,,failed\n",
        )
        .unwrap();

        let args = PassRatesArgs {
            results: path,
            threshold: 98.0,
        };
        handle_pass_rates(args).unwrap();
    }
}
