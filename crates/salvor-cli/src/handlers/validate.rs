//! Offline corpus validation
//!
//! Reads a JSONL file of model outputs, validates each entry against
//! the selected schema, applies the configured fallback policy, and
//! prints a summary that keeps clean passes, salvaged passes, and hard
//! failures apart. No upstream is available offline, so no retries are
//! issued.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::cli::ValidateArgs;
use crate::csvio;
use anyhow::{Context, Result};
use colored::Colorize;
use salvor_core::{
    extract_embedded_json, Attempt, Candidate, Engine, ItemOutcome, PolicyConfig, PolicyDriver,
    ReviewQueue, ValidationContext,
};
use salvor_schemas::SchemaRegistry;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tracing::info;

/// Tally of terminal outcomes across one corpus
#[derive(Debug, Default)]
pub struct Summary {
    pub total: usize,
    pub clean: usize,
    pub salvaged: usize,
    pub failed: usize,
    pub failures: Vec<FailureLine>,
}

#[derive(Debug)]
pub struct FailureLine {
    pub id: String,
    pub error_type: String,
    pub info: String,
}

impl Summary {
    fn record(&mut self, id: &str, outcome: &ItemOutcome) {
        self.total += 1;
        match outcome.validator_pass {
            Some(true) if outcome.verdict.is_clean_pass() => self.clean += 1,
            Some(true) => self.salvaged += 1,
            _ => {
                self.failed += 1;
                self.failures.push(FailureLine {
                    id: id.to_string(),
                    error_type: outcome
                        .verdict
                        .error_kind
                        .map(|k| k.as_str().to_string())
                        .unwrap_or_default(),
                    info: outcome.verdict.detail.clone(),
                });
            }
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.clean + self.salvaged) as f64 / self.total as f64 * 100.0
    }
}

pub fn handle_validate(args: ValidateArgs) -> Result<()> {
    let mut registry = SchemaRegistry::new();
    let loaded = registry
        .load_dir(&args.schemas)
        .with_context(|| format!("loading schemas from {}", args.schemas.display()))?;
    info!(loaded, "schemas registered");

    let engine = Engine::new(Arc::new(registry));
    let policy = PolicyConfig::new(args.fallback_mode.into()).with_endpoint("offline");
    let queue = args.review_queue.as_ref().map(ReviewQueue::new);
    let mut driver = PolicyDriver::new(&engine, policy);
    if let Some(queue) = queue.as_ref() {
        driver = driver.with_review_queue(queue);
    }

    let raw = fs::read_to_string(&args.outputs)
        .with_context(|| format!("reading outputs from {}", args.outputs.display()))?;

    let mut summary = Summary::default();
    let mut csv_rows: Vec<String> = Vec::new();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: Value = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(_) => {
                summary.total += 1;
                summary.failed += 1;
                summary.failures.push(FailureLine {
                    id: String::new(),
                    error_type: "format_error".to_string(),
                    info: "invalid_line".to_string(),
                });
                csv_rows.push(csvio::record(&[
                    "",
                    &args.prompt_type,
                    "fail",
                    "format_error",
                    "invalid_line",
                    "",
                    "none",
                ]));
                continue;
            }
        };

        let id = entry
            .get("prompt_id")
            .or_else(|| entry.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let prompt_type = entry
            .get("prompt_type")
            .and_then(Value::as_str)
            .unwrap_or(&args.prompt_type)
            .to_string();
        let latency_ms = entry
            .get("latency_ms")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let output = entry.get("output").cloned().unwrap_or(Value::Null);
        let (candidate, raw_text) = candidate_from(output, args.extract_embedded);

        let ctx = ValidationContext::new(&id, &prompt_type);
        let outcome = driver.resolve_local(
            &args.schema,
            &ctx,
            Attempt::new(candidate, raw_text, latency_ms),
        )?;

        summary.record(&id, &outcome);
        csv_rows.push(result_row(&id, &prompt_type, &outcome));
    }

    if let Some(path) = &args.csv {
        let file = File::create(path)
            .with_context(|| format!("creating results CSV at {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "id,prompt_type,status,error_type,info,salvaged_fields,fallback_action"
        )?;
        for row in &csv_rows {
            writeln!(writer, "{row}")?;
        }
        println!("Wrote CSV results to {}", path.display());
    }

    print_summary(&args.schema, &summary);
    Ok(())
}

/// Build the candidate for one output entry
///
/// Text that does not parse directly gets one embedded-extraction pass
/// when the operator opted in; the extracted payload replaces the raw
/// text for validation while reports keep the original.
fn candidate_from(output: Value, extract_embedded: bool) -> (Candidate, String) {
    match output {
        Value::String(text) => {
            let candidate = if extract_embedded
                && serde_json::from_str::<Value>(&text).is_err()
            {
                match extract_embedded_json(&text) {
                    Some(embedded) => Candidate::Text(embedded),
                    None => Candidate::Text(text.clone()),
                }
            } else {
                Candidate::Text(text.clone())
            };
            (candidate, text)
        }
        other => {
            let raw = other.to_string();
            (Candidate::Structured(other), raw)
        }
    }
}

fn result_row(id: &str, prompt_type: &str, outcome: &ItemOutcome) -> String {
    let status = match outcome.validator_pass {
        Some(true) => "pass",
        _ => "fail",
    };
    let error_type = outcome
        .verdict
        .error_kind
        .map(|k| k.as_str())
        .unwrap_or("");
    let salvaged = outcome.verdict.salvaged_fields.join(";");
    csvio::record(&[
        id,
        prompt_type,
        status,
        error_type,
        &outcome.verdict.detail,
        &salvaged,
        outcome.fallback_action.as_str(),
    ])
}

fn print_summary(schema: &str, summary: &Summary) {
    println!();
    println!("Schema: {schema}");
    println!(
        "Total={} PassRate={:.2}%",
        summary.total,
        summary.pass_rate()
    );
    println!(
        "  {} {}",
        "clean pass:".green(),
        summary.clean.to_string().green()
    );
    println!(
        "  {} {}",
        "salvaged pass:".yellow(),
        summary.salvaged.to_string().yellow()
    );
    println!(
        "  {} {}",
        "hard fail:".red(),
        summary.failed.to_string().red()
    );

    if !summary.failures.is_empty() {
        println!("\nFailures:");
        for failure in &summary.failures {
            println!(
                "  id={} error={} info={}",
                failure.id, failure.error_type, failure.info
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvor_core::{ErrorKind, FallbackAction, ItemState, Verdict};

    fn outcome(verdict: Verdict, pass: Option<bool>) -> ItemOutcome {
        ItemOutcome {
            state: ItemState::Validated,
            verdict,
            validator_pass: pass,
            retried: false,
            fallback_action: FallbackAction::None,
            latency_ms: 0.0,
            final_text: String::new(),
        }
    }

    #[test]
    fn summary_separates_clean_salvaged_and_failed() {
        let mut summary = Summary::default();
        summary.record("a", &outcome(Verdict::clean_pass(), Some(true)));
        let salvaged = Verdict {
            ok: true,
            error_kind: Some(ErrorKind::SalvagedMissing),
            detail: "salvaged:[answer]".to_string(),
            salvaged_fields: vec!["answer".to_string()],
        };
        summary.record("b", &outcome(salvaged, Some(true)));
        summary.record(
            "c",
            &outcome(Verdict::fail(ErrorKind::FormatError, "invalid_json"), Some(false)),
        );

        assert_eq!(summary.total, 3);
        assert_eq!(summary.clean, 1);
        assert_eq!(summary.salvaged, 1);
        assert_eq!(summary.failed, 1);
        assert!((summary.pass_rate() - 66.66).abs() < 0.1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].error_type, "format_error");
    }

    #[test]
    fn embedded_extraction_only_when_direct_parse_fails() {
        let fenced = "sure!\n```json\n{\"answer\": \"ok\"}\n```".to_string();
        let (candidate, raw) = candidate_from(Value::String(fenced.clone()), true);
        assert_eq!(raw, fenced);
        match candidate {
            Candidate::Text(text) => assert_eq!(text, "{\"answer\": \"ok\"}"),
            _ => panic!("expected text candidate"),
        }

        // direct JSON is left alone even with the flag on
        let direct = "{\"answer\": \"ok\"}".to_string();
        let (candidate, _) = candidate_from(Value::String(direct.clone()), true);
        match candidate {
            Candidate::Text(text) => assert_eq!(text, direct),
            _ => panic!("expected text candidate"),
        }
    }

    #[test]
    fn result_row_includes_salvage_and_action() {
        let salvaged = Verdict {
            ok: true,
            error_kind: Some(ErrorKind::SalvagedMissing),
            detail: "salvaged:[answer, confidence]".to_string(),
            salvaged_fields: vec!["answer".to_string(), "confidence".to_string()],
        };
        let row = result_row("intv-1", "interview_qa", &outcome(salvaged, Some(true)));
        assert_eq!(
            row,
            "intv-1,interview_qa,pass,salvaged_missing,\"salvaged:[answer, confidence]\",answer;confidence,none"
        );
    }
}
