//! Retry and fallback policy
//!
//! Drives one item from its first validated attempt to a terminal
//! state. A failed first verdict earns exactly one retry against the
//! upstream collaborator; a passing retry replaces the first verdict,
//! a failing one does not overwrite its classification. Whatever is
//! still failing after the retry goes through the operator-configured
//! fallback mode: accept on salvage evidence, queue for human review,
//! or fail terminally.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::engine::Engine;
use crate::error::Result;
use crate::review::{ReviewQueue, ReviewRecord};
use crate::types::{Candidate, ErrorKind, ValidationContext, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Operator-configured policy for failed validations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// No fallback; salvaged results are not accepted either
    #[default]
    None,
    /// Accept a failed verdict that carries salvage evidence
    Salvage,
    /// Queue failed items for manual adjudication
    HumanReview,
}

/// What the fallback policy actually did with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackAction {
    None,
    Salvaged,
    HumanReview,
    Failed,
}

impl FallbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackAction::None => "none",
            FallbackAction::Salvaged => "salvaged",
            FallbackAction::HumanReview => "human_review",
            FallbackAction::Failed => "failed",
        }
    }
}

/// Terminal and intermediate states of the per-item state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Initial,
    Validated,
    Salvaged,
    RetryPending,
    Retried,
    HumanReview,
    Failed,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Validated | ItemState::Salvaged | ItemState::HumanReview | ItemState::Failed
        )
    }
}

/// Hint passed to the upstream collaborator for the single retry
#[derive(Debug, Clone, PartialEq)]
pub struct RetryHint {
    /// Lowered sampling temperature for the retry
    pub temperature: f32,
    /// Ask the upstream for its most deterministic decoding
    pub deterministic: bool,
}

impl Default for RetryHint {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            deterministic: true,
        }
    }
}

/// One upstream round-trip: the candidate it produced plus accounting
#[derive(Debug, Clone)]
pub struct Attempt {
    pub candidate: Candidate,
    /// Raw response text, reported downstream when this attempt wins
    pub raw_text: String,
    pub latency_ms: f64,
}

impl Attempt {
    pub fn new(candidate: impl Into<Candidate>, raw_text: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            candidate: candidate.into(),
            raw_text: raw_text.into(),
            latency_ms,
        }
    }
}

/// The caller's handle on the originating request
///
/// The engine performs no I/O itself; re-invoking the upstream model is
/// the caller's business. A timed-out or errored retry is reported as
/// `Err` and treated as a failed retry: the original verdict stands.
pub trait Upstream {
    fn retry(&mut self, ctx: &ValidationContext, hint: &RetryHint) -> Result<Attempt>;
}

/// Policy configuration handed to the driver at construction
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub fallback_mode: FallbackMode,
    pub retry_hint: RetryHint,
    /// Endpoint recorded in human-review rows
    pub endpoint: String,
}

impl PolicyConfig {
    pub fn new(fallback_mode: FallbackMode) -> Self {
        Self {
            fallback_mode,
            ..Default::default()
        }
    }

    pub fn with_retry_hint(mut self, hint: RetryHint) -> Self {
        self.retry_hint = hint;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Reporting row consumed by the surrounding harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFields {
    pub validator_run: bool,
    pub validator_pass: Option<bool>,
    pub validator_error_type: Option<ErrorKind>,
    pub validator_error_info: String,
    pub validator_retried: bool,
    pub fallback_action: FallbackAction,
}

/// Terminal outcome of one item's trip through the policy
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub state: ItemState,
    /// Classification retained for reporting; on a failed retry this is
    /// the first attempt's verdict
    pub verdict: Verdict,
    pub validator_pass: Option<bool>,
    pub retried: bool,
    pub fallback_action: FallbackAction,
    /// Sum of first-attempt and retry latencies
    pub latency_ms: f64,
    /// Response text of the accepted attempt
    pub final_text: String,
}

impl ItemOutcome {
    pub fn report_fields(&self) -> ReportFields {
        ReportFields {
            validator_run: true,
            validator_pass: self.validator_pass,
            validator_error_type: self.verdict.error_kind,
            validator_error_info: self.verdict.detail.clone(),
            validator_retried: self.retried,
            fallback_action: self.fallback_action,
        }
    }
}

/// Drives items through validate, retry, and fallback
pub struct PolicyDriver<'a> {
    engine: &'a Engine,
    config: PolicyConfig,
    review: Option<&'a ReviewQueue>,
}

impl<'a> PolicyDriver<'a> {
    pub fn new(engine: &'a Engine, config: PolicyConfig) -> Self {
        Self {
            engine,
            config,
            review: None,
        }
    }

    /// Attach the human-review queue used by the `human_review` mode
    pub fn with_review_queue(mut self, queue: &'a ReviewQueue) -> Self {
        self.review = Some(queue);
        self
    }

    /// Resolve an item with the upstream collaborator available for the
    /// single permitted retry
    pub fn resolve(
        &self,
        schema_name: &str,
        ctx: &ValidationContext,
        first: Attempt,
        upstream: &mut dyn Upstream,
    ) -> Result<ItemOutcome> {
        self.run(schema_name, ctx, first, Some(upstream))
    }

    /// Resolve an item offline: no upstream, so no retry is issued and
    /// failed verdicts go straight to fallback
    pub fn resolve_local(
        &self,
        schema_name: &str,
        ctx: &ValidationContext,
        first: Attempt,
    ) -> Result<ItemOutcome> {
        self.run(schema_name, ctx, first, None)
    }

    fn run(
        &self,
        schema_name: &str,
        ctx: &ValidationContext,
        first: Attempt,
        upstream: Option<&mut dyn Upstream>,
    ) -> Result<ItemOutcome> {
        let mut latency_ms = first.latency_ms;
        let first_verdict = self.engine.validate(schema_name, &first.candidate, ctx);

        if first_verdict.ok {
            return Ok(self.accept(first_verdict, false, latency_ms, first.raw_text));
        }

        let mut retried = false;
        let final_text = first.raw_text;

        let retryable = first_verdict
            .error_kind
            .map(|k| k.is_retryable())
            .unwrap_or(true);

        if let (Some(upstream), true) = (upstream, retryable) {
            // RETRY_PENDING: exactly one retry, never more
            retried = true;
            debug!(id = %ctx.id, "first verdict failed, issuing single retry");
            match upstream.retry(ctx, &self.config.retry_hint) {
                Ok(attempt) => {
                    latency_ms += attempt.latency_ms;
                    let second = self.engine.validate(schema_name, &attempt.candidate, ctx);
                    if second.ok {
                        // the retry's verdict wins and replaces the first
                        return Ok(self.accept(second, true, latency_ms, attempt.raw_text));
                    }
                    // the retry's failure does not overwrite the first
                    // attempt's classification
                    debug!(id = %ctx.id, "retry also failed, keeping original classification");
                }
                Err(err) => {
                    warn!(id = %ctx.id, error = %err, "retry round-trip failed");
                }
            }
        }

        self.fall_back(ctx, first_verdict, retried, latency_ms, final_text)
    }

    /// Terminal handling for a passing verdict
    fn accept(
        &self,
        verdict: Verdict,
        retried: bool,
        latency_ms: f64,
        final_text: String,
    ) -> ItemOutcome {
        if verdict.is_salvaged_pass() && self.config.fallback_mode == FallbackMode::None {
            // salvage disallowed: a repaired pass is demoted
            debug!("salvaged pass demoted under fallback mode 'none'");
            return ItemOutcome {
                state: ItemState::Failed,
                verdict,
                validator_pass: Some(false),
                retried,
                fallback_action: FallbackAction::Failed,
                latency_ms,
                final_text,
            };
        }
        let state = if verdict.is_salvaged_pass() {
            ItemState::Salvaged
        } else {
            ItemState::Validated
        };
        ItemOutcome {
            state,
            verdict,
            validator_pass: Some(true),
            retried,
            fallback_action: FallbackAction::None,
            latency_ms,
            final_text,
        }
    }

    /// Terminal handling for a verdict still failing after the retry
    fn fall_back(
        &self,
        ctx: &ValidationContext,
        verdict: Verdict,
        retried: bool,
        latency_ms: f64,
        final_text: String,
    ) -> Result<ItemOutcome> {
        match self.config.fallback_mode {
            FallbackMode::Salvage if verdict.has_salvage_evidence() => {
                // the one mode that turns a failed verdict into a pass
                debug!(id = %ctx.id, "accepting failed verdict on salvage evidence");
                Ok(ItemOutcome {
                    state: ItemState::Salvaged,
                    verdict,
                    validator_pass: Some(true),
                    retried,
                    fallback_action: FallbackAction::Salvaged,
                    latency_ms,
                    final_text,
                })
            }
            FallbackMode::HumanReview => {
                if let Some(queue) = self.review {
                    queue.append(&ReviewRecord {
                        id: &ctx.id,
                        prompt_type: &ctx.prompt_type,
                        endpoint: &self.config.endpoint,
                        error_kind: verdict.error_kind,
                        error_info: &verdict.detail,
                        original_response: &final_text,
                    })?;
                }
                Ok(ItemOutcome {
                    state: ItemState::HumanReview,
                    verdict,
                    validator_pass: Some(false),
                    retried,
                    fallback_action: FallbackAction::HumanReview,
                    latency_ms,
                    final_text,
                })
            }
            _ => Ok(ItemOutcome {
                state: ItemState::Failed,
                verdict,
                validator_pass: Some(false),
                retried,
                fallback_action: FallbackAction::Failed,
                latency_ms,
                final_text,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_action_wire_names() {
        assert_eq!(FallbackAction::HumanReview.as_str(), "human_review");
        assert_eq!(
            serde_json::to_string(&FallbackMode::HumanReview).unwrap(),
            "\"human_review\""
        );
    }

    #[test]
    fn terminal_states() {
        assert!(ItemState::Validated.is_terminal());
        assert!(ItemState::Failed.is_terminal());
        assert!(!ItemState::RetryPending.is_terminal());
        assert!(!ItemState::Initial.is_terminal());
    }

    #[test]
    fn retry_hint_defaults_to_deterministic() {
        let hint = RetryHint::default();
        assert_eq!(hint.temperature, 0.0);
        assert!(hint.deterministic);
    }
}
