//! Engine configuration
//!
//! One explicit struct holds every tunable the pipeline consults, so
//! call sites never reach for scattered hardcoded defaults.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

/// Sentinel inserted when no answer-like value can be recovered
pub const SALVAGE_PLACEHOLDER: &str = "[MISSING - SALVAGED_PLACEHOLDER]";

/// Configuration for the validation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transport-injected keys stripped before property checks
    pub strip_keys: Vec<String>,
    /// Schema name that receives the score-specific salvage behavior
    pub scoring_schema: String,
    /// Default score when a score field is unrecoverable
    ///
    /// Inherited from the system this engine replaces; generous on
    /// purpose there, configurable here.
    pub score_default: f64,
    /// Default confidence when a confidence field is unrecoverable
    pub confidence_default: f64,
    /// Placeholder text inserted when answer salvage finds nothing
    pub placeholder: String,
    /// Follow-up values at or above this length (chars) are not
    /// auto-punctuated; they fail the question rule instead
    pub question_append_limit: usize,
    /// Cap (chars) on the prefix taken when salvaging a follow-up
    /// question from answer text
    pub question_prefix_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strip_keys: [
                "question",
                "questionNumber",
                "question_number",
                "sessionId",
                "session_id",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            scoring_schema: "scoring".to_string(),
            score_default: 85.0,
            confidence_default: 0.85,
            placeholder: SALVAGE_PLACEHOLDER.to_string(),
            question_append_limit: 300,
            question_prefix_cap: 200,
        }
    }
}

impl EngineConfig {
    /// Replace the transport-key strip list
    pub fn with_strip_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strip_keys = keys.into_iter().map(|k| k.into()).collect();
        self
    }

    /// Name the schema that gets score-specific salvage
    pub fn with_scoring_schema(mut self, name: impl Into<String>) -> Self {
        self.scoring_schema = name.into();
        self
    }

    /// Override the unrecoverable-score default
    pub fn with_score_default(mut self, score: f64) -> Self {
        self.score_default = score;
        self
    }

    /// Override the unrecoverable-confidence default
    pub fn with_confidence_default(mut self, confidence: f64) -> Self {
        self.confidence_default = confidence;
        self
    }

    /// Override the answer salvage placeholder
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}
