//! Verdict classification
//!
//! Collapses the checker's step-by-step outcome into a single verdict.
//! A hard failure wins and keeps whatever salvage had accumulated for
//! observability; a repair-only run classifies as salvaged; anything
//! else is a clean pass.

use crate::checker::CheckFailure;
use crate::salvage::SalvageLog;
use crate::types::{ErrorKind, Verdict};

pub(crate) fn classify(failure: Option<CheckFailure>, log: SalvageLog) -> Verdict {
    match failure {
        Some(failure) => Verdict {
            ok: false,
            error_kind: Some(failure.kind),
            detail: failure.detail,
            salvaged_fields: log.into_fields(),
        },
        None if !log.is_empty() => {
            let detail = format!("salvaged:[{}]", log.sorted().join(", "));
            Verdict {
                ok: true,
                error_kind: Some(ErrorKind::SalvagedMissing),
                detail,
                salvaged_fields: log.into_fields(),
            }
        }
        None => Verdict::clean_pass(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_failure_keeps_partial_salvage() {
        let mut log = SalvageLog::new();
        log.record("confidence");
        let failure = CheckFailure {
            kind: ErrorKind::SemanticError,
            detail: "answer_too_short".to_string(),
        };
        let verdict = classify(Some(failure), log);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::SemanticError));
        assert_eq!(verdict.salvaged_fields, ["confidence"]);
    }

    #[test]
    fn salvage_only_is_a_salvaged_pass() {
        let mut log = SalvageLog::new();
        log.record("confidence");
        log.record("answer");
        let verdict = classify(None, log);
        assert!(verdict.is_salvaged_pass());
        // detail sorts for stability, salvaged_fields keeps repair order
        assert_eq!(verdict.detail, "salvaged:[answer, confidence]");
        assert_eq!(verdict.salvaged_fields, ["confidence", "answer"]);
    }

    #[test]
    fn no_failure_no_salvage_is_clean() {
        let verdict = classify(None, SalvageLog::new());
        assert!(verdict.is_clean_pass());
        assert!(verdict.detail.is_empty());
    }
}
