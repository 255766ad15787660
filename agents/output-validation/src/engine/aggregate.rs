//! Result aggregation
//!
//! Semantic validation only runs, and only counts, when the structural
//! stage passed or the level forces escalation.

use std::future::Future;

use crate::contracts::{SemanticResult, StructuralResult, ValidationLevel, ValidationVerdict};

/// Whether the semantic stage should run for this structural outcome
pub fn wants_semantic(structural: &StructuralResult, level: ValidationLevel) -> bool {
    if structural.is_structurally_valid {
        level.runs_semantic()
    } else {
        level.forces_escalation()
    }
}

/// Combine a structural result with a lazily computed semantic one.
///
/// `semantic_fn` is invoked at most once, and only when [`wants_semantic`]
/// holds.
pub async fn aggregate<F, Fut>(
    structural: StructuralResult,
    level: ValidationLevel,
    semantic_fn: F,
) -> ValidationVerdict
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = SemanticResult>,
{
    if !wants_semantic(&structural, level) {
        return ValidationVerdict {
            is_valid: structural.is_structurally_valid,
            structural,
            semantic: None,
        };
    }

    let semantic = semantic_fn().await;
    ValidationVerdict {
        is_valid: structural.is_structurally_valid && semantic.is_semantically_valid,
        structural,
        semantic: Some(semantic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ErrorKind, StructuralError};
    use std::cell::Cell;

    fn broken() -> StructuralResult {
        StructuralResult::from_errors(vec![StructuralError {
            loc: "count".to_string(),
            kind: ErrorKind::OutOfRange,
            msg: "Input should be less than or equal to 10".to_string(),
            suggestion: Some("must be between 1 and 10".to_string()),
        }])
    }

    #[tokio::test]
    async fn test_structure_only_skips_semantic() {
        let called = Cell::new(false);
        let verdict = aggregate(StructuralResult::valid(), ValidationLevel::StructureOnly, || async {
            called.set(true);
            SemanticResult::valid()
        })
        .await;

        assert!(verdict.is_valid);
        assert!(verdict.semantic.is_none());
        assert!(!called.get());
    }

    #[tokio::test]
    async fn test_structural_failure_without_escalation() {
        let verdict = aggregate(broken(), ValidationLevel::Standard, || async {
            SemanticResult::valid()
        })
        .await;
        assert!(!verdict.is_valid);
        assert!(verdict.semantic.is_none());
    }

    #[tokio::test]
    async fn test_strict_escalates_but_stays_invalid() {
        let verdict = aggregate(broken(), ValidationLevel::Strict, || async {
            SemanticResult::valid()
        })
        .await;
        assert!(!verdict.is_valid);
        assert!(verdict.semantic.is_some());
    }

    #[tokio::test]
    async fn test_semantic_result_decides_valid_records() {
        let verdict = aggregate(StructuralResult::valid(), ValidationLevel::Basic, || async {
            SemanticResult::from_issues(vec!["Summary is too short".to_string()], vec![])
        })
        .await;
        assert!(!verdict.is_valid);
        assert_eq!(verdict.semantic.map(|s| s.issues.len()), Some(1));
    }

    #[test]
    fn test_wants_semantic_table() {
        for level in ValidationLevel::all() {
            assert_eq!(
                wants_semantic(&StructuralResult::valid(), level),
                level != ValidationLevel::StructureOnly
            );
            assert_eq!(
                wants_semantic(&broken(), level),
                level == ValidationLevel::Strict
            );
        }
    }
}
