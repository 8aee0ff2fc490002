//! Run-level rollup and report assembly

use crate::models::{Report, RunMetadata, SuiteRecord};

/// Run-level pass/fail, derived from suite outcomes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub passed: bool,
    pub failed: bool,
}

impl Default for RunOutcome {
    fn default() -> Self {
        Self {
            passed: true,
            failed: false,
        }
    }
}

impl RunOutcome {
    /// Failed as soon as any suite failed
    pub fn from_suites(suites: &[SuiteRecord]) -> Self {
        if suites.iter().any(SuiteRecord::is_failed) {
            Self {
                passed: false,
                failed: true,
            }
        } else {
            Self::default()
        }
    }
}

/// Combines run metadata, the rollup and suite records into a report
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(metadata: RunMetadata, suites: Vec<SuiteRecord>) -> Report {
        let outcome = RunOutcome::from_suites(&suites);
        Report {
            metadata,
            passed: outcome.passed,
            failed: outcome.failed,
            suites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultFragment;
    use serde_json::json;

    fn suite(title: &str, failed: u64) -> SuiteRecord {
        let body = json!({
            "title": title,
            "spec_file": "a.js",
            "passed": 1 - failed.min(1),
            "failed": failed
        })
        .to_string();
        SuiteRecord::from_fragment(&ResultFragment::from_json(&body, None).unwrap())
    }

    #[test]
    fn test_empty_run_passes() {
        let outcome = RunOutcome::from_suites(&[]);
        assert!(outcome.passed);
        assert!(!outcome.failed);
    }

    #[test]
    fn test_any_failure_fails_run() {
        let outcome = RunOutcome::from_suites(&[suite("a", 1), suite("b", 0)]);
        assert!(outcome.failed);
        assert!(!outcome.passed);

        let reversed = RunOutcome::from_suites(&[suite("b", 0), suite("a", 1)]);
        assert_eq!(outcome, reversed);
    }

    #[test]
    fn test_all_passing() {
        let outcome = RunOutcome::from_suites(&[suite("a", 0), suite("b", 0)]);
        assert_eq!(outcome, RunOutcome::default());
    }

    #[test]
    fn test_assemble_keeps_suite_order() {
        let metadata = RunMetadata {
            project_id: "p".to_string(),
            ..Default::default()
        };
        let suites = vec![suite("x", 0), suite("y", 2)];
        let report = ReportAssembler::assemble(metadata.clone(), suites);

        assert_eq!(report.metadata, metadata);
        assert!(report.failed);
        assert!(!report.passed);
        assert_eq!(report.suites[0].title, "x");
        assert_eq!(report.suites[1].title, "y");
    }
}
