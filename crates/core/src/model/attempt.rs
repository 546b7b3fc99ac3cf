use serde::{Deserialize, Serialize};

/// Verdict for one challenge test, as reported by the external runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub passed: bool,
    pub message: String,
}

impl TestOutcome {
    #[must_use]
    pub fn new(passed: bool, message: impl Into<String>) -> Self {
        Self {
            passed,
            message: message.into(),
        }
    }
}

/// Ordered outcomes of a single attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptReport {
    outcomes: Vec<TestOutcome>,
}

impl AttemptReport {
    #[must_use]
    pub fn new(outcomes: Vec<TestOutcome>) -> Self {
        Self { outcomes }
    }

    #[must_use]
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// True iff at least one test ran and none failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.passed)
    }

    #[must_use]
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_does_not_pass() {
        assert!(!AttemptReport::default().all_passed());
    }

    #[test]
    fn single_failure_fails_attempt() {
        let report = AttemptReport::new(vec![
            TestOutcome::new(true, "is a string"),
            TestOutcome::new(false, "is a number"),
        ]);
        assert!(!report.all_passed());
        let failed: Vec<_> = report.failures().map(|o| o.message.as_str()).collect();
        assert_eq!(failed, ["is a number"]);
    }

    #[test]
    fn all_green_passes() {
        let report = AttemptReport::new(vec![TestOutcome::new(true, "ok")]);
        assert!(report.all_passed());
    }
}
