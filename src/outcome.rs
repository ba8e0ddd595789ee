//! Test outcomes and the run-wide tally.

use std::fmt;

/// Result of one attempted unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    Success,
    /// Failed, and was annotated `xfail`.
    Failure,
    UnexpectedFailure,
    UnexpectedSuccess,
}

impl TestOutcome {
    /// Label used in the summary table.
    pub fn label(self) -> &'static str {
        match self {
            TestOutcome::Success => "successes",
            TestOutcome::Failure => "expected failures",
            TestOutcome::UnexpectedFailure => "unexpected failures",
            TestOutcome::UnexpectedSuccess => "unexpected successes",
        }
    }

    pub fn is_unexpected(self) -> bool {
        matches!(
            self,
            TestOutcome::UnexpectedFailure | TestOutcome::UnexpectedSuccess
        )
    }

    /// Classifies a finished attempt against its expectation.
    pub fn classify(succeeded: bool, pass_expected: bool) -> Self {
        match (succeeded, pass_expected) {
            (true, true) => TestOutcome::Success,
            (true, false) => TestOutcome::UnexpectedSuccess,
            (false, true) => TestOutcome::UnexpectedFailure,
            (false, false) => TestOutcome::Failure,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counts of each outcome kind across all directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub successes: usize,
    pub expected_failures: usize,
    pub unexpected_failures: usize,
    pub unexpected_successes: usize,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TestOutcome) {
        *self.slot(outcome) += 1;
    }

    pub fn count(&self, outcome: TestOutcome) -> usize {
        match outcome {
            TestOutcome::Success => self.successes,
            TestOutcome::Failure => self.expected_failures,
            TestOutcome::UnexpectedFailure => self.unexpected_failures,
            TestOutcome::UnexpectedSuccess => self.unexpected_successes,
        }
    }

    fn slot(&mut self, outcome: TestOutcome) -> &mut usize {
        match outcome {
            TestOutcome::Success => &mut self.successes,
            TestOutcome::Failure => &mut self.expected_failures,
            TestOutcome::UnexpectedFailure => &mut self.unexpected_failures,
            TestOutcome::UnexpectedSuccess => &mut self.unexpected_successes,
        }
    }

    pub fn unexpected(&self) -> usize {
        self.unexpected_failures + self.unexpected_successes
    }

    pub fn total(&self) -> usize {
        self.successes + self.expected_failures + self.unexpected()
    }

    /// Process exit status for the run: `1` if anything unexpected happened.
    pub fn exit_code(&self) -> i32 {
        if self.unexpected() > 0 {
            1
        } else {
            0
        }
    }

    /// Rows of the summary table, in display order.
    pub fn rows(&self) -> [(TestOutcome, usize); 4] {
        [
            TestOutcome::UnexpectedFailure,
            TestOutcome::UnexpectedSuccess,
            TestOutcome::Failure,
            TestOutcome::Success,
        ]
        .map(|outcome| (outcome, self.count(outcome)))
    }
}

impl Extend<TestOutcome> for OutcomeTally {
    fn extend<I: IntoIterator<Item = TestOutcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

impl FromIterator<TestOutcome> for OutcomeTally {
    fn from_iter<I: IntoIterator<Item = TestOutcome>>(iter: I) -> Self {
        let mut tally = Self::new();
        tally.extend(iter);
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(TestOutcome::classify(true, true), TestOutcome::Success);
        assert_eq!(TestOutcome::classify(true, false), TestOutcome::UnexpectedSuccess);
        assert_eq!(TestOutcome::classify(false, true), TestOutcome::UnexpectedFailure);
        assert_eq!(TestOutcome::classify(false, false), TestOutcome::Failure);
    }

    #[test]
    fn only_unexpected_outcomes_fail_the_run() {
        let tally: OutcomeTally = [TestOutcome::Success, TestOutcome::Failure].into_iter().collect();
        assert_eq!(tally.exit_code(), 0);

        let tally: OutcomeTally = [TestOutcome::Success, TestOutcome::UnexpectedSuccess]
            .into_iter()
            .collect();
        assert_eq!(tally.unexpected(), 1);
        assert_eq!(tally.exit_code(), 1);
    }

    #[test]
    fn empty_run_succeeds() {
        assert_eq!(OutcomeTally::new().exit_code(), 0);
        assert_eq!(OutcomeTally::new().total(), 0);
    }

    #[test]
    fn rows_follow_summary_order() {
        let mut tally = OutcomeTally::new();
        tally.extend([TestOutcome::Success, TestOutcome::Success, TestOutcome::UnexpectedFailure]);
        let labels: Vec<_> = tally.rows().iter().map(|(o, n)| format!("{o}: {n}")).collect();
        assert_eq!(
            labels,
            vec![
                "unexpected failures: 1",
                "unexpected successes: 0",
                "expected failures: 0",
                "successes: 2",
            ]
        );
    }
}
