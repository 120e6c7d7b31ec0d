//! Results of individual policy checks.

use serde::Serialize;

#[cfg(test)]
#[path = "assertion_tests.rs"]
mod tests;

/// Outcome of one policy check.
///
/// `message` describes the violation and is what gets reported when the check
/// is not satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub message: String,
    pub satisfied: bool,
}

impl Assertion {
    pub fn check(satisfied: bool, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            satisfied,
        }
    }

    /// An assertion that is never satisfied.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::check(false, message)
    }
}

/// All assertions produced for one repository in a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoDiagnosis {
    repository: String,
    assertions: Vec<Assertion>,
    has_issues: bool,
}

impl RepoDiagnosis {
    pub fn new(repository: impl Into<String>, assertions: Vec<Assertion>) -> Self {
        let has_issues = assertions.iter().any(|a| !a.satisfied);
        Self {
            repository: repository.into(),
            assertions,
            has_issues,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Every assertion, in evaluation order.
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn has_issues(&self) -> bool {
        self.has_issues
    }

    /// The unsatisfied assertions, in evaluation order.
    pub fn issues(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter().filter(|a| !a.satisfied)
    }

    pub fn issue_messages(&self) -> Vec<String> {
        self.issues().map(|a| a.message.clone()).collect()
    }
}
