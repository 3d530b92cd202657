//! Per-service results and the aggregated report.

use serde::{Serialize, Serializer};

use crate::service::{Availability, Descriptor, ServiceError};

/// Outcome of checking one name on one service.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    #[serde(flatten)]
    descriptor: Descriptor,
    name: String,
    available: Option<bool>,
    #[serde(serialize_with = "serialize_error")]
    error: Option<ServiceError>,
}

impl CheckResult {
    /// The service answered; `Unknown` leaves `available` empty.
    pub fn passed(descriptor: Descriptor, name: impl Into<String>, availability: Availability) -> Self {
        Self {
            descriptor,
            name: name.into(),
            available: availability.as_bool(),
            error: None,
        }
    }

    /// The check failed; `available` is always empty.
    pub fn failed(descriptor: Descriptor, name: impl Into<String>, error: ServiceError) -> Self {
        Self {
            descriptor,
            name: name.into(),
            available: None,
            error: Some(error),
        }
    }

    /// Which service this result is for.
    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The checked name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Some(true)` if free, `Some(false)` if taken, `None` if failed or inconclusive.
    #[must_use]
    pub fn available(&self) -> Option<bool> {
        self.available
    }

    /// Why the check failed, if it did.
    #[must_use]
    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    /// Whether the service produced an answer.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_error<S: Serializer>(error: &Option<ServiceError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Counts over a set of results.
///
/// `passed + failed == total` and `available + unavailable == passed`. A
/// passed check with an inconclusive answer counts as unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    /// Number of services checked.
    pub total: usize,
    /// Checks that produced an answer.
    pub passed: usize,
    /// Checks that errored.
    pub failed: usize,
    /// Passed checks that found the name free.
    pub available: usize,
    /// Passed checks that did not find the name free.
    pub unavailable: usize,
}

impl Stats {
    /// Tally `results`.
    #[must_use]
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut stats = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            if !result.is_passed() {
                stats.failed += 1;
            } else if result.available() == Some(true) {
                stats.passed += 1;
                stats.available += 1;
            } else {
                stats.passed += 1;
                stats.unavailable += 1;
            }
        }
        stats
    }

    /// `None` if any check failed, otherwise whether every check found the name free.
    #[must_use]
    pub fn unique(&self) -> Option<bool> {
        if self.failed > 0 {
            None
        } else {
            Some(self.available == self.passed)
        }
    }
}

/// Everything learned about one name in one run.
#[derive(Debug, Serialize)]
pub struct Report {
    name: String,
    results: Vec<CheckResult>,
    stats: Stats,
    unique: Option<bool>,
}

impl Report {
    /// Aggregate `results`, which must already be in check order.
    #[must_use]
    pub fn new(name: impl Into<String>, results: Vec<CheckResult>) -> Self {
        let stats = Stats::from_results(&results);
        Self {
            name: name.into(),
            unique: stats.unique(),
            results,
            stats,
        }
    }

    /// The checked name, normalised.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One result per service, in check order.
    #[must_use]
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Aggregated counts.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// `Some(true)` if the name is free everywhere, `Some(false)` if taken
    /// somewhere, `None` if a failure prevents saying.
    #[must_use]
    pub fn unique(&self) -> Option<bool> {
        self.unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportError;

    fn github() -> Descriptor {
        Descriptor::new("tech", "GitHub")
    }

    fn passed(availability: Availability) -> CheckResult {
        CheckResult::passed(github(), "zz9xq7", availability)
    }

    fn failed() -> CheckResult {
        CheckResult::failed(github(), "zz9xq7", TransportError::TimedOut.into())
    }

    fn stats(total: usize, passed: usize, failed: usize, available: usize, unavailable: usize) -> Stats {
        Stats {
            total,
            passed,
            failed,
            available,
            unavailable,
        }
    }

    #[test]
    fn single_available() {
        let report = Report::new("zz9xq7", vec![passed(Availability::Available)]);
        assert_eq!(report.stats(), stats(1, 1, 0, 1, 0));
        assert_eq!(report.unique(), Some(true));
    }

    #[test]
    fn single_taken() {
        let report = Report::new("zz9xq7", vec![passed(Availability::Taken)]);
        assert_eq!(report.stats(), stats(1, 1, 0, 0, 1));
        assert_eq!(report.unique(), Some(false));
    }

    #[test]
    fn single_failure() {
        let report = Report::new("zz9xq7", vec![failed()]);
        assert_eq!(report.stats(), stats(1, 0, 1, 0, 0));
        assert_eq!(report.unique(), None);
        assert_eq!(report.results()[0].available(), None);
    }

    #[test]
    fn failure_wins_over_taken() {
        let report = Report::new("zz9xq7", vec![passed(Availability::Taken), failed()]);
        assert_eq!(report.unique(), None);
    }

    // An inconclusive answer is a pass that cannot support a uniqueness claim.
    #[test]
    fn unknown_counts_as_passed_and_unavailable() {
        let report = Report::new(
            "zz9xq7",
            vec![passed(Availability::Available), passed(Availability::Unknown)],
        );
        assert_eq!(report.results()[1].available(), None);
        assert!(report.results()[1].error().is_none());
        assert_eq!(report.stats(), stats(2, 2, 0, 1, 1));
        assert_eq!(report.unique(), Some(false));
    }

    #[test]
    fn empty_report_is_vacuously_unique() {
        let report = Report::new("zz9xq7", Vec::new());
        assert_eq!(report.stats(), Stats::default());
        assert_eq!(report.unique(), Some(true));
    }

    #[test]
    fn serializes_flat_results_with_error_messages() {
        let report = Report::new("zz9xq7", vec![passed(Availability::Available), failed()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "zz9xq7");
        assert_eq!(json["unique"], serde_json::Value::Null);
        assert_eq!(json["stats"]["failed"], 1);
        assert_eq!(json["results"][0]["category"], "tech");
        assert_eq!(json["results"][0]["available"], true);
        assert_eq!(json["results"][1]["error"], "request timed out");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn outcome() -> impl Strategy<Value = Option<Availability>> {
            prop_oneof![
                Just(None),
                Just(Some(Availability::Available)),
                Just(Some(Availability::Taken)),
                Just(Some(Availability::Unknown)),
            ]
        }

        proptest! {
            #[test]
            fn stats_invariants_hold(outcomes in proptest::collection::vec(outcome(), 0..32)) {
                let results: Vec<_> = outcomes
                    .iter()
                    .map(|o| match o {
                        Some(a) => passed(*a),
                        None => failed(),
                    })
                    .collect();
                let report = Report::new("zz9xq7", results);
                let s = report.stats();
                prop_assert_eq!(s.total, outcomes.len());
                prop_assert_eq!(s.total, s.passed + s.failed);
                prop_assert_eq!(s.passed, s.available + s.unavailable);
                if s.failed > 0 {
                    prop_assert_eq!(report.unique(), None);
                } else {
                    prop_assert_eq!(report.unique(), Some(s.available == s.passed));
                }
            }
        }
    }
}
