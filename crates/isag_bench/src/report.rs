//! Per-bench pass/fail reporting.

use std::fmt;

use serde::Serialize;

use crate::bench::TestBench;
use crate::error::RunError;

/// The result of running one test bench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchReport {
    /// Bench name, usually the file name.
    pub name: String,
    /// Assertions that held.
    pub passed: usize,
    /// Assertions that failed.
    pub failed: usize,
    /// One diagnostic per failed assertion.
    pub failures: Vec<String>,
    /// `##todo` notes from the source.
    pub todos: Vec<String>,
    /// Cycles simulated.
    pub cycles: u64,
    /// Whether an `end` command fired.
    pub completed: bool,
    /// Why the run stopped early, if it did.
    pub error: Option<String>,
}

impl BenchReport {
    /// Builds a report from a bench after a run.
    pub fn new(
        name: impl Into<String>,
        bench: &TestBench,
        cycles: u64,
        error: Option<&RunError>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: bench.passed(),
            failed: bench.failed(),
            failures: bench.failures().to_vec(),
            todos: bench.todos().to_vec(),
            cycles,
            completed: bench.is_complete(),
            error: error.map(ToString::to_string),
        }
    }

    /// Builds the report of a bench that could not be run at all.
    pub fn errored(name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            passed: 0,
            failed: 0,
            failures: Vec::new(),
            todos: Vec::new(),
            cycles: 0,
            completed: false,
            error: Some(error.to_string()),
        }
    }

    /// A bench passes when it reached `end` without error, at least one
    /// assertion held and none failed.
    pub fn is_passed(&self) -> bool {
        self.error.is_none() && self.completed && self.passed > 0 && self.failed == 0
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_passed() { "passed" } else { "failed" };
        writeln!(f, "{} [ {} ]", self.name, verdict)?;
        writeln!(
            f,
            "    {} passed, {} failed, {} cycles",
            self.passed, self.failed, self.cycles
        )?;
        for failure in &self.failures {
            writeln!(f, "    {failure}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "    error: {error}")?;
        } else if !self.completed {
            writeln!(f, "    end directive never reached")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutcome;
    use isag_config::ArchConfig;

    fn bench() -> TestBench {
        TestBench::parse("##todo widen\nnop\n#end()", &ArchConfig::default()).unwrap()
    }

    #[test]
    fn passing_report() {
        let mut bench = bench();
        bench.record(&CommandOutcome::Passed);
        bench.record(&CommandOutcome::Ended);
        let report = BenchReport::new("alu.S", &bench, 12, None);
        assert!(report.is_passed());
        assert_eq!(report.todos, ["##todo widen"]);
        assert_eq!(
            report.to_string(),
            "alu.S [ passed ]\n    1 passed, 0 failed, 12 cycles\n"
        );
    }

    #[test]
    fn zero_assertions_is_a_failure() {
        let mut bench = bench();
        bench.record(&CommandOutcome::Ended);
        assert!(!BenchReport::new("t", &bench, 1, None).is_passed());
    }

    #[test]
    fn failed_assertion_is_listed() {
        let mut bench = bench();
        bench.record(&CommandOutcome::Passed);
        bench.record(&CommandOutcome::Failed("Assertion failed ...".into()));
        bench.record(&CommandOutcome::Ended);
        let report = BenchReport::new("t", &bench, 4, None);
        assert!(!report.is_passed());
        assert!(report.to_string().contains("    Assertion failed ...\n"));
    }

    #[test]
    fn incomplete_or_errored_run_fails() {
        let mut bench = bench();
        bench.record(&CommandOutcome::Passed);
        let report = BenchReport::new("t", &bench, 4, None);
        assert!(!report.is_passed());
        assert!(report.to_string().contains("end directive never reached"));

        bench.record(&CommandOutcome::Ended);
        let err = RunError::CycleLimit { limit: 4 };
        let report = BenchReport::new("t", &bench, 4, Some(&err));
        assert!(!report.is_passed());
        assert_eq!(
            report.error.as_deref(),
            Some("no end directive reached within 4 cycles")
        );
    }

    #[test]
    fn errored_report() {
        let report = BenchReport::errored("broken.S", "line 3: unknown directive type 'x'");
        assert!(!report.is_passed());
        assert!(report.to_string().starts_with("broken.S [ failed ]\n"));
    }

    #[test]
    fn serializes_to_json() {
        let mut bench = bench();
        bench.record(&CommandOutcome::Passed);
        bench.record(&CommandOutcome::Ended);
        let report = BenchReport::new("alu.S", &bench, 3, None);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "alu.S");
        assert_eq!(json["passed"], 1);
        assert_eq!(json["completed"], true);
        assert!(json["error"].is_null());
    }
}
