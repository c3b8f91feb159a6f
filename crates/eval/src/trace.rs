//! Evaluation trace for rule-set aggregation.
//!
//! Records which rule sets an entry point actually evaluated and which of
//! them passed, in evaluation order.

use serde::Serialize;

/// Indices (into the evaluated rule-set slice) touched during one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalTrace {
    pub evaluated: Vec<usize>,
    pub passed: Vec<usize>,
}

impl EvalTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that rule set `index` was evaluated with the given outcome.
    pub fn record(&mut self, index: usize, passed: bool) {
        self.evaluated.push(index);
        if passed {
            self.passed.push(index);
        }
    }

    /// The last rule set that passed, if any.
    pub fn last_passed(&self) -> Option<usize> {
        self.passed.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut t = EvalTrace::new();
        t.record(0, false);
        t.record(1, true);
        t.record(2, true);
        assert_eq!(t.evaluated, vec![0, 1, 2]);
        assert_eq!(t.passed, vec![1, 2]);
        assert_eq!(t.last_passed(), Some(2));
    }

    #[test]
    fn empty_trace() {
        assert_eq!(EvalTrace::new().last_passed(), None);
    }
}
