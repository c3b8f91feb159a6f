//! Primitive predicates applied to path-resolved values.
//!
//! A predicate is a closed sum over the four supported comparisons; the
//! literal argument (if any) lives inside the variant, so an evaluated
//! predicate can never be missing its operand.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::numeric;

/// The predicate name as written in rule configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Empty,
    Equals,
    Bigger,
    Smaller,
}

impl PredicateKind {
    /// Parse a configured predicate type. Matching is case-insensitive.
    pub fn parse(name: &str) -> Option<PredicateKind> {
        match name.to_ascii_uppercase().as_str() {
            "EMPTY" => Some(PredicateKind::Empty),
            "EQUALS" => Some(PredicateKind::Equals),
            "BIGGER" => Some(PredicateKind::Bigger),
            "SMALLER" => Some(PredicateKind::Smaller),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PredicateKind::Empty => "EMPTY",
            PredicateKind::Equals => "EQUALS",
            PredicateKind::Bigger => "BIGGER",
            PredicateKind::Smaller => "SMALLER",
        }
    }

    /// Number of literal arguments the predicate takes.
    pub fn arity(self) -> usize {
        match self {
            PredicateKind::Empty => 0,
            PredicateKind::Equals | PredicateKind::Bigger | PredicateKind::Smaller => 1,
        }
    }

    /// Bind literal arguments. Returns `None` when the count is wrong.
    pub fn bind(self, mut args: Vec<Value>) -> Option<Predicate> {
        if args.len() != self.arity() {
            return None;
        }
        Some(match self {
            PredicateKind::Empty => Predicate::Empty,
            PredicateKind::Equals => Predicate::Equals(args.remove(0)),
            PredicateKind::Bigger => Predicate::Bigger(args.remove(0)),
            PredicateKind::Smaller => Predicate::Smaller(args.remove(0)),
        })
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A predicate with its bound literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Value is absent or null.
    Empty,
    /// Value equals the literal.
    Equals(Value),
    /// Value orders strictly after the literal.
    Bigger(Value),
    /// Value orders strictly before the literal.
    Smaller(Value),
}

impl Predicate {
    pub fn kind(&self) -> PredicateKind {
        match self {
            Predicate::Empty => PredicateKind::Empty,
            Predicate::Equals(_) => PredicateKind::Equals,
            Predicate::Bigger(_) => PredicateKind::Bigger,
            Predicate::Smaller(_) => PredicateKind::Smaller,
        }
    }

    /// Test a resolved value.
    ///
    /// An absent value is tested as JSON null: EMPTY passes, EQUALS passes
    /// only against a null literal, BIGGER and SMALLER fail.
    pub fn test(&self, value: Option<&Value>) -> bool {
        let value = value.unwrap_or(&Value::Null);
        match self {
            Predicate::Empty => value.is_null(),
            Predicate::Equals(literal) => numeric::values_equal(value, literal),
            Predicate::Bigger(literal) => {
                numeric::order_values(value, literal) == Some(Ordering::Greater)
            }
            Predicate::Smaller(literal) => {
                numeric::order_values(value, literal) == Some(Ordering::Less)
            }
        }
    }
}
