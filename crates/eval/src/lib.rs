//! Rule evaluation over form submission records.
//!
//! Records are plain `serde_json::Value` trees addressed by slash-delimited
//! paths. Rule sets are conjunctions of primitive predicates built once
//! from declarative configuration; a [`RuleEngine`] aggregates them with
//! first-match semantics for exclusion and queries and last-match
//! semantics for routing.
//!
//! Everything here is synchronous and pure: evaluation borrows the record
//! and the rule sets immutably and may run concurrently on many records.

pub mod alert;
pub mod config;
pub mod error;
pub mod numeric;
pub mod path;
pub mod predicate;
pub mod ranges;
pub mod rules;
pub mod trace;

pub use alert::Alert;
pub use config::{AlertConfig, EngineConfig, RuleConfig, RuleSetConfig};
pub use error::ConfigError;
pub use path::{is_falsy, resolve};
pub use predicate::{Predicate, PredicateKind};
pub use ranges::expand_ranges;
pub use rules::{
    evaluate_first_match, evaluate_last_match, first_match_traced, last_match_traced,
    parse_rule_sets, rule_sets_from_config, MatchResult, Rule, RuleEngine, RuleSet,
};
pub use trace::EvalTrace;
