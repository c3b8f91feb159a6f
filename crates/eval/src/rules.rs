//! Rules, rule sets and the two aggregation policies.
//!
//! A rule set passes when every one of its rules passes against the
//! record (an empty rule set always passes). On top of that single
//! primitive there are two entry points with deliberately different
//! aggregation:
//!
//! - [`evaluate_first_match`] stops at the first passing rule set and
//!   reports its alert. Used for exclusion screening and ad-hoc queries.
//! - [`evaluate_last_match`] evaluates every rule set and returns the
//!   routing payload of the last one that passed, so later, more specific
//!   routes override earlier ones.

use serde_json::Value;
use tracing::debug;

use crate::alert::Alert;
use crate::config::{EngineConfig, RuleConfig, RuleSetConfig};
use crate::error::ConfigError;
use crate::path::resolve;
use crate::predicate::{Predicate, PredicateKind};
use crate::trace::EvalTrace;

/// A predicate bound to a record path.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub target: String,
    pub predicate: Predicate,
    pub invert: bool,
}

impl Rule {
    pub fn new(target: impl Into<String>, predicate: Predicate) -> Self {
        Rule {
            target: target.into(),
            predicate,
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// `predicate(resolve(record, target)) XOR invert`.
    pub fn eval(&self, record: &Value) -> bool {
        self.predicate.test(resolve(record, &self.target)) ^ self.invert
    }

    fn from_config(rule_set: usize, rule: usize, cfg: &RuleConfig) -> Result<Rule, ConfigError> {
        let kind = PredicateKind::parse(&cfg.kind).ok_or_else(|| ConfigError::UnknownPredicate {
            rule_set,
            rule,
            kind: cfg.kind.clone(),
        })?;
        let predicate = kind
            .bind(cfg.type_args.clone())
            .ok_or_else(|| ConfigError::ArgumentCount {
                rule_set,
                rule,
                predicate: kind.name(),
                expected: kind.arity(),
                got: cfg.type_args.len(),
            })?;
        Ok(Rule {
            target: cfg.target.clone(),
            predicate,
            invert: cfg.invert,
        })
    }
}

/// A conjunction of rules with an optional alert and routing payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    alert: Option<Alert>,
    routing: Option<Value>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleSet {
            rules,
            alert: None,
            routing: None,
        }
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn with_routing(mut self, routing: Value) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn routing(&self) -> Option<&Value> {
        self.routing.as_ref()
    }

    /// True when every rule passes. Stops at the first failing rule.
    pub fn passes(&self, record: &Value) -> bool {
        self.rules.iter().all(|rule| rule.eval(record))
    }

    /// Build the rule set at position `index` of a configuration list.
    pub fn from_config(index: usize, cfg: &RuleSetConfig) -> Result<RuleSet, ConfigError> {
        let rules = cfg
            .rule_set
            .iter()
            .enumerate()
            .map(|(i, rule)| Rule::from_config(index, i, rule))
            .collect::<Result<Vec<_>, _>>()?;
        let alert = match &cfg.alert {
            Some(a) => Some(Alert::parse(index, &a.message, a.variables.clone())?),
            None => None,
        };
        Ok(RuleSet {
            rules,
            alert,
            routing: cfg.routing_data.clone(),
        })
    }
}

/// Build rule sets from a configuration list, preserving order.
pub fn rule_sets_from_config(cfgs: &[RuleSetConfig]) -> Result<Vec<RuleSet>, ConfigError> {
    cfgs.iter()
        .enumerate()
        .map(|(i, cfg)| RuleSet::from_config(i, cfg))
        .collect()
}

/// Parse a JSON list of rule-set objects, as supplied with an ad-hoc query.
pub fn parse_rule_sets(json: &Value) -> Result<Vec<RuleSet>, ConfigError> {
    let cfgs: Vec<RuleSetConfig> = serde_json::from_value(json.clone())?;
    rule_sets_from_config(&cfgs)
}

/// Outcome of first-match evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub matched: bool,
    /// Rendered alert of the matching rule set, when it has one.
    pub message: Option<String>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self::default()
    }
}

/// Evaluate rule sets in order and stop at the first that passes.
pub fn evaluate_first_match(record: &Value, rule_sets: &[RuleSet]) -> MatchResult {
    first_match_traced(record, rule_sets, &mut EvalTrace::new())
}

/// [`evaluate_first_match`], recording every rule set it evaluated.
pub fn first_match_traced(
    record: &Value,
    rule_sets: &[RuleSet],
    trace: &mut EvalTrace,
) -> MatchResult {
    for (index, rule_set) in rule_sets.iter().enumerate() {
        let passed = rule_set.passes(record);
        trace.record(index, passed);
        debug!(rule_set = index, passed, "first-match evaluation");
        if passed {
            return MatchResult {
                matched: true,
                message: rule_set.alert().map(|alert| alert.render(record)),
            };
        }
    }
    MatchResult::no_match()
}

/// Evaluate every rule set; the last one that passes selects the routing
/// payload. Returns `default` when none passes.
///
/// A passing rule set without a routing payload overwrites the selection
/// with "nothing", which also falls back to `default`.
pub fn evaluate_last_match<'a>(
    record: &Value,
    rule_sets: &'a [RuleSet],
    default: Option<&'a Value>,
) -> Option<&'a Value> {
    last_match_traced(record, rule_sets, default, &mut EvalTrace::new())
}

/// [`evaluate_last_match`], recording every rule set it evaluated.
pub fn last_match_traced<'a>(
    record: &Value,
    rule_sets: &'a [RuleSet],
    default: Option<&'a Value>,
    trace: &mut EvalTrace,
) -> Option<&'a Value> {
    let mut selected: Option<Option<&'a Value>> = None;
    for (index, rule_set) in rule_sets.iter().enumerate() {
        let passed = rule_set.passes(record);
        trace.record(index, passed);
        debug!(rule_set = index, passed, "last-match evaluation");
        if passed {
            selected = Some(rule_set.routing());
        }
    }
    selected.flatten().or(default)
}

/// The configured exclusion and routing rule sets.
///
/// Built once from configuration and shared by reference; evaluation never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleEngine {
    exclusions: Vec<RuleSet>,
    routes: Vec<RuleSet>,
    default_route: Option<Value>,
}

impl RuleEngine {
    pub fn new(
        exclusions: Vec<RuleSet>,
        routes: Vec<RuleSet>,
        default_route: Option<Value>,
    ) -> Self {
        RuleEngine {
            exclusions,
            routes,
            default_route,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let exclusions = rule_sets_from_config(&config.exclude_rules)?;
        let routes = rule_sets_from_config(&config.routes)?;
        if let Some(index) = routes.iter().position(|r| r.routing().is_none()) {
            return Err(ConfigError::MissingRouting { rule_set: index });
        }
        Ok(RuleEngine::new(exclusions, routes, config.default_route.clone()))
    }

    pub fn exclusions(&self) -> &[RuleSet] {
        &self.exclusions
    }

    pub fn routes(&self) -> &[RuleSet] {
        &self.routes
    }

    pub fn default_route(&self) -> Option<&Value> {
        self.default_route.as_ref()
    }

    /// First-match evaluation of the exclusion rules.
    pub fn screen(&self, record: &Value) -> MatchResult {
        evaluate_first_match(record, &self.exclusions)
    }

    /// Last-match evaluation of the routes, falling back to the default.
    pub fn route(&self, record: &Value) -> Option<&Value> {
        evaluate_last_match(record, &self.routes, self.default_route.as_ref())
    }

    /// The destination identifier of the selected route.
    ///
    /// A string payload is the topic itself; an object payload contributes
    /// its `topic` field. If the selected route names no topic the default
    /// route is tried.
    pub fn route_topic(&self, record: &Value) -> Option<String> {
        self.route(record)
            .and_then(topic_of)
            .or_else(|| self.default_route.as_ref().and_then(topic_of))
    }
}

fn topic_of(payload: &Value) -> Option<String> {
    match payload {
        Value::String(topic) => Some(topic.clone()),
        Value::Object(fields) => fields.get("topic")?.as_str().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn equals(target: &str, v: Value) -> Rule {
        Rule::new(target, Predicate::Equals(v))
    }

    #[test]
    fn rule_set_is_a_conjunction() {
        let set = RuleSet::new(vec![equals("a", json!(1)), equals("b", json!(2))]);
        assert!(set.passes(&json!({"a": 1, "b": 2})));
        assert!(!set.passes(&json!({"a": 1, "b": 3})));
    }

    #[test]
    fn empty_rule_set_passes() {
        assert!(RuleSet::new(vec![]).passes(&json!({})));
    }

    #[test]
    fn inverted_equals() {
        let rule = equals("x", json!(5)).inverted();
        assert!(!rule.eval(&json!({"x": 5})));
        assert!(!rule.eval(&json!({"x": 5.0})));
        assert!(rule.eval(&json!({"x": 4})));
        assert!(rule.eval(&json!({"x": "5"})));
        assert!(rule.eval(&json!({})));
    }

    #[test]
    fn first_match_without_alert() {
        let sets = parse_rule_sets(&json!([
            {"rule_set": [{"target": "a", "type": "BIGGER", "type_args": [5]}]}
        ]))
        .unwrap();
        let result = evaluate_first_match(&json!({"a": 10}), &sets);
        assert_eq!(
            result,
            MatchResult {
                matched: true,
                message: None
            }
        );
    }

    #[test]
    fn first_match_renders_first_passing_alert() {
        let sets = parse_rule_sets(&json!([
            {"rule_set": [{"target": "a", "type": "equals", "type_args": [0]}],
             "alert": {"message": "zero"}},
            {"rule_set": [{"target": "a", "type": "bigger", "type_args": [1]}],
             "alert": {"message": "big {v}", "variables": {"v": "a"}}},
            {"rule_set": [],
             "alert": {"message": "catch-all"}}
        ]))
        .unwrap();

        let mut trace = EvalTrace::new();
        let result = first_match_traced(&json!({"a": 7}), &sets, &mut trace);
        assert_eq!(result.message.as_deref(), Some("big 7"));
        assert_eq!(trace.evaluated, vec![0, 1]);
    }

    #[test]
    fn first_match_no_pass() {
        let sets = parse_rule_sets(&json!([
            {"rule_set": [{"target": "a", "type": "empty"}], "alert": {"message": "x"}}
        ]))
        .unwrap();
        assert_eq!(
            evaluate_first_match(&json!({"a": 1}), &sets),
            MatchResult::no_match()
        );
        assert_eq!(evaluate_first_match(&json!({}), &[]), MatchResult::no_match());
    }

    #[test]
    fn last_match_prefers_later_rule_sets() {
        let sets = vec![
            RuleSet::new(vec![]).with_routing(json!("general")),
            RuleSet::new(vec![equals("kind", json!("a"))]).with_routing(json!("specific-a")),
            RuleSet::new(vec![equals("kind", json!("b"))]).with_routing(json!("specific-b")),
        ];
        let default = json!("fallback");

        let mut trace = EvalTrace::new();
        let got = last_match_traced(&json!({"kind": "a"}), &sets, Some(&default), &mut trace);
        assert_eq!(got, Some(&json!("specific-a")));
        assert_eq!(trace.evaluated, vec![0, 1, 2]);
        assert_eq!(trace.passed, vec![0, 1]);

        assert_eq!(
            evaluate_last_match(&json!({"kind": "z"}), &sets, Some(&default)),
            Some(&json!("general"))
        );
    }

    #[test]
    fn last_match_falls_back_to_default() {
        let sets = vec![RuleSet::new(vec![equals("k", json!(1))]).with_routing(json!("one"))];
        let default = json!("fallback");
        assert_eq!(
            evaluate_last_match(&json!({"k": 2}), &sets, Some(&default)),
            Some(&default)
        );
        assert_eq!(evaluate_last_match(&json!({"k": 2}), &sets, None), None);
    }

    #[test]
    fn last_match_payloadless_pass_clears_selection() {
        let sets = vec![
            RuleSet::new(vec![]).with_routing(json!("first")),
            RuleSet::new(vec![]),
        ];
        let default = json!("fallback");
        assert_eq!(
            evaluate_last_match(&json!({}), &sets, Some(&default)),
            Some(&default)
        );
    }

    #[test]
    fn unknown_predicate_is_rejected() {
        let err = parse_rule_sets(&json!([
            {"rule_set": [{"target": "a", "type": "EMPTY"}]},
            {"rule_set": [{"target": "a", "type": "EMPTY"}, {"target": "b", "type": "LIKE"}]}
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownPredicate {
                rule_set: 1,
                rule: 1,
                kind: "LIKE".to_string()
            }
        );
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        let err = parse_rule_sets(&json!([
            {"rule_set": [{"target": "a", "type": "equals"}]}
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ArgumentCount {
                predicate: "EQUALS",
                expected: 1,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn missing_target_is_malformed() {
        let err = parse_rule_sets(&json!([{"rule_set": [{"type": "EMPTY"}]}])).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn engine_requires_routing_payload_on_routes() {
        let config: EngineConfig = serde_json::from_value(json!({
            "routes": [
                {"rule_set": [], "routing_data": "a"},
                {"rule_set": []}
            ]
        }))
        .unwrap();
        assert_eq!(
            RuleEngine::from_config(&config).unwrap_err(),
            ConfigError::MissingRouting { rule_set: 1 }
        );
    }

    #[test]
    fn engine_route_topic() {
        let config: EngineConfig = serde_json::from_value(json!({
            "routes": [
                {"rule_set": [{"target": "code", "type": "equals", "type_args": ["A"]}],
                 "routing_data": {"topic": "topic-a", "layer": 3}},
                {"rule_set": [{"target": "code", "type": "equals", "type_args": ["B"]}],
                 "routing_data": "topic-b"},
                {"rule_set": [{"target": "code", "type": "equals", "type_args": ["C"]}],
                 "routing_data": {"layer": 4}}
            ],
            "default_route": "topic-default"
        }))
        .unwrap();
        let engine = RuleEngine::from_config(&config).unwrap();
        assert_eq!(engine.route_topic(&json!({"code": "A"})).as_deref(), Some("topic-a"));
        assert_eq!(engine.route_topic(&json!({"code": "B"})).as_deref(), Some("topic-b"));
        assert_eq!(
            engine.route_topic(&json!({"code": "C"})).as_deref(),
            Some("topic-default")
        );
        assert_eq!(
            engine.route_topic(&json!({"code": "Z"})).as_deref(),
            Some("topic-default")
        );
    }

    #[test]
    fn engine_screen_uses_exclusions() {
        let config: EngineConfig = serde_json::from_value(json!({
            "exclude_rules": [
                {"rule_set": [{"target": "status", "type": "equals", "type_args": ["test"]}],
                 "alert": {"message": "test submission {id}", "variables": {"id": "id"}}}
            ]
        }))
        .unwrap();
        let engine = RuleEngine::from_config(&config).unwrap();
        let hit = engine.screen(&json!({"status": "test", "id": 9}));
        assert!(hit.matched);
        assert_eq!(hit.message.as_deref(), Some("test submission 9"));
        assert!(!engine.screen(&json!({"status": "live"})).matched);
    }
}
