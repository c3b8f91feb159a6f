//! End-to-end rule engine behaviour against realistic submission records.

use formroute_eval::{
    evaluate_first_match, first_match_traced, last_match_traced, parse_rule_sets, resolve,
    ConfigError, EngineConfig, EvalTrace, RuleEngine,
};
use serde_json::{json, Value};

fn submission() -> Value {
    json!({
        "ProviderId": 1234,
        "Entry": {
            "DsRowId": 77,
            "FormCode": "SCHOUW",
            "AnswersJson": {
                "SCHOUW_GEGEVENS_PAGE": {
                    "DSS": "1234AB12_A",
                    "STATUS": "done",
                    "SCORE": 8.5,
                    "COUNT": 0,
                    "PHOTOS": []
                },
                "AFRONDEN_PAGE": {
                    "FCA_FOTO_GEVEL": "gevel.jpg"
                }
            }
        }
    })
}

fn engine() -> RuleEngine {
    let config: EngineConfig = serde_json::from_value(json!({
        "exclude_rules": [
            {
                "rule_set": [
                    {"target": "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/STATUS",
                     "type": "equals", "type_args": ["test"]}
                ],
                "alert": {
                    "message": "Row {row} is a test submission",
                    "variables": {"row": "Entry/DsRowId"}
                }
            },
            {
                "rule_set": [
                    {"target": "Entry/AnswersJson/AFRONDEN_PAGE/FCA_FOTO_GEVEL", "type": "empty"}
                ],
                "alert": {"message": "Row {row} has no photo", "variables": {"row": "Entry/DsRowId"}}
            }
        ],
        "routes": [
            {"rule_set": [], "routing_data": {"topic": "surveys"}},
            {"rule_set": [{"target": "Entry/FormCode", "type": "equals", "type_args": ["SCHOUW"]}],
             "routing_data": {"topic": "surveys-schouw"}},
            {"rule_set": [
                {"target": "Entry/FormCode", "type": "equals", "type_args": ["SCHOUW"]},
                {"target": "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/SCORE", "type": "bigger", "type_args": [9]}
             ],
             "routing_data": {"topic": "surveys-schouw-priority"}}
        ],
        "default_route": "surveys-unrouted"
    }))
    .unwrap();
    RuleEngine::from_config(&config).unwrap()
}

#[test]
fn live_submission_is_not_excluded() {
    let result = engine().screen(&submission());
    assert!(!result.matched);
    assert_eq!(result.message, None);
}

#[test]
fn test_submission_is_excluded_with_alert() {
    let mut record = submission();
    record["Entry"]["AnswersJson"]["SCHOUW_GEGEVENS_PAGE"]["STATUS"] = json!("test");
    let result = engine().screen(&record);
    assert!(result.matched);
    assert_eq!(result.message.as_deref(), Some("Row 77 is a test submission"));
}

#[test]
fn missing_photo_is_excluded() {
    let mut record = submission();
    record["Entry"]["AnswersJson"]["AFRONDEN_PAGE"] = json!({});
    let result = engine().screen(&record);
    assert_eq!(result.message.as_deref(), Some("Row 77 has no photo"));
}

#[test]
fn most_specific_route_wins() {
    let engine = engine();
    assert_eq!(
        engine.route_topic(&submission()).as_deref(),
        Some("surveys-schouw")
    );

    let mut priority = submission();
    priority["Entry"]["AnswersJson"]["SCHOUW_GEGEVENS_PAGE"]["SCORE"] = json!(9.5);
    assert_eq!(
        engine.route_topic(&priority).as_deref(),
        Some("surveys-schouw-priority")
    );

    let mut other = submission();
    other["Entry"]["FormCode"] = json!("OTHER");
    assert_eq!(engine.route_topic(&other).as_deref(), Some("surveys"));
}

#[test]
fn first_match_short_circuits_and_last_match_scans_all() {
    let engine = engine();
    let mut record = submission();
    record["Entry"]["AnswersJson"]["SCHOUW_GEGEVENS_PAGE"]["STATUS"] = json!("test");

    let mut first = EvalTrace::new();
    first_match_traced(&record, engine.exclusions(), &mut first);
    assert_eq!(first.evaluated, vec![0]);

    let mut last = EvalTrace::new();
    last_match_traced(&record, engine.routes(), engine.default_route(), &mut last);
    assert_eq!(last.evaluated, vec![0, 1, 2]);
    assert_eq!(last.passed, vec![0, 1]);
}

#[test]
fn falsy_intermediate_reads_as_absent_for_predicates() {
    // COUNT is a present 0, so anything addressed below it is absent and
    // EMPTY passes; EQUALS against the absent value compares with null.
    let sets = parse_rule_sets(&json!([
        {"rule_set": [
            {"target": "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/COUNT/nested", "type": "empty"},
            {"target": "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/PHOTOS/0", "type": "equals", "type_args": [null]},
            {"target": "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/COUNT/nested", "type": "smaller", "type_args": [1], "invert": true}
        ]}
    ]))
    .unwrap();
    let record = submission();
    assert_eq!(
        resolve(&record, "Entry/AnswersJson/SCHOUW_GEGEVENS_PAGE/COUNT"),
        Some(&json!(0))
    );
    assert!(evaluate_first_match(&record, &sets).matched);
}

#[test]
fn query_rules_from_json_argument() {
    let query: Value = serde_json::from_str(
        r#"[{"rule_set": [{"target": "Entry/FormCode", "type": "EQUALS", "type_args": ["SCHOUW"]}],
             "alert": {"message": "matched {code}", "variables": {"code": "Entry/FormCode"}}}]"#,
    )
    .unwrap();
    let sets = parse_rule_sets(&query).unwrap();
    let result = evaluate_first_match(&submission(), &sets);
    assert_eq!(result.message.as_deref(), Some("matched SCHOUW"));
}

#[test]
fn configuration_errors_surface_at_load_time() {
    let bad: EngineConfig = serde_json::from_value(json!({
        "exclude_rules": [
            {"rule_set": [{"target": "a", "type": "matches", "type_args": ["x"]}]}
        ]
    }))
    .unwrap();
    assert!(matches!(
        RuleEngine::from_config(&bad),
        Err(ConfigError::UnknownPredicate { .. })
    ));

    let undeclared: EngineConfig = serde_json::from_value(json!({
        "exclude_rules": [
            {"rule_set": [], "alert": {"message": "{missing}"}}
        ]
    }))
    .unwrap();
    assert!(matches!(
        RuleEngine::from_config(&undeclared),
        Err(ConfigError::UndeclaredVariable { .. })
    ));
}
