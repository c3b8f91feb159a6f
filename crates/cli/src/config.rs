use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use formroute_eval::{EngineConfig, RuleEngine, RuleSetConfig};
use formroute_form::{AddressParser, FormSettings, GeoSettings};

/// The `--config` file. Every section is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub form: FormSettings,
    pub geo: GeoSettings,
    /// Object-store prefix under which submissions are stored.
    pub entry_prefix: String,
    /// Topic used when no route matches.
    pub default_topic: Option<String>,
    pub exclude_rules: Vec<RuleSetConfig>,
    pub routes: Vec<RuleSetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            form: FormSettings::default(),
            geo: GeoSettings::default(),
            entry_prefix: "entries/".to_string(),
            default_topic: None,
            exclude_rules: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl Config {
    /// Read the configuration file, or the built-in defaults without one.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        Config::parse(&text).map_err(|e| format!("error in config '{}': {}", path.display(), e))
    }

    pub fn parse(text: &str) -> Result<Config, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            exclude_rules: self.exclude_rules.clone(),
            routes: self.routes.clone(),
            default_route: self.default_topic.clone().map(Value::String),
        }
    }

    pub fn engine(&self) -> Result<RuleEngine, String> {
        RuleEngine::from_config(&self.engine_config()).map_err(|e| format!("error in rules: {}", e))
    }

    pub fn address_parser(&self) -> Result<AddressParser, String> {
        AddressParser::new(&self.geo).map_err(|e| format!("error in [geo]: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::default().entry_prefix, "entries/");
    }

    #[test]
    fn full_file() {
        let config = Config::parse(
            r#"
entry_prefix = "forms/"
default_topic = "surveys"

[form]
storage_bucket = "images"
case_insensitive_extensions = true

[geo]
out_fields = ["lat", "lon"]

[[exclude_rules]]
rule_set = [{ target = "Entry/FormCode", type = "EQUALS", type_args = ["TEST"] }]
alert = { message = "test form {row}", variables = { row = "Entry/DsRowId" } }

[[routes]]
rule_set = [{ target = "Entry/FormCode", type = "equals", type_args = ["SCHOUW"] }]
routing_data = "schouw"
"#,
        )
        .unwrap();
        assert_eq!(config.entry_prefix, "forms/");
        assert_eq!(config.form.storage_bucket, "images");
        assert_eq!(config.form.answers_path, "Entry/AnswersJson");
        assert!(config.form.case_insensitive_extensions);
        assert_eq!(config.geo.out_fields, vec!["lat", "lon"]);

        let engine = config.engine().unwrap();
        assert_eq!(engine.exclusions().len(), 1);
        assert_eq!(engine.routes().len(), 1);
        assert_eq!(
            engine.default_route(),
            Some(&Value::String("surveys".to_string()))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("entry_prefx = \"x\"").is_err());
    }

    #[test]
    fn bad_rules_surface_at_load() {
        let config = Config::parse(
            r#"
[[routes]]
rule_set = [{ target = "a", type = "between", type_args = [1, 2] }]
routing_data = "x"
"#,
        )
        .unwrap();
        assert!(config.engine().is_err());
    }
}
