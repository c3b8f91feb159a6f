use std::path::Path;

use serde_json::{json, Value};

use formroute_connect::{query_store, DirectoryStore};
use formroute_eval::parse_rule_sets;

use crate::commands::{print_json, runtime};
use crate::config::Config;
use crate::OutputFormat;

/// Read the query as inline JSON, or from a file when it is not JSON.
fn load_query(query: &str) -> Result<Value, String> {
    if let Ok(value) = serde_json::from_str(query) {
        return Ok(value);
    }
    let text = std::fs::read_to_string(query)
        .map_err(|e| format!("query is neither JSON nor a readable file '{}': {}", query, e))?;
    serde_json::from_str(&text).map_err(|e| format!("error parsing JSON in '{}': {}", query, e))
}

pub(crate) fn cmd_query(
    store: &Path,
    suffix: &str,
    query: &str,
    config: &Config,
    output: OutputFormat,
) -> Result<(), String> {
    let rule_sets =
        parse_rule_sets(&load_query(query)?).map_err(|e| format!("error in query: {}", e))?;
    let store = DirectoryStore::new(store);
    let matching = runtime()?
        .block_on(query_store(&store, &config.entry_prefix, suffix, &rule_sets))
        .map_err(|e| e.to_string())?;

    match output {
        OutputFormat::Json => print_json(&json!({ "matching_forms": matching }))?,
        OutputFormat::Text => {
            for key in &matching {
                println!("{}", key);
            }
        }
    }
    Ok(())
}
