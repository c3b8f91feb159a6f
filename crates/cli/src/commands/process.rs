use std::path::Path;

use serde_json::{json, Value};

use formroute_connect::{
    DirectoryStore, MemoryPublisher, Outcome, Pipeline, StaticCoordinateLookup,
};
use formroute_form::Coordinates;

use crate::commands::{print_json, runtime};
use crate::config::Config;
use crate::OutputFormat;

/// Parse `LAT,LON`.
pub(crate) fn parse_coordinates(text: &str) -> Result<Coordinates, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{}'", text))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", s.trim(), e))
    };
    Ok(Coordinates {
        latitude: parse(lat)?,
        longitude: parse(lon)?,
    })
}

pub(crate) fn cmd_process(
    store: &Path,
    suffix: &str,
    coordinates: Option<&str>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), String> {
    let engine = config.engine()?;
    let addresses = config.address_parser()?;
    let lookup = match coordinates {
        Some(text) => StaticCoordinateLookup::fixed(parse_coordinates(text)?),
        None => StaticCoordinateLookup::empty(),
    };
    let store = DirectoryStore::new(store);
    let publisher = MemoryPublisher::new();
    let pipeline = Pipeline::new(
        &store,
        &publisher,
        &lookup,
        &engine,
        &config.form,
        &addresses,
    );

    let rt = runtime()?;
    let report = rt
        .block_on(pipeline.run(&config.entry_prefix, suffix))
        .map_err(|e| e.to_string())?;
    let published = rt.block_on(publisher.messages());

    match output {
        OutputFormat::Json => {
            let messages: Vec<Value> = published
                .iter()
                .map(|m| {
                    let message: Value =
                        serde_json::from_slice(&m.payload).unwrap_or(Value::Null);
                    json!({"id": m.id, "topic": m.topic, "message": message})
                })
                .collect();
            print_json(&json!({
                "published": messages,
                "outcomes": report.outcomes,
                "summary": report.summary,
            }))?;
        }
        OutputFormat::Text => {
            if !quiet {
                for (key, outcome) in &report.outcomes {
                    println!("{}\t{}", key, describe(outcome));
                }
            }
            let s = &report.summary;
            println!(
                "total {}, invalid {}, excluded {}, unrouted {}, unlocated {}, published {}",
                s.total, s.invalid, s.excluded, s.unrouted, s.unlocated, s.published
            );
        }
    }
    Ok(())
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Invalid { reason } => format!("invalid: {}", reason),
        Outcome::Excluded { message: Some(m) } => format!("excluded: {}", m),
        Outcome::Excluded { message: None } => "excluded".to_string(),
        Outcome::Unrouted => "unrouted".to_string(),
        Outcome::Unlocated { reason } => format!("unlocated: {}", reason),
        Outcome::Published { topic, message_id } => {
            format!("published to {} as {}", topic, message_id)
        }
    }
}
