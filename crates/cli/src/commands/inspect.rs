//! Single-submission commands: screen, route, compile and attachments.

use std::path::Path;

use serde_json::json;

use formroute_eval::{first_match_traced, last_match_traced, EvalTrace};
use formroute_form::Form;

use crate::commands::{print_json, read_file};
use crate::config::Config;
use crate::OutputFormat;

fn load_form(path: &Path, config: &Config) -> Result<Form, String> {
    let bytes = read_file(path)?;
    Form::from_slice(&bytes, &config.form)
        .map_err(|e| format!("invalid submission '{}': {}", path.display(), e))
}

pub(crate) fn cmd_screen(
    path: &Path,
    config: &Config,
    trace: bool,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), String> {
    let engine = config.engine()?;
    let form = load_form(path, config)?;
    let mut eval_trace = EvalTrace::new();
    let result = first_match_traced(form.raw(), engine.exclusions(), &mut eval_trace);

    match output {
        OutputFormat::Json => {
            let mut report = json!({
                "excluded": result.matched,
                "alert": result.message,
            });
            if trace {
                report["trace"] = json!(eval_trace);
            }
            print_json(&report)?;
        }
        OutputFormat::Text => {
            match (result.matched, result.message.as_deref()) {
                (true, Some(message)) => println!("excluded: {}", message),
                (true, None) => println!("excluded"),
                (false, _) => {
                    if !quiet {
                        println!("not excluded");
                    }
                }
            }
            if trace {
                println!(
                    "evaluated {:?}, passed {:?}",
                    eval_trace.evaluated, eval_trace.passed
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_route(
    path: &Path,
    config: &Config,
    trace: bool,
    output: OutputFormat,
) -> Result<(), String> {
    let engine = config.engine()?;
    let form = load_form(path, config)?;
    let mut eval_trace = EvalTrace::new();
    let payload = last_match_traced(
        form.raw(),
        engine.routes(),
        engine.default_route(),
        &mut eval_trace,
    );
    let topic = form.route_topic(&engine);

    match output {
        OutputFormat::Json => {
            let mut report = json!({
                "topic": topic,
                "routing_data": payload,
            });
            if trace {
                report["trace"] = json!(eval_trace);
            }
            print_json(&report)?;
        }
        OutputFormat::Text => {
            match &topic {
                Some(topic) => println!("{}", topic),
                None => println!("no route"),
            }
            if trace {
                println!(
                    "evaluated {:?}, passed {:?}",
                    eval_trace.evaluated, eval_trace.passed
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_compile(path: &Path, config: &Config) -> Result<(), String> {
    let form = load_form(path, config)?;
    print_json(&form.to_compiled_data())
}

pub(crate) fn cmd_attachments(
    path: &Path,
    config: &Config,
    output: OutputFormat,
) -> Result<(), String> {
    let form = load_form(path, config)?;
    match output {
        OutputFormat::Json => {
            let attachments: Vec<_> = form
                .attachments()
                .iter()
                .map(|a| {
                    json!({
                        "category": a.category,
                        "field": a.field,
                        "storage_path": a.storage_path,
                        "download_url": a.download_url,
                        "public_url": form.public_url(a),
                    })
                })
                .collect();
            print_json(&attachments)?;
        }
        OutputFormat::Text => {
            for a in form.attachments() {
                println!("{}/{}\t{}", a.category, a.field, a.storage_path);
            }
        }
    }
    Ok(())
}
