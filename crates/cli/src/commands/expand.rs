use formroute_eval::expand_ranges;

use crate::commands::print_json;
use crate::OutputFormat;

pub(crate) fn cmd_expand(pattern: &str, output: OutputFormat) -> Result<(), String> {
    let expansions = expand_ranges(pattern);
    match output {
        OutputFormat::Json => print_json(&expansions)?,
        OutputFormat::Text => {
            for expansion in &expansions {
                println!("{}", expansion);
            }
        }
    }
    Ok(())
}
