//! One module per subcommand group. Every command returns its error as
//! a message for [`crate::report_error`].

pub(crate) mod expand;
pub(crate) mod inspect;
pub(crate) mod process;
pub(crate) mod query;
pub(crate) mod sync;

use std::path::Path;

use serde::Serialize;

/// Read a submission file.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("error reading file '{}': {}", path.display(), e))
}

/// Pretty-print a value as JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("serialization error: {}", e))?;
    println!("{}", text);
    Ok(())
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("failed to create tokio runtime: {}", e))
}
