pub mod admit;
pub mod completions;
pub mod cycles;
pub mod man_pages;
pub mod resolve;
pub mod update;
pub mod validate;

use console::Style;
use devslice_core::{Config, FeatureGates};
use devslice_schema::{parse_slice_file, ErrorKind, FieldError, ResourceSlice};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_PARSE_ERROR: u8 = 2;
pub const EXIT_INVALID: u8 = 3;

/// Prefix of every document read or parse failure; `main` maps it to
/// [`EXIT_PARSE_ERROR`].
pub const DOCUMENT_ERROR_PREFIX: &str = "document error:";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_slice(path: &Path) -> Result<ResourceSlice, String> {
    parse_slice_file(path).map_err(|e| format!("{DOCUMENT_ERROR_PREFIX} {}: {e}", path.display()))
}

/// Feature gates from `--config` (or the default config file), with
/// `--partitionable-devices` forcing the gate on.
pub fn load_gates(config: Option<&Path>, partitionable_devices: bool) -> Result<FeatureGates, String> {
    let config = match config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
    .map_err(|e| e.to_string())?;
    let mut gates = config.feature_gates;
    if partitionable_devices {
        gates.partitionable_devices = true;
    }
    Ok(gates)
}

pub fn colorize_kind(kind: ErrorKind) -> String {
    let label = kind.as_str();
    match kind {
        ErrorKind::Required | ErrorKind::Forbidden => {
            Style::new().yellow().apply_to(label).to_string()
        }
        ErrorKind::Duplicate => Style::new().magenta().apply_to(label).to_string(),
        ErrorKind::TooMany | ErrorKind::TooLong => Style::new().cyan().apply_to(label).to_string(),
        ErrorKind::Invalid | ErrorKind::TypeInvalid => {
            Style::new().red().apply_to(label).to_string()
        }
    }
}

pub fn ok_line(msg: &str) -> String {
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn fail_line(msg: &str) -> String {
    format!("{} {msg}", Style::new().red().bold().apply_to("✗"))
}

/// Print a rejected document's errors and return [`EXIT_INVALID`].
pub fn report_errors(path: &Path, errs: &[FieldError], json: bool) -> Result<u8, String> {
    if json {
        let payload = serde_json::json!({
            "file": path.display().to_string(),
            "valid": false,
            "errors": errs,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}",
            fail_line(&format!("{}: {} error(s)", path.display(), errs.len()))
        );
        for err in errs {
            let styled = err
                .to_string()
                .replacen(err.kind.as_str(), &colorize_kind(err.kind), 1);
            println!("  {styled}");
        }
    }
    Ok(EXIT_INVALID)
}
