use super::{json_pretty, load_slice, report_errors, EXIT_SUCCESS};
use devslice_core::{resolve_checked, CoreError};
use devslice_schema::{render, DocumentFormat};
use std::path::Path;
use tracing::info;

/// Print the flattened document. Output format is `--format`, else JSON under
/// `--json`, else the input file's format.
pub fn run(file: &Path, format: Option<&str>, digest: bool, json: bool) -> Result<u8, String> {
    let slice = load_slice(file)?;
    let resolved = match resolve_checked(&slice) {
        Ok(resolved) => resolved,
        Err(CoreError::Invalid(err)) => return report_errors(file, err.errors(), json),
        Err(e) => return Err(e.to_string()),
    };

    let slice_digest = resolved.digest().map_err(|e| e.to_string())?;
    info!("digest {}", slice_digest.short());
    if digest {
        if json {
            let payload = serde_json::json!({
                "file": file.display().to_string(),
                "digest": slice_digest,
            });
            println!("{}", json_pretty(&payload)?);
        } else {
            println!("{slice_digest}");
        }
        return Ok(EXIT_SUCCESS);
    }

    let output_format = match format {
        Some(name) => DocumentFormat::parse(name).map_err(|e| e.to_string())?,
        None if json => DocumentFormat::Json,
        None => DocumentFormat::from_path(file),
    };
    let rendered = render(&resolved, output_format).map_err(|e| e.to_string())?;
    println!("{}", rendered.trim_end());
    Ok(EXIT_SUCCESS)
}
