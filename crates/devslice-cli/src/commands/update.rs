use super::{json_pretty, load_slice, ok_line, report_errors, EXIT_SUCCESS};
use devslice_core::validate_update;
use std::path::Path;

pub fn run(new: &Path, old: &Path, json: bool) -> Result<u8, String> {
    let new_slice = load_slice(new)?;
    let old_slice = load_slice(old)?;
    let errs = validate_update(&new_slice, &old_slice);
    if !errs.is_empty() {
        return report_errors(new, &errs, json);
    }

    if json {
        let payload = serde_json::json!({
            "file": new.display().to_string(),
            "old": old.display().to_string(),
            "valid": true,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}",
            ok_line(&format!(
                "{}: valid update of {}",
                new.display(),
                old.display()
            ))
        );
    }
    Ok(EXIT_SUCCESS)
}
