use super::{json_pretty, load_slice, ok_line, report_errors, EXIT_SUCCESS};
use devslice_core::validate_create;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<u8, String> {
    let slice = load_slice(file)?;
    let errs = validate_create(&slice);
    if !errs.is_empty() {
        return report_errors(file, &errs, json);
    }

    let devices = slice.spec.devices.len();
    let mixins = slice.spec.devices_and_mixins() - devices;
    if json {
        let payload = serde_json::json!({
            "file": file.display().to_string(),
            "valid": true,
            "devices": devices,
            "mixins": mixins,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}",
            ok_line(&format!(
                "{}: valid ({devices} device(s), {mixins} mixin(s))",
                file.display()
            ))
        );
    }
    Ok(EXIT_SUCCESS)
}
