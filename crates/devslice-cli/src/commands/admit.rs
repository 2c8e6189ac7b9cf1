use super::{json_pretty, load_slice, report_errors, EXIT_SUCCESS};
use devslice_core::{FeatureGates, SliceStrategy};
use devslice_schema::{render, DocumentFormat};
use std::path::Path;

/// Run create (or update, with `old`) admission and print the admitted slice.
pub fn run(file: &Path, old: Option<&Path>, gates: FeatureGates, json: bool) -> Result<u8, String> {
    let slice = load_slice(file)?;
    let strategy = SliceStrategy::with_gates(gates);
    let result = match old {
        Some(old_path) => {
            let old_slice = load_slice(old_path)?;
            strategy.update(slice, &old_slice)
        }
        None => strategy.create(slice),
    };

    let admitted = match result {
        Ok(admitted) => admitted,
        Err(err) => return report_errors(file, err.errors(), json),
    };

    if json {
        println!("{}", json_pretty(&admitted)?);
    } else {
        let rendered =
            render(&admitted, DocumentFormat::from_path(file)).map_err(|e| e.to_string())?;
        println!("{}", rendered.trim_end());
    }
    Ok(EXIT_SUCCESS)
}
