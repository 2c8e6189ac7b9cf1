use super::{fail_line, json_pretty, load_slice, ok_line, EXIT_INVALID, EXIT_SUCCESS};
use devslice_core::{find_cycles, ReferenceGraph};
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<u8, String> {
    let slice = load_slice(file)?;
    let graph = ReferenceGraph::build(&slice.spec.devices);
    let cycles = find_cycles(&graph);

    if json {
        let payload = serde_json::json!({
            "file": file.display().to_string(),
            "devices": graph.len(),
            "cycles": cycles
                .iter()
                .map(|c| serde_json::json!({ "nodes": c.nodes(), "path": c.to_string() }))
                .collect::<Vec<_>>(),
        });
        println!("{}", json_pretty(&payload)?);
    } else if cycles.is_empty() {
        println!(
            "{}",
            ok_line(&format!("no cycles among {} device(s)", graph.len()))
        );
    } else {
        for cycle in &cycles {
            println!("{}", fail_line(&format!("cycle: {cycle}")));
        }
    }

    if cycles.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_INVALID)
    }
}
