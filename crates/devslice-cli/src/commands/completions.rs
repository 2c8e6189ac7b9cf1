use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::path::Path;

/// Completion script for `shell`, on stdout or as a file in `dir`.
pub fn run<C: CommandFactory>(shell: Shell, dir: Option<&Path>) -> Result<u8, String> {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    match dir {
        None => clap_complete::generate(shell, &mut cmd, bin, &mut std::io::stdout()),
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
            let path = clap_complete::generate_to(shell, &mut cmd, bin, dir)
                .map_err(|e| format!("failed to write {shell} completions: {e}"))?;
            println!("completions written to {}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
