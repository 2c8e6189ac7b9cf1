mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{DOCUMENT_ERROR_PREFIX, EXIT_FAILURE, EXIT_PARSE_ERROR, EXIT_SUCCESS};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "devslice",
    version,
    about = "Resolve and validate device resource slices"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Config file (defaults to ~/.config/devslice/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable the partitionable-devices gate regardless of config.
    #[arg(long, default_value_t = false, global = true)]
    partitionable_devices: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a new resource slice.
    Validate {
        /// Slice document (.json or .toml).
        file: PathBuf,
    },
    /// Validate an update of a stored slice.
    Update {
        /// Updated slice document.
        new: PathBuf,
        /// Stored slice document.
        old: PathBuf,
    },
    /// Expand mixins and print the flattened slice.
    Resolve {
        /// Slice document (.json or .toml).
        file: PathBuf,
        /// Output format: json or toml (defaults to the input format).
        #[arg(long)]
        format: Option<String>,
        /// Print only the content digest of the flattened slice.
        #[arg(long, default_value_t = false)]
        digest: bool,
    },
    /// Report `consumesCapacityFrom` cycles.
    Cycles {
        /// Slice document (.json or .toml).
        file: PathBuf,
    },
    /// Run admission: prepare per feature gates, then validate.
    Admit {
        /// Slice document to admit.
        file: PathBuf,
        /// Stored slice; admits as an update when given.
        #[arg(long)]
        old: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
        /// Write the script into this directory instead of stdout.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

/// Output piped into `head` and friends closes stdout early; `println!` then
/// panics. Treat that as a finished run rather than a crash.
fn exit_quietly_on_closed_stdout() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or_default();
        if is_closed_stdout(payload) {
            std::process::exit(i32::from(EXIT_SUCCESS));
        }
        default_hook(info);
    }));
}

fn is_closed_stdout(panic_message: &str) -> bool {
    panic_message.starts_with("failed printing to stdout") || panic_message.contains("Broken pipe")
}

fn main() -> ExitCode {
    exit_quietly_on_closed_stdout();

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DEVSLICE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Validate { file } => commands::validate::run(&file, json_output),
        Commands::Update { new, old } => commands::update::run(&new, &old, json_output),
        Commands::Resolve {
            file,
            format,
            digest,
        } => commands::resolve::run(&file, format.as_deref(), digest, json_output),
        Commands::Cycles { file } => commands::cycles::run(&file, json_output),
        Commands::Admit { file, old } => {
            commands::load_gates(cli.config.as_deref(), cli.partitionable_devices).and_then(
                |gates| commands::admit::run(&file, old.as_deref(), gates, json_output),
            )
        }
        Commands::Completions { shell, dir } => {
            commands::completions::run::<Cli>(shell, dir.as_deref())
        }
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with(DOCUMENT_ERROR_PREFIX) {
                EXIT_PARSE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
