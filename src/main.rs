//! Subprocess supervisor - run a child process with a timeout and stream its output.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use subprocess_supervisor::config::{ConfigLoader, SupervisorConfig};
use subprocess_supervisor::display;
use subprocess_supervisor::fileinfo::HumanizedFileInfo;
use subprocess_supervisor::subprocess::{output_channel, SubProcess, SubprocessError};

#[derive(Parser)]
#[command(
    name = "subprocess-supervisor",
    about = "Run a child process with a timeout and stream its output",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, relaying its stdout and stderr line by line.
    Run {
        /// Kill the program after this many seconds (0 uses the configured ceiling).
        #[arg(short, long, default_value_t = 0)]
        timeout: u64,
        /// Path to a config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Suppress start and outcome status lines.
        #[arg(short, long)]
        quiet: bool,
        /// The program to run.
        executable: String,
        /// Arguments passed to the program.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Describe files and directories in human-readable form.
    Stat {
        /// Paths to describe.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<SupervisorConfig> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

/// Shell convention: 127 for a missing program, 126 for anything else that
/// prevents it from starting.
fn start_failure_code(err: &SubprocessError) -> u8 {
    if err.is_not_found() {
        127
    } else {
        126
    }
}

async fn run(
    executable: String,
    args: Vec<String>,
    timeout: u64,
    config: &SupervisorConfig,
    quiet: bool,
) -> ExitCode {
    let (sink, mut output) = output_channel(config.channel_capacity);
    let handle = match SubProcess::new(executable)
        .args(args)
        .timeout(Duration::from_secs(timeout))
        .with_config(config)
        .run(sink)
    {
        Ok(handle) => handle,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(start_failure_code(&e));
        }
    };

    if !quiet {
        display::print_run_start(handle.executable(), handle.pid());
    }

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.kill();
        }
    });

    while let Some(unit) = output.next().await {
        if let Err(e) = display::write_unit(&mut std::io::stdout().lock(), &unit) {
            tracing::debug!(error = %e, "Stdout closed, killing process");
            handle.kill();
            break;
        }
    }
    let _ = std::io::stdout().flush();
    drop(output);

    let Some(outcome) = handle.outcome().await else {
        tracing::warn!("Process outcome unavailable");
        return ExitCode::FAILURE;
    };
    if !quiet {
        display::print_outcome(handle.executable(), &outcome);
    }
    ExitCode::from(u8::try_from(outcome.exit_code()).unwrap_or(1))
}

fn stat(paths: &[PathBuf]) -> ExitCode {
    let mut code = ExitCode::SUCCESS;
    for path in paths {
        match HumanizedFileInfo::from_path(path) {
            Ok(info) => println!("{info}"),
            Err(e) => {
                display::print_error(&format!("{}: {e}", path.display()));
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            timeout,
            config,
            quiet,
            executable,
            args,
        } => {
            let Some(config) = load_config(config) else {
                return ExitCode::from(2);
            };
            tracing::debug!(config = ?config, "Loaded configuration");
            run(executable, args, timeout, &config, quiet).await
        }
        Commands::Stat { paths } => stat(&paths),
    }
}
