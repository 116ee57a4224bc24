//! Scrawl command line: inspect, migrate and export canvas documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CliResult, ExportFormat, ExportOptions};
use scrawl_core::input::ShortcutRegistry;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "scrawl", version, about = "Scrawl canvas document tool")]
struct Cli {
    /// Editor config JSON; missing fields use defaults.
    #[arg(long, env = "SCRAWL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a stored document or canvas record.
    Inspect { input: PathBuf },
    /// Rewrite a document in the canonical format.
    Migrate {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a document to SVG, PNG or a printable page.
    Export {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "svg")]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output pixels per canvas unit.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long)]
        grid: bool,
        /// Background color, e.g. "#ffffff".
        #[arg(long)]
        background: Option<String>,
        /// Title of the print page.
        #[arg(long, default_value = "Canvas")]
        title: String,
    },
    /// List keyboard shortcuts.
    Shortcuts,
}

fn emit(output: Option<&Path>, bytes: &[u8]) -> CliResult<()> {
    match output {
        Some(path) => {
            commands::write_file(path, bytes)?;
            log::info!("wrote {}", path.display());
            Ok(())
        }
        None => std::io::stdout()
            .write_all(bytes)
            .map_err(|source| commands::CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            }),
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect { input } => {
            let summary = commands::inspect(&commands::read_payload(&input)?)?;
            print!("{summary}");
        }
        Command::Migrate { input, output } => {
            let json = commands::migrate(&commands::read_payload(&input)?)?;
            emit(output.as_deref(), json.as_bytes())?;
        }
        Command::Export {
            input,
            format,
            output,
            scale,
            grid,
            background,
            title,
        } => {
            let options = ExportOptions {
                format,
                scale,
                grid,
                background,
                title,
            };
            let bytes = commands::export(&commands::read_payload(&input)?, &config, &options)?;
            emit(output.as_deref(), &bytes)?;
        }
        Command::Shortcuts => ShortcutRegistry::print_all(),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
