mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{bnk::BnkCommands, pck::PckCommands, project::ProjectCommands};

#[derive(Parser)]
#[command(name = "wwise-toolkit")]
#[command(about = "CLI for Wwise SoundBank (.bnk) and package (.pck) files", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SoundBank Operations (Info/Unpack/Pack/Replace)
    #[command(subcommand)]
    Bnk(BnkCommands),
    /// Package Operations (Info/Extract/Replace)
    #[command(subcommand)]
    Pck(PckCommands),
    /// Batch Project Operations (Validate/Run)
    #[command(subcommand)]
    Project(ProjectCommands),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Bnk(cmd) => commands::bnk::handle(cmd),
        Commands::Pck(cmd) => commands::pck::handle(cmd),
        Commands::Project(cmd) => commands::project::handle(cmd),
    }
}
