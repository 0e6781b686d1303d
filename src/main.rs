use anyhow::Result;
use bondalloc::core::log::init_logging;
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AllocArgs {
    /// Total amount to invest, overrides the config
    #[arg(short, long)]
    amount: Option<f64>,

    /// Fund allocation as SYMBOL=PERCENT, may be repeated
    #[arg(short, long = "set", value_name = "SYMBOL=PERCENT")]
    set: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display allocation table and estimated income
    Alloc(AllocArgs),
    /// Display current bond fund information
    Funds,
    /// Edit allocations interactively
    Interactive(AllocArgs),
}

impl From<Commands> for bondalloc::AppCommand {
    fn from(cmd: Commands) -> bondalloc::AppCommand {
        match cmd {
            Commands::Alloc(args) => bondalloc::AppCommand::Alloc {
                amount: args.amount,
                assignments: args.set,
            },
            Commands::Funds => bondalloc::AppCommand::Funds,
            Commands::Interactive(args) => bondalloc::AppCommand::Interactive {
                amount: args.amount,
                assignments: args.set,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => bondalloc::cli::setup::setup(),
        Some(cmd) => bondalloc::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
