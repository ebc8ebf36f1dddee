use agriprice::core::SeriesSource;
use agriprice::core::log::init_logging;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

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

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Csv,
    Yahoo,
}

impl From<Source> for SeriesSource {
    fn from(source: Source) -> SeriesSource {
        match source {
            Source::Csv => SeriesSource::Csv,
            Source::Yahoo => SeriesSource::Yahoo,
        }
    }
}

impl From<Commands> for agriprice::AppCommand {
    fn from(cmd: Commands) -> agriprice::AppCommand {
        match cmd {
            Commands::Products => agriprice::AppCommand::Products,
            Commands::Show {
                product,
                source,
                horizon,
            } => agriprice::AppCommand::Show {
                product,
                source: source.into(),
                horizon: horizon.map(usize::from),
            },
            Commands::Dashboard => agriprice::AppCommand::Dashboard,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the products in the catalog
    Products,
    /// Show price history and trend projection for one product
    Show {
        /// Product name, e.g. "Wheat"
        #[arg(short, long)]
        product: String,
        /// Where to load the price history from
        #[arg(short, long, value_enum, default_value_t = Source::Csv)]
        source: Source,
        /// Number of days to project (overrides the config)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        horizon: Option<u16>,
    },
    /// Interactive product and source selection
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => agriprice::cli::setup::setup(),
        Some(cmd) => agriprice::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
