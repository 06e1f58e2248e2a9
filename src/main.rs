//! CropSync CLI - offline-tolerant companion for the farm management API

use clap::Parser;

mod cache;
mod cli;
mod client;
mod clock;
mod config;
mod error;
mod insights;
mod models;
mod output;
mod sync;

use cli::{Cli, Commands, GlobalOptions, RecordsCommands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Status => cli::status::run(&opts).await,
        Commands::Version => {
            println!("cropsync version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Records(records_cmd) => match records_cmd {
            RecordsCommands::List { history } => cli::records::list(&opts, history).await,
            RecordsCommands::Create { file } => cli::records::create(&opts, &file).await,
            RecordsCommands::Update { id, file } => cli::records::update(&opts, id, &file).await,
            RecordsCommands::Delete { id } => cli::records::delete(&opts, id).await,
        },
        Commands::Analytics => cli::insights::analytics(&opts).await,
        Commands::Alerts { dismiss } => cli::insights::alerts(&opts, &dismiss).await,
    }
}
