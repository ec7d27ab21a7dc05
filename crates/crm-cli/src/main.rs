mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "crm-sync",
    about = "CRM data-sync jobs: product, sales-rep and quote ingestion plus the response endpoint",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a quote archive and send due follow-up emails
    Quotes {
        /// Storage event JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        event: String,
        /// Reference time for the cadence window (default: now, local time)
        #[arg(long)]
        now: Option<String>,
    },

    /// Ingest a product catalogue export
    Products {
        /// Storage event JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        event: String,
    },

    /// Ingest the sales-rep sheet
    SalesReps {
        /// Storage event JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        event: String,
    },

    /// Serve the response-tracking endpoint
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080", env = "PORT")]
        port: u16,
    },

    /// Print every item of a table as JSON
    Dump {
        /// Table name
        table: String,
        /// Database file
        #[arg(long, env = "CRM_STORE_PATH", default_value = "crm.redb")]
        store: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Quotes { event, now } => cmd::quotes::run(&event, now.as_deref()),
        Commands::Products { event } => cmd::products::run(&event),
        Commands::SalesReps { event } => cmd::sales_reps::run(&event),
        Commands::Serve { port } => cmd::serve::run(port),
        Commands::Dump { table, store } => cmd::dump::run(&store, &table),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
