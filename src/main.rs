use std::net::IpAddr;
use std::path::PathBuf;

use accrue::api::{ServerConfig, run_http_server};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "accrue",
    version,
    about = "Contribution plan projections (fixed, escalating, freeform, goal) over a local JSON API"
)]
struct Cli {
    /// Log filter, e.g. "info" or "accrue=debug"
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the projection API
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,
        /// JSON file for saved projections and the draft; memory-only when omitted
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Command::Serve {
            port,
            bind,
            data_file,
        } => {
            let config = ServerConfig {
                bind,
                port,
                data_file,
            };
            if let Err(e) = run_http_server(config).await {
                error!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
