//! falkorlinkd — the FalkorLink daemon.
//!
//! Single binary that assembles:
//! - State store (redb) holding site configuration and environment variables
//! - Fleet client for instance discovery
//! - Reconciler
//! - REST API
//!
//! # Usage
//!
//! ```text
//! falkorlinkd serve --port 8443 --data-dir /var/lib/falkorlink
//! falkorlinkd print-config --config falkorlink.toml
//! ```

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "falkorlinkd", about = "FalkorLink daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve(serve::ServeArgs),

    /// Print the effective configuration as TOML (secrets included).
    PrintConfig {
        /// Configuration file to load.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve(args) => serve::run(args).await,
        Command::PrintConfig { config } => {
            let config = serve::load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,falkorlinkd=debug,falkorlink=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
