//! Wipes the swayami development database so sign-up can be tested from a
//! clean slate.
//!
//! Usage:
//!   swayami-clean-db            # asks twice before deleting
//!   swayami-clean-db --confirm  # no prompts
//!   swayami-clean-db --stats    # counts only

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use swayami_maintenance::{
    clean_with_confirmation, collect_stats, CleanupError, DocumentStore, MongoStore, COLLECTIONS,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swayami-clean-db")]
#[command(about = "Delete every document from the swayami development database")]
struct Args {
    /// Skip both confirmation prompts.
    #[arg(long)]
    confirm: bool,

    /// Print document counts per collection and exit without deleting.
    #[arg(long)]
    stats: bool,

    /// Connection string (falls back to MONGODB_URL).
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    mongodb_uri: Option<String>,

    #[arg(long, env = "DATABASE_NAME", default_value = "Swayami")]
    database: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let uri = args
        .mongodb_uri
        .or_else(|| std::env::var("MONGODB_URL").ok())
        .filter(|uri| !uri.trim().is_empty())
        .ok_or(CleanupError::MissingUri)?;

    let mut stdout = io::stdout();
    writeln!(stdout, "{}", "=".repeat(50))?;
    writeln!(stdout, "SWAYAMI DATABASE CLEANUP")?;
    writeln!(stdout, "{}", "=".repeat(50))?;

    let store = MongoStore::connect(&uri, &args.database)
        .await
        .map_err(CleanupError::Connection)?;

    if args.stats {
        store.ping().await.map_err(CleanupError::Connection)?;
        info!("Connected to MongoDB database: {}", store.database_name());
        let stats = collect_stats(&store).await?;
        write!(stdout, "{stats}")?;
        return Ok(ExitCode::SUCCESS);
    }

    info!("Target database: {}", store.database_name());
    clean_with_confirmation(
        &store,
        &mut io::stdin().lock(),
        &mut stdout,
        &COLLECTIONS,
        args.confirm,
    )
    .await?;

    Ok(ExitCode::SUCCESS)
}
