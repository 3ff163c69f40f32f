use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use fabriq_billing::config::BillingConfig;
use fabriq_billing::server::BillingServer;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "fabriq-billing")]
#[command(about = "Fabriq Billing Service - Equipment access policies and usage billing")]
struct Args {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Generate sample configuration file")]
    gen_config: bool,

    #[arg(long, help = "Dry run mode (validate config without starting)")]
    dry_run: bool,

    #[clap(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    fabriq_common::logging::init_logging(&args.verbosity, "fabriq_billing=info")?;

    if args.gen_config {
        println!("{}", BillingConfig::generate_example()?);
        return Ok(());
    }

    let config = BillingConfig::load(args.config.as_deref())?;

    info!("Starting Fabriq Billing Service");
    info!("Environment: {}", config.service.environment);
    info!(
        "Makerspace timezone offset: {}",
        config.makerspace.timezone_offset
    );

    let server = BillingServer::new(config)?;

    if args.dry_run {
        info!("Configuration validated successfully (dry-run mode)");
        return Ok(());
    }

    server.serve(shutdown_signal()).await?;

    info!("Fabriq Billing Service stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
