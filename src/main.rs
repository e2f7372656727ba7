use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;

use chrono::Local;
use cli::Cli;
use cli::commands::Commands;

use trafficr::behavior::BehaviorProfile;
use trafficr::collab::stub::{DirectNetwork, LogOnlyBrowser, NoopCaptcha};
use trafficr::config::Config;
use trafficr::engine::TrafficEngine;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trafficr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("trafficr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_engine(config: &Config) -> Result<TrafficEngine> {
    let now = Local::now().naive_local();
    let profile = BehaviorProfile::new(config.behavior.clone())?;
    let schedule = config.campaign.build_schedule(now)?;

    let engine = TrafficEngine::new(
        profile,
        schedule,
        Arc::new(LogOnlyBrowser),
        Arc::new(NoopCaptcha),
        Arc::new(DirectNetwork),
    )
    .with_pacing(config.engine.pacing())
    .with_max_workers(config.engine.max_workers);

    engine.set_keywords(config.engine.keywords.clone());
    engine.set_urls(config.engine.urls.clone());

    if let Some(path) = &config.engine.keyword_file {
        let count = engine.load_keywords(path)?;
        info!("Loaded {} keywords from {}", count, path.display());
    }
    if let Some(path) = &config.engine.url_file {
        let count = engine.load_urls(path)?;
        info!("Loaded {} URLs from {}", count, path.display());
    }

    Ok(engine)
}

async fn handle_run_command(
    workers: Option<usize>,
    duration: Option<u64>,
    config: &Config,
) -> Result<()> {
    let engine = build_engine(config)?;
    let worker_count = workers.unwrap_or(config.engine.workers);

    println!(
        "{} {} workers",
        "Starting traffic engine with".cyan(),
        worker_count
    );
    engine.start(worker_count);

    match duration {
        Some(secs) => {
            info!("Running for {} seconds", secs);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        None => {
            println!("{}", "Press Ctrl-C to stop".yellow());
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
        }
    }

    println!("{}", "Stopping...".yellow());
    engine.stop().await;

    let stats = engine.get_stats();
    println!("{}", "Final stats:".green());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn handle_preview_command(config: &Config) -> Result<()> {
    let now = Local::now().naive_local();
    let schedule = config.campaign.build_schedule(now)?;
    let stats = schedule.stats(now);

    println!("{}", "Derived schedule:".green());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!(
        "{} {}",
        "Hourly buckets materialized:".cyan(),
        schedule.hourly_targets().len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    info!("Starting with config from: {:?}", cli.config);

    match cli.command {
        None => handle_run_command(None, None, &config).await?,
        Some(Commands::Run { workers, duration }) => {
            handle_run_command(workers, duration, &config).await?
        }
        Some(Commands::Preview) => handle_preview_command(&config)?,
    }

    Ok(())
}
