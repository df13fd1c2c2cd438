//! Balance Aligner - Main Entry Point
//!
//! Runs the alignment loop against the venues defined in the config file.

use anyhow::{Context, Result};
use balance_aligner::config::{Config, LoggingConfig, VenueConfig};
use balance_aligner::exchange::{BalanceMap, PaperVenue, VenueSession};
use balance_aligner::strategy::{AlignmentCycle, Scheduler};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Balance Aligner CLI
#[derive(Parser)]
#[command(name = "balance-aligner")]
#[command(version, about = "Keep per-currency balances across venues at their targets")]
struct Cli {
    /// Config file (extension optional); defaults to ./config.*
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log planned orders without submitting them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run alignment cycles until Ctrl-C (default)
    Run,

    /// Run a single cycle and print its report as JSON
    Once,

    /// Print per-venue and total balances
    Balances,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.alignment.dry_run = true;
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&config.logging)?;

    config.validate()?;
    log_config(&config);

    let sessions = build_sessions(&config.venues);

    match cli.command {
        Some(Commands::Balances) => show_balances(&config, &sessions).await,
        Some(Commands::Once) => {
            let mut cycle = AlignmentCycle::new(config.alignment.clone(), &sessions)?;
            let report = cycle.run_once().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some(Commands::Run) | None => run(config, sessions).await,
    }
}

/// Run the scheduler until Ctrl-C.
async fn run(config: Config, sessions: HashMap<String, Arc<dyn VenueSession>>) -> Result<()> {
    let cycle = AlignmentCycle::new(config.alignment.clone(), &sessions)?;
    let scheduler = Scheduler::new(config.alignment.interval());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    info!("Starting alignment loop");
    let cycles = scheduler
        .spawn(cycle, shutdown_rx)
        .await
        .context("Alignment task failed")?;

    info!(cycles, "Balance aligner shutdown complete");
    Ok(())
}

/// Build one paper venue per configured entry.
fn build_sessions(venues: &[VenueConfig]) -> HashMap<String, Arc<dyn VenueSession>> {
    venues
        .iter()
        .map(|venue| {
            let mut paper = PaperVenue::new(&venue.name);
            for market in &venue.markets {
                paper = paper.with_market(market.clone());
            }
            for (currency, balance) in &venue.balances {
                paper = paper.with_balance(currency, *balance);
            }
            for (symbol, ticker) in &venue.tickers {
                paper = paper.with_ticker(symbol, *ticker);
            }
            (venue.name.clone(), Arc::new(paper) as Arc<dyn VenueSession>)
        })
        .collect()
}

/// Refresh every configured venue and print its balances.
async fn show_balances(
    config: &Config,
    sessions: &HashMap<String, Arc<dyn VenueSession>>,
) -> Result<()> {
    let mut total = BalanceMap::new();

    for venue in &config.venues {
        let name = &venue.name;
        let Some(session) = sessions.get(name) else {
            continue;
        };
        session
            .refresh_account()
            .await
            .with_context(|| format!("Failed to refresh {name}"))?;
        let balances = session.balances().await;

        println!("{name}:");
        print_balances(&balances);
        total.add(&balances);
    }

    println!("total:");
    print_balances(&total);

    for (currency, target) in &config.alignment.expected_balances {
        println!(
            "target {currency}: {target} (net {}, delta {})",
            total.net(currency),
            *target - total.net(currency)
        );
    }
    Ok(())
}

fn print_balances(balances: &BalanceMap) {
    for (currency, balance) in balances.iter() {
        println!(
            "  {:<8} available {:>18} locked {:>18} net {:>18}",
            currency,
            balance.available,
            balance.locked,
            balance.net()
        );
    }
}

/// Initialize logging to stdout and an hourly rolling file.
fn init_logging(logging: &LoggingConfig) -> Result<WorkerGuard> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("Failed to create log directory {}", logging.directory))?;

    let file_appender = tracing_appender::rolling::hourly(&logging.directory, &logging.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(logging.filter.parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(guard)
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    let alignment = &config.alignment;
    info!("Configuration:");
    info!("   Sessions: {}", alignment.sessions.join(", "));
    if let Some(quotes) = &alignment.quote_currencies {
        info!(
            "   Quote currencies: buy [{}], sell [{}]",
            quotes.buy.join(", "),
            quotes.sell.join(", ")
        );
    }
    for (currency, target) in &alignment.expected_balances {
        info!("   Target {}: {}", currency, target);
    }
    info!("   Interval: {}s", alignment.interval_secs);
    info!(
        "   Taker orders: {}, dry run: {}",
        alignment.use_taker_order, alignment.dry_run
    );
    if alignment.dry_run {
        warn!("DRY RUN - orders are logged, not submitted");
    }
}
