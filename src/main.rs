use anyhow::Context;
use bitfinex_book::config::FeedConfig;
use bitfinex_book::feed::BookFeedClient;
use bitfinex_book::orderbook::{BookManager, Precision};
use bitfinex_book::report::{render_ladder, DEFAULT_BAR_WIDTH};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Rows rendered per side unless `--depth` is given
const DEFAULT_DEPTH: usize = 25;

/// Warn when the book has not changed for this long
const STALE_BOOK_MS: i64 = 30_000;

/// Command-line overrides on top of the environment configuration
#[derive(Debug, Default)]
struct CliOptions {
    symbol: Option<String>,
    precision: Option<String>,
    length: Option<String>,
    depth: Option<String>,
    interval_ms: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);

    // Stdout carries the ladder, logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = build_config(&options)?;
    let depth = render_depth(&options)?;

    tracing::info!(
        symbol = %config.symbol,
        precision = %config.precision,
        length = config.length,
        url = %config.ws_url,
        "Starting Bitfinex book viewer"
    );

    let manager = Arc::new(BookManager::new(config.precision));
    let (client, signals) = BookFeedClient::new(config.clone(), manager.precision_receiver());
    let feed_handle = client.start();

    let run_manager = manager.clone();
    let manager_handle = tokio::spawn(async move { run_manager.run(signals).await });

    // Precision commands typed on stdin (P0..P4)
    let input_manager = manager.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match line.parse::<Precision>() {
                    Ok(precision) => {
                        input_manager.set_precision(precision).await;
                    }
                    Err(e) if !line.trim().is_empty() => tracing::warn!("{}", e),
                    Err(_) => {}
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    let mut render_interval = tokio::time::interval(config.render_interval);

    loop {
        tokio::select! {
            _ = render_interval.tick() => {
                let view = manager.view_depth(depth).await;
                println!("{}", render_ladder(&view, &config.symbol, DEFAULT_BAR_WIDTH));

                if let Some(age_ms) = manager.last_update_age_ms().await {
                    if age_ms > STALE_BOOK_MS {
                        tracing::warn!(age_ms, "Book has not changed recently");
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Received shutdown signal (Ctrl+C)"),
                    Err(err) => tracing::error!("Failed to listen for shutdown signal: {}", err),
                }
                break;
            }
        }
    }

    feed_handle.abort();
    manager_handle.abort();
    tracing::info!("Book viewer stopped");

    Ok(())
}

/// Load environment configuration and apply command-line overrides
fn build_config(options: &CliOptions) -> anyhow::Result<FeedConfig> {
    let config = FeedConfig::from_env().context("Invalid environment configuration")?;
    apply_overrides(config, options)
}

/// Apply command-line overrides on top of `config` and validate the result
fn apply_overrides(mut config: FeedConfig, options: &CliOptions) -> anyhow::Result<FeedConfig> {
    if let Some(symbol) = &options.symbol {
        config.symbol = symbol.clone();
    }
    if let Some(precision) = &options.precision {
        config.precision = precision.parse().context("Invalid --precision")?;
    }
    if let Some(length) = &options.length {
        config.length = length
            .parse()
            .with_context(|| format!("Invalid --length: {}", length))?;
    }
    if let Some(interval) = &options.interval_ms {
        let millis: u64 = interval
            .parse()
            .with_context(|| format!("Invalid --interval-ms: {}", interval))?;
        config.render_interval = Duration::from_millis(millis);
    }

    config.validate()?;
    Ok(config)
}

/// Rows rendered per side, at least one
fn render_depth(options: &CliOptions) -> anyhow::Result<usize> {
    let Some(depth) = &options.depth else {
        return Ok(DEFAULT_DEPTH);
    };

    let depth: usize = depth
        .parse()
        .with_context(|| format!("Invalid --depth: {}", depth))?;
    anyhow::ensure!(depth > 0, "Invalid --depth: must be at least 1");
    Ok(depth)
}

/// Parse command-line arguments
fn parse_args(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--symbol" => {
                options.symbol = value;
                i += 1;
            }
            "--precision" => {
                options.precision = value;
                i += 1;
            }
            "--length" => {
                options.length = value;
                i += 1;
            }
            "--depth" => {
                options.depth = value;
                i += 1;
            }
            "--interval-ms" => {
                options.interval_ms = value;
                i += 1;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

/// Print usage information
fn print_usage() {
    println!("Bitfinex Book - live order book ladder for the Bitfinex public book channel");
    println!();
    println!("USAGE:");
    println!("    bitfinex-book [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --symbol <SYMBOL>       Trading pair (default: tBTCUSD)");
    println!("    --precision <P0..P4>    Initial price precision (default: P0)");
    println!("    --length <N>            Levels per side requested: 25, 100 or 250 (default: 25)");
    println!("    --depth <N>             Rows rendered per side (default: 25)");
    println!("    --interval-ms <MS>      Render interval in milliseconds (default: 1000)");
    println!("    --help, -h              Print this help message");
    println!();
    println!("While running, type P0..P4 and press Enter to change precision.");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    BITFINEX_WS_URL           WebSocket endpoint (default: wss://api-pub.bitfinex.com/ws/2)");
    println!("    BOOK_SYMBOL               Trading pair");
    println!("    BOOK_PRECISION            Initial precision");
    println!("    BOOK_LENGTH               Levels per side");
    println!("    BOOK_RENDER_INTERVAL_MS   Render interval");
    println!("    RUST_LOG                  Logging level (default: info)");
    println!();
    println!("EXAMPLES:");
    println!("    # Watch BTC/USD at three significant digits");
    println!("    bitfinex-book --precision P2");
    println!();
    println!("    # Watch ETH/USD, ten rows per side, twice a second");
    println!("    bitfinex-book --symbol tETHUSD --depth 10 --interval-ms 500");
}
