//! `order-history` command line entry point
//!
//! Loads configuration, connects to a WebDriver endpoint and runs one
//! extraction session, closing the browser however the run ends.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use order_history_lib::application::{
    ExtractionSession, RunSummary, TEST_ORDER_NUMBERS, parse_order_numbers,
};
use order_history_lib::infrastructure::config::AppConfig;
use order_history_lib::infrastructure::{WebDriverSession, init_logging_with_config, log_system_info};

#[derive(Parser, Debug)]
#[command(name = "order-history")]
#[command(about = "Extract order history through a WebDriver-controlled browser")]
#[command(version)]
struct Cli {
    /// Order numbers to look up: JSON list, JSON string, comma-separated list or a single id
    #[arg(short, long)]
    orders: Option<String>,

    /// Look up the built-in test order numbers
    #[arg(short, long, conflicts_with = "orders")]
    test: bool,

    /// Run the browser without a window
    #[arg(short = 'H', long)]
    headless: bool,

    /// Restrict the listing to one year; a bare year such as 2023 selects the
    /// dropdown option `year-2023`, any other value is used as the option value as-is
    #[arg(short, long)]
    year: Option<String>,

    /// Maximum number of listing pages to read
    #[arg(short, long)]
    max_pages: Option<u32>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the CSV and JSON exports
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// WebDriver endpoint (chromedriver or geckodriver)
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer command line overrides on top of the loaded configuration
    fn apply_to(&self, config: &mut AppConfig) {
        if self.test {
            config.extraction.target_ids = TEST_ORDER_NUMBERS.iter().map(ToString::to_string).collect();
        } else if let Some(input) = &self.orders {
            config.extraction.target_ids = parse_order_numbers(input);
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(year) = &self.year {
            config.extraction.year_filter = Some(year.clone());
        }
        if let Some(max_pages) = self.max_pages {
            config.extraction.max_pages = Some(max_pages);
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory.clone_from(dir);
        }
        if let Some(url) = &self.webdriver_url {
            config.browser.webdriver_url.clone_from(url);
        }
        match self.verbose {
            0 => {}
            1 => config.logging.level = "debug".to_string(),
            _ => config.logging.level = "trace".to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Extraction failed: {:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    print_banner();
    if cli.orders.is_some() && config.extraction.target_ids.is_empty() {
        warn!("No order numbers could be parsed from --orders; extracting all orders instead");
    }
    print_config_summary(&config);

    let driver = WebDriverSession::connect(&config.browser)
        .await
        .with_context(|| format!("Failed to start browser via {}", config.browser.webdriver_url))?;
    let session = ExtractionSession::new(driver, config)?;

    let result = tokio::select! {
        result = session.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Err(e) = session.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }

    match result {
        Some(Ok(summary)) => {
            print_run_summary(&summary);
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            warn!("Interrupted; no files were written");
            println!("\nInterrupted. No files were written.");
            Ok(())
        }
    }
}

fn print_banner() {
    println!("{}", "=".repeat(60));
    println!("Order History Extractor");
    println!("{}", "=".repeat(60));
    println!("\nExtracts your order history into CSV and JSON files.");
    println!("Log in to your account in the browser window when prompted.");
    println!("\nPress Ctrl+C at any time to exit\n");
}

fn print_config_summary(config: &AppConfig) {
    let extraction = &config.extraction;
    println!("Configuration:");
    println!("  Orders page:  {}", config.site.orders_url());
    println!("  Browser:      {:?} (headless: {})", config.browser.browser, config.browser.headless);
    println!(
        "  Max pages:    {}",
        extraction.max_pages.map_or_else(|| "all".to_string(), |n| n.to_string())
    );
    println!("  Year filter:  {}", extraction.year_filter.as_deref().unwrap_or("none"));
    if extraction.target_ids.is_empty() {
        println!("  Mode:         all orders");
    } else {
        println!("  Mode:         {} specific orders", extraction.target_ids.len());
    }
    println!("  Output:       {}\n", config.output.directory.display());
}

fn print_run_summary(summary: &RunSummary) {
    let outcome = &summary.outcome;
    info!(
        "Run {} finished: {} orders, {} pages, stopped because {}",
        summary.run_id,
        outcome.orders.len(),
        outcome.pages_visited,
        outcome.stop_reason
    );

    let Some(export) = &summary.export else {
        println!("No orders were found. Please check your account or try again.");
        return;
    };
    println!("\nExtracted {} orders in total", outcome.orders.len());
    if !outcome.unresolved_targets.is_empty() {
        println!("Not found: {}", outcome.unresolved_targets.join(", "));
    }
    println!("\nOrder data saved to:");
    for path in export.written() {
        println!("  - {}", path.display());
    }
    if !export.is_success() {
        println!("Some exports failed; see the log for details.");
    }
}
