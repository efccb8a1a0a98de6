//! Financial data refresh
//!
//! Pulls income statements, historic prices and crypto listings from their
//! upstreams, persists them to Postgres and writes the flat-file reports.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stock_financials::data_collector::DataCollector;
use stock_financials::financials::{FrameWindow, QuarterFrame};
use stock_financials::models::{Config, IncomeSource, RunConfig, SchemaVariant, SentinelPolicy};

#[derive(Parser)]
#[command(
    name = "stock-financials",
    about = "🔄 Financial data refresh",
    long_about = "Refreshes income statements (SEC filings or vendor), historic stock prices and crypto listings, then writes the recent financials report."
)]
struct Cli {
    /// Upstream for income statements
    #[arg(long, value_enum, default_value = "filings")]
    source: IncomeSource,

    /// Column set of the income_statements table
    #[arg(long, value_enum, default_value = "reduced")]
    schema: SchemaVariant,

    /// How undetermined values are written
    #[arg(long, value_enum, default_value = "legacy-zero")]
    sentinel: SentinelPolicy,

    /// Do not fetch income statements
    #[arg(long)]
    skip_income_statements: bool,

    /// Apply the manual income statement corrections file
    #[arg(long)]
    corrections: bool,

    /// Refresh historic stock prices and the price summary
    #[arg(long)]
    prices: bool,

    /// Refresh crypto listings
    #[arg(long)]
    crypto: bool,

    /// Upsert the stock roster into the database
    #[arg(long)]
    stock_list: bool,

    /// Only seed these symbols from upstream (repeatable)
    #[arg(long = "new-stock", value_name = "SYMBOL")]
    new_stocks: Vec<String>,

    /// Number of quarters derived per company
    #[arg(long, default_value_t = 12, value_parser = FrameWindow::parse_periods)]
    window: usize,

    /// Newest quarter that may have been reported, e.g. CY2025Q3
    #[arg(long)]
    newest_quarter: Option<QuarterFrame>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let newest = self
            .newest_quarter
            .unwrap_or_else(|| QuarterFrame::last_completed_before(Utc::now().date_naive()));

        let mut run = RunConfig::new(FrameWindow::new(newest, self.window));
        run.update_stock_list = self.stock_list;
        run.update_income_statements = !self.skip_income_statements;
        run.upsert_corrections = self.corrections;
        run.update_stock_prices = self.prices;
        run.update_crypto = self.crypto;
        run.income_source = self.source;
        run.schema = self.schema;
        run.sentinel = self.sentinel;
        run.new_stocks = self.new_stocks.clone();
        run
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_financials=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    let run = cli.run_config();
    if let Err(e) = config.require_credentials(&run) {
        eprintln!("❌ Configuration Error: {}", e);
        eprintln!("Make sure your .env file has the credentials for the datasets you enabled.");
        std::process::exit(1);
    }

    info!(
        "📅 Deriving {} quarters back from {} ({:?} source)",
        run.frame_window.periods, run.frame_window.newest, run.income_source
    );

    let collector = DataCollector::from_config(&config)?;
    let summary = collector.run(&run).await?;

    println!("✅ Refresh complete");
    println!("   Stocks read:           {}", summary.stocks_read);
    println!("   Statements collected:  {}", summary.statements_collected);
    println!("   Statements written:    {}", summary.statements.written);
    println!("   Recent financials:     {}", summary.recent_financials_rows);
    if run.update_stock_prices {
        println!("   Price summaries:       {}", summary.price_summaries);
    }
    if run.update_crypto {
        println!("   Crypto listings:       {}", summary.crypto_listings);
    }
    if !summary.skipped_units.is_empty() {
        println!("⚠️  Skipped: {}", summary.skipped_units.join(", "));
    }
    if !summary.failed_stages.is_empty() {
        println!("❌ Failed stages: {}", summary.failed_stages.join(", "));
        std::process::exit(2);
    }

    Ok(())
}
