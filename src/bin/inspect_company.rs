//! Print the derived periods and assembled statements of one company without
//! touching the database.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stock_financials::api::{EdgarClient, FilingsProvider};
use stock_financials::financials::{FallbackPolicy, FilingsAssembler, FrameWindow, QuarterFrame};
use stock_financials::models::Config;

#[derive(Parser)]
#[command(name = "inspect_company", about = "🔍 Inspect SEC company facts for one CIK")]
struct Cli {
    /// Central index key, with or without leading zeros
    cik: String,

    /// Symbol printed on the statements
    #[arg(long, default_value = "UNKNOWN")]
    symbol: String,

    /// Quarters to derive, 12 or 8
    #[arg(long, default_value_t = 12, value_parser = FrameWindow::parse_periods)]
    window: usize,

    /// Newest quarter that may have been reported, e.g. CY2025Q3
    #[arg(long)]
    newest_quarter: Option<QuarterFrame>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_financials=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let client = EdgarClient::new(&config)?;

    let newest = cli
        .newest_quarter
        .unwrap_or_else(|| QuarterFrame::last_completed_before(Utc::now().date_naive()));
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(newest, cli.window));

    let facts = client.fetch_company_facts(&cli.cik).await?;
    println!(
        "🏢 {} (CIK {})",
        facts.entity_name.as_deref().unwrap_or("unknown entity"),
        cli.cik
    );

    println!("\n📅 Periods:");
    for period in assembler.periods(&facts) {
        println!(
            "  {:>2}  {}  {:<10}  {}",
            period.rank,
            period.slot,
            period.frame.as_deref().unwrap_or("-"),
            period.end
        );
    }

    println!("\n📊 Statements (millions):");
    for record in assembler.assemble(&cli.symbol, &facts) {
        let values: Vec<String> = record
            .metrics()
            .map(|(metric, value)| format!("{}={}", metric.column(), value))
            .collect();
        println!("  {}  {}", record.date, values.join("  "));
    }

    Ok(())
}
