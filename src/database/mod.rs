use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::models::{
    Config, IncomeStatementCorrection, IncomeStatementRecord, Metric, SchemaVariant, SentinelPolicy, Stock, StockPrice,
};

/// Outcome of one batch write. Failed statements are logged and counted,
/// never propagated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub written: usize,
    /// Rows left as they were because the key already existed
    pub unchanged: usize,
    pub failed: usize,
}

impl PersistSummary {
    fn record(&mut self, result: std::result::Result<u64, sqlx::Error>, key: &str, table: &str) {
        match result {
            Ok(0) => self.unchanged += 1,
            Ok(_) => self.written += 1,
            Err(e) => {
                warn!("⚠️ Could not write {} into {}: {}", key, table, e);
                self.failed += 1;
            }
        }
    }
}

/// A row of `income_statements` as read back for reporting
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IncomeStatementRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income_com: Option<f64>,
}

impl From<IncomeStatementRow> for IncomeStatementRecord {
    fn from(row: IncomeStatementRow) -> Self {
        let mut record = IncomeStatementRecord::new(row.symbol, row.date);
        record.set(Metric::Revenue, row.revenue);
        record.set(Metric::GrossProfit, row.gross_profit);
        record.set(Metric::OperatingIncome, row.operating_income);
        record.set(Metric::NetIncomeCom, row.net_income_com);
        record
    }
}

/// Postgres access. Every operation opens its own pool and closes it before
/// returning; nothing is held across a run.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    database_url: String,
    max_connections: u32,
    statement_delay: Duration,
}

impl DatabaseManager {
    pub fn new(database_url: impl Into<String>, max_connections: u32, statement_delay_ms: u64) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: max_connections.max(1),
            statement_delay: Duration::from_millis(statement_delay_ms),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.database_url, config.database_max_connections, config.postgres_delay_ms)
    }

    async fn connect(&self) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&self.database_url)
            .await?;
        Ok(pool)
    }

    async fn pace(&self) {
        if !self.statement_delay.is_zero() {
            tokio::time::sleep(self.statement_delay).await;
        }
    }

    /// Create the tables this pipeline writes
    pub async fn ensure_schema(&self, variant: SchemaVariant) -> Result<()> {
        let pool = self.connect().await?;

        let result = async {
            sqlx::query(&income_statements_ddl(variant)).execute(&pool).await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS stocks (
                    symbol TEXT PRIMARY KEY,
                    exchange_type TEXT NOT NULL,
                    name TEXT NOT NULL DEFAULT '',
                    central_index_key TEXT,
                    sector TEXT,
                    industry TEXT
                )
                "#,
            )
            .execute(&pool)
            .await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS stock_prices (
                    exchange_type TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    date DATE NOT NULL,
                    high DOUBLE PRECISION NOT NULL,
                    low DOUBLE PRECISION NOT NULL,
                    PRIMARY KEY (symbol, date)
                )
                "#,
            )
            .execute(&pool)
            .await?;

            Ok::<(), sqlx::Error>(())
        }
        .await;

        pool.close().await;
        result?;
        info!("✅ Database schema ready ({:?} income statements)", variant);
        Ok(())
    }

    /// Seed statements from an upstream; rows already stored for a
    /// (symbol, date) are left untouched.
    pub async fn insert_income_statements(
        &self,
        records: &[IncomeStatementRecord],
        variant: SchemaVariant,
        sentinel: SentinelPolicy,
    ) -> Result<PersistSummary> {
        let pool = self.connect().await?;
        let statement = insert_income_statement_sql(variant);
        let mut summary = PersistSummary::default();

        for record in records {
            self.pace().await;
            let mut query = sqlx::query(&statement).bind(&record.symbol).bind(record.date);
            for metric in variant.metrics() {
                query = query.bind(sentinel.apply(record.get(*metric)));
            }
            let result = query.execute(&pool).await.map(|r| r.rows_affected());
            summary.record(result, &format!("{} {}", record.symbol, record.date), "income_statements");
        }

        pool.close().await;
        info!(
            "💾 income_statements: {} inserted, {} already present, {} failed",
            summary.written, summary.unchanged, summary.failed
        );
        Ok(summary)
    }

    /// Manual corrections overwrite whatever the upstream supplied
    pub async fn upsert_income_statement_corrections(&self, corrections: &[IncomeStatementCorrection]) -> Result<PersistSummary> {
        let pool = self.connect().await?;
        let mut summary = PersistSummary::default();

        for correction in corrections {
            self.pace().await;
            let result = sqlx::query(
                r#"
                INSERT INTO income_statements (symbol, date, revenue, gross_profit, operating_income, net_income_com)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (symbol, date) DO UPDATE SET
                    revenue = EXCLUDED.revenue,
                    gross_profit = EXCLUDED.gross_profit,
                    operating_income = EXCLUDED.operating_income,
                    net_income_com = EXCLUDED.net_income_com
                "#,
            )
            .bind(&correction.symbol)
            .bind(correction.date)
            .bind(correction.revenue)
            .bind(correction.gross_profit)
            .bind(correction.operating_income)
            .bind(correction.net_income_com)
            .execute(&pool)
            .await
            .map(|r| r.rows_affected());
            summary.record(result, &format!("{} {}", correction.symbol, correction.date), "income_statements");
        }

        pool.close().await;
        info!("🛠️ Applied {} income statement corrections ({} failed)", summary.written, summary.failed);
        Ok(summary)
    }

    /// The newest `count` statements of every symbol, by symbol then newest first
    pub async fn read_recent_income_statements(&self, count: usize) -> Result<Vec<IncomeStatementRecord>> {
        let pool = self.connect().await?;

        let rows = sqlx::query_as::<_, IncomeStatementRow>(
            r#"
            SELECT symbol, date, revenue, gross_profit, operating_income, net_income_com
            FROM (
                SELECT *, rank() OVER (PARTITION BY symbol ORDER BY date DESC) AS period_rank
                FROM income_statements
            ) ranked
            WHERE period_rank <= $1
            ORDER BY symbol, period_rank
            "#,
        )
        .bind(count as i64)
        .fetch_all(&pool)
        .await;

        pool.close().await;
        let rows = rows?;
        info!("📖 Read {} recent income statements", rows.len());
        Ok(rows.into_iter().map(IncomeStatementRecord::from).collect())
    }

    pub async fn upsert_stocks(&self, stocks: &[Stock]) -> Result<PersistSummary> {
        let pool = self.connect().await?;
        let mut summary = PersistSummary::default();

        for stock in stocks {
            self.pace().await;
            let result = sqlx::query(
                r#"
                INSERT INTO stocks (symbol, exchange_type, name, central_index_key, sector, industry)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (symbol) DO UPDATE SET
                    exchange_type = EXCLUDED.exchange_type,
                    name = EXCLUDED.name,
                    central_index_key = EXCLUDED.central_index_key,
                    sector = EXCLUDED.sector,
                    industry = EXCLUDED.industry
                "#,
            )
            .bind(&stock.symbol)
            .bind(stock.exchange_type.as_str())
            .bind(&stock.name)
            .bind(&stock.central_index_key)
            .bind(&stock.sector)
            .bind(&stock.industry)
            .execute(&pool)
            .await
            .map(|r| r.rows_affected());
            summary.record(result, &stock.symbol, "stocks");
        }

        pool.close().await;
        info!("💾 stocks: {} written, {} failed", summary.written, summary.failed);
        Ok(summary)
    }

    pub async fn upsert_stock_prices(&self, prices: &[StockPrice]) -> Result<PersistSummary> {
        let pool = self.connect().await?;
        let mut summary = PersistSummary::default();

        for price in prices {
            self.pace().await;
            let result = sqlx::query(
                r#"
                INSERT INTO stock_prices (exchange_type, symbol, date, high, low)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (symbol, date) DO UPDATE SET
                    exchange_type = EXCLUDED.exchange_type,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low
                "#,
            )
            .bind(&price.exchange_type)
            .bind(&price.symbol)
            .bind(price.date)
            .bind(price.high)
            .bind(price.low)
            .execute(&pool)
            .await
            .map(|r| r.rows_affected());
            summary.record(result, &format!("{} {}", price.symbol, price.date), "stock_prices");
        }

        pool.close().await;
        info!("💾 stock_prices: {} written, {} failed", summary.written, summary.failed);
        Ok(summary)
    }

    pub async fn read_stock_prices(&self, dates: &[NaiveDate], symbols: &[String]) -> Result<Vec<StockPrice>> {
        let pool = self.connect().await?;

        let prices = sqlx::query_as::<_, StockPrice>(
            r#"
            SELECT exchange_type, symbol, date, high, low
            FROM stock_prices
            WHERE date = ANY($1) AND symbol = ANY($2)
            ORDER BY symbol, date DESC
            "#,
        )
        .bind(dates.to_vec())
        .bind(symbols.to_vec())
        .fetch_all(&pool)
        .await;

        pool.close().await;
        Ok(prices?)
    }
}

/// `CREATE TABLE` for the chosen column set, keyed by (symbol, date)
pub fn income_statements_ddl(variant: SchemaVariant) -> String {
    let columns: Vec<String> = variant
        .metrics()
        .iter()
        .map(|metric| format!("    {} DOUBLE PRECISION", metric.column()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS income_statements (\n    symbol TEXT NOT NULL,\n    date DATE NOT NULL,\n{},\n    PRIMARY KEY (symbol, date)\n)",
        columns.join(",\n")
    )
}

fn insert_income_statement_sql(variant: SchemaVariant) -> String {
    let metrics = variant.metrics();
    let columns: Vec<&str> = metrics.iter().map(Metric::column).collect();
    let placeholders: Vec<String> = (1..=metrics.len() + 2).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO income_statements (symbol, date, {}) VALUES ({}) ON CONFLICT (symbol, date) DO NOTHING",
        columns.join(", "),
        placeholders.join(", ")
    )
}
