mod config;
mod currency;
mod dates;
mod error;
mod fetch;
mod mapper;
mod output;
mod session;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::fetch::ReqwestTransport;
use crate::session::ExchangeRateSession;

#[derive(Parser, Debug)]
#[command(
    name = "exrate",
    about = "Fetch historical currency exchange rates from public sources and normalize them into canonical records"
)]
struct Args {
    /// Dates to fetch: a single date, an ascending "from to" pair expanded
    /// into the full range, or an explicit list
    #[arg(required = true)]
    dates: Vec<String>,

    /// Exchange rate source key
    #[arg(short, long, default_value = "NBU-json")]
    source: String,

    /// ISO 4217 alphabetic base currency code (1 base = rate local)
    #[arg(short, long, default_value = "USD")]
    base: String,

    /// ISO 4217 alphabetic local currency code
    #[arg(short, long, default_value = "UAH")]
    local: String,

    /// Step in days when expanding a date range
    #[arg(long, default_value_t = 1)]
    days_add: i64,

    /// Format of the dates given on the command line
    #[arg(long, default_value = session::DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Output format: "table" (default), "json" or "csv"
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Load source descriptors from a YAML file instead of the builtin table
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Load the ISO 4217 table from a JSON file instead of the bundled copy
    #[arg(long, conflicts_with = "currency_download")]
    currency_file: Option<PathBuf>,

    /// Fetch the ISO 4217 table from the public registry instead of using
    /// the bundled copy
    #[arg(long)]
    currency_download: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let registry = match &args.sources {
        Some(path) => config::SourceRegistry::from_file(path)
            .with_context(|| format!("loading sources from {}", path.display()))?,
        None => config::SourceRegistry::builtin().context("loading builtin source table")?,
    };
    info!("Registered {} exchange rate source(s)", registry.source_count());

    let client = reqwest::Client::builder()
        .user_agent("exrate/0.1")
        .build()
        .context("building HTTP client")?;
    let transport = Arc::new(ReqwestTransport::new(client));

    let codes = match &args.currency_file {
        Some(path) => currency::CurrencyCodeTable::from_path(path)
            .with_context(|| format!("loading currency codes from {}", path.display()))?,
        None if args.currency_download => {
            currency::CurrencyCodeTable::download(
                transport.as_ref(),
                currency::REGISTRY_DATASET_URL,
            )
            .await
            .context("downloading currency codes from the public registry")?
        }
        None => currency::CurrencyCodeTable::bundled().context("loading bundled currency codes")?,
    };
    info!("Loaded {} ISO 4217 currency code(s)", codes.len());

    let mut session = ExchangeRateSession::new(
        Arc::new(registry),
        &args.source,
        args.dates.clone(),
        &args.base,
        &args.local,
        transport,
        Arc::new(codes),
    )?;
    session.set_days_add(args.days_add);
    session.set_date_format(&args.date_format);

    let rates = session.fetch().await?.to_vec();
    info!("Fetched {} exchange rate record(s)", rates.len());

    match args.output.as_str() {
        "json" => output::print_json(&rates)?,
        "csv" => output::write_csv(&rates, std::io::stdout())?,
        _ => output::print_table(&rates),
    }

    Ok(())
}
