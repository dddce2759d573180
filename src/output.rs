use std::io;

use anyhow::{Context, Result};

use crate::types::ExchangeRate;

pub fn print_table(rates: &[ExchangeRate]) {
    println!(
        "\n{:<8} {:<12} {:<6} {:<7} {}",
        "Source", "Date", "Base", "Local", "Rate"
    );
    println!("{}", "-".repeat(48));
    for rate in rates {
        println!(
            "{:<8} {:<12} {:<6} {:<7} {}",
            rate.source_id, rate.date, rate.base_currency, rate.local_currency, rate.rate
        );
    }
    println!();
}

pub fn print_json(rates: &[ExchangeRate]) -> Result<()> {
    let json = serde_json::to_string_pretty(rates).context("serializing exchange rates")?;
    println!("{}", json);
    Ok(())
}

pub fn write_csv<W: io::Write>(rates: &[ExchangeRate], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for rate in rates {
        writer.serialize(rate).context("writing csv record")?;
    }
    writer.flush().context("flushing csv output")?;
    Ok(())
}
