use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use super::has_required_fields;
use crate::config::SourceDescriptor;
use crate::types::ExchangeRate;

/// NBU quotes every rate against the hryvnia.
const UAH_NUMERIC: u16 = 980;

/// One element of the NBU statdirectory exchange array. `r030` is the ISO
/// 4217 numeric code of the quoted (base) currency.
#[derive(Debug, Deserialize)]
struct NbuEntry {
    r030: u16,
    rate: Decimal,
    exchangedate: String,
}

pub(super) fn map_body(source: &SourceDescriptor, body: &str) -> Vec<ExchangeRate> {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("source '{}': discarding malformed response: {}", source.key, e);
            return Vec::new();
        }
    };
    let Some(entries) = parsed.as_array() else {
        warn!("source '{}': expected a JSON array — discarded", source.key);
        return Vec::new();
    };

    // NBU answers a date with no published rate with an empty array.
    entries
        .iter()
        .filter(|entry| has_required_fields(entry, &source.required_fields))
        .filter_map(|entry| serde_json::from_value::<NbuEntry>(entry.clone()).ok())
        .filter_map(|entry| {
            let date = NaiveDate::parse_from_str(&entry.exchangedate, "%d.%m.%Y").ok()?;
            Some(ExchangeRate {
                source_id: source.id,
                date,
                local_currency: UAH_NUMERIC,
                base_currency: entry.r030,
                rate: entry.rate,
            })
        })
        .collect()
}
