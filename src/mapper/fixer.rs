use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use super::has_required_fields;
use crate::config::SourceDescriptor;
use crate::currency::CurrencyCodeTable;
use crate::types::ExchangeRate;

/// Fixer answers one object per requested date. The rates map is keyed by
/// alphabetic currency codes; a BTreeMap keeps record order deterministic.
#[derive(Debug, Deserialize)]
struct FixerPayload {
    base: String,
    date: String,
    rates: BTreeMap<String, Decimal>,
}

pub(super) fn map_body(
    source: &SourceDescriptor,
    codes: &CurrencyCodeTable,
    body: &str,
) -> Vec<ExchangeRate> {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("source '{}': discarding malformed response: {}", source.key, e);
            return Vec::new();
        }
    };
    if !has_required_fields(&parsed, &source.required_fields) {
        warn!("source '{}': response is missing required fields — discarded", source.key);
        return Vec::new();
    }
    let payload: FixerPayload = match serde_json::from_value(parsed) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("source '{}': discarding unusable response: {}", source.key, e);
            return Vec::new();
        }
    };

    let Ok(date) = NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d") else {
        warn!(
            "source '{}': unparseable date '{}' — discarded",
            source.key, payload.date
        );
        return Vec::new();
    };
    let Some(base_currency) = codes.numeric_code(&payload.base) else {
        warn!(
            "source '{}': base currency '{}' is not in the ISO 4217 table — discarded",
            source.key, payload.base
        );
        return Vec::new();
    };

    payload
        .rates
        .iter()
        .filter_map(|(alpha, rate)| {
            // Entries outside the ISO table cannot be represented in the
            // canonical numeric form.
            let local_currency = codes.numeric_code(alpha)?;
            Some(ExchangeRate {
                source_id: source.id,
                date,
                local_currency,
                base_currency,
                rate: *rate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::SourceRegistry;

    fn fixer_descriptor() -> SourceDescriptor {
        SourceRegistry::builtin()
            .unwrap()
            .lookup("ECB-Fixer")
            .unwrap()
            .clone()
    }

    fn codes() -> CurrencyCodeTable {
        CurrencyCodeTable::bundled().unwrap()
    }

    #[test]
    fn maps_one_record_per_rates_entry() {
        let body = r#"{"base":"EUR","date":"2016-11-21","rates":{"PLN":4.4307,"USD":1.0612}}"#;
        let rates = map_body(&fixer_descriptor(), &codes(), body);

        assert_eq!(rates.len(), 2);
        // BTreeMap iteration: PLN before USD.
        assert_eq!(rates[0].local_currency, 985);
        assert_eq!(rates[0].rate, dec!(4.4307));
        assert_eq!(rates[1].local_currency, 840);
        assert_eq!(rates[1].rate, dec!(1.0612));
        for rate in &rates {
            assert_eq!(rate.source_id, 2);
            assert_eq!(rate.base_currency, 978);
            assert_eq!(rate.date, NaiveDate::from_ymd_opt(2016, 11, 21).unwrap());
        }
    }

    #[test]
    fn entries_outside_the_iso_table_are_dropped() {
        let body = r#"{"base":"EUR","date":"2016-11-21","rates":{"ZZZ":9.9,"PLN":4.4307}}"#;
        let rates = map_body(&fixer_descriptor(), &codes(), body);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].local_currency, 985);
    }

    #[test]
    fn unknown_base_currency_drops_the_body() {
        let body = r#"{"base":"ZZZ","date":"2016-11-21","rates":{"PLN":4.4307}}"#;
        assert!(map_body(&fixer_descriptor(), &codes(), body).is_empty());
    }

    #[test]
    fn missing_required_fields_drop_the_body() {
        let body = r#"{"error":"date not found"}"#;
        assert!(map_body(&fixer_descriptor(), &codes(), body).is_empty());
    }

    #[test]
    fn malformed_json_maps_to_no_records() {
        assert!(map_body(&fixer_descriptor(), &codes(), "{not json").is_empty());
    }
}
