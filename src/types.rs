use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Canonical exchange rate record every source is normalized into.
///
/// Reads as "1 unit of the base currency = `rate` units of the local
/// currency on `date`, as reported by source `source_id`". Currency codes
/// are ISO 4217 numeric; `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    pub source_id: u32,
    pub date: NaiveDate,
    pub local_currency: u16,
    pub base_currency: u16,
    pub rate: Decimal,
}
