use std::sync::Arc;

use tracing::info;

use crate::config::{SourceDescriptor, SourceRegistry};
use crate::currency::CurrencyCodeTable;
use crate::dates;
use crate::error::Error;
use crate::fetch::{Fetcher, Transport};
use crate::types::ExchangeRate;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Reusable, reconfigurable query session against one exchange rate
/// source.
///
/// Parameter setters are total and validate nothing; everything is checked
/// when [`fetch`](Self::fetch) runs, before any request is issued. One
/// session owns its state exclusively, and `fetch` taking `&mut self`
/// keeps concurrent fetches on a single session unrepresentable.
#[derive(Debug)]
pub struct ExchangeRateSession {
    registry: Arc<SourceRegistry>,
    /// Active descriptor; carries its own key, so source id and config can
    /// only change together through [`set_source`](Self::set_source).
    source: SourceDescriptor,
    dates: Vec<String>,
    base_currency: String,
    local_currency: String,
    days_add: i64,
    date_format: String,
    fetcher: Fetcher,
    currency_codes: Arc<CurrencyCodeTable>,
    last_result: Vec<ExchangeRate>,
}

impl ExchangeRateSession {
    pub fn new(
        registry: Arc<SourceRegistry>,
        source: &str,
        dates: Vec<String>,
        base_currency: &str,
        local_currency: &str,
        transport: Arc<dyn Transport>,
        currency_codes: Arc<CurrencyCodeTable>,
    ) -> Result<Self, Error> {
        let descriptor = registry
            .lookup(source)
            .cloned()
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?;
        Ok(Self {
            registry,
            source: descriptor,
            dates,
            base_currency: base_currency.to_string(),
            local_currency: local_currency.to_string(),
            days_add: 1,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            fetcher: Fetcher::new(transport),
            currency_codes,
            last_result: Vec::new(),
        })
    }

    /// Switches the session to another registered source. On failure the
    /// previous source stays active.
    pub fn set_source(&mut self, source: &str) -> Result<(), Error> {
        let descriptor = self
            .registry
            .lookup(source)
            .cloned()
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?;
        self.source = descriptor;
        Ok(())
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn set_dates(&mut self, dates: Vec<String>) {
        self.dates = dates;
    }

    pub fn set_currencies(&mut self, base: &str, local: &str) {
        self.base_currency = base.to_string();
        self.local_currency = local.to_string();
    }

    pub fn set_days_add(&mut self, days_add: i64) {
        self.days_add = days_add;
    }

    pub fn set_date_format(&mut self, format: &str) {
        self.date_format = format.to_string();
    }

    /// Result of the most recent [`fetch`](Self::fetch); empty before the
    /// first call.
    pub fn last_result(&self) -> &[ExchangeRate] {
        &self.last_result
    }

    /// Expands the date specification, issues one request per date against
    /// the active source and maps the responses into canonical records.
    ///
    /// Configuration problems (unsupported currency, unusable date
    /// specification, broken URL template) error out before any request is
    /// issued. Individual request failures only shrink the result. Nothing
    /// is cached upstream: calling this twice re-issues every request.
    pub async fn fetch(&mut self) -> Result<&[ExchangeRate], Error> {
        if !self.source.supports_base(&self.base_currency) {
            return Err(Error::InvalidCurrency {
                source_key: self.source.key.clone(),
                currency: self.base_currency.clone(),
            });
        }
        if !self.source.supports_local(&self.local_currency) {
            return Err(Error::InvalidCurrency {
                source_key: self.source.key.clone(),
                currency: self.local_currency.clone(),
            });
        }

        let expanded = dates::expand(
            &self.dates,
            &self.date_format,
            &self.source.date_format,
            self.days_add,
        );
        if expanded.is_empty() {
            if self.dates.is_empty() {
                self.last_result.clear();
                return Ok(&self.last_result);
            }
            return Err(Error::InvalidDateFormat {
                spec: self.dates.clone(),
                format: self.date_format.clone(),
            });
        }

        let urls = expanded
            .iter()
            .map(|date| {
                self.source
                    .request_url(date, &self.base_currency, &self.local_currency)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Fetching {} date(s) from source '{}'",
            urls.len(),
            self.source.key
        );
        let bodies = self.fetcher.fetch_all(&urls, self.source.max_connections).await;
        self.last_result = self
            .source
            .mapper
            .map(&self.source, &self.currency_codes, &bodies);
        Ok(&self.last_result)
    }
}
