use thiserror::Error;

/// Errors surfaced to callers of the session API.
///
/// Per-request failures (network errors, non-2xx statuses, timeouts,
/// unusable payloads) are never represented here: the fetch and mapping
/// layers log and drop them so sibling dates keep their results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown exchange rate source '{0}'")]
    UnknownSource(String),

    #[error("currency '{currency}' is not supported by source '{source_key}'")]
    InvalidCurrency { source_key: String, currency: String },

    #[error("no date in {spec:?} is valid under format '{format}'")]
    InvalidDateFormat { spec: Vec<String>, format: String },

    #[error("source '{source_key}' produced an invalid request url '{url}'")]
    InvalidUrl { source_key: String, url: String },

    #[error("currency code table: {0}")]
    CurrencyTable(String),

    #[error("source configuration: {0}")]
    Config(String),
}
