use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::Error;
use crate::fetch::Transport;

/// ISO 4217 dataset shipped with the binary.
const BUNDLED_DATASET: &str = include_str!("data/iso_4217.json");

/// Public registry copy of the ISO 4217 list, used by [`CurrencyCodeTable::download`]
/// as a fallback when neither the bundled dataset nor a local override serves.
pub const REGISTRY_DATASET_URL: &str =
    "https://raw.githubusercontent.com/datasets/currency-codes/master/data/codes-all.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyEntry {
    pub alpha: String,
    pub numeric: u16,
    pub name: String,
    #[serde(default)]
    pub minor_units: Option<u8>,
}

/// Mapping from ISO 4217 alphabetic currency codes to their numeric codes
/// and display metadata. Loaded once at startup and shared read-only.
#[derive(Debug)]
pub struct CurrencyCodeTable {
    entries: HashMap<String, CurrencyEntry>,
}

impl CurrencyCodeTable {
    /// Builds the table from the dataset compiled into the binary.
    pub fn bundled() -> Result<Self, Error> {
        let entries: Vec<CurrencyEntry> = serde_json::from_str(BUNDLED_DATASET)
            .map_err(|e| Error::CurrencyTable(format!("bundled dataset: {}", e)))?;
        Self::from_entries(entries)
    }

    /// Builds the table from a JSON file with the same schema as the
    /// bundled dataset.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::CurrencyTable(format!("reading {}: {}", path.display(), e)))?;
        let entries: Vec<CurrencyEntry> = serde_json::from_str(&raw)
            .map_err(|e| Error::CurrencyTable(format!("parsing {}: {}", path.display(), e)))?;
        Self::from_entries(entries)
    }

    /// Fetches the ISO 4217 list from a public registry mirror (CSV, one
    /// row per country and currency) and builds the table from it.
    pub async fn download(transport: &dyn Transport, url: &str) -> Result<Self, Error> {
        let response = transport
            .get(url)
            .await
            .map_err(|e| Error::CurrencyTable(format!("downloading {}: {:#}", url, e)))?;
        if !response.is_success() {
            return Err(Error::CurrencyTable(format!(
                "downloading {}: HTTP {}",
                url, response.status
            )));
        }
        Self::from_registry_csv(&response.body)
    }

    fn from_registry_csv(raw: &str) -> Result<Self, Error> {
        let mut reader = csv::Reader::from_reader(raw.as_bytes());
        let mut entries = Vec::new();
        for row in reader.deserialize::<RegistryRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("skipping unreadable registry row: {}", e);
                    continue;
                }
            };
            // Withdrawn or fund entries come without codes.
            let Ok(numeric) = row.numeric.parse::<u16>() else {
                continue;
            };
            if row.alpha.len() != 3 {
                continue;
            }
            entries.push(CurrencyEntry {
                alpha: row.alpha,
                numeric,
                name: row.name,
                minor_units: row.minor_unit.parse().ok(),
            });
        }
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<CurrencyEntry>) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::CurrencyTable("dataset contains no currencies".into()));
        }
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            // The registry lists one row per country; keep the first.
            map.entry(entry.alpha.clone()).or_insert(entry);
        }
        Ok(Self { entries: map })
    }

    /// ISO 4217 numeric code for an alphabetic code, if known.
    pub fn numeric_code(&self, alpha: &str) -> Option<u16> {
        self.entries.get(alpha).map(|e| e.numeric)
    }

    pub fn numeric_codes(&self) -> HashMap<String, u16> {
        self.entries
            .iter()
            .map(|(alpha, entry)| (alpha.clone(), entry.numeric))
            .collect()
    }

    pub fn info(&self, alpha: &str) -> Option<&CurrencyEntry> {
        self.entries.get(alpha)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Row shape of the public registry CSV. Field names differ between
/// mirrors, hence the aliases.
#[derive(Debug, Deserialize)]
struct RegistryRow {
    #[serde(rename = "Currency", default)]
    name: String,
    #[serde(rename = "AlphabeticCode", alias = "Alphabetic Code", default)]
    alpha: String,
    #[serde(rename = "NumericCode", alias = "Numeric Code", default)]
    numeric: String,
    #[serde(rename = "MinorUnit", alias = "Minor unit", default)]
    minor_unit: String,
}
