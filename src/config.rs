use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::mapper::Mapper;

/// Source descriptor table shipped with the binary.
const BUILTIN_SOURCES: &str = include_str!("data/sources.yaml");

#[derive(Debug, Clone, Deserialize)]
struct SourceFile {
    sources: Vec<SourceDescriptor>,
}

/// Everything the engine needs to know about one upstream source. Built
/// once at startup, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    /// Registry lookup key, e.g. `NBU-json`.
    pub key: String,
    /// Stable numeric identifier carried into every canonical record.
    pub id: u32,
    /// URL template with `{date}`, `{base}` and `{local}` placeholders.
    pub url: String,
    /// Date format the upstream API expects inside the URL.
    pub date_format: String,
    /// Fields a response object must carry to be mapped.
    #[serde(default)]
    pub required_fields: Vec<String>,
    pub base_currencies: Vec<String>,
    pub local_currencies: Vec<String>,
    /// Concurrent request cap for this source.
    pub max_connections: usize,
    pub mapper: Mapper,
}

impl SourceDescriptor {
    /// Substitutes the template placeholders and validates the result.
    pub fn request_url(&self, date: &str, base: &str, local: &str) -> Result<String, Error> {
        let url = self
            .url
            .replace("{date}", date)
            .replace("{base}", base)
            .replace("{local}", local);
        if reqwest::Url::parse(&url).is_err() {
            return Err(Error::InvalidUrl {
                source_key: self.key.clone(),
                url,
            });
        }
        Ok(url)
    }

    pub fn supports_base(&self, currency: &str) -> bool {
        self.base_currencies.iter().any(|c| c == currency)
    }

    pub fn supports_local(&self, currency: &str) -> bool {
        self.local_currencies.iter().any(|c| c == currency)
    }
}

/// Immutable table of supported sources, keyed by `SourceDescriptor::key`.
#[derive(Debug)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    /// Builds the registry from the descriptor table compiled into the
    /// binary.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_yaml(BUILTIN_SOURCES)
    }

    /// Builds the registry from a YAML descriptor file with the same
    /// schema as the builtin table.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    fn from_yaml(raw: &str) -> Result<Self, Error> {
        let file: SourceFile =
            serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        let registry = Self {
            sources: file.sources,
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), Error> {
        for (i, source) in self.sources.iter().enumerate() {
            if !source.url.contains("{date}") {
                return Err(Error::Config(format!(
                    "source '{}' url template has no {{date}} placeholder",
                    source.key
                )));
            }
            for other in &self.sources[i + 1..] {
                if other.key == source.key {
                    return Err(Error::Config(format!(
                        "duplicate source key '{}'",
                        source.key
                    )));
                }
                if other.id == source.id {
                    return Err(Error::Config(format!(
                        "sources '{}' and '{}' share id {}",
                        source.key, other.key, source.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.key == key)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads_and_validates() {
        let registry = SourceRegistry::builtin().unwrap();
        assert_eq!(registry.source_count(), 2);
    }

    #[test]
    fn lookup_finds_known_sources() {
        let registry = SourceRegistry::builtin().unwrap();
        let nbu = registry.lookup("NBU-json").unwrap();
        assert_eq!(nbu.id, 1);
        assert_eq!(nbu.mapper, Mapper::NbuJson);
        assert_eq!(nbu.date_format, "%Y%m%d");
        assert_eq!(nbu.max_connections, 10);

        let fixer = registry.lookup("ECB-Fixer").unwrap();
        assert_eq!(fixer.id, 2);
        assert_eq!(fixer.mapper, Mapper::EcbFixer);
    }

    #[test]
    fn lookup_misses_unknown_sources() {
        let registry = SourceRegistry::builtin().unwrap();
        assert!(registry.lookup("N/a").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn request_url_substitutes_all_placeholders() {
        let registry = SourceRegistry::builtin().unwrap();
        let nbu = registry.lookup("NBU-json").unwrap();
        let url = nbu.request_url("20070109", "USD", "UAH").unwrap();
        assert_eq!(
            url,
            "https://bank.gov.ua/NBUStatService/v1/statdirectory/exchange?date=20070109&valcode=USD&json"
        );

        let fixer = registry.lookup("ECB-Fixer").unwrap();
        let url = fixer.request_url("2016-11-21", "EUR", "PLN").unwrap();
        assert_eq!(url, "https://api.fixer.io/2016-11-21?base=EUR&symbols=PLN");
    }

    #[test]
    fn request_url_rejects_a_broken_template() {
        let mut descriptor = SourceRegistry::builtin()
            .unwrap()
            .lookup("NBU-json")
            .unwrap()
            .clone();
        descriptor.url = "not a url at all {date}".to_string();
        let err = descriptor.request_url("20070109", "USD", "UAH").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn currency_support_checks_use_the_descriptor_sets() {
        let registry = SourceRegistry::builtin().unwrap();
        let nbu = registry.lookup("NBU-json").unwrap();
        assert!(nbu.supports_base("USD"));
        assert!(!nbu.supports_base("GBP"));
        assert!(nbu.supports_local("UAH"));
        assert!(!nbu.supports_local("USD"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let yaml = r#"
sources:
  - {key: A, id: 1, url: "https://a/{date}", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: nbu-json}
  - {key: A, id: 2, url: "https://b/{date}", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: ecb-fixer}
"#;
        let err = SourceRegistry::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = r#"
sources:
  - {key: A, id: 7, url: "https://a/{date}", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: nbu-json}
  - {key: B, id: 7, url: "https://b/{date}", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: ecb-fixer}
"#;
        let err = SourceRegistry::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn templates_without_a_date_placeholder_are_rejected() {
        let yaml = r#"
sources:
  - {key: A, id: 1, url: "https://a/latest", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: nbu-json}
"#;
        let err = SourceRegistry::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_mapper_names_fail_at_parse_time() {
        let yaml = r#"
sources:
  - {key: A, id: 1, url: "https://a/{date}", date_format: "%Y-%m-%d",
     base_currencies: [USD], local_currencies: [EUR], max_connections: 1,
     mapper: reflection-lookup}
"#;
        let err = SourceRegistry::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_from_a_descriptor_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
sources:
  - {{key: test-src, id: 42, url: "https://example.test/{{date}}",
     date_format: "%Y-%m-%d", base_currencies: [USD],
     local_currencies: [EUR], max_connections: 3, mapper: ecb-fixer}}
"#
        )
        .unwrap();
        let registry = SourceRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.source_count(), 1);
        assert_eq!(registry.lookup("test-src").unwrap().id, 42);
    }
}
