mod fixer;
mod nbu;

use serde::Deserialize;

use crate::config::SourceDescriptor;
use crate::currency::CurrencyCodeTable;
use crate::types::ExchangeRate;

/// Closed set of payload mappers. A source descriptor names exactly one of
/// these; adding a source with a new payload shape means adding a variant
/// and its module. A descriptor file naming anything else fails at parse
/// time, before any session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mapper {
    /// Flat-rate shape: a JSON array with one object per quoted currency,
    /// numeric codes reported directly by the upstream API.
    NbuJson,
    /// Rates-map shape: one object carrying a base currency and a map of
    /// alphabetic currency codes to rates.
    EcbFixer,
}

impl Mapper {
    /// Turns raw response bodies into canonical records. Bodies that are
    /// not valid JSON or objects missing required fields contribute
    /// nothing; siblings are unaffected.
    pub fn map(
        self,
        source: &SourceDescriptor,
        codes: &CurrencyCodeTable,
        bodies: &[String],
    ) -> Vec<ExchangeRate> {
        bodies
            .iter()
            .flat_map(|body| match self {
                Mapper::NbuJson => nbu::map_body(source, body),
                Mapper::EcbFixer => fixer::map_body(source, codes, body),
            })
            .collect()
    }
}

/// True when `value` is a JSON object carrying every field in `fields`.
fn has_required_fields(value: &serde_json::Value, fields: &[String]) -> bool {
    match value.as_object() {
        Some(map) => fields.iter().all(|f| map.contains_key(f.as_str())),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_fields_check_needs_an_object() {
        let fields = vec!["rate".to_string()];
        assert!(has_required_fields(&json!({"rate": 1.0}), &fields));
        assert!(!has_required_fields(&json!({"other": 1.0}), &fields));
        assert!(!has_required_fields(&json!([1, 2]), &fields));
        assert!(!has_required_fields(&json!("rate"), &fields));
    }

    #[test]
    fn mapper_names_deserialize_from_kebab_case() {
        assert_eq!(
            serde_yaml::from_str::<Mapper>("nbu-json").unwrap(),
            Mapper::NbuJson
        );
        assert_eq!(
            serde_yaml::from_str::<Mapper>("ecb-fixer").unwrap(),
            Mapper::EcbFixer
        );
        assert!(serde_yaml::from_str::<Mapper>("no-such-mapper").is_err());
    }
}
