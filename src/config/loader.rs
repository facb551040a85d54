// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::FixedOffset;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::consts::{DEFAULT_OBJECT_TYPE, DEFAULT_TIMEZONE};
use crate::config::{validate_dependency_graph, UnitSpec};
use crate::errors::ConfigError;
use crate::observability::messages::config::{ConfigLoaded, ConfigValidationFailed};
use crate::observability::messages::StructuredLog;
use crate::units::kinds;
use crate::units::mapping::{DefaultOwner, MappingRule};

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_object_type")]
    pub object_type: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub send_empty_payloads: bool,
    #[serde(default)]
    pub default_owner: DefaultOwner,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub customer_groups: Option<Vec<u64>>,
    /// Local attribute that switches sync off for an entity.
    #[serde(default)]
    pub sync_disabled_attribute: Option<String>,
    #[serde(default)]
    pub mapping: Vec<MappingRule>,
    #[serde(default = "standard_units")]
    pub units: Vec<UnitConfig>,
}

fn default_object_type() -> String {
    DEFAULT_OBJECT_TYPE.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategyKind {
    #[default]
    Account,
    AccountByContact,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub strategy: LookupStrategyKind,
    #[serde(default)]
    pub external_id_field: Option<String>,
    #[serde(default)]
    pub website_field: Option<String>,
    #[serde(default)]
    pub disable_sync_field: Option<String>,
    #[serde(default)]
    pub skip_mapping_fields: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UnitConfig {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl UnitConfig {
    pub fn new(id: &str, kind: &str, depends_on: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// `load -> lookup -> mapping -> upsertInput -> upsertOutput -> status`
///
/// Every stage that walks the batch also depends on `load` directly, so the
/// entities load vetoes stay out of their work.
pub fn standard_units() -> Vec<UnitConfig> {
    vec![
        UnitConfig::new("load", kinds::LOAD, &[]),
        UnitConfig::new("lookup", kinds::LOOKUP, &["load"]),
        UnitConfig::new("mapping", kinds::MAPPING, &["load", "lookup"]),
        UnitConfig::new("upsertInput", kinds::UPSERT_INPUT, &["load", "mapping"]),
        UnitConfig::new("upsertOutput", kinds::UPSERT_OUTPUT, &["upsertInput"]),
        UnitConfig::new("status", kinds::STATUS, &["load", "upsertOutput"]),
    ]
}

impl SyncConfig {
    pub fn timezone_offset(&self) -> Result<FixedOffset, ConfigError> {
        let text = self.timezone.trim();
        if text.eq_ignore_ascii_case("utc") || text == "Z" {
            return FixedOffset::east_opt(0)
                .ok_or_else(|| ConfigError::InvalidTimezone(self.timezone.clone()));
        }
        text.parse::<FixedOffset>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn unit_specs(&self) -> Vec<UnitSpec> {
        self.units
            .iter()
            .map(|unit| UnitSpec {
                id: unit.id.clone(),
                depends_on: unit.depends_on.clone(),
            })
            .collect()
    }

    /// Structural checks the graph builder would otherwise reject later.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors: Vec<String> = match validate_dependency_graph(&self.unit_specs()) {
            Ok(()) => Vec::new(),
            Err(found) => found.iter().map(ToString::to_string).collect(),
        };

        const KNOWN: [&str; 6] = [
            kinds::LOAD,
            kinds::LOOKUP,
            kinds::MAPPING,
            kinds::UPSERT_INPUT,
            kinds::UPSERT_OUTPUT,
            kinds::STATUS,
        ];
        for unit in &self.units {
            if !KNOWN.contains(&unit.kind.as_str()) {
                errors.push(format!("Unit '{}' has unknown kind '{}'", unit.id, unit.kind));
            }
        }
        for kind in KNOWN {
            let count = self.units.iter().filter(|unit| unit.kind == kind).count();
            if count > 1 {
                errors.push(format!("Unit kind '{}' appears {} times", kind, count));
            }
        }

        if let Err(e) = self.timezone_offset() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Read a config file, YAML or TOML by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: SyncConfig = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    ConfigLoaded {
        path: &path.display().to_string(),
        object_type: &cfg.object_type,
        unit_count: cfg.units.len(),
        rule_count: cfg.mapping.len(),
    }
    .log();
    Ok(cfg)
}

pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let cfg = load_config(path)?;

    if let Err(errors) = cfg.validate() {
        ConfigValidationFailed {
            path: &path.display().to_string(),
            error_count: errors.len(),
        }
        .log();
        return Err(ConfigError::Invalid(errors.join("\n")));
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::mapping::MappingWhen;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_minimal_yaml_uses_defaults() {
        let cfg: SyncConfig = serde_yaml::from_str("mapping: []").unwrap();

        assert_eq!(cfg.object_type, "Account");
        assert_eq!(cfg.lookup.strategy, LookupStrategyKind::Account);
        assert_eq!(cfg.units, standard_units());
        assert!(!cfg.send_empty_payloads);
        assert_eq!(cfg.timezone_offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_load_yaml_config() {
        let file = write_config(
            ".yaml",
            r#"
object_type: Account
timezone: "+02:00"
default_owner:
  global: "005000000000001"
  scopes:
    2: "005000000000002"
lookup:
  strategy: account_by_contact
  external_id_field: Magento_ID__c
  website_field: Website__c
mapping:
  - local_object: customer
    local_attribute: email
    remote_field: Email__c
    required: true
  - local_object: customer_address/billing
    local_attribute: telephone
    remote_field: Phone
    when: insert
"#,
        );

        let cfg = load_and_validate_config(file.path()).unwrap();

        assert_eq!(cfg.lookup.strategy, LookupStrategyKind::AccountByContact);
        assert_eq!(cfg.lookup.website_field.as_deref(), Some("Website__c"));
        assert_eq!(cfg.default_owner.scopes.get(&2).map(String::as_str), Some("005000000000002"));
        assert_eq!(cfg.mapping.len(), 2);
        assert!(cfg.mapping[0].required);
        assert_eq!(cfg.mapping[1].when, MappingWhen::Insert);
        assert_eq!(cfg.timezone_offset().unwrap().local_minus_utc(), 7200);
    }

    #[test]
    fn test_load_toml_config() {
        let file = write_config(
            ".toml",
            r#"
object_type = "Account"
send_empty_payloads = true

[lookup]
external_id_field = "Magento_ID__c"
skip_mapping_fields = true

[[mapping]]
local_object = "customer"
local_attribute = "firstname"
remote_field = "FirstName__c"
"#,
        );

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert!(cfg.send_empty_payloads);
        assert!(cfg.lookup.skip_mapping_fields);
        assert_eq!(cfg.mapping[0].remote_field, "FirstName__c");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".json", "{}");
        assert!(matches!(load_config(file.path()), Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_unit_layout_is_rejected() {
        let file = write_config(
            ".yaml",
            r#"
units:
  - { id: load, kind: load }
  - { id: lookup, kind: lookup, depends_on: [load, status] }
  - { id: status, kind: status, depends_on: [lookup, upsertOutput] }
  - { id: extra, kind: teleport }
timezone: "somewhere"
"#,
        );

        let error = load_and_validate_config(file.path()).unwrap_err();
        let ConfigError::Invalid(message) = error else {
            panic!("expected a validation error");
        };
        assert!(message.contains("upsertOutput"));
        assert!(message.contains("teleport"));
        assert!(message.contains("somewhere"));
    }

    #[test]
    fn test_bundled_configs_are_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");

        let account = load_and_validate_config(dir.join("account.yaml")).unwrap();
        assert_eq!(account.lookup.external_id_field.as_deref(), Some("Magento_ID__c"));

        let by_contact = load_and_validate_config(dir.join("account_by_contact.toml")).unwrap();
        assert_eq!(by_contact.lookup.strategy, LookupStrategyKind::AccountByContact);
    }

    #[test]
    fn test_cycle_reported_for_valid_references() {
        let cfg = SyncConfig {
            units: vec![
                UnitConfig::new("load", kinds::LOAD, &["status"]),
                UnitConfig::new("status", kinds::STATUS, &["load"]),
            ],
            ..serde_yaml::from_str("{}").unwrap()
        };

        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("Cyclic dependency")));
    }
}
