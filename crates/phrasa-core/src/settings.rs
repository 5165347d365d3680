//! Process-wide defaults for building and querying phrase tables.
//!
//! The values seed [`TableConfig::from_settings`]: maximum extracted phrase
//! length, candidate limit and score floor for lookups, and whether malformed
//! alignment tokens abort a load. A tool may replace them once, before the
//! first table is configured, with [`init_custom`]; otherwise the built-in
//! values (mirrored by `default_settings.toml`) apply.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::table::{LoadPolicy, TableConfig};

/// The built-in settings as TOML, for `settings export` and as a template.
pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static ACTIVE: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file is not valid: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{key} {constraint}")]
    OutOfRange {
        key: &'static str,
        constraint: &'static str,
    },
    #[error("settings are already in use; a custom file must be installed first")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub extraction: ExtractionSettings,
    pub lookup: LookupSettings,
    pub load: LoadSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionSettings {
    /// Widest target phrase extraction may emit.
    pub max_phrase_length: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupSettings {
    /// Candidates kept per query; 0 keeps all.
    pub table_limit: usize,
    /// Relative-frequency floor in `[0, 1]`.
    pub min_score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSettings {
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extraction: ExtractionSettings {
                max_phrase_length: 7,
            },
            lookup: LookupSettings {
                table_limit: 20,
                min_score: 0.0,
            },
            load: LoadSettings { strict: true },
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text)?;
        settings.check()?;
        Ok(settings)
    }

    /// The table configuration these settings describe.
    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            max_phrase_length: self.extraction.max_phrase_length,
            table_limit: self.lookup.table_limit,
            min_score: self.lookup.min_score,
            policy: if self.load.strict {
                LoadPolicy::Strict
            } else {
                LoadPolicy::Lenient
            },
        }
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.extraction.max_phrase_length == 0 {
            return Err(SettingsError::OutOfRange {
                key: "extraction.max_phrase_length",
                constraint: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.lookup.min_score) {
            return Err(SettingsError::OutOfRange {
                key: "lookup.min_score",
                constraint: "must lie within [0, 1]",
            });
        }
        Ok(())
    }
}

/// Parses and checks a settings file without installing it.
pub fn parse_settings_toml(text: &str) -> Result<Settings, SettingsError> {
    Settings::from_toml(text)
}

/// Replaces the built-in settings. Fails if settings were already installed
/// or read.
pub fn init_custom(text: String) -> Result<(), SettingsError> {
    let custom = Settings::from_toml(&text)?;
    ACTIVE
        .set(custom)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// The active settings; the built-in values unless [`init_custom`] ran first.
pub fn settings() -> &'static Settings {
    ACTIVE.get_or_init(Settings::default)
}

pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}
