//! Rejects a `default_settings.toml` that `Settings` could not deserialize.

const SETTINGS_PATH: &str = "src/default_settings.toml";

/// `section.key` and the TOML type each setting must have.
const REQUIRED_KEYS: &[(&str, &str, &str)] = &[
    ("extraction", "max_phrase_length", "integer"),
    ("lookup", "table_limit", "integer"),
    ("lookup", "min_score", "float"),
    ("load", "strict", "boolean"),
];

fn main() {
    println!("cargo:rerun-if-changed={SETTINGS_PATH}");

    let table: toml::Table = include_str!("src/default_settings.toml")
        .parse()
        .unwrap_or_else(|e| panic!("{SETTINGS_PATH} is not valid TOML: {e}"));

    for &(section, key, kind) in REQUIRED_KEYS {
        let value = table
            .get(section)
            .and_then(|s| s.get(key))
            .unwrap_or_else(|| panic!("{SETTINGS_PATH} is missing {section}.{key}"));
        if value.type_str() != kind {
            panic!(
                "{SETTINGS_PATH}: {section}.{key} must be a {kind}, found {}",
                value.type_str()
            );
        }
    }
}
