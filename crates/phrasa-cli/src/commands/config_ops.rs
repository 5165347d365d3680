use std::fs;
use std::path::Path;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Installs a custom settings file before anything reads the settings.
pub fn load_settings(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(
        phrasa_core::settings::init_custom(content),
        "Error in {file}: {}"
    );
}

/// Sends trace events to `dir` when built with the `trace` feature. Returns
/// whether tracing was started.
pub fn init_trace(dir: &str) -> bool {
    let installed = die!(
        phrasa_engine::trace_init::init_tracing(Path::new(dir)),
        "Error starting trace output in {dir}: {}"
    );
    if !installed {
        eprintln!("Note: --trace-dir ignored (phrasatool built without the `trace` feature)");
    }
    installed
}

pub fn settings_export() {
    print!("{}", phrasa_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        phrasa_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: extraction.max_phrase_length={}, lookup.table_limit={}, lookup.min_score={}, load.strict={}",
        s.extraction.max_phrase_length, s.lookup.table_limit, s.lookup.min_score, s.load.strict
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(feature = "trace"))]
    fn test_trace_dir_ignored_without_feature() {
        let dir = tempfile::tempdir().unwrap();
        let trace_dir = dir.path().join("trace");
        assert!(!init_trace(trace_dir.to_str().unwrap()));
        assert!(!trace_dir.exists());
    }

    #[test]
    #[cfg(feature = "trace")]
    fn test_trace_dir_creates_trace_file() {
        let dir = tempfile::tempdir().unwrap();
        let trace_dir = dir.path().join("trace");
        assert!(init_trace(trace_dir.to_str().unwrap()));
        assert!(trace_dir.is_dir());
    }
}
