use clap::{Parser, Subcommand};

use phrasa_cli::commands::{config_ops, index_ops, query_ops};

#[derive(Parser)]
#[command(name = "phrasatool", about = "Phrase table index tool")]
struct Cli {
    /// Custom settings TOML (defaults are embedded)
    #[arg(long, global = true)]
    settings: Option<String>,
    /// Write JSON trace events to this directory (needs the `trace` feature)
    #[arg(long, global = true)]
    trace_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an index from a parallel corpus
    Build {
        /// Source corpus, one sentence per line
        source: String,
        /// Target corpus, one sentence per line
        target: String,
        /// Alignment file, one line of S-T points per sentence pair
        alignment: String,
        /// Output index file
        output_file: String,
        /// Skip malformed alignment tokens instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Show index statistics
    Info {
        /// Index file
        index: String,
    },
    /// Look up translations of a source phrase
    Lookup {
        /// Index file
        index: String,
        /// Source phrase (words may be given as separate arguments)
        #[arg(required = true)]
        phrase: Vec<String>,
        /// Maximum number of candidates (0 = unlimited)
        #[arg(short, long)]
        n: Option<usize>,
        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
        /// Print query statistics to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// Look up every line of a query file, writing JSON lines
    Batch {
        /// Index file
        index: String,
        /// Query file, one phrase per line
        queries: String,
        /// Output JSONL file
        output_file: String,
        /// Maximum number of candidates per query (0 = unlimited)
        #[arg(short, long)]
        n: Option<usize>,
    },
    /// Append sentence pairs to an existing index
    Append {
        /// Index file
        index: String,
        /// Source sentences
        source: String,
        /// Target sentences
        target: String,
        /// Alignment lines
        alignment: String,
        /// Write the extended index here instead of overwriting
        #[arg(long)]
        out: Option<String>,
        /// Skip malformed alignment tokens instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Count raw occurrences of a phrase
    Count {
        /// Index file
        index: String,
        /// Phrase (words may be given as separate arguments)
        #[arg(required = true)]
        phrase: Vec<String>,
        /// Count on the target side
        #[arg(long)]
        target: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Some(file) = &cli.settings {
        config_ops::load_settings(file);
    }
    if let Some(dir) = &cli.trace_dir {
        config_ops::init_trace(dir);
    }

    match cli.command {
        Command::Build {
            source,
            target,
            alignment,
            output_file,
            lenient,
        } => index_ops::build(&source, &target, &alignment, &output_file, lenient),
        Command::Info { index } => index_ops::info(&index),
        Command::Lookup {
            index,
            phrase,
            n,
            json,
            verbose,
        } => query_ops::lookup(&index, &phrase.join(" "), n, json, verbose),
        Command::Batch {
            index,
            queries,
            output_file,
            n,
        } => query_ops::batch(&index, &queries, &output_file, n),
        Command::Append {
            index,
            source,
            target,
            alignment,
            out,
            lenient,
        } => index_ops::append(
            &index,
            &source,
            &target,
            &alignment,
            out.as_deref(),
            lenient,
        ),
        Command::Count {
            index,
            phrase,
            target,
        } => query_ops::count(&index, &phrase.join(" "), target),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_dir_is_global() {
        let cli = Cli::try_parse_from([
            "phrasatool",
            "lookup",
            "index.bin",
            "das",
            "haus",
            "--trace-dir",
            "traces",
        ])
        .unwrap();
        assert_eq!(cli.trace_dir.as_deref(), Some("traces"));
        match cli.command {
            Command::Lookup { phrase, .. } => assert_eq!(phrase, ["das", "haus"]),
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_trace_dir_defaults_to_off() {
        let cli = Cli::try_parse_from(["phrasatool", "info", "index.bin"]).unwrap();
        assert!(cli.trace_dir.is_none());
        assert!(cli.settings.is_none());
    }
}
