use std::fs;
use std::path::Path;
use std::process;

use phrasa_core::{LoadPolicy, LoadReport, PhraseTable, TableConfig, TableStats};

use crate::input;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub(crate) fn table_config(lenient: bool) -> TableConfig {
    let mut config = TableConfig::from_settings();
    if lenient {
        config.policy = LoadPolicy::Lenient;
    }
    config
}

pub(crate) fn open_index(index: &str, config: TableConfig) -> PhraseTable {
    die!(
        PhraseTable::open(Path::new(index), config),
        "Error opening {index}: {}"
    )
}

fn print_report(report: &LoadReport) {
    eprintln!("Sentence pairs: {}", report.sentences);
    if report.skipped_points > 0 {
        eprintln!("Skipped out-of-range alignment points: {}", report.skipped_points);
    }
    if report.malformed_points > 0 {
        eprintln!("Skipped malformed alignment tokens: {}", report.malformed_points);
    }
}

fn save_index(table: &PhraseTable, output_file: &str) {
    die!(
        table.save(Path::new(output_file)),
        "Error writing {output_file}: {}"
    );
    let file_size = fs::metadata(output_file).map(|m| m.len()).unwrap_or(0);
    eprintln!(
        "Wrote {output_file} ({:.1} MB)",
        file_size as f64 / 1_048_576.0
    );
}

pub fn build(source: &str, target: &str, alignment: &str, output_file: &str, lenient: bool) {
    eprintln!("Indexing {source} / {target} / {alignment}...");
    let (table, report) = die!(
        PhraseTable::load(
            Path::new(source),
            Path::new(target),
            Path::new(alignment),
            table_config(lenient),
        ),
        "Error loading corpus: {}"
    );
    print_report(&report);
    save_index(&table, output_file);
}

pub fn info(index: &str) {
    let table = open_index(index, table_config(false));
    print!("{}", format_stats(&table.stats()));
}

pub(crate) fn format_stats(stats: &TableStats) -> String {
    format!(
        "Sentence pairs:    {}\n\
         Source tokens:     {}\n\
         Target tokens:     {}\n\
         Source vocabulary: {}\n\
         Target vocabulary: {}\n\
         Alignment points:  {}\n",
        stats.sentences,
        stats.source_tokens,
        stats.target_tokens,
        stats.source_vocab,
        stats.target_vocab,
        stats.alignment_points,
    )
}

/// Extends an index with sentence pairs from three line-parallel files and
/// saves it to `output_file` (the index itself when `None`).
pub fn append(
    index: &str,
    source: &str,
    target: &str,
    alignment: &str,
    output_file: Option<&str>,
    lenient: bool,
) {
    let pairs = die!(
        input::read_sentence_pairs(source, target, alignment),
        "Error: {}"
    );
    let mut table = open_index(index, table_config(lenient));
    let before = table.sentence_count();

    let report = die!(
        table.append_sentence_pairs(
            pairs
                .iter()
                .map(|p| (p.source.as_str(), p.target.as_str(), p.alignment.as_str())),
        ),
        "Error appending {source}: {}"
    );

    print_report(&report);
    eprintln!("{before} -> {} sentence pairs", table.sentence_count());
    save_index(&table, output_file.unwrap_or(index));
}
