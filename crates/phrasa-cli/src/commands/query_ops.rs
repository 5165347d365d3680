use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;

use phrasa_core::{PhraseTable, QueryStats, Side, TranslationCandidate};

use super::index_ops::{open_index, table_config};
use crate::input::{self, BatchRecord};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

fn open_with_limit(index: &str, n: Option<usize>) -> PhraseTable {
    let mut config = table_config(false);
    if let Some(n) = n {
        config.table_limit = n;
    }
    open_index(index, config)
}

pub fn lookup(index: &str, phrase: &str, n: Option<usize>, json: bool, verbose: bool) {
    let table = open_with_limit(index, n);
    let mut stats = QueryStats::new();
    let candidates = die!(
        table.lookup_with_stats(phrase, &mut stats),
        "Error looking up {phrase:?}: {}"
    );

    if json {
        let line = die!(serde_json::to_string_pretty(&candidates), "Error: {}");
        println!("{line}");
    } else if candidates.is_empty() {
        println!("No translations for {phrase:?}");
    } else {
        print!("{}", format_candidates(&candidates));
    }

    if verbose {
        eprintln!(
            "occurrences={} boundary_crossings={} pairs={} distinct={} \
             count={:?} extract={:?} score={:?}",
            stats.occurrences,
            stats.boundary_crossings,
            stats.pairs_extracted,
            stats.distinct_candidates,
            stats.time_count,
            stats.time_extract,
            stats.time_score,
        );
    }
}

pub(crate) fn format_candidates(candidates: &[TranslationCandidate]) -> String {
    let mut out = String::new();
    for (i, c) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:.4}  {:>5}  {}\n",
            i + 1,
            c.score,
            c.count,
            c.phrase
        ));
    }
    out
}

/// Looks up every query in `queries` and writes one JSON object per line.
pub fn batch(index: &str, queries: &str, output_file: &str, n: Option<usize>) {
    let queries = die!(input::read_queries(queries), "Error: {}");
    let table = open_with_limit(index, n);
    let file = die!(File::create(output_file), "Error creating {output_file}: {}");
    let mut out = BufWriter::new(file);

    let mut total = QueryStats::new();
    for query in &queries {
        let mut stats = QueryStats::new();
        let candidates = die!(
            table.lookup_with_stats(query, &mut stats),
            "Error looking up {query:?}: {}"
        );
        let record = BatchRecord {
            query,
            occurrences: stats.occurrences,
            candidates: &candidates,
        };
        let line = die!(serde_json::to_string(&record), "Error: {}");
        die!(writeln!(out, "{line}"), "Error writing {output_file}: {}");
        total.merge(&stats);
    }
    die!(out.flush(), "Error writing {output_file}: {}");

    eprintln!(
        "{} queries, {} occurrences, {:?} total",
        queries.len(),
        total.occurrences,
        total.time_total()
    );
}

pub fn count(index: &str, phrase: &str, target: bool) {
    let table = open_index(index, table_config(false));
    let side = if target { Side::Target } else { Side::Source };
    println!("{}", table.count_phrase(side, phrase));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_candidates() {
        let candidates = vec![
            TranslationCandidate {
                phrase: "das haus".into(),
                ids: vec![0, 1],
                count: 2,
                score: 2.0 / 3.0,
            },
            TranslationCandidate {
                phrase: "haus".into(),
                ids: vec![1],
                count: 1,
                score: 1.0 / 3.0,
            },
        ];
        assert_eq!(
            format_candidates(&candidates),
            "  1  0.6667      2  das haus\n  2  0.3333      1  haus\n"
        );
    }
}
