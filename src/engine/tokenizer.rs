//! Text analysis for the in-process engine.
//!
//! Mirrors what a standard full-text analyzer does closely enough for the
//! pipeline's needs: lowercase, split on anything that is not a letter or a
//! digit, keep every token (no stop words, no stemming).

use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"));

/// Splits indexed text into lowercase terms, in order, duplicates kept.
pub fn analyze(text: &str) -> Vec<String> {
    WORD.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Maximum edit distance for a term under `AUTO` fuzziness.
pub fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Resolves a `fuzziness` parameter for one query term.
///
/// Accepts `"AUTO"` (any case), a number, or a numeric string. Anything else
/// means exact matching.
pub fn max_edits(fuzziness: Option<&serde_json::Value>, term: &str) -> usize {
    match fuzziness {
        Some(serde_json::Value::String(s)) if s.eq_ignore_ascii_case("auto") => auto_fuzziness(term),
        Some(serde_json::Value::String(s)) => s.parse::<usize>().unwrap_or(0).min(2),
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0).min(2) as usize,
        _ => 0,
    }
}

/// Edit distance counting insertions, deletions, substitutions and
/// adjacent transpositions (optimal string alignment).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }

    d[a.len() * width + b.len()]
}
