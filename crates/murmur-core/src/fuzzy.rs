//! Token-set fuzzy matching.
//!
//! Scores how well a spoken phrase matches a candidate alias on a 0-100
//! scale. The scorer compares *sets* of whitespace-separated tokens, so word
//! order and repeated words do not matter, and a phrase that contains every
//! token of the candidate (e.g. "lights off" against "off") scores 100.
//! When the token sets are disjoint the score falls back to a character
//! level similarity of the sorted token strings, which is what lets a
//! mis-heard "cody" still land near "kodi".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The candidate alias as declared.
    pub candidate: String,
    /// Similarity score, 0-100.
    pub score: u8,
}

/// Scoring options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Lowercase both sides before scoring. Results still carry the
    /// candidate as declared.
    pub fold_case: bool,
}

/// Score `query` against every candidate, best first.
///
/// Ties keep candidate declaration order.
pub fn extract<S: AsRef<str>>(query: &str, candidates: &[S]) -> Vec<MatchResult> {
    extract_with(query, candidates, MatchOptions::default())
}

/// [`extract`] with explicit [`MatchOptions`].
pub fn extract_with<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    options: MatchOptions,
) -> Vec<MatchResult> {
    let folded_query = options.fold_case.then(|| query.to_lowercase());
    let mut results: Vec<MatchResult> = candidates
        .iter()
        .map(|c| {
            let candidate = c.as_ref();
            let score = match &folded_query {
                Some(q) => token_set_ratio(q, &candidate.to_lowercase()),
                None => token_set_ratio(query, candidate),
            };
            MatchResult {
                candidate: candidate.to_string(),
                score,
            }
        })
        .collect();
    // sort_by is stable
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// Token-set similarity between two strings, 0-100.
///
/// Both strings are split on whitespace into deduplicated, sorted token
/// sets. The shared tokens form `intersection`; each side's leftovers are
/// appended to it to form `combined_a` / `combined_b`. The score is the best
/// [`ratio`] among `(intersection, combined_a)`, `(intersection, combined_b)`
/// and `(combined_a, combined_b)`.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let intersection = join(tokens_a.intersection(&tokens_b));
    let diff_a = join(tokens_a.difference(&tokens_b));
    let diff_b = join(tokens_b.difference(&tokens_a));

    let combined_a = concat(&intersection, &diff_a);
    let combined_b = concat(&intersection, &diff_b);

    ratio(&intersection, &combined_a)
        .max(ratio(&intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

/// Normalized indel similarity of two strings, 0-100.
///
/// `2 * LCS / (len(a) + len(b))`, counted in chars and rounded. Returns 0
/// when either side is empty.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let total = (a.len() + b.len()) as f64;
    let lcs = lcs_len(&a, &b) as f64;
    (200.0 * lcs / total).round() as u8
}

/// Longest common subsequence length, single-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{head} {tail}"),
    }
}
