//! String similarity ratios for approximate title matching.
//!
//! Every strategy maps a pair of strings to `[0, 1]`, 1 meaning identical.
//! Comparison is on `char`s, so multi-byte titles are measured by characters.

use serde::{Deserialize, Serialize};

pub trait SimilarityRatio: Send + Sync {
    fn ratio(&self, a: &str, b: &str) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioStrategy {
    /// `2 * M / T` over recursively found longest matching blocks.
    SequenceMatcher,
    /// `1 - distance / max_len` with unit-cost edits.
    Levenshtein,
    JaroWinkler,
}

impl RatioStrategy {
    pub fn matcher(&self) -> &'static dyn SimilarityRatio {
        match self {
            RatioStrategy::SequenceMatcher => &SequenceMatcher,
            RatioStrategy::Levenshtein => &Levenshtein,
            RatioStrategy::JaroWinkler => &JaroWinkler,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceMatcher;

impl SimilarityRatio for SequenceMatcher {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matching_chars(&a, &b) as f64 / total as f64
    }
}

/// Total size of the matching blocks: take the longest common block, then recurse
/// into the pieces on either side of it.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges; earliest `i`, then
/// earliest `j`, on ties.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            cur[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            if cur[col] > best.2 {
                let k = cur[col];
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl SimilarityRatio for Levenshtein {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 1.0;
        }
        1.0 - levenshtein(&a, &b) as f64 / longest as f64
    }
}

pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

const WINKLER_PREFIX: usize = 4;
const WINKLER_SCALE: f64 = 0.1;

impl SimilarityRatio for JaroWinkler {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let jaro = jaro(&a, &b);
        let prefix = a.iter().zip(b.iter()).take(WINKLER_PREFIX).take_while(|(x, y)| x == y).count();
        jaro + prefix as f64 * WINKLER_SCALE * (1.0 - jaro)
    }
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;
    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }
    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count() / 2;
    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64) / m) / 3.0
}
