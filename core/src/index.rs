use crate::error::IndexError;
use crate::tokenizer::{tokenize, TokenizerOptions};
use crate::{ItemId, TermId};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::{BTreeSet, HashMap};

/// Term to column mapping, plus how many items contain each term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
    df: Vec<u32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
    pub fn get(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }
    pub fn document_frequency(&self, term: TermId) -> u32 {
        self.df.get(term as usize).copied().unwrap_or(0)
    }
}

/// One L2-normalized row. Entries are sorted by term id; an empty row is the zero vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseRow {
    pub fn is_zero(&self) -> bool { self.entries.is_empty() }

    pub fn weight(&self, term: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&term, |(t, _)| *t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Merge-join dot product. Products are summed in term order, so
    /// `a.dot(b) == b.dot(a)` exactly.
    pub fn dot(&self, other: &SparseRow) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Rows aligned with item ids, columns aligned with vocabulary term ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfMatrix {
    rows: Vec<SparseRow>,
    idf: Vec<f32>,
}

impl TfIdfMatrix {
    pub fn num_rows(&self) -> usize { self.rows.len() }
    pub fn row(&self, id: ItemId) -> Option<&SparseRow> { self.rows.get(id as usize) }
    pub fn rows(&self) -> &[SparseRow] { &self.rows }
    pub fn idf(&self, term: TermId) -> Option<f32> { self.idf.get(term as usize).copied() }
}

/// Vocabulary and matrix built together from one catalog; replaced as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    vocabulary: Vocabulary,
    matrix: TfIdfMatrix,
    fingerprint: String,
}

impl VectorIndex {
    /// Build the TF-IDF space over `blobs`, one per item in id order.
    ///
    /// tf is the raw count, idf is the smoothed `ln((1 + N) / (1 + df)) + 1`, and
    /// rows are L2-normalized. Blobs without tokens produce zero rows.
    pub fn build(blobs: &[String], options: &TokenizerOptions) -> Result<Self, IndexError> {
        if blobs.is_empty() {
            return Err(IndexError::EmptyCatalog);
        }
        let n = blobs.len();
        let tokenized: Vec<Vec<String>> = blobs.iter().map(|b| tokenize(b, options)).collect();

        // Sorted column assignment keeps term ids reproducible across builds.
        let distinct: BTreeSet<&str> = tokenized.iter().flatten().map(String::as_str).collect();
        let terms: HashMap<String, TermId> = distinct
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i as TermId))
            .collect();
        let mut df = vec![0u32; terms.len()];

        let mut counts: Vec<Vec<(TermId, u32)>> = Vec::with_capacity(n);
        for tokens in &tokenized {
            let mut tf: HashMap<TermId, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(terms[token.as_str()]).or_insert(0) += 1;
            }
            let mut row: Vec<(TermId, u32)> = tf.into_iter().collect();
            row.sort_by_key(|(t, _)| *t);
            for (t, _) in &row {
                df[*t as usize] += 1;
            }
            counts.push(row);
        }

        let idf: Vec<f64> = df
            .iter()
            .map(|d| ((1.0 + n as f64) / (1.0 + *d as f64)).ln() + 1.0)
            .collect();

        let rows: Vec<SparseRow> = counts
            .into_iter()
            .map(|row| {
                let weighted: Vec<(TermId, f64)> = row
                    .into_iter()
                    .map(|(t, tf)| (t, tf as f64 * idf[t as usize]))
                    .collect();
                let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm == 0.0 {
                    return SparseRow::default();
                }
                SparseRow { entries: weighted.into_iter().map(|(t, w)| (t, (w / norm) as f32)).collect() }
            })
            .collect();

        let fingerprint = fingerprint(blobs, options);
        tracing::info!(items = n, terms = terms.len(), %fingerprint, "vector index built");
        Ok(Self {
            vocabulary: Vocabulary { terms, df },
            matrix: TfIdfMatrix { rows, idf: idf.into_iter().map(|w| w as f32).collect() },
            fingerprint,
        })
    }

    pub(crate) fn from_parts(
        vocabulary: Vocabulary,
        matrix: TfIdfMatrix,
        fingerprint: String,
    ) -> Self {
        Self { vocabulary, matrix, fingerprint }
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    pub fn matrix(&self) -> &TfIdfMatrix { &self.matrix }
    pub fn fingerprint(&self) -> &str { &self.fingerprint }
    pub fn len(&self) -> usize { self.matrix.num_rows() }
    pub fn is_empty(&self) -> bool { self.matrix.num_rows() == 0 }
}

// Bump when tokenization or weighting changes so stale snapshots stop matching.
const FINGERPRINT_VERSION: &str = "tfidf-v1";

/// SHA-1 over the tokenizer options and the ordered blobs.
pub fn fingerprint(blobs: &[String], options: &TokenizerOptions) -> String {
    let mut hasher = Sha1::new();
    hasher.update(FINGERPRINT_VERSION.as_bytes());
    hasher.update([options.remove_stopwords as u8, options.stem as u8]);
    hasher.update((blobs.len() as u64).to_le_bytes());
    for blob in blobs {
        hasher.update((blob.len() as u64).to_le_bytes());
        hasher.update(blob.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
