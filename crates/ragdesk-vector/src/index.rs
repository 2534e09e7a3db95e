//! Exact (brute-force) vector index.
//!
//! Records are kept in insertion order. Search scores every record by cosine
//! similarity and uses a stable sort, so equal scores come back in the order
//! they were inserted.

use crate::error::{Error, Result};
use crate::types::{Record, SearchResult, VectorId};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Flat index over a single collection. Not synchronized; see [`crate::Collection`].
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    /// Established by the first insert, reset by `clear`.
    dimensions: Option<usize>,
    records: Vec<Record>,
    positions: HashMap<VectorId, usize>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensionality, once established.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check whether an id is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Check a batch against the index without modifying it.
    ///
    /// Returns the dimensionality the index will have after the batch.
    pub fn validate_batch(&self, batch: &[Record]) -> Result<Option<usize>> {
        let mut expected = self.dimensions;
        let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());

        for record in batch {
            if record.vector.is_empty() {
                return Err(Error::InvalidVector(format!(
                    "Vector '{}' is empty",
                    record.id
                )));
            }
            if record.vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidVector(format!(
                    "Vector '{}' contains NaN or Inf",
                    record.id
                )));
            }

            match expected {
                Some(dim) if dim != record.vector.len() => {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        actual: record.vector.len(),
                    });
                }
                Some(_) => {}
                None => expected = Some(record.vector.len()),
            }

            if self.positions.contains_key(&record.id) || !seen.insert(record.id.as_str()) {
                return Err(Error::DuplicateId(record.id.clone()));
            }
        }

        Ok(expected)
    }

    /// Insert a batch atomically: either every record is stored or none is.
    pub fn insert_batch(&mut self, batch: Vec<Record>) -> Result<usize> {
        let dimensions = self.validate_batch(&batch)?;
        let count = batch.len();

        self.dimensions = dimensions;
        for record in batch {
            trace!(id = %record.id, "Inserting record");
            self.positions.insert(record.id.clone(), self.records.len());
            self.records.push(record);
        }

        Ok(count)
    }

    /// Score every record against `query` and return the best `limit`.
    ///
    /// An empty index returns an empty result, whatever the query length.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let Some(dimensions) = self.dimensions else {
            return Ok(Vec::new());
        };
        if limit == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != dimensions {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (pos, cosine_similarity(query, &record.vector)))
            .collect();

        // Stable: ties keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let record = &self.records[pos];
                SearchResult {
                    id: record.id.clone(),
                    score,
                    document: record.document.clone(),
                    metadata: record.metadata.clone(),
                }
            })
            .collect())
    }

    /// Remove every record and forget the established dimensionality.
    pub fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.dimensions = None;
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.vector.len() * std::mem::size_of::<f32>() + r.document.len() + r.id.len())
            .sum()
    }
}

/// Cosine similarity of two equal-length vectors; a zero-norm side scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
