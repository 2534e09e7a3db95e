//! Vector collection.
//!
//! A collection is a named container for records sharing one dimensionality.
//! Its string properties carry collection-level facts such as the embedding
//! model that produced the vectors.
//!
//! Records and properties live behind a single lock. Writers work on a
//! [`CollectionState`] copy and publish it with [`Collection::commit`], so a
//! reader sees either the state before a write or the state after it.

use crate::error::Result;
use crate::index::FlatIndex;
use crate::types::{Record, SearchResult};
use crate::CollectionStats;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Everything a collection stores, swapped as a unit.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    /// Records in insertion order.
    pub index: FlatIndex,
    /// Collection-level string properties.
    pub properties: BTreeMap<String, String>,
}

/// A named collection of records.
pub struct Collection {
    name: String,
    state: RwLock<CollectionState>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_state(name, CollectionState::default())
    }

    /// Wrap an existing state, e.g. one read back from disk.
    pub fn with_state(name: impl Into<String>, state: CollectionState) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(state),
        }
    }

    /// Rebuild a collection from persisted records.
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<Record>,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut index = FlatIndex::new();
        index.insert_batch(records)?;
        Ok(Self::with_state(name, CollectionState { index, properties }))
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimensionality of stored vectors, if any have been stored.
    pub fn dimensions(&self) -> Option<usize> {
        self.state.read().index.dimensions()
    }

    /// Get the number of records in the collection.
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Check if a record id is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.state.read().index.contains(id)
    }

    /// Fetch a stored record by id.
    pub fn get(&self, id: &str) -> Option<Record> {
        self.state.read().index.get(id).cloned()
    }

    /// Search for similar vectors.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.state.read().index.search(query, limit)
    }

    /// Read a collection property.
    pub fn property(&self, key: &str) -> Option<String> {
        self.state.read().properties.get(key).cloned()
    }

    /// Copy of the current state for a writer to modify.
    pub fn stage(&self) -> CollectionState {
        self.state.read().clone()
    }

    /// Publish a staged state under one write guard.
    pub fn commit(&self, state: CollectionState) {
        *self.state.write() = state;
    }

    /// Insert records in place; all or nothing.
    pub fn insert_batch(&self, records: Vec<Record>) -> Result<usize> {
        self.state.write().index.insert_batch(records)
    }

    /// Set a property in place.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state.write().properties.insert(key.into(), value.into());
    }

    /// Get collection statistics.
    pub fn stats(&self) -> CollectionStats {
        let state = self.state.read();
        CollectionStats {
            name: self.name.clone(),
            vector_count: state.index.len(),
            dimensions: state.index.dimensions(),
            memory_bytes: state.index.memory_usage(),
            properties: state.properties.clone(),
        }
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("dimensions", &self.dimensions())
            .finish()
    }
}
