//! Persistence layer for ragdesk-vector.
//!
//! Layout under the data directory:
//! - `collections.json` - names of all collections
//! - `{name}/collection.json` - properties and records in insertion order
//!
//! A collection is one file, written to a temporary sibling and renamed into
//! place. A failed write leaves the previous file untouched.

use crate::collection::{Collection, CollectionState};
use crate::error::{Error, Result};
use crate::types::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const COLLECTIONS_FILE: &str = "collections.json";
const COLLECTION_FILE: &str = "collection.json";

/// On-disk form of a collection.
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    dimensions: Option<usize>,
    count: usize,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
    records: Vec<Record>,
}

/// Write bytes to `path` through a temporary file and an atomic rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Save the list of collection names.
pub async fn save_collection_names(base_path: &Path, names: &[String]) -> Result<()> {
    tokio::fs::create_dir_all(base_path).await?;
    let data = serde_json::to_vec_pretty(&names)
        .map_err(|e| Error::Persistence(format!("Failed to serialize collections: {}", e)))?;
    write_atomic(&base_path.join(COLLECTIONS_FILE), &data).await
}

/// Load the list of collection names. A missing file means no collections.
pub async fn load_collection_names(base_path: &Path) -> Result<Vec<String>> {
    let path = base_path.join(COLLECTIONS_FILE);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(Vec::new());
    }
    let data = tokio::fs::read_to_string(&path).await?;
    serde_json::from_str(&data)
        .map_err(|e| Error::Persistence(format!("Failed to parse {}: {}", COLLECTIONS_FILE, e)))
}

/// Save one state of a collection.
pub async fn save_collection(base_path: &Path, name: &str, state: &CollectionState) -> Result<()> {
    let collection_path = base_path.join(name);
    tokio::fs::create_dir_all(&collection_path).await?;

    let file = CollectionFile {
        name: name.to_string(),
        dimensions: state.index.dimensions(),
        count: state.index.len(),
        properties: state.properties.clone(),
        updated_at: Utc::now(),
        records: state.index.records().to_vec(),
    };

    let data = serde_json::to_vec(&file)
        .map_err(|e| Error::Persistence(format!("Failed to serialize '{}': {}", name, e)))?;
    write_atomic(&collection_path.join(COLLECTION_FILE), &data).await?;

    debug!(name, count = file.count, "Saved collection");
    Ok(())
}

/// Load a collection from disk.
pub async fn load_collection(base_path: &Path, name: &str) -> Result<Collection> {
    let path = base_path.join(name).join(COLLECTION_FILE);
    if !tokio::fs::try_exists(&path).await? {
        return Err(Error::CollectionNotFound(name.to_string()));
    }

    let data = tokio::fs::read_to_string(&path).await?;
    let file: CollectionFile = serde_json::from_str(&data)
        .map_err(|e| Error::Persistence(format!("Failed to parse collection '{}': {}", name, e)))?;

    if file.records.len() != file.count {
        return Err(Error::Persistence(format!(
            "Collection '{}' lists {} records but {} were found",
            name,
            file.count,
            file.records.len()
        )));
    }

    let collection = Collection::from_records(file.name, file.records, file.properties)?;

    info!(name, count = collection.len(), dimensions = ?collection.dimensions(), "Loaded collection");
    Ok(collection)
}
