#![deny(missing_docs)]

//! # stele-store — In-Memory Document Store
//!
//! A key/value store for covenant documents, suitable for tests, tools,
//! and scenarios without persistence. Documents are stored as JSON
//! values and defensively copied in both directions, so callers can
//! never alias stored state.
//!
//! The store performs no cryptographic validation — verifying a
//! document is the caller's job before or after storage. It also takes
//! no locks: callers that share a store across threads wrap it in their
//! own synchronization.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Errors from store operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The identifier was empty or blank.
    #[error("{operation}(): id must be a non-empty string")]
    InvalidId {
        /// The store operation that rejected the id.
        operation: &'static str,
    },

    /// The document was not a JSON object.
    #[error("put(): document must be a JSON object")]
    InvalidDocument,
}

/// In-memory document store backed by an ordered map.
///
/// The map is keyed by document id (typically the covenant's SHA-256
/// hex id), so [`MemoryStore::list`] returns documents in stable id
/// order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under an id, replacing any previous value.
    ///
    /// The document is copied in; later mutation of the caller's value
    /// does not affect the stored copy.
    ///
    /// # Errors
    ///
    /// Rejects blank ids and non-object documents.
    pub fn put(&mut self, id: &str, doc: &Value) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidId { operation: "put" });
        }
        if !doc.is_object() {
            return Err(StoreError::InvalidDocument);
        }
        self.data.insert(id.to_string(), doc.clone());
        Ok(())
    }

    /// Retrieve a copy of a document by id.
    ///
    /// # Errors
    ///
    /// Rejects blank ids.
    pub fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidId { operation: "get" });
        }
        Ok(self.data.get(id).cloned())
    }

    /// Delete a document by id. Returns true iff a document was
    /// removed.
    ///
    /// # Errors
    ///
    /// Rejects blank ids.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidId { operation: "delete" });
        }
        Ok(self.data.remove(id).is_some())
    }

    /// Whether a document with this id exists.
    pub fn has(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// Copies of all stored documents, in id order.
    pub fn list(&self) -> Vec<Value> {
        self.data.values().cloned().collect()
    }

    /// Number of stored documents.
    pub fn count(&self) -> usize {
        self.data.len()
    }
}
