//! Key-value layer shared by the credential and notes stores.
//!
//! Both stores only need three primitives from the underlying medium:
//! point reads, an atomic insert-if-absent (registration) and a
//! compare-and-swap (note saving). [`Keyspace`] captures that, with a
//! provided read-modify-write loop built on top of the CAS.
//!
//! - `sled::Tree`: durable storage, one tree per store
//! - [`MemoryKeyspace`]: mutex-guarded map for tests and throwaway runs

use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StoreError;

pub trait Keyspace: Clone + Send + Sync + 'static {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key` only if the key is vacant.
    /// Returns `false` (and writes nothing) when the key already exists.
    fn insert_if_absent(&self, key: &[u8], value: Vec<u8>) -> Result<bool, StoreError>;

    /// Replace the value under `key` if it still equals `expected`
    /// (`None` meaning vacant). Returns `false` on a lost race.
    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool, StoreError>;

    /// Read-modify-write retried until the swap lands on an unchanged value.
    /// `f` may run more than once and must not have side effects.
    fn update<F>(&self, key: &[u8], mut f: F) -> Result<Vec<u8>, StoreError>
    where
        F: FnMut(Option<&[u8]>) -> Result<Vec<u8>, StoreError>,
    {
        loop {
            let current = self.get(key)?;
            let next = f(current.as_deref())?;
            if self.compare_and_swap(key, current.as_deref(), next.clone())? {
                return Ok(next);
            }
            tracing::debug!("Concurrent write detected, retrying update");
        }
    }
}

impl Keyspace for sled::Tree {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(sled::Tree::get(self, key)?.map(|v| v.to_vec()))
    }

    fn insert_if_absent(&self, key: &[u8], value: Vec<u8>) -> Result<bool, StoreError> {
        Keyspace::compare_and_swap(self, key, None, value)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let swapped = sled::Tree::compare_and_swap(self, key, expected, Some(new))?.is_ok();
        if swapped {
            self.flush()?;
        }
        Ok(swapped)
    }
}

/// In-memory keyspace. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyspace {
    entries: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryKeyspace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Keyspace for MemoryKeyspace {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn insert_if_absent(&self, key: &[u8], value: Vec<u8>) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_vec(), value);
        Ok(true)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        entries.insert(key.to_vec(), new);
        Ok(true)
    }
}

/// Durable storage: one Sled database with a tree per store.
#[derive(Clone)]
pub struct Storage {
    #[allow(dead_code)] // held so the database outlives its trees
    db: Db,
    users_tree: sled::Tree,
    notes_tree: sled::Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let users_tree = db.open_tree("users")?;
        let notes_tree = db.open_tree("notes")?;
        Ok(Self {
            db,
            users_tree,
            notes_tree,
        })
    }

    pub fn users(&self) -> sled::Tree {
        self.users_tree.clone()
    }

    pub fn notes(&self) -> sled::Tree {
        self.notes_tree.clone()
    }
}
