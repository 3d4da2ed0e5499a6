//! Notes Store: one JSON document per (username, game), mapping character
//! name to free-text notes.
//!
//! Saves merge a single entry into the stored document with a
//! compare-and-swap loop, so two saves for different characters of the same
//! document cannot overwrite each other. Game and character names are not
//! checked against the catalog here.

use tracing::info;

use crate::credentials::normalize_username;
use crate::error::StoreError;
use crate::models::NotesDocument;
use crate::storage::Keyspace;

/// Big-endian username length, username, then game. The length prefix keeps
/// distinct (username, game) pairs apart whatever bytes they contain.
fn document_key(username: &str, game: &str) -> Vec<u8> {
    let username = normalize_username(username);
    let mut key = Vec::with_capacity(4 + username.len() + game.len());
    key.extend_from_slice(&(username.len() as u32).to_be_bytes());
    key.extend_from_slice(username.as_bytes());
    key.extend_from_slice(game.as_bytes());
    key
}

fn decode(bytes: Option<&[u8]>) -> Result<NotesDocument, StoreError> {
    match bytes {
        Some(bytes) => Ok(serde_json::from_slice(bytes)?),
        None => Ok(NotesDocument::new()),
    }
}

#[derive(Clone)]
pub struct NotesStore<K: Keyspace> {
    documents: K,
}

impl<K: Keyspace> NotesStore<K> {
    pub fn new(documents: K) -> Self {
        Self { documents }
    }

    /// Every saved note for the user and game; empty if nothing was saved yet.
    pub fn load_all(&self, username: &str, game: &str) -> Result<NotesDocument, StoreError> {
        let bytes = self.documents.get(&document_key(username, game))?;
        decode(bytes.as_deref())
    }

    /// Notes for one character, `""` when there are none.
    pub fn load_one(&self, username: &str, game: &str, character: &str) -> Result<String, StoreError> {
        let mut notes = self.load_all(username, game)?;
        Ok(notes.remove(character).unwrap_or_default())
    }

    /// Characters that have an entry in the user's document for `game`.
    pub fn characters_with_notes(&self, username: &str, game: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.load_all(username, game)?.into_keys().collect())
    }

    /// Set the entry for `character`, leaving the other characters untouched.
    /// Empty text is stored as-is rather than removing the entry.
    pub fn save_one(
        &self,
        username: &str,
        game: &str,
        character: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.documents.update(&document_key(username, game), |current| {
            let mut notes = decode(current)?;
            notes.insert(character.to_string(), text.to_string());
            Ok(serde_json::to_vec(&notes)?)
        })?;

        info!(username, game, character, bytes = text.len(), "Notes saved");
        Ok(())
    }
}
