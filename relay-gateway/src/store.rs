//! In-memory note registry backing the demo endpoints.
//!
//! Keeps notes in insertion order behind a read/write lock. Nothing is
//! persisted; the store lives for the process lifetime.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

/// A stored note.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    /// Unique identifier assigned at creation.
    pub id: Uuid,
    /// Short title; never blank.
    pub title: String,
    /// Free-form note text.
    pub body: String,
    /// When the note was created.
    pub created_at: DateTime<Utc>,
}

/// Thread-safe registry of notes, in insertion order.
#[derive(Debug, Default)]
pub struct NoteStore {
    entries: RwLock<IndexMap<Uuid, Note>>,
}

impl NoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note and return its assigned ID.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn create(&self, title: String, body: String) -> Uuid {
        let id = Uuid::new_v4();
        let note = Note {
            id,
            title,
            body,
            created_at: Utc::now(),
        };
        self.write().insert(id, note);
        id
    }

    /// All notes, in insertion order.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<Note> {
        self.read().values().cloned().collect()
    }

    /// Look up a note by ID.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Note> {
        self.read().get(&id).cloned()
    }

    /// Remove a note by ID, preserving the order of the rest. Returns `true`
    /// if it existed.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn remove(&self, id: Uuid) -> bool {
        self.write().shift_remove(&id).is_some()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<Uuid, Note>> {
        self.entries.read().expect("note store read lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<Uuid, Note>> {
        self.entries.write().expect("note store write lock poisoned")
    }
}
