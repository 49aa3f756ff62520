//! Local sighting store
//!
//! Per-user key-value persistence for the three local collections
//! (seen-set, custom fish, sighting history). Each collection is a single
//! JSON document under `{collection}_{user}`, always written whole.
//! The actual storage (browser localStorage, SQLite, memory) is supplied
//! through [`StorageBackend`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::error::{FishTrackerError, Result};
use crate::models::{Fish, Sighting};

// ============================================================================
// Backend
// ============================================================================

/// Raw string key-value storage
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// In-process backend, used by tests and as a fallback when no
/// persistent storage is available
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items().remove(key);
        Ok(())
    }
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    SeenSet,
    CustomFish,
    SightingHistory,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::SeenSet => "fishSightings",
            Collection::CustomFish => "customFish",
            Collection::SightingHistory => "sightingHistory",
        }
    }

    /// Storage key for this collection within a user's namespace
    pub fn key(&self, namespace: &str) -> String {
        format!("{}_{}", self.name(), namespace)
    }
}

/// Sent to subscribers after a collection has been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub namespace: String,
    pub collection: Collection,
}

/// Outcome of decoding a stored collection document
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// No document under the key
    Missing,
    /// Readable entries; entries of the wrong shape are skipped
    Loaded(Vec<T>),
    /// Document present but not a JSON array; treated as empty
    Recovered(String),
}

impl<T> Decoded<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Decoded::Loaded(items) => items,
            Decoded::Missing | Decoded::Recovered(_) => Vec::new(),
        }
    }
}

/// Decode a whole-collection JSON array entry by entry, so one bad entry
/// does not cost the rest of the collection
pub fn decode_collection<T: DeserializeOwned>(raw: Option<&str>) -> Decoded<T> {
    let Some(text) = raw else {
        return Decoded::Missing;
    };
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(text) {
        Ok(values) => values,
        Err(e) => return Decoded::Recovered(e.to_string()),
    };

    let items = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(index, "Skipping unreadable stored entry: {}", e);
                None
            }
        })
        .collect();
    Decoded::Loaded(items)
}

// ============================================================================
// Seen-set
// ============================================================================

/// Fish ids the user has marked as spotted, in the order they were marked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet(Vec<String>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fish_id: &str) -> bool {
        self.0.iter().any(|id| id == fish_id)
    }

    /// Flip membership of `fish_id`; returns whether it is now seen
    pub fn toggle(&mut self, fish_id: &str) -> bool {
        if self.contains(fish_id) {
            self.0.retain(|id| id != fish_id);
            false
        } else {
            self.0.push(fish_id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SeenSet::new();
        for id in iter {
            let id = id.into();
            if !set.contains(&id) {
                set.0.push(id);
            }
        }
        set
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct SightingStore<B> {
    backend: B,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl<B: StorageBackend> SightingStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Receive a [`StoreEvent`] for every successful write
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    fn notify(&self, namespace: &str, collection: Collection) {
        let event = StoreEvent {
            namespace: namespace.to_string(),
            collection,
        };
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Read a collection, distinguishing missing from corrupted documents
    pub fn load_decoded<T: DeserializeOwned>(&self, namespace: &str, collection: Collection) -> Decoded<T> {
        let key = collection.key(namespace);
        match self.backend.get_item(&key) {
            Ok(raw) => decode_collection(raw.as_deref()),
            Err(e) => Decoded::Recovered(e.to_string()),
        }
    }

    /// Read a collection; absent or unparsable documents yield an empty list
    pub fn load<T: DeserializeOwned>(&self, namespace: &str, collection: Collection) -> Vec<T> {
        match self.load_decoded(namespace, collection) {
            Decoded::Recovered(reason) => {
                let err = FishTrackerError::StorageParse(reason);
                tracing::warn!(key = %collection.key(namespace), "{}; treating as empty", err);
                Vec::new()
            }
            decoded => decoded.into_items(),
        }
    }

    /// Overwrite a whole collection
    pub fn save<T: Serialize>(&self, namespace: &str, collection: Collection, items: &[T]) -> Result<()> {
        let key = collection.key(namespace);
        let json = serde_json::to_string(items)?;
        self.backend.set_item(&key, &json)?;
        tracing::debug!(key = %key, items = items.len(), "Saved collection");
        self.notify(namespace, collection);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Seen-set
    // ------------------------------------------------------------------------

    pub fn load_seen(&self, namespace: &str) -> SeenSet {
        self.load::<String>(namespace, Collection::SeenSet).into_iter().collect()
    }

    pub fn save_seen(&self, namespace: &str, seen: &SeenSet) -> Result<()> {
        self.save(namespace, Collection::SeenSet, seen.as_slice())
    }

    /// Toggle a fish in the persisted seen-set; returns the new membership
    pub fn toggle_seen(&self, namespace: &str, fish_id: &str) -> Result<bool> {
        let mut seen = self.load_seen(namespace);
        let now_seen = seen.toggle(fish_id);
        self.save_seen(namespace, &seen)?;
        Ok(now_seen)
    }

    // ------------------------------------------------------------------------
    // Custom fish
    // ------------------------------------------------------------------------

    pub fn load_custom_fish(&self, namespace: &str) -> Vec<Fish> {
        self.load(namespace, Collection::CustomFish)
    }

    pub fn save_custom_fish(&self, namespace: &str, fishes: &[Fish]) -> Result<()> {
        self.save(namespace, Collection::CustomFish, fishes)
    }

    pub fn add_custom_fish(&self, namespace: &str, fish: Fish) -> Result<()> {
        let mut fishes = self.load_custom_fish(namespace);
        fishes.push(fish);
        self.save_custom_fish(namespace, &fishes)
    }

    /// Replace the stored custom fish with the same id. Returns `false`
    /// without writing when no such custom fish exists.
    pub fn update_custom_fish(&self, namespace: &str, fish: &Fish) -> Result<bool> {
        let mut fishes = self.load_custom_fish(namespace);
        let Some(slot) = fishes.iter_mut().find(|f| f.id == fish.id) else {
            return Ok(false);
        };
        *slot = fish.clone();
        self.save_custom_fish(namespace, &fishes)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Sighting history
    // ------------------------------------------------------------------------

    pub fn load_sightings(&self, namespace: &str) -> Vec<Sighting> {
        self.load(namespace, Collection::SightingHistory)
    }

    pub fn append_sighting(&self, namespace: &str, sighting: Sighting) -> Result<()> {
        let mut history = self.load_sightings(namespace);
        history.push(sighting);
        self.save(namespace, Collection::SightingHistory, &history)
    }

    pub fn sightings_for(&self, namespace: &str, fish_id: &str) -> Vec<Sighting> {
        self.load_sightings(namespace)
            .into_iter()
            .filter(|s| s.fish_id == fish_id)
            .collect()
    }
}
