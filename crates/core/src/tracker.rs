//! Per-user tracker session
//!
//! Owns the reconciled catalog for one user and routes every mutation
//! (seen toggles, sightings, custom fish) through the local store.

use chrono::{DateTime, Utc};
use std::sync::mpsc::Receiver;

use crate::catalog::{Catalog, CatalogProgress};
use crate::custom::CustomFishInput;
use crate::error::{FishTrackerError, Result};
use crate::models::{Fish, FishOrigin, SeenFilter, Sighting};
use crate::sighting::{RecordedSighting, SightingInput, SightingRecorder};
use crate::source::FishSource;
use crate::store::{SeenSet, SightingStore, StorageBackend, StoreEvent};

pub struct FishTracker<B> {
    store: SightingStore<B>,
    user: String,
    catalog: Catalog,
}

impl<B: StorageBackend> FishTracker<B> {
    /// Start a session for `user` with an empty catalog
    pub fn new(store: SightingStore<B>, user: impl Into<String>) -> Result<Self> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(FishTrackerError::Config("a user identifier is required".to_string()));
        }
        Ok(Self {
            store,
            user,
            catalog: Catalog::default(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn store(&self) -> &SightingStore<B> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.store.subscribe()
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Merge an already fetched remote list with this user's custom fish
    pub fn load_catalog(&mut self, remote: Vec<Fish>) -> &Catalog {
        let custom = self.store.load_custom_fish(&self.user);
        tracing::info!(remote = remote.len(), custom = custom.len(), user = %self.user, "Loaded catalog");
        self.catalog = Catalog::reconcile(remote, custom);
        &self.catalog
    }

    /// Fetch the remote list and rebuild the catalog. On failure the
    /// current catalog is left untouched.
    pub fn refresh<S: FishSource + ?Sized>(&mut self, source: &S) -> Result<&Catalog> {
        let remote = source.fetch_fishes()?;
        Ok(self.load_catalog(remote))
    }

    pub fn seen(&self) -> SeenSet {
        self.store.load_seen(&self.user)
    }

    pub fn is_seen(&self, fish_id: &str) -> bool {
        self.seen().contains(fish_id)
    }

    pub fn filtered(&self, mode: SeenFilter) -> Vec<&Fish> {
        self.catalog.filter(&self.seen(), mode)
    }

    pub fn progress(&self) -> CatalogProgress {
        self.catalog.progress(&self.seen())
    }

    /// Flip "spotted" for a fish; sighting history is not touched
    pub fn toggle_seen(&self, fish_id: &str) -> Result<bool> {
        self.store.toggle_seen(&self.user, fish_id)
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Replace a fish in the catalog, persisting it when it is a custom fish.
    /// Remote fish are only updated in memory.
    pub fn apply_update(&mut self, fish: &Fish) -> Result<Option<FishOrigin>> {
        let origin = self.catalog.replace(fish);
        if origin == Some(FishOrigin::Custom) {
            self.store.update_custom_fish(&self.user, fish)?;
        }
        Ok(origin)
    }

    pub fn record_sighting(&mut self, fish_id: &str, input: &SightingInput) -> Result<RecordedSighting> {
        self.record_sighting_at(fish_id, input, Utc::now())
    }

    /// Append a sighting for a catalog fish and propagate its new snapshot
    pub fn record_sighting_at(
        &mut self,
        fish_id: &str,
        input: &SightingInput,
        now: DateTime<Utc>,
    ) -> Result<RecordedSighting> {
        let fish = self
            .catalog
            .get(fish_id)
            .map(|entry| entry.fish.clone())
            .ok_or_else(|| FishTrackerError::NotFound(fish_id.to_string()))?;

        let recorded = SightingRecorder::new(&self.store).record_at(&self.user, &fish, input, now)?;
        self.apply_update(&recorded.fish)?;
        Ok(recorded)
    }

    pub fn add_custom_fish(&mut self, input: &CustomFishInput) -> Result<Fish> {
        self.add_custom_fish_at(input, Utc::now())
    }

    pub fn add_custom_fish_at(&mut self, input: &CustomFishInput, now: DateTime<Utc>) -> Result<Fish> {
        let catalog = &self.catalog;
        let fish = input.into_fish(now, |id| catalog.contains(id))?;
        self.store.add_custom_fish(&self.user, fish.clone())?;
        self.catalog.push_custom(fish.clone());
        tracing::info!(fish_id = %fish.id, name = %fish.name, "Added custom fish");
        Ok(fish)
    }

    pub fn sightings_for(&self, fish_id: &str) -> Vec<Sighting> {
        self.store.sightings_for(&self.user, fish_id)
    }
}
