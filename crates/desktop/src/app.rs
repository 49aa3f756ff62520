//! Main application: one tracker session plus its remote collaborators

use fishtracker_core::{
    filter_by_rarity, load_detail, sort_by_rarity, CustomFishInput, DescriptionSource, FishSource,
    FishTracker, Rarity, Result, SeenFilter, SightingInput, SightingStore, StorageBackend, StoreEvent,
};
use std::sync::mpsc::Receiver;

use crate::ui;

/// How `list` narrows and orders the catalog
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: SeenFilter,
    pub rarity: Option<Rarity>,
    pub sort_by_rarity: bool,
}

pub struct FishTrackerApp<B> {
    tracker: FishTracker<B>,
    api: Box<dyn FishSource>,
    descriptions: Box<dyn DescriptionSource>,
    events: Receiver<StoreEvent>,
}

impl<B: StorageBackend> FishTrackerApp<B> {
    pub fn new(
        backend: B,
        user: &str,
        api: Box<dyn FishSource>,
        descriptions: Box<dyn DescriptionSource>,
    ) -> Result<Self> {
        let tracker = FishTracker::new(SightingStore::new(backend), user)?;
        let events = tracker.subscribe();
        Ok(Self {
            tracker,
            api,
            descriptions,
            events,
        })
    }

    /// Load the catalog from the fish API. A failed fetch is an error.
    fn refresh(&mut self) -> Result<()> {
        self.tracker.refresh(self.api.as_ref())?;
        Ok(())
    }

    /// Load the catalog, falling back to custom fish alone when the API
    /// is unreachable
    fn refresh_or_local(&mut self) {
        let fetched = self.tracker.refresh(self.api.as_ref()).map(|_| ());
        if let Err(e) = fetched {
            tracing::warn!("Fish API unavailable, using custom fish only: {}", e);
            self.tracker.load_catalog(Vec::new());
        }
    }

    fn log_events(&self) {
        for event in self.events.try_iter() {
            tracing::debug!(namespace = %event.namespace, collection = ?event.collection, "Store changed");
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn list(&mut self, options: &ListOptions) -> Result<String> {
        self.refresh()?;
        let seen = self.tracker.seen();
        let visible = self.tracker.catalog().filter(&seen, options.filter);
        let mut visible = filter_by_rarity(visible, options.rarity.as_ref());
        if options.sort_by_rarity {
            sort_by_rarity(&mut visible);
        }
        let progress = self.tracker.progress();
        Ok(ui::render_list(&visible, &seen, options.filter, &progress))
    }

    pub fn progress(&mut self) -> Result<String> {
        self.refresh()?;
        Ok(ui::progress_line(&self.tracker.progress()))
    }

    pub fn toggle(&mut self, fish_id: &str) -> Result<String> {
        let now_seen = self.tracker.toggle_seen(fish_id)?;
        self.log_events();
        Ok(format!(
            "{} marked as {}",
            fish_id,
            if now_seen { "spotted" } else { "not spotted" }
        ))
    }

    pub fn record(&mut self, fish_id: &str, input: &SightingInput) -> Result<String> {
        self.refresh_or_local();
        let recorded = self.tracker.record_sighting(fish_id, input)?;
        self.log_events();
        Ok(format!(
            "Recorded {} for {}\n{}",
            recorded.sighting.id,
            recorded.fish.name,
            ui::sighting_row(&recorded.sighting)
        ))
    }

    pub fn add(&mut self, input: &CustomFishInput) -> Result<String> {
        self.refresh_or_local();
        let fish = self.tracker.add_custom_fish(input)?;
        self.log_events();
        Ok(format!("Added {}\n{}", fish.name, ui::fish_row(&fish, false)))
    }

    pub fn show(&mut self, fish_id: &str) -> Result<String> {
        let fish = load_detail(self.api.as_ref(), self.descriptions.as_ref(), fish_id)?;
        let sightings = self.tracker.sightings_for(fish_id).len();
        Ok(ui::render_detail(&fish, self.tracker.is_seen(fish_id), sightings))
    }

    pub fn history(&self, fish_id: &str) -> String {
        ui::render_history(fish_id, &self.tracker.sightings_for(fish_id))
    }
}
