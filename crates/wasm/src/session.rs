//! Page-facing exports: remote calls and the per-user session

use fishtracker_core::{
    load_detail_async, AsyncFishSource, CustomFishInput, Fish, FishTracker, FishTrackerError,
    SeenFilter, SightingInput, SightingStore, StoreEvent,
};
use serde::Serialize;
use std::sync::mpsc::Receiver;
use wasm_bindgen::prelude::*;

use crate::http_client::{HttpDescriptionSource, HttpFishSource};
use crate::storage::LocalStorageBackend;

#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize tracing for WASM
    tracing_wasm::set_as_global_default();
}

fn to_js(e: FishTrackerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| to_js(e.into()))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| to_js(e.into()))
}

#[derive(Serialize)]
struct EventJson<'a> {
    namespace: &'a str,
    collection: &'static str,
}

// ============================================================================
// Remote calls
// ============================================================================

/// `GET {api_base_url}/api/fish` as a JSON array. A blank base URL means
/// the page origin.
#[wasm_bindgen]
pub async fn fetch_fishes(api_base_url: String) -> Result<String, JsValue> {
    let fishes = HttpFishSource::for_page(&api_base_url)
        .fetch_fishes()
        .await
        .map_err(to_js)?;
    to_json(&fishes)
}

/// Fish detail with its AI description (placeholder on failure). The
/// description is always requested from the page origin.
#[wasm_bindgen]
pub async fn fetch_fish_detail(api_base_url: String, id: String) -> Result<String, JsValue> {
    let fish = load_detail_async(
        &HttpFishSource::for_page(&api_base_url),
        &HttpDescriptionSource::from_origin(),
        &id,
    )
    .await
    .map_err(to_js)?;
    to_json(&fish)
}

// ============================================================================
// Session
// ============================================================================

#[wasm_bindgen]
pub struct TrackerSession {
    tracker: FishTracker<LocalStorageBackend>,
    events: Receiver<StoreEvent>,
}

#[wasm_bindgen]
impl TrackerSession {
    #[wasm_bindgen(constructor)]
    pub fn new(user: &str) -> Result<TrackerSession, JsValue> {
        let backend = LocalStorageBackend::open().map_err(to_js)?;
        let tracker = FishTracker::new(SightingStore::new(backend), user).map_err(to_js)?;
        let events = tracker.subscribe();
        tracing::info!(user = %user, "Opened tracker session");
        Ok(TrackerSession { tracker, events })
    }

    /// Merge a fetched fish list (JSON array) with stored custom fish
    #[wasm_bindgen(js_name = loadCatalog)]
    pub fn load_catalog(&mut self, remote_json: &str) -> Result<String, JsValue> {
        let remote: Vec<Fish> = from_json(remote_json)?;
        let fishes: Vec<&Fish> = self.tracker.load_catalog(remote).fishes().collect();
        to_json(&fishes)
    }

    /// Catalog filtered by "all", "seen" or "unseen"
    pub fn filtered(&self, filter: &str) -> Result<String, JsValue> {
        let mode: SeenFilter = filter.parse().map_err(|e: String| JsValue::from_str(&e))?;
        to_json(&self.tracker.filtered(mode))
    }

    pub fn progress(&self) -> Result<String, JsValue> {
        to_json(&self.tracker.progress())
    }

    #[wasm_bindgen(js_name = isSeen)]
    pub fn is_seen(&self, fish_id: &str) -> bool {
        self.tracker.is_seen(fish_id)
    }

    #[wasm_bindgen(js_name = toggleSeen)]
    pub fn toggle_seen(&self, fish_id: &str) -> Result<bool, JsValue> {
        self.tracker.toggle_seen(fish_id).map_err(to_js)
    }

    /// Validate and store a sighting; returns the updated fish
    #[wasm_bindgen(js_name = recordSighting)]
    pub fn record_sighting(&mut self, fish_id: &str, input_json: &str) -> Result<String, JsValue> {
        let input: SightingInput = from_json(input_json)?;
        let recorded = self.tracker.record_sighting(fish_id, &input).map_err(to_js)?;
        to_json(&recorded.fish)
    }

    #[wasm_bindgen(js_name = addCustomFish)]
    pub fn add_custom_fish(&mut self, input_json: &str) -> Result<String, JsValue> {
        let input: CustomFishInput = from_json(input_json)?;
        let fish = self.tracker.add_custom_fish(&input).map_err(to_js)?;
        to_json(&fish)
    }

    /// Replace a fish that changed elsewhere (e.g. on a detail view)
    #[wasm_bindgen(js_name = applyUpdate)]
    pub fn apply_update(&mut self, fish_json: &str) -> Result<bool, JsValue> {
        let fish: Fish = from_json(fish_json)?;
        let origin = self.tracker.apply_update(&fish).map_err(to_js)?;
        Ok(origin.is_some())
    }

    pub fn sightings(&self, fish_id: &str) -> Result<String, JsValue> {
        to_json(&self.tracker.sightings_for(fish_id))
    }

    /// Store changes since the last call, as `[{namespace, collection}]`
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&self) -> Result<String, JsValue> {
        let events: Vec<StoreEvent> = self.events.try_iter().collect();
        let json: Vec<EventJson> = events
            .iter()
            .map(|e| EventJson {
                namespace: &e.namespace,
                collection: e.collection.name(),
            })
            .collect();
        to_json(&json)
    }
}
