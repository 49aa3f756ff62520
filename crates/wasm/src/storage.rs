//! Browser local storage backend

use fishtracker_core::{FishTrackerError, Result, StorageBackend};
use wasm_bindgen::JsValue;

fn js_err(e: JsValue) -> FishTrackerError {
    FishTrackerError::Storage(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

pub struct LocalStorageBackend {
    storage: web_sys::Storage,
}

impl LocalStorageBackend {
    /// `window.localStorage`, when the page has access to it
    pub fn open() -> Result<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| FishTrackerError::Storage("localStorage is not available".to_string()))?;
        Ok(Self { storage })
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        // Throws QuotaExceededError when a large photo does not fit
        self.storage.set_item(key, value).map_err(js_err)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_err)
    }
}
