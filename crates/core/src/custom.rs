//! User-created species

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{Fish, LatestSighting, Rarity};
use crate::sighting::SightingInput;

/// Image used when a custom fish is added without a photo
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x300?text=No+Image";

/// "Add species" form values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFishInput {
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Where the species was first seen, plus an optional photo
    #[serde(flatten)]
    pub location: SightingInput,
}

impl CustomFishInput {
    /// Build the fish this form describes. `is_taken` reports ids already
    /// present in the catalog.
    pub fn into_fish<F>(&self, now: DateTime<Utc>, is_taken: F) -> Result<Fish, ValidationError>
    where
        F: Fn(&str) -> bool,
    {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let valid = self.location.validate()?;

        let base = format!("fish-{}", now.timestamp_millis());
        let mut id = base.clone();
        let mut n = 0;
        while is_taken(&id) {
            n += 1;
            id = format!("{}-{}", base, n);
        }

        Ok(Fish {
            id,
            name: name.to_string(),
            image: valid.photo.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            rarity: self.rarity.clone(),
            latest_sighting: Some(LatestSighting {
                latitude: valid.latitude,
                longitude: valid.longitude,
                timestamp: now,
            }),
            description: None,
        })
    }
}
