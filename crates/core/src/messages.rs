//! Request/response types for the fish API and the description endpoint

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::models::*;

/// Shown when no AI description could be generated
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available.";

/// Sighting entry as embedded in `GET /api/fish/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSighting {
    #[serde(default)]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub spotted_by: Option<String>,
}

/// Body of `GET /api/fish/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishDetailResponse {
    #[serde(flatten)]
    pub fish: Fish,
    #[serde(default)]
    pub sightings: Vec<RemoteSighting>,
}

impl FishDetailResponse {
    /// Fish with `latest_sighting` taken from the newest embedded sighting,
    /// when there is one
    pub fn into_fish(self) -> Fish {
        let FishDetailResponse { mut fish, sightings } = self;
        if let Some(latest) = sightings.iter().max_by_key(|s| s.timestamp) {
            fish.latest_sighting = Some(LatestSighting {
                latitude: latest.latitude,
                longitude: latest.longitude,
                timestamp: latest.timestamp,
            });
        }
        fish
    }
}

/// Body of `POST /api/generate-description`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionRequest {
    pub name: String,
}

/// Response of `POST /api/generate-description`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionResponse {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DescriptionResponse {
    pub fn into_result(self) -> Result<String, String> {
        match (self.description, self.error) {
            (Some(description), _) if !description.trim().is_empty() => Ok(description),
            (_, Some(error)) => Err(error),
            _ => Err("empty description".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_takes_newest_sighting() {
        let json = r#"{
            "id": "fish-1",
            "name": "Moray Eel",
            "image": "",
            "rarity": "RARE",
            "latestSighting": {"latitude": 1.0, "longitude": 1.0, "timestamp": "2020-01-01T00:00:00Z"},
            "sightings": [
                {"timestamp": "2024-03-01T00:00:00Z", "latitude": 10.0, "longitude": 20.0},
                {"timestamp": "2024-06-01T00:00:00Z", "latitude": 11.0, "longitude": 21.0},
                {"timestamp": "2023-01-01T00:00:00Z", "latitude": 12.0, "longitude": 22.0}
            ]
        }"#;
        let detail: FishDetailResponse = serde_json::from_str(json).unwrap();
        let fish = detail.into_fish();
        let latest = fish.latest_sighting.unwrap();
        assert_eq!((latest.latitude, latest.longitude), (11.0, 21.0));
    }

    #[test]
    fn detail_without_sightings_keeps_snapshot() {
        let json = r#"{
            "id": "fish-2",
            "name": "Sunfish",
            "latestSighting": {"latitude": 3.0, "longitude": 4.0, "timestamp": "2022-01-01T00:00:00Z"}
        }"#;
        let detail: FishDetailResponse = serde_json::from_str(json).unwrap();
        let fish = detail.into_fish();
        assert_eq!(fish.latest_sighting.unwrap().latitude, 3.0);
    }

    #[test]
    fn description_error_body() {
        let resp: DescriptionResponse = serde_json::from_str(r#"{"error": "Missing fish name"}"#).unwrap();
        assert_eq!(resp.into_result(), Err("Missing fish name".to_string()));
        let resp: DescriptionResponse = serde_json::from_str(r#"{"description": "A striped reef fish."}"#).unwrap();
        assert_eq!(resp.into_result(), Ok("A striped reef fish.".to_string()));
    }
}
