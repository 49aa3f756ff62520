//! Sighting recorder
//!
//! Validates form input for a new sighting, appends it to the user's
//! history and produces the fish with its refreshed `latest_sighting`.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ValidationError};
use crate::models::{Fish, Sighting};
use crate::store::{Collection, StorageBackend, SightingStore};

/// Largest accepted photo, measured on the decoded bytes
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

// ============================================================================
// Input
// ============================================================================

/// Raw sighting form values, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SightingInput {
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub depth: String,
    #[serde(deserialize_with = "string_or_number")]
    pub temperature: String,
    /// Base64 data URL
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub photo_name: Option<String>,
}

impl SightingInput {
    pub fn from_values(latitude: f64, longitude: f64, depth: f64, temperature: f64) -> Self {
        Self {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            depth: depth.to_string(),
            temperature: temperature.to_string(),
            photo: None,
            photo_name: None,
        }
    }

    pub fn with_photo(mut self, photo: impl Into<String>, photo_name: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self.photo_name = Some(photo_name.into());
        self
    }

    pub fn validate(&self) -> std::result::Result<ValidatedSighting, ValidationError> {
        let latitude = parse_number("latitude", &self.latitude)?;
        let longitude = parse_number("longitude", &self.longitude)?;
        let depth = parse_number("depth", &self.depth)?;
        let temperature = parse_number("temperature", &self.temperature)?;
        validate_coordinates(latitude, longitude)?;

        let photo = match self.photo.as_deref().filter(|p| !p.is_empty()) {
            Some(data_url) => {
                validate_photo(data_url)?;
                Some(data_url.to_string())
            }
            None => None,
        };
        let photo_name = photo
            .as_ref()
            .and(self.photo_name.clone())
            .filter(|name| !name.is_empty());

        Ok(ValidatedSighting {
            latitude,
            longitude,
            depth,
            temperature,
            photo,
            photo_name,
        })
    }
}

/// Sighting values that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSighting {
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
    pub temperature: f64,
    pub photo: Option<String>,
    pub photo_name: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    })
}

// ============================================================================
// Validation
// ============================================================================

/// Parse a form field as a finite number
pub fn parse_number(field: &'static str, raw: &str) -> std::result::Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NotANumber { field })
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> std::result::Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange(longitude));
    }
    Ok(())
}

/// Check a `data:<mime>;base64,<payload>` photo: accepted type, decodable,
/// recognizable image bytes, at most [`MAX_PHOTO_BYTES`]
pub fn validate_photo(data_url: &str) -> std::result::Result<(), ValidationError> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| ValidationError::InvalidPhotoData("expected a base64 data URL".to_string()))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ValidationError::InvalidPhotoData("photo data must be base64 encoded".to_string()))?
        .to_lowercase();
    if !ACCEPTED_PHOTO_TYPES.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedPhotoType(mime));
    }

    // Base64 carries 3 bytes per 4 characters, padding aside
    let payload = payload.trim();
    let estimated = payload.len() / 4 * 3;
    if estimated > MAX_PHOTO_BYTES + 2 {
        return Err(ValidationError::PhotoTooLarge {
            size: estimated,
            limit: MAX_PHOTO_BYTES,
        });
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ValidationError::InvalidPhotoData(e.to_string()))?;
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ValidationError::PhotoTooLarge {
            size: bytes.len(),
            limit: MAX_PHOTO_BYTES,
        });
    }

    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Jpeg | image::ImageFormat::Png | image::ImageFormat::WebP) => Ok(()),
        Ok(other) => Err(ValidationError::UnsupportedPhotoType(format!("{:?}", other))),
        Err(e) => Err(ValidationError::InvalidPhotoData(e.to_string())),
    }
}

/// Turn raw image bytes into the data URL form accepted by [`validate_photo`]
pub fn encode_photo(bytes: &[u8]) -> std::result::Result<String, ValidationError> {
    let mime = match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(other) => return Err(ValidationError::UnsupportedPhotoType(format!("{:?}", other))),
        Err(e) => return Err(ValidationError::InvalidPhotoData(e.to_string())),
    };
    let data_url = format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    );
    validate_photo(&data_url)?;
    Ok(data_url)
}

// ============================================================================
// Recorder
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSighting {
    pub sighting: Sighting,
    /// The fish with `latest_sighting` pointing at `sighting`
    pub fish: Fish,
}

pub struct SightingRecorder<'a, B> {
    store: &'a SightingStore<B>,
}

impl<'a, B: StorageBackend> SightingRecorder<'a, B> {
    pub fn new(store: &'a SightingStore<B>) -> Self {
        Self { store }
    }

    pub fn record(&self, user: &str, fish: &Fish, input: &SightingInput) -> Result<RecordedSighting> {
        self.record_at(user, fish, input, Utc::now())
    }

    /// Validate and append a sighting observed at `now`.
    ///
    /// Nothing is written when validation fails. The sighting keeps `now`;
    /// only the fish's snapshot timestamp is held at its current value when
    /// `now` is older.
    pub fn record_at(
        &self,
        user: &str,
        fish: &Fish,
        input: &SightingInput,
        now: DateTime<Utc>,
    ) -> Result<RecordedSighting> {
        let valid = input.validate()?;

        let mut history = self.store.load_sightings(user);
        let sighting = Sighting {
            id: next_sighting_id(&history, now),
            fish_id: fish.id.clone(),
            timestamp: now,
            latitude: valid.latitude,
            longitude: valid.longitude,
            depth: valid.depth,
            temperature: valid.temperature,
            spotted_by: Some(user.to_string()),
            photo: valid.photo,
            photo_name: valid.photo_name,
        };

        history.push(sighting.clone());
        self.store.save(user, Collection::SightingHistory, &history)?;

        tracing::info!(
            fish_id = %fish.id,
            sighting_id = %sighting.id,
            latitude = sighting.latitude,
            longitude = sighting.longitude,
            "Recorded sighting"
        );

        let mut snapshot = sighting.snapshot();
        if let Some(previous) = &fish.latest_sighting {
            snapshot.timestamp = snapshot.timestamp.max(previous.timestamp);
        }

        Ok(RecordedSighting {
            fish: fish.with_latest_sighting(snapshot),
            sighting,
        })
    }
}

/// `sighting-{millis}`, suffixed when the history already holds that id
fn next_sighting_id(history: &[Sighting], timestamp: DateTime<Utc>) -> String {
    let base = format!("sighting-{}", timestamp.timestamp_millis());
    let taken = |id: &str| history.iter().any(|s| s.id == id);
    let mut id = base.clone();
    let mut n = 0;
    while taken(&id) {
        n += 1;
        id = format!("{}-{}", base, n);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FishTrackerError;
    use crate::models::{LatestSighting, Rarity};
    use crate::store::MemoryBackend;
    use chrono::{Duration, TimeZone};

    const USER: &str = "diver@example.com";

    // Smallest valid PNG: signature + IHDR + IDAT + IEND
    const TINY_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn fish_1() -> Fish {
        Fish {
            id: "fish-1".into(),
            name: "Clownfish".into(),
            image: String::new(),
            rarity: Rarity::Common,
            latest_sighting: Some(LatestSighting {
                latitude: 0.0,
                longitude: 0.0,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }),
            description: None,
        }
    }

    #[test]
    fn records_sighting_and_updates_snapshot() {
        let store = SightingStore::new(MemoryBackend::new());
        let recorder = SightingRecorder::new(&store);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let input = SightingInput::from_values(51.5, 5.4, 10.0, 18.0);
        let recorded = recorder.record_at(USER, &fish_1(), &input, now).unwrap();

        let latest = recorded.fish.latest_sighting.unwrap();
        assert_eq!(latest, LatestSighting { latitude: 51.5, longitude: 5.4, timestamp: now });
        assert_eq!(recorded.sighting.depth, 10.0);
        assert_eq!(recorded.sighting.temperature, 18.0);
        assert_eq!(recorded.sighting.spotted_by.as_deref(), Some(USER));
        assert_eq!(store.load_sightings(USER), vec![recorded.sighting]);
    }

    #[test]
    fn snapshot_timestamp_never_goes_backwards() {
        let store = SightingStore::new(MemoryBackend::new());
        let recorder = SightingRecorder::new(&store);
        let fish = fish_1();
        let previous = fish.latest_sighting.clone().unwrap().timestamp;

        let earlier = previous - Duration::days(3);
        let recorded = recorder
            .record_at(USER, &fish, &SightingInput::from_values(1.0, 1.0, 1.0, 1.0), earlier)
            .unwrap();
        assert!(recorded.fish.latest_sighting.unwrap().timestamp >= previous);
        // The stored record keeps the time it was actually taken
        assert_eq!(recorded.sighting.timestamp, earlier);
        assert_eq!(store.load_sightings(USER)[0].timestamp, earlier);
    }

    #[test]
    fn append_keeps_readable_history_next_to_bad_entries() {
        let store = SightingStore::new(MemoryBackend::new());
        store
            .backend()
            .set_item(
                &Collection::SightingHistory.key(USER),
                r#"[{"id":"s1","fishId":"fish-1","timestamp":"2024-05-01T10:00:00Z","latitude":1.0,"longitude":2.0,"depth":3.0,"temperature":4.0},
                    {"id":"s2","fishId":"fish-1","timestamp":"2024-05-02T10:00:00Z","latitude":1.0,"longitude":2.0,"temperature":4.0}]"#,
            )
            .unwrap();

        let recorder = SightingRecorder::new(&store);
        let recorded = recorder
            .record(USER, &fish_1(), &SightingInput::from_values(51.5, 5.4, 10.0, 18.0))
            .unwrap();

        let ids: Vec<_> = store.load_sightings(USER).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s1".to_string(), recorded.sighting.id]);
    }

    #[test]
    fn out_of_range_latitude_leaves_history_unchanged() {
        let store = SightingStore::new(MemoryBackend::new());
        let recorder = SightingRecorder::new(&store);
        recorder.record(USER, &fish_1(), &SightingInput::from_values(10.0, 10.0, 5.0, 20.0)).unwrap();

        let err = recorder
            .record(USER, &fish_1(), &SightingInput::from_values(95.0, 5.4, 10.0, 18.0))
            .unwrap_err();
        assert!(matches!(err, FishTrackerError::Validation(ValidationError::LatitudeOutOfRange(_))));
        assert_eq!(store.load_sightings(USER).len(), 1);
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let input = SightingInput {
            depth: "deep".into(),
            ..SightingInput::from_values(1.0, 1.0, 0.0, 1.0)
        };
        assert_eq!(input.validate(), Err(ValidationError::NotANumber { field: "depth" }));

        let input = SightingInput {
            temperature: "NaN".into(),
            ..SightingInput::from_values(1.0, 1.0, 0.0, 1.0)
        };
        assert_eq!(input.validate(), Err(ValidationError::NotANumber { field: "temperature" }));
    }

    #[test]
    fn coordinate_bounds_are_inclusive() {
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert_eq!(validate_coordinates(0.0, 180.5), Err(ValidationError::LongitudeOutOfRange(180.5)));
    }

    #[test]
    fn ids_stay_unique_within_a_history() {
        let store = SightingStore::new(MemoryBackend::new());
        let recorder = SightingRecorder::new(&store);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let input = SightingInput::from_values(1.0, 1.0, 1.0, 1.0);
        let a = recorder.record_at(USER, &fish_1(), &input, now).unwrap();
        let b = recorder.record_at(USER, &fish_1(), &input, now).unwrap();
        assert_ne!(a.sighting.id, b.sighting.id);
        assert_eq!(store.load_sightings(USER).len(), 2);
    }

    #[test]
    fn accepts_png_photo() {
        let input = SightingInput::from_values(1.0, 1.0, 1.0, 1.0)
            .with_photo(format!("data:image/png;base64,{}", TINY_PNG), "reef.png");
        let valid = input.validate().unwrap();
        assert_eq!(valid.photo_name.as_deref(), Some("reef.png"));
    }

    #[test]
    fn rejects_bad_photos() {
        let gif = validate_photo("data:image/gif;base64,R0lGODlhAQABAAAAACw=");
        assert!(matches!(gif, Err(ValidationError::UnsupportedPhotoType(_))));

        let not_base64 = validate_photo("data:image/png;base64,@@@");
        assert!(matches!(not_base64, Err(ValidationError::InvalidPhotoData(_))));

        let plain_url = validate_photo("https://example.com/fish.png");
        assert!(matches!(plain_url, Err(ValidationError::InvalidPhotoData(_))));

        // Declared PNG, but the bytes are text
        let text = base64::engine::general_purpose::STANDARD.encode(b"hello world");
        let mislabeled = validate_photo(&format!("data:image/png;base64,{}", text));
        assert!(matches!(mislabeled, Err(ValidationError::InvalidPhotoData(_))));
    }

    #[test]
    fn rejects_oversized_photo() {
        let mut bytes = vec![0u8; MAX_PHOTO_BYTES + 1];
        bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let result = validate_photo(&format!("data:image/png;base64,{}", payload));
        assert!(matches!(result, Err(ValidationError::PhotoTooLarge { .. })));
    }

    #[test]
    fn photo_at_the_limit_is_accepted() {
        let mut bytes = vec![0u8; MAX_PHOTO_BYTES];
        bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
        assert!(validate_photo(&format!("data:image/png;base64,{}", payload)).is_ok());
    }

    #[test]
    fn oversized_payload_is_rejected_before_decoding() {
        // Not valid base64 at all, so only the length check can reject it
        let payload = "@".repeat((MAX_PHOTO_BYTES + 3) / 3 * 4 + 8);
        let result = validate_photo(&format!("data:image/png;base64,{}", payload));
        assert!(matches!(result, Err(ValidationError::PhotoTooLarge { .. })));
    }

    #[test]
    fn encodes_photo_file_bytes() {
        let bytes = base64::engine::general_purpose::STANDARD.decode(TINY_PNG).unwrap();
        let data_url = encode_photo(&bytes).unwrap();
        assert!(data_url.starts_with("data:image/png;base64,"));

        let err = encode_photo(b"not an image").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhotoData(_)));
    }

    #[test]
    fn input_accepts_numbers_or_strings() {
        let json = r#"{"latitude": 51.5, "longitude": "5.4", "depth": 10, "temperature": "18"}"#;
        let input: SightingInput = serde_json::from_str(json).unwrap();
        let valid = input.validate().unwrap();
        assert_eq!((valid.latitude, valid.longitude, valid.depth, valid.temperature), (51.5, 5.4, 10.0, 18.0));
    }
}
