//! Shared data models used across all platforms

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

/// Species rarity as reported by the fish API
///
/// Parsed case-insensitively. Values outside the known tiers are kept
/// verbatim so a round trip through local storage does not alter them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Other(String),
}

impl Rarity {
    /// Sort key, rarest first
    pub fn order(&self) -> u8 {
        match self {
            Rarity::Epic => 0,
            Rarity::Rare => 1,
            Rarity::Common => 2,
            Rarity::Other(_) => 3,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Rare => "RARE",
            Rarity::Epic => "EPIC",
            Rarity::Other(raw) => raw,
        }
    }
}

impl From<String> for Rarity {
    fn from(raw: String) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "COMMON" => Rarity::Common,
            "RARE" => Rarity::Rare,
            "EPIC" => Rarity::Epic,
            _ => Rarity::Other(raw),
        }
    }
}

impl From<&str> for Rarity {
    fn from(raw: &str) -> Self {
        Rarity::from(raw.to_string())
    }
}

impl From<Rarity> for String {
    fn from(rarity: Rarity) -> Self {
        match rarity {
            Rarity::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the most recent observation of a species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSighting {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// A species record, either from the fish API or created by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fish {
    pub id: String,
    pub name: String,
    /// URL or embedded data URL
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_sighting: Option<LatestSighting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Fish {
    /// Copy of this fish with `latest_sighting` replaced
    pub fn with_latest_sighting(&self, latest: LatestSighting) -> Fish {
        Fish {
            latest_sighting: Some(latest),
            ..self.clone()
        }
    }
}

/// An observation recorded by a user. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: String,
    /// Not enforced against the catalog
    pub fish_id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotted_by: Option<String>,
    /// Embedded image as a data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_name: Option<String>,
}

impl Sighting {
    pub fn snapshot(&self) -> LatestSighting {
        LatestSighting {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp,
        }
    }
}

/// Catalog view filter over the seen-set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeenFilter {
    #[default]
    All,
    Seen,
    Unseen,
}

impl SeenFilter {
    pub fn label(&self) -> &'static str {
        match self {
            SeenFilter::All => "ALL FISH",
            SeenFilter::Seen => "SPOTTED",
            SeenFilter::Unseen => "NOT SPOTTED",
        }
    }

    pub fn matches(&self, is_seen: bool) -> bool {
        match self {
            SeenFilter::All => true,
            SeenFilter::Seen => is_seen,
            SeenFilter::Unseen => !is_seen,
        }
    }
}

impl std::str::FromStr for SeenFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SeenFilter::All),
            "seen" => Ok(SeenFilter::Seen),
            "unseen" => Ok(SeenFilter::Unseen),
            other => Err(format!("unknown filter '{}' (expected all, seen or unseen)", other)),
        }
    }
}

/// Where a catalog entry was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FishOrigin {
    /// Fish API; never written back
    Remote,
    /// User's custom-fish collection
    Custom,
}
