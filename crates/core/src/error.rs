//! Error types for FishTracker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FishTrackerError {
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Network error: {0}")]
    Network(String),
    
    #[error("Fish not found: {0}")]
    NotFound(String),
    
    #[error(transparent)]
    Validation(#[from] ValidationError),
    
    #[error("Storage error: {0}")]
    Storage(String),
    
    #[error("Stored data could not be parsed: {0}")]
    StorageParse(String),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Rejected user input. The write that carried it never happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a valid number")]
    NotANumber { field: &'static str },
    
    #[error("Latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    
    #[error("Longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
    
    #[error("Fish name is required")]
    MissingName,
    
    #[error("Unsupported image type: {0} (expected JPEG, PNG or WebP)")]
    UnsupportedPhotoType(String),
    
    #[error("Image is {size} bytes, the limit is {limit} bytes")]
    PhotoTooLarge { size: usize, limit: usize },
    
    #[error("Image data is not valid: {0}")]
    InvalidPhotoData(String),
}

impl From<serde_json::Error> for FishTrackerError {
    fn from(e: serde_json::Error) -> Self {
        FishTrackerError::InvalidData(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FishTrackerError>;
