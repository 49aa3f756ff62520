//! Remote collaborators: the fish API and the description endpoint
//!
//! Hosts provide implementations (blocking reqwest on desktop, browser
//! fetch in WASM). Failures are reported once; nothing here retries.

use crate::error::Result;
use crate::messages::DESCRIPTION_PLACEHOLDER;
use crate::models::Fish;

/// `GET /api/fish` and `GET /api/fish/{id}`
pub trait FishSource {
    fn fetch_fishes(&self) -> Result<Vec<Fish>>;

    /// Single fish, with `latest_sighting` derived from its embedded
    /// sightings when the API returns them
    fn fetch_fish(&self, id: &str) -> Result<Fish>;
}

/// `POST /api/generate-description`
pub trait DescriptionSource {
    fn generate_description(&self, name: &str) -> Result<String>;
}

/// Fetch a fish and attach a generated description.
///
/// A failed description degrades to [`DESCRIPTION_PLACEHOLDER`]; only a
/// failed fish fetch is an error.
pub fn load_detail<S, D>(source: &S, descriptions: &D, id: &str) -> Result<Fish>
where
    S: FishSource + ?Sized,
    D: DescriptionSource + ?Sized,
{
    let mut fish = source.fetch_fish(id)?;
    fish.description = Some(describe_or_placeholder(descriptions.generate_description(&fish.name), &fish.name));
    Ok(fish)
}

fn describe_or_placeholder(result: Result<String>, name: &str) -> String {
    match result {
        Ok(description) => description,
        Err(e) => {
            tracing::warn!(fish = %name, "Description unavailable: {}", e);
            DESCRIPTION_PLACEHOLDER.to_string()
        }
    }
}

#[cfg(feature = "async")]
mod async_source {
    use super::*;
    use async_trait::async_trait;

    /// Browser counterpart of [`FishSource`]
    #[async_trait(?Send)]
    pub trait AsyncFishSource {
        async fn fetch_fishes(&self) -> Result<Vec<Fish>>;
        async fn fetch_fish(&self, id: &str) -> Result<Fish>;
    }

    /// Browser counterpart of [`DescriptionSource`]
    #[async_trait(?Send)]
    pub trait AsyncDescriptionSource {
        async fn generate_description(&self, name: &str) -> Result<String>;
    }

    pub async fn load_detail_async<S, D>(source: &S, descriptions: &D, id: &str) -> Result<Fish>
    where
        S: AsyncFishSource + ?Sized,
        D: AsyncDescriptionSource + ?Sized,
    {
        let mut fish = source.fetch_fish(id).await?;
        let description = descriptions.generate_description(&fish.name).await;
        fish.description = Some(describe_or_placeholder(description, &fish.name));
        Ok(fish)
    }
}

#[cfg(feature = "async")]
pub use async_source::*;
