//! HTTP client for the fish API and description endpoint
//!
//! Uses gloo-net for browser fetch API

use async_trait::async_trait;
use fishtracker_core::{
    AsyncDescriptionSource, AsyncFishSource, DescriptionRequest, DescriptionResponse, Fish,
    FishDetailResponse, FishTrackerError, Result,
};
use gloo_net::http::{Request, Response};

use crate::endpoint;

fn page_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

fn network_err(e: gloo_net::Error) -> FishTrackerError {
    FishTrackerError::Network(e.to_string())
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await.map_err(network_err)?;
    Ok(serde_json::from_str(&text)?)
}

pub struct HttpFishSource {
    base_url: String,
}

impl HttpFishSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `api_base_url`, or the page origin when it is blank
    pub fn for_page(api_base_url: &str) -> Self {
        Self::new(endpoint::fish_api_base(api_base_url, &page_origin()))
    }
}

#[async_trait(?Send)]
impl AsyncFishSource for HttpFishSource {
    async fn fetch_fishes(&self) -> Result<Vec<Fish>> {
        let url = format!("{}/api/fish", self.base_url);
        let response = Request::get(&url).send().await.map_err(network_err)?;
        if !response.ok() {
            return Err(FishTrackerError::Network(format!("{} returned {}", url, response.status())));
        }
        read_json(response).await
    }

    async fn fetch_fish(&self, id: &str) -> Result<Fish> {
        let url = format!("{}/api/fish/{}", self.base_url, String::from(js_sys::encode_uri_component(id)));
        let response = Request::get(&url).send().await.map_err(network_err)?;
        match response.status() {
            404 => return Err(FishTrackerError::NotFound(id.to_string())),
            status if !response.ok() => {
                return Err(FishTrackerError::Network(format!("{} returned {}", url, status)));
            }
            _ => {}
        }
        let detail: FishDetailResponse = read_json(response).await?;
        Ok(detail.into_fish())
    }
}

pub struct HttpDescriptionSource {
    url: String,
}

impl HttpDescriptionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_origin() -> Self {
        Self::new(endpoint::description_url(&page_origin()))
    }
}

#[async_trait(?Send)]
impl AsyncDescriptionSource for HttpDescriptionSource {
    async fn generate_description(&self, name: &str) -> Result<String> {
        let body = DescriptionRequest { name: name.to_string() };
        let response = Request::post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body)
            .map_err(network_err)?
            .send()
            .await
            .map_err(network_err)?;

        let ok = response.ok();
        let status = response.status();
        let parsed: DescriptionResponse = read_json(response)
            .await
            .map_err(|_| FishTrackerError::Network(format!("{} returned {}", self.url, status)))?;
        if !ok && parsed.error.is_none() {
            return Err(FishTrackerError::Network(format!("{} returned {}", self.url, status)));
        }
        parsed.into_result().map_err(FishTrackerError::Network)
    }
}
