//! Blocking HTTP clients for the fish API and the description endpoint

use fishtracker_core::{
    DescriptionRequest, DescriptionResponse, DescriptionSource, Fish, FishDetailResponse,
    FishSource, FishTrackerError, Result,
};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(network_err)
}

fn network_err(e: reqwest::Error) -> FishTrackerError {
    FishTrackerError::Network(e.to_string())
}

// ============================================================================
// Fish API
// ============================================================================

pub struct FishApiClient {
    client: Client,
    base_url: String,
}

impl FishApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url)
    }

    fn fishes_url(&self) -> String {
        format!("{}/api/fish", self.base_url)
    }

    fn fish_url(&self, id: &str) -> String {
        format!("{}/{}", self.fishes_url(), urlencoding::encode(id))
    }

    fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(network_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FishTrackerError::Network(format!("{} returned {}", url, status)));
        }
        Ok(response)
    }
}

impl FishSource for FishApiClient {
    fn fetch_fishes(&self) -> Result<Vec<Fish>> {
        let body = self.get(&self.fishes_url())?.text().map_err(network_err)?;
        let fishes: Vec<Fish> = serde_json::from_str(&body)?;
        tracing::info!("Fetched {} fish", fishes.len());
        Ok(fishes)
    }

    fn fetch_fish(&self, id: &str) -> Result<Fish> {
        let url = self.fish_url(id);
        let response = self.client.get(&url).send().map_err(network_err)?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(FishTrackerError::NotFound(id.to_string())),
            status if !status.is_success() => {
                return Err(FishTrackerError::Network(format!("{} returned {}", url, status)));
            }
            _ => {}
        }
        let body = response.text().map_err(network_err)?;
        let detail: FishDetailResponse = serde_json::from_str(&body)?;
        Ok(detail.into_fish())
    }
}

// ============================================================================
// Description endpoint
// ============================================================================

pub struct DescriptionClient {
    client: Client,
    url: String,
}

impl DescriptionClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.description_url)
    }
}

impl DescriptionSource for DescriptionClient {
    fn generate_description(&self, name: &str) -> Result<String> {
        let request = DescriptionRequest { name: name.to_string() };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(network_err)?;

        let status = response.status();
        let body = response.text().map_err(network_err)?;
        // Error responses usually carry `{ "error": ... }`
        let parsed: DescriptionResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(FishTrackerError::Network(format!("{} returned {}", self.url, status)));
            }
            Err(e) => return Err(e.into()),
        };
        if !status.is_success() && parsed.error.is_none() {
            return Err(FishTrackerError::Network(format!("{} returned {}", self.url, status)));
        }
        parsed.into_result().map_err(FishTrackerError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishtracker_core::{load_detail, Rarity, DESCRIPTION_PLACEHOLDER};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve a single canned response and hand back the raw request line and body
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            (request_line.trim().to_string(), String::from_utf8(request_body).unwrap())
        });

        (base_url, handle)
    }

    #[test]
    fn fetches_fish_list() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id":"fish-1","name":"Blue Tang","image":"tang.png","rarity":"RARE"},
                {"id":"fish-2","name":"Grouper","image":"g.png","rarity":"COMMON"}]"#,
        );
        let fishes = FishApiClient::new(format!("{}/", base)).unwrap().fetch_fishes().unwrap();
        assert_eq!(fishes.len(), 2);
        assert_eq!(fishes[0].rarity, Rarity::Rare);
        assert_eq!(server.join().unwrap().0, "GET /api/fish HTTP/1.1");
    }

    #[test]
    fn server_error_is_network_error() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
        let err = FishApiClient::new(base).unwrap().fetch_fishes().unwrap_err();
        assert!(matches!(err, FishTrackerError::Network(_)));
        server.join().unwrap();
    }

    #[test]
    fn unreachable_api_is_network_error() {
        // Bind then drop so the port is very likely closed
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = FishApiClient::new(format!("http://127.0.0.1:{}", port))
            .unwrap()
            .fetch_fishes()
            .unwrap_err();
        assert!(matches!(err, FishTrackerError::Network(_)));
    }

    #[test]
    fn detail_uses_newest_embedded_sighting() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"id":"fish 1","name":"Blue Tang","image":"","rarity":"EPIC","sightings":[
                {"timestamp":"2024-05-01T10:00:00Z","latitude":1.0,"longitude":2.0},
                {"timestamp":"2024-06-01T10:00:00Z","latitude":3.0,"longitude":4.0}]}"#,
        );
        let fish = FishApiClient::new(base).unwrap().fetch_fish("fish 1").unwrap();
        assert_eq!(fish.latest_sighting.unwrap().latitude, 3.0);
        assert_eq!(server.join().unwrap().0, "GET /api/fish/fish%201 HTTP/1.1");
    }

    #[test]
    fn missing_fish_is_not_found() {
        let (base, server) = serve_once("404 Not Found", r#"{"error":"Fish not found"}"#);
        let err = FishApiClient::new(base).unwrap().fetch_fish("ghost").unwrap_err();
        assert!(matches!(err, FishTrackerError::NotFound(id) if id == "ghost"));
        server.join().unwrap();
    }

    #[test]
    fn posts_name_for_description() {
        let (base, server) = serve_once("200 OK", r#"{"description":"A vivid reef fish."}"#);
        let client = DescriptionClient::new(format!("{}/api/generate-description", base)).unwrap();
        assert_eq!(client.generate_description("Blue Tang").unwrap(), "A vivid reef fish.");

        let (request_line, body) = server.join().unwrap();
        assert_eq!(request_line, "POST /api/generate-description HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["name"], "Blue Tang");
    }

    #[test]
    fn description_error_body_is_reported() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"model unavailable"}"#);
        let client = DescriptionClient::new(base).unwrap();
        let err = client.generate_description("Blue Tang").unwrap_err();
        assert!(matches!(err, FishTrackerError::Network(msg) if msg == "model unavailable"));
        server.join().unwrap();
    }

    #[test]
    fn detail_falls_back_to_placeholder() {
        let (api_base, api) = serve_once("200 OK", r#"{"id":"fish-1","name":"Blue Tang","rarity":"RARE"}"#);
        let (desc_base, desc) = serve_once("500 Internal Server Error", "oops");
        let fish = load_detail(
            &FishApiClient::new(api_base).unwrap(),
            &DescriptionClient::new(desc_base).unwrap(),
            "fish-1",
        )
        .unwrap();
        assert_eq!(fish.description.as_deref(), Some(DESCRIPTION_PLACEHOLDER));
        api.join().unwrap();
        desc.join().unwrap();
    }
}
