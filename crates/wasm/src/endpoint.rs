//! Where the browser host sends its requests

/// Base URL of the fish API. A blank setting falls back to the page's own
/// origin.
pub fn fish_api_base(configured: &str, origin: &str) -> String {
    let configured = configured.trim();
    let base = if configured.is_empty() { origin } else { configured };
    base.trim_end_matches('/').to_string()
}

/// The description route is always served next to the page
pub fn description_url(origin: &str) -> String {
    format!("{}/api/generate-description", origin.trim_end_matches('/'))
}
