//! Fire-and-forget audit trail for the sqlite-backed deployment.
//!
//! One `user_activity` row per answered request: requester name, email, IP and
//! a best-effort city/country derived from the IP. Nothing here may affect the
//! response - every failure is logged and swallowed.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ActivityRecord, RequesterContext};
use crate::store::SqliteStore;

// ip-api.com style collaborator: GET {base}/{ip} -> {"city": ..., "country": ...}
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Resolve an IP to "City, Country". `None` on any failure; the caller
    /// defaults to "Unknown".
    pub async fn lookup(&self, ip: &str) -> Option<String> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ip);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("geolocation lookup failed: {e}");
                return None;
            }
        };
        let body: Value = response.json().await.ok()?;
        location_from_json(&body)
    }
}

fn location_from_json(body: &Value) -> Option<String> {
    let city = body["city"].as_str().filter(|s| !s.is_empty());
    let country = body["country"].as_str().filter(|s| !s.is_empty());
    match (city, country) {
        (Some(city), Some(country)) => Some(format!("{city}, {country}")),
        (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
        (None, None) => None,
    }
}

pub struct ActivityLogger {
    store: Arc<SqliteStore>,
    geo: GeoClient,
}

impl ActivityLogger {
    pub fn new(store: Arc<SqliteStore>, geo: GeoClient) -> Self {
        Self { store, geo }
    }

    /// Record one request. Best-effort: a failed geo lookup degrades to
    /// "Unknown", a failed insert is logged and dropped.
    pub async fn record(&self, ctx: RequesterContext, question: String) {
        let location = self.geo.lookup(&ctx.ip).await;
        let record = ActivityRecord::new(ctx, location, question);
        if let Err(e) = self.store.log_activity(record).await {
            warn!("failed to write activity record: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_from_city_and_country() {
        let body = json!({"city": "London", "country": "United Kingdom"});
        assert_eq!(
            location_from_json(&body).as_deref(),
            Some("London, United Kingdom")
        );
    }

    #[test]
    fn test_location_from_country_only() {
        let body = json!({"country": "France"});
        assert_eq!(location_from_json(&body).as_deref(), Some("France"));
    }

    #[test]
    fn test_location_none_when_fields_missing() {
        assert!(location_from_json(&json!({"status": "fail"})).is_none());
        assert!(location_from_json(&json!({"city": "", "country": ""})).is_none());
    }

    #[tokio::test]
    async fn test_lookup_returns_none_when_service_unreachable() {
        // nothing listens on this port
        let geo = GeoClient::new("http://127.0.0.1:1/json".to_string());
        assert!(geo.lookup("8.8.8.8").await.is_none());
    }
}
