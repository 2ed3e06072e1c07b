// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overpass API client for raw district boundary data.

use crate::geometry::Bounds;
use crate::models::OsmPayload;

/// Public Overpass endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Server-side query timeout (seconds).
const QUERY_TIMEOUT_SECS: u32 = 25;

/// Client for the map-data collaborator.
#[derive(Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every district candidate in `bounds`.
    pub async fn fetch(&self, bounds: &Bounds) -> Result<OsmPayload, FetchError> {
        let query = build_query(bounds);
        let body = format!("data={}", urlencoding::encode(&query));

        tracing::info!(
            endpoint = %self.endpoint,
            minlat = bounds.min_lat,
            minlon = bounds.min_lng,
            maxlat = bounds.max_lat,
            maxlon = bounds.max_lng,
            "Fetching districts"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            tracing::warn!("Overpass rate limit hit (429)");
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http(format!("HTTP {}: {}", status, body)));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        OsmPayload::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Overpass QL for administrative sub-areas, closed place ways and named place nodes.
pub fn build_query(b: &Bounds) -> String {
    let bbox = format!(
        "{:.6},{:.6},{:.6},{:.6}",
        b.min_lat, b.min_lng, b.max_lat, b.max_lng
    );
    format!(
        "[out:json][timeout:{timeout}];\
         (\
         relation[\"boundary\"=\"administrative\"][\"admin_level\"~\"^(9|10)$\"]({bbox});\
         way[\"place\"~\"^(suburb|neighbourhood|quarter)$\"]({bbox});\
         node[\"place\"~\"^(suburb|neighbourhood|quarter)$\"]({bbox});\
         );\
         out geom;",
        timeout = QUERY_TIMEOUT_SECS,
        bbox = bbox
    )
}

/// Errors from the map-data collaborator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Overpass request failed: {0}")]
    Request(String),

    #[error("Overpass rate limit exceeded")]
    RateLimited,

    #[error("Overpass error: {0}")]
    Http(String),

    #[error("Failed to decode Overpass response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_uses_south_west_north_east_order() {
        let q = build_query(&Bounds::new(52.5, 13.3, 52.6, 13.5));
        assert!(q.contains("(52.500000,13.300000,52.600000,13.500000)"));
        assert!(q.starts_with("[out:json]"));
        assert!(q.ends_with("out geom;"));
    }

    #[test]
    fn test_query_covers_all_element_kinds() {
        let q = build_query(&Bounds::new(0.0, 0.0, 1.0, 1.0));
        assert!(q.contains("relation[\"boundary\"=\"administrative\"]"));
        assert!(q.contains("way[\"place\"~"));
        assert!(q.contains("node[\"place\"~"));
    }
}
