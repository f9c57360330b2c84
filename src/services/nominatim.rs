//! Nominatim adapters - forward and reverse geocoding

use async_trait::async_trait;
use serde_json::{Value, json};

use super::http::{ServiceClient, coordinate};
use crate::tools::{AdapterError, BoundArgs, ToolHandler};

/// `osm_geocode`: free-text place or address to coordinates
pub struct GeocodeTool {
    client: ServiceClient,
    base_url: String,
}

impl GeocodeTool {
    pub fn new(client: ServiceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for GeocodeTool {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
        let query = args.str("query")?.trim();
        if query.is_empty() {
            return Err(AdapterError::InvalidInput("query must not be empty".to_string()));
        }
        let limit = args.i64("limit")?;

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let body = self
            .client
            .get_json(
                &url,
                &[
                    ("q", query.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        parse_search(&body, query)
    }
}

/// `osm_reverse_geocode`: coordinates to the nearest address
pub struct ReverseGeocodeTool {
    client: ServiceClient,
    base_url: String,
}

impl ReverseGeocodeTool {
    pub fn new(client: ServiceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for ReverseGeocodeTool {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
        let lat = args.f64("lat")?;
        let lon = args.f64("lon")?;
        let zoom = args.i64("zoom")?;

        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let body = self
            .client
            .get_json(
                &url,
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("zoom", zoom.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;

        parse_reverse(&body)
    }
}

/// Reduce a `/search` response to the fields worth explaining
pub fn parse_search(body: &Value, query: &str) -> Result<Value, AdapterError> {
    let places = body
        .as_array()
        .ok_or_else(|| AdapterError::Malformed("expected an array from /search".to_string()))?;

    if places.is_empty() {
        return Err(AdapterError::EmptyResult(format!("no places found for '{}'", query)));
    }

    Ok(Value::Array(places.iter().map(place_summary).collect()))
}

/// Reduce a `/reverse` response; Nominatim reports misses as `{"error": ...}`
pub fn parse_reverse(body: &Value) -> Result<Value, AdapterError> {
    if let Some(error) = body.get("error") {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(AdapterError::EmptyResult(message));
    }

    let display_name = body
        .get("display_name")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Malformed("missing display_name".to_string()))?;

    Ok(json!({
        "display_name": display_name,
        "lat": coordinate(&body["lat"]),
        "lon": coordinate(&body["lon"]),
        "address": body.get("address").cloned().unwrap_or_else(|| json!({})),
    }))
}

fn place_summary(place: &Value) -> Value {
    json!({
        "display_name": place["display_name"],
        "lat": coordinate(&place["lat"]),
        "lon": coordinate(&place["lon"]),
        "category": place.get("category").or_else(|| place.get("class")).cloned().unwrap_or(Value::Null),
        "type": place["type"],
        "importance": place["importance"],
    })
}
