//! Overpass adapter - points of interest around a coordinate

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::http::{ServiceClient, coordinate};
use crate::tools::{AdapterError, BoundArgs, ToolHandler};

/// Server-side timeout in seconds passed in the query header
const QUERY_TIMEOUT_SECS: u32 = 25;

/// `osm_search_poi`: OSM features tagged `key=value` within a radius
pub struct PoiSearchTool {
    client: ServiceClient,
    url: String,
}

impl PoiSearchTool {
    pub fn new(client: ServiceClient, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl ToolHandler for PoiSearchTool {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
        let lat = args.f64("lat")?;
        let lon = args.f64("lon")?;
        let radius = args.i64("radius_m")?;
        let key = args.str("key")?;
        let value = args.str("value")?;
        let limit = args.i64("limit")?;

        let query = build_query(lat, lon, radius, key, value, limit)?;
        let body = self.client.get_json(&self.url, &[("data", query)]).await?;

        parse_elements(&body)
    }
}

/// Build an Overpass QL query for nodes, ways and relations around a point
pub fn build_query(lat: f64, lon: f64, radius: i64, key: &str, value: &str, limit: i64) -> Result<String, AdapterError> {
    let key = tag_part("key", key)?;
    let value = tag_part("value", value)?;

    let filter = format!("[\"{}\"=\"{}\"](around:{},{},{})", key, value, radius, lat, lon);
    Ok(format!(
        "[out:json][timeout:{}];(node{f};way{f};relation{f};);out center {};",
        QUERY_TIMEOUT_SECS,
        limit,
        f = filter
    ))
}

fn tag_part<'a>(name: &str, text: &'a str) -> Result<&'a str, AdapterError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AdapterError::InvalidInput(format!("{} must not be empty", name)));
    }
    if text.contains(['"', '\\']) {
        return Err(AdapterError::InvalidInput(format!("{} contains a quote or backslash", name)));
    }
    Ok(text)
}

/// Reduce an Overpass `elements` array to POI summaries
pub fn parse_elements(body: &Value) -> Result<Value, AdapterError> {
    let elements = body
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| AdapterError::Malformed("missing elements array".to_string()))?;

    let pois: Vec<Value> = elements.iter().filter_map(poi_summary).collect();
    Ok(json!({
        "count": pois.len(),
        "pois": pois,
    }))
}

fn poi_summary(element: &Value) -> Option<Value> {
    // Ways and relations only carry a position through `out center`
    let position = if element.get("lat").is_some() {
        element
    } else {
        element.get("center")?
    };
    let lat = coordinate(&position["lat"])?;
    let lon = coordinate(&position["lon"])?;

    let tags = element
        .get("tags")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    let name = tags.get("name").cloned().unwrap_or(Value::Null);

    Some(json!({
        "id": element["id"],
        "osm_type": element["type"],
        "name": name,
        "lat": lat,
        "lon": lon,
        "tags": tags,
    }))
}
