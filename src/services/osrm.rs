//! OSRM adapters - routing and road snapping

use async_trait::async_trait;
use serde_json::{Value, json};

use super::http::{ServiceClient, coordinate};
use crate::tools::{AdapterError, BoundArgs, ToolHandler};

/// `osrm_route_driving` / `osrm_route_cycling`: fastest route between two points
pub struct RouteTool {
    client: ServiceClient,
    base_url: String,
    profile: &'static str,
}

impl RouteTool {
    pub fn driving(client: ServiceClient, base_url: impl Into<String>) -> Self {
        Self::new(client, base_url, "driving")
    }

    pub fn cycling(client: ServiceClient, base_url: impl Into<String>) -> Self {
        Self::new(client, base_url, "bike")
    }

    fn new(client: ServiceClient, base_url: impl Into<String>, profile: &'static str) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            profile,
        }
    }

    pub fn profile(&self) -> &str {
        self.profile
    }

    fn url(&self, start: (f64, f64), end: (f64, f64)) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            self.profile,
            start.1,
            start.0,
            end.1,
            end.0
        )
    }
}

#[async_trait]
impl ToolHandler for RouteTool {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
        let start = (args.f64("start_lat")?, args.f64("start_lon")?);
        let end = (args.f64("end_lat")?, args.f64("end_lon")?);

        let body = self
            .client
            .get_json(
                &self.url(start, end),
                &[
                    ("overview", "simplified".to_string()),
                    ("geometries", "geojson".to_string()),
                    ("steps", "false".to_string()),
                    ("alternatives", "false".to_string()),
                ],
            )
            .await?;

        parse_route(&body)
    }
}

/// `osrm_nearest_road`: snap a coordinate onto the road network
pub struct NearestRoadTool {
    client: ServiceClient,
    base_url: String,
}

impl NearestRoadTool {
    pub fn new(client: ServiceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for NearestRoadTool {
    async fn call(&self, args: &BoundArgs) -> Result<Value, AdapterError> {
        let lat = args.f64("lat")?;
        let lon = args.f64("lon")?;
        let profile = args.str("profile")?;

        let url = format!(
            "{}/nearest/v1/{}/{},{}",
            self.base_url.trim_end_matches('/'),
            profile,
            lon,
            lat
        );
        let body = self.client.get_json(&url, &[("number", "1".to_string())]).await?;

        parse_nearest(&body)
    }
}

fn check_code(body: &Value) -> Result<(), AdapterError> {
    match body.get("code").and_then(Value::as_str) {
        Some("Ok") => Ok(()),
        Some(code) => {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("no message");
            Err(AdapterError::EmptyResult(format!("OSRM returned {}: {}", code, message)))
        }
        None => Err(AdapterError::Malformed("missing code field".to_string())),
    }
}

/// Reduce a `/route` response to distance, duration and geometry
pub fn parse_route(body: &Value) -> Result<Value, AdapterError> {
    check_code(body)?;

    let route = body
        .get("routes")
        .and_then(Value::as_array)
        .and_then(|routes| routes.first())
        .ok_or_else(|| AdapterError::EmptyResult("no route found".to_string()))?;

    let distance = route
        .get("distance")
        .and_then(Value::as_f64)
        .ok_or_else(|| AdapterError::Malformed("route has no distance".to_string()))?;
    let duration = route
        .get("duration")
        .and_then(Value::as_f64)
        .ok_or_else(|| AdapterError::Malformed("route has no duration".to_string()))?;

    let summary = route
        .get("legs")
        .and_then(Value::as_array)
        .map(|legs| {
            legs.iter()
                .filter_map(|leg| leg.get("summary").and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();

    Ok(json!({
        "distance_km": round2(distance / 1000.0),
        "duration_min": round2(duration / 60.0),
        "summary": summary,
        "geometry": route.get("geometry").cloned().unwrap_or(Value::Null),
    }))
}

/// Reduce a `/nearest` response to the snapped point
pub fn parse_nearest(body: &Value) -> Result<Value, AdapterError> {
    check_code(body)?;

    let waypoint = body
        .get("waypoints")
        .and_then(Value::as_array)
        .and_then(|w| w.first())
        .ok_or_else(|| AdapterError::EmptyResult("no road found near the point".to_string()))?;

    // OSRM locations are [lon, lat]
    let location = waypoint
        .get("location")
        .and_then(Value::as_array)
        .filter(|loc| loc.len() == 2)
        .ok_or_else(|| AdapterError::Malformed("waypoint has no location".to_string()))?;
    let lon = coordinate(&location[0]).ok_or_else(|| AdapterError::Malformed("bad longitude".to_string()))?;
    let lat = coordinate(&location[1]).ok_or_else(|| AdapterError::Malformed("bad latitude".to_string()))?;

    Ok(json!({
        "snapped_lat": lat,
        "snapped_lon": lon,
        "distance_m": waypoint.get("distance").and_then(Value::as_f64),
        "road_name": waypoint.get("name").and_then(Value::as_str).unwrap_or(""),
    }))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
