//! The standard geospatial tool catalog
//!
//! Descriptors are plain functions so tests can build registries with stub
//! handlers behind the real names and parameter schemas.

use std::sync::Arc;

use log::info;

use super::definition::{ParamKind, ParamSpec, ToolDescriptor};
use super::error::AdapterError;
use super::registry::ToolRegistry;
use crate::config::ServicesConfig;
use crate::services::{GeocodeTool, NearestRoadTool, PoiSearchTool, ReverseGeocodeTool, RouteTool, ServiceClient};

pub const OSM_GEOCODE: &str = "osm_geocode";
pub const OSM_REVERSE_GEOCODE: &str = "osm_reverse_geocode";
pub const OSM_SEARCH_POI: &str = "osm_search_poi";
pub const OSRM_ROUTE_DRIVING: &str = "osrm_route_driving";
pub const OSRM_ROUTE_CYCLING: &str = "osrm_route_cycling";
pub const OSRM_NEAREST_ROAD: &str = "osrm_nearest_road";

fn lat(name: &str, description: &str) -> ParamSpec {
    ParamSpec::required(name, ParamKind::Number, description).with_range(-90.0, 90.0)
}

fn lon(name: &str, description: &str) -> ParamSpec {
    ParamSpec::required(name, ParamKind::Number, description).with_range(-180.0, 180.0)
}

pub fn geocode() -> ToolDescriptor {
    ToolDescriptor::new(
        OSM_GEOCODE,
        "Forward geocoding with OpenStreetMap Nominatim: turn a place name or address into coordinates.",
    )
    .param(ParamSpec::required(
        "query",
        ParamKind::String,
        "Place name or address, e.g. 'Eiffel Tower, Paris'",
    ))
    .param(ParamSpec::optional("limit", ParamKind::Integer, 5, "Maximum number of results").with_clamp(1.0, 10.0))
}

pub fn reverse_geocode() -> ToolDescriptor {
    ToolDescriptor::new(
        OSM_REVERSE_GEOCODE,
        "Reverse geocoding with OpenStreetMap Nominatim: turn coordinates into the nearest address.",
    )
    .param(lat("lat", "Latitude in decimal degrees"))
    .param(lon("lon", "Longitude in decimal degrees"))
    .param(
        ParamSpec::optional("zoom", ParamKind::Integer, 18, "Detail level, 3 (country) to 18 (building)")
            .with_clamp(3.0, 18.0),
    )
}

pub fn search_poi() -> ToolDescriptor {
    ToolDescriptor::new(
        OSM_SEARCH_POI,
        "Search OpenStreetMap points of interest (restaurants, cafes, parks...) around a coordinate via Overpass.",
    )
    .param(lat("lat", "Latitude of the search centre"))
    .param(lon("lon", "Longitude of the search centre"))
    .param(ParamSpec::optional("radius_m", ParamKind::Integer, 500, "Search radius in metres").with_clamp(50.0, 5000.0))
    .param(ParamSpec::optional("key", ParamKind::String, "amenity", "OSM tag key, e.g. 'amenity' or 'tourism'"))
    .param(ParamSpec::optional(
        "value",
        ParamKind::String,
        "restaurant",
        "OSM tag value, e.g. 'restaurant', 'cafe', 'museum'",
    ))
    .param(ParamSpec::optional("limit", ParamKind::Integer, 20, "Maximum number of POIs").with_clamp(1.0, 50.0))
}

fn route(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description)
        .param(lat("start_lat", "Start latitude"))
        .param(lon("start_lon", "Start longitude"))
        .param(lat("end_lat", "Destination latitude"))
        .param(lon("end_lon", "Destination longitude"))
}

pub fn route_driving() -> ToolDescriptor {
    route(
        OSRM_ROUTE_DRIVING,
        "Driving route between two coordinates using OSRM: distance, duration and geometry.",
    )
}

pub fn route_cycling() -> ToolDescriptor {
    route(
        OSRM_ROUTE_CYCLING,
        "Cycling route between two coordinates using OSRM: distance, duration and geometry.",
    )
}

pub fn nearest_road() -> ToolDescriptor {
    ToolDescriptor::new(
        OSRM_NEAREST_ROAD,
        "Snap a coordinate to the nearest road using OSRM and report the road name and snapping distance.",
    )
    .param(lat("lat", "Latitude of the point"))
    .param(lon("lon", "Longitude of the point"))
    .param(
        ParamSpec::optional("profile", ParamKind::String, "driving", "Routing profile").one_of(&["driving", "bike", "foot"]),
    )
}

/// Every descriptor in catalog order
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        geocode(),
        reverse_geocode(),
        search_poi(),
        route_driving(),
        route_cycling(),
        nearest_road(),
    ]
}

/// Registry wired to the live map services
pub fn standard_registry(services: &ServicesConfig) -> Result<ToolRegistry, AdapterError> {
    let client = ServiceClient::new(&services.user_agent, services.timeout())?;

    let registry = ToolRegistry::new()
        .with_default_timeout(services.timeout())
        .with_tool(geocode(), Arc::new(GeocodeTool::new(client.clone(), &services.nominatim_url)))
        .with_tool(
            reverse_geocode(),
            Arc::new(ReverseGeocodeTool::new(client.clone(), &services.nominatim_url)),
        )
        .with_tool(search_poi(), Arc::new(PoiSearchTool::new(client.clone(), &services.overpass_url)))
        .with_tool(route_driving(), Arc::new(RouteTool::driving(client.clone(), &services.osrm_url)))
        .with_tool(route_cycling(), Arc::new(RouteTool::cycling(client.clone(), &services.osrm_url)))
        .with_tool(nearest_road(), Arc::new(NearestRoadTool::new(client, &services.osrm_url)));

    info!("Registered {} map tools", registry.len());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::args::bind;
    use serde_json::json;

    #[test]
    fn test_catalog_names_are_unique() {
        let descriptors = descriptors();
        let mut names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn test_standard_registry() {
        let registry = standard_registry(&ServicesConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                OSM_GEOCODE,
                OSM_REVERSE_GEOCODE,
                OSM_SEARCH_POI,
                OSRM_ROUTE_DRIVING,
                OSRM_ROUTE_CYCLING,
                OSRM_NEAREST_ROAD
            ]
        );
    }

    #[test]
    fn test_geocode_limit_defaults_and_clamps() {
        let bound = bind(&geocode(), &json!({"query": "Eiffel Tower"})).unwrap();
        assert_eq!(bound.i64("limit").unwrap(), 5);

        let bound = bind(&geocode(), &json!({"query": "Eiffel Tower", "limit": 99})).unwrap();
        assert_eq!(bound.i64("limit").unwrap(), 10);
    }

    #[test]
    fn test_reverse_geocode_rejects_out_of_range_latitude() {
        assert!(bind(&reverse_geocode(), &json!({"lat": 123.0, "lon": 2.0})).is_err());
        assert!(bind(&reverse_geocode(), &json!({"lat": "48.85", "lon": "2.29"})).is_ok());
    }

    #[test]
    fn test_poi_defaults() {
        let bound = bind(&search_poi(), &json!({"lat": 48.85, "lon": 2.29})).unwrap();
        assert_eq!(bound.str("key").unwrap(), "amenity");
        assert_eq!(bound.str("value").unwrap(), "restaurant");
        assert_eq!(bound.i64("radius_m").unwrap(), 500);
        assert_eq!(bound.i64("limit").unwrap(), 20);
    }

    #[test]
    fn test_route_requires_both_ends() {
        let err = bind(&route_cycling(), &json!({"start_lat": 52.5, "start_lon": 13.4, "end_lat": 52.52})).unwrap_err();
        assert!(err.to_string().contains("end_lon"));
    }

    #[test]
    fn test_nearest_road_profile_normalized() {
        let bound = bind(&nearest_road(), &json!({"lat": 52.5, "lon": 13.4, "profile": "BIKE"})).unwrap();
        assert_eq!(bound.str("profile").unwrap(), "bike");
        assert!(bind(&nearest_road(), &json!({"lat": 52.5, "lon": 13.4, "profile": "boat"})).is_err());
    }

    #[test]
    fn test_prompt_entry_lists_params() {
        let entry = search_poi().prompt_entry();
        assert!(entry.starts_with("- osm_search_poi:"));
        assert!(entry.contains("radius_m: integer (optional, default=500)"));
    }
}
