//! Map-service adapters
//!
//! Thin clients for the public OpenStreetMap ecosystem: Nominatim for
//! geocoding, Overpass for POI search and OSRM for routing. Each adapter
//! implements `ToolHandler` and returns a trimmed JSON payload.

mod http;
mod nominatim;
mod osrm;
mod overpass;

pub use http::ServiceClient;
pub use nominatim::{GeocodeTool, ReverseGeocodeTool, parse_reverse, parse_search};
pub use osrm::{NearestRoadTool, RouteTool, parse_nearest, parse_route};
pub use overpass::{PoiSearchTool, build_query, parse_elements};
