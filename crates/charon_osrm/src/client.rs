use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use charon_routing::GeoPoint;

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response contains no route")]
    NoRoute,
}

/// External routing service returning detailed walking geometry for a
/// single hop.
pub trait RouteProvider {
    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<Vec<GeoPoint>, OsrmError>;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OsrmProfile {
    /// Visitors are on foot; this is the only profile the wayfinder
    /// uses in production.
    #[default]
    Foot,
    Bike,
    Car,
}

impl OsrmProfile {
    fn as_str(self) -> &'static str {
        match self {
            OsrmProfile::Foot => "foot",
            OsrmProfile::Bike => "bike",
            OsrmProfile::Car => "car",
        }
    }
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    /// GeoJSON positions, [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const OSRM_ROUTE_API_PATH: &str = "/route/v1/";

pub struct OsrmClientParams {
    pub osrm_url: String,
    pub profile: OsrmProfile,
}

impl Default for OsrmClientParams {
    fn default() -> Self {
        OsrmClientParams {
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            profile: OsrmProfile::default(),
        }
    }
}

pub struct OsrmClient {
    params: OsrmClientParams,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(params: OsrmClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }
}

impl RouteProvider for OsrmClient {
    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<Vec<GeoPoint>, OsrmError> {
        let mut url = self.params.osrm_url.clone();
        url.push_str(OSRM_ROUTE_API_PATH);
        url.push_str(self.params.profile.as_str());
        url.push_str(&format!(
            "/{},{};{},{}",
            from.lng, from.lat, to.lng, to.lat
        ));

        let response = self
            .client
            .get(url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "false"),
                ("continue_straight", "true"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: RouteResponse = response.json().await?;
        let route = parsed.routes.into_iter().next().ok_or(OsrmError::NoRoute)?;

        debug!(distance = route.distance, "Fetched OSRM leg");

        Ok(route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| GeoPoint::new(lat, lng))
            .collect())
    }
}
