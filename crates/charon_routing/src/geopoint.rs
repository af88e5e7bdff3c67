use serde::{Deserialize, Serialize};

const EARTH_RADIUS: f64 = 6_371_000.0;

/// WGS84 coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }

    /// Great-circle distance to `other` in meters.
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }
}

/// Graph vertex identifier: a coordinate quantized to 1e-6 degrees
/// (~0.11 m). Coordinates that round to the same fixed-point pair
/// collapse to one node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    lat_e6: i64,
    lng_e6: i64,
}

impl NodeId {
    pub fn from_point(point: &GeoPoint) -> Self {
        NodeId {
            lat_e6: (point.lat * 1e6).round() as i64,
            lng_e6: (point.lng * 1e6).round() as i64,
        }
    }

    /// The quantized coordinate this node sits at.
    pub fn to_point(self) -> GeoPoint {
        GeoPoint::new(self.lat_e6 as f64 / 1e6, self.lng_e6 as f64 / 1e6)
    }
}

impl From<&GeoPoint> for NodeId {
    fn from(point: &GeoPoint) -> Self {
        NodeId::from_point(point)
    }
}
