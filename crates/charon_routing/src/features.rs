use geojson::{FeatureCollection, GeoJson, Value};
use thiserror::Error;
use tracing::debug;

use crate::geopoint::GeoPoint;

#[derive(Debug, Error)]
pub enum RoadDataError {
    #[error("Invalid road GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    #[error("Road data is not a FeatureCollection")]
    NotAFeatureCollection,
}

/// One road geometry as supplied by the geodata service.
///
/// Lines carry the drawn road topology; standalone points contribute
/// graph nodes only (junction markers, gate posts and the like).
#[derive(Debug, Clone)]
pub enum RoadFeature {
    Line(Vec<GeoPoint>),
    Point(GeoPoint),
}

fn position_to_point(position: &[f64]) -> Option<GeoPoint> {
    // GeoJSON positions are [lng, lat]
    match position {
        [lng, lat, ..] => Some(GeoPoint::new(*lat, *lng)),
        _ => None,
    }
}

fn line_to_feature(line: &[Vec<f64>]) -> RoadFeature {
    RoadFeature::Line(line.iter().filter_map(|p| position_to_point(p)).collect())
}

/// Flattens a GeoJSON feature collection into road features. Geometry
/// kinds the wayfinder has no use for (polygons etc.) are skipped.
pub fn road_features(collection: &FeatureCollection) -> Vec<RoadFeature> {
    let mut features = Vec::with_capacity(collection.features.len());

    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };

        match &geometry.value {
            Value::LineString(line) => features.push(line_to_feature(line)),
            Value::MultiLineString(lines) => {
                features.extend(lines.iter().map(|line| line_to_feature(line)));
            }
            Value::Point(position) => {
                if let Some(point) = position_to_point(position) {
                    features.push(RoadFeature::Point(point));
                }
            }
            Value::MultiPoint(positions) => {
                features.extend(
                    positions
                        .iter()
                        .filter_map(|p| position_to_point(p))
                        .map(RoadFeature::Point),
                );
            }
            other => {
                debug!("Skipping unsupported road geometry: {}", other.type_name());
            }
        }
    }

    features
}

/// Parses a raw GeoJSON document into road features.
pub fn parse_road_features(raw: &str) -> Result<Vec<RoadFeature>, RoadDataError> {
    match raw.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(road_features(&collection)),
        _ => Err(RoadDataError::NotAFeatureCollection),
    }
}
