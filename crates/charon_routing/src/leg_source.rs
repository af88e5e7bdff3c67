use crate::geopoint::GeoPoint;

/// Supplier of detailed walking geometry for a single A→B hop.
///
/// Implementations are expected to degrade internally: when the
/// underlying provider fails, they return the straight two-point leg
/// `[from, to]` instead of an error, so route assembly never aborts on
/// a single bad hop.
pub trait LegSource {
    /// Ordered polyline from `from` to `to`, always non-empty.
    async fn fetch_leg(&self, from: &GeoPoint, to: &GeoPoint) -> Vec<GeoPoint>;
}

/// Straight-line source: every hop is the segment between its
/// endpoints. Useful for tests and offline operation.
#[derive(Debug, Default)]
pub struct StraightLineSource;

impl LegSource for StraightLineSource {
    async fn fetch_leg(&self, from: &GeoPoint, to: &GeoPoint) -> Vec<GeoPoint> {
        vec![*from, *to]
    }
}
