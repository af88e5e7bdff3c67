use crate::geopoint::GeoPoint;

/// Result of projecting a point onto the infinite line through a segment.
///
/// `t` is the position along the line in segment-parameter space and is
/// deliberately unclamped: values outside `[0, 1]` mean the foot of the
/// perpendicular falls before the segment start or past its end.
#[derive(Debug, Copy, Clone)]
pub struct Projection {
    pub t: f64,
    pub point: GeoPoint,
}

/// Projects `p` onto the infinite line through `a` and `b`, treating
/// lng/lat as planar x/y. The equirectangular approximation is fine at
/// the scale of a walking network.
pub fn project_onto_line(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> Projection {
    let vx = b.lng - a.lng;
    let vy = b.lat - a.lat;
    let wx = p.lng - a.lng;
    let wy = p.lat - a.lat;

    let denom = (vx * vx + vy * vy).max(1e-12);
    let t = (wx * vx + wy * vy) / denom;

    Projection {
        t,
        point: GeoPoint::new(a.lat + t * vy, a.lng + t * vx),
    }
}

/// The point on segment `a`→`b` at clamped parameter `t`.
pub fn point_on_segment(a: &GeoPoint, b: &GeoPoint, t: f64) -> GeoPoint {
    let t = t.clamp(0.0, 1.0);
    GeoPoint::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
}

/// Sum of consecutive great-circle distances over a polyline, in meters.
pub fn polyline_distance(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].haversine_distance(&pair[1]))
        .sum()
}

/// Index of the polyline vertex closest to `point`.
pub fn closest_vertex_index(points: &[GeoPoint], point: &GeoPoint) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, p1), (_, p2)| {
            point
                .haversine_distance(p1)
                .total_cmp(&point.haversine_distance(p2))
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_lands_on_perpendicular_foot() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.001);
        let p = GeoPoint::new(0.0002, 0.0005);

        let projection = project_onto_line(&a, &b, &p);
        assert!((projection.t - 0.5).abs() < 1e-9);
        assert!((projection.point.lat).abs() < 1e-9);
        assert!((projection.point.lng - 0.0005).abs() < 1e-9);
    }

    #[test]
    fn projection_t_is_unclamped() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.001);

        let before = project_onto_line(&a, &b, &GeoPoint::new(0.0, -0.0005));
        let after = project_onto_line(&a, &b, &GeoPoint::new(0.0, 0.002));

        assert!(before.t < 0.0);
        assert!(after.t > 1.0);
    }

    #[test]
    fn point_on_segment_clamps() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.001);

        let clamped = point_on_segment(&a, &b, 2.0);
        assert!((clamped.lng - b.lng).abs() < 1e-12);
    }

    #[test]
    fn polyline_distance_sums_segments() {
        let line = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0005, 0.0),
            GeoPoint::new(0.001, 0.0),
        ];

        let expected = 2.0 * line[0].haversine_distance(&line[1]);
        assert!((polyline_distance(&line) - expected).abs() < 1e-6);
    }

    #[test]
    fn polyline_distance_of_degenerate_input_is_zero() {
        assert_eq!(polyline_distance(&[]), 0.0);
        assert_eq!(polyline_distance(&[GeoPoint::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn closest_vertex_picks_nearest() {
        let line = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0005, 0.0),
            GeoPoint::new(0.001, 0.0),
        ];
        let target = GeoPoint::new(0.00052, 0.0);

        assert_eq!(closest_vertex_index(&line, &target), Some(1));
        assert_eq!(closest_vertex_index(&[], &target), None);
    }
}
