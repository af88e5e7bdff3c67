use tracing::debug;

use crate::dijkstra::shortest_path;
use crate::features::RoadFeature;
use crate::geometry::polyline_distance;
use crate::geopoint::GeoPoint;
use crate::graph::{GraphOptions, RoadGraph, build_graph};
use crate::leg_source::LegSource;
use crate::stitch::{HeadStrategy, StitchOptions, attach_head, expand_legs, pin_head, trim_tail};

#[derive(Debug, Clone, Default)]
pub struct PlannerOptions {
    pub graph: GraphOptions,
    pub stitch: StitchOptions,
}

/// How the route was put together, for logging and diagnostics.
#[derive(Debug, Copy, Clone)]
pub struct RouteDebug {
    /// Distance from the user position to its snapped graph node.
    pub start_snap_meters: f64,
    /// Distance from the destination to its snapped graph node.
    pub end_snap_meters: f64,
    pub head_strategy: HeadStrategy,
    /// Node count of the underlying shortest path, zero for direct
    /// routes.
    pub path_nodes: usize,
}

#[derive(Debug, Clone)]
pub struct PlannedRoute {
    /// Ordered walking polyline from the exact user position toward the
    /// destination.
    pub polyline: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub debug: RouteDebug,
}

/// Plans walking routes over a prebuilt road graph.
///
/// Planning never fails outright: when the graph cannot serve a request
/// the planner degrades to a single direct provider leg.
pub struct RoutePlanner<S: LegSource> {
    graph: RoadGraph,
    source: S,
    options: StitchOptions,
}

impl<S: LegSource> RoutePlanner<S> {
    pub fn new(features: &[RoadFeature], source: S, options: PlannerOptions) -> Self {
        RoutePlanner {
            graph: build_graph(features, &options.graph),
            source,
            options: options.stitch,
        }
    }

    pub fn from_graph(graph: RoadGraph, source: S, options: StitchOptions) -> Self {
        RoutePlanner { graph, source, options }
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Plans a route from the live user position to the destination.
    pub async fn plan(&self, user: &GeoPoint, destination: &GeoPoint) -> PlannedRoute {
        let snapped = self
            .graph
            .nearest_node(user)
            .zip(self.graph.nearest_node(destination));

        let Some(((start, start_snap), (end, end_snap))) = snapped else {
            debug!("Empty road graph, routing directly");
            return self.direct(user, destination, 0.0, 0.0).await;
        };

        let path = shortest_path(&self.graph, start, end);
        if path.is_empty() {
            debug!(?start, ?end, "No path through the road graph, routing directly");
            return self.direct(user, destination, start_snap, end_snap).await;
        }

        let mut route = expand_legs(&self.source, &path).await;

        // Bridge the gap between the last node and the true destination
        // when it is worth a provider call
        if end_snap > self.options.min_snap_leg_meters {
            if let Some(last) = route.last().copied() {
                let leg = self.source.fetch_leg(&last, destination).await;
                route.extend(leg.into_iter().skip(1));
            }
        }

        let Some((attached, head_strategy)) =
            attach_head(&self.source, route, &path, user, &self.options).await
        else {
            return self.direct(user, destination, start_snap, end_snap).await;
        };

        let polyline = trim_tail(attached, destination, &self.options);
        let distance_meters = polyline_distance(&polyline);
        PlannedRoute {
            polyline,
            distance_meters,
            debug: RouteDebug {
                start_snap_meters: start_snap,
                end_snap_meters: end_snap,
                head_strategy,
                path_nodes: path.len(),
            },
        }
    }

    /// Single-leg route bypassing the graph. The provider may snap both
    /// endpoints to its own network, so the leg still gets the exact
    /// user position pinned to its head and the tail trimmed at the
    /// destination.
    async fn direct(
        &self,
        user: &GeoPoint,
        destination: &GeoPoint,
        start_snap: f64,
        end_snap: f64,
    ) -> PlannedRoute {
        let leg = self.source.fetch_leg(user, destination).await;
        let polyline = trim_tail(pin_head(leg, user, &self.options), destination, &self.options);
        let distance_meters = polyline_distance(&polyline);
        PlannedRoute {
            polyline,
            distance_meters,
            debug: RouteDebug {
                start_snap_meters: start_snap,
                end_snap_meters: end_snap,
                head_strategy: HeadStrategy::Direct,
                path_nodes: 0,
            },
        }
    }
}

/// Human-readable distance: meters below a kilometer, otherwise
/// kilometers with one decimal.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg_source::StraightLineSource;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    fn straight_road() -> Vec<RoadFeature> {
        vec![RoadFeature::Line(vec![
            point(0.0, 0.0),
            point(0.0, 0.0005),
            point(0.0, 0.001),
        ])]
    }

    #[tokio::test]
    async fn plans_end_to_end_along_the_road() {
        let planner = RoutePlanner::new(
            &straight_road(),
            StraightLineSource,
            PlannerOptions::default(),
        );

        // User just off the road start, destination just off its end
        let user = point(0.00005, 0.00002);
        let destination = point(0.00005, 0.00098);

        let route = planner.plan(&user, &destination).await;

        assert_eq!(route.polyline.first(), Some(&user));
        assert_eq!(route.polyline.last(), Some(&destination));
        assert!(route.polyline.len() >= 3);
        assert_eq!(route.debug.path_nodes, 3);
        assert_eq!(route.debug.head_strategy, HeadStrategy::Projection);

        // Straight-line distance user→destination is ~107 m; the routed
        // distance must be at least that and still in the same ballpark
        let beeline = user.haversine_distance(&destination);
        assert!(route.distance_meters >= beeline - 0.01);
        assert!(route.distance_meters < beeline + 50.0);
    }

    #[tokio::test]
    async fn empty_graph_falls_back_to_direct_routing() {
        let planner =
            RoutePlanner::new(&[], StraightLineSource, PlannerOptions::default());

        let user = point(0.0, 0.0);
        let destination = point(0.001, 0.001);
        let route = planner.plan(&user, &destination).await;

        assert_eq!(route.debug.head_strategy, HeadStrategy::Direct);
        assert_eq!(route.polyline, vec![user, destination]);
        assert_eq!(route.debug.path_nodes, 0);
    }

    /// Shifts every leg ~11 m east, like a provider snapping endpoints
    /// to its own road network.
    struct ShiftedSource;

    impl crate::leg_source::LegSource for ShiftedSource {
        async fn fetch_leg(&self, from: &GeoPoint, to: &GeoPoint) -> Vec<GeoPoint> {
            vec![
                GeoPoint::new(from.lat, from.lng + 0.0001),
                GeoPoint::new(to.lat, to.lng + 0.0001),
            ]
        }
    }

    #[tokio::test]
    async fn direct_fallback_pins_user_and_destination() {
        let planner = RoutePlanner::new(&[], ShiftedSource, PlannerOptions::default());

        let user = point(0.0, 0.0);
        let destination = point(0.001, 0.001);
        let route = planner.plan(&user, &destination).await;

        assert_eq!(route.debug.head_strategy, HeadStrategy::Direct);
        // The provider leg started and ended off both endpoints; the
        // route must not
        assert_eq!(route.polyline.first(), Some(&user));
        assert_eq!(route.polyline.last(), Some(&destination));
    }

    #[tokio::test]
    async fn short_route_keeps_exact_endpoints() {
        let features = vec![RoadFeature::Line(vec![point(0.0, 0.0), point(0.0, 0.0005)])];
        let planner =
            RoutePlanner::new(&features, StraightLineSource, PlannerOptions::default());

        let user = point(0.00003, 0.00001);
        let destination = point(0.00003, 0.00049);
        let route = planner.plan(&user, &destination).await;

        assert_eq!(route.polyline.first(), Some(&user));
        assert_eq!(route.polyline.last(), Some(&destination));
    }

    #[tokio::test]
    async fn disconnected_endpoints_fall_back_to_direct_routing() {
        let features = vec![
            RoadFeature::Line(vec![point(0.0, 0.0), point(0.0, 0.0005)]),
            // Second component ~11 km away
            RoadFeature::Line(vec![point(0.1, 0.0), point(0.1, 0.0005)]),
        ];
        let planner =
            RoutePlanner::new(&features, StraightLineSource, PlannerOptions::default());

        let route = planner.plan(&point(0.0, 0.0), &point(0.1, 0.0)).await;

        assert_eq!(route.debug.head_strategy, HeadStrategy::Direct);
    }

    #[tokio::test]
    async fn distant_destination_gets_a_bridging_leg() {
        let planner = RoutePlanner::new(
            &straight_road(),
            StraightLineSource,
            PlannerOptions::default(),
        );

        // ~22 m past the end of the road, aligned with it
        let user = point(0.0, 0.00002);
        let destination = point(0.0, 0.0012);

        let route = planner.plan(&user, &destination).await;

        // The tail leg carries the route all the way to the destination
        assert_eq!(route.polyline.last(), Some(&destination));
    }

    #[test]
    fn formats_distances() {
        assert_eq!(format_distance(0.4), "0 m");
        assert_eq!(format_distance(87.2), "87 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1260.0), "1.3 km");
        assert_eq!(format_distance(12_345.0), "12.3 km");
    }
}
