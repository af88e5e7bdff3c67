pub mod dijkstra;
pub mod features;
pub mod geometry;
pub mod geopoint;
pub mod graph;
pub mod leg_source;
pub mod planner;
pub mod stitch;

pub use dijkstra::shortest_path;
pub use features::{RoadDataError, RoadFeature, parse_road_features, road_features};
pub use geometry::{Projection, closest_vertex_index, point_on_segment, polyline_distance, project_onto_line};
pub use geopoint::{GeoPoint, NodeId};
pub use graph::{GraphOptions, RoadGraph, build_graph};
pub use leg_source::{LegSource, StraightLineSource};
pub use planner::{PlannedRoute, PlannerOptions, RouteDebug, RoutePlanner, format_distance};
pub use stitch::{HeadStrategy, StitchOptions, attach_head, expand_legs, pin_head, trim_tail};
