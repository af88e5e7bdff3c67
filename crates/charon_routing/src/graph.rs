use fxhash::{FxHashMap, FxHashSet};
use rstar::{AABB, Envelope, PointDistance, RTree, RTreeObject};
use tracing::debug;

use crate::features::RoadFeature;
use crate::geopoint::{GeoPoint, NodeId};

/// Tuning knobs for graph construction.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// How many nearby nodes each node gets shortcut edges to. Drawn
    /// roads are rarely perfectly joined; these shortcuts restore
    /// connectivity across small gaps. Default 4.
    pub k_neighbors: usize,

    /// Maximum length of a shortcut edge in meters. Default 80.
    pub max_edge_meters: f64,

    /// Edges shorter than this are treated as self-loop noise from
    /// near-duplicate drawn vertices and skipped. Default 0.5.
    pub min_edge_meters: f64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions {
            k_neighbors: 4,
            max_edge_meters: 80.0,
            min_edge_meters: 0.5,
        }
    }
}

/// Undirected weighted walking graph over quantized road coordinates.
///
/// Weights are great-circle distances in meters; when several passes
/// propose the same edge the minimum weight wins. Rebuilt fresh for
/// every planning request, never mutated afterwards.
#[derive(Debug, Default)]
pub struct RoadGraph {
    adjacency: FxHashMap<NodeId, FxHashMap<NodeId, f64>>,
}

impl RoadGraph {
    fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) {
        if a == b {
            return;
        }

        let forward = self.adjacency.entry(a).or_default().entry(b).or_insert(f64::INFINITY);
        *forward = forward.min(weight);

        let backward = self.adjacency.entry(b).or_default().entry(a).or_insert(f64::INFINITY);
        *backward = backward.min(weight);
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|neighbors| neighbors.iter().map(|(id, weight)| (*id, *weight)))
    }

    /// The graph node closest to `point`, with its snap distance in
    /// meters.
    pub fn nearest_node(&self, point: &GeoPoint) -> Option<(NodeId, f64)> {
        self.adjacency
            .keys()
            .map(|node| (*node, point.haversine_distance(&node.to_point())))
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
    }
}

struct IndexedNode {
    node: NodeId,
    point: GeoPoint,
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.lng, self.point.lat])
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &<Self::Envelope as Envelope>::Point) -> f64 {
        self.point
            .haversine_distance(&GeoPoint::new(point[1], point[0]))
            .powi(2)
    }
}

/// Builds the walking graph from road features.
///
/// Two passes: consecutive line vertices first (the drawn topology,
/// taken as-is regardless of segment length), then K-nearest shortcut
/// edges capped at `max_edge_meters`. Nodes left without any edge are
/// dropped.
pub fn build_graph(features: &[RoadFeature], options: &GraphOptions) -> RoadGraph {
    let mut graph = RoadGraph::default();

    fn collect(point: &GeoPoint, nodes: &mut Vec<NodeId>, seen: &mut FxHashSet<NodeId>) {
        let node = NodeId::from_point(point);
        if seen.insert(node) {
            nodes.push(node);
        }
    }

    let mut seen: FxHashSet<NodeId> = FxHashSet::default();
    let mut nodes: Vec<NodeId> = Vec::new();

    for feature in features {
        match feature {
            RoadFeature::Line(line) => {
                for pair in line.windows(2) {
                    let weight = pair[0].haversine_distance(&pair[1]);
                    if weight < options.min_edge_meters {
                        // Near-duplicate drawn vertices, not a real edge
                        continue;
                    }
                    graph.add_edge(NodeId::from_point(&pair[0]), NodeId::from_point(&pair[1]), weight);
                }
                for point in line {
                    collect(point, &mut nodes, &mut seen);
                }
            }
            RoadFeature::Point(point) => collect(point, &mut nodes, &mut seen),
        }
    }

    let tree = RTree::bulk_load(
        nodes
            .iter()
            .map(|node| IndexedNode {
                node: *node,
                point: node.to_point(),
            })
            .collect(),
    );

    for node in &nodes {
        let point = node.to_point();

        let neighbors = tree
            .nearest_neighbor_iter(&[point.lng, point.lat])
            .filter(|candidate| candidate.node != *node)
            .map(|candidate| {
                (
                    candidate.node,
                    point.haversine_distance(&candidate.point),
                )
            })
            .take_while(|(_, distance)| *distance <= options.max_edge_meters)
            .take(options.k_neighbors);

        for (neighbor, distance) in neighbors {
            if distance < options.min_edge_meters {
                continue;
            }
            graph.add_edge(*node, neighbor, distance);
        }
    }

    debug!(
        nodes = graph.node_count(),
        dropped = nodes.len() - graph.node_count(),
        "Built road graph"
    );

    graph
}
