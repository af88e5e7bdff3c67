use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fxhash::{FxHashMap, FxHashSet};

use crate::geopoint::NodeId;
use crate::graph::RoadGraph;

#[derive(Copy, Clone)]
struct HeapItem {
    weight: f64,
    node: NodeId,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &HeapItem) -> bool {
        self.weight == other.weight && self.node == other.node
    }
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flip weight to make this a min-heap
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &HeapItem) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path from `start` to `end`, inclusive of both endpoints.
///
/// Returns an empty path when either endpoint is not in the graph or no
/// path exists; the caller falls back to direct provider routing.
pub fn shortest_path(graph: &RoadGraph, start: NodeId, end: NodeId) -> Vec<NodeId> {
    if !graph.contains(start) || !graph.contains(end) {
        return Vec::new();
    }

    let mut distances: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut parents: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut settled: FxHashSet<NodeId> = FxHashSet::default();
    let mut heap = BinaryHeap::new();

    distances.insert(start, 0.0);
    heap.push(HeapItem {
        weight: 0.0,
        node: start,
    });

    while let Some(HeapItem { weight, node }) = heap.pop() {
        if !settled.insert(node) {
            continue;
        }

        if node == end {
            break;
        }

        for (neighbor, edge_weight) in graph.neighbors(node) {
            if settled.contains(&neighbor) {
                continue;
            }

            let next_weight = weight + edge_weight;
            let best = distances.get(&neighbor).copied().unwrap_or(f64::INFINITY);

            if next_weight < best {
                distances.insert(neighbor, next_weight);
                parents.insert(neighbor, node);
                heap.push(HeapItem {
                    weight: next_weight,
                    node: neighbor,
                });
            }
        }
    }

    let mut path = vec![end];
    let mut node = end;
    while let Some(parent) = parents.get(&node) {
        path.push(*parent);
        node = *parent;
    }
    path.reverse();

    if path[0] != start {
        return Vec::new();
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geopoint::GeoPoint;

    fn node(lat: f64, lng: f64) -> NodeId {
        NodeId::from_point(&GeoPoint::new(lat, lng))
    }

    /// Graph built directly from weighted edges; Dijkstra only cares
    /// about topology, not real coordinates.
    fn graph_from_edges(edges: &[(NodeId, NodeId, f64)]) -> RoadGraph {
        use crate::features::RoadFeature;
        use crate::graph::{GraphOptions, build_graph};

        // Represent each edge as a two-point line; weights then equal
        // the haversine distance between the quantized endpoints.
        let features: Vec<RoadFeature> = edges
            .iter()
            .map(|(a, b, _)| RoadFeature::Line(vec![a.to_point(), b.to_point()]))
            .collect();

        build_graph(
            &features,
            &GraphOptions {
                k_neighbors: 0,
                ..GraphOptions::default()
            },
        )
    }

    fn path_weight(graph: &RoadGraph, path: &[NodeId]) -> f64 {
        path.windows(2)
            .map(|pair| {
                graph
                    .neighbors(pair[0])
                    .find(|(n, _)| *n == pair[1])
                    .map(|(_, w)| w)
                    .expect("path uses a missing edge")
            })
            .sum()
    }

    /// Exhaustive shortest-path search for cross-checking.
    fn brute_force(graph: &RoadGraph, start: NodeId, end: NodeId) -> Option<f64> {
        fn walk(
            graph: &RoadGraph,
            node: NodeId,
            end: NodeId,
            visited: &mut Vec<NodeId>,
            cost: f64,
            best: &mut Option<f64>,
        ) {
            if node == end {
                *best = Some(best.map_or(cost, |b: f64| b.min(cost)));
                return;
            }
            for (neighbor, weight) in graph.neighbors(node) {
                if visited.contains(&neighbor) {
                    continue;
                }
                visited.push(neighbor);
                walk(graph, neighbor, end, visited, cost + weight, best);
                visited.pop();
            }
        }

        let mut best = None;
        walk(graph, start, end, &mut vec![start], 0.0, &mut best);
        best
    }

    #[test]
    fn matches_brute_force_on_small_graphs() {
        // Diamond with a long direct edge and a cheaper two-hop detour,
        // plus a dangling spur.
        let a = node(0.0, 0.0);
        let b = node(0.0005, 0.0);
        let c = node(0.0, 0.0005);
        let d = node(0.0005, 0.0005);
        let e = node(0.001, 0.001);

        let graph = graph_from_edges(&[
            (a, b, 0.0),
            (a, c, 0.0),
            (b, d, 0.0),
            (c, d, 0.0),
            (a, d, 0.0),
            (d, e, 0.0),
        ]);

        for (start, end) in [(a, d), (a, e), (b, c), (e, a)] {
            let path = shortest_path(&graph, start, end);
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&end));

            let expected = brute_force(&graph, start, end).unwrap();
            let actual = path_weight(&graph, &path);
            assert!(
                (actual - expected).abs() < 1e-6,
                "{actual} != {expected} for {start:?} -> {end:?}"
            );
        }
    }

    #[test]
    fn start_equals_end_returns_single_node() {
        let a = node(0.0, 0.0);
        let b = node(0.0005, 0.0);
        let graph = graph_from_edges(&[(a, b, 0.0)]);

        assert_eq!(shortest_path(&graph, a, a), vec![a]);
    }

    #[test]
    fn unreachable_returns_empty() {
        let a = node(0.0, 0.0);
        let b = node(0.0005, 0.0);
        // Two disconnected components, far apart
        let c = node(0.1, 0.0);
        let d = node(0.1005, 0.0);
        let graph = graph_from_edges(&[(a, b, 0.0), (c, d, 0.0)]);

        assert!(shortest_path(&graph, a, c).is_empty());
    }

    #[test]
    fn absent_endpoint_returns_empty() {
        let a = node(0.0, 0.0);
        let b = node(0.0005, 0.0);
        let graph = graph_from_edges(&[(a, b, 0.0)]);

        let missing = node(0.5, 0.5);
        assert!(shortest_path(&graph, missing, b).is_empty());
        assert!(shortest_path(&graph, a, missing).is_empty());
    }

    #[test]
    fn prefers_cheaper_multi_hop_route() {
        // a--b--c in a line plus a long wrap-around a--d--c; the line
        // is shorter.
        let a = node(0.0, 0.0);
        let b = node(0.0005, 0.0);
        let c = node(0.001, 0.0);
        let d = node(0.0005, 0.002);
        let graph = graph_from_edges(&[(a, b, 0.0), (b, c, 0.0), (a, d, 0.0), (d, c, 0.0)]);

        assert_eq!(shortest_path(&graph, a, c), vec![a, b, c]);
    }
}
