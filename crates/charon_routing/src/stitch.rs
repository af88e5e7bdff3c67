use crate::geometry::{closest_vertex_index, point_on_segment, polyline_distance, project_onto_line};
use crate::geopoint::{GeoPoint, NodeId};
use crate::leg_source::LegSource;

/// Points closer than this are considered the same vertex when
/// splicing, so repeated trimming cannot grow the route.
const DUPLICATE_EPSILON_METERS: f64 = 0.01;

/// Slack allowed between a fetched leg's end and the polyline vertex it
/// joins; provider geometry snaps to its own network and rarely matches
/// our vertices exactly.
const JOIN_EPSILON_METERS: f64 = 0.5;

/// Tuning knobs for head attachment and tail trimming.
#[derive(Debug, Clone)]
pub struct StitchOptions {
    /// How far along the route (cumulative meters from its start) the
    /// head-attachment search is allowed to look. Default 140.
    pub lookahead_meters: f64,

    /// Maximum perpendicular distance for the projection tier of head
    /// attachment. Default 22.
    pub projection_tolerance_meters: f64,

    /// Maximum perpendicular distance for tail-trim candidates.
    /// Default 25.
    pub tail_tolerance_meters: f64,

    /// How many trailing segments the tail-trim search inspects.
    /// Default 8.
    pub lookback_segments: usize,

    /// Cap on provider legs fetched by the head-attachment fallback.
    /// Default 6.
    pub max_head_candidates: usize,

    /// Snap distances below this are "close enough": no extra provider
    /// leg is fetched to bridge them. Default 2.
    pub min_snap_leg_meters: f64,
}

impl Default for StitchOptions {
    fn default() -> Self {
        StitchOptions {
            lookahead_meters: 140.0,
            projection_tolerance_meters: 22.0,
            tail_tolerance_meters: 25.0,
            lookback_segments: 8,
            max_head_candidates: 6,
            min_snap_leg_meters: 2.0,
        }
    }
}

/// Which head-attachment tier produced the final route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeadStrategy {
    /// User position projected onto an early segment of the route.
    Projection,
    /// Provider leg from the user to a nearby route node.
    NodeLeg,
    /// Whole route is a single direct provider leg, bypassing the graph.
    Direct,
}

/// Expands a node sequence into one polyline by concatenating per-hop
/// provider legs, dropping each leg's duplicated first point.
pub async fn expand_legs<S: LegSource>(source: &S, nodes: &[NodeId]) -> Vec<GeoPoint> {
    let Some(first) = nodes.first() else {
        return Vec::new();
    };
    if nodes.len() == 1 {
        return vec![first.to_point()];
    }

    let mut route = Vec::new();
    for (i, pair) in nodes.windows(2).enumerate() {
        let leg = source
            .fetch_leg(&pair[0].to_point(), &pair[1].to_point())
            .await;
        let skip = usize::from(i > 0);
        route.extend(leg.into_iter().skip(skip));
    }

    route
}

fn project_within_window(
    route: &[GeoPoint],
    user: &GeoPoint,
    options: &StitchOptions,
) -> Option<Vec<GeoPoint>> {
    if route.len() < 2 {
        return None;
    }

    let mut along = 0.0;
    let mut best: Option<(usize, f64, f64, GeoPoint)> = None;

    for i in 0..route.len() - 1 {
        if along > options.lookahead_meters {
            break;
        }

        let a = &route[i];
        let b = &route[i + 1];
        let t = project_onto_line(a, b, user).t.clamp(0.0, 1.0);
        let on_segment = point_on_segment(a, b, t);
        let distance = user.haversine_distance(&on_segment);

        if distance <= options.projection_tolerance_meters
            && best.is_none_or(|(_, d, _, _)| distance < d)
        {
            best = Some((i, distance, t, on_segment));
        }

        along += a.haversine_distance(b);
    }

    best.map(|(i, _, t, point)| {
        let mut spliced = vec![*user];
        if t < 1.0 && point.haversine_distance(user) > DUPLICATE_EPSILON_METERS {
            spliced.push(point);
        }
        spliced.extend_from_slice(&route[i + 1..]);
        spliced
    })
}

/// Starts the route at the exact user coordinate without involving the
/// provider: splices via projection when an early segment passes within
/// tolerance, otherwise prepends the user position outright. Used for
/// routes whose geometry came back with snapped endpoints.
pub fn pin_head(route: Vec<GeoPoint>, user: &GeoPoint, options: &StitchOptions) -> Vec<GeoPoint> {
    match route.first() {
        Some(first) if first.haversine_distance(user) <= DUPLICATE_EPSILON_METERS => {
            let mut pinned = route;
            pinned[0] = *user;
            return pinned;
        }
        None => return vec![*user],
        _ => {}
    }

    if let Some(spliced) = project_within_window(&route, user, options) {
        return spliced;
    }

    let mut pinned = Vec::with_capacity(route.len() + 1);
    pinned.push(*user);
    pinned.extend(route);
    pinned
}

async fn attach_via_node_leg<S: LegSource>(
    source: &S,
    route: &[GeoPoint],
    path: &[NodeId],
    user: &GeoPoint,
    options: &StitchOptions,
) -> Option<Vec<GeoPoint>> {
    if route.is_empty() || path.is_empty() {
        return None;
    }

    let mut cumulative = Vec::with_capacity(route.len());
    let mut along = 0.0;
    cumulative.push(0.0);
    for pair in route.windows(2) {
        along += pair[0].haversine_distance(&pair[1]);
        cumulative.push(along);
    }

    // Path nodes are ordered along the route, so the first node past
    // the lookahead window ends the scan.
    let mut candidates: Vec<(GeoPoint, usize)> = Vec::new();
    for node in path {
        let point = node.to_point();
        let index = closest_vertex_index(route, &point)?;
        if cumulative[index] > options.lookahead_meters {
            break;
        }
        candidates.push((point, index));
        if candidates.len() == options.max_head_candidates {
            break;
        }
    }

    if candidates.is_empty() {
        // Even a distant first node beats having no join at all
        let point = path[0].to_point();
        let index = closest_vertex_index(route, &point)?;
        candidates.push((point, index));
    }

    let mut best: Option<(f64, Vec<GeoPoint>, usize)> = None;
    for (point, index) in candidates {
        let leg = source.fetch_leg(user, &point).await;
        let length = polyline_distance(&leg);
        if best.as_ref().is_none_or(|(shortest, _, _)| length < *shortest) {
            best = Some((length, leg, index));
        }
    }

    best.map(|(_, leg, index)| {
        let mut joined = vec![*user];
        joined.extend(leg.into_iter().skip(1));

        let mut rest = &route[index..];
        if let (Some(last), Some(next)) = (joined.last(), rest.first()) {
            if last.haversine_distance(next) < JOIN_EPSILON_METERS {
                rest = &rest[1..];
            }
        }
        joined.extend_from_slice(rest);
        joined
    })
}

/// Connects the live user position to the front of the expanded route.
///
/// Tries projection onto an early segment first, then falls back to
/// fetching direct provider legs to candidate nodes inside the
/// lookahead window. Returns `None` when the route or path is too bare
/// for either tier; the planner then routes user→destination directly.
pub async fn attach_head<S: LegSource>(
    source: &S,
    route: Vec<GeoPoint>,
    path: &[NodeId],
    user: &GeoPoint,
    options: &StitchOptions,
) -> Option<(Vec<GeoPoint>, HeadStrategy)> {
    if let Some(spliced) = project_within_window(&route, user, options) {
        return Some((spliced, HeadStrategy::Projection));
    }

    attach_via_node_leg(source, &route, path, user, options)
        .await
        .map(|joined| (joined, HeadStrategy::NodeLeg))
}

/// Trims the route so it ends exactly at the destination whenever a
/// trailing segment passes within tolerance; otherwise leaves the
/// nearest reachable approximation.
pub fn trim_tail(route: Vec<GeoPoint>, destination: &GeoPoint, options: &StitchOptions) -> Vec<GeoPoint> {
    if route.len() < 2 {
        return route;
    }

    let segment_count = route.len() - 1;
    let window_start = segment_count.saturating_sub(options.lookback_segments);

    let mut best: Option<(usize, f64, GeoPoint)> = None;
    for i in (window_start..segment_count).rev() {
        let projection = project_onto_line(&route[i], &route[i + 1], destination);
        if !(0.0..=1.0).contains(&projection.t) {
            continue;
        }

        let distance = destination.haversine_distance(&projection.point);
        if distance <= options.tail_tolerance_meters && best.is_none_or(|(_, d, _)| distance < d) {
            best = Some((i, distance, projection.point));
        }
    }

    if let Some((i, _, point)) = best {
        let mut trimmed = route[..=i].to_vec();
        if point.haversine_distance(&trimmed[i]) > DUPLICATE_EPSILON_METERS
            && point.haversine_distance(destination) > DUPLICATE_EPSILON_METERS
        {
            trimmed.push(point);
        }
        match trimmed.last_mut() {
            // Pin the exact destination coordinate
            Some(last) if last.haversine_distance(destination) <= DUPLICATE_EPSILON_METERS => {
                *last = *destination;
            }
            _ => trimmed.push(*destination),
        }
        return trimmed;
    }

    // No segment passes close enough. If the route overshoots (its last
    // point is farther from the destination than the one before it),
    // pull the end back onto the final segment; otherwise accept the
    // approximate ending.
    let last = route[route.len() - 1];
    let second_last = route[route.len() - 2];
    if destination.haversine_distance(&last) > destination.haversine_distance(&second_last) {
        let t = project_onto_line(&second_last, &last, destination).t;
        let clamped = point_on_segment(&second_last, &last, t);

        let mut trimmed = route[..route.len() - 1].to_vec();
        if clamped.haversine_distance(&second_last) > DUPLICATE_EPSILON_METERS {
            trimmed.push(clamped);
        }
        return trimmed;
    }

    route
}
