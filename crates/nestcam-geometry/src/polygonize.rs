//! Polygon recovery from loose line work.
//!
//! Used when endpoint tracing finds no closed loop, typically because lines
//! cross or overshoot instead of meeting end to end. The line work is noded
//! (split at crossings, endpoints snapped together), dangling edges are
//! pruned, and every bounded face of the resulting planar graph becomes a
//! polygon.

use crate::polygon::Polygon;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};
use nestcam_core::constants::EPSILON;
use nestcam_core::Point;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Bounded faces of the planar graph formed by `lines`.
///
/// Endpoints closer than `snap` are merged. Faces with an area at or below
/// `min_area` are dropped as noise. Faces come back counter-clockwise.
pub fn polygonize(lines: &[Vec<Point>], snap: f64, min_area: f64) -> Vec<Polygon> {
    let pieces = split_at_crossings(collect_pieces(lines));
    let graph = PlanarGraph::build(&pieces, snap);
    graph
        .faces()
        .into_iter()
        .filter(|face| face.signed_area() > min_area)
        .collect()
}

fn collect_pieces(lines: &[Vec<Point>]) -> Vec<(Point, Point)> {
    lines
        .iter()
        .flat_map(|line| line.windows(2).map(|w| (w[0], w[1])))
        .filter(|(a, b)| !a.approx_eq(b, EPSILON))
        .collect()
}

fn line(a: Point, b: Point) -> Line<f64> {
    Line::new(Coord { x: a.x, y: a.y }, Coord { x: b.x, y: b.y })
}

/// Fraction of the way from `a` to `b` at which `c` lies.
fn param(a: Point, b: Point, c: Coord<f64>) -> f64 {
    let d = b - a;
    ((c.x - a.x) * d.x + (c.y - a.y) * d.y) / (d.x * d.x + d.y * d.y)
}

/// Splits every piece wherever another piece crosses it, touches its
/// interior with an endpoint, or overlaps it.
fn split_at_crossings(pieces: Vec<(Point, Point)>) -> Vec<(Point, Point)> {
    let mut cuts: Vec<Vec<f64>> = vec![Vec::new(); pieces.len()];
    let interior = |t: f64| t > EPSILON && t < 1.0 - EPSILON;

    for i in 0..pieces.len() {
        for j in (i + 1)..pieces.len() {
            let (p0, p1) = pieces[i];
            let (q0, q1) = pieces[j];
            let hits = match line_intersection(line(p0, p1), line(q0, q1)) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => vec![intersection],
                Some(LineIntersection::Collinear { intersection }) => {
                    vec![intersection.start, intersection.end]
                }
                None => continue,
            };
            for hit in hits {
                let t = param(p0, p1, hit);
                if interior(t) {
                    cuts[i].push(t);
                }
                let u = param(q0, q1, hit);
                if interior(u) {
                    cuts[j].push(u);
                }
            }
        }
    }

    let mut out = Vec::with_capacity(pieces.len());
    for ((a, b), mut params) in pieces.into_iter().zip(cuts) {
        params.sort_by(f64::total_cmp);
        params.dedup_by(|x, y| (*x - *y).abs() < EPSILON);
        let mut from = a;
        for t in params {
            let to = a.lerp(&b, t);
            out.push((from, to));
            from = to;
        }
        out.push((from, b));
    }
    out
}

struct PlanarGraph {
    nodes: Vec<Point>,
    /// Neighbours of each node, sorted counter-clockwise by direction.
    adjacency: Vec<Vec<usize>>,
}

impl PlanarGraph {
    fn build(pieces: &[(Point, Point)], snap: f64) -> Self {
        let mut nodes: Vec<Point> = Vec::new();
        let node_id = |p: Point, nodes: &mut Vec<Point>| -> usize {
            match nodes.iter().position(|n| n.approx_eq(&p, snap)) {
                Some(id) => id,
                None => {
                    nodes.push(p);
                    nodes.len() - 1
                }
            }
        };

        let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
        for &(a, b) in pieces {
            let u = node_id(a, &mut nodes);
            let v = node_id(b, &mut nodes);
            if u != v {
                edges.insert((u.min(v), u.max(v)));
            }
        }

        prune_dangles(&mut edges, nodes.len());

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for &(u, v) in &edges {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        for (id, neighbours) in adjacency.iter_mut().enumerate() {
            let origin = nodes[id];
            neighbours.sort_by(|&a, &b| {
                let angle_a = (nodes[a].y - origin.y).atan2(nodes[a].x - origin.x);
                let angle_b = (nodes[b].y - origin.y).atan2(nodes[b].x - origin.x);
                angle_a.partial_cmp(&angle_b).unwrap_or(Ordering::Equal)
            });
        }

        Self { nodes, adjacency }
    }

    /// Walks every face keeping it on the left. Bounded faces come out
    /// counter-clockwise, the unbounded one clockwise.
    fn faces(&self) -> Vec<Polygon> {
        let mut visited: HashSet<(usize, usize)> = HashSet::new();
        let mut faces = Vec::new();
        let limit: usize = self.adjacency.iter().map(Vec::len).sum::<usize>() + 1;

        for u in 0..self.nodes.len() {
            for &v in &self.adjacency[u] {
                if visited.contains(&(u, v)) {
                    continue;
                }
                let start = (u, v);
                let mut current = start;
                let mut ring = Vec::new();
                let mut closed = false;
                for _ in 0..limit {
                    visited.insert(current);
                    let (from, to) = current;
                    ring.push(self.nodes[from]);
                    let Some(next) = self.turn(from, to) else {
                        break;
                    };
                    current = (to, next);
                    if current == start {
                        closed = true;
                        break;
                    }
                }
                if closed && ring.len() >= 3 {
                    faces.push(Polygon::new(ring));
                }
            }
        }
        faces
    }

    /// Next node after arriving at `at` from `from`: the neighbour
    /// immediately clockwise of the way back.
    fn turn(&self, from: usize, at: usize) -> Option<usize> {
        let neighbours = &self.adjacency[at];
        let back = neighbours.iter().position(|&n| n == from)?;
        let len = neighbours.len();
        Some(neighbours[(back + len - 1) % len])
    }
}

/// Removes edges hanging off degree-one nodes until none are left.
fn prune_dangles(edges: &mut BTreeSet<(usize, usize)>, node_count: usize) {
    loop {
        let mut degree = vec![0usize; node_count];
        for &(u, v) in edges.iter() {
            degree[u] += 1;
            degree[v] += 1;
        }
        let before = edges.len();
        edges.retain(|&(u, v)| degree[u] > 1 && degree[v] > 1);
        if edges.len() == before {
            break;
        }
    }
}
