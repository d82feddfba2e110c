//! Static 3D kd-tree over a point set.
//!
//! The tree is rebuilt from scratch with [`KdTree::set_points`] whenever the
//! points move; there is no incremental update.

use glam::Vec3;

/// Sentinel for a missing child.
const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Index into the input point set.
    point: u32,
    /// Split axis, `depth % 3`.
    axis: u8,
    children: [u32; 2],
}

/// A query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the input set.
    pub index: usize,
    /// Euclidean distance to the query point.
    pub distance: f32,
}

/// Sorted list keeping only the `bound` closest hits.
struct BoundedQueue {
    bound: usize,
    items: Vec<Neighbor>,
}

impl BoundedQueue {
    fn new(bound: usize) -> Self {
        Self {
            bound,
            items: Vec::with_capacity(bound.min(64) + 1),
        }
    }

    fn push(&mut self, hit: Neighbor) {
        if self.bound == 0 {
            return;
        }
        let at = self.items.partition_point(|n| n.distance <= hit.distance);
        if at >= self.bound {
            return;
        }
        self.items.insert(at, hit);
        self.items.truncate(self.bound);
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.bound
    }

    fn worst(&self) -> f32 {
        self.items.last().map_or(f32::INFINITY, |n| n.distance)
    }
}

/// Arena-backed kd-tree.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    points: Vec<Vec3>,
    nodes: Vec<Node>,
    root: Option<u32>,
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree over `points`.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut tree = Self::new();
        tree.set_points(points);
        tree
    }

    /// Discard the current tree and rebuild it over `points`.
    pub fn set_points(&mut self, points: &[Vec3]) {
        self.clear();
        self.points.extend_from_slice(points);
        self.nodes.reserve(points.len());

        let mut indices: Vec<u32> = (0..points.len() as u32).collect();
        self.root = self.build(&mut indices, 0);
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.nodes.clear();
        self.root = None;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    fn build(&mut self, indices: &mut [u32], depth: usize) -> Option<u32> {
        if indices.is_empty() {
            return None;
        }

        let axis = depth % 3;
        let mid = (indices.len() - 1) / 2;
        let points = &self.points;
        indices.select_nth_unstable_by(mid, |&l, &r| {
            points[l as usize][axis].total_cmp(&points[r as usize][axis])
        });

        let id = self.nodes.len() as u32;
        self.nodes.push(Node {
            point: indices[mid],
            axis: axis as u8,
            children: [NONE, NONE],
        });

        let (left, rest) = indices.split_at_mut(mid);
        let right = &mut rest[1..];
        let left = self.build(left, depth + 1).unwrap_or(NONE);
        let right = self.build(right, depth + 1).unwrap_or(NONE);
        self.nodes[id as usize].children = [left, right];

        Some(id)
    }

    /// Split data for a node: its point, the child containing the query
    /// coordinate (visited first), and the distance to the splitting plane.
    #[inline]
    fn split(&self, node: &Node, query: Vec3) -> (Vec3, usize, f32) {
        let point = self.points[node.point as usize];
        let axis = node.axis as usize;
        let near = if query[axis] < point[axis] { 0 } else { 1 };
        (point, near, (query[axis] - point[axis]).abs())
    }

    /// Closest point to `query`, or `None` if the tree is empty.
    pub fn nearest(&self, query: Vec3) -> Option<Neighbor> {
        let mut best: Option<Neighbor> = None;
        self.nearest_recursive(query, self.root, &mut best);
        best
    }

    fn nearest_recursive(&self, query: Vec3, node: Option<u32>, best: &mut Option<Neighbor>) {
        let Some(id) = node else { return };
        let node = &self.nodes[id as usize];
        let (point, near, plane_distance) = self.split(node, query);

        let distance = query.distance(point);
        if best.map_or(true, |b| distance < b.distance) {
            *best = Some(Neighbor {
                index: node.point as usize,
                distance,
            });
        }

        self.nearest_recursive(query, child(node.children[near]), best);
        if best.map_or(true, |b| plane_distance < b.distance) {
            self.nearest_recursive(query, child(node.children[1 - near]), best);
        }
    }

    /// The `k` closest points, nearest first.
    pub fn k_nearest(&self, query: Vec3, k: usize) -> Vec<Neighbor> {
        let mut queue = BoundedQueue::new(k.min(self.points.len()));
        self.k_nearest_recursive(query, self.root, &mut queue);
        queue.items
    }

    fn k_nearest_recursive(&self, query: Vec3, node: Option<u32>, queue: &mut BoundedQueue) {
        let Some(id) = node else { return };
        let node = &self.nodes[id as usize];
        let (point, near, plane_distance) = self.split(node, query);

        queue.push(Neighbor {
            index: node.point as usize,
            distance: query.distance(point),
        });

        self.k_nearest_recursive(query, child(node.children[near]), queue);
        if !queue.is_full() || plane_distance < queue.worst() {
            self.k_nearest_recursive(query, child(node.children[1 - near]), queue);
        }
    }

    /// Every point strictly within `radius` of `query`, nearest first.
    pub fn radius(&self, query: Vec3, radius: f32) -> Vec<Neighbor> {
        self.radius_bounded(query, radius, 0)
    }

    /// Like [`radius`](Self::radius) but keeps at most `max_neighbors` hits.
    /// Zero means unbounded.
    pub fn radius_bounded(&self, query: Vec3, radius: f32, max_neighbors: usize) -> Vec<Neighbor> {
        let bound = match max_neighbors {
            0 => self.points.len(),
            n => n.min(self.points.len()),
        };
        let mut queue = BoundedQueue::new(bound);
        self.radius_recursive(query, self.root, radius, None, &mut queue);
        queue.items
    }

    /// Points within `radius` of `query` that also lie in the slab
    /// `|normal · (p - query)| < thickness`.
    pub fn radius_in_plane(
        &self,
        query: Vec3,
        normal: Vec3,
        thickness: f32,
        radius: f32,
    ) -> Vec<Neighbor> {
        let mut queue = BoundedQueue::new(self.points.len());
        let slab = (normal.normalize_or_zero(), thickness);
        self.radius_recursive(query, self.root, radius, Some(slab), &mut queue);
        queue.items
    }

    fn radius_recursive(
        &self,
        query: Vec3,
        node: Option<u32>,
        radius: f32,
        slab: Option<(Vec3, f32)>,
        queue: &mut BoundedQueue,
    ) {
        let Some(id) = node else { return };
        let node = &self.nodes[id as usize];
        let (point, near, plane_distance) = self.split(node, query);

        let distance = query.distance(point);
        let in_slab = slab.map_or(true, |(normal, thickness)| {
            normal.dot(point - query).abs() < thickness
        });
        if distance < radius && in_slab {
            queue.push(Neighbor {
                index: node.point as usize,
                distance,
            });
        }

        self.radius_recursive(query, child(node.children[near]), radius, slab, queue);
        if plane_distance < radius {
            self.radius_recursive(query, child(node.children[1 - near]), radius, slab, queue);
        }
    }
}

#[inline]
fn child(id: u32) -> Option<u32> {
    (id != NONE).then_some(id)
}
