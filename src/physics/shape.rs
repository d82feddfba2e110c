//! Convex collision shapes and their support functions.

use glam::Vec3;

use crate::ecs::components::transform::Pose;
use crate::error::{PhysicsError, Result};

/// Shape kind. The ordinal indexes the narrowphase dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    Plane = 0,
    Sphere = 1,
    Capsule = 2,
    ConvexHull = 3,
    Cuboid = 4,
}

impl ShapeKind {
    /// Number of shape kinds.
    pub const COUNT: usize = 5;

    #[inline]
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Convex polyhedron given by its vertices and, optionally, triangle faces.
///
/// Collision only ever needs the vertex cloud; faces and per-vertex normals
/// are kept for renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexHull {
    vertices: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    indices: Vec<u32>,
}

impl ConvexHull {
    /// Hull from a bare point cloud.
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            normals: None,
            indices: Vec::new(),
        }
    }

    /// Hull from vertices and a triangle index list.
    pub fn with_faces(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let mut hull = Self::default();
        hull.set_data(vertices, indices)?;
        Ok(hull)
    }

    /// Axis-aligned box hull with 8 vertices and 12 triangles.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let vertices = vec![
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(-h.x, -h.y, h.z),
        ];
        let indices = vec![
            0, 1, 2, 1, 2, 3, // back
            4, 5, 6, 5, 6, 7, // front
            0, 1, 5, 0, 4, 5, // top
            2, 3, 7, 2, 6, 7, // bottom
            0, 2, 6, 0, 6, 4, // right
            1, 3, 7, 1, 5, 7, // left
        ];
        Self {
            vertices,
            normals: None,
            indices,
        }
    }

    /// Replace vertices and faces. Every index must reference a vertex.
    pub fn set_data(&mut self, vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<()> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(PhysicsError::InvalidHullIndex {
                index,
                count: vertices.len(),
            });
        }
        self.vertices = vertices;
        self.indices = indices;
        self.normals = None;
        Ok(())
    }

    /// Append a vertex. Invalidates per-vertex normals.
    pub fn add_vertex(&mut self, vertex: Vec3) {
        self.vertices.push(vertex);
        self.normals = None;
    }

    /// Average the face normals around each vertex. Faces are oriented away
    /// from the vertex centroid, so the index winding does not matter.
    pub fn compute_vertex_normals(&mut self) {
        if self.vertices.is_empty() {
            self.normals = None;
            return;
        }
        let centroid =
            self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32;
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for face in self.indices.chunks_exact(3) {
            let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
            let (va, vb, vc) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let mut normal = (vb - va).cross(vc - va).normalize_or_zero();
            if normal.dot(va - centroid) < 0.0 {
                normal = -normal;
            }
            normals[a] += normal;
            normals[b] += normal;
            normals[c] += normal;
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.normals = Some(normals);
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Furthest vertex along a local-space direction.
    ///
    /// An empty hull answers with the local origin.
    #[inline]
    fn local_support(&self, direction: Vec3) -> Vec3 {
        let mut best = Vec3::ZERO;
        let mut best_dot = f32::MIN;
        for &vertex in &self.vertices {
            let d = vertex.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = vertex;
            }
        }
        best
    }
}

/// Convex collision shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Half-space bounded by the plane `n · x = distance` (in the body frame).
    Plane { normal: Vec3, distance: f32 },
    Sphere { center: Vec3, radius: f32 },
    /// Capsule along the local Y axis.
    Capsule { radius: f32, half_height: f32 },
    ConvexHull(ConvexHull),
    Cuboid { half_extents: Vec3 },
}

impl Shape {
    pub fn plane(normal: Vec3, distance: f32) -> Self {
        Shape::Plane { normal, distance }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Shape::Capsule {
            radius,
            half_height,
        }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Shape::Cuboid { half_extents }
    }

    pub fn hull(hull: ConvexHull) -> Self {
        Shape::ConvexHull(hull)
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Plane { .. } => ShapeKind::Plane,
            Shape::Sphere { .. } => ShapeKind::Sphere,
            Shape::Capsule { .. } => ShapeKind::Capsule,
            Shape::ConvexHull(_) => ShapeKind::ConvexHull,
            Shape::Cuboid { .. } => ShapeKind::Cuboid,
        }
    }

    /// GJK/EPA support function. Returns the world-space point of the shape
    /// furthest along `direction`.
    ///
    /// Planes have no finite support. They answer with their anchor point;
    /// `gjk` and `epa` refuse plane operands and the narrowphase tests planes
    /// analytically.
    #[inline]
    pub fn support(&self, direction: Vec3, pose: &Pose) -> Vec3 {
        match self {
            Shape::Plane { normal, distance } => {
                pose.transform_point(normal.normalize_or_zero() * *distance)
            }
            Shape::Sphere { center, radius } => {
                pose.transform_point(*center)
                    + direction.normalize_or_zero() * *radius * pose.max_scale()
            }
            Shape::Capsule {
                radius,
                half_height,
            } => {
                let local_dir = pose.to_local_direction(direction);
                let tip = if local_dir.y >= 0.0 {
                    Vec3::new(0.0, *half_height, 0.0)
                } else {
                    Vec3::new(0.0, -*half_height, 0.0)
                };
                pose.transform_point(tip)
                    + direction.normalize_or_zero() * *radius * pose.max_scale()
            }
            Shape::ConvexHull(hull) => {
                pose.transform_point(hull.local_support(pose.to_local_direction(direction)))
            }
            Shape::Cuboid { half_extents } => {
                let local_dir = pose.to_local_direction(direction);
                let corner = Vec3::select(local_dir.cmpge(Vec3::ZERO), *half_extents, -*half_extents);
                pose.transform_point(corner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_kind_ordinals() {
        assert_eq!(ShapeKind::Plane.ordinal(), 0);
        assert_eq!(ShapeKind::Sphere.ordinal(), 1);
        assert_eq!(ShapeKind::ConvexHull.ordinal(), 3);
        assert_eq!(Shape::cuboid(Vec3::ONE).kind(), ShapeKind::Cuboid);
    }

    #[test]
    fn test_sphere_support() {
        let shape = Shape::sphere(Vec3::ZERO, 2.0);
        let pose = Pose::from_position(Vec3::new(0.0, 5.0, 0.0));
        let support = shape.support(Vec3::Y, &pose);
        let eps = 1e-5;
        assert!((support - Vec3::new(0.0, 7.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_sphere_support_uses_largest_scale() {
        let shape = Shape::sphere(Vec3::ZERO, 1.0);
        let pose = Pose::identity().with_scale(Vec3::new(1.0, 3.0, 1.0));
        let support = shape.support(Vec3::X, &pose);
        assert!((support - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_hull_support_translated() {
        let shape = Shape::hull(ConvexHull::cuboid(Vec3::ONE));
        let pose = Pose::from_position(Vec3::new(10.0, 0.0, 0.0));
        let support = shape.support(Vec3::new(1.0, 1.0, 1.0), &pose);
        assert!((support - Vec3::new(11.0, 1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_hull_support_rotated() {
        // A thin slab along local X, rotated a quarter turn about Z so it lies along Y.
        let hull = ConvexHull::cuboid(Vec3::new(2.0, 0.1, 0.1));
        let shape = Shape::hull(hull);
        let pose = Pose::identity().with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let support = shape.support(Vec3::Y, &pose);
        assert!((support.y - 2.0).abs() < 1e-4, "support = {:?}", support);
    }

    #[test]
    fn test_cuboid_support_matches_hull() {
        let half = Vec3::new(1.0, 2.0, 3.0);
        let pose = Pose::from_position(Vec3::new(0.5, -1.0, 2.0))
            .with_rotation(Quat::from_rotation_y(0.7))
            .with_scale(Vec3::new(1.0, 2.0, 0.5));
        let cuboid = Shape::cuboid(half);
        let hull = Shape::hull(ConvexHull::cuboid(half));

        for direction in [Vec3::X, Vec3::NEG_Y, Vec3::new(0.3, -0.2, 0.9)] {
            let a = cuboid.support(direction, &pose);
            let b = hull.support(direction, &pose);
            assert!((a - b).length() < 1e-4, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_capsule_support() {
        let shape = Shape::capsule(0.5, 1.0);
        let pose = Pose::identity();
        let support = shape.support(Vec3::Y, &pose);
        assert!((support - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-5);
        let support = shape.support(Vec3::X, &pose);
        assert!((support.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_hull_rejects_bad_index() {
        let result = ConvexHull::with_faces(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 3]);
        assert_eq!(
            result,
            Err(PhysicsError::InvalidHullIndex { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_vertex_normals_point_outward() {
        let mut hull = ConvexHull::cuboid(Vec3::ONE);
        hull.compute_vertex_normals();
        let normals = hull.normals().unwrap();
        for (vertex, normal) in hull.vertices().iter().zip(normals) {
            assert!(vertex.dot(*normal) > 0.0, "{:?} / {:?}", vertex, normal);
        }

        hull.add_vertex(Vec3::new(0.0, 2.0, 0.0));
        assert!(hull.normals().is_none());
    }
}
