//! Expanding polytope algorithm: penetration depth, normal and witness points
//! from an enclosing GJK simplex.

use glam::Vec3;
use tracing::trace;

use crate::ecs::components::transform::Pose;

use super::contact::ContactManifold;
use super::gjk::{Simplex, SupportPoint};
use super::shape::{Shape, ShapeKind};

/// Iteration cap for polytope expansion.
pub const EPA_MAX_ITERATIONS: usize = 32;
/// Convergence tolerance on the support distance.
pub const EPA_TOLERANCE: f32 = 0.001;
/// Added to the converged distance so resting contacts keep a positive depth.
pub const EPA_DEPTH_BIAS: f32 = 0.001;

/// Outward unit normal and origin distance of a face.
#[derive(Debug, Clone, Copy)]
struct FaceNormal {
    normal: Vec3,
    distance: f32,
}

/// Convex polytope around the origin, faces wound outward.
#[derive(Debug, Clone)]
pub struct Polytope {
    vertices: Vec<SupportPoint>,
    faces: Vec<[usize; 3]>,
    normals: Vec<FaceNormal>,
}

impl Polytope {
    /// Tetrahedral polytope from an enclosing simplex.
    fn from_simplex(simplex: &Simplex) -> Self {
        let mut polytope = Self {
            vertices: simplex.points().to_vec(),
            faces: Vec::with_capacity(16),
            normals: Vec::with_capacity(16),
        };
        for face in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
            polytope.push_face(face);
        }
        polytope
    }

    /// Append a face, flipping its winding so the normal faces away from the origin.
    fn push_face(&mut self, mut face: [usize; 3]) {
        let [a, b, c] = face.map(|i| self.vertices[i].c);
        let normal = (b - a).cross(c - a);
        let length = normal.length();

        let entry = if length < 1e-10 {
            // Sliver. Never the closest face and never visible.
            FaceNormal {
                normal: Vec3::ZERO,
                distance: f32::INFINITY,
            }
        } else {
            let mut normal = normal / length;
            let mut distance = normal.dot(a);
            if distance < 0.0 {
                normal = -normal;
                distance = -distance;
                face.swap(1, 2);
            }
            FaceNormal { normal, distance }
        };

        self.faces.push(face);
        self.normals.push(entry);
    }

    fn closest_face(&self) -> Option<usize> {
        self.normals
            .iter()
            .enumerate()
            .filter(|(_, n)| n.distance.is_finite())
            .min_by(|(_, x), (_, y)| x.distance.total_cmp(&y.distance))
            .map(|(i, _)| i)
    }

    /// Remove every face that can see `point`, returning the horizon edges.
    fn carve(&mut self, point: Vec3) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < self.faces.len() {
            let face = self.faces[i];
            let n = self.normals[i];
            if n.normal.dot(point - self.vertices[face[0]].c) > 0.0 {
                add_unique_edge(&mut edges, face[0], face[1]);
                add_unique_edge(&mut edges, face[1], face[2]);
                add_unique_edge(&mut edges, face[2], face[0]);
                self.faces.swap_remove(i);
                self.normals.swap_remove(i);
            } else {
                i += 1;
            }
        }
        edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// An edge shared by two removed faces appears once in each direction and cancels.
fn add_unique_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    if let Some(pos) = edges.iter().position(|&e| e == (b, a)) {
        edges.swap_remove(pos);
    } else {
        edges.push((a, b));
    }
}

/// Barycentric weights of `p` (assumed in the plane) over triangle `abc`.
fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-12 {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Vec3::new(1.0 - v - w, v, w))
}

/// Expand the enclosing `simplex` into the contact between two shapes.
///
/// Returns `None` when the simplex is not a tetrahedron, either shape is a
/// plane, or the geometry is degenerate. If the distance has not settled within the iteration cap the
/// closest face found so far is used, which never overstates the depth.
pub fn epa(
    simplex: &Simplex,
    shape_a: &Shape,
    pose_a: &Pose,
    shape_b: &Shape,
    pose_b: &Pose,
) -> Option<ContactManifold> {
    if simplex.len() != 4 {
        trace!(len = simplex.len(), "epa needs a tetrahedron");
        return None;
    }
    if shape_a.kind() == ShapeKind::Plane || shape_b.kind() == ShapeKind::Plane {
        trace!("epa does not handle planes");
        return None;
    }

    let mut polytope = Polytope::from_simplex(simplex);

    for _ in 0..EPA_MAX_ITERATIONS {
        let Some(closest) = polytope.closest_face() else {
            trace!("epa polytope has no usable face");
            return None;
        };
        let FaceNormal { normal, distance } = polytope.normals[closest];

        let support = SupportPoint::new(shape_a, pose_a, shape_b, pose_b, normal);
        if support.c.dot(normal) - distance < EPA_TOLERANCE {
            return contact_from_face(&polytope, closest);
        }

        let edges = polytope.carve(support.c);
        if edges.is_empty() {
            trace!("epa found no horizon edges");
            return None;
        }

        let index = polytope.vertices.len();
        polytope.vertices.push(support);
        for (a, b) in edges {
            polytope.push_face([a, b, index]);
        }
    }

    trace!(
        vertices = polytope.vertex_count(),
        "epa did not converge within the iteration cap"
    );
    let closest = polytope.closest_face()?;
    contact_from_face(&polytope, closest)
}

fn contact_from_face(polytope: &Polytope, face: usize) -> Option<ContactManifold> {
    let FaceNormal { normal, distance } = polytope.normals[face];
    let [p0, p1, p2] = polytope.faces[face].map(|i| polytope.vertices[i]);

    let Some(weights) = barycentric(normal * distance, p0.c, p1.c, p2.c) else {
        trace!("epa closest face is degenerate");
        return None;
    };

    let point_a = p0.a * weights.x + p1.a * weights.y + p2.a * weights.z;
    let point_b = p0.b * weights.x + p1.b * weights.y + p2.b * weights.z;

    Some(ContactManifold {
        point_a,
        point_b,
        normal,
        depth: distance + EPA_DEPTH_BIAS,
        contact_point: Some((point_a + point_b) * 0.5),
    })
}
