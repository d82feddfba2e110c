//! GJK intersection test over the Minkowski difference of two convex shapes.

use glam::Vec3;
use tracing::trace;

use crate::ecs::components::transform::Pose;

use super::shape::{Shape, ShapeKind};

/// Iteration cap for the GJK loop.
pub const GJK_MAX_ITERATIONS: usize = 32;

/// A vertex of the Minkowski difference together with its witnesses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupportPoint {
    /// Witness on shape A.
    pub a: Vec3,
    /// Witness on shape B.
    pub b: Vec3,
    /// `a - b`.
    pub c: Vec3,
}

impl SupportPoint {
    /// Support point of `A - B` along `direction`.
    #[inline]
    pub fn new(
        shape_a: &Shape,
        pose_a: &Pose,
        shape_b: &Shape,
        pose_b: &Pose,
        direction: Vec3,
    ) -> Self {
        let a = shape_a.support(direction, pose_a);
        let b = shape_b.support(-direction, pose_b);
        Self { a, b, c: a - b }
    }
}

/// Up to four support points, most recently added first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, dropping the oldest point if already full.
    pub fn push_front(&mut self, point: SupportPoint) {
        self.points = [point, self.points[0], self.points[1], self.points[2]];
        self.len = (self.len + 1).min(4);
    }

    fn set(&mut self, points: &[SupportPoint]) {
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }
}

/// Outcome of a GJK run.
#[derive(Debug, Clone, Copy)]
pub struct GjkResult {
    pub intersecting: bool,
    /// The enclosing tetrahedron when `intersecting`, otherwise the last simplex.
    pub simplex: Simplex,
    pub iterations: usize,
}

/// Decide whether two shapes overlap.
///
/// Planes are unbounded and have no support function, so any pair involving
/// a plane reports no intersection with an empty simplex. Use
/// [`detect_collision`](super::narrowphase::detect_collision) for those.
pub fn gjk(shape_a: &Shape, pose_a: &Pose, shape_b: &Shape, pose_b: &Pose) -> GjkResult {
    let mut simplex = Simplex::new();

    if shape_a.kind() == ShapeKind::Plane || shape_b.kind() == ShapeKind::Plane {
        trace!("gjk does not handle planes");
        return GjkResult {
            intersecting: false,
            simplex,
            iterations: 0,
        };
    }

    let first = SupportPoint::new(shape_a, pose_a, shape_b, pose_b, Vec3::X);
    simplex.push_front(first);
    let mut direction = -first.c;

    for iteration in 1..=GJK_MAX_ITERATIONS {
        let point = SupportPoint::new(shape_a, pose_a, shape_b, pose_b, direction);
        if point.c.dot(direction) <= 0.0 {
            return GjkResult {
                intersecting: false,
                simplex,
                iterations: iteration,
            };
        }

        simplex.push_front(point);
        if next_simplex(&mut simplex, &mut direction) {
            return GjkResult {
                intersecting: true,
                simplex,
                iterations: iteration,
            };
        }
    }

    trace!("gjk hit the iteration cap");
    GjkResult {
        intersecting: false,
        simplex,
        iterations: GJK_MAX_ITERATIONS,
    }
}

#[inline]
fn same_direction(direction: Vec3, ao: Vec3) -> bool {
    direction.dot(ao) > 0.0
}

/// Reduce the simplex to the feature nearest the origin and pick the next
/// search direction. Returns true once the origin is enclosed.
fn next_simplex(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    match simplex.len() {
        2 => line(simplex, direction),
        3 => triangle(simplex, direction),
        4 => tetrahedron(simplex, direction),
        _ => false,
    }
}

fn line(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let [a, b] = [simplex.points[0], simplex.points[1]];
    let ab = b.c - a.c;
    let ao = -a.c;

    if same_direction(ab, ao) {
        *direction = ab.cross(ao).cross(ab);
        // Origin on the segment itself: any perpendicular will do.
        if direction.length_squared() < 1e-12 {
            *direction = ab.normalize().any_orthonormal_vector();
        }
    } else {
        simplex.set(&[a]);
        *direction = ao;
    }
    false
}

fn triangle(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let [a, b, c] = [simplex.points[0], simplex.points[1], simplex.points[2]];
    let ab = b.c - a.c;
    let ac = c.c - a.c;
    let ao = -a.c;
    let abc = ab.cross(ac);

    if same_direction(abc.cross(ac), ao) {
        if same_direction(ac, ao) {
            simplex.set(&[a, c]);
            *direction = ac.cross(ao).cross(ac);
        } else {
            simplex.set(&[a, b]);
            return line(simplex, direction);
        }
    } else if same_direction(ab.cross(abc), ao) {
        simplex.set(&[a, b]);
        return line(simplex, direction);
    } else if same_direction(abc, ao) {
        *direction = abc;
    } else {
        simplex.set(&[a, c, b]);
        *direction = -abc;
    }
    false
}

fn tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let [a, b, c, d] = simplex.points;
    let ab = b.c - a.c;
    let ac = c.c - a.c;
    let ad = d.c - a.c;
    let ao = -a.c;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if same_direction(abc, ao) {
        simplex.set(&[a, b, c]);
        return triangle(simplex, direction);
    }
    if same_direction(acd, ao) {
        simplex.set(&[a, c, d]);
        return triangle(simplex, direction);
    }
    if same_direction(adb, ao) {
        simplex.set(&[a, d, b]);
        return triangle(simplex, direction);
    }

    true
}
