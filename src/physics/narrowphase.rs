//! Narrowphase collision detection: analytic fast paths and a shape-kind
//! dispatch table falling back to GJK + EPA.

use glam::Vec3;

use crate::ecs::components::transform::Pose;

use super::contact::ContactManifold;
use super::epa::epa;
use super::gjk::gjk;
use super::shape::{Shape, ShapeKind};

/// Pairwise test. Expects `kind(a) <= kind(b)`.
pub type CollisionFn = fn(&Shape, &Pose, &Shape, &Pose) -> Option<ContactManifold>;

/// Upper-triangular table of specialized tests, indexed by shape kind ordinal.
/// Empty cells use GJK + EPA.
const DISPATCH: [[Option<CollisionFn>; ShapeKind::COUNT]; ShapeKind::COUNT] = [
    // Plane
    [
        Some(plane_plane),
        Some(plane_sphere),
        Some(plane_convex),
        Some(plane_convex),
        Some(plane_convex),
    ],
    // Sphere
    [None, Some(sphere_sphere), None, None, None],
    // Capsule
    [None, None, None, None, None],
    // ConvexHull
    [None, None, None, None, None],
    // Cuboid
    [None, None, None, None, None],
];

/// Detect a collision between two posed shapes.
///
/// The returned normal always points from `shape_a` towards `shape_b`.
pub fn detect_collision(
    shape_a: &Shape,
    pose_a: &Pose,
    shape_b: &Shape,
    pose_b: &Pose,
) -> Option<ContactManifold> {
    if shape_a.kind() > shape_b.kind() {
        let mut manifold = dispatch(shape_b, pose_b, shape_a, pose_a)?;
        manifold.swap();
        return Some(manifold);
    }
    dispatch(shape_a, pose_a, shape_b, pose_b)
}

fn dispatch(
    shape_a: &Shape,
    pose_a: &Pose,
    shape_b: &Shape,
    pose_b: &Pose,
) -> Option<ContactManifold> {
    match DISPATCH[shape_a.kind().ordinal()][shape_b.kind().ordinal()] {
        Some(test) => test(shape_a, pose_a, shape_b, pose_b),
        None => gjk_epa(shape_a, pose_a, shape_b, pose_b),
    }
}

/// Generic convex-convex test.
pub fn gjk_epa(
    shape_a: &Shape,
    pose_a: &Pose,
    shape_b: &Shape,
    pose_b: &Pose,
) -> Option<ContactManifold> {
    let result = gjk(shape_a, pose_a, shape_b, pose_b);
    if !result.intersecting {
        return None;
    }
    epa(&result.simplex, shape_a, pose_a, shape_b, pose_b)
}

/// World-space point and unit normal of a plane shape.
fn plane_in_world(shape: &Shape, pose: &Pose) -> Option<(Vec3, Vec3)> {
    match shape {
        Shape::Plane { normal, distance } => {
            let local = normal.normalize_or_zero();
            let world_normal = (pose.rotation * local).normalize_or_zero();
            let point = pose.position + pose.rotation * local * *distance;
            Some((point, world_normal))
        }
        _ => None,
    }
}

/// Planes have no finite support and never collide with each other.
fn plane_plane(_: &Shape, _: &Pose, _: &Shape, _: &Pose) -> Option<ContactManifold> {
    None
}

/// Plane against sphere: project the center onto the plane normal.
pub fn plane_sphere(
    plane: &Shape,
    plane_pose: &Pose,
    sphere: &Shape,
    sphere_pose: &Pose,
) -> Option<ContactManifold> {
    let (plane_point, normal) = plane_in_world(plane, plane_pose)?;
    let (center, radius) = match sphere {
        Shape::Sphere { center, radius } => (
            sphere_pose.transform_point(*center),
            *radius * sphere_pose.max_scale(),
        ),
        _ => return None,
    };

    let distance = (center - plane_point).dot(normal);
    if distance > radius {
        return None;
    }

    let point_a = center - normal * distance;
    let point_b = center - normal * radius;
    Some(ContactManifold {
        point_a,
        point_b,
        normal,
        depth: radius - distance,
        contact_point: Some(point_a),
    })
}

/// Plane against any convex shape: the deepest point is the support along
/// the negated plane normal.
pub fn plane_convex(
    plane: &Shape,
    plane_pose: &Pose,
    convex: &Shape,
    convex_pose: &Pose,
) -> Option<ContactManifold> {
    let (plane_point, normal) = plane_in_world(plane, plane_pose)?;
    let deepest = convex.support(-normal, convex_pose);

    let depth = (plane_point - deepest).dot(normal);
    if depth < 0.0 {
        return None;
    }

    let point_a = deepest + normal * depth;
    Some(ContactManifold {
        point_a,
        point_b: deepest,
        normal,
        depth,
        contact_point: Some(point_a),
    })
}

/// Sphere against sphere: compare the center distance with the radius sum.
pub fn sphere_sphere(
    shape_a: &Shape,
    pose_a: &Pose,
    shape_b: &Shape,
    pose_b: &Pose,
) -> Option<ContactManifold> {
    let (center_a, radius_a, center_b, radius_b) = match (shape_a, shape_b) {
        (
            Shape::Sphere {
                center: ca,
                radius: ra,
            },
            Shape::Sphere {
                center: cb,
                radius: rb,
            },
        ) => (
            pose_a.transform_point(*ca),
            *ra * pose_a.max_scale(),
            pose_b.transform_point(*cb),
            *rb * pose_b.max_scale(),
        ),
        _ => return None,
    };

    let diff = center_b - center_a;
    let distance = diff.length();
    let radius_sum = radius_a + radius_b;
    if distance > radius_sum {
        return None;
    }

    let normal = if distance > 1e-6 { diff / distance } else { Vec3::Y };
    let point_a = center_a + normal * radius_a;
    let point_b = center_b - normal * radius_b;
    Some(ContactManifold {
        point_a,
        point_b,
        normal,
        depth: radius_sum - distance,
        contact_point: Some((point_a + point_b) * 0.5),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::ConvexHull;
    use glam::Quat;

    fn unit_sphere() -> Shape {
        Shape::sphere(Vec3::ZERO, 1.0)
    }

    #[test]
    fn test_sphere_sphere_intersection() {
        let a = Pose::identity();
        let b = Pose::from_position(Vec3::new(1.5, 0.0, 0.0));

        let m = detect_collision(&unit_sphere(), &a, &unit_sphere(), &b)
            .expect("spheres should collide");
        let eps = 1e-4;
        assert!((m.normal - Vec3::X).length() < eps, "normal = {:?}", m.normal);
        assert!((m.depth - 0.5).abs() < eps, "depth = {}", m.depth);
        assert!((m.point_a - Vec3::new(1.0, 0.0, 0.0)).length() < eps);
        assert!((m.point_b - Vec3::new(0.5, 0.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_sphere_sphere_no_intersection() {
        let a = Pose::identity();
        let b = Pose::from_position(Vec3::new(3.0, 0.0, 0.0));
        assert!(detect_collision(&unit_sphere(), &a, &unit_sphere(), &b).is_none());
    }

    #[test]
    fn test_sphere_below_plane_reach() {
        let plane = Shape::plane(Vec3::Y, -2.0);
        let pose = Pose::identity();
        assert!(detect_collision(&unit_sphere(), &pose, &plane, &pose).is_none());
        assert!(detect_collision(&plane, &pose, &unit_sphere(), &pose).is_none());
    }

    #[test]
    fn test_plane_sphere_contact() {
        let plane = Shape::plane(Vec3::Y, 0.0);
        let sphere_pose = Pose::from_position(Vec3::new(2.0, 0.75, 0.0));

        let m = detect_collision(&plane, &Pose::identity(), &unit_sphere(), &sphere_pose)
            .expect("sphere should touch the plane");
        let eps = 1e-5;
        assert!((m.depth - 0.25).abs() < eps);
        assert!((m.normal - Vec3::Y).length() < eps);
        assert!((m.point_a - Vec3::new(2.0, 0.0, 0.0)).length() < eps);
        assert!((m.point_b - Vec3::new(2.0, -0.25, 0.0)).length() < eps);
    }

    #[test]
    fn test_swapped_operands_flip_normal() {
        let plane = Shape::plane(Vec3::Y, 0.0);
        let sphere_pose = Pose::from_position(Vec3::new(0.0, 0.5, 0.0));

        let forward = detect_collision(&plane, &Pose::identity(), &unit_sphere(), &sphere_pose)
            .unwrap();
        let reverse = detect_collision(&unit_sphere(), &sphere_pose, &plane, &Pose::identity())
            .unwrap();

        assert_eq!(reverse.normal, -forward.normal);
        assert_eq!(reverse.point_a, forward.point_b);
        assert_eq!(reverse.point_b, forward.point_a);
        assert_eq!(reverse.depth, forward.depth);
    }

    #[test]
    fn test_rotated_plane() {
        // Plane normal +Y rotated a quarter turn about Z faces -X.
        let plane = Shape::plane(Vec3::Y, 1.0);
        let plane_pose =
            Pose::identity().with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let sphere_pose = Pose::from_position(Vec3::new(-1.5, 0.0, 0.0));

        let m = detect_collision(&plane, &plane_pose, &unit_sphere(), &sphere_pose)
            .expect("sphere should touch the rotated plane");
        let eps = 1e-5;
        assert!((m.normal - Vec3::NEG_X).length() < eps, "normal = {:?}", m.normal);
        assert!((m.depth - 0.5).abs() < eps, "depth = {}", m.depth);
    }

    #[test]
    fn test_plane_plane_never_collides() {
        let plane = Shape::plane(Vec3::Y, 0.0);
        let pose = Pose::identity();
        assert!(detect_collision(&plane, &pose, &plane, &pose).is_none());
    }

    #[test]
    fn test_plane_hull() {
        let plane = Shape::plane(Vec3::Y, 0.0);
        let cube = Shape::hull(ConvexHull::cuboid(Vec3::splat(0.5)));

        let resting = Pose::from_position(Vec3::new(0.0, 0.4, 0.0));
        let m = detect_collision(&plane, &Pose::identity(), &cube, &resting).unwrap();
        assert!((m.depth - 0.1).abs() < 1e-5, "depth = {}", m.depth);
        assert!((m.point_b.y + 0.1).abs() < 1e-5);

        let above = Pose::from_position(Vec3::new(0.0, 0.6, 0.0));
        assert!(detect_collision(&plane, &Pose::identity(), &cube, &above).is_none());
    }

    #[test]
    fn test_plane_capsule_and_cuboid() {
        let plane = Shape::plane(Vec3::Y, 0.0);
        let pose = Pose::from_position(Vec3::new(0.0, 1.0, 0.0));

        let capsule = Shape::capsule(0.5, 0.75);
        let m = detect_collision(&capsule, &pose, &plane, &Pose::identity()).unwrap();
        assert!((m.depth - 0.25).abs() < 1e-5, "depth = {}", m.depth);
        assert!((m.normal - Vec3::NEG_Y).length() < 1e-5);

        let cuboid = Shape::cuboid(Vec3::new(1.0, 0.5, 1.0));
        assert!(detect_collision(&plane, &Pose::identity(), &cuboid, &pose).is_none());
    }

    #[test]
    fn test_hull_hull_uses_gjk_epa() {
        let cube = Shape::hull(ConvexHull::cuboid(Vec3::splat(0.5)));
        let a = Pose::identity();
        let b = Pose::from_position(Vec3::new(0.0, 0.9, 0.0));

        let m = detect_collision(&cube, &a, &cube, &b).expect("cubes overlap");
        assert!(m.normal.y > 0.99, "normal = {:?}", m.normal);
        assert!((m.depth - 0.101).abs() < 1e-3, "depth = {}", m.depth);
        assert!(m.contact_point.is_some());
    }

    #[test]
    fn test_cuboid_vs_sphere_swapped_kinds() {
        // Cuboid (4) vs sphere (1) is dispatched as sphere vs cuboid and swapped back.
        let cuboid = Shape::cuboid(Vec3::splat(1.0));
        let sphere_pose = Pose::from_position(Vec3::new(0.3, 1.6, 0.2));

        let m = detect_collision(&cuboid, &Pose::identity(), &unit_sphere(), &sphere_pose)
            .expect("sphere rests in the cuboid top");
        assert!(m.normal.y > 0.9, "normal = {:?}", m.normal);
        assert!((m.depth - 0.4).abs() < 0.02, "depth = {}", m.depth);
    }
}
