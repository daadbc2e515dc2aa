//! Geometric predicates shared by every stage of hull construction.
//!
//! All side tests go through [`is_on_positive_side`] with the run's epsilon.
//! The unsigned [`distance_to_plane`] is only used to rank candidates.

use glam::Vec3A;

/// Squared sine of the smallest angle below which a triangle is treated as degenerate.
const DEGENERATE_SIN_SQ: f32 = (f32::EPSILON * 100.0) * (f32::EPSILON * 100.0);

/// Accumulates the unnormalized normal of a triangle with Newell's method.
#[inline]
pub fn newell_normal(triangle: [Vec3A; 3]) -> Vec3A {
    let mut normal = Vec3A::ZERO;

    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    normal
}

/// Computes the unit normal of a triangle.
///
/// Returns `None` for near-zero-area triangles, whose normal is undefined.
#[inline]
pub fn face_normal(triangle: [Vec3A; 3]) -> Option<Vec3A> {
    let [a, b, c] = triangle;
    let scaled_normal = newell_normal(triangle);

    // Compare against the edge lengths so the test does not depend on the scale of the input.
    let reference = (b - a).length_squared() * (c - a).length_squared();
    if scaled_normal.length_squared() <= DEGENERATE_SIN_SQ * reference {
        return None;
    }

    scaled_normal.try_normalize()
}

/// Returns the centroid of a triangle.
#[inline]
pub fn triangle_centroid([a, b, c]: [Vec3A; 3]) -> Vec3A {
    (a + b + c) / 3.0
}

/// Signed distance of `point` from the plane through `centroid` with the given unit `normal`.
#[inline]
pub fn signed_plane_distance(normal: Vec3A, centroid: Vec3A, point: Vec3A) -> f32 {
    normal.dot(point) - normal.dot(centroid)
}

/// Unsigned distance of `point` from the plane through `centroid` with the given unit `normal`.
#[inline]
pub fn distance_to_plane(normal: Vec3A, centroid: Vec3A, point: Vec3A) -> f32 {
    signed_plane_distance(normal, centroid, point).abs()
}

/// Whether `point` lies strictly in front of the plane, by more than `epsilon`.
#[inline]
pub fn is_on_positive_side(normal: Vec3A, centroid: Vec3A, point: Vec3A, epsilon: f32) -> bool {
    signed_plane_distance(normal, centroid, point) > epsilon
}

/// Squared distance from `c` to the segment between `a` and `b`.
pub fn squared_distance_point_to_segment(a: Vec3A, b: Vec3A, c: Vec3A) -> f32 {
    let ab = b - a;
    let ac = c - a;
    let bc = c - b;

    let e = ac.dot(ab);
    if e <= 0.0 {
        return ac.dot(ac);
    }

    let f = ab.dot(ab);
    if e >= f {
        return bc.dot(bc);
    }

    ac.dot(ac) - e * e / f
}
