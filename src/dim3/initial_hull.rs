use glam::Vec3A;

use crate::dim3::{
    mesh::Mesh,
    predicates::squared_distance_point_to_segment,
    triangle_face::{FaceId, PointId, TriangleFace},
    ConvexHull3dError, DegenerateInput,
};

/// The seed tetrahedron and the tolerance fixed for the rest of the run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialSimplex {
    /// The four seed faces, in creation order.
    pub faces: [FaceId; 4],
    /// The four seed vertices.
    pub vertices: [PointId; 4],
    /// Tolerance used by every side test of the run.
    pub epsilon: f32,
}

/// Computes the indices of the points with the minimum and maximum coordinate along each axis,
/// ordered as `[min x, max x, min y, max y, min z, max z]`.
///
/// Ties resolve to the earliest point.
pub fn compute_extremes(points: &[Vec3A]) -> [PointId; 6] {
    let mut extremes = [PointId(0); 6];
    let Some(first) = points.first() else {
        return extremes;
    };

    let mut min = *first;
    let mut max = *first;

    for (i, point) in points.iter().enumerate().skip(1) {
        for axis in 0..3 {
            if point[axis] < min[axis] {
                min[axis] = point[axis];
                extremes[2 * axis] = PointId(i as u32);
            }
            if point[axis] > max[axis] {
                max[axis] = point[axis];
                extremes[2 * axis + 1] = PointId(i as u32);
            }
        }
    }

    extremes
}

/// Derives the side-test tolerance from the magnitude of the extreme coordinates.
///
/// `scale * (max|x| + max|y| + max|z|) * f32::EPSILON`
pub fn compute_epsilon(points: &[Vec3A], extremes: &[PointId; 6], scale: f32) -> f32 {
    let magnitude: f32 = (0..3)
        .map(|axis| {
            let min = points[extremes[2 * axis].index()][axis].abs();
            let max = points[extremes[2 * axis + 1].index()][axis].abs();
            min.max(max)
        })
        .sum();

    scale * magnitude * f32::EPSILON
}

/// Builds the seed tetrahedron from the extreme points and adds its faces to `mesh`.
///
/// # Errors
///
/// Returns [`ConvexHull3dError::TooFewPoints`] for fewer than four points, and
/// [`ConvexHull3dError::DegenerateInput`] if the points do not span a volume
/// larger than the derived tolerance.
pub fn init_tetrahedron(
    points: &[Vec3A],
    mesh: &mut Mesh,
    epsilon_scale: f32,
) -> Result<InitialSimplex, ConvexHull3dError> {
    if points.len() < 4 {
        return Err(ConvexHull3dError::TooFewPoints(points.len()));
    }

    let extremes = compute_extremes(points);
    let epsilon = compute_epsilon(points, &extremes, epsilon_scale);

    // The first two vertices are the extreme points farthest apart.
    let mut max_distance = 0.0;
    let mut base = (extremes[0], extremes[1]);
    for (i, &a) in extremes.iter().enumerate() {
        for &b in &extremes[i + 1..] {
            let distance = points[a.index()].distance(points[b.index()]);
            if distance > max_distance {
                max_distance = distance;
                base = (a, b);
            }
        }
    }
    let (p1, p2) = base;

    if max_distance <= epsilon {
        return Err(ConvexHull3dError::DegenerateInput(
            DegenerateInput::Coincident,
        ));
    }

    // The third vertex is the one farthest from the segment between the first two.
    let mut max_squared_distance = 0.0;
    let mut p3 = p1;
    for (i, &point) in points.iter().enumerate() {
        let squared_distance =
            squared_distance_point_to_segment(points[p1.index()], points[p2.index()], point);
        if squared_distance > max_squared_distance {
            max_squared_distance = squared_distance;
            p3 = PointId(i as u32);
        }
    }

    let mut face = TriangleFace::from_triangle(points, [p1, p2, p3]);
    if max_squared_distance.sqrt() <= epsilon || face.is_degenerate() {
        return Err(ConvexHull3dError::DegenerateInput(
            DegenerateInput::Collinear,
        ));
    }

    // The fourth vertex is the one farthest from the plane of the first three.
    let mut max_plane_distance = 0.0;
    let mut p4 = p1;
    for (i, &point) in points.iter().enumerate() {
        let id = PointId(i as u32);
        if face.contains_point(id) {
            continue;
        }

        let distance = face.distance(point);
        if distance > max_plane_distance {
            max_plane_distance = distance;
            p4 = id;
        }
    }

    if max_plane_distance <= epsilon {
        return Err(ConvexHull3dError::DegenerateInput(
            DegenerateInput::Coplanar,
        ));
    }

    // Orient the base so that the apex is behind it, then close the tetrahedron
    // with the winding that matches the base.
    let triangles = if face.is_on_positive_side(points[p4.index()], epsilon) {
        face.flip(points);
        [
            [p2, p1, p3],
            [p1, p4, p3],
            [p4, p2, p3],
            [p1, p2, p4],
        ]
    } else {
        [
            [p1, p2, p3],
            [p4, p1, p3],
            [p2, p4, p3],
            [p2, p1, p4],
        ]
    };
    debug_assert_eq!(face.points(), triangles[0]);

    let mut faces = [FaceId::default(); 4];
    for (slot, [a, b, c]) in faces.iter_mut().zip(triangles) {
        *slot = mesh.add_face(points, a, b, c)?;
    }

    tracing::debug!(
        vertices = ?[p1, p2, p3, p4],
        epsilon,
        "built initial tetrahedron"
    );

    Ok(InitialSimplex {
        faces,
        vertices: [p1, p2, p3, p4],
        epsilon,
    })
}
