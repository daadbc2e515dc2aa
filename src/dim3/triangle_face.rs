use glam::Vec3A;

use crate::{
    dim3::predicates::{
        distance_to_plane, face_normal, is_on_positive_side, signed_plane_distance,
        triangle_centroid,
    },
    fixed_hasher::hash_one,
};

/// The index of a point in the input point set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u32);

impl PointId {
    /// Returns the underlying index of the point as a `usize`.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for PointId {
    #[inline]
    fn from(value: u32) -> Self {
        PointId(value)
    }
}

impl core::fmt::Display for PointId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

slotmap::new_key_type! {
    /// A stable handle to a [`TriangleFace`] in a [`Mesh`](crate::Mesh).
    ///
    /// Handles are generational: once the face is removed, the handle no longer
    /// resolves, even if its slot is reused by a later face.
    pub struct FaceId;
}

/// A directed edge between two points, from `origin` to `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The point the edge starts at.
    pub origin: PointId,
    /// The point the edge ends at.
    pub end: PointId,
}

impl Edge {
    /// Creates a new directed edge.
    #[inline]
    pub const fn new(origin: PointId, end: PointId) -> Self {
        Self { origin, end }
    }

    /// Returns the same edge traversed in the opposite direction.
    #[inline]
    pub const fn reversed(self) -> Self {
        Self {
            origin: self.end,
            end: self.origin,
        }
    }
}

/// A triangular face of the hull under construction.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleFace {
    /// The points that make up the face, wound counterclockwise around the normal.
    pub(crate) points: [PointId; 3],
    /// The unit normal, or zero if the triangle is degenerate.
    pub(crate) normal: Vec3A,
    /// The centroid of the triangle.
    pub(crate) centroid: Vec3A,
    /// Whether the points of the face are affinely dependent,
    /// meaning they lie on a single line or point.
    pub(crate) degenerate: bool,
    /// The points in front of the face plane by more than epsilon.
    pub(crate) outside_points: Vec<PointId>,
    /// RGBA color for debug rendering.
    pub(crate) color: [f32; 4],
    /// Transient flag used by the horizon search.
    pub(crate) visited: bool,
}

impl TriangleFace {
    /// Creates a [`TriangleFace`] using the `points` with the given `indices`.
    pub fn from_triangle(points: &[Vec3A], indices: [PointId; 3]) -> Self {
        let mut face = Self {
            points: indices,
            normal: Vec3A::ZERO,
            centroid: Vec3A::ZERO,
            degenerate: false,
            outside_points: Vec::new(),
            color: debug_color(indices),
            visited: false,
        };
        face.update_geometry(points);
        face
    }

    /// Recomputes the normal and centroid from the current winding.
    fn update_geometry(&mut self, points: &[Vec3A]) {
        let triangle = self.points.map(|id| points[id.index()]);
        self.centroid = triangle_centroid(triangle);

        let Some(mut normal) = face_normal(triangle) else {
            tracing::warn!(points = ?self.points, "degenerate face has no normal");
            self.degenerate = true;
            self.normal = Vec3A::ZERO;
            return;
        };

        // The winding about the centroid must agree with the normal.
        let [a, b, _] = triangle;
        let winding = normal.dot((a - self.centroid).cross(b - self.centroid));
        if winding < 0.0 {
            normal = -normal;
        }

        self.degenerate = false;
        self.normal = normal;
    }

    /// Reverses the winding by swapping the first two points and recomputes the normal.
    pub fn flip(&mut self, points: &[Vec3A]) {
        self.points.swap(0, 1);
        self.update_geometry(points);
    }

    /// Returns the indices of the face's points.
    #[inline]
    pub fn points(&self) -> [PointId; 3] {
        self.points
    }

    /// Returns the unit normal of the face.
    ///
    /// Degenerate faces report a zero normal; see [`TriangleFace::is_degenerate`].
    #[inline]
    pub fn normal(&self) -> Vec3A {
        self.normal
    }

    /// Returns the centroid of the face.
    #[inline]
    pub fn centroid(&self) -> Vec3A {
        self.centroid
    }

    /// Whether the face's points are (nearly) collinear.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Returns the points currently assigned to this face's outside set.
    #[inline]
    pub fn outside_points(&self) -> &[PointId] {
        &self.outside_points
    }

    /// Returns the face's debug color.
    #[inline]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Returns the three directed edges of the face in winding order.
    #[inline]
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.points;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Whether the face uses the given point as a vertex.
    #[inline]
    pub fn contains_point(&self, point: PointId) -> bool {
        self.points.contains(&point)
    }

    /// Signed distance of `point` from the face plane.
    #[inline]
    pub fn signed_distance(&self, point: Vec3A) -> f32 {
        signed_plane_distance(self.normal, self.centroid, point)
    }

    /// Unsigned distance of `point` from the face plane.
    #[inline]
    pub fn distance(&self, point: Vec3A) -> f32 {
        distance_to_plane(self.normal, self.centroid, point)
    }

    /// Whether `point` lies in front of the face by more than `epsilon`.
    ///
    /// Degenerate faces have a zero normal and never see any point.
    #[inline]
    pub fn is_on_positive_side(&self, point: Vec3A, epsilon: f32) -> bool {
        is_on_positive_side(self.normal, self.centroid, point, epsilon)
    }
}

/// Pseudo-random but deterministic color for a triangle, with half transparency.
fn debug_color(indices: [PointId; 3]) -> [f32; 4] {
    let hash = hash_one(indices);
    let channel = |shift: u32| ((hash >> shift) & 0xff) as f32 / 255.0;
    [channel(0), channel(8), channel(16), 0.5]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(indices: [u32; 3]) -> [PointId; 3] {
        indices.map(PointId)
    }

    #[test]
    fn inner_outer_test() {
        let points = vec![
            Vec3A::new(1.0, 0.0, 0.0),
            Vec3A::new(0.0, 1.0, 0.0),
            Vec3A::new(0.0, 0.0, 1.0),
        ];
        let face = TriangleFace::from_triangle(&points, ids([0, 1, 2]));

        let outer_point = Vec3A::new(0.0, 0.0, 10.0);
        let inner_point = Vec3A::new(0.0, 0.0, 0.0);
        let within_point = Vec3A::new(1.0, 0.0, 0.0);

        assert!(face.is_on_positive_side(outer_point, 1e-5));
        assert!(!face.is_on_positive_side(inner_point, 1e-5));
        assert!(!face.is_on_positive_side(within_point, 1e-5));
        assert!(face.signed_distance(inner_point) < 0.0);
        assert!(face.distance(inner_point) > 0.0);
    }

    #[test]
    fn flip_reverses_normal() {
        let points = vec![Vec3A::ZERO, Vec3A::X, Vec3A::Y];
        let mut face = TriangleFace::from_triangle(&points, ids([0, 1, 2]));
        assert_eq!(face.normal(), Vec3A::Z);

        face.flip(&points);
        assert_eq!(face.points(), ids([1, 0, 2]));
        assert_eq!(face.normal(), Vec3A::NEG_Z);
        assert_eq!(face.centroid(), Vec3A::new(1.0 / 3.0, 1.0 / 3.0, 0.0));
    }

    #[test]
    fn edges_follow_winding() {
        let points = vec![Vec3A::ZERO, Vec3A::X, Vec3A::Y];
        let face = TriangleFace::from_triangle(&points, ids([0, 1, 2]));
        let [ab, bc, ca] = face.edges();
        assert_eq!(ab, Edge::new(PointId(0), PointId(1)));
        assert_eq!(bc, Edge::new(PointId(1), PointId(2)));
        assert_eq!(ca, Edge::new(PointId(2), PointId(0)));
        assert_eq!(ab.reversed(), Edge::new(PointId(1), PointId(0)));
    }

    #[test]
    fn degenerate_face_sees_nothing() {
        let points = vec![Vec3A::ZERO, Vec3A::X, Vec3A::X * 2.0, Vec3A::splat(5.0)];
        let face = TriangleFace::from_triangle(&points, ids([0, 1, 2]));
        assert!(face.is_degenerate());
        assert_eq!(face.normal(), Vec3A::ZERO);
        assert!(!face.is_on_positive_side(points[3], 0.0));
    }

    #[test]
    fn debug_color_is_stable_and_translucent() {
        let points = vec![Vec3A::ZERO, Vec3A::X, Vec3A::Y];
        let a = TriangleFace::from_triangle(&points, ids([0, 1, 2]));
        let b = TriangleFace::from_triangle(&points, ids([0, 1, 2]));
        assert_eq!(a.color(), b.color());
        assert_eq!(a.color()[3], 0.5);
        assert!(a.color()[..3].iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
