mod horizon;
mod initial_hull;
mod mesh;
mod outside_set;
mod predicates;
mod quickhull;
mod triangle_face;
mod validation;

pub use horizon::Horizon;
pub use initial_hull::{compute_epsilon, compute_extremes};
pub use mesh::{Mesh, Neighbor, VERTEX_STRIDE};
pub use predicates::{
    distance_to_plane, face_normal, is_on_positive_side, newell_normal, signed_plane_distance,
    squared_distance_point_to_segment,
};
pub use quickhull::{run_to_completion, HorizonPolicy, HullConfig, Phase, QuickHull};
pub use triangle_face::{Edge, FaceId, PointId, TriangleFace};
pub use validation::{validate_containment, validate_manifold, ValidationError};

use glam::Vec3A;
use thiserror::Error;

/// An error returned during [`ConvexHull3d`] construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvexHull3dError {
    /// At least four points are needed to span a volume.
    #[error("At least 4 points are required, got {0}.")]
    TooFewPoints(usize),
    /// The given point set cannot produce a hull with volume.
    #[error("Degenerate input: {0:?}.")]
    DegenerateInput(DegenerateInput),
    /// An input point has a NaN or infinite coordinate.
    #[error("Point {0} has a non-finite coordinate.")]
    InvalidPoint(PointId),
    /// The edges bounding the faces visible from the apex do not form a single closed loop.
    ///
    /// This usually means the input is numerically marginal for the current epsilon.
    #[error("The horizon seen from point {apex} is not a closed loop ({edges} edges).")]
    OpenHorizon {
        /// The apex of the failed iteration.
        apex: PointId,
        /// The number of horizon edges that were collected.
        edges: usize,
    },
    /// A face would reuse a directed edge that already belongs to another face.
    #[error("Edge {origin} -> {end} already belongs to another face.")]
    NonManifoldEdge {
        /// The start of the conflicting edge.
        origin: PointId,
        /// The end of the conflicting edge.
        end: PointId,
    },
    /// An error in the algorithm itself. Please report it as a bug
    /// with a minimal reproducible example.
    #[error("Internal error: {0}")]
    InternalError(&'static str),
}

/// The type of degeneracy for when attempting to compute a convex hull for a point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateInput {
    /// The input points are approximately equal.
    Coincident,
    /// The input points are approximately on the same line.
    Collinear,
    /// The input points are approximately on the same plane.
    Coplanar,
}

/// A 3D [convex hull] representing the smallest convex set containing
/// all input points in a given point set.
///
/// This can be thought of as a shrink wrapping of a 3D object.
///
/// [convex hull]: https://en.wikipedia.org/wiki/Convex_hull
///
/// # Example
///
/// ```
/// use glam::Vec3A;
/// use incremental_quickhull::{ConvexHull3d, HullConfig};
///
/// // Define a set of 3D points.
/// let points = vec![
///     Vec3A::new(0.0, 0.0, 0.0),
///     Vec3A::new(1.0, 0.0, 0.0),
///     Vec3A::new(0.0, 1.0, 0.0),
///     Vec3A::new(0.0, 0.0, 1.0),
///     Vec3A::new(0.1, 0.1, 0.1),
/// ];
///
/// // Compute the convex hull.
/// let hull = ConvexHull3d::try_from_points(&points, HullConfig::default()).unwrap();
///
/// // Get the vertices and indices of the convex hull.
/// let (vertices, indices) = hull.vertices_indices();
///
/// // The hull should be a tetrahedron with 4 vertices and 4 triangular faces.
/// assert_eq!(vertices.len(), 4);
/// assert_eq!(indices.len(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConvexHull3d {
    /// The points of the convex hull.
    points: Vec<Vec3A>,
    /// The faces of the convex hull.
    indices: Vec<[u32; 3]>,
}

impl ConvexHull3d {
    /// Attempts to compute a [`ConvexHull3d`] for the given set of points.
    ///
    /// # Errors
    ///
    /// Returns a [`ConvexHull3dError`] if hull construction fails.
    /// Possible errors include too few or degenerate points, and
    /// open horizons under [`HorizonPolicy::Strict`].
    pub fn try_from_points(
        points: &[Vec3A],
        config: HullConfig,
    ) -> Result<Self, ConvexHull3dError> {
        let mesh = run_to_completion(points, config)?;
        Ok(Self::from_mesh(&mesh, points))
    }

    /// Collects the faces of `mesh` and the points they use.
    ///
    /// Unused points are dropped and the remaining ones keep their relative order.
    pub fn from_mesh(mesh: &Mesh, points: &[Vec3A]) -> Self {
        let mut indices = mesh.triangles();
        let points = Self::remove_unused_points(points, &mut indices);
        Self { points, indices }
    }

    /// Returns the points of the convex hull.
    #[inline]
    pub fn points(&self) -> &[Vec3A] {
        &self.points
    }

    /// Returns the indices of the convex hull's faces.
    #[inline]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Returns the vertices and indices of the convex hull.
    ///
    /// This consumes the convex hull.
    #[inline]
    pub fn vertices_indices(self) -> (Vec<Vec3A>, Vec<[u32; 3]>) {
        (self.points, self.indices)
    }

    /// Keeps only the points referenced by `faces` and remaps the face indices accordingly.
    fn remove_unused_points(points: &[Vec3A], faces: &mut [[u32; 3]]) -> Vec<Vec3A> {
        let mut remap: Vec<Option<u32>> = vec![None; points.len()];
        for face in faces.iter() {
            for &i in face {
                remap[i as usize] = Some(0);
            }
        }

        let mut used = Vec::new();
        for (i, slot) in remap.iter_mut().enumerate() {
            if slot.is_some() {
                *slot = Some(used.len() as u32);
                used.push(points[i]);
            }
        }

        for face in faces.iter_mut() {
            for i in face.iter_mut() {
                if let Some(new_index) = remap[*i as usize] {
                    *i = new_index;
                }
            }
        }

        used
    }

    /// Computes the volume of the convex hull.
    #[inline]
    pub fn volume(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }

        // Any interior point works as the common apex; the vertex mean is one.
        let reference = self.points.iter().sum::<Vec3A>() / self.points.len() as f32;

        self.indices
            .iter()
            .map(|triangle| {
                let p0 = self.points[triangle[0] as usize] - reference;
                let p1 = self.points[triangle[1] as usize] - reference;
                let p2 = self.points[triangle[2] as usize] - reference;

                // Signed volume of the tetrahedron formed by the triangle and the reference.
                p0.dot(p1.cross(p2)) / 6.0
            })
            .sum()
    }

    /// Computes the point on the convex hull that is furthest in the given direction.
    ///
    /// Returns `None` for an empty hull.
    #[inline]
    pub fn support_point(&self, direction: Vec3A) -> Option<Vec3A> {
        let (first, rest) = self.points.split_first()?;
        let mut max = first.dot(direction);
        let mut support = *first;

        for point in rest {
            let dot_product = point.dot(direction);
            if dot_product > max {
                max = dot_product;
                support = *point;
            }
        }

        Some(support)
    }
}
