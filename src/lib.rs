//! # Incremental Quickhull
//!
//! A steppable implementation of the 3D Quickhull algorithm for computing convex hulls of point sets.
//!
//! Construction is a small state machine: every call to [`QuickHull::step`] runs one phase
//! (pick the next apex, find its horizon, or replace the visible faces) and leaves behind a
//! closed, outward-facing triangle mesh. This makes it possible to inspect or draw the hull
//! while it grows, or to simply [`run`](QuickHull::run) it to completion.
//!
//! For the finished hull only, use [`ConvexHull3d::try_from_points`].
//!
//! ## References
//!
//! - C. Bradford Barber et al. 1996. [The Quickhull Algorithm for Convex Hulls](https://www.cise.ufl.edu/~ungor/courses/fall06/papers/QuickHull.pdf) (the original paper)
//! - Dirk Gregorius. GDC 2014. [Physics for Game Programmers: Implementing Quickhull](https://archive.org/details/GDC2014Gregorius)

#![warn(missing_docs)]

mod dim3;
mod fixed_hasher;

pub use dim3::{
    compute_epsilon, compute_extremes, distance_to_plane, face_normal, is_on_positive_side,
    newell_normal, run_to_completion, signed_plane_distance, squared_distance_point_to_segment,
    validate_containment, validate_manifold, ConvexHull3d, ConvexHull3dError, DegenerateInput,
    Edge, FaceId, Horizon, HorizonPolicy, HullConfig, Mesh, Neighbor, Phase, PointId, QuickHull,
    TriangleFace, ValidationError, VERTEX_STRIDE,
};
