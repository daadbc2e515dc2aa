use glam::Vec3A;
use thiserror::Error;

use crate::dim3::{
    mesh::Mesh,
    triangle_face::{FaceId, PointId},
};

/// A defect found when checking a finished mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A directed edge has no oppositely oriented partner.
    #[error("edge {origin} -> {end} has no opposite half-edge")]
    UnpairedEdge {
        /// The start of the unpaired edge.
        origin: PointId,
        /// The end of the unpaired edge.
        end: PointId,
    },
    /// The half-edge map disagrees with a face about who owns an edge.
    #[error("edge {origin} -> {end} is not registered to its face")]
    InconsistentEdge {
        /// The start of the edge.
        origin: PointId,
        /// The end of the edge.
        end: PointId,
    },
    /// A point lies in front of a face by more than the tolerance.
    #[error("point {point} lies {distance} in front of a hull face")]
    PointOutside {
        /// The offending point.
        point: PointId,
        /// The face it lies in front of.
        face: FaceId,
        /// The signed distance from the face plane.
        distance: f32,
    },
}

/// Checks that the mesh is a closed 2-manifold: every directed edge belongs to
/// exactly one face and its reverse to exactly one other face.
///
/// # Errors
///
/// Returns the first defect found.
pub fn validate_manifold(mesh: &Mesh) -> Result<(), ValidationError> {
    for (id, face) in mesh.iter() {
        for edge in face.edges() {
            if mesh.edge_owner(edge) != Some(id) {
                return Err(ValidationError::InconsistentEdge {
                    origin: edge.origin,
                    end: edge.end,
                });
            }

            match mesh.neighbor(edge) {
                Some(other) if other != id => {}
                _ => {
                    return Err(ValidationError::UnpairedEdge {
                        origin: edge.origin,
                        end: edge.end,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Checks that no point lies in front of any non-degenerate face by more than `epsilon`.
///
/// Degenerate faces have no normal and are skipped. Coplanar caps may be split into
/// near-collinear slivers whose normals carry more rounding error than the run's
/// epsilon, so inputs with large flat regions can fail this check at the run's
/// tolerance while the mesh is still closed. Pass a looser `epsilon` for such inputs.
///
/// # Errors
///
/// Returns the first point found outside the hull.
pub fn validate_containment(
    mesh: &Mesh,
    points: &[Vec3A],
    epsilon: f32,
) -> Result<(), ValidationError> {
    for (id, face) in mesh.iter().filter(|(_, f)| !f.is_degenerate()) {
        for (i, &point) in points.iter().enumerate() {
            let distance = face.signed_distance(point);
            if distance > epsilon {
                return Err(ValidationError::PointOutside {
                    point: PointId(i as u32),
                    face: id,
                    distance,
                });
            }
        }
    }

    Ok(())
}
