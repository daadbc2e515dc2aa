use glam::Vec3A;

use crate::dim3::{
    mesh::Mesh,
    triangle_face::{FaceId, PointId},
};

/// Tracks which points are currently claimed by some face's outside set.
///
/// The outside sets themselves live on the faces. A point is in at most one of them.
#[derive(Clone, Debug, Default)]
pub struct OutsideSets {
    assigned: Vec<bool>,
}

impl OutsideSets {
    /// Creates a tracker where none of the `num_points` points are assigned.
    pub fn new(num_points: usize) -> Self {
        Self {
            assigned: vec![false; num_points],
        }
    }

    /// Whether the point is in some face's outside set.
    ///
    /// Indices outside the point set are never assigned.
    #[inline]
    pub fn is_assigned(&self, point: PointId) -> bool {
        self.assigned.get(point.index()).copied().unwrap_or(false)
    }

    /// Distributes every unassigned, non-vertex point over `faces` in order.
    ///
    /// The first face that has the point on its positive side claims it.
    /// Points behind every face stay unassigned for good.
    pub fn assign_all(&mut self, mesh: &mut Mesh, faces: &[FaceId], points: &[Vec3A], epsilon: f32) {
        let mut unassigned: Vec<PointId> = (0..points.len() as u32)
            .map(PointId)
            .filter(|&p| !self.is_assigned(p) && !mesh.is_vertex(p))
            .collect();

        for &id in faces {
            if unassigned.is_empty() {
                break;
            }
            let Some(face) = mesh.face_mut(id) else {
                continue;
            };

            unassigned.retain(|&p| {
                if face.is_on_positive_side(points[p.index()], epsilon) {
                    face.outside_points.push(p);
                    self.assigned[p.index()] = true;
                    false
                } else {
                    true
                }
            });
        }

        tracing::debug!(
            unassigned = unassigned.len(),
            faces = faces.len(),
            "assigned points to outside sets"
        );
    }

    /// Marks the given points as no longer claimed by any face.
    pub fn release(&mut self, released: &[PointId]) {
        for p in released {
            self.assigned[p.index()] = false;
        }
    }

    /// Offers previously released points to the freshly created `faces`.
    ///
    /// Points that already became mesh vertices are skipped. Points no new face
    /// can see are inside the hull and are dropped.
    pub fn reassign(
        &mut self,
        mesh: &mut Mesh,
        faces: &[FaceId],
        released: &[PointId],
        points: &[Vec3A],
        epsilon: f32,
    ) {
        for &id in faces {
            let Some(face) = mesh.face(id) else {
                continue;
            };

            let claimed: Vec<PointId> = released
                .iter()
                .copied()
                .filter(|&p| !self.is_assigned(p) && !mesh.is_vertex(p))
                .filter(|&p| face.is_on_positive_side(points[p.index()], epsilon))
                .collect();

            if claimed.is_empty() {
                continue;
            }
            for &p in &claimed {
                self.assigned[p.index()] = true;
            }
            if let Some(face) = mesh.face_mut(id) {
                face.outside_points.extend(claimed);
            }
        }
    }

    /// Selects the outside point of face `id` furthest from its plane.
    ///
    /// Points that have since become mesh vertices are not eligible.
    pub fn furthest_point(mesh: &Mesh, id: FaceId, points: &[Vec3A]) -> Option<(PointId, f32)> {
        let face = mesh.face(id)?;
        let mut furthest: Option<(PointId, f32)> = None;

        for &p in &face.outside_points {
            if mesh.is_vertex(p) {
                continue;
            }
            let distance = face.distance(points[p.index()]);
            if furthest.is_none_or(|(_, d)| distance > d) {
                furthest = Some((p, distance));
            }
        }

        furthest
    }
}
