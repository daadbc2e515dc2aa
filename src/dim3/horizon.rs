use glam::Vec3A;

use crate::{
    dim3::{
        mesh::Mesh,
        triangle_face::{Edge, FaceId, PointId},
    },
    fixed_hasher::{FixedHashMap, FixedHasher},
};

/// The boundary between the faces an apex can see and the faces it cannot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Horizon {
    /// Horizon edges, wound as in the visible faces they bound.
    pub(crate) edges: Vec<Edge>,
    /// Every face visible from the apex, starting with the face the search began at.
    pub(crate) visible: Vec<FaceId>,
}

impl Horizon {
    /// Returns the horizon edges, in discovery order.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the faces that are visible from the apex and will be replaced.
    #[inline]
    pub fn visible_faces(&self) -> &[FaceId] {
        &self.visible
    }

    /// Returns the number of horizon edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the horizon has no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Adds an edge unless an edge with the same origin and end is already present.
    fn push_unique(&mut self, edge: Edge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    /// Whether the edges chain into exactly one closed loop.
    ///
    /// Every edge's end must be the next edge's origin, cycling back to the
    /// first edge's origin after visiting every edge once.
    pub fn is_closed_loop(&self) -> bool {
        let Some(first) = self.edges.first() else {
            return false;
        };

        let mut next: FixedHashMap<PointId, PointId> =
            FixedHashMap::with_capacity_and_hasher(self.edges.len(), FixedHasher);
        for edge in &self.edges {
            if next.insert(edge.origin, edge.end).is_some() {
                // Two edges leave the same vertex.
                return false;
            }
        }

        let start = first.origin;
        let mut current = start;
        for step in 1..=self.edges.len() {
            let Some(&end) = next.get(&current) else {
                return false;
            };
            current = end;
            if current == start {
                return step == self.edges.len();
            }
        }

        false
    }

    /// Returns the edges reordered to follow the loop, starting with the first edge.
    ///
    /// Edges that are not reachable along the chain are appended in discovery order.
    pub fn loop_order(&self) -> Vec<Edge> {
        let mut remaining = self.edges.clone();
        let mut ordered = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let mut current = remaining.remove(0);
            ordered.push(current);
            while let Some(position) = remaining.iter().position(|e| e.origin == current.end) {
                current = remaining.remove(position);
                ordered.push(current);
            }
        }

        ordered
    }
}

/// Finds the horizon seen from `apex` with a breadth-first search over face adjacency,
/// starting at the face `start`, which must be visible from the apex.
///
/// A neighbor the apex is not strictly in front of contributes the shared edge to the
/// horizon. A visible neighbor is added to the visible set and searched in turn.
/// Missing neighbors (an open mesh) also bound the visible region.
///
/// Visited faces are flagged; the caller clears the flags once the step completes.
pub fn find_horizon(mesh: &mut Mesh, start: FaceId, apex: Vec3A, epsilon: f32) -> Horizon {
    let mut horizon = Horizon::default();

    let Some(face) = mesh.face_mut(start) else {
        return horizon;
    };
    face.visited = true;
    horizon.visible.push(start);

    let mut i = 0;
    while i < horizon.visible.len() {
        let current = horizon.visible[i];
        i += 1;

        let Some(neighbors) = mesh.neighbors(current) else {
            continue;
        };

        for neighbor in neighbors {
            let Some(neighbor_id) = neighbor.face else {
                horizon.push_unique(neighbor.edge);
                continue;
            };
            let Some(neighbor_face) = mesh.face_mut(neighbor_id) else {
                horizon.push_unique(neighbor.edge);
                continue;
            };

            if !neighbor_face.is_on_positive_side(apex, epsilon) {
                tracing::trace!(edge = ?neighbor.edge, "horizon edge");
                horizon.push_unique(neighbor.edge);
            } else if !neighbor_face.visited {
                neighbor_face.visited = true;
                horizon.visible.push(neighbor_id);
            }
        }
    }

    tracing::debug!(
        visible = horizon.visible.len(),
        edges = horizon.edges.len(),
        "found horizon"
    );

    horizon
}
