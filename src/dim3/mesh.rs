use glam::Vec3A;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::{
    dim3::{
        triangle_face::{Edge, FaceId, PointId, TriangleFace},
        ConvexHull3dError,
    },
    fixed_hasher::{FixedHashMap, FixedHasher},
};

/// Number of floats per vertex in [`Mesh::vertex_buffer`]: position, normal and RGBA color.
pub const VERTEX_STRIDE: usize = 10;

/// The faces incident to a single vertex. Hull vertices rarely have more than a handful.
type IncidentFaces = SmallVec<[FaceId; 8]>;

/// One edge of a face together with the face on the other side of it, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    /// The edge as it is wound in the face being queried.
    pub edge: Edge,
    /// The face owning the reversed edge.
    pub face: Option<FaceId>,
}

/// A closed triangle mesh under construction.
///
/// Faces live in a generational arena, so a [`FaceId`] captured before a removal
/// either still refers to the same face or resolves to nothing. Adjacency is kept
/// in a directed half-edge map, where the neighbor across edge `(a, b)` is the
/// face that owns `(b, a)`.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    faces: SlotMap<FaceId, TriangleFace>,
    half_edges: FixedHashMap<Edge, FaceId>,
    incident: Vec<IncidentFaces>,
    dirty: bool,
}

impl Mesh {
    /// Creates an empty mesh over a point set of `num_points` points.
    pub fn new(num_points: usize) -> Self {
        Self {
            faces: SlotMap::with_key(),
            half_edges: FixedHashMap::with_hasher(FixedHasher),
            incident: vec![IncidentFaces::new(); num_points],
            dirty: false,
        }
    }

    /// Creates the triangle `(v1, v2, v3)` and adds it to the mesh.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHull3dError::NonManifoldEdge`] if one of the triangle's
    /// directed edges already belongs to another face.
    pub fn add_face(
        &mut self,
        points: &[Vec3A],
        v1: PointId,
        v2: PointId,
        v3: PointId,
    ) -> Result<FaceId, ConvexHull3dError> {
        self.insert(TriangleFace::from_triangle(points, [v1, v2, v3]))
    }

    /// Adds an already constructed face to the mesh.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHull3dError::NonManifoldEdge`] if one of the face's
    /// directed edges already belongs to another face.
    pub fn insert(&mut self, face: TriangleFace) -> Result<FaceId, ConvexHull3dError> {
        if let Some(edge) = face.edges().into_iter().find(|e| !self.is_edge_free(*e)) {
            return Err(ConvexHull3dError::NonManifoldEdge {
                origin: edge.origin,
                end: edge.end,
            });
        }

        let edges = face.edges();
        let points = face.points;
        let id = self.faces.insert(face);

        // Meshes created without a point count grow their incident lists on demand.
        if let Some(max) = points.iter().map(|p| p.index()).max() {
            if max >= self.incident.len() {
                self.incident.resize(max + 1, IncidentFaces::new());
            }
        }

        for edge in edges {
            self.half_edges.insert(edge, id);
        }
        for point in points {
            self.incident[point.index()].push(id);
        }

        self.dirty = true;
        tracing::trace!(?id, ?points, "added face");
        Ok(id)
    }

    /// Removes the face with the given handle, returning it if it existed.
    ///
    /// The face's half-edges and incident-vertex entries are released, so no
    /// other face keeps referring to it.
    pub fn remove_face(&mut self, id: FaceId) -> Option<TriangleFace> {
        let face = self.faces.remove(id)?;

        for edge in face.edges() {
            if self.half_edges.get(&edge) == Some(&id) {
                self.half_edges.remove(&edge);
            }
        }
        for point in face.points {
            if let Some(incident) = self.incident.get_mut(point.index()) {
                incident.retain(|f| *f != id);
            }
        }

        self.dirty = true;
        tracing::trace!(?id, points = ?face.points, "removed face");
        Some(face)
    }

    /// Looks up a face by its handle. Stale handles return `None`.
    #[inline]
    pub fn face(&self, id: FaceId) -> Option<&TriangleFace> {
        self.faces.get(id)
    }

    /// Looks up a face by its handle for mutation. Stale handles return `None`.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut TriangleFace> {
        self.faces.get_mut(id)
    }

    /// Whether the handle refers to a face currently in the mesh.
    #[inline]
    pub fn contains(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    /// Returns the number of faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Iterates over all faces and their handles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &TriangleFace)> + '_ {
        self.faces.iter()
    }

    /// Iterates over all faces.
    #[inline]
    pub fn faces(&self) -> impl Iterator<Item = &TriangleFace> + '_ {
        self.faces.values()
    }

    /// Returns the face owning the given directed edge.
    #[inline]
    pub fn edge_owner(&self, edge: Edge) -> Option<FaceId> {
        self.half_edges.get(&edge).copied()
    }

    /// Whether no face owns the given directed edge.
    #[inline]
    pub fn is_edge_free(&self, edge: Edge) -> bool {
        !self.half_edges.contains_key(&edge)
    }

    /// Returns the face on the other side of `edge`, the owner of its reverse.
    #[inline]
    pub fn neighbor(&self, edge: Edge) -> Option<FaceId> {
        self.edge_owner(edge.reversed())
    }

    /// Returns the three edges of face `id` with the faces across them.
    ///
    /// Returns `None` if the handle is stale.
    pub fn neighbors(&self, id: FaceId) -> Option<[Neighbor; 3]> {
        let face = self.faces.get(id)?;
        Some(face.edges().map(|edge| Neighbor {
            edge,
            face: self.neighbor(edge),
        }))
    }

    /// Returns the faces that use `point` as a vertex.
    #[inline]
    pub fn incident_faces(&self, point: PointId) -> &[FaceId] {
        self.incident
            .get(point.index())
            .map(|incident| incident.as_slice())
            .unwrap_or_default()
    }

    /// Whether `point` is currently a vertex of some face.
    #[inline]
    pub fn is_vertex(&self, point: PointId) -> bool {
        !self.incident_faces(point).is_empty()
    }

    /// Clears the transient visitation flags on every face.
    pub fn clear_visited(&mut self) {
        for face in self.faces.values_mut() {
            face.visited = false;
        }
    }

    /// Whether the mesh changed since the dirty flag was last taken.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and resets the dirty flag.
    ///
    /// Renderers use this to decide when to rebuild their vertex buffers.
    #[inline]
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }

    /// Returns the point indices of every face.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.faces.values().map(|f| f.points.map(|p| p.0)).collect()
    }

    /// Flattens the faces into an interleaved vertex buffer.
    ///
    /// Each face contributes three vertices of [`VERTEX_STRIDE`] floats:
    /// position, the face normal, and the face color.
    pub fn vertex_buffer(&self, points: &[Vec3A]) -> Vec<f32> {
        let mut buffer = Vec::with_capacity(self.faces.len() * 3 * VERTEX_STRIDE);

        for face in self.faces.values() {
            for point in face.points {
                let position = points[point.index()];
                buffer.extend_from_slice(&position.to_array());
                buffer.extend_from_slice(&face.normal.to_array());
                buffer.extend_from_slice(&face.color);
            }
        }

        buffer
    }
}
