use glam::Vec3A;

use crate::{
    dim3::{
        horizon::{find_horizon, Horizon},
        initial_hull::init_tetrahedron,
        mesh::Mesh,
        outside_set::OutsideSets,
        triangle_face::{Edge, FaceId, PointId, TriangleFace},
        ConvexHull3dError,
    },
    fixed_hasher::FixedHashSet,
};

/// What to do when a horizon does not close into a single loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizonPolicy {
    /// Fail the step with [`ConvexHull3dError::OpenHorizon`], leaving the mesh untouched.
    #[default]
    Strict,
    /// Log a warning and rebuild from whatever edges were found.
    ///
    /// The resulting mesh may be locally non-manifold; validate it if that matters.
    Lenient,
}

/// Settings for one hull construction run.
#[derive(Clone, Debug, PartialEq)]
pub struct HullConfig {
    /// Multiplier applied to the coordinate magnitude when deriving epsilon.
    pub epsilon_scale: f32,
    /// How open horizons are handled.
    pub horizon_policy: HorizonPolicy,
    /// Maximum number of hull expansions to perform. `None` runs until completion.
    pub max_iterations: Option<usize>,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            epsilon_scale: 3.0,
            horizon_policy: HorizonPolicy::Strict,
            max_iterations: None,
        }
    }
}

impl HullConfig {
    /// Sets the epsilon multiplier.
    #[must_use]
    pub fn with_epsilon_scale(mut self, epsilon_scale: f32) -> Self {
        self.epsilon_scale = epsilon_scale;
        self
    }

    /// Sets the open-horizon policy.
    #[must_use]
    pub fn with_horizon_policy(mut self, horizon_policy: HorizonPolicy) -> Self {
        self.horizon_policy = horizon_policy;
        self
    }

    /// Limits the number of hull expansions.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// The phase a [`QuickHull`] will execute on its next [`step`](QuickHull::step).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Phase {
    /// Pop the next face from the work-list and select its furthest outside point.
    #[default]
    FindNextIteration,
    /// Search for the faces visible from `apex`, starting at `face`.
    FindHorizon {
        /// The face whose outside set supplied the apex.
        face: FaceId,
        /// The outside point driving this iteration.
        apex: PointId,
    },
    /// Replace the visible faces with a fan connecting the horizon to `apex`.
    DoIteration {
        /// The face whose outside set supplied the apex.
        face: FaceId,
        /// The outside point driving this iteration.
        apex: PointId,
        /// The horizon found in the previous phase.
        horizon: Horizon,
    },
    /// The work-list is exhausted, or the iteration limit was reached.
    Complete,
}

/// An incremental Quickhull construction that can be advanced one phase at a time.
///
/// Each call to [`step`](Self::step) runs exactly one of the three phases
/// (find the next iteration, find the horizon, rebuild the faces) to completion.
/// Between steps the mesh is always a valid closed hull of the points processed so far.
/// Running with [`run`](Self::run) produces exactly the same mesh as stepping.
///
/// # Example
///
/// ```
/// use glam::Vec3A;
/// use incremental_quickhull::{HullConfig, Phase, QuickHull};
///
/// let points = vec![
///     Vec3A::new(0.0, 0.0, 0.0),
///     Vec3A::new(1.0, 0.0, 0.0),
///     Vec3A::new(0.0, 1.0, 0.0),
///     Vec3A::new(0.0, 0.0, 1.0),
///     Vec3A::new(1.0, 1.0, 1.0),
/// ];
///
/// let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();
/// while !hull.is_complete() {
///     let phase = hull.step().unwrap();
///     if let Phase::DoIteration { horizon, .. } = phase {
///         assert!(horizon.is_closed_loop());
///     }
/// }
///
/// assert_eq!(hull.mesh().len(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct QuickHull {
    points: Vec<Vec3A>,
    config: HullConfig,
    epsilon: f32,
    mesh: Mesh,
    outside: OutsideSets,
    work_list: Vec<FaceId>,
    phase: Phase,
    iterations: usize,
}

impl QuickHull {
    /// Builds the seed tetrahedron, distributes the remaining points over its outside sets,
    /// and queues every seed face that has outside points.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHull3dError::InvalidPoint`] for non-finite coordinates,
    /// [`ConvexHull3dError::TooFewPoints`] for fewer than four points, and
    /// [`ConvexHull3dError::DegenerateInput`] if no seed tetrahedron exists.
    pub fn new(points: &[Vec3A], config: HullConfig) -> Result<Self, ConvexHull3dError> {
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(ConvexHull3dError::InvalidPoint(PointId(i as u32)));
        }
        if points.len() > u32::MAX as usize {
            return Err(ConvexHull3dError::InternalError(
                "point indices must fit in 32 bits",
            ));
        }

        let points = points.to_vec();
        let mut mesh = Mesh::new(points.len());
        let simplex = init_tetrahedron(&points, &mut mesh, config.epsilon_scale)?;

        let mut outside = OutsideSets::new(points.len());
        outside.assign_all(&mut mesh, &simplex.faces, &points, simplex.epsilon);

        let work_list = simplex
            .faces
            .iter()
            .copied()
            .filter(|&id| mesh.face(id).is_some_and(|f| !f.outside_points.is_empty()))
            .collect();

        Ok(Self {
            points,
            config,
            epsilon: simplex.epsilon,
            mesh,
            outside,
            work_list,
            phase: Phase::FindNextIteration,
            iterations: 0,
        })
    }

    /// Advances the construction by one phase and returns the phase that will run next.
    ///
    /// Stepping a completed construction is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHull3dError::OpenHorizon`] under [`HorizonPolicy::Strict`]
    /// when the horizon does not close, and [`ConvexHull3dError::NonManifoldEdge`]
    /// when the rebuilt faces would collide with surviving ones. In both cases
    /// the mesh is left as it was and the failed phase can be retried, for
    /// example after switching to [`HorizonPolicy::Lenient`].
    pub fn step(&mut self) -> Result<&Phase, ConvexHull3dError> {
        let current = core::mem::take(&mut self.phase);
        match self.advance(&current) {
            Ok(next) => {
                self.phase = next;
                Ok(&self.phase)
            }
            Err(error) => {
                self.mesh.clear_visited();
                self.phase = current;
                Err(error)
            }
        }
    }

    /// Steps until the construction is complete.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`step`](Self::step).
    pub fn run(&mut self) -> Result<(), ConvexHull3dError> {
        while !self.is_complete() {
            self.step()?;
        }
        Ok(())
    }

    /// The state transition function.
    fn advance(&mut self, phase: &Phase) -> Result<Phase, ConvexHull3dError> {
        match phase {
            Phase::FindNextIteration => Ok(self.find_next_iteration()),
            Phase::FindHorizon { face, apex } => self.find_horizon(*face, *apex),
            Phase::DoIteration {
                face,
                apex,
                horizon,
            } => self.do_iteration(*face, *apex, horizon),
            Phase::Complete => Ok(Phase::Complete),
        }
    }

    fn find_next_iteration(&mut self) -> Phase {
        if self
            .config
            .max_iterations
            .is_some_and(|max| self.iterations >= max)
        {
            tracing::debug!(iterations = self.iterations, "iteration limit reached");
            return Phase::Complete;
        }

        let Some(face) = self.work_list.pop() else {
            tracing::debug!(
                iterations = self.iterations,
                faces = self.mesh.len(),
                "quickhull complete"
            );
            return Phase::Complete;
        };

        // Faces removed since they were queued, or whose points were all claimed, are skipped.
        match OutsideSets::furthest_point(&self.mesh, face, &self.points) {
            Some((apex, distance)) => {
                tracing::debug!(?face, ?apex, distance, "selected apex");
                Phase::FindHorizon { face, apex }
            }
            None => {
                tracing::trace!(?face, "skipping face without candidates");
                Phase::FindNextIteration
            }
        }
    }

    fn find_horizon(&mut self, face: FaceId, apex: PointId) -> Result<Phase, ConvexHull3dError> {
        let horizon = find_horizon(&mut self.mesh, face, self.points[apex.index()], self.epsilon);

        if !horizon.is_closed_loop() {
            match self.config.horizon_policy {
                HorizonPolicy::Strict => {
                    return Err(ConvexHull3dError::OpenHorizon {
                        apex,
                        edges: horizon.len(),
                    });
                }
                HorizonPolicy::Lenient => {
                    tracing::warn!(?apex, edges = ?horizon.edges(), "invalid horizon");
                }
            }
        }

        Ok(Phase::DoIteration {
            face,
            apex,
            horizon,
        })
    }

    fn do_iteration(
        &mut self,
        face: FaceId,
        apex: PointId,
        horizon: &Horizon,
    ) -> Result<Phase, ConvexHull3dError> {
        let Some(old_centroid) = self.mesh.face(face).map(|f| f.centroid) else {
            self.mesh.clear_visited();
            return Ok(Phase::FindNextIteration);
        };

        if horizon.is_empty() {
            tracing::warn!(?apex, "empty horizon, skipping iteration");
            self.mesh.clear_visited();
            return Ok(Phase::FindNextIteration);
        }

        let new_faces = self.build_fan(apex, old_centroid, horizon)?;

        // Release the outside points of every face that is about to disappear.
        let mut released: Vec<PointId> = Vec::new();
        for &id in &horizon.visible {
            if let Some(f) = self.mesh.face_mut(id) {
                released.append(&mut f.outside_points);
            }
        }
        self.outside.release(&released);

        for &id in &horizon.visible {
            self.mesh.remove_face(id);
        }

        let mut created = Vec::with_capacity(new_faces.len());
        for new_face in new_faces {
            created.push(self.mesh.insert(new_face)?);
        }

        self.outside.reassign(
            &mut self.mesh,
            &created,
            &released,
            &self.points,
            self.epsilon,
        );

        for &id in &created {
            if self
                .mesh
                .face(id)
                .is_some_and(|f| !f.outside_points.is_empty())
            {
                self.work_list.push(id);
            }
        }

        self.mesh.clear_visited();
        self.iterations += 1;

        tracing::debug!(
            ?apex,
            removed = horizon.visible.len(),
            created = created.len(),
            faces = self.mesh.len(),
            "expanded hull"
        );

        Ok(Phase::FindNextIteration)
    }

    /// Builds, but does not insert, the faces connecting each horizon edge to the apex.
    ///
    /// Fails without touching the mesh if a new face would reuse a directed edge owned
    /// by a surviving face or by another new face.
    fn build_fan(
        &self,
        apex: PointId,
        old_centroid: Vec3A,
        horizon: &Horizon,
    ) -> Result<Vec<TriangleFace>, ConvexHull3dError> {
        let visible: FixedHashSet<FaceId> = horizon.visible.iter().copied().collect();
        let mut claimed: FixedHashSet<Edge> = FixedHashSet::default();
        let mut fan = Vec::with_capacity(horizon.len());

        for edge in horizon.loop_order() {
            let mut new_face =
                TriangleFace::from_triangle(&self.points, [edge.origin, edge.end, apex]);

            // A face that sees the removed face's centroid is wound inside out.
            if new_face.is_on_positive_side(old_centroid, self.epsilon) {
                tracing::debug!(?edge, ?apex, "reversing new face");
                new_face.flip(&self.points);
            }

            let conflict = new_face.edges().into_iter().find(|e| {
                claimed.contains(e)
                    || self
                        .mesh
                        .edge_owner(*e)
                        .is_some_and(|owner| !visible.contains(&owner))
            });

            if let Some(e) = conflict {
                match self.config.horizon_policy {
                    HorizonPolicy::Strict => {
                        return Err(ConvexHull3dError::NonManifoldEdge {
                            origin: e.origin,
                            end: e.end,
                        });
                    }
                    HorizonPolicy::Lenient => {
                        tracing::warn!(edge = ?e, ?apex, "skipping face with a non-manifold edge");
                        continue;
                    }
                }
            }

            claimed.extend(new_face.edges());
            fan.push(new_face);
        }

        Ok(fan)
    }

    /// Consumes the construction and returns its mesh, complete or not.
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// Returns the mesh in its current state.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Returns the mesh mutably, for example to take its dirty flag.
    #[inline]
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// Returns the input points.
    #[inline]
    pub fn points(&self) -> &[Vec3A] {
        &self.points
    }

    /// Returns the tolerance fixed for this run.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Returns the configuration of this run.
    #[inline]
    pub fn config(&self) -> &HullConfig {
        &self.config
    }

    /// Sets how open horizons are handled from the next step on.
    #[inline]
    pub fn set_horizon_policy(&mut self, horizon_policy: HorizonPolicy) {
        self.config.horizon_policy = horizon_policy;
    }

    /// Returns the phase that will run on the next step.
    #[inline]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether the construction has finished.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Returns the faces still waiting to be expanded. The last one is processed first.
    #[inline]
    pub fn work_list(&self) -> &[FaceId] {
        &self.work_list
    }

    /// Returns the number of completed hull expansions.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the point is currently in some face's outside set.
    #[inline]
    pub fn is_assigned(&self, point: PointId) -> bool {
        self.outside.is_assigned(point)
    }

    /// Returns the apex of the iteration in progress, if any.
    pub fn current_apex(&self) -> Option<PointId> {
        match &self.phase {
            Phase::FindHorizon { apex, .. } | Phase::DoIteration { apex, .. } => Some(*apex),
            _ => None,
        }
    }

    /// Returns the face that supplied the apex of the iteration in progress, if any.
    pub fn current_face(&self) -> Option<FaceId> {
        match &self.phase {
            Phase::FindHorizon { face, .. } | Phase::DoIteration { face, .. } => Some(*face),
            _ => None,
        }
    }

    /// Returns the horizon of the iteration in progress, once it has been found.
    pub fn horizon(&self) -> Option<&Horizon> {
        match &self.phase {
            Phase::DoIteration { horizon, .. } => Some(horizon),
            _ => None,
        }
    }
}

/// Builds the hull of `points` in one go and returns its mesh.
///
/// # Errors
///
/// Returns a [`ConvexHull3dError`] if construction fails.
pub fn run_to_completion(points: &[Vec3A], config: HullConfig) -> Result<Mesh, ConvexHull3dError> {
    let mut hull = QuickHull::new(points, config)?;
    hull.run()?;
    Ok(hull.into_mesh())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::dim3::{
        mesh::VERTEX_STRIDE,
        validation::{validate_containment, validate_manifold, ValidationError},
    };

    fn unit_cube() -> Vec<Vec3A> {
        vec![
            Vec3A::new(1.0, 1.0, 1.0),
            Vec3A::new(1.0, 1.0, 0.0),
            Vec3A::new(1.0, 0.0, 1.0),
            Vec3A::new(1.0, 0.0, 0.0),
            Vec3A::new(0.0, 1.0, 1.0),
            Vec3A::new(0.0, 1.0, 0.0),
            Vec3A::new(0.0, 0.0, 1.0),
            Vec3A::new(0.0, 0.0, 0.0),
        ]
    }

    fn random_cloud(seed: u64, count: usize) -> Vec<Vec3A> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Vec3A::new(
                    rng.random_range(0.0..200.0),
                    rng.random_range(0.0..200.0),
                    rng.random_range(0.0..200.0),
                )
            })
            .collect()
    }

    /// Signed volume of a closed mesh, decomposed into tetrahedra around `reference`.
    fn volume(mesh: &Mesh, points: &[Vec3A], reference: Vec3A) -> f32 {
        mesh.faces()
            .map(|face| {
                let [a, b, c] = face.points().map(|p| points[p.index()] - reference);
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    #[test]
    fn tetrahedron_completes_after_one_step() {
        let points = vec![Vec3A::ZERO, Vec3A::X, Vec3A::Y, Vec3A::Z];
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();

        assert_eq!(hull.mesh().len(), 4);
        assert!(hull.work_list().is_empty());
        assert!(!hull.is_complete());

        assert_eq!(hull.step(), Ok(&Phase::Complete));
        assert_eq!(hull.iterations(), 0);

        for i in 0..4 {
            assert_eq!(hull.mesh().incident_faces(PointId(i)).len(), 3);
        }
        assert_eq!(validate_manifold(hull.mesh()), Ok(()));
    }

    #[test]
    fn unit_cube_has_twelve_faces() {
        let points = unit_cube();
        let mesh = run_to_completion(&points, HullConfig::default()).unwrap();

        assert_eq!(mesh.len(), 12);
        assert_eq!(validate_manifold(&mesh), Ok(()));
        assert_relative_eq!(volume(&mesh, &points, Vec3A::splat(0.5)), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn interior_point_is_never_used() {
        let points = vec![
            Vec3A::ZERO,
            Vec3A::X,
            Vec3A::Y,
            Vec3A::Z,
            Vec3A::splat(0.1),
        ];
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();
        assert!(!hull.is_assigned(PointId(4)));

        hull.run().unwrap();
        assert!(!hull.mesh().is_vertex(PointId(4)));
        assert!(!hull.is_assigned(PointId(4)));
        assert_eq!(hull.mesh().len(), 4);
    }

    #[test]
    fn duplicate_points_are_tolerated() {
        let mut points = unit_cube();
        points.extend(unit_cube());
        points.push(Vec3A::splat(0.5));

        let mesh = run_to_completion(&points, HullConfig::default()).unwrap();
        assert_eq!(mesh.len(), 12);
        assert_eq!(validate_manifold(&mesh), Ok(()));
        assert!(!mesh.is_vertex(PointId(16)));
        assert_relative_eq!(volume(&mesh, &points, Vec3A::splat(0.5)), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn phases_cycle_in_order() {
        let points = random_cloud(7, 64);
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();
        let mut previous = hull.phase().clone();

        while !hull.is_complete() {
            let next = hull.step().unwrap().clone();
            match (&previous, &next) {
                (Phase::FindNextIteration, Phase::FindHorizon { face, apex }) => {
                    assert_eq!(hull.current_face(), Some(*face));
                    assert_eq!(hull.current_apex(), Some(*apex));
                    assert!(hull.mesh().face(*face).is_some());
                    assert!(!hull.mesh().is_vertex(*apex));
                }
                (
                    Phase::FindHorizon { apex, .. },
                    Phase::DoIteration {
                        apex: next_apex,
                        horizon,
                        ..
                    },
                ) => {
                    assert_eq!(apex, next_apex);
                    assert!(horizon.is_closed_loop());
                    assert!(!horizon.visible_faces().is_empty());
                    assert_eq!(hull.horizon(), Some(horizon));
                }
                (Phase::DoIteration { apex, .. }, Phase::FindNextIteration) => {
                    assert!(hull.mesh().is_vertex(*apex));
                    assert!(hull.mesh().faces().all(|f| !f.visited));
                }
                (Phase::FindNextIteration, Phase::FindNextIteration | Phase::Complete) => {}
                transition => panic!("unexpected transition {transition:?}"),
            }

            // The mesh is a closed hull between any two steps.
            assert_eq!(validate_manifold(hull.mesh()), Ok(()));
            previous = next;
        }
    }

    #[test]
    fn stepping_matches_running() {
        let points = random_cloud(11, 300);

        let mut stepped = QuickHull::new(&points, HullConfig::default()).unwrap();
        while !stepped.is_complete() {
            stepped.step().unwrap();
        }
        let ran = run_to_completion(&points, HullConfig::default()).unwrap();

        assert_eq!(stepped.mesh().triangles(), ran.triangles());
    }

    #[test]
    fn random_clouds_are_closed_and_contain_every_point() {
        for seed in 0..3 {
            let points = random_cloud(seed, 500);
            let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();
            hull.run().unwrap();

            assert_eq!(validate_manifold(hull.mesh()), Ok(()));
            assert_eq!(
                validate_containment(hull.mesh(), &points, hull.epsilon()),
                Ok(())
            );
            assert!((0..points.len() as u32).all(|p| !hull.is_assigned(PointId(p))));

            // Euler characteristic of a closed triangulated sphere.
            let vertices = (0..points.len() as u32)
                .filter(|&p| hull.mesh().is_vertex(PointId(p)))
                .count();
            assert_eq!(hull.mesh().len(), 2 * vertices - 4);
        }
    }

    #[test]
    fn removed_faces_leave_stale_handles() {
        let points = unit_cube();
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();

        loop {
            hull.step().unwrap();
            if let Some(horizon) = hull.horizon().cloned() {
                hull.step().unwrap();
                for &id in horizon.visible_faces() {
                    assert!(!hull.mesh().contains(id));
                    assert!(hull.mesh().face(id).is_none());
                    assert!(hull.mesh().neighbors(id).is_none());
                }
                break;
            }
        }
    }

    #[test]
    fn iteration_limit_stops_early() {
        let points = unit_cube();
        let config = HullConfig::default().with_max_iterations(Some(1));
        let mut hull = QuickHull::new(&points, config).unwrap();
        hull.run().unwrap();

        assert!(hull.is_complete());
        assert_eq!(hull.iterations(), 1);
        assert_eq!(validate_manifold(hull.mesh()), Ok(()));
        assert!(hull.mesh().len() < 12);
    }

    #[test]
    fn dirty_flag_tracks_changes() {
        let points = unit_cube();
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();
        assert!(hull.mesh_mut().take_dirty());
        assert!(!hull.mesh().is_dirty());

        // Selecting an apex does not touch the mesh.
        hull.step().unwrap();
        assert!(!hull.mesh().is_dirty());

        hull.run().unwrap();
        assert!(hull.mesh().is_dirty());
    }

    #[test]
    fn vertex_buffer_interleaves_faces() {
        let points = unit_cube();
        let mesh = run_to_completion(&points, HullConfig::default()).unwrap();
        let buffer = mesh.vertex_buffer(&points);
        assert_eq!(buffer.len(), mesh.len() * 3 * VERTEX_STRIDE);

        let first = mesh.faces().next().unwrap();
        assert_eq!(&buffer[3..6], &first.normal().to_array());
        assert_eq!(&buffer[6..10], &first.color());
    }

    #[test]
    fn config_builders() {
        let config = HullConfig::default()
            .with_epsilon_scale(10.0)
            .with_horizon_policy(HorizonPolicy::Lenient)
            .with_max_iterations(Some(3));
        assert_eq!(config.epsilon_scale, 10.0);
        assert_eq!(config.horizon_policy, HorizonPolicy::Lenient);
        assert_eq!(config.max_iterations, Some(3));

        let points = unit_cube();
        let mut hull = QuickHull::new(&points, config).unwrap();
        hull.set_horizon_policy(HorizonPolicy::Strict);
        assert_eq!(hull.config().horizon_policy, HorizonPolicy::Strict);
        assert_relative_eq!(hull.epsilon(), 10.0 * 3.0 * f32::EPSILON);
    }

    /// A tetrahedron with edge length 10 and an apex that sees the `y = 0` and `z = 0` faces.
    fn two_face_apex() -> Vec<Vec3A> {
        vec![
            Vec3A::ZERO,
            Vec3A::X * 10.0,
            Vec3A::Y * 10.0,
            Vec3A::Z * 10.0,
            Vec3A::new(4.0, -0.5, -0.5),
        ]
    }

    /// Flags every visible face except `start`, so the search stops at `start`.
    fn flag_other_visible_faces(hull: &mut QuickHull, start: FaceId, apex: PointId) {
        let apex = hull.points()[apex.index()];
        let epsilon = hull.epsilon();
        let others: Vec<FaceId> = hull
            .mesh()
            .iter()
            .filter(|&(id, f)| id != start && f.is_on_positive_side(apex, epsilon))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(others.len(), 1);

        for id in others {
            hull.mesh_mut().face_mut(id).unwrap().visited = true;
        }
    }

    #[test]
    fn open_horizon_is_recoverable() {
        let points = two_face_apex();
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();

        let Phase::FindHorizon { face, apex } = hull.step().unwrap().clone() else {
            panic!("expected an apex to be selected");
        };
        assert_eq!(apex, PointId(4));
        let before = hull.mesh().triangles();

        flag_other_visible_faces(&mut hull, face, apex);
        assert_eq!(
            hull.step(),
            Err(ConvexHull3dError::OpenHorizon { apex, edges: 2 })
        );

        // The failed step leaves everything as it was.
        assert_eq!(hull.phase(), &Phase::FindHorizon { face, apex });
        assert_eq!(hull.mesh().triangles(), before);
        assert!(hull.mesh().faces().all(|f| !f.visited));
        assert_eq!(validate_manifold(hull.mesh()), Ok(()));

        // Retrying leniently rebuilds from the two edges that were found.
        hull.set_horizon_policy(HorizonPolicy::Lenient);
        flag_other_visible_faces(&mut hull, face, apex);
        assert!(matches!(hull.step(), Ok(Phase::DoIteration { .. })));
        assert_eq!(hull.step(), Ok(&Phase::FindNextIteration));
        hull.run().unwrap();

        assert!(hull.is_complete());
        assert_eq!(hull.mesh().len(), 5);
        assert!(hull.mesh().is_vertex(apex));
        assert!(matches!(
            validate_manifold(hull.mesh()),
            Err(ValidationError::UnpairedEdge { .. })
        ));
    }

    #[test]
    fn non_manifold_fan_is_recoverable() {
        // The apex only sees the slanted face; the two inner points stay unassigned.
        let points = vec![
            Vec3A::ZERO,
            Vec3A::X * 10.0,
            Vec3A::Y * 10.0,
            Vec3A::Z * 10.0,
            Vec3A::splat(4.0),
            Vec3A::new(1.0, 1.0, 1.0),
            Vec3A::new(1.0, 2.0, 1.0),
        ];
        let apex = PointId(4);
        let mut hull = QuickHull::new(&points, HullConfig::default()).unwrap();

        hull.step().unwrap();
        hull.step().unwrap();
        assert_eq!(hull.current_apex(), Some(apex));
        let horizon = hull.horizon().cloned().unwrap();
        assert!(horizon.is_closed_loop());

        // Claim the apex edges that the fan over the first horizon edge would need.
        let edge = horizon.loop_order()[0];
        let mesh = hull.mesh_mut();
        let blockers = [
            mesh.add_face(&points, edge.end, apex, PointId(5)).unwrap(),
            mesh.add_face(&points, edge.origin, apex, PointId(6)).unwrap(),
        ];
        let before = hull.mesh().triangles();

        assert!(matches!(
            hull.step(),
            Err(ConvexHull3dError::NonManifoldEdge { .. })
        ));
        assert!(matches!(hull.phase(), Phase::DoIteration { .. }));
        assert_eq!(hull.mesh().triangles(), before);
        for &id in horizon.visible_faces() {
            assert!(hull.mesh().contains(id));
        }

        // Leniently, the conflicting faces are skipped and the blockers keep their edges.
        hull.set_horizon_policy(HorizonPolicy::Lenient);
        assert_eq!(hull.step(), Ok(&Phase::FindNextIteration));
        assert_eq!(
            hull.mesh().edge_owner(Edge::new(edge.end, apex)),
            Some(blockers[0])
        );
        assert_eq!(
            hull.mesh().edge_owner(Edge::new(edge.origin, apex)),
            Some(blockers[1])
        );
        for &id in horizon.visible_faces() {
            assert!(!hull.mesh().contains(id));
        }
        let full_fan = before.len() - horizon.visible_faces().len() + horizon.len();
        assert!(hull.mesh().len() < full_fan);
    }
}
