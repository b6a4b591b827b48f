use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use strata_geom::{Aabb, Frustum};
use strata_world::{ChunkPosition, InSectionPosition, SectionPosition, SharedWorld, WorldEvent};

use crate::flood::flood_fill;
use crate::snapshot::VisibilitySnapshot;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilitySettings {
    pub view_distance: i32,
    pub occlusion_culling: bool,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            view_distance: 8,
            occlusion_culling: true,
        }
    }
}

struct Inputs {
    // None until the first camera update
    camera: Option<SectionPosition>,
    frustum: Frustum,
    frustum_revision: u64,
    built_frustum_revision: u64,
    settings: VisibilitySettings,
}

/// Sight reachability of sections from the camera, rebuilt wholesale and
/// published as an immutable snapshot.
pub struct VisibilityGraph {
    world: SharedWorld,
    inputs: Mutex<Inputs>,
    current: RwLock<Arc<VisibilitySnapshot>>,
    invalid: AtomicBool,
    generation: AtomicU64,
}

impl VisibilityGraph {
    pub fn new(world: SharedWorld, settings: VisibilitySettings) -> Self {
        let dim = world.read().dimension();
        let camera = SectionPosition::default();
        let frustum = Frustum::everything();
        let empty = VisibilitySnapshot::empty(
            0,
            camera,
            dim.min_section,
            dim.sections,
            settings.view_distance,
            settings.occlusion_culling,
            frustum,
        );
        Self {
            world,
            inputs: Mutex::new(Inputs {
                camera: None,
                frustum,
                frustum_revision: 0,
                built_frustum_revision: 0,
                settings,
            }),
            current: RwLock::new(Arc::new(empty)),
            invalid: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        }
    }

    /// The current generation. Hold on to it for a batch of queries.
    #[inline]
    pub fn snapshot(&self) -> Arc<VisibilitySnapshot> {
        self.current.read().clone()
    }

    pub fn settings(&self) -> VisibilitySettings {
        self.inputs.lock().settings
    }

    pub fn camera(&self) -> Option<SectionPosition> {
        self.inputs.lock().camera
    }

    /// Marks the graph stale; the next `draw` rebuilds it.
    pub fn invalidate(&self) {
        self.invalid.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::Acquire)
    }

    /// Moves the camera. Crossing into another section rebuilds immediately.
    /// Returns whether a new generation was published.
    pub fn update_camera(&self, camera: SectionPosition) -> bool {
        {
            let mut inputs = self.inputs.lock();
            if inputs.camera == Some(camera) {
                return false;
            }
            inputs.camera = Some(camera);
        }
        self.rebuild()
    }

    /// Replaces the frustum; the next `draw` rebuilds.
    pub fn set_frustum(&self, frustum: Frustum) {
        let mut inputs = self.inputs.lock();
        if inputs.frustum == frustum {
            return;
        }
        inputs.frustum = frustum;
        inputs.frustum_revision += 1;
    }

    pub fn set_view_distance(&self, view_distance: i32) {
        let mut inputs = self.inputs.lock();
        if inputs.settings.view_distance != view_distance {
            inputs.settings.view_distance = view_distance.max(0);
            self.invalidate();
        }
    }

    pub fn set_occlusion_culling(&self, enabled: bool) {
        let mut inputs = self.inputs.lock();
        if inputs.settings.occlusion_culling != enabled {
            inputs.settings.occlusion_culling = enabled;
            self.invalidate();
        }
    }

    /// Topology changes invalidate the graph; block edits that keep the
    /// occlusion mask do not.
    pub fn on_world_event(&self, event: &WorldEvent) {
        match event {
            WorldEvent::ChunkCreated(_)
            | WorldEvent::ChunkUnloaded(_)
            | WorldEvent::NeighbourChanged { .. }
            | WorldEvent::OcclusionChanged(_) => self.invalidate(),
            WorldEvent::SectionChanged { .. } | WorldEvent::SectionReplaced(_) => {}
        }
    }

    /// Per-frame hook: rebuilds when invalidated or when the frustum moved.
    pub fn draw(&self) -> bool {
        let frustum_moved = {
            let inputs = self.inputs.lock();
            inputs.frustum_revision != inputs.built_frustum_revision
        };
        if self.is_invalid() || frustum_moved {
            return self.rebuild();
        }
        false
    }

    /// Builds and publishes a new generation. Returns false when no camera has been
    /// set yet or the camera column is missing: the previous generation stays current
    /// and the graph stays invalid so later frames retry.
    pub fn rebuild(&self) -> bool {
        let (camera, frustum, frustum_revision, settings) = {
            let inputs = self.inputs.lock();
            let Some(camera) = inputs.camera else {
                log::trace!(target: "visibility", "no camera yet, skipping rebuild");
                return false;
            };
            (
                camera,
                inputs.frustum,
                inputs.frustum_revision,
                inputs.settings,
            )
        };
        self.invalid.store(false, Ordering::Release);
        let started = Instant::now();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snap = {
            let world = self.world.read();
            let dim = world.dimension();
            let mut snap = VisibilitySnapshot::empty(
                generation,
                camera,
                dim.min_section,
                dim.sections,
                settings.view_distance,
                settings.occlusion_culling,
                frustum,
            );
            if settings.occlusion_culling {
                match flood_fill(&world, &mut snap) {
                    Some(stats) => log::debug!(
                        target: "visibility",
                        "graph #{generation}: {} sections marked in {} steps ({:?})",
                        stats.marked,
                        stats.steps,
                        started.elapsed()
                    ),
                    None => {
                        log::debug!(target: "visibility", "camera column {:?} not loaded", camera.chunk());
                        self.invalidate();
                        return false;
                    }
                }
            }
            snap
        };
        self.inputs.lock().built_frustum_revision = frustum_revision;
        let mut current = self.current.write();
        // A slower concurrent rebuild must not replace a newer generation.
        if current.revision() < generation {
            *current = Arc::new(snap);
        }
        true
    }

    #[inline]
    pub fn is_in_view_distance(&self, chunk: ChunkPosition) -> bool {
        self.snapshot().is_in_view_distance(chunk)
    }

    #[inline]
    pub fn is_chunk_visible(&self, chunk: ChunkPosition) -> bool {
        self.snapshot().is_chunk_visible(chunk)
    }

    #[inline]
    pub fn is_section_visible(
        &self,
        chunk: ChunkPosition,
        height: i32,
        min: InSectionPosition,
        max: InSectionPosition,
        check_chunk: bool,
    ) -> bool {
        self.snapshot()
            .is_section_visible(chunk, height, min, max, check_chunk)
    }

    #[inline]
    pub fn is_aabb_occluded(&self, aabb: &Aabb) -> bool {
        self.snapshot().is_aabb_occluded(aabb)
    }

    #[inline]
    pub fn is_aabb_visible(&self, aabb: &Aabb) -> bool {
        self.snapshot().is_aabb_visible(aabb)
    }
}
