use std::sync::Arc;

use crossbeam_channel::Receiver;
use rayon::ThreadPoolBuildError;
use strata_geom::Frustum;
use strata_mesh_cpu::ChunkMesher;
use strata_world::{Direction, SectionPosition, SharedWorld, WorldEvent};

use crate::config::{ConfigError, RendererConfig};
use crate::context::{RenderState, RendererShared};
use crate::gpu::GpuBackend;
use crate::loaded::VisibleMeshes;
use crate::worker::WorkerPool;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start meshing workers: {0}")]
    Workers(#[from] ThreadPoolBuildError),
}

/// What one `frame` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub events: usize,
    pub rebuilt: bool,
    /// Items meshed on the render thread (inline mode only).
    pub meshed: usize,
    pub uploaded: usize,
    pub released: usize,
    /// Items still waiting in the meshing queue.
    pub queued: usize,
    /// Sections with an installed mesh.
    pub loaded: usize,
}

/// Render-thread facade over the visibility graph and the meshing pipeline.
pub struct SectionRenderer {
    shared: Arc<RendererShared>,
    pool: WorkerPool,
    events: Receiver<WorldEvent>,
    config: RendererConfig,
}

impl SectionRenderer {
    pub fn new(world: SharedWorld, config: RendererConfig) -> Result<Self, RendererError> {
        let registry = Arc::clone(world.read().registry());
        Self::with_mesher(world, config, ChunkMesher::new(registry))
    }

    /// Like `new`, meshing with the given passes instead of the default ones.
    pub fn with_mesher(world: SharedWorld, config: RendererConfig, mesher: ChunkMesher) -> Result<Self, RendererError> {
        config.validate()?;
        let events = world.write().subscribe();
        let shared = Arc::new(RendererShared::with_mesher(world, &config, mesher));
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        let pool = WorkerPool::new(Arc::clone(&shared), config.worker_count(available))?;
        Ok(Self {
            shared,
            pool,
            events,
            config,
        })
    }

    #[inline]
    pub fn shared(&self) -> &Arc<RendererShared> {
        &self.shared
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    #[inline]
    pub fn state(&self) -> RenderState {
        self.shared.state()
    }

    pub fn set_state(&self, state: RenderState) {
        self.shared.set_state(state);
    }

    /// Switches to `Running` and queues everything already loaded.
    pub fn start(&self) {
        self.shared.set_state(RenderState::Running);
        self.shared.graph.invalidate();
        self.shared.master().try_queue_world();
    }

    pub fn on_world_update(&self, event: &WorldEvent) {
        self.shared.graph.on_world_event(event);
        let master = self.shared.master();
        match *event {
            WorldEvent::ChunkCreated(chunk) => {
                master.try_queue_chunk(chunk, false, false);
            }
            WorldEvent::ChunkUnloaded(chunk) => self.shared.unload_chunk(chunk),
            WorldEvent::NeighbourChanged { chunk, complete } => {
                if complete {
                    master.try_queue_chunk(chunk, true, false);
                } else {
                    // Installed meshes stay; pending builds would only be skipped later.
                    self.shared.meshing.remove_chunk(chunk);
                    self.shared.tasks.interrupt_chunk(chunk);
                }
            }
            WorldEvent::SectionChanged {
                position,
                in_section,
            } => {
                self.shared.tasks.interrupt(position);
                master.try_queue(position, true);
                for dir in in_section.border_directions() {
                    master.try_queue(position.offset(dir), true);
                }
            }
            WorldEvent::SectionReplaced(position) => {
                self.shared.tasks.interrupt(position);
                master.try_queue(position, true);
                for dir in Direction::ALL {
                    master.try_queue(position.offset(dir), true);
                }
            }
            WorldEvent::OcclusionChanged(_) => {}
        }
    }

    /// Returns true if the move rebuilt the visibility graph.
    pub fn on_camera_moved(&self, camera: SectionPosition) -> bool {
        self.shared.meshing.set_camera(camera);
        if !self.shared.graph.update_camera(camera) {
            return false;
        }
        self.after_rebuild();
        true
    }

    pub fn set_frustum(&self, frustum: Frustum) {
        self.shared.graph.set_frustum(frustum);
    }

    pub fn set_occlusion_culling(&mut self, enabled: bool) {
        self.config.occlusion_culling = enabled;
        self.shared.graph.set_occlusion_culling(enabled);
    }

    /// Shrinking evicts columns that fell out of range and interrupts their builds;
    /// growing queues the whole world again.
    pub fn set_view_distance(&mut self, view_distance: i32) {
        let view_distance = view_distance.max(0);
        let previous = self.config.view_distance;
        if previous == view_distance {
            return;
        }
        self.config.view_distance = view_distance;
        self.shared.graph.set_view_distance(view_distance);
        if self.shared.graph.rebuild() {
            self.after_rebuild();
        }
        if view_distance > previous {
            self.shared.master().try_queue_world();
        }
        log::info!("view distance {previous} -> {view_distance}");
    }

    fn after_rebuild(&self) {
        let visibility = self.shared.graph.snapshot();
        let hidden = self
            .shared
            .meshing
            .drain_unless(|item| visibility.is_position_visible(item.position));
        for item in hidden {
            self.shared.culled.queue(item.position);
        }
        self.shared.tasks.cleanup(&visibility);
        for position in self.shared.loaded.cleanup(&visibility, &self.shared.unloading) {
            self.shared.loading.remove(position);
            self.shared.culled.queue(position);
        }
        self.shared.master().requeue_culled();
    }

    /// One render-thread tick: apply world events, refresh visibility, mesh inline if
    /// configured, then upload and release within the per-frame budgets.
    pub fn frame(&self, backend: &mut dyn GpuBackend) -> FrameStats {
        let mut stats = FrameStats::default();
        for event in self.events.try_iter() {
            self.on_world_update(&event);
            stats.events += 1;
        }
        if self.shared.graph.draw() {
            self.after_rebuild();
            stats.rebuilt = true;
        }
        if self.pool.is_inline() {
            let pending = self.shared.meshing.len();
            stats.meshed = self.pool.process_inline(pending);
        }
        stats.uploaded = self
            .shared
            .loading
            .work(&self.shared.loaded, backend, self.config.max_uploads_per_frame);
        stats.released = self
            .shared
            .unloading
            .work(backend, self.config.max_unloads_per_frame);
        stats.queued = self.shared.meshing.len();
        stats.loaded = self.shared.loaded.section_count();
        stats
    }

    /// Uploaded meshes that pass the current graph and frustum, in draw order.
    pub fn draw_list(&self) -> VisibleMeshes {
        let visibility = self.shared.graph.snapshot();
        let mut out = VisibleMeshes::default();
        self.shared.loaded.collect(&visibility, &mut out);
        out.sort(visibility.camera().center());
        out
    }

    /// Stops the workers and releases every GPU resource. Returns how many meshes were freed.
    pub fn shutdown(&self, backend: &mut dyn GpuBackend) -> usize {
        self.shared.set_state(RenderState::Quitting);
        self.pool.shutdown();
        self.shared.meshing.clear();
        self.shared.culled.clear();
        self.shared.loading.clear();
        self.shared.loaded.clear(&self.shared.unloading);
        let released = self.shared.unloading.clear(backend);
        log::info!("renderer shut down, released {released} meshes");
        released
    }
}
