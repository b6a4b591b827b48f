use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use strata_mesh_cpu::ChunkMesher;
use strata_visibility::{VisibilityGraph, VisibilitySettings};
use strata_world::{ChunkPosition, SectionPosition, SharedWorld};

use crate::config::RendererConfig;
use crate::loaded::LoadedMeshes;
use crate::master::QueueMaster;
use crate::queue::{CulledQueue, LoadingQueue, MeshingQueue, UnloadingQueue};
use crate::tasks::MeshTaskManager;
use crate::worker::MeshOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderState {
    Loading = 0,
    Running = 1,
    Paused = 2,
    Stopped = 3,
    Quitting = 4,
}

impl RenderState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RenderState::Loading,
            1 => RenderState::Running,
            2 => RenderState::Paused,
            3 => RenderState::Stopped,
            _ => RenderState::Quitting,
        }
    }

    /// New meshing work is only accepted while loading or running.
    #[inline]
    pub fn accepts_work(self) -> bool {
        matches!(self, RenderState::Loading | RenderState::Running)
    }
}

/// Counters of build outcomes, readable from any thread.
#[derive(Debug, Default)]
pub struct PipelineStats {
    installed: AtomicUsize,
    discarded: AtomicUsize,
    requeued: AtomicUsize,
    unloaded: AtomicUsize,
    cancelled: AtomicUsize,
    pub(crate) inflight: AtomicUsize,
}

impl PipelineStats {
    fn counter(&self, outcome: MeshOutcome) -> &AtomicUsize {
        match outcome {
            MeshOutcome::Installed => &self.installed,
            MeshOutcome::Discarded => &self.discarded,
            MeshOutcome::Requeued => &self.requeued,
            MeshOutcome::Unloaded => &self.unloaded,
            MeshOutcome::Cancelled => &self.cancelled,
        }
    }

    #[inline]
    pub fn record(&self, outcome: MeshOutcome) {
        self.counter(outcome).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, outcome: MeshOutcome) -> usize {
        self.counter(outcome).load(Ordering::Relaxed)
    }

    /// Builds currently running on a worker.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }
}

/// Everything the render thread and the meshing workers share. One per renderer,
/// handed around as `Arc<RendererShared>`.
pub struct RendererShared {
    pub world: SharedWorld,
    pub graph: VisibilityGraph,
    pub mesher: ChunkMesher,
    pub meshing: MeshingQueue,
    pub culled: CulledQueue,
    pub loading: LoadingQueue,
    pub unloading: UnloadingQueue,
    pub loaded: LoadedMeshes,
    pub tasks: MeshTaskManager,
    pub stats: PipelineStats,
    state: AtomicU8,
}

impl RendererShared {
    pub fn new(world: SharedWorld, config: &RendererConfig) -> Self {
        let registry = Arc::clone(world.read().registry());
        Self::with_mesher(world, config, ChunkMesher::new(registry))
    }

    /// Like `new`, with a mesher carrying custom passes.
    pub fn with_mesher(world: SharedWorld, config: &RendererConfig, mesher: ChunkMesher) -> Self {
        let graph = VisibilityGraph::new(
            Arc::clone(&world),
            VisibilitySettings {
                view_distance: config.view_distance,
                occlusion_culling: config.occlusion_culling,
            },
        );
        Self {
            world,
            graph,
            mesher,
            meshing: MeshingQueue::new(),
            culled: CulledQueue::new(),
            loading: LoadingQueue::new(),
            unloading: UnloadingQueue::new(),
            loaded: LoadedMeshes::new(),
            tasks: MeshTaskManager::new(),
            stats: PipelineStats::default(),
            state: AtomicU8::new(RenderState::Loading as u8),
        }
    }

    #[inline]
    pub fn state(&self) -> RenderState {
        RenderState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: RenderState) {
        let prev = self.state.swap(state as u8, Ordering::SeqCst);
        if prev != state as u8 {
            log::info!("render state {:?} -> {:?}", RenderState::from_u8(prev), state);
        }
    }

    #[inline]
    pub fn can_queue(&self) -> bool {
        self.state().accepts_work()
    }

    #[inline]
    pub fn master(&self) -> QueueMaster<'_> {
        QueueMaster::new(self)
    }

    /// Forgets a section everywhere in the pipeline; its mesh goes to the unloading queue.
    pub fn unload_section(&self, position: SectionPosition) {
        self.meshing.remove(position);
        self.culled.remove(position);
        self.loading.remove(position);
        self.tasks.interrupt(position);
        self.loaded.unload_section(position, &self.unloading);
    }

    pub fn unload_chunk(&self, chunk: ChunkPosition) {
        self.meshing.remove_chunk(chunk);
        self.culled.remove_chunk(chunk);
        self.loading.remove_chunk(chunk);
        self.tasks.interrupt_chunk(chunk);
        self.loaded.unload(chunk, &self.unloading);
    }
}
