use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use strata_mesh_cpu::NeighborSnapshot;
use strata_world::{SectionPosition, World};

use crate::context::{RenderState, RendererShared};
use crate::item::WorkItem;

/// Where a build ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshOutcome {
    /// Written into the mesh cache and queued for upload.
    Installed,
    /// Build error, hidden by the time it finished, or beaten by a newer build.
    Discarded,
    /// The section changed while meshing; it went back into the queue.
    Requeued,
    /// Nothing to draw or the neighbourhood went incomplete; the section was unloaded.
    Unloaded,
    /// Interrupted at a safe point.
    Cancelled,
}

enum Capture {
    Ready(NeighborSnapshot),
    Unload,
}

fn capture(world: &World, position: SectionPosition) -> Capture {
    let Some(column) = world.column(position.chunk()) else {
        return Capture::Unload;
    };
    if !column.is_complete() {
        return Capture::Unload;
    }
    let Some(section) = world.section(position).filter(|s| !s.is_empty()) else {
        return Capture::Unload;
    };
    Capture::Ready(NeighborSnapshot::new(
        position,
        Arc::clone(section),
        world.direct_neighbours(position),
    ))
}

fn build(shared: &RendererShared, item: WorkItem) -> MeshOutcome {
    let position = item.position;
    let task = shared.tasks.start(position);
    if task.token().is_cancelled() || shared.state() == RenderState::Quitting {
        return MeshOutcome::Cancelled;
    }

    let captured = capture(&shared.world.read(), position);
    let snapshot = match captured {
        Capture::Ready(snapshot) => snapshot,
        Capture::Unload => {
            shared.unload_section(position);
            return MeshOutcome::Unloaded;
        }
    };
    let mut mesh = match shared.mesher.mesh(&snapshot) {
        Ok(Some(mesh)) => mesh,
        Ok(None) => {
            shared.unload_section(position);
            return MeshOutcome::Unloaded;
        }
        Err(err) => {
            log::warn!(target: "meshing", "failed to mesh {position:?}: {err}");
            return MeshOutcome::Discarded;
        }
    };
    drop(snapshot);

    if !task.token().seal() {
        return MeshOutcome::Cancelled;
    }

    let world = shared.world.read();
    let Some(revision) = world.section(position).map(|s| s.revision()) else {
        drop(world);
        shared.unload_section(position);
        return MeshOutcome::Unloaded;
    };
    let neighbours = NeighborSnapshot::revisions_of(&world.direct_neighbours(position));
    if revision != mesh.revision || neighbours != mesh.neighbour_revisions {
        drop(world);
        shared.master().try_queue(position, true);
        return MeshOutcome::Requeued;
    }
    let visibility = shared.graph.snapshot();
    if !visibility.is_section_visible(position.chunk(), position.y, mesh.min, mesh.max, true) {
        drop(world);
        shared.culled.queue(position);
        return MeshOutcome::Discarded;
    }

    mesh.finish();
    let installed = shared.loaded.install(mesh, &shared.unloading);
    drop(world);
    if !installed {
        return MeshOutcome::Discarded;
    }
    shared.loading.queue(position);
    MeshOutcome::Installed
}

/// Runs one work item through the build state machine and records the outcome.
pub fn process_item(shared: &RendererShared, item: WorkItem) -> MeshOutcome {
    let position = item.position;
    shared.stats.inflight.fetch_add(1, Ordering::SeqCst);
    let outcome = build(shared, item);
    shared.stats.record(outcome);
    shared.stats.inflight.fetch_sub(1, Ordering::SeqCst);
    log::trace!(target: "meshing", "{position:?}: {outcome:?}");
    outcome
}

/// Meshing threads feeding on the shared queue. With zero workers nothing runs in
/// the background and the render thread meshes through `process_inline`.
pub struct WorkerPool {
    shared: Arc<RendererShared>,
    pool: Option<ThreadPool>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(shared: Arc<RendererShared>, workers: usize) -> Result<Self, ThreadPoolBuildError> {
        if workers == 0 {
            log::info!("meshing inline on the render thread");
            return Ok(Self {
                shared,
                pool: None,
                workers: 0,
            });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-mesh-{i}"))
            .build()?;
        for _ in 0..workers {
            let shared = Arc::clone(&shared);
            pool.spawn(move || {
                while let Some(item) = shared.meshing.pop_blocking() {
                    process_item(&shared, item);
                }
            });
        }
        log::info!("started {workers} meshing workers");
        Ok(Self {
            shared,
            pool: Some(pool),
            workers,
        })
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.pool.is_none()
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Meshes up to `max` queued items on the calling thread. No-op with background workers.
    pub fn process_inline(&self, max: usize) -> usize {
        if self.pool.is_some() {
            return 0;
        }
        let mut n = 0;
        while n < max {
            let Some(item) = self.shared.meshing.pop() else {
                break;
            };
            process_item(&self.shared, item);
            n += 1;
        }
        n
    }

    /// Wakes and retires every worker, interrupts running builds and waits until the
    /// last one has returned. Call after switching the renderer to `Quitting`.
    pub fn shutdown(&self) {
        self.shared.meshing.stop();
        self.shared.tasks.interrupt_all();
        let mut waited = 0u32;
        while self.shared.stats.inflight() > 0 {
            thread::sleep(Duration::from_millis(1));
            waited += 1;
        }
        if waited > 0 {
            log::debug!(target: "meshing", "waited {waited}ms for running builds");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
