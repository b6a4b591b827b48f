use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use strata_blocks::{Block, BlockRegistry};
use strata_mesh_cpu::{ChunkMesher, MeshError, NeighborSnapshot, SectionMeshes, SectionMesher, SolidMesher};
use strata_runtime::{
    HeadlessBackend, MeshOutcome, RenderState, RendererConfig, RendererShared, SectionRenderer, process_item,
};
use strata_world::{BlockPosition, ChunkPosition, Dimension, SectionPosition, SharedWorld, World};

fn registry() -> Arc<BlockRegistry> {
    Arc::new(
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            name = "stone"
            [[blocks]]
            name = "glass"
            render = "translucent"
            "#,
        )
        .unwrap(),
    )
}

fn world(radius: i32, sections: u32) -> SharedWorld {
    let mut w = World::new(
        Dimension {
            min_section: 0,
            sections,
        },
        registry(),
    );
    for x in -radius..=radius {
        for z in -radius..=radius {
            w.insert_column(ChunkPosition::new(x, z), vec![None; sections as usize])
                .unwrap();
        }
    }
    w.into_shared()
}

fn put(world: &SharedWorld, (x, y, z): (i32, i32, i32), name: &str) {
    let mut w = world.write();
    let block = w.registry().make_block_by_name(name).unwrap();
    w.set_block(BlockPosition::new(x, y, z), block).unwrap();
}

fn clear(world: &SharedWorld, (x, y, z): (i32, i32, i32)) {
    world
        .write()
        .set_block(BlockPosition::new(x, y, z), Block::AIR)
        .unwrap();
}

fn config(view_distance: i32, worker_threads: usize) -> RendererConfig {
    RendererConfig {
        view_distance,
        worker_threads: Some(worker_threads),
        max_uploads_per_frame: 256,
        max_unloads_per_frame: 256,
        ..RendererConfig::default()
    }
}

fn inline_renderer(world: &SharedWorld, view_distance: i32) -> SectionRenderer {
    let r = SectionRenderer::new(Arc::clone(world), config(view_distance, 0)).unwrap();
    r.start();
    r.on_camera_moved(SectionPosition::new(0, 0, 0));
    r
}

/// Extra pass that runs `action` once, in the middle of the first build that reaches it.
struct MidBuild {
    armed: AtomicBool,
    action: Box<dyn Fn() + Send + Sync>,
}

impl SectionMesher for MidBuild {
    fn name(&self) -> &'static str {
        "mid-build"
    }

    fn mesh(&self, _: &NeighborSnapshot, _: &BlockRegistry, _: &mut SectionMeshes) -> Result<(), MeshError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            (self.action)();
        }
        Ok(())
    }
}

/// Started renderer looking from the origin whose mesher runs `action` during the first build.
fn renderer_with_hook(
    world: &SharedWorld,
    view_distance: i32,
    workers: usize,
    action: impl Fn() + Send + Sync + 'static,
) -> SectionRenderer {
    let registry = Arc::clone(world.read().registry());
    let hook = MidBuild {
        armed: AtomicBool::new(true),
        action: Box::new(action),
    };
    let passes: Vec<Box<dyn SectionMesher>> = vec![Box::new(SolidMesher), Box::new(hook)];
    let mesher = ChunkMesher::with_passes(registry, passes);
    let r = SectionRenderer::with_mesher(Arc::clone(world), config(view_distance, workers), mesher).unwrap();
    r.start();
    r.on_camera_moved(SectionPosition::new(0, 0, 0));
    r
}

/// Lets a hook reach the renderer it is part of.
type SharedSlot = Arc<OnceLock<Weak<RendererShared>>>;

fn with_shared(slot: &SharedSlot, f: impl FnOnce(&RendererShared)) {
    if let Some(shared) = slot.get().and_then(Weak::upgrade) {
        f(&shared);
    }
}

/// One stone block near the corner of section 0 of every column in range.
fn scatter_stone(world: &SharedWorld, radius: i32) {
    for x in -radius..=radius {
        for z in -radius..=radius {
            put(world, (x * 16 + 1, 1, z * 16 + 1), "stone");
        }
    }
}

#[test]
fn empty_sections_never_become_work() {
    let w = world(2, 2);
    put(&w, (1, 1, 1), "stone");
    put(&w, (1, 17, 1), "stone");
    clear(&w, (1, 17, 1));

    let r = inline_renderer(&w, 2);
    let shared = r.shared();
    assert!(shared.meshing.contains(SectionPosition::new(0, 0, 0)));
    assert!(!shared.meshing.contains(SectionPosition::new(0, 1, 0)));
    assert_eq!(shared.meshing.len(), 1);

    let mut gpu = HeadlessBackend::new();
    let stats = r.frame(&mut gpu);
    assert_eq!(stats.meshed, 1);
    assert_eq!(stats.uploaded, 1);
    assert!(shared.loaded.contains_section(SectionPosition::new(0, 0, 0)));
    assert!(!shared.loaded.contains_section(SectionPosition::new(0, 1, 0)));

    // Emptying a meshed section unloads it in the same frame.
    clear(&w, (1, 1, 1));
    let stats = r.frame(&mut gpu);
    assert_eq!(stats.released, 1);
    assert!(shared.loaded.is_empty());
    assert_eq!(gpu.live(), 0);
}

#[test]
fn losing_a_neighbour_after_queueing_unloads_instead_of_meshing() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let r = inline_renderer(&w, 2);
    let shared = r.shared();
    assert!(shared.meshing.contains(SectionPosition::new(0, 0, 0)));

    w.write().remove_column(ChunkPosition::new(1, 0));
    let item = shared.meshing.pop().unwrap();
    assert_eq!(process_item(shared, item), MeshOutcome::Unloaded);
    assert_eq!(shared.stats.count(MeshOutcome::Unloaded), 1);
    assert!(!shared.loaded.contains_section(SectionPosition::new(0, 0, 0)));
    assert!(shared.loading.is_empty());
}

#[test]
fn queueing_twice_creates_one_item() {
    let w = world(2, 1);
    scatter_stone(&w, 1);
    let r = inline_renderer(&w, 2);
    let shared = r.shared();
    let queued = shared.meshing.len();
    assert_eq!(queued, 9);

    let master = shared.master();
    assert!(!master.try_queue(SectionPosition::new(0, 0, 0), true));
    assert!(!master.try_queue(SectionPosition::new(1, 0, 1), false));
    assert_eq!(master.try_queue_world(), 0);
    assert_eq!(shared.meshing.len(), queued);
}

#[test]
fn remeshing_replaces_instead_of_duplicating() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let r = inline_renderer(&w, 2);
    let shared = r.shared();
    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    assert_eq!(gpu.live(), 1);

    assert!(shared.master().try_queue(SectionPosition::new(0, 0, 0), true));
    let stats = r.frame(&mut gpu);
    assert_eq!(stats.uploaded, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(shared.loaded.section_count(), 1);
    assert_eq!(gpu.live(), 1);
    assert_eq!(gpu.freed(), 1);
}

#[test]
fn border_edit_remeshes_the_neighbour_too() {
    let w = world(3, 1);
    put(&w, (15, 1, 1), "stone");
    put(&w, (17, 1, 1), "stone");
    let r = inline_renderer(&w, 3);
    let shared = r.shared();
    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    let installed = shared.stats.count(MeshOutcome::Installed);
    assert_eq!(installed, 2);

    put(&w, (15, 2, 1), "stone");
    let stats = r.frame(&mut gpu);
    assert!(stats.events >= 1);
    assert_eq!(shared.stats.count(MeshOutcome::Installed), installed + 2);
    assert_eq!(gpu.live(), 2);
}

#[test]
fn shrinking_view_distance_evicts_only_far_columns() {
    let w = world(3, 1);
    scatter_stone(&w, 3);
    let mut r = inline_renderer(&w, 3);
    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    // Edge columns lack a neighbour and stay unmeshed.
    assert_eq!(r.shared().loaded.section_count(), 25);
    assert_eq!(gpu.live(), 25);

    r.set_view_distance(1);
    let stats = r.frame(&mut gpu);
    assert_eq!(stats.released, 16);
    assert_eq!(gpu.live(), 9);
    let shared = r.shared();
    assert_eq!(shared.loaded.len(), 9);
    assert!(
        shared
            .loaded
            .chunks()
            .iter()
            .all(|c| c.chebyshev(ChunkPosition::new(0, 0)) <= 1)
    );
    assert!(shared.culled.contains(SectionPosition::new(2, 0, -2)));

    r.set_view_distance(3);
    r.frame(&mut gpu);
    assert_eq!(r.shared().loaded.section_count(), 25);
    assert_eq!(gpu.live(), 25);
}

#[test]
fn paused_renderer_refuses_new_work() {
    let w = world(2, 1);
    scatter_stone(&w, 1);
    let r = SectionRenderer::new(Arc::clone(&w), config(2, 0)).unwrap();
    r.set_state(RenderState::Paused);
    r.on_camera_moved(SectionPosition::new(0, 0, 0));
    let shared = r.shared();
    assert!(!shared.can_queue());
    assert!(!shared.master().try_queue(SectionPosition::new(0, 0, 0), true));
    assert_eq!(shared.master().try_queue_world(), 0);
    assert!(shared.meshing.is_empty());

    r.start();
    assert_eq!(shared.meshing.len(), 9);
}

#[test]
fn draw_list_orders_opaque_near_first_and_translucent_far_first() {
    let w = world(3, 1);
    put(&w, (1, 1, 1), "stone");
    put(&w, (17, 1, 1), "stone");
    put(&w, (33, 1, 1), "stone");
    put(&w, (1, 1, 17), "glass");
    put(&w, (1, 1, 33), "glass");
    let r = inline_renderer(&w, 3);
    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);

    let list = r.draw_list();
    let opaque: Vec<_> = list.opaque.iter().map(|e| e.position).collect();
    assert_eq!(
        opaque,
        vec![
            SectionPosition::new(0, 0, 0),
            SectionPosition::new(1, 0, 0),
            SectionPosition::new(2, 0, 0),
        ]
    );
    let translucent: Vec<_> = list.translucent.iter().map(|e| e.position).collect();
    assert_eq!(
        translucent,
        vec![SectionPosition::new(0, 0, 2), SectionPosition::new(0, 0, 1)]
    );
    assert_eq!(list.quads(), 5 * 6);
}

#[test]
fn unloading_a_column_frees_its_meshes_and_keeps_the_neighbours() {
    let w = world(2, 1);
    scatter_stone(&w, 1);
    let r = inline_renderer(&w, 2);
    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    assert_eq!(gpu.live(), 9);

    w.write().remove_column(ChunkPosition::new(1, 0));
    r.frame(&mut gpu);
    let shared = r.shared();
    assert!(!shared.loaded.contains(ChunkPosition::new(1, 0)));
    assert!(shared.loaded.contains(ChunkPosition::new(0, 0)));
    assert_eq!(gpu.live(), 8);
}

#[test]
fn worker_threads_mesh_everything_and_shutdown_frees_it() {
    let w = world(2, 1);
    scatter_stone(&w, 1);
    let r = SectionRenderer::new(Arc::clone(&w), config(2, 2)).unwrap();
    assert_eq!(r.workers(), 2usize.min(thread::available_parallelism().map_or(1, |n| n.get()).saturating_sub(1)).max(1));
    r.start();
    r.on_camera_moved(SectionPosition::new(0, 0, 0));

    let mut gpu = HeadlessBackend::new();
    let deadline = Instant::now() + Duration::from_secs(20);
    while gpu.live() < 9 {
        assert!(Instant::now() < deadline, "meshing did not finish");
        r.frame(&mut gpu);
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(r.shared().loaded.section_count(), 9);

    let released = r.shutdown(&mut gpu);
    assert_eq!(released, 9);
    assert_eq!(gpu.live(), 0);
    assert!(r.shared().loaded.is_empty());
    assert_eq!(r.shared().stats.inflight(), 0);
    assert_eq!(r.state(), RenderState::Quitting);
}

#[test]
fn editing_the_section_mid_build_requeues_it() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let edit = Arc::clone(&w);
    let r = renderer_with_hook(&w, 2, 0, move || put(&edit, (2, 1, 1), "stone"));
    let shared = r.shared();
    let pos = SectionPosition::new(0, 0, 0);

    let item = shared.meshing.pop().unwrap();
    assert_eq!(process_item(shared, item), MeshOutcome::Requeued);
    assert!(shared.meshing.contains(pos));
    assert!(!shared.loaded.contains_section(pos));

    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    assert!(shared.loaded.contains_section(pos));
    assert_eq!(r.draw_list().quads(), 10);
    assert_eq!(shared.stats.count(MeshOutcome::Requeued), 1);
}

#[test]
fn editing_a_neighbour_mid_build_requeues_the_section() {
    let w = world(2, 1);
    put(&w, (15, 1, 1), "stone");
    let edit = Arc::clone(&w);
    let r = renderer_with_hook(&w, 2, 0, move || put(&edit, (16, 1, 1), "stone"));
    let shared = r.shared();
    let pos = SectionPosition::new(0, 0, 0);
    assert_eq!(shared.meshing.len(), 1);

    // The centre revision is unchanged; only the east neighbour moved on.
    let item = shared.meshing.pop().unwrap();
    assert_eq!(process_item(shared, item), MeshOutcome::Requeued);
    assert!(shared.meshing.contains(pos));
    assert!(!shared.loaded.contains_section(pos));

    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    assert!(shared.loaded.contains_section(pos));
    assert!(shared.loaded.contains_section(SectionPosition::new(1, 0, 0)));
    // Both cubes lose the shared face.
    assert_eq!(r.draw_list().quads(), 10);
}

#[test]
fn interrupting_mid_build_cancels_the_install() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let pos = SectionPosition::new(0, 0, 0);
    let slot = SharedSlot::default();
    let hook = Arc::clone(&slot);
    let r = renderer_with_hook(&w, 2, 0, move || {
        with_shared(&hook, |shared| {
            shared.tasks.interrupt(pos);
        })
    });
    slot.set(Arc::downgrade(r.shared())).unwrap();
    let shared = r.shared();

    let item = shared.meshing.pop().unwrap();
    assert_eq!(process_item(shared, item), MeshOutcome::Cancelled);
    assert_eq!(shared.stats.count(MeshOutcome::Cancelled), 1);
    assert!(!shared.loaded.contains_section(pos));
    assert!(shared.loading.is_empty());
    assert!(shared.tasks.is_empty());
}

#[test]
fn section_hidden_mid_build_is_parked_in_culled() {
    let w = world(5, 1);
    put(&w, (1, 1, 1), "stone");
    let pos = SectionPosition::new(0, 0, 0);
    let slot = SharedSlot::default();
    let hook = Arc::clone(&slot);
    let r = renderer_with_hook(&w, 2, 0, move || {
        with_shared(&hook, |shared| {
            shared.graph.update_camera(SectionPosition::new(4, 0, 4));
        })
    });
    slot.set(Arc::downgrade(r.shared())).unwrap();
    let shared = r.shared();

    let item = shared.meshing.pop().unwrap();
    assert_eq!(process_item(shared, item), MeshOutcome::Discarded);
    assert!(shared.culled.contains(pos));
    assert!(!shared.loaded.contains_section(pos));
    assert!(shared.loading.is_empty());
}

#[test]
fn mesher_error_discards_only_the_failing_section() {
    let w = world(3, 1);
    put(&w, (1, 1, 1), "stone");
    w.write()
        .set_block(BlockPosition::new(17, 1, 1), Block::new(99, 0))
        .unwrap();
    let r = inline_renderer(&w, 3);
    let shared = r.shared();
    assert_eq!(shared.meshing.len(), 2);

    let mut gpu = HeadlessBackend::new();
    r.frame(&mut gpu);
    assert_eq!(shared.stats.count(MeshOutcome::Installed), 1);
    assert_eq!(shared.stats.count(MeshOutcome::Discarded), 1);
    assert!(shared.loaded.contains_section(SectionPosition::new(0, 0, 0)));
    assert!(!shared.loaded.contains_section(SectionPosition::new(1, 0, 0)));
    assert_eq!(gpu.live(), 1);
}

#[test]
fn nothing_is_meshed_before_the_first_camera() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let r = SectionRenderer::new(Arc::clone(&w), config(2, 0)).unwrap();
    r.start();
    let shared = r.shared();
    let mut gpu = HeadlessBackend::new();
    let stats = r.frame(&mut gpu);
    assert!(!stats.rebuilt);
    assert_eq!(stats.meshed, 0);
    assert!(shared.meshing.is_empty());
    assert!(shared.culled.contains(SectionPosition::new(0, 0, 0)));
    assert!(r.draw_list().opaque.is_empty());

    assert!(r.on_camera_moved(SectionPosition::new(0, 0, 0)));
    assert!(shared.meshing.contains(SectionPosition::new(0, 0, 0)));
    r.frame(&mut gpu);
    assert_eq!(gpu.live(), 1);
}

#[test]
fn shutdown_waits_for_running_builds() {
    let w = world(2, 1);
    put(&w, (1, 1, 1), "stone");
    let (started_tx, started) = crossbeam_channel::bounded(1);
    let r = renderer_with_hook(&w, 2, 1, move || {
        started_tx.send(()).ok();
        thread::sleep(Duration::from_millis(100));
    });
    started.recv_timeout(Duration::from_secs(20)).unwrap();

    let mut gpu = HeadlessBackend::new();
    r.shutdown(&mut gpu);
    let shared = r.shared();
    assert_eq!(shared.stats.inflight(), 0);
    assert_eq!(shared.stats.count(MeshOutcome::Cancelled), 1);
    assert!(shared.loaded.is_empty());
    assert!(shared.loading.is_empty());
    assert_eq!(gpu.live(), 0);
}
