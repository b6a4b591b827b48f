use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use strata_blocks::{Block, BlockRegistry};
use strata_geom::{Aabb, Frustum, Vec3};
use strata_visibility::{VisibilityGraph, VisibilitySettings};
use strata_world::{ChunkPosition, Dimension, Section, SectionPosition, SharedWorld, World};

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

fn fill(world: &SharedWorld, pos: SectionPosition, name: &str) {
    let mut w = world.write();
    let reg = Arc::clone(w.registry());
    let block = reg.make_block_by_name(name).unwrap();
    w.set_section(pos, Some(Section::from_blocks(vec![block; 4096], &reg)))
        .unwrap();
}

fn graph(world: &SharedWorld, occlusion_culling: bool, view_distance: i32) -> VisibilityGraph {
    let g = VisibilityGraph::new(
        Arc::clone(world),
        VisibilitySettings {
            view_distance,
            occlusion_culling,
        },
    );
    g.set_frustum(Frustum::everything());
    g
}

fn visible(g: &VisibilityGraph, pos: SectionPosition) -> bool {
    g.snapshot().is_position_visible(pos)
}

#[test]
fn opaque_section_hides_what_is_behind_it() {
    let w = world(3, 1);
    fill(&w, SectionPosition::new(0, 0, 1), "stone");
    fill(&w, SectionPosition::new(0, 0, 2), "glass");

    let g = graph(&w, true, 3);
    g.update_camera(SectionPosition::new(0, 0, 0));
    assert!(visible(&g, SectionPosition::new(0, 0, 0)));
    assert!(visible(&g, SectionPosition::new(0, 0, 1)));
    assert!(!visible(&g, SectionPosition::new(0, 0, 2)));
    // The wall only shadows its own row.
    assert!(visible(&g, SectionPosition::new(1, 0, 2)));

    let open = graph(&w, false, 3);
    open.update_camera(SectionPosition::new(0, 0, 0));
    assert!(visible(&open, SectionPosition::new(0, 0, 1)));
    assert!(visible(&open, SectionPosition::new(0, 0, 2)));
}

#[test]
fn enclosed_camera_sees_only_its_shell() {
    let w = world(3, 3);
    for (x, y, z) in [(1, 1, 0), (-1, 1, 0), (0, 1, 1), (0, 1, -1), (0, 0, 0), (0, 2, 0)] {
        fill(&w, SectionPosition::new(x, y, z), "stone");
    }
    let g = graph(&w, true, 3);
    g.update_camera(SectionPosition::new(0, 1, 0));
    let mut marked = g.snapshot().marked_sections();
    marked.sort_by_key(|p| (p.x, p.y, p.z));
    let mut expected = vec![
        SectionPosition::new(0, 1, 0),
        SectionPosition::new(1, 1, 0),
        SectionPosition::new(-1, 1, 0),
        SectionPosition::new(0, 1, 1),
        SectionPosition::new(0, 1, -1),
        SectionPosition::new(0, 0, 0),
        SectionPosition::new(0, 2, 0),
    ];
    expected.sort_by_key(|p| (p.x, p.y, p.z));
    assert_eq!(marked, expected);
    assert!(!g.snapshot().is_chunk_visible(ChunkPosition::new(2, 0)));
}

#[test]
fn nothing_beyond_view_distance_is_marked() {
    let w = world(5, 2);
    let g = graph(&w, true, 2);
    g.update_camera(SectionPosition::new(1, 0, -1));
    let snap = g.snapshot();
    let marked = snap.marked_sections();
    assert!(!marked.is_empty());
    for p in marked {
        assert!(p.chunk().chebyshev(ChunkPosition::new(1, -1)) <= 2, "{p:?}");
    }
    assert!(!snap.is_chunk_visible(ChunkPosition::new(4, -1)));
    assert!(snap.is_chunk_visible(ChunkPosition::new(3, 1)));
}

#[test]
fn missing_camera_column_defers_the_rebuild() {
    let w = world(1, 1);
    let g = graph(&w, true, 2);
    assert!(!g.update_camera(SectionPosition::new(5, 0, 5)));
    assert!(g.snapshot().marked_sections().is_empty());
    assert!(g.is_invalid());
    assert!(!g.draw(), "still missing");
    assert!(g.is_invalid(), "invalid graph retries every frame");

    w.write()
        .insert_column(ChunkPosition::new(5, 5), vec![None])
        .unwrap();
    assert!(g.draw());
    assert!(!g.is_invalid());
    assert!(g.snapshot().is_marked(SectionPosition::new(5, 0, 5)));
}

#[test]
fn nothing_is_built_before_the_first_camera() {
    let w = world(2, 1);
    let g = graph(&w, false, 2);
    assert!(g.camera().is_none());
    assert!(!g.draw());
    assert!(!g.rebuild());
    assert!(g.is_invalid());
    assert_eq!(g.snapshot().revision(), 0);
    assert!(g.snapshot().marked_sections().is_empty());
    assert!(!visible(&g, SectionPosition::new(0, 0, 0)));

    assert!(g.update_camera(SectionPosition::new(1, 0, 1)));
    assert!(!g.is_invalid());
    assert_eq!(g.snapshot().camera(), SectionPosition::new(1, 0, 1));
    assert!(visible(&g, SectionPosition::new(0, 0, 0)));
}

#[test]
fn draw_rebuilds_on_invalidation_and_frustum_change_only() {
    let w = world(2, 1);
    let g = graph(&w, true, 2);
    g.update_camera(SectionPosition::new(0, 0, 0));
    g.draw();
    let rev = g.snapshot().revision();
    assert!(!g.draw());
    assert_eq!(g.snapshot().revision(), rev);

    g.set_frustum(Frustum::perspective(
        Vec3::new(8.0, 8.0, 8.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::UP,
        1.2,
        1.0,
        0.1,
        100.0,
    ));
    assert!(g.draw());
    assert!(g.snapshot().revision() > rev);

    let events = w.write().subscribe();
    fill(&w, SectionPosition::new(1, 0, 0), "stone");
    for e in events.try_iter() {
        g.on_world_event(&e);
    }
    assert!(g.is_invalid());
    assert!(g.draw());
}

#[test]
fn frustum_limits_flood_but_not_camera_neighbours() {
    let w = world(4, 1);
    let g = graph(&w, true, 4);
    // Looking east from the middle of the camera section.
    g.set_frustum(Frustum::perspective(
        Vec3::new(8.0, 8.0, 8.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::UP,
        1.0,
        1.0,
        0.1,
        200.0,
    ));
    g.update_camera(SectionPosition::new(0, 0, 0));
    let snap = g.snapshot();
    assert!(snap.is_marked(SectionPosition::new(-1, 0, 0)));
    assert!(!snap.is_marked(SectionPosition::new(-2, 0, 0)));
    assert!(snap.is_marked(SectionPosition::new(3, 0, 0)));
    assert!(!snap.is_position_visible(SectionPosition::new(-1, 0, 0)));
}

#[test]
fn camera_above_world_sees_down() {
    let w = world(2, 2);
    let g = graph(&w, true, 2);
    g.update_camera(SectionPosition::new(0, 9, 0));
    let snap = g.snapshot();
    assert!(snap.is_marked(SectionPosition::new(0, 1, 0)));
    assert!(snap.is_marked(SectionPosition::new(0, 0, 0)));
    assert!(snap.is_marked(SectionPosition::new(1, 1, 1)));
}

#[test]
fn aabb_queries_follow_marks() {
    let w = world(3, 1);
    fill(&w, SectionPosition::new(0, 0, 1), "stone");
    let g = graph(&w, true, 3);
    g.update_camera(SectionPosition::new(0, 0, 0));
    let behind = Aabb::new(Vec3::new(4.0, 2.0, 36.0), Vec3::new(5.0, 3.0, 37.0));
    assert!(g.is_aabb_occluded(&behind));
    assert!(!g.is_aabb_visible(&behind));
    let near = Aabb::new(Vec3::new(4.0, 2.0, 4.0), Vec3::new(5.0, 3.0, 5.0));
    assert!(!g.is_aabb_occluded(&near));
    assert!(g.is_aabb_visible(&near));
    // Straddling into the hidden section still counts as visible.
    let straddle = Aabb::new(Vec3::new(4.0, 2.0, 14.0), Vec3::new(5.0, 3.0, 40.0));
    assert!(!g.is_aabb_occluded(&straddle));
}

#[test]
fn readers_never_see_a_half_built_graph() {
    let w = world(4, 2);
    let g = Arc::new(graph(&w, true, 3));
    g.update_camera(SectionPosition::new(0, 0, 0));
    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let g = Arc::clone(&g);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut seen = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    let snap = g.snapshot();
                    assert!(snap.is_marked(snap.camera()));
                    let marked = snap.marked_sections();
                    assert!(marked.iter().all(|p| p.chunk().chebyshev(snap.camera().chunk()) <= 3));
                    seen = seen.max(snap.revision());
                }
                seen
            })
        })
        .collect();
    for i in 0..200 {
        let x = (i % 5) - 2;
        g.update_camera(SectionPosition::new(x, i % 2, 0));
    }
    stop.store(true, Ordering::Relaxed);
    for r in readers {
        assert!(r.join().unwrap() >= 1);
    }
}

#[test]
fn section_edits_without_occlusion_change_keep_graph() {
    let w = world(1, 1);
    let g = graph(&w, true, 1);
    g.update_camera(SectionPosition::new(0, 0, 0));
    let events = w.write().subscribe();
    let stone = w.read().registry().make_block_by_name("stone").unwrap();
    w.write()
        .set_block(strata_world::BlockPosition::new(3, 3, 3), stone)
        .unwrap();
    w.write()
        .set_block(strata_world::BlockPosition::new(3, 3, 3), Block::AIR)
        .unwrap();
    for e in events.try_iter() {
        g.on_world_event(&e);
    }
    assert!(!g.is_invalid());
}

#[test]
fn moving_into_an_unloaded_column_keeps_the_previous_graph() {
    let w = world(1, 1);
    let g = graph(&w, true, 1);
    assert!(g.update_camera(SectionPosition::new(0, 0, 0)));
    let before = g.snapshot();
    assert!(!g.update_camera(SectionPosition::new(9, 0, 9)));
    let after = g.snapshot();
    assert_eq!(after.revision(), before.revision());
    assert_eq!(after.camera(), SectionPosition::new(0, 0, 0));
    assert!(after.is_marked(SectionPosition::new(1, 0, 1)));
}
