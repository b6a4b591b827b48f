use strata_world::{ChunkPosition, ColumnId, Direction, SectionOcclusion, World};

use crate::snapshot::VisibilitySnapshot;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FloodStats {
    pub steps: usize,
    pub marked: usize,
}

struct Step {
    column: ColumnId,
    chunk: ChunkPosition,
    index: i32,
    dir: Direction,
    // Direct neighbours of the camera are marked even when the frustum rejects them.
    ignore_frustum: bool,
}

/// Marks every section reachable from the camera in `snap`.
///
/// Travel along each axis is monotonic away from the camera, so the sign of
/// a step is a function of the section's offset from the camera. Each
/// section is expanded at most once per entry direction. Returns `None` when
/// the camera column is not loaded.
pub(crate) fn flood_fill(world: &World, snap: &mut VisibilitySnapshot) -> Option<FloodStats> {
    let cam_chunk = snap.camera.chunk();
    let cam_column = world.column_id(cam_chunk)?;
    let sections = snap.sections as i32;
    let max_index = sections - 1;
    let cam_index = (snap.camera.y - snap.min_section).clamp(-1, sections);
    let slot_len = snap.sections as usize + 2;

    let mut stats = FloodStats::default();
    let mut visited: Vec<Option<Box<[u8]>>> = vec![None; snap.columns.len()];
    let mut stack: Vec<Step> = Vec::with_capacity(512);

    if let Some(col) = snap.column_mut(cam_chunk) {
        col[(cam_index + 1) as usize] = true;
        stats.marked += 1;
    }
    for dir in Direction::ALL {
        let step = |column, chunk, index| Step {
            column,
            chunk,
            index,
            dir,
            ignore_frustum: true,
        };
        match dir {
            Direction::Down if (0..=max_index).contains(&(cam_index - 1)) => {
                stack.push(step(cam_column, cam_chunk, cam_index - 1));
            }
            Direction::Up if (0..=max_index).contains(&(cam_index + 1)) => {
                stack.push(step(cam_column, cam_chunk, cam_index + 1));
            }
            Direction::Down | Direction::Up => {}
            lateral => {
                if let Some(n) = world.neighbour_of(cam_column, lateral) {
                    stack.push(step(n, cam_chunk.neighbour(lateral), cam_index));
                }
            }
        }
    }

    while let Some(step) = stack.pop() {
        stats.steps += 1;
        if !snap.is_in_view_distance(step.chunk) {
            continue;
        }
        let Some(slot) = snap.slot(step.chunk) else {
            continue;
        };
        let pos = step.chunk.section(step.index + snap.min_section);
        if !step.ignore_frustum && !snap.frustum.contains_in_column(step.chunk, &pos.aabb()) {
            continue;
        }
        let flag = (step.index + 1) as usize;
        if let Some(col) = snap.column_mut(step.chunk) {
            if !col[flag] {
                col[flag] = true;
                stats.marked += 1;
            }
        }
        let seen = visited[slot].get_or_insert_with(|| vec![0u8; slot_len].into_boxed_slice());
        let bit = 1u8 << step.dir.index();
        if seen[flag] & bit != 0 {
            continue;
        }
        seen[flag] |= bit;

        let Some(column) = world.column_by_id(step.column) else {
            continue;
        };
        let occlusion = if (0..sections).contains(&step.index) {
            column
                .section(step.index as usize)
                .map_or(SectionOcclusion::NONE, |s| s.occlusion())
        } else {
            SectionOcclusion::NONE
        };
        let entry = step.dir.inverted();
        let sx = (step.chunk.x - cam_chunk.x).signum();
        let sy = (step.index - cam_index).signum();
        let sz = (step.chunk.z - cam_chunk.z).signum();

        for exit in Direction::ALL {
            let allowed = match exit {
                Direction::West => sx <= 0,
                Direction::East => sx >= 0,
                Direction::Down => sy <= 0 && step.index > 0,
                Direction::Up => sy >= 0 && step.index < max_index,
                Direction::North => sz <= 0,
                Direction::South => sz >= 0,
            };
            if !allowed || occlusion.is_occluded(entry, exit) {
                continue;
            }
            let next = match exit {
                Direction::Down => Step {
                    index: step.index - 1,
                    dir: exit,
                    ignore_frustum: false,
                    ..step
                },
                Direction::Up => Step {
                    index: step.index + 1,
                    dir: exit,
                    ignore_frustum: false,
                    ..step
                },
                lateral => {
                    let Some(n) = column.neighbour(lateral) else {
                        continue;
                    };
                    Step {
                        column: n,
                        chunk: step.chunk.neighbour(lateral),
                        index: step.index,
                        dir: exit,
                        ignore_frustum: false,
                    }
                }
            };
            stack.push(next);
        }
    }
    Some(stats)
}
