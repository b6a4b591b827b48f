use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;
use strata_visibility::VisibilitySnapshot;
use strata_world::{ChunkPosition, SectionPosition};

use crate::cancel::CancellationToken;

struct Task {
    position: SectionPosition,
    token: Arc<CancellationToken>,
}

/// Build tasks currently running on the workers.
#[derive(Default)]
pub struct MeshTaskManager {
    tasks: RwLock<HashMap<u64, Task>>,
    next: AtomicU64,
}

impl MeshTaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task for `position`; it stays registered until the guard drops.
    pub fn start(&self, position: SectionPosition) -> TaskGuard<'_> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let token = Arc::new(CancellationToken::new());
        self.tasks.write().insert(
            id,
            Task {
                position,
                token: Arc::clone(&token),
            },
        );
        TaskGuard {
            manager: self,
            id,
            position,
            token,
        }
    }

    fn interrupt_where(&self, mut hit: impl FnMut(SectionPosition) -> bool) -> usize {
        let tasks = self.tasks.read();
        let mut n = 0;
        for task in tasks.values() {
            if hit(task.position) && task.token.cancel() {
                n += 1;
            }
        }
        n
    }

    pub fn interrupt(&self, position: SectionPosition) -> usize {
        self.interrupt_where(|p| p == position)
    }

    pub fn interrupt_chunk(&self, chunk: ChunkPosition) -> usize {
        self.interrupt_where(|p| p.chunk() == chunk)
    }

    pub fn interrupt_all(&self) -> usize {
        self.interrupt_where(|_| true)
    }

    /// Interrupts tasks whose column is no longer visible.
    pub fn cleanup(&self, visibility: &VisibilitySnapshot) -> usize {
        let n = self.interrupt_where(|p| !visibility.is_chunk_visible(p.chunk()));
        if n > 0 {
            log::debug!(target: "queue", "interrupted {n} meshing tasks for hidden columns");
        }
        n
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration of one running task. Dropping it deregisters the task on every exit path.
pub struct TaskGuard<'a> {
    manager: &'a MeshTaskManager,
    id: u64,
    position: SectionPosition,
    token: Arc<CancellationToken>,
}

impl TaskGuard<'_> {
    #[inline]
    pub fn position(&self) -> SectionPosition {
        self.position
    }

    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.manager.tasks.write().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_deregister_on_drop() {
        let m = MeshTaskManager::new();
        {
            let _a = m.start(SectionPosition::new(0, 0, 0));
            let _b = m.start(SectionPosition::new(0, 1, 0));
            assert_eq!(m.len(), 2);
        }
        assert!(m.is_empty());
    }

    #[test]
    fn interrupts_by_section_and_chunk() {
        let m = MeshTaskManager::new();
        let a = m.start(SectionPosition::new(0, 0, 0));
        let b = m.start(SectionPosition::new(0, 1, 0));
        let c = m.start(SectionPosition::new(1, 0, 0));
        assert_eq!(m.interrupt(SectionPosition::new(0, 1, 0)), 1);
        assert!(b.token().is_cancelled());
        assert!(!a.token().is_cancelled());

        assert!(c.token().seal());
        assert_eq!(m.interrupt_chunk(ChunkPosition::new(1, 0)), 0, "sealed tasks finish");
        assert_eq!(m.interrupt_all(), 1);
        assert!(a.token().is_cancelled());
    }

    #[test]
    fn same_section_can_run_twice() {
        let m = MeshTaskManager::new();
        let a = m.start(SectionPosition::new(2, 0, 0));
        let b = m.start(SectionPosition::new(2, 0, 0));
        assert_eq!(m.interrupt(SectionPosition::new(2, 0, 0)), 2);
        drop(a);
        assert_eq!(m.len(), 1);
        drop(b);
        assert!(m.is_empty());
    }
}
