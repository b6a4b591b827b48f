use strata_blocks::{Block, BlockRegistry, RenderKind};

use crate::occlusion::SectionOcclusion;
use crate::position::InSectionPosition;

pub const SECTION_VOLUME: usize = 16 * 16 * 16;

/// A 16^3 block cube plus the summaries the visibility and meshing code read.
#[derive(Clone, Debug)]
pub struct Section {
    blocks: Box<[Block]>,
    non_air: u16,
    fluids: u16,
    opaque: u16,
    min: InSectionPosition,
    max: InSectionPosition,
    occlusion: SectionOcclusion,
    revision: u64,
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

impl Section {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::AIR; SECTION_VOLUME].into_boxed_slice(),
            non_air: 0,
            fluids: 0,
            opaque: 0,
            min: InSectionPosition::MAX,
            max: InSectionPosition::MIN,
            occlusion: SectionOcclusion::NONE,
            revision: 0,
        }
    }

    /// Builds a section from `blocks` (indexed like `InSectionPosition::index`) and derives its summaries.
    pub fn from_blocks(blocks: Vec<Block>, registry: &BlockRegistry) -> Self {
        let mut blocks = blocks;
        blocks.resize(SECTION_VOLUME, Block::AIR);
        let mut s = Self {
            blocks: blocks.into_boxed_slice(),
            ..Self::new()
        };
        s.recount(registry);
        s.refresh(registry);
        s
    }

    #[inline]
    pub fn get(&self, pos: InSectionPosition) -> Block {
        self.blocks[pos.index()]
    }

    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Replaces one block and keeps the counters current. Call `refresh` afterwards
    /// to update bounds and occlusion. Returns the previous block.
    pub fn set(&mut self, pos: InSectionPosition, block: Block, registry: &BlockRegistry) -> Block {
        let i = pos.index();
        let prev = self.blocks[i];
        if prev == block {
            return prev;
        }
        self.account(prev, registry, false);
        self.account(block, registry, true);
        self.blocks[i] = block;
        prev
    }

    fn account(&mut self, block: Block, registry: &BlockRegistry, add: bool) {
        let apply = |v: &mut u16| {
            if add {
                *v += 1
            } else {
                *v -= 1
            }
        };
        if block.is_air() {
            return;
        }
        apply(&mut self.non_air);
        match registry.kind_of(block) {
            RenderKind::Opaque => apply(&mut self.opaque),
            RenderKind::Fluid => apply(&mut self.fluids),
            _ => {}
        }
    }

    fn recount(&mut self, registry: &BlockRegistry) {
        self.non_air = 0;
        self.fluids = 0;
        self.opaque = 0;
        for i in 0..SECTION_VOLUME {
            let b = self.blocks[i];
            self.account(b, registry, true);
        }
    }

    /// Recomputes the occupied bounds and the occlusion mask. Returns true when the mask changed.
    pub fn refresh(&mut self, registry: &BlockRegistry) -> bool {
        let mut min = InSectionPosition::MAX;
        let mut max = InSectionPosition::MIN;
        let mut opaque = vec![false; SECTION_VOLUME];
        for (i, b) in self.blocks.iter().enumerate() {
            if b.is_air() {
                continue;
            }
            let p = InSectionPosition::from_index(i);
            min = InSectionPosition {
                x: min.x.min(p.x),
                y: min.y.min(p.y),
                z: min.z.min(p.z),
            };
            max = InSectionPosition {
                x: max.x.max(p.x),
                y: max.y.max(p.y),
                z: max.z.max(p.z),
            };
            opaque[i] = registry.is_opaque(*b);
        }
        self.min = min;
        self.max = max;
        let occlusion = SectionOcclusion::compute(&opaque);
        let changed = occlusion != self.occlusion;
        self.occlusion = occlusion;
        changed
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_air == 0
    }

    #[inline]
    pub fn has_fluid(&self) -> bool {
        self.fluids > 0
    }

    #[inline]
    pub fn non_air_count(&self) -> usize {
        self.non_air as usize
    }

    #[inline]
    pub fn opaque_count(&self) -> usize {
        self.opaque as usize
    }

    #[inline]
    pub fn occlusion(&self) -> SectionOcclusion {
        self.occlusion
    }

    /// Smallest occupied corner; meaningless for an empty section.
    #[inline]
    pub fn min(&self) -> InSectionPosition {
        self.min
    }

    #[inline]
    pub fn max(&self) -> InSectionPosition {
        self.max
    }

    /// Monotonic stamp assigned by the world on every mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}
