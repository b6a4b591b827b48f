use crate::position::{ChunkPosition, InSectionPosition, SectionPosition};

/// Notifications published by the world to its subscribers after each mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    ChunkCreated(ChunkPosition),
    ChunkUnloaded(ChunkPosition),
    /// A neighbour link of `chunk` changed; `complete` is its new completeness.
    NeighbourChanged { chunk: ChunkPosition, complete: bool },
    SectionChanged {
        position: SectionPosition,
        in_section: InSectionPosition,
    },
    /// The whole section was swapped out; every face may have changed.
    SectionReplaced(SectionPosition),
    OcclusionChanged(SectionPosition),
}
