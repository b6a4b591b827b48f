//! In-memory section storage: columns, neighbour links, occlusion masks, and world events.
#![forbid(unsafe_code)]

pub mod column;
pub mod direction;
pub mod event;
pub mod generation;
pub mod occlusion;
pub mod position;
pub mod section;
pub mod world;

pub use column::{Column, ColumnId};
pub use direction::Direction;
pub use event::WorldEvent;
pub use generation::{TerrainGenerator, TerrainParams};
pub use occlusion::SectionOcclusion;
pub use position::{BlockPosition, ChunkPosition, InSectionPosition, SECTION_SIZE, SectionPosition};
pub use section::Section;
pub use world::{Dimension, SharedWorld, World, WorldError};
