//! Block ids, render kinds, and the registry the mesher and occlusion code read.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::{BlockRegistry, BlockType, RegistryError, SeamPolicy};
pub use types::{Block, BlockId, BlockState, RenderKind};
