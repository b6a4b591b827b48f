//! Section meshing runtime: queues, worker pool, mesh cache, and the renderer facade.
#![forbid(unsafe_code)]

mod cancel;
mod config;
mod context;
mod gpu;
mod item;
mod loaded;
mod master;
pub mod queue;
mod renderer;
mod tasks;
mod worker;

pub use cancel::CancellationToken;
pub use config::{ConfigError, RendererConfig};
pub use context::{PipelineStats, RenderState, RendererShared};
pub use gpu::{GpuBackend, HeadlessBackend};
pub use item::WorkItem;
pub use loaded::{DrawEntry, LoadedMeshes, VisibleMeshes};
pub use master::QueueMaster;
pub use renderer::{FrameStats, RendererError, SectionRenderer};
pub use tasks::{MeshTaskManager, TaskGuard};
pub use worker::{MeshOutcome, WorkerPool, process_item};
