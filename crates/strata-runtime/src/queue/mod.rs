//! Queues between the queue master, the meshing workers, and the render thread.

mod comparator;
mod culled;
mod loading;
mod meshing;
mod unloading;

pub use comparator::QueueComparator;
pub use culled::CulledQueue;
pub use loading::LoadingQueue;
pub use meshing::MeshingQueue;
pub use unloading::UnloadingQueue;
