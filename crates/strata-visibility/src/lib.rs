//! Section visibility: occlusion-aware flood fill from the camera plus memoized frustum tests.
#![forbid(unsafe_code)]

mod flood;
mod frustum_cache;
mod graph;
mod snapshot;

pub use frustum_cache::FrustumCache;
pub use graph::{VisibilityGraph, VisibilitySettings};
pub use snapshot::VisibilitySnapshot;
