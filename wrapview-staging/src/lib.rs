//! # wrapview staging
//!
//! Stages an expensive, asynchronously computed surface wrap for display
//! in a live viewer, while fast pose updates keep flowing.
//!
//! - [`SharedMeshState`]: pending/processed points, preview and final
//!   meshes, and the published [`DrawDescriptor`], behind one lock
//! - [`SharedPoseState`]: the latest device pose, behind its own lock
//! - [`WrapTask`]: one snapshot, one engine call, one publish
//! - [`StagingController`]: the public API tying them together
//! - [`GeometryEngine`]: the seam to the wrapping algorithm, with
//!   [`VoxelWrapEngine`] as a built-in implementation

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod mesh_state;
pub mod params;
pub mod pose_state;
pub mod slot;
pub mod task;

// Re-export commonly used items
pub use config::*;
pub use controller::*;
pub use descriptor::*;
pub use engine::*;
pub use error::*;
pub use mesh_state::*;
pub use params::*;
pub use pose_state::*;
pub use slot::*;
pub use task::*;
