//! Configuration for the staging pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What `set_point_cloud` does when an earlier batch has not been
/// snapshotted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Block until an armed wrap task has taken its snapshot
    Backpressure,
    /// Overwrite the pending points immediately
    Overwrite,
}

/// How the render loop consumes pose updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseMode {
    /// Render every frame with the newest pose seen so far
    FreeRunning,
    /// Render a frame only when a new pose has arrived
    WaitForPose,
}

/// Staging pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Relative alpha used when a wrap is triggered without explicit values
    pub relative_alpha: f32,
    /// Relative offset used when a wrap is triggered without explicit values
    pub relative_offset: f32,
    pub replace_policy: ReplacePolicy,
    pub pose_mode: PoseMode,
    /// Upper bound on a single pose wait in `WaitForPose` mode
    pub pose_wait_timeout_ms: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            relative_alpha: 10.0,
            relative_offset: 300.0,
            replace_policy: ReplacePolicy::Backpressure,
            pose_mode: PoseMode::FreeRunning,
            pose_wait_timeout_ms: 100,
        }
    }
}

impl StagingConfig {
    /// Set the default relative geometry parameters
    pub fn with_relative_params(mut self, relative_alpha: f32, relative_offset: f32) -> Self {
        self.relative_alpha = relative_alpha;
        self.relative_offset = relative_offset;
        self
    }

    /// Set the replace policy
    pub fn with_replace_policy(mut self, policy: ReplacePolicy) -> Self {
        self.replace_policy = policy;
        self
    }

    /// Set the pose consumption mode
    pub fn with_pose_mode(mut self, mode: PoseMode) -> Self {
        self.pose_mode = mode;
        self
    }

    /// Set the pose wait timeout
    pub fn with_pose_wait_timeout(mut self, timeout: Duration) -> Self {
        self.pose_wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn pose_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.pose_wait_timeout_ms)
    }
}
