//! Public coordinator of the staging pipeline.
//!
//! The controller owns the two lock domains, the geometry engine and the
//! single outstanding [`WrapTaskHandle`]. A new wrap is only spawned after
//! the previous handle has been joined, so two tasks never share the
//! processed/preview state.
//!
//! Lock order is task handle, then mesh. The pose lock is never taken while
//! either of the others is held.

use crate::config::StagingConfig;
use crate::descriptor::{DisplayMode, DrawDescriptor, MeshHandle};
use crate::engine::GeometryEngine;
use crate::error::{Result, StagingError};
use crate::mesh_state::{FrameSnapshot, SharedMeshState, WrapPhase};
use crate::params::GeometryParams;
use crate::pose_state::SharedPoseState;
use crate::task::{WrapOutcome, WrapTask, WrapTaskHandle};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use wrapview_core::{Point3f, PointCloud3f, Pose, TriangleMesh};

#[derive(Debug, Default)]
struct TaskSlot {
    handle: Option<WrapTaskHandle>,
    last_result: Option<Result<WrapOutcome>>,
}

/// Coordinates producers, the wrap task and the render loop
pub struct StagingController {
    mesh: Arc<SharedMeshState>,
    pose: SharedPoseState,
    engine: Arc<dyn GeometryEngine>,
    config: StagingConfig,
    task: Mutex<TaskSlot>,
}

impl StagingController {
    /// Create a controller around a geometry engine
    pub fn new(engine: Arc<dyn GeometryEngine>, config: StagingConfig) -> Self {
        Self {
            mesh: Arc::new(SharedMeshState::new()),
            pose: SharedPoseState::new(),
            engine,
            config,
            task: Mutex::new(TaskSlot::default()),
        }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Append points to the pending set
    pub fn add_point_cloud(&self, points: &[Point3f]) {
        self.mesh.append(points);
    }

    /// Replace the pending set, following the configured replace policy
    pub fn set_point_cloud(&self, points: Vec<Point3f>) {
        self.mesh.replace(points, self.config.replace_policy);
    }

    /// Publish the latest device pose
    pub fn update_pose(&self, pose: Pose) {
        self.pose.publish(pose);
    }

    /// Start a wrap of the pending points.
    ///
    /// Parameters are checked before anything else; a rejected call leaves
    /// all state untouched. Fails with [`StagingError::TaskAlreadyRunning`]
    /// while the previous task has not finished.
    pub fn trigger_wrap(&self, relative_alpha: f32, relative_offset: f32) -> Result<()> {
        let params = GeometryParams::new(relative_alpha, relative_offset)?;

        let mut task = self.task.lock();
        self.reap(&mut task)?;

        let handle = WrapTask::new(Arc::clone(&self.mesh), Arc::clone(&self.engine), params).spawn()?;
        task.handle = Some(handle);
        info!(
            "Wrap triggered (relative alpha {}, relative offset {})",
            relative_alpha, relative_offset
        );
        Ok(())
    }

    /// Trigger with the configured relative parameters
    pub fn trigger_wrap_default(&self) -> Result<()> {
        self.trigger_wrap(self.config.relative_alpha, self.config.relative_offset)
    }

    /// Join the outstanding task if it has reached a terminal phase
    fn reap(&self, task: &mut TaskSlot) -> Result<()> {
        let handle = match task.handle.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        // After its terminal phase the task only returns, so the join is short
        let terminal = handle.is_finished()
            || self.mesh.phase().map_or(true, |phase| phase.is_terminal());
        if !terminal {
            task.handle = Some(handle);
            return Err(StagingError::TaskAlreadyRunning);
        }

        let result = handle.join();
        self.mesh.clear_phase();
        debug!("Reaped wrap task: {:?}", result.as_ref().map(|o| o.generation));
        task.last_result = Some(result);
        Ok(())
    }

    /// Whether a wrap task is outstanding and not yet terminal
    pub fn is_wrap_running(&self) -> bool {
        let task = self.task.lock();
        task.handle.is_some()
            && matches!(self.mesh.phase(), Some(WrapPhase::Armed) | Some(WrapPhase::Running))
    }

    /// Block until the outstanding wrap finishes and return its result.
    /// Returns the previous result, or `None`, when nothing is running.
    pub fn wait_for_wrap(&self) -> Option<Result<WrapOutcome>> {
        loop {
            self.mesh.wait_terminal();
            let mut task = self.task.lock();
            match self.reap(&mut task) {
                Ok(()) => return task.last_result.clone(),
                // Another caller started a new task in between
                Err(_) => continue,
            }
        }
    }

    /// Result of the most recently finished wrap
    pub fn last_result(&self) -> Option<Result<WrapOutcome>> {
        let mut task = self.task.lock();
        let _ = self.reap(&mut task);
        task.last_result.clone()
    }

    /// Cancel a wrap that has not taken its snapshot yet. Returns whether a
    /// task was cancelled.
    pub fn cancel_wrap(&self) -> Result<bool> {
        let task = self.task.lock();
        if task.handle.is_none() {
            return Ok(false);
        }
        self.mesh.cancel_armed()
    }

    /// Copy the current preview into the final mesh
    pub fn accept_preview(&self) -> Result<MeshHandle> {
        let accepted = self.mesh.accept()?;
        info!("Accepted preview #{}", accepted.generation());
        Ok(accepted)
    }

    /// Flag an accept for the render loop to apply on its next frame
    pub fn request_accept(&self) {
        self.mesh.request_accept();
    }

    /// Copy of the accepted mesh
    pub fn get_final_mesh(&self) -> Option<TriangleMesh> {
        self.mesh.final_mesh().map(|handle| handle.mesh().clone())
    }

    /// Handle to the accepted mesh
    pub fn final_handle(&self) -> Option<MeshHandle> {
        self.mesh.final_mesh()
    }

    /// Copy of the latest preview
    pub fn get_preview_mesh(&self) -> Option<TriangleMesh> {
        self.mesh.preview().map(|handle| handle.mesh().clone())
    }

    /// Handle to the latest preview
    pub fn preview_handle(&self) -> Option<MeshHandle> {
        self.mesh.preview()
    }

    /// Publish a descriptor for the given display toggle
    pub fn display(&self, mode: DisplayMode) -> bool {
        self.mesh.display(mode)
    }

    pub fn draw_descriptor(&self) -> DrawDescriptor {
        self.mesh.descriptor()
    }

    pub fn pending_points(&self) -> Arc<PointCloud3f> {
        self.mesh.pending()
    }

    pub fn processed_points(&self) -> Arc<PointCloud3f> {
        self.mesh.processed()
    }

    /// Gather what one frame needs, applying an accept if flagged
    pub fn frame_snapshot(&self, accept_gesture: bool) -> FrameSnapshot {
        let frame = self.mesh.frame_snapshot(accept_gesture);
        if let Some(Ok(handle)) = &frame.accepted {
            info!("Accepted preview #{}", handle.generation());
        }
        frame
    }

    /// Consume the pending pose, if any
    pub fn take_pose(&self) -> Option<Pose> {
        self.pose.take()
    }

    /// Wait for a new pose for at most `timeout`
    pub fn wait_pose(&self, timeout: Duration) -> Option<Pose> {
        self.pose.wait_take(timeout)
    }

    pub fn pose_update_count(&self) -> u64 {
        self.pose.update_count()
    }
}

impl Drop for StagingController {
    fn drop(&mut self) {
        // The engine call cannot be interrupted; wait for it like any owner would
        if let Some(handle) = self.task.get_mut().handle.take() {
            debug!("Joining outstanding wrap task on shutdown");
            let _ = handle.join();
        }
    }
}
