//! One-shot wrap task
//!
//! A [`WrapTask`] performs exactly one wrap: wait for the pending points,
//! snapshot them, run the engine with no lock held, publish the preview.
//! Then its thread ends. Retriggering always builds a new task.

use crate::descriptor::MeshHandle;
use crate::engine::GeometryEngine;
use crate::error::{Result, StagingError};
use crate::mesh_state::SharedMeshState;
use crate::params::{AbsoluteParams, GeometryParams};
use log::{debug, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wrapview_core::{Drawable, PointCloud3f};

/// Summary of a published wrap
#[derive(Debug, Clone, PartialEq)]
pub struct WrapOutcome {
    /// Generation of the published preview
    pub generation: u64,
    /// Number of points in the processed snapshot
    pub point_count: usize,
    /// Absolute parameters the engine was called with
    pub params: AbsoluteParams,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Time spent inside the engine
    pub elapsed: Duration,
}

/// A wrap waiting to be spawned
pub struct WrapTask {
    shared: Arc<SharedMeshState>,
    engine: Arc<dyn GeometryEngine>,
    params: GeometryParams,
}

impl WrapTask {
    pub fn new(
        shared: Arc<SharedMeshState>,
        engine: Arc<dyn GeometryEngine>,
        params: GeometryParams,
    ) -> Self {
        Self {
            shared,
            engine,
            params,
        }
    }

    /// Arm the shared state and start the task on its own thread
    pub fn spawn(self) -> Result<WrapTaskHandle> {
        self.shared.arm();
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("wrapview-wrap".to_string())
            .spawn(move || self.run())
            .map_err(|e| {
                shared.clear_phase();
                StagingError::GeometryFailure(format!("failed to start wrap thread: {}", e))
            })?;
        Ok(WrapTaskHandle { handle })
    }

    fn run(self) -> Result<WrapOutcome> {
        let (generation, processed) = match self.shared.wait_snapshot() {
            Some(snapshot) => snapshot,
            None => {
                debug!("Wrap task cancelled before snapshot");
                return Err(StagingError::Cancelled);
            }
        };

        match self.compute(generation, &processed) {
            Ok((handle, outcome)) => {
                self.shared.publish(handle);
                info!(
                    "Published preview #{}: {} vertices, {} faces from {} points in {:.2?}",
                    outcome.generation,
                    outcome.vertex_count,
                    outcome.face_count,
                    outcome.point_count,
                    outcome.elapsed
                );
                Ok(outcome)
            }
            Err(e) => {
                self.shared.mark_failed();
                warn!("Wrap #{} failed: {}", generation, e);
                Err(e)
            }
        }
    }

    /// Everything between snapshot and publish. Runs with no lock held.
    fn compute(
        &self,
        generation: u64,
        processed: &PointCloud3f,
    ) -> Result<(MeshHandle, WrapOutcome)> {
        let diagonal = processed.bounding_diagonal().ok_or_else(|| {
            StagingError::EmptyOrDegenerateInput("no points to wrap".to_string())
        })?;
        let params = self.params.absolute(diagonal)?;
        debug!(
            "Wrap #{} with {}: diagonal {}, alpha {}, offset {}",
            generation,
            self.engine.name(),
            params.diagonal,
            params.alpha,
            params.offset
        );

        let start = Instant::now();
        let engine = &self.engine;
        let mesh = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.wrap(processed.as_slice(), params.alpha, params.offset)
        }))
        .map_err(|payload| StagingError::TaskPanicked(panic_message(payload.as_ref())))??;
        let elapsed = start.elapsed();

        if mesh.is_empty() {
            return Err(StagingError::GeometryFailure(
                "engine returned an empty mesh".to_string(),
            ));
        }

        let outcome = WrapOutcome {
            generation,
            point_count: processed.len(),
            params,
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            elapsed,
        };
        Ok((MeshHandle::new(generation, mesh), outcome))
    }
}

/// Owned handle to a running wrap. Joining consumes it.
#[derive(Debug)]
pub struct WrapTaskHandle {
    handle: JoinHandle<Result<WrapOutcome>>,
}

impl WrapTaskHandle {
    /// Whether the task thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task and return its result
    pub fn join(self) -> Result<WrapOutcome> {
        self.handle
            .join()
            .map_err(|payload| StagingError::TaskPanicked(panic_message(payload.as_ref())))?
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
