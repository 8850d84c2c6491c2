//! Mutex-guarded pose domain.
//!
//! Independent of the mesh domain: a slow wrap never delays pose
//! rendering, and no code path holds this lock together with the mesh lock.

use crate::slot::Slot;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use wrapview_core::Pose;

#[derive(Debug, Default)]
struct PoseState {
    ready: Slot<Pose>,
    updates: u64,
}

/// Latest device pose, handed from producers to the render loop
#[derive(Debug, Default)]
pub struct SharedPoseState {
    state: Mutex<PoseState>,
    signal: Condvar,
}

impl SharedPoseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the pending pose. Earlier unconsumed poses are dropped;
    /// there is no history.
    pub fn publish(&self, pose: Pose) {
        let mut state = self.state.lock();
        state.ready.put(pose);
        state.updates += 1;
        self.signal.notify_all();
    }

    /// Consume the pending pose, if any
    pub fn take(&self) -> Option<Pose> {
        self.state.lock().ready.take()
    }

    /// Wait up to `timeout` for a pose and consume it
    pub fn wait_take(&self, timeout: Duration) -> Option<Pose> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(pose) = state.ready.take() {
                return Some(pose);
            }
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                return state.ready.take();
            }
        }
    }

    /// Total number of poses published so far
    pub fn update_count(&self) -> u64 {
        self.state.lock().updates
    }
}
