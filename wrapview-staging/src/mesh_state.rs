//! Mutex-guarded mesh domain: pending and processed points, the preview
//! and final meshes, and the published draw descriptor.
//!
//! Every read and write of these fields happens under one
//! `parking_lot::Mutex` paired with a `Condvar`. No method here calls into
//! the geometry engine or holds the lock across anything slower than a
//! clone of an `Arc`.

use crate::config::ReplacePolicy;
use crate::descriptor::{DisplayMode, DrawDescriptor, MeshHandle};
use crate::error::{Result, StagingError};
use crate::slot::Slot;
use log::debug;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use wrapview_core::{Point3f, PointCloud3f};

/// Why the pending point set was marked ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    Appended,
    Replaced,
    Triggered,
}

/// Lifecycle of the current wrap task instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPhase {
    /// Spawned, waiting to snapshot the pending points
    Armed,
    /// Snapshot taken, engine call in flight
    Running,
    /// Preview and descriptor updated
    Published,
    /// Finished without publishing
    Failed,
    /// Cancelled before the snapshot was taken
    Cancelled,
}

impl WrapPhase {
    /// The task will not touch the mesh state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, WrapPhase::Published | WrapPhase::Failed | WrapPhase::Cancelled)
    }
}

/// Everything the render loop needs for one frame, gathered under a single
/// lock acquisition
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub descriptor: DrawDescriptor,
    pub pending: Arc<PointCloud3f>,
    pub final_mesh: Option<MeshHandle>,
    /// Set when this snapshot applied an accept gesture
    pub accepted: Option<Result<MeshHandle>>,
}

/// The record behind the mesh lock
#[derive(Debug)]
pub struct MeshState {
    pending: Arc<PointCloud3f>,
    processed: Arc<PointCloud3f>,
    preview: Option<MeshHandle>,
    final_mesh: Option<MeshHandle>,
    descriptor: DrawDescriptor,
    ready: Slot<ReadySignal>,
    accept_requested: bool,
    phase: Option<WrapPhase>,
    next_generation: u64,
}

impl MeshState {
    fn new() -> Self {
        Self {
            pending: Arc::new(PointCloud3f::new()),
            processed: Arc::new(PointCloud3f::new()),
            preview: None,
            final_mesh: None,
            descriptor: DrawDescriptor::None,
            ready: Slot::empty(),
            accept_requested: false,
            phase: None,
            next_generation: 1,
        }
    }

    fn signal_ready(&mut self, signal: ReadySignal) {
        if let Some(previous) = self.ready.put(signal) {
            debug!("Readiness {:?} coalesced into {:?}", previous, signal);
        }
    }

    /// Copy the preview into the final slot. Only ever called with the mesh
    /// lock held.
    fn accept_preview(&mut self) -> Result<MeshHandle> {
        self.accept_requested = false;
        let preview = self.preview.clone().ok_or(StagingError::NoPreview)?;
        self.final_mesh = Some(preview.clone());
        Ok(preview)
    }
}

/// Mesh state shared between producers, the wrap task and the render loop
#[derive(Debug)]
pub struct SharedMeshState {
    state: Mutex<MeshState>,
    signal: Condvar,
}

impl SharedMeshState {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MeshState::new()),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MeshState> {
        self.state.lock()
    }

    /// Append points after the pending ones and signal readiness
    pub fn append(&self, points: &[Point3f]) {
        let mut state = self.lock();
        // Copy-on-write: a frame still holding the old Arc keeps its view
        Arc::make_mut(&mut state.pending).extend_from_slice(points);
        state.signal_ready(ReadySignal::Appended);
        debug!("Appended {} points ({} pending)", points.len(), state.pending.len());
        self.signal.notify_all();
    }

    /// Overwrite the pending points.
    ///
    /// Under [`ReplacePolicy::Backpressure`] the caller waits while an armed
    /// wrap task has not yet snapshotted the previous batch. With no armed
    /// task nothing can consume the readiness signal, so the overwrite is
    /// immediate.
    pub fn replace(&self, points: Vec<Point3f>, policy: ReplacePolicy) {
        let mut state = self.lock();
        if policy == ReplacePolicy::Backpressure {
            while state.ready.is_full() && state.phase == Some(WrapPhase::Armed) {
                debug!("Replace waiting for the armed wrap task to snapshot");
                self.signal.wait(&mut state);
            }
        }
        let count = points.len();
        state.pending = Arc::new(PointCloud3f::from_points(points));
        state.signal_ready(ReadySignal::Replaced);
        debug!("Replaced pending points with {} points", count);
        self.signal.notify_all();
    }

    /// Mark the pending points ready for a new task and record it as armed
    pub(crate) fn arm(&self) {
        let mut state = self.lock();
        state.signal_ready(ReadySignal::Triggered);
        state.phase = Some(WrapPhase::Armed);
        self.signal.notify_all();
    }

    /// Block until the pending points are ready, then snapshot them into
    /// `processed` and consume the readiness signal in the same critical
    /// section. Returns the generation assigned to this wrap and the
    /// snapshot, or `None` if the task was cancelled while armed.
    pub(crate) fn wait_snapshot(&self) -> Option<(u64, Arc<PointCloud3f>)> {
        let mut state = self.lock();
        loop {
            if state.phase != Some(WrapPhase::Armed) {
                return None;
            }
            if let Some(signal) = state.ready.take() {
                debug!("Wrap task consumed readiness ({:?})", signal);
                break;
            }
            self.signal.wait(&mut state);
        }

        state.processed = Arc::clone(&state.pending);
        state.phase = Some(WrapPhase::Running);
        let generation = state.next_generation;
        state.next_generation += 1;
        // Wake a replace() blocked on backpressure
        self.signal.notify_all();

        Some((generation, Arc::clone(&state.processed)))
    }

    /// Store a finished preview and publish a descriptor referencing it
    pub(crate) fn publish(&self, handle: MeshHandle) {
        let mut state = self.lock();
        state.preview = Some(handle.clone());
        state.descriptor = DrawDescriptor::PreviewMesh(handle);
        state.phase = Some(WrapPhase::Published);
        self.signal.notify_all();
    }

    /// Record that the running task ended without publishing
    pub(crate) fn mark_failed(&self) {
        let mut state = self.lock();
        state.phase = Some(WrapPhase::Failed);
        self.signal.notify_all();
    }

    /// Forget the phase of a task that has been joined
    pub(crate) fn clear_phase(&self) {
        let mut state = self.lock();
        state.phase = None;
        // A replace() waiting on the armed task must re-check its condition
        self.signal.notify_all();
    }

    /// Cancel the armed task before it snapshots. Fails once the engine
    /// call may have started.
    pub(crate) fn cancel_armed(&self) -> Result<bool> {
        let mut state = self.lock();
        match state.phase {
            Some(WrapPhase::Armed) => {
                state.phase = Some(WrapPhase::Cancelled);
                self.signal.notify_all();
                Ok(true)
            }
            Some(WrapPhase::Running) => Err(StagingError::CannotCancel),
            _ => Ok(false),
        }
    }

    /// Block while a task is armed or running
    pub(crate) fn wait_terminal(&self) {
        let mut state = self.lock();
        while matches!(state.phase, Some(WrapPhase::Armed) | Some(WrapPhase::Running)) {
            self.signal.wait(&mut state);
        }
    }

    pub fn phase(&self) -> Option<WrapPhase> {
        self.lock().phase
    }

    /// Copy the preview into the final mesh
    pub fn accept(&self) -> Result<MeshHandle> {
        self.lock().accept_preview()
    }

    /// Ask the render loop to accept on its next frame
    pub fn request_accept(&self) {
        self.lock().accept_requested = true;
    }

    pub fn accept_requested(&self) -> bool {
        self.lock().accept_requested
    }

    pub fn final_mesh(&self) -> Option<MeshHandle> {
        self.lock().final_mesh.clone()
    }

    pub fn preview(&self) -> Option<MeshHandle> {
        self.lock().preview.clone()
    }

    pub fn descriptor(&self) -> DrawDescriptor {
        self.lock().descriptor.clone()
    }

    pub fn pending(&self) -> Arc<PointCloud3f> {
        Arc::clone(&self.lock().pending)
    }

    pub fn processed(&self) -> Arc<PointCloud3f> {
        Arc::clone(&self.lock().processed)
    }

    /// Whether the pending points carry an unconsumed readiness signal
    pub fn is_ready(&self) -> bool {
        self.lock().ready.is_full()
    }

    /// Publish a descriptor chosen by a display toggle. Returns false when
    /// the requested artifact does not exist yet; the current descriptor is
    /// then left alone.
    pub fn display(&self, mode: DisplayMode) -> bool {
        let mut state = self.lock();
        let descriptor = match mode {
            DisplayMode::Nothing => DrawDescriptor::None,
            DisplayMode::Points => DrawDescriptor::Points(Arc::clone(&state.pending)),
            DisplayMode::Preview => match &state.preview {
                Some(handle) => DrawDescriptor::PreviewMesh(handle.clone()),
                None => return false,
            },
            DisplayMode::Final => match &state.final_mesh {
                Some(handle) => DrawDescriptor::FinalMesh(handle.clone()),
                None => return false,
            },
        };
        state.descriptor = descriptor;
        true
    }

    /// Gather one frame's worth of state and apply an accept gesture if one
    /// is flagged, all in one critical section
    pub fn frame_snapshot(&self, accept_gesture: bool) -> FrameSnapshot {
        let mut state = self.lock();
        let accepted = if accept_gesture || state.accept_requested {
            Some(state.accept_preview())
        } else {
            None
        };
        FrameSnapshot {
            descriptor: state.descriptor.clone(),
            pending: Arc::clone(&state.pending),
            final_mesh: state.final_mesh.clone(),
            accepted,
        }
    }
}

impl Default for SharedMeshState {
    fn default() -> Self {
        Self::new()
    }
}
