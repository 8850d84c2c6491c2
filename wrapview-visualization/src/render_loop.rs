//! Per-frame driver: reads the shared staging state, draws it on a
//! [`RenderSurface`] and forwards UI gestures back to the controller.
//!
//! A frame takes the mesh lock exactly once, through
//! [`StagingController::frame_snapshot`], and draws from the `Arc` handles it
//! returns after the lock is gone. Pose reads go through their own lock and
//! never overlap the mesh critical section.

use crate::camera::Camera;
use crate::surface::{LineStyle, MeshStyle, PointStyle, Rgba, RenderSurface};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wrapview_core::{Point3f, Pose, Result, Vector3f};
use wrapview_staging::{DrawDescriptor, MeshHandle, PoseMode, StagingController};

/// Colours and sizes used when drawing a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub preview_point_size: f32,
    pub preview_point_color: Rgba,
    pub preview_edge_width: f32,
    pub preview_edge_color: Rgba,
    pub raw_point_size: f32,
    pub raw_point_color: Rgba,
    pub final_mesh_color: Rgba,
    pub pose_point_size: f32,
    pub pose_color: Rgba,
    pub pose_axis_length: f32,
    pub pose_axis_width: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preview_point_size: 3.0,
            preview_point_color: [1.0, 0.0, 0.0, 0.6],
            preview_edge_width: 1.0,
            preview_edge_color: [0.0, 0.0, 1.0, 0.6],
            raw_point_size: 1.0,
            raw_point_color: [0.8, 0.8, 0.8, 1.0],
            final_mesh_color: [0.2, 0.8, 0.2, 1.0],
            pose_point_size: 5.0,
            pose_color: [1.0, 1.0, 1.0, 1.0],
            pose_axis_length: 1.0,
            pose_axis_width: 2.0,
        }
    }
}

/// What a call to [`RenderLoop::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// No pose arrived in time under [`PoseMode::WaitForPose`]
    Skipped,
    Quit,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: usize,
    pub skipped_frames: usize,
    pub accepts: usize,
    pub rejected_accepts: usize,
    pub triggers: usize,
    pub rejected_triggers: usize,
}

pub struct RenderLoop<S: RenderSurface> {
    controller: Arc<StagingController>,
    surface: S,
    camera: Camera,
    config: RenderConfig,
    pose_mode: PoseMode,
    last_pose: Option<Pose>,
    stats: RenderStats,
}

impl<S: RenderSurface> RenderLoop<S> {
    pub fn new(controller: Arc<StagingController>, surface: S, config: RenderConfig) -> Self {
        let pose_mode = controller.config().pose_mode;
        Self {
            controller,
            surface,
            camera: Camera::default(),
            config,
            pose_mode,
            last_pose: None,
            stats: RenderStats::default(),
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Run frames until the surface asks to quit
    pub fn run(&mut self) -> Result<RenderStats> {
        info!("Render loop started ({:?} pose mode)", self.pose_mode);
        while self.step()? != FrameOutcome::Quit {}
        info!(
            "Render loop finished: {} frames, {} skipped",
            self.stats.frames, self.stats.skipped_frames
        );
        Ok(self.stats.clone())
    }

    /// Render a single frame
    pub fn step(&mut self) -> Result<FrameOutcome> {
        if self.surface.should_quit() {
            return Ok(FrameOutcome::Quit);
        }

        // In lock-step mode the frame is not opened until a pose is in hand
        if self.pose_mode == PoseMode::WaitForPose {
            let timeout = self.controller.config().pose_wait_timeout();
            match self.controller.wait_pose(timeout) {
                Some(pose) => self.last_pose = Some(pose),
                None => {
                    self.stats.skipped_frames += 1;
                    debug!("No pose within {:?}, frame skipped", timeout);
                    return Ok(FrameOutcome::Skipped);
                }
            }
        }

        self.surface.begin_frame();
        self.surface.activate_camera(&self.camera);

        if self.pose_mode == PoseMode::FreeRunning {
            if let Some(pose) = self.controller.take_pose() {
                self.last_pose = Some(pose);
            }
        }

        let accept_gesture = self.surface.controls().accept_wrap.take();
        let frame = self.controller.frame_snapshot(accept_gesture);
        match &frame.accepted {
            Some(Ok(_)) => self.stats.accepts += 1,
            Some(Err(e)) => {
                self.stats.rejected_accepts += 1;
                warn!("Accept ignored: {}", e);
            }
            None => {}
        }

        self.draw_descriptor(&frame.descriptor);

        let (show_points, show_final) = {
            let controls = self.surface.controls();
            (controls.show_points, controls.show_final_mesh)
        };
        if show_points && !frame.pending.is_empty() {
            let style = PointStyle {
                size: self.config.raw_point_size,
                color: self.config.raw_point_color,
            };
            self.surface.draw_points(frame.pending.as_slice(), style);
        }
        if show_final {
            if let Some(final_mesh) = &frame.final_mesh {
                let already_drawn = matches!(
                    &frame.descriptor,
                    DrawDescriptor::FinalMesh(shown) if shown.same_artifact(final_mesh)
                );
                if !already_drawn {
                    self.draw_final(final_mesh);
                }
            }
        }

        if let Some(pose) = self.last_pose {
            self.draw_pose(pose);
        }

        if self.surface.controls().trigger_wrap.take() {
            let (alpha, offset) = {
                let controls = self.surface.controls();
                (controls.relative_alpha, controls.relative_offset)
            };
            match self.controller.trigger_wrap(alpha, offset) {
                Ok(()) => self.stats.triggers += 1,
                Err(e) => {
                    self.stats.rejected_triggers += 1;
                    warn!("Wrap trigger rejected: {}", e);
                }
            }
        }

        self.surface.end_frame()?;
        self.stats.frames += 1;
        Ok(FrameOutcome::Rendered)
    }

    fn draw_descriptor(&mut self, descriptor: &DrawDescriptor) {
        match descriptor {
            DrawDescriptor::None => {}
            DrawDescriptor::Points(cloud) => {
                let style = PointStyle {
                    size: self.config.raw_point_size,
                    color: self.config.raw_point_color,
                };
                self.surface.draw_points(cloud.as_slice(), style);
            }
            DrawDescriptor::PreviewMesh(handle) => self.draw_preview(handle),
            DrawDescriptor::FinalMesh(handle) => self.draw_final(handle),
        }
    }

    fn draw_preview(&mut self, handle: &MeshHandle) {
        let point_style = PointStyle {
            size: self.config.preview_point_size,
            color: self.config.preview_point_color,
        };
        let edge_style = LineStyle {
            width: self.config.preview_edge_width,
            color: self.config.preview_edge_color,
        };
        self.surface.draw_points(&handle.mesh().vertices, point_style);
        self.surface.draw_lines(handle.wireframe(), edge_style);
    }

    fn draw_final(&mut self, handle: &MeshHandle) {
        let style = MeshStyle {
            color: self.config.final_mesh_color,
        };
        self.surface.draw_mesh(handle.mesh(), style);
    }

    fn draw_pose(&mut self, pose: Pose) {
        let point_style = PointStyle {
            size: self.config.pose_point_size,
            color: self.config.pose_color,
        };
        self.surface.draw_points(&[pose], point_style);

        let length = self.config.pose_axis_length;
        let axes: Vec<[Point3f; 2]> = [Vector3f::x(), Vector3f::y(), Vector3f::z()]
            .iter()
            .map(|axis| [pose, pose + axis * length])
            .collect();
        let axis_style = LineStyle {
            width: self.config.pose_axis_width,
            color: self.config.pose_color,
        };
        self.surface.draw_lines(&axes, axis_style);
    }
}
