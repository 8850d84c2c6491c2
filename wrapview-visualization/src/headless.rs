//! A surface that renders nothing and records what it was asked to draw.
//! Used for tests and for running the viewer without a display.

use crate::camera::Camera;
use crate::surface::{LineStyle, MeshStyle, PointStyle, RenderSurface, UiControls};
use nalgebra::Matrix4;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use wrapview_core::{Drawable, Error, Point3f, Result, TriangleMesh};

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Camera(Matrix4<f32>),
    Points { points: Vec<Point3f>, style: PointStyle },
    Lines { segments: Vec<[Point3f; 2]>, style: LineStyle },
    Mesh {
        vertex_count: usize,
        face_count: usize,
        bounds: (Point3f, Point3f),
        style: MeshStyle,
    },
}

/// Calls recorded between `begin_frame` and `end_frame`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    pub index: usize,
    pub calls: Vec<DrawCall>,
}

impl FrameRecord {
    pub fn meshes(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Mesh { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Lines { .. }))
    }

    pub fn points(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Points { .. }))
    }
}

/// Shared flag asking a surface to quit
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    pub fn request_quit(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_quit(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Display-less [`RenderSurface`]
#[derive(Debug)]
pub struct HeadlessSurface {
    controls: UiControls,
    frames: VecDeque<FrameRecord>,
    current: Option<FrameRecord>,
    presented: usize,
    frame_limit: Option<usize>,
    history: usize,
    frame_interval: Option<Duration>,
    quit: QuitHandle,
}

impl HeadlessSurface {
    pub fn new(controls: UiControls) -> Self {
        Self {
            controls,
            frames: VecDeque::new(),
            current: None,
            presented: 0,
            frame_limit: None,
            history: 64,
            frame_interval: None,
            quit: QuitHandle::default(),
        }
    }

    /// Quit after this many presented frames
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Number of recent frames kept for inspection
    pub fn with_history(mut self, frames: usize) -> Self {
        self.history = frames.max(1);
        self
    }

    /// Sleep this long when presenting, standing in for vsync
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    /// Recent presented frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter()
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.back()
    }

    pub fn presented_frames(&self) -> usize {
        self.presented
    }

    fn record(&mut self, call: DrawCall) {
        if let Some(frame) = self.current.as_mut() {
            frame.calls.push(call);
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn should_quit(&mut self) -> bool {
        self.quit.is_quit() || self.frame_limit.map_or(false, |limit| self.presented >= limit)
    }

    fn begin_frame(&mut self) {
        self.current = Some(FrameRecord {
            index: self.presented,
            calls: Vec::new(),
        });
    }

    fn activate_camera(&mut self, camera: &Camera) {
        self.record(DrawCall::Camera(camera.view_projection()));
    }

    fn draw_points(&mut self, points: &[Point3f], style: PointStyle) {
        self.record(DrawCall::Points {
            points: points.to_vec(),
            style,
        });
    }

    fn draw_lines(&mut self, segments: &[[Point3f; 2]], style: LineStyle) {
        self.record(DrawCall::Lines {
            segments: segments.to_vec(),
            style,
        });
    }

    fn draw_mesh(&mut self, mesh: &TriangleMesh, style: MeshStyle) {
        self.record(DrawCall::Mesh {
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            bounds: mesh.bounding_box(),
            style,
        });
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self
            .current
            .take()
            .ok_or_else(|| Error::Visualization("end_frame without begin_frame".to_string()))?;
        if self.frames.len() == self.history {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.presented += 1;
        if let Some(interval) = self.frame_interval {
            thread::sleep(interval);
        }
        Ok(())
    }

    fn controls(&mut self) -> &mut UiControls {
        &mut self.controls
    }
}
