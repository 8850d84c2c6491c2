//! The seam between the render loop and a windowing/graphics backend

use crate::camera::Camera;
use serde::{Deserialize, Serialize};
use wrapview_core::{Point3f, Result, TriangleMesh};
use wrapview_staging::StagingConfig;

/// RGBA colour with components in `[0, 1]`
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub size: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshStyle {
    pub color: Rgba,
}

/// A button that reads as pressed exactly once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Momentary {
    pressed: bool,
}

impl Momentary {
    pub fn press(&mut self) {
        self.pressed = true;
    }

    /// Read and clear the press
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// UI-bound cells the render loop polls once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct UiControls {
    pub show_points: bool,
    pub show_final_mesh: bool,
    pub relative_alpha: f32,
    pub relative_offset: f32,
    pub trigger_wrap: Momentary,
    pub accept_wrap: Momentary,
}

impl UiControls {
    /// Sliders start at the configured relative parameters
    pub fn from_config(config: &StagingConfig) -> Self {
        Self {
            show_points: false,
            show_final_mesh: false,
            relative_alpha: config.relative_alpha,
            relative_offset: config.relative_offset,
            trigger_wrap: Momentary::default(),
            accept_wrap: Momentary::default(),
        }
    }
}

impl Default for UiControls {
    fn default() -> Self {
        Self::from_config(&StagingConfig::default())
    }
}

/// Frame lifecycle, camera and primitive drawing of a display backend
pub trait RenderSurface {
    /// Whether the user or the host asked to close the view
    fn should_quit(&mut self) -> bool;

    /// Clear the frame
    fn begin_frame(&mut self);

    /// Load the camera transform for the following draw calls
    fn activate_camera(&mut self, camera: &Camera);

    fn draw_points(&mut self, points: &[Point3f], style: PointStyle);

    fn draw_lines(&mut self, segments: &[[Point3f; 2]], style: LineStyle);

    fn draw_mesh(&mut self, mesh: &TriangleMesh, style: MeshStyle);

    /// Present the frame and process window events
    fn end_frame(&mut self) -> Result<()>;

    /// Toggles, sliders and buttons bound to the UI
    fn controls(&mut self) -> &mut UiControls;
}
