//! Visualization for wrapview
//! 
//! This crate turns the staging state into draw calls once per frame:
//! - [`RenderSurface`] abstracts the window and graphics backend
//! - [`RenderLoop`] drives frames and forwards UI gestures
//! - [`HeadlessSurface`] records draw calls without a display
//! - [`Camera`] holds the view and projection

pub mod camera;
pub mod headless;
pub mod render_loop;
pub mod surface;

pub use camera::*;
pub use headless::*;
pub use render_loop::*;
pub use surface::*;

use std::sync::Arc;
use wrapview_core::Result;
use wrapview_staging::StagingController;

/// Render `frames` frames of the controller's state on a headless surface
pub fn run_headless(
    controller: Arc<StagingController>,
    frames: usize,
) -> Result<(RenderStats, HeadlessSurface)> {
    let controls = UiControls::from_config(controller.config());
    let surface = HeadlessSurface::new(controls).with_frame_limit(frames);
    let mut render_loop = RenderLoop::new(controller, surface, RenderConfig::default());
    let stats = render_loop.run()?;
    Ok((stats, render_loop.into_surface()))
}
