//! wrapview - wrap a point cloud while a live viewer keeps rendering
//!
//! Reads an XYZ point file, starts a surface wrap in the background, keeps
//! a headless render loop and a synthetic pose stream running while it
//! computes, then accepts the preview and saves it as an OFF mesh.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use wrapview_core::{Drawable, Point3f};
use wrapview_io::{output_name, read_points, write_mesh};
use wrapview_staging::StagingController;
use wrapview_visualization::{HeadlessSurface, RenderLoop, RenderStats, UiControls};

mod config;
use config::{LogLevel, WrapviewConfig};

#[derive(Parser, Debug)]
#[command(name = "wrapview")]
#[command(version, about = "Wrap a point cloud while a live viewer keeps rendering", long_about = None)]
struct Cli {
    /// XYZ point file
    #[arg(default_value = "../assets/mapPoints.xyz")]
    input: PathBuf,

    /// Bounding diagonal divided by this gives the absolute alpha
    relative_alpha: Option<f32>,

    /// Bounding diagonal divided by this gives the absolute offset
    relative_offset: Option<f32>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Number of synthetic pose updates sent while the wrap runs
    #[arg(long, default_value_t = 200)]
    pose_updates: u32,

    /// Milliseconds between pose updates
    #[arg(long, default_value_t = 100)]
    pose_interval_ms: u64,

    /// Directory the OFF file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn load_config(cli: &Cli) -> Result<WrapviewConfig> {
    let mut config = match &cli.config {
        Some(path) => WrapviewConfig::load(path)?,
        None => WrapviewConfig::default(),
    };
    if let Some(alpha) = cli.relative_alpha {
        config.staging.relative_alpha = alpha;
    }
    if let Some(offset) = cli.relative_offset {
        config.staging.relative_offset = offset;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .filter_level(config.logging.level.into())
        .init();
    debug!("Configuration loaded: {config:?}");

    info!("Reading {}...", cli.input.display());
    let cloud = read_points(&cli.input)
        .with_context(|| format!("Invalid input {}", cli.input.display()))?;
    info!("{} points", cloud.len());
    let bounds = cloud.bounding_box();

    let staging = config.staging.clone();
    let controller = Arc::new(StagingController::new(
        Arc::new(config.engine.build()),
        staging.clone(),
    ));
    controller.set_point_cloud(cloud.points);
    controller
        .trigger_wrap_default()
        .context("Failed to start the wrap")?;

    let surface = HeadlessSurface::new(UiControls::from_config(&staging))
        .with_frame_interval(Duration::from_millis(config.viewer.frame_interval_ms));
    let quit = surface.quit_handle();
    let mut render_loop = RenderLoop::new(Arc::clone(&controller), surface, config.render.clone());
    render_loop.camera_mut().frame_bounds(bounds.0, bounds.1);
    let render = thread::Builder::new()
        .name("wrapview-render".to_string())
        .spawn(move || render_loop.run())
        .context("Failed to start the render thread")?;

    for i in 0..cli.pose_updates {
        controller.update_pose(Point3f::new(i as f32 * 0.1, 0.0, 0.0));
        thread::sleep(Duration::from_millis(cli.pose_interval_ms));
    }

    let wrap_result = controller.wait_for_wrap();
    quit.request_quit();
    let stats: RenderStats = render
        .join()
        .map_err(|_| anyhow!("Render thread panicked"))??;
    info!(
        "Rendered {} frames ({} skipped) over {} pose updates",
        stats.frames,
        stats.skipped_frames,
        controller.pose_update_count()
    );

    let outcome = match wrap_result {
        Some(result) => result.context("Wrap failed")?,
        None => bail!("No wrap was run"),
    };
    info!(
        "Wrap generation {}: {} vertices, {} faces in {:.2?}",
        outcome.generation, outcome.vertex_count, outcome.face_count, outcome.elapsed
    );

    controller
        .accept_preview()
        .context("Nothing to accept")?;
    let mesh = controller
        .get_final_mesh()
        .ok_or_else(|| anyhow!("No final mesh"))?;
    if mesh.is_empty() {
        bail!("Final mesh is empty");
    }

    let output = cli.output_dir.join(output_name(
        &cli.input,
        staging.relative_alpha,
        staging.relative_offset,
    ));
    info!("Writing to {}", output.display());
    write_mesh(&mesh, &output).with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(())
}
