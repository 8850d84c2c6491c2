//! Integration tests for wrapview-staging
//!
//! These drive the controller from several threads with engines whose
//! progress the test controls, so every ordering asserted here is forced
//! rather than hoped for.

use approx::assert_relative_eq;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use wrapview_core::{Drawable, Error, Point3f, Pose, TriangleMesh};
use wrapview_staging::*;

/// Box mesh spanning the bounding box of the input
fn box_hull(points: &[Point3f], _alpha: f32, _offset: f32) -> wrapview_core::Result<TriangleMesh> {
    let (min, max) = points
        .try_bounding_box()
        .ok_or_else(|| Error::Algorithm("empty input".to_string()))?;
    let mut vertices = Vec::with_capacity(8);
    for &x in &[min.x, max.x] {
        for &y in &[min.y, max.y] {
            for &z in &[min.z, max.z] {
                vertices.push(Point3f::new(x, y, z));
            }
        }
    }
    let faces = vec![
        [0, 1, 3], [0, 3, 2], [4, 6, 7], [4, 7, 5],
        [0, 4, 5], [0, 5, 1], [2, 3, 7], [2, 7, 6],
        [0, 2, 6], [0, 6, 4], [1, 5, 7], [1, 7, 3],
    ];
    Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
}

fn unit_cube_corners() -> Vec<Point3f> {
    let mut points = Vec::new();
    for &x in &[0.0, 1.0] {
        for &y in &[0.0, 1.0] {
            for &z in &[0.0, 1.0] {
                points.push(Point3f::new(x, y, z));
            }
        }
    }
    points
}

fn box_controller() -> StagingController {
    StagingController::new(Arc::new(box_hull), StagingConfig::default())
}

/// Engine that reports when it starts and then blocks until released
struct GatedEngine {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

struct Gate {
    started: Receiver<()>,
    release: Sender<()>,
}

impl Gate {
    fn wait_started(&self) {
        self.started
            .recv_timeout(Duration::from_secs(10))
            .expect("engine never started");
    }

    fn open(&self) {
        self.release.send(()).unwrap();
    }
}

fn gated_engine() -> (Arc<GatedEngine>, Gate) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let engine = Arc::new(GatedEngine {
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    });
    (engine, Gate { started: started_rx, release: release_tx })
}

impl GeometryEngine for GatedEngine {
    fn name(&self) -> &str {
        "gated"
    }

    fn wrap(&self, points: &[Point3f], alpha: f32, offset: f32) -> wrapview_core::Result<TriangleMesh> {
        self.started.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        box_hull(points, alpha, offset)
    }
}

fn published_generation(controller: &StagingController) -> Option<u64> {
    controller
        .draw_descriptor()
        .mesh_handle()
        .map(|handle| handle.generation())
}

#[test]
fn test_add_point_cloud_concatenates_batches() {
    let controller = box_controller();
    let batches: Vec<Vec<Point3f>> = (0..5)
        .map(|b| (0..3).map(|i| Point3f::new(b as f32, i as f32, 0.0)).collect())
        .collect();
    for batch in &batches {
        controller.add_point_cloud(batch);
    }

    let expected: Vec<Point3f> = batches.concat();
    assert_eq!(controller.pending_points().as_slice(), expected.as_slice());
}

#[test]
fn test_cube_wrap_publishes_scaled_preview() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();

    let outcome = controller.wait_for_wrap().unwrap().unwrap();
    let sqrt3 = 3.0_f32.sqrt();
    assert_relative_eq!(outcome.params.diagonal, sqrt3, epsilon = 1e-5);
    assert_relative_eq!(outcome.params.alpha, sqrt3, epsilon = 1e-5);
    assert_relative_eq!(outcome.params.offset, sqrt3, epsilon = 1e-5);
    assert_eq!(outcome.point_count, 8);

    match controller.draw_descriptor() {
        DrawDescriptor::PreviewMesh(handle) => {
            assert_eq!(handle.generation(), outcome.generation);
            assert_relative_eq!(handle.mesh().bounding_diagonal().unwrap(), sqrt3, epsilon = 1e-5);
        }
        other => panic!("expected a preview descriptor, got {:?}", other.kind()),
    }
    assert_eq!(controller.processed_points().len(), 8);
}

#[test]
fn test_set_point_cloud_does_not_accept() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();
    controller.wait_for_wrap().unwrap().unwrap();
    controller.accept_preview().unwrap();
    let accepted = controller.get_final_mesh().unwrap();

    let shifted: Vec<Point3f> = unit_cube_corners()
        .into_iter()
        .map(|p| Point3f::new(p.x * 5.0, p.y * 5.0, p.z * 5.0))
        .collect();
    controller.set_point_cloud(shifted);

    assert_eq!(controller.get_final_mesh().unwrap(), accepted);
}

#[test]
fn test_final_mesh_empty_before_any_accept() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());
    assert!(controller.get_final_mesh().is_none());
    assert!(matches!(controller.accept_preview(), Err(StagingError::NoPreview)));
}

#[test]
fn test_second_trigger_rejected_while_running() {
    let (engine, gate) = gated_engine();
    let controller = StagingController::new(engine, StagingConfig::default());
    controller.set_point_cloud(unit_cube_corners());

    controller.trigger_wrap(1.0, 1.0).unwrap();
    gate.wait_started();
    assert!(controller.is_wrap_running());
    assert_eq!(controller.trigger_wrap(1.0, 1.0), Err(StagingError::TaskAlreadyRunning));
    assert_eq!(controller.cancel_wrap(), Err(StagingError::CannotCancel));
    assert!(published_generation(&controller).is_none());

    gate.open();
    let first = controller.wait_for_wrap().unwrap().unwrap();
    let first_handle = controller.preview_handle().unwrap();

    controller.trigger_wrap(2.0, 2.0).unwrap();
    gate.wait_started();
    gate.open();
    let second = controller.wait_for_wrap().unwrap().unwrap();

    assert!(second.generation > first.generation);
    let second_handle = controller.draw_descriptor().mesh_handle().cloned().unwrap();
    assert_eq!(second_handle.generation(), second.generation);
    assert!(!second_handle.same_artifact(&first_handle));
}

#[test]
fn test_retrigger_after_publish_succeeds() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();

    // Wait for the publish itself rather than the thread exit
    while published_generation(&controller).is_none() {
        thread::sleep(Duration::from_millis(1));
    }
    controller.trigger_wrap(1.0, 1.0).unwrap();
    let outcome = controller.wait_for_wrap().unwrap().unwrap();
    assert_eq!(outcome.generation, 2);
}

#[test]
fn test_accept_copies_latest_preview_only() {
    let (engine, gate) = gated_engine();
    let controller = StagingController::new(engine, StagingConfig::default());
    controller.set_point_cloud(unit_cube_corners());

    controller.trigger_wrap(1.0, 1.0).unwrap();
    gate.wait_started();
    gate.open();
    controller.wait_for_wrap().unwrap().unwrap();
    let accepted = controller.accept_preview().unwrap();
    assert!(accepted.same_artifact(&controller.preview_handle().unwrap()));

    // A newer preview does not leak into final without another accept
    controller.add_point_cloud(&[Point3f::new(3.0, 3.0, 3.0)]);
    controller.trigger_wrap(1.0, 1.0).unwrap();
    gate.wait_started();
    gate.open();
    controller.wait_for_wrap().unwrap().unwrap();

    let _ = controller.draw_descriptor();
    let _ = controller.pending_points();
    let final_handle = controller.final_handle().unwrap();
    assert!(final_handle.same_artifact(&accepted));
    assert!(!final_handle.same_artifact(&controller.preview_handle().unwrap()));

    let reaccepted = controller.accept_preview().unwrap();
    assert_eq!(reaccepted.generation(), 2);
    assert_relative_eq!(
        controller.get_final_mesh().unwrap().bounding_diagonal().unwrap(),
        3.0 * 3.0_f32.sqrt(),
        epsilon = 1e-5
    );
}

#[test]
fn test_zero_alpha_rejected_without_side_effects() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());

    let err = controller.trigger_wrap(0.0, 1.0).unwrap_err();
    assert!(matches!(err, StagingError::InvalidParameter { name: "relative_alpha", .. }));
    assert!(controller.trigger_wrap(1.0, f32::INFINITY).is_err());

    assert!(!controller.is_wrap_running());
    assert!(controller.last_result().is_none());
    assert!(controller.preview_handle().is_none());
    assert!(matches!(controller.draw_descriptor(), DrawDescriptor::None));
    assert_eq!(controller.pending_points().len(), 8);
    assert!(controller.processed_points().is_empty());
}

#[test]
fn test_empty_input_fails_without_publish() {
    let controller = box_controller();
    controller.trigger_wrap(1.0, 1.0).unwrap();
    let result = controller.wait_for_wrap().unwrap();
    assert!(matches!(result, Err(StagingError::EmptyOrDegenerateInput(_))));
    assert!(controller.preview_handle().is_none());
    assert!(matches!(controller.draw_descriptor(), DrawDescriptor::None));
}

#[test]
fn test_non_finite_input_fails_without_publish() {
    let controller = box_controller();
    let mut points = unit_cube_corners();
    points.push(Point3f::new(f32::NAN, 0.0, 0.0));
    controller.set_point_cloud(points);
    controller.trigger_wrap(1.0, 1.0).unwrap();
    assert!(matches!(
        controller.wait_for_wrap().unwrap(),
        Err(StagingError::EmptyOrDegenerateInput(_))
    ));
    assert!(controller.preview_handle().is_none());
}

#[test]
fn test_engine_failure_keeps_previous_preview() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = move |points: &[Point3f], alpha: f32, offset: f32| -> wrapview_core::Result<TriangleMesh> {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            box_hull(points, alpha, offset)
        } else {
            Err(Error::Algorithm("degenerate input".to_string()))
        }
    };
    let controller = StagingController::new(Arc::new(engine), StagingConfig::default());
    controller.set_point_cloud(unit_cube_corners());

    controller.trigger_wrap(1.0, 1.0).unwrap();
    controller.wait_for_wrap().unwrap().unwrap();

    controller.trigger_wrap(1.0, 1.0).unwrap();
    let failed = controller.wait_for_wrap().unwrap();
    assert!(matches!(failed, Err(StagingError::GeometryFailure(_))));
    assert_eq!(controller.last_result(), Some(failed));

    assert_eq!(published_generation(&controller), Some(1));
    assert_eq!(controller.preview_handle().unwrap().generation(), 1);

    // Failure is recoverable: the next trigger is accepted
    controller.trigger_wrap(1.0, 1.0).unwrap();
    controller.wait_for_wrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_panicking_engine_is_reported() {
    let engine = |_: &[Point3f], _: f32, _: f32| -> wrapview_core::Result<TriangleMesh> {
        panic!("engine blew up")
    };
    let controller = StagingController::new(Arc::new(engine), StagingConfig::default());
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();

    match controller.wait_for_wrap() {
        Some(Err(StagingError::TaskPanicked(message))) => assert!(message.contains("blew up")),
        other => panic!("expected a panic report, got {:?}", other),
    }
    assert!(controller.preview_handle().is_none());
    controller.trigger_wrap(1.0, 1.0).unwrap();
    controller.wait_for_wrap();
}

#[test]
fn test_pose_updates_never_tear_or_regress() {
    let controller = Arc::new(box_controller());
    let updates = 200;

    let producer = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            for i in 0..updates {
                let v = i as f32;
                controller.update_pose(Pose::new(v, v * 2.0, v * 3.0));
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let mut last_seen: Option<Pose> = None;
    while !producer.is_finished() {
        if let Some(pose) = controller.take_pose() {
            assert_eq!(pose.y, pose.x * 2.0);
            assert_eq!(pose.z, pose.x * 3.0);
            if let Some(previous) = last_seen {
                assert!(pose.x > previous.x, "pose went backwards");
            }
            last_seen = Some(pose);
        }
    }
    producer.join().unwrap();
    if let Some(pose) = controller.take_pose() {
        last_seen = Some(pose);
    }

    assert_eq!(last_seen.unwrap().x, (updates - 1) as f32);
    assert_eq!(controller.pose_update_count(), updates as u64);
}

#[test]
fn test_slow_wrap_does_not_block_pose_or_accept() {
    let (engine, gate) = gated_engine();
    let controller = StagingController::new(engine, StagingConfig::default());
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();
    gate.wait_started();

    // Engine is blocked; both lock domains must stay available
    controller.update_pose(Pose::new(1.0, 2.0, 3.0));
    assert_eq!(controller.take_pose(), Some(Pose::new(1.0, 2.0, 3.0)));
    let frame = controller.frame_snapshot(true);
    assert!(matches!(frame.accepted, Some(Err(StagingError::NoPreview))));
    controller.add_point_cloud(&[Point3f::new(9.0, 9.0, 9.0)]);

    gate.open();
    let outcome = controller.wait_for_wrap().unwrap().unwrap();
    // The appended point arrived after the snapshot
    assert_eq!(outcome.point_count, 8);
    assert_eq!(controller.pending_points().len(), 9);
}

#[test]
fn test_backpressure_with_running_producer() {
    let controller = Arc::new(box_controller());
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();

    let producer = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            controller.set_point_cloud(vec![Point3f::new(0.0, 0.0, 0.0); 3]);
        })
    };
    producer.join().unwrap();

    // Whatever the interleaving, the task saw the first batch intact
    let outcome = controller.wait_for_wrap().unwrap().unwrap();
    assert_eq!(outcome.point_count, 8);
    assert_eq!(controller.pending_points().len(), 3);
}

#[test]
fn test_request_accept_applied_by_frame_snapshot() {
    let controller = box_controller();
    controller.set_point_cloud(unit_cube_corners());
    controller.trigger_wrap(1.0, 1.0).unwrap();
    controller.wait_for_wrap().unwrap().unwrap();

    controller.request_accept();
    assert!(controller.final_handle().is_none());
    let frame = controller.frame_snapshot(false);
    assert!(matches!(frame.accepted, Some(Ok(_))));
    assert!(frame.final_mesh.is_some());
    assert!(controller.display(DisplayMode::Final));
    assert_eq!(controller.draw_descriptor().kind(), DisplayMode::Final);
}

#[test]
fn test_voxel_engine_through_controller() {
    let mut rng = rand::thread_rng();
    let points: Vec<Point3f> = (0..500)
        .map(|_| {
            Point3f::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
        })
        .collect();

    let controller = StagingController::new(
        Arc::new(VoxelWrapEngine::new()),
        StagingConfig::default().with_relative_params(5.0, 20.0),
    );
    controller.set_point_cloud(points);
    controller.trigger_wrap_default().unwrap();
    let outcome = controller.wait_for_wrap().unwrap().unwrap();

    let preview = controller.get_preview_mesh().unwrap();
    assert_eq!(preview.vertex_count(), outcome.vertex_count);
    assert_eq!(preview.face_count(), outcome.face_count);
    assert!(outcome.face_count > 0);
}

#[test]
fn test_engine_precondition_failures_are_geometry_failures() {
    let controller = StagingController::new(
        Arc::new(VoxelWrapEngine::new()),
        StagingConfig::default(),
    );

    let coplanar: Vec<Point3f> = (0..16)
        .map(|i| Point3f::new((i % 4) as f32, (i / 4) as f32, 2.0))
        .collect();
    controller.set_point_cloud(coplanar);
    controller.trigger_wrap_default().unwrap();
    match controller.wait_for_wrap() {
        Some(Err(StagingError::GeometryFailure(message))) => assert!(message.contains("coplanar")),
        other => panic!("expected a geometry failure, got {:?}", other),
    }

    controller.set_point_cloud(vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(1.0, 0.0, 0.0),
        Point3f::new(0.0, 1.0, 1.0),
    ]);
    controller.trigger_wrap_default().unwrap();
    assert!(matches!(
        controller.wait_for_wrap(),
        Some(Err(StagingError::GeometryFailure(_)))
    ));
    assert!(controller.preview_handle().is_none());
}
