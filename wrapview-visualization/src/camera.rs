//! Camera utilities for 3D visualization

use nalgebra::{Matrix4, Perspective3, Point3, Rotation3, Unit, Vector3};

/// A 3D camera for viewing point clouds and meshes
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Combined projection * view
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Rotate the camera around the target
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let offset = self.position - self.target;
        let up = Unit::new_normalize(self.up);
        let yawed = Rotation3::from_axis_angle(&up, -horizontal) * offset;

        // Looking straight along `up` leaves no pitch axis
        let right = yawed.cross(&self.up);
        let offset = if right.norm() > f32::EPSILON {
            Rotation3::from_axis_angle(&Unit::new_normalize(right), vertical) * yawed
        } else {
            yawed
        };
        self.position = self.target + offset;
    }

    /// Scale the distance to the target; positive values move closer
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.position - self.target;
        let factor = (1.0 - amount).max(0.05);
        self.position = self.target + offset * factor;
    }

    /// Aim at the centre of a bounding box from far enough to see all of it
    pub fn frame_bounds(&mut self, min: Point3<f32>, max: Point3<f32>) {
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(f32::EPSILON);
        let distance = radius / (self.fov * 0.5).tan().max(f32::EPSILON) * 1.2;
        let direction = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z());
        self.target = center;
        self.position = center + direction * distance;
        self.far = self.far.max(distance + radius * 2.0);
    }
}

impl Default for Camera {
    /// The viewer's start-up view: a 1024x768 window with a 420 px focal
    /// length, looking down +z with -y up.
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, -1.0, 0.0),
            2.0 * (384.0_f32 / 420.0).atan(),
            1024.0 / 768.0,
            0.1,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        let before = (camera.position - camera.target).norm();
        camera.orbit(0.3, 0.2);
        let after = (camera.position - camera.target).norm();
        assert_relative_eq!(before, after, epsilon = 1e-4);
    }

    #[test]
    fn test_zoom_moves_closer() {
        let mut camera = Camera::default();
        let before = (camera.position - camera.target).norm();
        camera.zoom(0.5);
        assert!((camera.position - camera.target).norm() < before);
    }

    #[test]
    fn test_frame_bounds_targets_center() {
        let mut camera = Camera::default();
        camera.frame_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        assert_eq!(camera.target, Point3::new(1.0, 1.0, 1.0));
        assert!((camera.position - camera.target).norm() > 3.0_f32.sqrt());
    }
}
