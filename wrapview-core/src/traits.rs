//! Core traits for wrapview

use crate::{point::*, point_cloud::*, mesh::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Axis-aligned bounding box, or `None` when there is nothing to bound.
    /// Any NaN coordinate yields a NaN box.
    fn try_bounding_box(&self) -> Option<(Point3f, Point3f)>;

    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f) {
        self.try_bounding_box()
            .unwrap_or((Point3f::origin(), Point3f::origin()))
    }
    
    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }

    /// Length of the bounding box diagonal. The value may be non-finite
    /// when the input contains non-finite coordinates.
    fn bounding_diagonal(&self) -> Option<f32> {
        self.try_bounding_box().map(|(min, max)| (max - min).norm())
    }
}

/// Bounding box of a sequence of points
pub fn bounding_box_of<'a, I>(points: I) -> Option<(Point3f, Point3f)>
where
    I: IntoIterator<Item = &'a Point3f>,
{
    let mut iter = points.into_iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    let mut saw_nan = first.coords.iter().any(|c| c.is_nan());

    for p in iter {
        saw_nan |= p.coords.iter().any(|c| c.is_nan());

        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    // f32::min/max silently skip NaN
    if saw_nan {
        let nan = Point3f::new(f32::NAN, f32::NAN, f32::NAN);
        return Some((nan, nan));
    }

    Some((min, max))
}

impl Drawable for [Point3f] {
    fn try_bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounding_box_of(self)
    }
}

impl Drawable for PointCloud<Point3f> {
    fn try_bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounding_box_of(&self.points)
    }
}

impl Drawable for TriangleMesh {
    fn try_bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounding_box_of(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube_corners() -> PointCloud3f {
        let mut cloud = PointCloud::new();
        for &x in &[0.0, 1.0] {
            for &y in &[0.0, 1.0] {
                for &z in &[0.0, 1.0] {
                    cloud.push(Point3f::new(x, y, z));
                }
            }
        }
        cloud
    }

    #[test]
    fn test_unit_cube_diagonal() {
        let cloud = unit_cube_corners();
        assert_relative_eq!(cloud.bounding_diagonal().unwrap(), 3.0_f32.sqrt(), epsilon = 1e-6);
        assert_eq!(cloud.center(), Point3f::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_empty_has_no_diagonal() {
        let cloud = PointCloud3f::new();
        assert!(cloud.bounding_diagonal().is_none());
        assert_eq!(cloud.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }

    #[test]
    fn test_nan_poisons_diagonal() {
        let mut cloud = unit_cube_corners();
        cloud.push(Point3f::new(0.5, f32::NAN, 0.5));
        assert!(!cloud.bounding_diagonal().unwrap().is_finite());
    }

    #[test]
    fn test_infinite_coordinate_gives_non_finite_diagonal() {
        let points = [Point3f::new(0.0, 0.0, 0.0), Point3f::new(f32::INFINITY, 0.0, 0.0)];
        assert!(!points[..].bounding_diagonal().unwrap().is_finite());
    }

    #[test]
    fn test_single_point_has_zero_diagonal() {
        let points = [Point3f::new(2.0, 3.0, 4.0)];
        assert_eq!(points[..].bounding_diagonal(), Some(0.0));
    }
}
