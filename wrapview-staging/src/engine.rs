//! The geometry engine seam and a voxel-based wrap engine
//!
//! The staging pipeline treats wrapping as an opaque, long-running call.
//! Anything implementing [`GeometryEngine`] can be plugged in, including a
//! plain closure.

use itertools::iproduct;
use log::debug;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use wrapview_core::{
    bounding_box_of, is_finite_point, Drawable, Error, Point3f, Result, TriangleMesh, Vector3f,
};

/// A synchronous, non-cancellable wrapping algorithm
pub trait GeometryEngine: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &str {
        "engine"
    }

    /// Wrap `points` into a surface mesh using absolute `alpha` and `offset`
    fn wrap(&self, points: &[Point3f], alpha: f32, offset: f32) -> Result<TriangleMesh>;
}

impl<F> GeometryEngine for F
where
    F: Fn(&[Point3f], f32, f32) -> Result<TriangleMesh> + Send + Sync,
{
    fn wrap(&self, points: &[Point3f], alpha: f32, offset: f32) -> Result<TriangleMesh> {
        self(points, alpha, offset)
    }
}

/// Fail unless the points contain four that are not coplanar
pub fn ensure_spans_volume(points: &[Point3f]) -> Result<()> {
    if points.len() < 4 {
        return Err(Error::Algorithm(format!(
            "need at least 4 points to wrap, got {}",
            points.len()
        )));
    }
    if let Some(bad) = points.iter().find(|p| !is_finite_point(p)) {
        return Err(Error::InvalidData(format!("non-finite point {:?}", bad)));
    }

    let diagonal = points.bounding_diagonal().unwrap_or(0.0);
    let eps = diagonal.max(f32::MIN_POSITIVE) * 1e-5;

    let p0 = points[0];
    let p1 = points.iter().find(|p| (**p - p0).norm() > eps);
    let p1 = match p1 {
        Some(p) => *p,
        None => return Err(Error::Algorithm("all points coincide".to_string())),
    };
    let axis = p1 - p0;
    let p2 = points
        .iter()
        .find(|p| axis.cross(&(**p - p0)).norm() > eps * axis.norm());
    let p2 = match p2 {
        Some(p) => *p,
        None => return Err(Error::Algorithm("points are collinear".to_string())),
    };
    let normal = axis.cross(&(p2 - p0)).normalize();
    if points.iter().any(|p| normal.dot(&(*p - p0)).abs() > eps) {
        Ok(())
    } else {
        Err(Error::Algorithm("points are coplanar".to_string()))
    }
}

type Cell = (i64, i64, i64);

/// Corners of the outward-facing quad on each side of a unit cell, wound
/// counter-clockwise when seen from outside
const FACES: [(Cell, [Cell; 4]); 6] = [
    ((1, 0, 0), [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)]),
    ((-1, 0, 0), [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)]),
    ((0, 1, 0), [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)]),
    ((0, -1, 0), [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)]),
    ((0, 0, 1), [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)]),
    ((0, 0, -1), [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)]),
];

/// Coarse wrap on a voxel grid.
///
/// Points are binned into cubic cells of edge `alpha`, the occupied set is
/// dilated by `ceil(offset / alpha)` cells, and the boundary of the dilated
/// set is emitted as a closed, outward-oriented triangle mesh. Smaller alpha
/// follows the input more tightly; larger offset inflates the result.
#[derive(Debug, Clone)]
pub struct VoxelWrapEngine {
    /// Largest dilation radius, in cells
    pub max_dilation: i64,
    /// Largest number of occupied cells after dilation
    pub max_cells: usize,
}

impl Default for VoxelWrapEngine {
    fn default() -> Self {
        Self {
            max_dilation: 16,
            max_cells: 2_000_000,
        }
    }
}

impl VoxelWrapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dilation cap
    pub fn with_max_dilation(mut self, cells: i64) -> Self {
        self.max_dilation = cells;
        self
    }

    /// Set the occupied cell cap
    pub fn with_max_cells(mut self, cells: usize) -> Self {
        self.max_cells = cells;
        self
    }

    fn occupied_cells(&self, points: &[Point3f], origin: Point3f, alpha: f32) -> HashSet<Cell> {
        points
            .par_iter()
            .map(|p| {
                let rel = (*p - origin) / alpha;
                (
                    rel.x.floor() as i64,
                    rel.y.floor() as i64,
                    rel.z.floor() as i64,
                )
            })
            .collect()
    }

    fn dilate(&self, cells: &HashSet<Cell>, radius: i64) -> Result<HashSet<Cell>> {
        if radius == 0 {
            return Ok(cells.clone());
        }
        let mut dilated = HashSet::with_capacity(cells.len() * 8);
        for &(x, y, z) in cells {
            for (dx, dy, dz) in iproduct!(-radius..=radius, -radius..=radius, -radius..=radius) {
                dilated.insert((x + dx, y + dy, z + dz));
            }
            if dilated.len() > self.max_cells {
                return Err(Error::Algorithm(format!(
                    "wrap grid exceeds {} cells; increase alpha or decrease offset",
                    self.max_cells
                )));
            }
        }
        Ok(dilated)
    }

    fn boundary_mesh(cells: &HashSet<Cell>, origin: Point3f, alpha: f32) -> TriangleMesh {
        let mut sorted: Vec<Cell> = cells.iter().copied().collect();
        sorted.sort_unstable();

        let mut mesh = TriangleMesh::new();
        let mut corner_index: HashMap<Cell, usize> = HashMap::new();

        for (x, y, z) in sorted {
            for (normal, quad) in FACES.iter() {
                let neighbor = (x + normal.0, y + normal.1, z + normal.2);
                if cells.contains(&neighbor) {
                    continue;
                }
                let mut ids = [0usize; 4];
                for (slot, corner) in ids.iter_mut().zip(quad.iter()) {
                    let key = (x + corner.0, y + corner.1, z + corner.2);
                    *slot = *corner_index.entry(key).or_insert_with(|| {
                        mesh.add_vertex(
                            origin + Vector3f::new(key.0 as f32, key.1 as f32, key.2 as f32) * alpha,
                        )
                    });
                }
                mesh.add_face([ids[0], ids[1], ids[2]]);
                mesh.add_face([ids[0], ids[2], ids[3]]);
            }
        }
        mesh
    }
}

impl GeometryEngine for VoxelWrapEngine {
    fn name(&self) -> &str {
        "voxel-wrap"
    }

    fn wrap(&self, points: &[Point3f], alpha: f32, offset: f32) -> Result<TriangleMesh> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(Error::InvalidData(format!("alpha must be positive, got {}", alpha)));
        }
        if !offset.is_finite() || offset < 0.0 {
            return Err(Error::InvalidData(format!("offset must be non-negative, got {}", offset)));
        }
        ensure_spans_volume(points)?;

        let radius = (offset / alpha).ceil() as i64;
        if radius > self.max_dilation {
            return Err(Error::Algorithm(format!(
                "offset {} is {} cells of alpha {}; the limit is {}",
                offset, radius, alpha, self.max_dilation
            )));
        }

        let origin = match bounding_box_of(points) {
            Some((min, _)) => min,
            None => return Err(Error::Algorithm("empty point set".to_string())),
        };
        let occupied = self.occupied_cells(points, origin, alpha);
        let dilated = self.dilate(&occupied, radius)?;
        debug!(
            "Voxel wrap: {} points -> {} cells -> {} cells after dilation by {}",
            points.len(),
            occupied.len(),
            dilated.len(),
            radius
        );

        Ok(Self::boundary_mesh(&dilated, origin, alpha))
    }
}
