//! I/O for wrapview
//! 
//! - [`XyzReader`]: point input from XYZ text files
//! - [`OffWriter`]: mesh output in Object File Format
//! - [`output_name`]: the file name a wrap result is saved under

pub mod error;
pub mod off;
pub mod xyz;

pub use error::*;
pub use off::*;
pub use xyz::*;

use std::path::Path;
use wrapview_core::{PointCloud3f, TriangleMesh};

/// Read a point cloud from an XYZ file
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<PointCloud3f> {
    XyzReader::read_points(path)
}

/// Write a mesh to an OFF file
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    OffWriter::write_mesh(mesh, path)
}
