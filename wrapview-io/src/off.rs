//! OFF mesh writer

use crate::error::{IoError, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use wrapview_core::TriangleMesh;

/// Name of the file a wrap of `input` is saved to:
/// `<input stem>_<alpha>_<offset>.off`, with the relative parameters
/// truncated to integers.
pub fn output_name<P: AsRef<Path>>(input: P, relative_alpha: f32, relative_offset: f32) -> PathBuf {
    let stem = input
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wrap".to_string());
    PathBuf::from(format!(
        "{}_{}_{}.off",
        stem, relative_alpha as i64, relative_offset as i64
    ))
}

/// Writer for Object File Format meshes
pub struct OffWriter;

impl OffWriter {
    /// Write the mesh to `path`, creating or truncating the file
    pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mesh, &mut writer)?;
        writer.flush()?;
        info!(
            "Wrote {} vertices and {} faces to {}",
            mesh.vertex_count(),
            mesh.face_count(),
            path.display()
        );
        Ok(())
    }

    /// Write the mesh in OFF form. Coordinates are printed with enough
    /// digits (at most 17 significant) to read back bit-exact.
    pub fn write_to<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
        if mesh.is_empty() {
            return Err(IoError::WriteError {
                message: "mesh has no faces".to_string(),
            });
        }
        let vertex_count = mesh.vertex_count();
        if let Some(face) = mesh.faces.iter().find(|f| f.iter().any(|&i| i >= vertex_count)) {
            return Err(IoError::WriteError {
                message: format!("face {:?} references a missing vertex", face),
            });
        }

        writeln!(writer, "OFF")?;
        writeln!(writer, "{} {} 0", vertex_count, mesh.face_count())?;
        for v in &mesh.vertices {
            writeln!(
                writer,
                "{} {} {}",
                f64::from(v.x),
                f64::from(v.y),
                f64::from(v.z)
            )?;
        }
        for [a, b, c] in &mesh.faces {
            writeln!(writer, "3 {} {} {}", a, b, c)?;
        }
        Ok(())
    }
}
