//! XYZ point reader
//!
//! One point per line, the first three columns are x y z. Columns may be
//! separated by whitespace or commas; extra columns (normals, colours) are
//! ignored. Blank lines and lines starting with `#` are skipped.

use crate::error::{IoError, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use wrapview_core::{Point3f, PointCloud3f};

/// Reader for XYZ point files
pub struct XyzReader;

impl XyzReader {
    /// Read every point of the file. An input with no points is an error.
    pub fn read_points<P: AsRef<Path>>(path: P) -> Result<PointCloud3f> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => IoError::Io(e),
        })?;
        let cloud = Self::read_from(BufReader::new(file))?;
        if cloud.is_empty() {
            return Err(IoError::Empty {
                path: path.display().to_string(),
            });
        }
        debug!("Read {} points from {}", cloud.len(), path.display());
        Ok(cloud)
    }

    /// Parse points from any buffered reader
    pub fn read_from<R: BufRead>(reader: R) -> Result<PointCloud3f> {
        let mut cloud = PointCloud3f::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            cloud.push(Self::parse_line(trimmed, index + 1)?);
        }
        Ok(cloud)
    }

    fn parse_line(line: &str, line_number: usize) -> Result<Point3f> {
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty());

        let mut coords = [0.0f32; 3];
        for (axis, coord) in ["x", "y", "z"].iter().zip(coords.iter_mut()) {
            let field = fields.next().ok_or_else(|| IoError::ParseError {
                line: line_number,
                message: format!("missing {} coordinate", axis),
            })?;
            *coord = field.parse::<f32>().map_err(|_| IoError::ParseError {
                line: line_number,
                message: format!("invalid {} coordinate '{}'", axis, field),
            })?;
        }
        Ok(Point3f::new(coords[0], coords[1], coords[2]))
    }
}
