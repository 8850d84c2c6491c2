//! Triangle meshes: the payload of preview and final wrap results

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Indexed triangle mesh. Faces index into `vertices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh without vertices or without faces has no surface to show
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Push a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Unit normal of every face, following its winding
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let origin = self.vertices[a];
                (self.vertices[b] - origin)
                    .cross(&(self.vertices[c] - origin))
                    .normalize()
            })
            .collect()
    }

    /// Undirected edges of the mesh, each listed once as `[low, high]`,
    /// in ascending order.
    pub fn edges(&self) -> Vec<[usize; 2]> {
        let mut edges: Vec<[usize; 2]> = self.edge_use_counts().into_keys().collect();
        edges.sort_unstable();
        edges
    }

    /// A mesh is closed when every edge is shared by exactly two faces
    pub fn is_closed(&self) -> bool {
        !self.faces.is_empty() && self.edge_use_counts().values().all(|&count| count == 2)
    }

    fn edge_use_counts(&self) -> HashMap<[usize; 2], usize> {
        let mut counts = HashMap::with_capacity(self.faces.len() * 3 / 2);
        for face in &self.faces {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                let key = if a < b { [a, b] } else { [b, a] };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
    }

    #[test]
    fn test_tetrahedron_edges() {
        let mesh = tetrahedron();
        assert_eq!(
            mesh.edges(),
            vec![[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]]
        );
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_open_mesh_is_not_closed() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        assert!(!mesh.is_closed());
        assert!(!TriangleMesh::new().is_closed());
    }

    #[test]
    fn test_face_normals() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let normals = mesh.calculate_face_normals();
        assert_eq!(normals.len(), 1);
        assert!((normals[0].z - 1.0).abs() < 1e-6);
    }
}
