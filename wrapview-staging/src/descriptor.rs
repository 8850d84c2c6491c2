//! What the render loop draws for the mesh region of the scene

use std::sync::Arc;
use wrapview_core::{Point3f, PointCloud3f, TriangleMesh};

/// An immutable, shareable mesh artifact together with its pre-built
/// wireframe. Handles are cheap to clone; the mesh behind them is never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct MeshHandle {
    generation: u64,
    mesh: Arc<TriangleMesh>,
    wireframe: Arc<Vec<[Point3f; 2]>>,
}

impl MeshHandle {
    /// Wrap a finished mesh. Builds the wireframe, so call this before
    /// taking any lock.
    pub fn new(generation: u64, mesh: TriangleMesh) -> Self {
        let wireframe = mesh
            .edges()
            .into_iter()
            .map(|[a, b]| [mesh.vertices[a], mesh.vertices[b]])
            .collect();
        Self {
            generation,
            mesh: Arc::new(mesh),
            wireframe: Arc::new(wireframe),
        }
    }

    /// Monotonic counter of the wrap that produced this mesh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Unique mesh edges as line segments
    pub fn wireframe(&self) -> &[[Point3f; 2]] {
        &self.wireframe
    }

    /// Whether two handles refer to the same published artifact
    pub fn same_artifact(&self, other: &MeshHandle) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh)
    }
}

/// The published description of the mesh region, swapped as a whole under
/// the mesh lock
#[derive(Debug, Clone, Default)]
pub enum DrawDescriptor {
    #[default]
    None,
    Points(Arc<PointCloud3f>),
    PreviewMesh(MeshHandle),
    FinalMesh(MeshHandle),
}

impl DrawDescriptor {
    /// The mesh referenced by this descriptor, if any
    pub fn mesh_handle(&self) -> Option<&MeshHandle> {
        match self {
            DrawDescriptor::PreviewMesh(handle) | DrawDescriptor::FinalMesh(handle) => Some(handle),
            DrawDescriptor::None | DrawDescriptor::Points(_) => None,
        }
    }

    pub fn kind(&self) -> DisplayMode {
        match self {
            DrawDescriptor::None => DisplayMode::Nothing,
            DrawDescriptor::Points(_) => DisplayMode::Points,
            DrawDescriptor::PreviewMesh(_) => DisplayMode::Preview,
            DrawDescriptor::FinalMesh(_) => DisplayMode::Final,
        }
    }
}

/// Controller toggle selecting which descriptor to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Nothing,
    Points,
    Preview,
    Final,
}
