//! Detail triangulation refining the polygons of a [`PolyMesh`]
//!
//! Each polygon owns one sub-mesh. The first `nv` vertices of a sub-mesh are
//! copies of the polygon corners, any further vertices are extra samples.
//! Triangle vertex references are local to the sub-mesh.

use glam::Vec3;

use super::polymesh::PolyMesh;
use navtile_common::{Error, Result};

/// Flag value of a detail triangle edge lying on its polygon's outer rim
pub const DETAIL_EDGE_BOUNDARY: u8 = 0x01;

/// A detail triangle: three sub-mesh local vertex references plus edge flags
///
/// Edge `k` runs from `verts[k]` to `verts[(k + 1) % 3]` and owns the two
/// flag bits starting at `k * 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DetailTri {
    /// Vertex references
    pub verts: [u8; 3],
    /// Edge flags, two bits per edge
    pub flags: u8,
}

impl DetailTri {
    /// Creates a triangle
    pub fn new(a: u8, b: u8, c: u8, flags: u8) -> Self {
        Self {
            verts: [a, b, c],
            flags,
        }
    }

    /// Flag bits of edge `edge` (0..3)
    #[inline]
    pub fn edge_flags(&self, edge: usize) -> u8 {
        (self.flags >> (edge * 2)) & 0x3
    }

    /// Checks whether edge `edge` lies on the polygon boundary
    #[inline]
    pub fn is_boundary_edge(&self, edge: usize) -> bool {
        self.edge_flags(edge) & DETAIL_EDGE_BOUNDARY != 0
    }
}

/// Vertex and triangle ranges of one polygon's sub-mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DetailSubMesh {
    /// First vertex in [`PolyMeshDetail::verts`]
    pub vert_base: u32,
    /// Number of vertices, polygon corners included
    pub vert_count: u32,
    /// First triangle in [`PolyMeshDetail::tris`]
    pub tri_base: u32,
    /// Number of triangles
    pub tri_count: u32,
}

/// Detail mesh with one sub-mesh per source polygon
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PolyMeshDetail {
    /// Sub-mesh ranges, one per polygon
    pub meshes: Vec<DetailSubMesh>,
    /// Vertices in world space
    pub verts: Vec<Vec3>,
    /// Triangles
    pub tris: Vec<DetailTri>,
}

impl PolyMeshDetail {
    /// Creates a new empty detail mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sub-mesh and returns its index
    pub fn add_sub_mesh(&mut self, verts: &[Vec3], tris: &[DetailTri]) -> usize {
        self.meshes.push(DetailSubMesh {
            vert_base: self.verts.len() as u32,
            vert_count: verts.len() as u32,
            tri_base: self.tris.len() as u32,
            tri_count: tris.len() as u32,
        });
        self.verts.extend_from_slice(verts);
        self.tris.extend_from_slice(tris);
        self.meshes.len() - 1
    }

    /// Number of vertices
    pub fn vert_count(&self) -> usize {
        self.verts.len()
    }

    /// Number of triangles
    pub fn tri_count(&self) -> usize {
        self.tris.len()
    }

    /// Vertices of a sub-mesh
    pub fn sub_mesh_verts(&self, i: usize) -> &[Vec3] {
        let m = &self.meshes[i];
        let start = m.vert_base as usize;
        &self.verts[start..start + m.vert_count as usize]
    }

    /// Triangles of a sub-mesh
    pub fn sub_mesh_tris(&self, i: usize) -> &[DetailTri] {
        let m = &self.meshes[i];
        let start = m.tri_base as usize;
        &self.tris[start..start + m.tri_count as usize]
    }

    /// Checks that the detail mesh matches `mesh` polygon for polygon
    pub fn validate_against(&self, mesh: &PolyMesh) -> Result<()> {
        if self.meshes.len() != mesh.npolys {
            return Err(Error::InvalidMesh(format!(
                "detail mesh has {} sub-meshes for {} polygons",
                self.meshes.len(),
                mesh.npolys
            )));
        }

        for (i, m) in self.meshes.iter().enumerate() {
            let nv = mesh.poly_vert_count(i);
            if (m.vert_count as usize) < nv {
                return Err(Error::InvalidMesh(format!(
                    "detail sub-mesh {} has {} vertices, polygon has {}",
                    i, m.vert_count, nv
                )));
            }

            // Summed as usize, bases may come from untrusted input
            let vert_end = m.vert_base as usize + m.vert_count as usize;
            let tri_end = m.tri_base as usize + m.tri_count as usize;
            if vert_end > self.verts.len() || tri_end > self.tris.len() {
                return Err(Error::InvalidMesh(format!(
                    "detail sub-mesh {} range exceeds the detail arrays",
                    i
                )));
            }
        }

        Ok(())
    }
}
