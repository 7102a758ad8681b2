//! Polygon mesh produced by the upstream mesh generator
//!
//! Vertices are stored in grid units relative to `bmin`. Every polygon
//! occupies `nvp * 2` slots in `polys`: `nvp` vertex indices padded with
//! [`MESH_NULL_IDX`], followed by `nvp` raw edge descriptors.

use glam::Vec3;

use navtile_common::{Error, Result};

/// Null index for polygon vertices
pub const MESH_NULL_IDX: u16 = 0xffff;

/// Edge descriptor flag marking an edge with no neighbor in this mesh
pub const BORDER_EDGE_FLAG: u16 = 0x8000;

/// Mask extracting the direction of a boundary edge descriptor
pub const BORDER_DIR_MASK: u16 = 0xf;

/// Boundary direction of an edge on the outer border of the walkable area
pub const BORDER_DIR: u8 = 0xf;

/// Decoded edge descriptor of a source polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEdge {
    /// Edge shared with another polygon of the same mesh
    Neighbor(u16),
    /// Edge without a neighbor. `dir` is [`BORDER_DIR`] for a true border
    /// or `0..=3` for an edge lying on a side of the tile.
    Boundary { dir: u8 },
}

impl SourceEdge {
    /// Decodes a raw edge descriptor
    pub fn from_raw(raw: u16) -> Self {
        if raw & BORDER_EDGE_FLAG != 0 {
            SourceEdge::Boundary {
                dir: (raw & BORDER_DIR_MASK) as u8,
            }
        } else {
            SourceEdge::Neighbor(raw)
        }
    }

    /// Encodes the edge back into its raw descriptor
    pub fn to_raw(self) -> u16 {
        match self {
            SourceEdge::Neighbor(idx) => idx,
            SourceEdge::Boundary { dir } => BORDER_EDGE_FLAG | (dir as u16 & BORDER_DIR_MASK),
        }
    }
}

/// A convex polygon mesh in grid space
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PolyMesh {
    /// Mesh vertices `[x,y,z]` * nverts, in grid units
    pub verts: Vec<u16>,
    /// Polygon and edge data `[poly data]` * npolys * nvp * 2
    pub polys: Vec<u16>,
    /// Area IDs for each polygon
    pub areas: Vec<u8>,
    /// User defined flags for each polygon
    pub flags: Vec<u16>,
    /// Number of vertices
    pub nverts: usize,
    /// Number of polygons
    pub npolys: usize,
    /// Max vertices per polygon
    pub nvp: usize,
    /// Bounds of the mesh
    pub bmin: Vec3,
    pub bmax: Vec3,
    /// Cell size and height
    pub cs: f32,
    pub ch: f32,
}

impl PolyMesh {
    /// Creates a new empty polygon mesh
    pub fn new(nvp: usize, bmin: Vec3, bmax: Vec3, cs: f32, ch: f32) -> Self {
        Self {
            verts: Vec::new(),
            polys: Vec::new(),
            areas: Vec::new(),
            flags: Vec::new(),
            nverts: 0,
            npolys: 0,
            nvp,
            bmin,
            bmax,
            cs,
            ch,
        }
    }

    /// Appends a grid vertex and returns its index
    pub fn add_vertex(&mut self, v: [u16; 3]) -> u16 {
        self.verts.extend_from_slice(&v);
        self.nverts += 1;
        (self.nverts - 1) as u16
    }

    /// Appends a polygon and returns its index
    ///
    /// `edges` holds one raw descriptor per vertex; missing slots are
    /// padded as borders.
    pub fn add_polygon(&mut self, verts: &[u16], edges: &[u16], area: u8, flags: u16) -> usize {
        let nvp = self.nvp;
        let start = self.polys.len();
        self.polys.resize(start + nvp * 2, MESH_NULL_IDX);
        for (slot, &v) in self.polys[start..start + nvp].iter_mut().zip(verts) {
            *slot = v;
        }
        for (slot, &e) in self.polys[start + nvp..start + nvp * 2].iter_mut().zip(edges) {
            *slot = e;
        }
        self.areas.push(area);
        self.flags.push(flags);
        self.npolys += 1;
        self.npolys - 1
    }

    /// Grid coordinates of a vertex
    #[inline]
    pub fn vertex(&self, i: usize) -> [u16; 3] {
        [self.verts[i * 3], self.verts[i * 3 + 1], self.verts[i * 3 + 2]]
    }

    /// Raw `nvp * 2` slots of a polygon
    #[inline]
    pub fn poly(&self, i: usize) -> &[u16] {
        &self.polys[i * self.nvp * 2..(i + 1) * self.nvp * 2]
    }

    /// Number of vertices of a polygon
    pub fn poly_vert_count(&self, i: usize) -> usize {
        self.poly(i)[..self.nvp]
            .iter()
            .position(|&v| v == MESH_NULL_IDX)
            .unwrap_or(self.nvp)
    }

    /// Vertex indices of a polygon, without padding
    pub fn poly_verts(&self, i: usize) -> &[u16] {
        let nv = self.poly_vert_count(i);
        &self.poly(i)[..nv]
    }

    /// Decoded descriptor of edge `j` of polygon `i`
    ///
    /// Edge `j` runs from vertex `j` to vertex `j + 1`.
    #[inline]
    pub fn edge(&self, i: usize, j: usize) -> SourceEdge {
        SourceEdge::from_raw(self.poly(i)[self.nvp + j])
    }

    /// Checks the structural consistency the tile builder relies on
    pub fn validate(&self) -> Result<()> {
        if self.nverts == 0 {
            return Err(Error::EmptyMesh("mesh has no vertices".to_string()));
        }

        if self.npolys == 0 {
            return Err(Error::EmptyMesh("mesh has no polygons".to_string()));
        }

        if self.verts.len() != self.nverts * 3 {
            return Err(Error::InvalidMesh(format!(
                "expected {} vertex components, found {}",
                self.nverts * 3,
                self.verts.len()
            )));
        }

        if self.polys.len() != self.npolys * self.nvp * 2 {
            return Err(Error::InvalidMesh(format!(
                "expected {} polygon slots, found {}",
                self.npolys * self.nvp * 2,
                self.polys.len()
            )));
        }

        if self.areas.len() != self.npolys || self.flags.len() != self.npolys {
            return Err(Error::InvalidMesh(
                "area and flag arrays must have one entry per polygon".to_string(),
            ));
        }

        for i in 0..self.npolys {
            let verts = self.poly_verts(i);
            if verts.len() < 3 {
                return Err(Error::InvalidMesh(format!(
                    "polygon {} has only {} vertices",
                    i,
                    verts.len()
                )));
            }

            if let Some(&v) = verts.iter().find(|&&v| v as usize >= self.nverts) {
                return Err(Error::InvalidMesh(format!(
                    "polygon {} references vertex {} of {}",
                    i, v, self.nverts
                )));
            }

            for j in 0..verts.len() {
                if let SourceEdge::Neighbor(n) = self.edge(i, j) {
                    if n as usize >= self.npolys {
                        return Err(Error::InvalidMesh(format!(
                            "polygon {} edge {} references polygon {} of {}",
                            i, j, n, self.npolys
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> PolyMesh {
        let mut mesh = PolyMesh::new(6, Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0), 0.5, 0.5);
        for v in [[0, 0, 0], [2, 0, 0], [4, 0, 0], [4, 0, 2], [2, 0, 2], [0, 0, 2]] {
            mesh.add_vertex(v);
        }
        mesh.add_polygon(&[0, 5, 4, 1], &[0xffff, 0xffff, 1, 0x8003], 1, 1);
        mesh.add_polygon(&[1, 4, 3, 2], &[0, 0xffff, 0x8002, 0xffff], 1, 1);
        mesh
    }

    #[test]
    fn test_edge_decoding() {
        assert_eq!(
            SourceEdge::from_raw(MESH_NULL_IDX),
            SourceEdge::Boundary { dir: BORDER_DIR }
        );
        assert_eq!(
            SourceEdge::from_raw(0x8002),
            SourceEdge::Boundary { dir: 2 }
        );
        assert_eq!(SourceEdge::from_raw(7), SourceEdge::Neighbor(7));
        assert_eq!(SourceEdge::Boundary { dir: 1 }.to_raw(), 0x8001);
    }

    #[test]
    fn test_polygon_accessors() {
        let mesh = two_quads();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.poly(0).len(), 12);
        assert_eq!(mesh.poly_vert_count(0), 4);
        assert_eq!(mesh.poly_verts(1), &[1, 4, 3, 2]);
        assert_eq!(mesh.vertex(3), [4, 0, 2]);
        assert_eq!(mesh.edge(0, 2), SourceEdge::Neighbor(1));
        assert_eq!(mesh.edge(0, 3), SourceEdge::Boundary { dir: 3 });
    }

    #[test]
    fn test_validate_empty() {
        let mesh = PolyMesh::new(6, Vec3::ZERO, Vec3::ONE, 0.3, 0.2);
        assert!(matches!(mesh.validate(), Err(Error::EmptyMesh(_))));

        let mut mesh = PolyMesh::new(6, Vec3::ZERO, Vec3::ONE, 0.3, 0.2);
        mesh.add_vertex([0, 0, 0]);
        assert!(matches!(mesh.validate(), Err(Error::EmptyMesh(_))));
    }

    #[test]
    fn test_validate_bad_references() {
        let mut mesh = two_quads();
        mesh.polys[0] = 40;
        assert!(matches!(mesh.validate(), Err(Error::InvalidMesh(_))));

        let mut mesh = two_quads();
        mesh.polys[6 + 2] = 9;
        assert!(matches!(mesh.validate(), Err(Error::InvalidMesh(_))));
    }
}
