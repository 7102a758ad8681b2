//! Tile records produced by the tile builder
//!
//! A [`NavTile`] is an immutable snapshot: a header plus parallel arrays of
//! vertices, polygons, detail descriptors, detail vertices and detail
//! triangles, an optional bounding volume tree and the off-mesh connections
//! this tile owns.

use glam::Vec3;

use super::bv_tree::BvTree;
use super::off_mesh::{BoundarySide, OffMeshDirection};
use super::PolyFlags;
use navtile_source::{DetailTri, SourceEdge, BORDER_DIR, MAX_VERTS_PER_POLY};

/// Raw neighbor flag marking an edge that leads out of the tile
pub const EXT_LINK: u16 = 0x8000;

/// Side of the tile a portal edge faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[repr(u8)]
pub enum PortalSide {
    PosX = 0,
    PosZ = 1,
    NegX = 2,
    NegZ = 3,
}

impl PortalSide {
    /// All sides in index order
    pub const ALL: [PortalSide; 4] = [
        PortalSide::PosX,
        PortalSide::PosZ,
        PortalSide::NegX,
        PortalSide::NegZ,
    ];

    /// Side for a 2-bit index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// 2-bit index of the side
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Off-mesh sector this side faces
    #[inline]
    pub fn sector(self) -> u8 {
        self.index() * 2
    }

    /// Side for a source mesh boundary direction
    ///
    /// Source directions are numbered from -X, a quarter turn away from the
    /// tile numbering.
    pub fn from_source_dir(dir: u8) -> Option<Self> {
        match dir {
            0 => Some(PortalSide::NegX),
            1 => Some(PortalSide::PosZ),
            2 => Some(PortalSide::PosX),
            3 => Some(PortalSide::NegZ),
            _ => None,
        }
    }
}

/// What lies across a polygon edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum NeighborCode {
    /// Nothing: the edge is a true mesh boundary
    #[default]
    Boundary,
    /// Another polygon of the same tile
    Internal(u16),
    /// Unresolved portal into the adjacent tile on the given side
    Portal(PortalSide),
}

impl NeighborCode {
    /// Translates a source edge descriptor
    ///
    /// Returns `None` for a boundary direction that is neither a border nor
    /// a tile side.
    pub fn from_source_edge(edge: SourceEdge) -> Option<Self> {
        match edge {
            SourceEdge::Neighbor(idx) => Some(NeighborCode::Internal(idx)),
            SourceEdge::Boundary { dir } if dir == BORDER_DIR => Some(NeighborCode::Boundary),
            SourceEdge::Boundary { dir } => PortalSide::from_source_dir(dir).map(NeighborCode::Portal),
        }
    }

    /// Packed form: `0`, `index + 1`, or `EXT_LINK | side`
    pub fn to_raw(self) -> u16 {
        match self {
            NeighborCode::Boundary => 0,
            NeighborCode::Internal(idx) => idx + 1,
            NeighborCode::Portal(side) => EXT_LINK | side.index() as u16,
        }
    }

    /// Unpacks a raw code, rejecting portal directions outside 0..=3
    pub fn from_raw(raw: u16) -> Option<Self> {
        if raw == 0 {
            Some(NeighborCode::Boundary)
        } else if raw & EXT_LINK != 0 {
            let dir = raw & !EXT_LINK;
            if dir > 3 {
                return None;
            }
            PortalSide::from_index(dir as u8).map(NeighborCode::Portal)
        } else {
            Some(NeighborCode::Internal(raw - 1))
        }
    }

    /// Checks whether the edge leads out of the tile
    pub fn is_portal(self) -> bool {
        matches!(self, NeighborCode::Portal(_))
    }
}

/// Polygon type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PolyType {
    /// Walkable surface polygon
    #[default]
    Ground,
    /// Degenerate two-vertex polygon standing in for an off-mesh connection
    OffMeshConnection,
}

/// Polygon in the tile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Poly {
    /// Vertex indices into the tile vertex array
    pub(crate) verts: [u16; MAX_VERTS_PER_POLY],
    /// Neighbor across each edge
    pub(crate) neighbors: [NeighborCode; MAX_VERTS_PER_POLY],
    /// Number of vertices in the polygon
    pub(crate) vert_count: u8,
    /// Area ID of the polygon
    pub(crate) area: u8,
    /// Flags for the polygon
    pub(crate) flags: PolyFlags,
    /// Polygon type
    pub(crate) poly_type: PolyType,
}

impl Poly {
    /// Creates a polygon with no vertices
    pub fn new(area: u8, poly_type: PolyType, flags: PolyFlags) -> Self {
        Self {
            verts: [0; MAX_VERTS_PER_POLY],
            neighbors: [NeighborCode::Boundary; MAX_VERTS_PER_POLY],
            vert_count: 0,
            area,
            flags,
            poly_type,
        }
    }

    /// Appends a vertex together with the neighbor across the edge it starts
    pub(crate) fn push_vertex(&mut self, vert: u16, neighbor: NeighborCode) {
        let n = self.vert_count as usize;
        self.verts[n] = vert;
        self.neighbors[n] = neighbor;
        self.vert_count += 1;
    }

    /// Vertex indices
    #[inline]
    pub fn verts(&self) -> &[u16] {
        &self.verts[..self.vert_count as usize]
    }

    /// Neighbor codes, one per edge
    #[inline]
    pub fn neighbors(&self) -> &[NeighborCode] {
        &self.neighbors[..self.vert_count as usize]
    }

    /// Number of vertices
    #[inline]
    pub fn vert_count(&self) -> usize {
        self.vert_count as usize
    }

    /// Area ID
    #[inline]
    pub fn area(&self) -> u8 {
        self.area
    }

    /// Traversal flags
    #[inline]
    pub fn flags(&self) -> PolyFlags {
        self.flags
    }

    /// Polygon type
    #[inline]
    pub fn poly_type(&self) -> PolyType {
        self.poly_type
    }
}

/// Detail mesh ranges of a ground polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PolyDetail {
    /// First extra vertex in the detail vertex array
    pub vert_base: u32,
    /// Number of extra vertices; polygon corners are not duplicated
    pub vert_count: u32,
    /// First triangle in the detail triangle array
    pub tri_base: u32,
    /// Number of triangles
    pub tri_count: u32,
}

/// Off-mesh connection owned by this tile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct OffMeshConnection {
    /// Index of the connection's polygon in this tile
    pub poly: u16,
    /// Start position, inside this tile
    pub start: Vec3,
    /// End position
    pub end: Vec3,
    /// Endpoint snapping radius
    pub radius: f32,
    /// Traversal flags
    pub flags: PolyFlags,
    /// Allowed traversal direction
    pub dir: OffMeshDirection,
    /// Where the end position lies relative to this tile
    pub side: BoundarySide,
    /// User defined ID
    pub user_id: u32,
}

/// Placement of a tile in the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TileLocation {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

impl TileLocation {
    /// Creates a tile location
    pub fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }
}

/// Tile header information
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TileHeader {
    /// Tile position (x, y, layer)
    pub x: i32,
    pub y: i32,
    pub layer: i32,
    /// User defined data
    pub user_id: u32,
    /// Number of polygons, off-mesh polygons included
    pub poly_count: usize,
    /// Number of vertices, off-mesh endpoints included
    pub vert_count: usize,
    /// Upper bound on the links a runtime needs for this tile
    pub max_link_count: usize,
    /// Bounding box of the tile
    pub bmin: Vec3,
    pub bmax: Vec3,
    /// Number of detail meshes, equal to the ground polygon count
    pub detail_mesh_count: usize,
    /// Number of extra detail vertices
    pub detail_vert_count: usize,
    /// Number of detail triangles
    pub detail_tri_count: usize,
    /// Agent parameters the tile was built for
    pub walkable_height: f32,
    pub walkable_radius: f32,
    pub walkable_climb: f32,
    /// Index of the first off-mesh connection polygon
    pub off_mesh_base: usize,
    /// Number of off-mesh connections
    pub off_mesh_con_count: usize,
    /// Number of bounding volume nodes
    pub bv_node_count: usize,
    /// Quantization factor of the bounding volume tree
    pub bv_quant_factor: f32,
}

/// A baked navigation tile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavTile {
    pub(crate) header: TileHeader,
    pub(crate) verts: Vec<Vec3>,
    pub(crate) polys: Vec<Poly>,
    pub(crate) detail_meshes: Vec<PolyDetail>,
    pub(crate) detail_verts: Vec<Vec3>,
    pub(crate) detail_tris: Vec<DetailTri>,
    pub(crate) bv_tree: Option<BvTree>,
    pub(crate) off_mesh_connections: Vec<OffMeshConnection>,
}

impl NavTile {
    /// Tile header
    pub fn header(&self) -> &TileHeader {
        &self.header
    }

    /// Vertices: ground vertices first, then two per off-mesh connection
    pub fn verts(&self) -> &[Vec3] {
        &self.verts
    }

    /// Polygons: ground polygons first, then one per off-mesh connection
    pub fn polys(&self) -> &[Poly] {
        &self.polys
    }

    /// Ground polygons only
    pub fn ground_polys(&self) -> &[Poly] {
        &self.polys[..self.header.off_mesh_base]
    }

    /// Off-mesh connection polygons only
    pub fn off_mesh_polys(&self) -> &[Poly] {
        &self.polys[self.header.off_mesh_base..]
    }

    /// Detail descriptors, one per ground polygon
    pub fn detail_meshes(&self) -> &[PolyDetail] {
        &self.detail_meshes
    }

    /// Extra detail vertices
    pub fn detail_verts(&self) -> &[Vec3] {
        &self.detail_verts
    }

    /// Detail triangles
    pub fn detail_tris(&self) -> &[DetailTri] {
        &self.detail_tris
    }

    /// Bounding volume tree, if one was built
    pub fn bv_tree(&self) -> Option<&BvTree> {
        self.bv_tree.as_ref()
    }

    /// Off-mesh connections owned by this tile
    pub fn off_mesh_connections(&self) -> &[OffMeshConnection] {
        &self.off_mesh_connections
    }

    /// Positions of a polygon's vertices, `None` for an unknown polygon
    pub fn poly_positions(&self, poly: usize) -> Option<impl Iterator<Item = Vec3> + '_> {
        let p = self.polys.get(poly)?;
        Some(p.verts().iter().filter_map(|&v| self.verts.get(v as usize).copied()))
    }

    /// Triangles of a ground polygon's detail mesh, `None` for anything else
    pub fn poly_detail_tris(&self, poly: usize) -> Option<&[DetailTri]> {
        let pd = self.detail_meshes.get(poly)?;
        let start = pd.tri_base as usize;
        self.detail_tris.get(start..start + pd.tri_count as usize)
    }

    /// Resolves vertex `k` of a detail triangle of ground polygon `poly`
    ///
    /// References below the polygon's vertex count are polygon corners, the
    /// rest index the polygon's extra detail vertices.
    pub fn detail_tri_vertex(&self, poly: usize, tri: &DetailTri, k: usize) -> Option<Vec3> {
        let p = self.polys.get(poly)?;
        let pd = self.detail_meshes.get(poly)?;
        let r = *tri.verts.get(k)? as usize;
        if r < p.vert_count() {
            self.verts.get(p.verts[r] as usize).copied()
        } else {
            let local = r - p.vert_count();
            if local >= pd.vert_count as usize {
                return None;
            }
            self.detail_verts.get(pd.vert_base as usize + local).copied()
        }
    }
}
