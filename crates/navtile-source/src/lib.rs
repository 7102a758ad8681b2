//! Source meshes for tile baking
//!
//! These are the records produced by an upstream mesh generator: a convex
//! polygon mesh in grid space, an optional detail triangulation in world
//! space, and the settings the tile is baked with. The tile builder only
//! reads them.

mod config;
mod detail_mesh;
mod polymesh;

pub use config::{TileBuildSettings, MAX_VERTS_PER_POLY};
pub use detail_mesh::{DetailSubMesh, DetailTri, PolyMeshDetail, DETAIL_EDGE_BOUNDARY};
pub use polymesh::{
    PolyMesh, SourceEdge, BORDER_DIR, BORDER_DIR_MASK, BORDER_EDGE_FLAG, MESH_NULL_IDX,
};
