//! Tile baking for navigation meshes
//!
//! The [`NavTileBuilder`] turns a source [`PolyMesh`], an optional
//! [`PolyMeshDetail`] and a list of off-mesh connections into a [`NavTile`]:
//! a compact, immutable, tile-local representation a pathfinding runtime can
//! consume directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use navtile::{NavTileBuilder, TileBuildSettings, TileLocation};
//!
//! let builder = NavTileBuilder::new(TileBuildSettings::default())
//!     .with_location(TileLocation::new(3, 7, 0));
//! let tile = builder.build(&poly_mesh, Some(&detail_mesh), &connections)?;
//!
//! println!("{} polygons, {} vertices", tile.header().poly_count, tile.verts().len());
//! ```
//!
//! # Architecture
//!
//! - [`off_mesh`]: sector classification deciding which tile owns a connection
//! - [`nav_tile_builder`]: capacity counting followed by the packing passes
//! - [`bv_tree`]: quantized bounding volume tree over the ground polygons
//! - [`nav_tile`]: the output records

pub mod bv_tree;
pub mod nav_tile;
pub mod nav_tile_builder;
pub mod off_mesh;
#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(test)]
mod off_mesh_classification_tests;
#[cfg(test)]
pub(crate) mod test_mesh_helpers;

pub use bv_tree::{BvNode, BvTree};
pub use nav_tile::{
    NavTile, NeighborCode, OffMeshConnection, Poly, PolyDetail, PolyType, PortalSide, TileHeader,
    TileLocation, EXT_LINK,
};
pub use nav_tile_builder::{NavTileBuilder, TileCapacity};
pub use off_mesh::{classify_off_mesh_point, BoundarySide, OffMeshConnectionDesc, OffMeshDirection};
#[cfg(feature = "parallel")]
pub use parallel::{build_tiles, TileInput};

pub use navtile_common::{Error, Result};
pub use navtile_source::{
    DetailTri, PolyMesh, PolyMeshDetail, TileBuildSettings, DETAIL_EDGE_BOUNDARY,
    MAX_VERTS_PER_POLY,
};

bitflags::bitflags! {
    /// Traversal flags of a polygon or off-mesh connection
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(
        feature = "serialization",
        derive(serde::Serialize, serde::Deserialize)
    )]
    pub struct PolyFlags: u16 {
        /// Ability to walk (ground, grass, road)
        const WALK = 0x01;
        /// Ability to swim (water)
        const SWIM = 0x02;
        /// Ability to move through doors
        const DOOR = 0x04;
        /// Ability to jump
        const JUMP = 0x08;
        /// Disabled polygon
        const DISABLED = 0x10;
    }
}
