//! Off-mesh connection ownership
//!
//! Every tile sees the full connection list. A tile keeps a connection only
//! when the connection's start point lies inside its footprint, so each
//! connection is owned by exactly one tile without any cross-tile
//! coordination. The end point is classified into one of eight sectors
//! around the tile so a later stitching pass knows which neighbor to search.

use glam::Vec3;

use super::PolyFlags;

/// Location of a point relative to a tile footprint
///
/// Sectors are numbered 0..8 starting at +X and turning towards +Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[repr(u8)]
pub enum BoundarySide {
    PosX = 0,
    PosXPosZ = 1,
    PosZ = 2,
    NegXPosZ = 3,
    NegX = 4,
    NegXNegZ = 5,
    NegZ = 6,
    PosXNegZ = 7,
    /// Inside the footprint
    Owned = 0xff,
}

impl BoundarySide {
    /// Side for a sector number, `None` outside 0..8
    pub fn from_sector(sector: u8) -> Option<Self> {
        let side = match sector {
            0 => BoundarySide::PosX,
            1 => BoundarySide::PosXPosZ,
            2 => BoundarySide::PosZ,
            3 => BoundarySide::NegXPosZ,
            4 => BoundarySide::NegX,
            5 => BoundarySide::NegXNegZ,
            6 => BoundarySide::NegZ,
            7 => BoundarySide::PosXNegZ,
            _ => return None,
        };
        Some(side)
    }

    /// Sector number, `None` for an owned point
    pub fn sector(self) -> Option<u8> {
        match self {
            BoundarySide::Owned => None,
            side => Some(side as u8),
        }
    }

    /// Raw byte form, `0xff` for an owned point
    #[inline]
    pub fn to_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_owned(self) -> bool {
        self == BoundarySide::Owned
    }
}

const XP: u8 = 1 << 0;
const ZP: u8 = 1 << 1;
const XM: u8 = 1 << 2;
const ZM: u8 = 1 << 3;

/// Classifies `pt` against the horizontal footprint `bmin..bmax`
///
/// The footprint is half-open: points on the min edges are owned, points on
/// the max edges belong to the next tile over.
pub fn classify_off_mesh_point(pt: Vec3, bmin: Vec3, bmax: Vec3) -> BoundarySide {
    let mut outcode = 0;
    if pt.x >= bmax.x {
        outcode |= XP;
    }
    if pt.z >= bmax.z {
        outcode |= ZP;
    }
    if pt.x < bmin.x {
        outcode |= XM;
    }
    if pt.z < bmin.z {
        outcode |= ZM;
    }

    match outcode {
        XP => BoundarySide::PosX,
        o if o == XP | ZP => BoundarySide::PosXPosZ,
        ZP => BoundarySide::PosZ,
        o if o == XM | ZP => BoundarySide::NegXPosZ,
        XM => BoundarySide::NegX,
        o if o == XM | ZM => BoundarySide::NegXNegZ,
        ZM => BoundarySide::NegZ,
        o if o == XP | ZM => BoundarySide::PosXNegZ,
        _ => BoundarySide::Owned,
    }
}

/// Allowed traversal direction of an off-mesh connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum OffMeshDirection {
    #[default]
    Bidirectional,
    StartToEnd,
}

/// Off-mesh connection as authored, before tile ownership is decided
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct OffMeshConnectionDesc {
    /// Start position
    pub start: Vec3,
    /// End position
    pub end: Vec3,
    /// Endpoint snapping radius
    pub radius: f32,
    /// Traversal flags
    pub flags: PolyFlags,
    /// Allowed traversal direction
    #[cfg_attr(feature = "serialization", serde(default))]
    pub dir: OffMeshDirection,
    /// Source polygon the connection is attached to; its area is inherited
    pub poly: usize,
    /// User defined ID
    #[cfg_attr(feature = "serialization", serde(default))]
    pub user_id: u32,
}

impl OffMeshConnectionDesc {
    /// Creates a bidirectional connection
    pub fn new(start: Vec3, end: Vec3, radius: f32, flags: PolyFlags, poly: usize) -> Self {
        Self {
            start,
            end,
            radius,
            flags,
            dir: OffMeshDirection::Bidirectional,
            poly,
            user_id: 0,
        }
    }

    /// Sets the traversal direction
    pub fn with_dir(mut self, dir: OffMeshDirection) -> Self {
        self.dir = dir;
        self
    }

    /// Sets the user ID
    pub fn with_user_id(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }
}
