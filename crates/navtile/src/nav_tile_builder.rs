//! Navigation tile builder
//!
//! Building a tile is a count-then-fill process. The capacity pass
//! classifies off-mesh connections and counts every output array exactly;
//! the packing passes then allocate each array once, at that size, and fill
//! it without ever growing it.

use glam::Vec3;

use super::bv_tree::BvTree;
use super::nav_tile::{
    NavTile, NeighborCode, OffMeshConnection, Poly, PolyDetail, PolyType, TileHeader,
    TileLocation,
};
use super::off_mesh::{classify_off_mesh_point, BoundarySide, OffMeshConnectionDesc};
use super::PolyFlags;
use navtile_common::{Bounds, Error, Result};
use navtile_source::{
    DetailTri, PolyMesh, PolyMeshDetail, SourceEdge, TileBuildSettings, BORDER_DIR,
    DETAIL_EDGE_BOUNDARY,
};

/// Largest polygon count whose internal neighbor codes fit beside `EXT_LINK`
const MAX_TILE_POLYS: usize = 0x7fff;

/// Largest vertex count addressable by a polygon vertex index
const MAX_TILE_VERTS: usize = 0xffff;

/// Exact sizes of every array of a tile, computed before anything is packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCapacity {
    /// Vertices of the source mesh
    pub source_vert_count: usize,
    /// Ground polygons of the source mesh
    pub ground_poly_count: usize,
    /// Edges over all ground polygons
    pub edge_count: usize,
    /// Edges facing a tile side
    pub portal_count: usize,
    /// Connection endpoints that lie outside this tile
    pub off_mesh_link_count: usize,
    /// Connections whose start point this tile owns
    pub retained_count: usize,
    /// Extra detail vertices
    pub detail_vert_count: usize,
    /// Detail triangles
    pub detail_tri_count: usize,
}

impl TileCapacity {
    /// Polygons including one per retained connection
    pub fn poly_count(&self) -> usize {
        self.ground_poly_count + self.retained_count
    }

    /// Vertices including two per retained connection
    pub fn vert_count(&self) -> usize {
        self.source_vert_count + self.retained_count * 2
    }

    /// Upper bound on the links a runtime will create for the tile
    pub fn max_link_count(&self) -> usize {
        self.edge_count + self.portal_count * 2 + self.off_mesh_link_count * 2
    }

    fn check_limits(&self) -> Result<()> {
        if self.poly_count() > MAX_TILE_POLYS {
            return Err(Error::InvalidMesh(format!(
                "{} polygons exceed the tile limit of {}",
                self.poly_count(),
                MAX_TILE_POLYS
            )));
        }

        if self.vert_count() > MAX_TILE_VERTS {
            return Err(Error::InvalidMesh(format!(
                "{} vertices exceed the tile limit of {}",
                self.vert_count(),
                MAX_TILE_VERTS
            )));
        }

        Ok(())
    }
}

/// Classification of both endpoints of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConnectionSides {
    start: BoundarySide,
    end: BoundarySide,
}

impl ConnectionSides {
    fn retained(&self) -> bool {
        self.start.is_owned()
    }
}

/// Everything the packing passes need from the capacity pass
struct TilePlan {
    capacity: TileCapacity,
    sides: Vec<ConnectionSides>,
}

/// Builder for creating navigation tiles from polygon mesh data
#[derive(Debug, Clone)]
pub struct NavTileBuilder {
    settings: TileBuildSettings,
    location: TileLocation,
    user_id: u32,
}

impl NavTileBuilder {
    /// Creates a builder placing tiles at the origin of the tile grid
    pub fn new(settings: TileBuildSettings) -> Self {
        Self {
            settings,
            location: TileLocation::default(),
            user_id: 0,
        }
    }

    /// Sets the grid location written to the tile header
    pub fn with_location(mut self, location: TileLocation) -> Self {
        self.location = location;
        self
    }

    /// Sets the user ID written to the tile header
    pub fn with_user_id(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }

    /// Generation settings
    pub fn settings(&self) -> &TileBuildSettings {
        &self.settings
    }

    /// Builds a tile
    ///
    /// `connections` may hold connections of the whole world; only those
    /// starting inside this tile's footprint end up in the tile. Without a
    /// detail mesh every polygon is fan-triangulated instead.
    pub fn build(
        &self,
        mesh: &PolyMesh,
        detail: Option<&PolyMeshDetail>,
        connections: &[OffMeshConnectionDesc],
    ) -> Result<NavTile> {
        let plan = self.plan_tile(mesh, detail, connections)?;
        let cap = plan.capacity;

        log::debug!(
            "Packing tile ({}, {}, {}): {} polys, {} verts, {} off-mesh connections, {} detail verts, {} detail tris",
            self.location.x,
            self.location.y,
            self.location.layer,
            cap.poly_count(),
            cap.vert_count(),
            cap.retained_count,
            cap.detail_vert_count,
            cap.detail_tri_count
        );

        let header = self.build_header(mesh, &cap);
        let verts = self.build_vertices(mesh, connections, &plan);
        let polys = Self::build_polygons(mesh, connections, &plan);

        let (detail_meshes, detail_verts, detail_tris) = match detail {
            Some(detail) => Self::merge_detail_mesh(mesh, detail, &cap),
            None => Self::triangulate_polygons(mesh, &cap),
        };

        let bv_tree = if self.settings.build_bv_tree {
            let tree = BvTree::build(mesh, self.settings.cell_size, self.settings.cell_height);
            log::debug!("Built BV tree with {} nodes", tree.len());
            Some(tree)
        } else {
            None
        };

        let off_mesh_connections = Self::build_off_mesh_connections(mesh, connections, &plan);

        debug_assert_eq!(verts.len(), cap.vert_count());
        debug_assert_eq!(polys.len(), cap.poly_count());
        debug_assert_eq!(detail_meshes.len(), cap.ground_poly_count);
        debug_assert_eq!(detail_verts.len(), cap.detail_vert_count);
        debug_assert_eq!(detail_tris.len(), cap.detail_tri_count);
        debug_assert_eq!(off_mesh_connections.len(), cap.retained_count);

        Ok(NavTile {
            header,
            verts,
            polys,
            detail_meshes,
            detail_verts,
            detail_tris,
            bv_tree,
            off_mesh_connections,
        })
    }

    /// Runs validation and the capacity pass without building anything
    pub fn plan(
        &self,
        mesh: &PolyMesh,
        detail: Option<&PolyMeshDetail>,
        connections: &[OffMeshConnectionDesc],
    ) -> Result<TileCapacity> {
        self.plan_tile(mesh, detail, connections)
            .map(|plan| plan.capacity)
    }

    fn plan_tile(
        &self,
        mesh: &PolyMesh,
        detail: Option<&PolyMeshDetail>,
        connections: &[OffMeshConnectionDesc],
    ) -> Result<TilePlan> {
        self.validate(mesh, detail)?;

        let sides = self.classify_connections(mesh, detail, connections);
        Self::validate_connections(mesh, connections, &sides)?;

        let capacity = Self::count_capacity(mesh, detail, &sides);
        capacity.check_limits()?;

        Ok(TilePlan { capacity, sides })
    }

    /// Validates settings and source meshes
    fn validate(&self, mesh: &PolyMesh, detail: Option<&PolyMeshDetail>) -> Result<()> {
        self.settings.validate()?;
        mesh.validate()?;

        if mesh.nvp != self.settings.max_verts_per_poly {
            return Err(Error::InvalidConfig(format!(
                "mesh stores {} vertices per polygon, settings expect {}",
                mesh.nvp, self.settings.max_verts_per_poly
            )));
        }

        let same = |a: f32, b: f32| (a - b).abs() <= f32::EPSILON * a.abs().max(b.abs());
        if !same(mesh.cs, self.settings.cell_size) || !same(mesh.ch, self.settings.cell_height) {
            return Err(Error::InvalidConfig(format!(
                "mesh cell size {}x{} differs from settings {}x{}",
                mesh.cs, mesh.ch, self.settings.cell_size, self.settings.cell_height
            )));
        }

        for i in 0..mesh.npolys {
            for j in 0..mesh.poly_vert_count(i) {
                let edge = mesh.edge(i, j);
                if NeighborCode::from_source_edge(edge).is_none() {
                    return Err(Error::InvalidMesh(format!(
                        "polygon {} edge {} has unknown boundary direction {:?}",
                        i, j, edge
                    )));
                }
            }
        }

        if let Some(detail) = detail {
            detail.validate_against(mesh)?;
        }

        Ok(())
    }

    /// Only connections this tile keeps must reference a valid polygon
    fn validate_connections(
        mesh: &PolyMesh,
        connections: &[OffMeshConnectionDesc],
        sides: &[ConnectionSides],
    ) -> Result<()> {
        for (index, (con, side)) in connections.iter().zip(sides).enumerate() {
            if side.retained() && con.poly >= mesh.npolys {
                return Err(Error::InvalidConnection {
                    index,
                    reason: format!(
                        "attached polygon {} out of range, mesh has {}",
                        con.poly, mesh.npolys
                    ),
                });
            }
        }
        Ok(())
    }

    /// World position of a source grid vertex
    fn world_vertex(&self, mesh: &PolyMesh, i: usize) -> Vec3 {
        let [x, y, z] = mesh.vertex(i);
        let cs = self.settings.cell_size;
        let ch = self.settings.cell_height;
        mesh.bmin + Vec3::new(x as f32 * cs, y as f32 * ch, z as f32 * cs)
    }

    /// Footprint used to decide connection ownership
    ///
    /// Horizontally the mesh bounds; vertically the height range of the
    /// tile geometry grown by the agent's climb height.
    fn classification_bounds(&self, mesh: &PolyMesh, detail: Option<&PolyMeshDetail>) -> Bounds {
        let footprint = Bounds::new(mesh.bmin, mesh.bmax);
        let geometry = match detail {
            Some(detail) => Bounds::from_points(detail.verts.iter().copied()),
            None => Bounds::from_points((0..mesh.nverts).map(|i| self.world_vertex(mesh, i))),
        }
        .unwrap_or(footprint);

        footprint
            .with_vertical_range(geometry.min.y, geometry.max.y)
            .padded_vertically(self.settings.max_climb)
    }

    fn classify_connections(
        &self,
        mesh: &PolyMesh,
        detail: Option<&PolyMeshDetail>,
        connections: &[OffMeshConnectionDesc],
    ) -> Vec<ConnectionSides> {
        if connections.is_empty() {
            return Vec::new();
        }

        let bounds = self.classification_bounds(mesh, detail);

        connections
            .iter()
            .enumerate()
            .map(|(i, con)| {
                let mut start = classify_off_mesh_point(con.start, bounds.min, bounds.max);
                let end = classify_off_mesh_point(con.end, bounds.min, bounds.max);

                // Start points above or below the tile geometry are not ours
                if start.is_owned() && !bounds.contains_height(con.start.y) {
                    start = BoundarySide::PosX;
                }

                if !start.is_owned() {
                    log::trace!("Off-mesh connection {} starts outside the tile ({:?})", i, start);
                }

                ConnectionSides { start, end }
            })
            .collect()
    }

    /// Counts every output array
    fn count_capacity(
        mesh: &PolyMesh,
        detail: Option<&PolyMeshDetail>,
        sides: &[ConnectionSides],
    ) -> TileCapacity {
        let mut cap = TileCapacity {
            source_vert_count: mesh.nverts,
            ground_poly_count: mesh.npolys,
            ..Default::default()
        };

        for side in sides {
            cap.off_mesh_link_count += usize::from(!side.start.is_owned());
            cap.off_mesh_link_count += usize::from(!side.end.is_owned());
            cap.retained_count += usize::from(side.retained());
        }

        for i in 0..mesh.npolys {
            for j in 0..mesh.poly_vert_count(i) {
                cap.edge_count += 1;
                if let SourceEdge::Boundary { dir } = mesh.edge(i, j) {
                    if dir != BORDER_DIR {
                        cap.portal_count += 1;
                    }
                }
            }
        }

        match detail {
            Some(detail) => {
                cap.detail_vert_count = detail
                    .meshes
                    .iter()
                    .enumerate()
                    .map(|(i, m)| m.vert_count as usize - mesh.poly_vert_count(i))
                    .sum();
                cap.detail_tri_count = detail.tri_count();
            }
            None => {
                cap.detail_vert_count = 0;
                cap.detail_tri_count = (0..mesh.npolys)
                    .map(|i| mesh.poly_vert_count(i) - 2)
                    .sum();
            }
        }

        cap
    }

    fn build_header(&self, mesh: &PolyMesh, cap: &TileCapacity) -> TileHeader {
        TileHeader {
            x: self.location.x,
            y: self.location.y,
            layer: self.location.layer,
            user_id: self.user_id,
            poly_count: cap.poly_count(),
            vert_count: cap.vert_count(),
            max_link_count: cap.max_link_count(),
            bmin: mesh.bmin,
            bmax: mesh.bmax,
            detail_mesh_count: cap.ground_poly_count,
            detail_vert_count: cap.detail_vert_count,
            detail_tri_count: cap.detail_tri_count,
            walkable_height: self.settings.agent_height,
            walkable_radius: self.settings.agent_radius,
            walkable_climb: self.settings.max_climb,
            off_mesh_base: cap.ground_poly_count,
            off_mesh_con_count: cap.retained_count,
            bv_node_count: if self.settings.build_bv_tree {
                cap.ground_poly_count * 2
            } else {
                0
            },
            bv_quant_factor: 1.0 / self.settings.cell_size,
        }
    }

    /// Source vertices in world space, then both endpoints of each kept connection
    fn build_vertices(
        &self,
        mesh: &PolyMesh,
        connections: &[OffMeshConnectionDesc],
        plan: &TilePlan,
    ) -> Vec<Vec3> {
        let mut verts = Vec::with_capacity(plan.capacity.vert_count());

        verts.extend((0..mesh.nverts).map(|i| self.world_vertex(mesh, i)));

        for (con, side) in connections.iter().zip(&plan.sides) {
            if side.retained() {
                verts.push(con.start);
                verts.push(con.end);
            }
        }

        verts
    }

    /// Ground polygons followed by one degenerate polygon per kept connection
    fn build_polygons(
        mesh: &PolyMesh,
        connections: &[OffMeshConnectionDesc],
        plan: &TilePlan,
    ) -> Vec<Poly> {
        let mut polys = Vec::with_capacity(plan.capacity.poly_count());

        for i in 0..mesh.npolys {
            let flags = PolyFlags::from_bits_retain(mesh.flags[i]);
            let mut poly = Poly::new(mesh.areas[i], PolyType::Ground, flags);

            for (j, &v) in mesh.poly_verts(i).iter().enumerate() {
                // Directions were checked in validate
                let neighbor = NeighborCode::from_source_edge(mesh.edge(i, j)).unwrap_or_default();
                poly.push_vertex(v, neighbor);
            }

            polys.push(poly);
        }

        let vert_base = mesh.nverts;
        let retained = connections
            .iter()
            .zip(&plan.sides)
            .filter(|(_, side)| side.retained());

        for (n, (con, _)) in retained.enumerate() {
            let mut poly = Poly::new(mesh.areas[con.poly], PolyType::OffMeshConnection, con.flags);
            poly.push_vertex((vert_base + n * 2) as u16, NeighborCode::Boundary);
            poly.push_vertex((vert_base + n * 2 + 1) as u16, NeighborCode::Boundary);
            polys.push(poly);
        }

        polys
    }

    /// Compacts the detail mesh, dropping the copies of polygon corners
    fn merge_detail_mesh(
        mesh: &PolyMesh,
        detail: &PolyMeshDetail,
        cap: &TileCapacity,
    ) -> (Vec<PolyDetail>, Vec<Vec3>, Vec<DetailTri>) {
        let mut detail_meshes = Vec::with_capacity(cap.ground_poly_count);
        let mut detail_verts = Vec::with_capacity(cap.detail_vert_count);

        for (i, m) in detail.meshes.iter().enumerate() {
            let nv = mesh.poly_vert_count(i);
            let extra = &detail.sub_mesh_verts(i)[nv..];

            detail_meshes.push(PolyDetail {
                vert_base: detail_verts.len() as u32,
                vert_count: extra.len() as u32,
                tri_base: m.tri_base,
                tri_count: m.tri_count,
            });
            detail_verts.extend_from_slice(extra);
        }

        // Triangle references are sub-mesh local, so they survive compaction
        let detail_tris = detail.tris.clone();

        (detail_meshes, detail_verts, detail_tris)
    }

    /// Fan-triangulates every ground polygon around its first vertex
    ///
    /// Triangle `k` is `(0, k - 1, k)`. Its edge `(k - 1, k)` always lies on
    /// the polygon rim; the edge from vertex 0 does so only on the first
    /// triangle and the edge back to vertex 0 only on the last.
    fn triangulate_polygons(
        mesh: &PolyMesh,
        cap: &TileCapacity,
    ) -> (Vec<PolyDetail>, Vec<Vec3>, Vec<DetailTri>) {
        let mut detail_meshes = Vec::with_capacity(cap.ground_poly_count);
        let mut detail_tris = Vec::with_capacity(cap.detail_tri_count);

        for i in 0..mesh.npolys {
            let nv = mesh.poly_vert_count(i);

            detail_meshes.push(PolyDetail {
                vert_base: 0,
                vert_count: 0,
                tri_base: detail_tris.len() as u32,
                tri_count: (nv - 2) as u32,
            });

            for k in 2..nv {
                let mut flags = DETAIL_EDGE_BOUNDARY << 2;
                if k == 2 {
                    flags |= DETAIL_EDGE_BOUNDARY;
                }
                if k == nv - 1 {
                    flags |= DETAIL_EDGE_BOUNDARY << 4;
                }
                detail_tris.push(DetailTri::new(0, (k - 1) as u8, k as u8, flags));
            }
        }

        (detail_meshes, Vec::new(), detail_tris)
    }

    fn build_off_mesh_connections(
        mesh: &PolyMesh,
        connections: &[OffMeshConnectionDesc],
        plan: &TilePlan,
    ) -> Vec<OffMeshConnection> {
        let mut stored = Vec::with_capacity(plan.capacity.retained_count);
        let poly_base = mesh.npolys;

        for (con, side) in connections.iter().zip(&plan.sides) {
            if !side.retained() {
                continue;
            }
            stored.push(OffMeshConnection {
                poly: (poly_base + stored.len()) as u16,
                start: con.start,
                end: con.end,
                radius: con.radius,
                flags: con.flags,
                dir: con.dir,
                side: side.end,
                user_id: con.user_id,
            });
        }

        stored
    }
}
