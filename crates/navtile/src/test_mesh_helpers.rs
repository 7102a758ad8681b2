//! Source meshes shared by the tile builder tests
//!
//! Grid meshes use one-unit quads made of 2x2 cells (cell size 0.5). Quad
//! vertices are ordered so that edge `j` lies on source side `j`:
//! 0 = -X, 1 = +Z, 2 = +X, 3 = -Z.

use glam::Vec3;

use crate::{OffMeshConnectionDesc, PolyFlags};
use navtile_source::{
    DetailTri, PolyMesh, PolyMeshDetail, TileBuildSettings, BORDER_EDGE_FLAG, MESH_NULL_IDX,
};

pub const CELL_SIZE: f32 = 0.5;
pub const CELL_HEIGHT: f32 = 0.25;
pub const AREA_GROUND: u8 = 1;
pub const AREA_WATER: u8 = 2;

/// Settings matching the grid meshes
pub fn test_settings() -> TileBuildSettings {
    TileBuildSettings {
        max_verts_per_poly: 6,
        cell_size: CELL_SIZE,
        cell_height: CELL_HEIGHT,
        agent_height: 2.0,
        agent_radius: 0.5,
        max_climb: 0.5,
        build_bv_tree: true,
    }
}

/// Index of the quad at column `cx`, row `cz`
pub fn quad_index(w: usize, cx: usize, cz: usize) -> usize {
    cz * w + cx
}

/// A `w` x `h` grid of quads
///
/// Edges on the tile sides become portals when `portals` is set and
/// borders otherwise. The tile origin is `origin`; all vertices sit at
/// grid height 0.
pub fn grid_mesh(w: usize, h: usize, origin: Vec3, portals: bool) -> PolyMesh {
    let bmax = origin + Vec3::new(w as f32, 2.0, h as f32);
    let mut mesh = PolyMesh::new(6, origin, bmax, CELL_SIZE, CELL_HEIGHT);

    for z in 0..=h {
        for x in 0..=w {
            mesh.add_vertex([(x * 2) as u16, 0, (z * 2) as u16]);
        }
    }

    let vert = |x: usize, z: usize| (z * (w + 1) + x) as u16;
    let side = |dir: u16| {
        if portals {
            BORDER_EDGE_FLAG | dir
        } else {
            MESH_NULL_IDX
        }
    };

    for cz in 0..h {
        for cx in 0..w {
            let verts = [
                vert(cx, cz),
                vert(cx, cz + 1),
                vert(cx + 1, cz + 1),
                vert(cx + 1, cz),
            ];
            let edges = [
                if cx > 0 { quad_index(w, cx - 1, cz) as u16 } else { side(0) },
                if cz + 1 < h { quad_index(w, cx, cz + 1) as u16 } else { side(1) },
                if cx + 1 < w { quad_index(w, cx + 1, cz) as u16 } else { side(2) },
                if cz > 0 { quad_index(w, cx, cz - 1) as u16 } else { side(3) },
            ];
            let area = if (cx + cz) % 2 == 0 { AREA_GROUND } else { AREA_WATER };
            mesh.add_polygon(&verts, &edges, area, PolyFlags::WALK.bits());
        }
    }

    mesh
}

/// A single regular-ish polygon with `n` corners and only border edges
pub fn single_polygon_mesh(n: usize) -> PolyMesh {
    let corners: [[u16; 3]; 6] = [[0, 0, 2], [0, 0, 6], [4, 0, 8], [8, 0, 6], [8, 0, 2], [4, 0, 0]];
    let mut mesh = PolyMesh::new(6, Vec3::ZERO, Vec3::new(4.0, 1.0, 4.0), CELL_SIZE, CELL_HEIGHT);
    let verts: Vec<u16> = corners[..n].iter().map(|&c| mesh.add_vertex(c)).collect();
    mesh.add_polygon(&verts, &[], AREA_GROUND, PolyFlags::WALK.bits());
    mesh
}

/// World position of a source vertex, as the builder computes it
pub fn world_vertex(mesh: &PolyMesh, i: usize) -> Vec3 {
    let [x, y, z] = mesh.vertex(i);
    mesh.bmin + Vec3::new(x as f32 * CELL_SIZE, y as f32 * CELL_HEIGHT, z as f32 * CELL_SIZE)
}

/// Detail mesh giving every polygon of `mesh` one extra center vertex
///
/// The center is raised by `lift` so its height differs from the corners.
pub fn center_detail_mesh(mesh: &PolyMesh, lift: f32) -> PolyMeshDetail {
    let mut detail = PolyMeshDetail::new();

    for i in 0..mesh.npolys {
        let mut verts: Vec<Vec3> = mesh
            .poly_verts(i)
            .iter()
            .map(|&v| world_vertex(mesh, v as usize))
            .collect();
        let nv = verts.len();
        let center = verts.iter().copied().sum::<Vec3>() / nv as f32 + Vec3::Y * lift;
        verts.push(center);

        let tris: Vec<DetailTri> = (0..nv)
            .map(|k| DetailTri::new(k as u8, ((k + 1) % nv) as u8, nv as u8, 0x01))
            .collect();
        detail.add_sub_mesh(&verts, &tris);
    }

    detail
}

/// Detail mesh that only repeats each polygon's own corners
pub fn corner_only_detail_mesh(mesh: &PolyMesh) -> PolyMeshDetail {
    let mut detail = PolyMeshDetail::new();

    for i in 0..mesh.npolys {
        let verts: Vec<Vec3> = mesh
            .poly_verts(i)
            .iter()
            .map(|&v| world_vertex(mesh, v as usize))
            .collect();
        let tris: Vec<DetailTri> = (2..verts.len())
            .map(|k| DetailTri::new(0, (k - 1) as u8, k as u8, 0))
            .collect();
        detail.add_sub_mesh(&verts, &tris);
    }

    detail
}

/// Connection from `start` to `end` attached to source polygon `poly`
pub fn jump(start: Vec3, end: Vec3, poly: usize) -> OffMeshConnectionDesc {
    OffMeshConnectionDesc::new(start, end, 0.5, PolyFlags::JUMP, poly)
}
