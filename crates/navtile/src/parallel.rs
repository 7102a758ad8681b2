//! Building many tiles at once
//!
//! Tile builds share nothing but read-only inputs, so a batch is a plain
//! parallel map over the tiles.

use rayon::prelude::*;

use super::nav_tile::{NavTile, TileLocation};
use super::nav_tile_builder::NavTileBuilder;
use super::off_mesh::OffMeshConnectionDesc;
use navtile_common::Result;
use navtile_source::{PolyMesh, PolyMeshDetail, TileBuildSettings};

/// Source data of one tile in a batch
#[derive(Debug, Clone, Copy)]
pub struct TileInput<'a> {
    pub location: TileLocation,
    pub poly_mesh: &'a PolyMesh,
    pub detail_mesh: Option<&'a PolyMeshDetail>,
}

impl<'a> TileInput<'a> {
    pub fn new(
        location: TileLocation,
        poly_mesh: &'a PolyMesh,
        detail_mesh: Option<&'a PolyMeshDetail>,
    ) -> Self {
        Self {
            location,
            poly_mesh,
            detail_mesh,
        }
    }
}

/// Builds every tile of `inputs` in parallel
///
/// Every tile sees the full `connections` list and keeps the ones starting
/// inside it. Results come back in input order; one failing tile does not
/// stop the others.
pub fn build_tiles(
    settings: &TileBuildSettings,
    inputs: &[TileInput<'_>],
    connections: &[OffMeshConnectionDesc],
) -> Vec<Result<NavTile>> {
    log::info!("Building {} tiles in parallel", inputs.len());

    let results: Vec<Result<NavTile>> = inputs
        .par_iter()
        .map(|input| {
            NavTileBuilder::new(settings.clone())
                .with_location(input.location)
                .build(input.poly_mesh, input.detail_mesh, connections)
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} tiles failed to build", failed, inputs.len());
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::{grid_mesh, jump, test_settings};
    use glam::Vec3;
    use navtile_common::Error;

    #[test]
    fn test_parallel_matches_sequential() {
        let settings = test_settings();
        let meshes: Vec<PolyMesh> = (0..4)
            .map(|x| grid_mesh(2, 2, Vec3::new(x as f32 * 2.0, 0.0, 0.0), true))
            .collect();
        let connections = vec![
            jump(Vec3::new(1.5, 0.0, 1.0), Vec3::new(2.5, 0.0, 1.0), 1),
            jump(Vec3::new(5.0, 0.0, 0.5), Vec3::new(3.0, 0.0, 0.5), 0),
        ];

        let inputs: Vec<TileInput> = meshes
            .iter()
            .enumerate()
            .map(|(x, mesh)| TileInput::new(TileLocation::new(x as i32, 0, 0), mesh, None))
            .collect();

        let parallel = build_tiles(&settings, &inputs, &connections);
        assert_eq!(parallel.len(), inputs.len());

        for (input, result) in inputs.iter().zip(parallel) {
            let sequential = NavTileBuilder::new(settings.clone())
                .with_location(input.location)
                .build(input.poly_mesh, None, &connections)
                .unwrap();
            assert_eq!(result.unwrap(), sequential);
        }
    }

    #[test]
    fn test_each_connection_lands_in_one_tile() {
        let settings = test_settings();
        let meshes: Vec<PolyMesh> = (0..3)
            .map(|x| grid_mesh(2, 2, Vec3::new(x as f32 * 2.0, 0.0, 0.0), true))
            .collect();
        // Start points on a shared tile edge belong to the tile on the max side
        let connections: Vec<OffMeshConnectionDesc> = [0.0, 1.0, 2.0, 3.5, 4.0, 5.9]
            .iter()
            .map(|&x| jump(Vec3::new(x, 0.0, 1.0), Vec3::new(x, 0.0, 1.5), 0))
            .collect();

        let inputs: Vec<TileInput> = meshes
            .iter()
            .map(|mesh| TileInput::new(TileLocation::default(), mesh, None))
            .collect();

        let tiles: Vec<NavTile> = build_tiles(&settings, &inputs, &connections)
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        let owned: Vec<usize> = tiles
            .iter()
            .map(|t| t.off_mesh_connections().len())
            .collect();
        assert_eq!(owned, vec![2, 2, 2]);
    }

    #[test]
    fn test_failures_stay_per_tile() {
        let settings = test_settings();
        let good = grid_mesh(1, 1, Vec3::ZERO, false);
        let empty = PolyMesh::new(6, Vec3::ZERO, Vec3::ONE, 0.5, 0.25);

        let inputs = [
            TileInput::new(TileLocation::new(0, 0, 0), &good, None),
            TileInput::new(TileLocation::new(1, 0, 0), &empty, None),
        ];
        let results = build_tiles(&settings, &inputs, &[]);

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::EmptyMesh(_))));
    }
}
