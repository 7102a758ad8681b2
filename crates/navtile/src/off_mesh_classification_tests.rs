//! Tests for off-mesh endpoint sector classification

#[cfg(test)]
mod tests {
    use crate::off_mesh::{classify_off_mesh_point, BoundarySide};
    use glam::Vec3;

    const BMIN: Vec3 = Vec3::new(0.0, -10.0, 0.0);
    const BMAX: Vec3 = Vec3::new(10.0, 10.0, 10.0);

    fn classify(x: f32, z: f32) -> BoundarySide {
        classify_off_mesh_point(Vec3::new(x, 0.0, z), BMIN, BMAX)
    }

    #[test]
    fn test_inside_is_owned() {
        assert_eq!(classify(5.0, 5.0), BoundarySide::Owned);
        assert_eq!(classify(0.0, 0.0), BoundarySide::Owned);
        assert_eq!(classify(9.99, 9.99), BoundarySide::Owned);
        assert_eq!(BoundarySide::Owned.to_raw(), 0xff);
    }

    #[test]
    fn test_all_sectors() {
        let cases = [
            (15.0, 5.0, BoundarySide::PosX, 0),
            (15.0, 15.0, BoundarySide::PosXPosZ, 1),
            (5.0, 15.0, BoundarySide::PosZ, 2),
            (-5.0, 15.0, BoundarySide::NegXPosZ, 3),
            (-5.0, 5.0, BoundarySide::NegX, 4),
            (-5.0, -5.0, BoundarySide::NegXNegZ, 5),
            (5.0, -5.0, BoundarySide::NegZ, 6),
            (15.0, -5.0, BoundarySide::PosXNegZ, 7),
        ];

        for (x, z, side, sector) in cases {
            assert_eq!(classify(x, z), side, "point ({}, {})", x, z);
            assert_eq!(side.sector(), Some(sector));
            assert_eq!(BoundarySide::from_sector(sector), Some(side));
        }
        assert_eq!(BoundarySide::from_sector(8), None);
        assert_eq!(BoundarySide::Owned.sector(), None);
    }

    /// Points on the min edges are owned, but points exactly on a max edge
    /// go to the neighbor on that side. Adjacent tiles share that edge, so
    /// only one of them may claim it.
    #[test]
    fn test_max_edges_belong_to_neighbor() {
        assert_eq!(classify(10.0, 5.0), BoundarySide::PosX);
        assert_eq!(classify(5.0, 10.0), BoundarySide::PosZ);
        assert_eq!(classify(10.0, 10.0), BoundarySide::PosXPosZ);
        assert_eq!(classify(0.0, 10.0), BoundarySide::PosZ);
    }

    #[test]
    fn test_height_is_ignored() {
        let high = classify_off_mesh_point(Vec3::new(5.0, 100.0, 5.0), BMIN, BMAX);
        let low = classify_off_mesh_point(Vec3::new(5.0, -100.0, 5.0), BMIN, BMAX);
        assert_eq!(high, BoundarySide::Owned);
        assert_eq!(low, BoundarySide::Owned);
    }

    #[test]
    fn test_contradictory_outcodes_are_owned() {
        // Inverted bounds let a point be past both x edges at once
        let bmin = Vec3::new(10.0, 0.0, 0.0);
        let bmax = Vec3::new(0.0, 0.0, 10.0);
        let side = classify_off_mesh_point(Vec3::new(5.0, 0.0, 5.0), bmin, bmax);
        assert_eq!(side, BoundarySide::Owned);

        let flat = Vec3::new(5.0, 0.0, 5.0);
        let side = classify_off_mesh_point(flat, flat, flat);
        assert_eq!(side, BoundarySide::PosXPosZ);
    }

    #[test]
    fn test_matches_geometric_sector() {
        let steps = [-7.5, -0.5, 0.0, 2.5, 9.5, 10.0, 12.5];
        for &x in &steps {
            for &z in &steps {
                let dx = if x >= BMAX.x { 1 } else if x < BMIN.x { -1 } else { 0 };
                let dz = if z >= BMAX.z { 1 } else if z < BMIN.z { -1 } else { 0 };
                let expected = match (dx, dz) {
                    (0, 0) => BoundarySide::Owned,
                    (1, 0) => BoundarySide::PosX,
                    (1, 1) => BoundarySide::PosXPosZ,
                    (0, 1) => BoundarySide::PosZ,
                    (-1, 1) => BoundarySide::NegXPosZ,
                    (-1, 0) => BoundarySide::NegX,
                    (-1, -1) => BoundarySide::NegXNegZ,
                    (0, -1) => BoundarySide::NegZ,
                    _ => BoundarySide::PosXNegZ,
                };
                assert_eq!(classify(x, z), expected, "point ({}, {})", x, z);
            }
        }
    }

    #[test]
    fn test_adjacent_tiles_partition_points() {
        let tiles = [
            (Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 1.0, 10.0)),
            (Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 1.0, 10.0)),
            (Vec3::new(0.0, 0.0, 10.0), Vec3::new(10.0, 1.0, 20.0)),
            (Vec3::new(10.0, 0.0, 10.0), Vec3::new(20.0, 1.0, 20.0)),
        ];

        for x in 0..40 {
            for z in 0..40 {
                let pt = Vec3::new(x as f32 * 0.5, 0.0, z as f32 * 0.5);
                let owners = tiles
                    .iter()
                    .filter(|(bmin, bmax)| classify_off_mesh_point(pt, *bmin, *bmax).is_owned())
                    .count();
                assert_eq!(owners, 1, "point {:?}", pt);
            }
        }
    }
}
