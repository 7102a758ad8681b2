//! Settings a tile is baked with

use navtile_common::{Error, Result};

/// Largest polygon the tile format can store
pub const MAX_VERTS_PER_POLY: usize = 6;

/// Generation parameters for a single tile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TileBuildSettings {
    /// The maximum number of vertices per polygon in the source mesh
    pub max_verts_per_poly: usize,

    /// The width/depth resolution of the source grid (cell size)
    pub cell_size: f32,
    /// The height resolution of the source grid (cell height)
    pub cell_height: f32,

    /// Height of the agent the tile is built for
    pub agent_height: f32,
    /// Radius of the agent the tile is built for
    pub agent_radius: f32,
    /// Maximum ledge height the agent can step over
    pub max_climb: f32,

    /// Whether to build the bounding volume tree
    pub build_bv_tree: bool,
}

impl Default for TileBuildSettings {
    fn default() -> Self {
        Self {
            max_verts_per_poly: MAX_VERTS_PER_POLY,
            cell_size: 0.3,
            cell_height: 0.2,
            agent_height: 2.0,
            agent_radius: 0.6,
            max_climb: 0.9,
            build_bv_tree: true,
        }
    }
}

impl TileBuildSettings {
    /// Creates settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the settings
    pub fn validate(&self) -> Result<()> {
        if self.max_verts_per_poly > MAX_VERTS_PER_POLY {
            return Err(Error::InvalidConfig(format!(
                "{} vertices per polygon exceeds the limit of {}",
                self.max_verts_per_poly, MAX_VERTS_PER_POLY
            )));
        }

        if self.max_verts_per_poly < 3 {
            return Err(Error::InvalidConfig(
                "Too few vertices per polygon".to_string(),
            ));
        }

        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.cell_size) || !positive(self.cell_height) {
            return Err(Error::InvalidConfig(
                "Invalid cell size or height".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(TileBuildSettings::new().validate().is_ok());
    }

    #[test]
    fn test_rejects_too_many_verts_per_poly() {
        let settings = TileBuildSettings {
            max_verts_per_poly: MAX_VERTS_PER_POLY + 1,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let settings = TileBuildSettings {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = TileBuildSettings {
            cell_height: f32::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: TileBuildSettings =
            serde_json::from_str(r#"{ "cell_size": 0.5, "build_bv_tree": false }"#).unwrap();
        assert_eq!(settings.cell_size, 0.5);
        assert!(!settings.build_bv_tree);
        assert_eq!(settings.cell_height, 0.2);
        assert_eq!(settings.max_verts_per_poly, MAX_VERTS_PER_POLY);
    }
}
