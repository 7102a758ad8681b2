//! Axis-aligned bounds used for tile footprints and connection classification

use glam::Vec3;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Creates bounds from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates inverted bounds that any expansion will overwrite
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Smallest bounds containing every point, or `None` for no points
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand_point(p);
        }
        bounds.is_valid().then_some(bounds)
    }

    /// Checks that min does not exceed max on any axis
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Expands the bounds to include a point
    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Returns a copy with the vertical range replaced
    pub fn with_vertical_range(&self, ymin: f32, ymax: f32) -> Self {
        Self {
            min: Vec3::new(self.min.x, ymin, self.min.z),
            max: Vec3::new(self.max.x, ymax, self.max.z),
        }
    }

    /// Returns a copy grown by `pad` downward and upward
    pub fn padded_vertically(&self, pad: f32) -> Self {
        self.with_vertical_range(self.min.y - pad, self.max.y + pad)
    }

    /// Checks whether a height lies inside the inclusive vertical range
    pub fn contains_height(&self, y: f32) -> bool {
        y >= self.min.y && y <= self.max.y
    }
}
