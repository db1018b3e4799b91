use std::fmt;
use std::ops::AddAssign;

use crate::model::SurfaceDataKind;

/// Counters describing what a relocation run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultStatistic {
    /// Streamed top-level features.
    pub features: usize,
    /// Local appearances created.
    pub appearances: usize,
    pub parameterized_textures: usize,
    pub georeferenced_textures: usize,
    pub x3d_materials: usize,
}

impl ResultStatistic {
    /// Creates a zeroed statistic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one relocated surface data object.
    pub fn record_surface_data(&mut self, kind: SurfaceDataKind) {
        match kind {
            SurfaceDataKind::ParameterizedTexture => self.parameterized_textures += 1,
            SurfaceDataKind::GeoreferencedTexture => self.georeferenced_textures += 1,
            SurfaceDataKind::X3dMaterial => self.x3d_materials += 1,
        }
    }

    /// Total number of relocated surface data objects.
    #[must_use]
    pub fn surface_data(&self) -> usize {
        self.parameterized_textures + self.georeferenced_textures + self.x3d_materials
    }
}

impl AddAssign for ResultStatistic {
    fn add_assign(&mut self, other: Self) {
        self.features += other.features;
        self.appearances += other.appearances;
        self.parameterized_textures += other.parameterized_textures;
        self.georeferenced_textures += other.georeferenced_textures;
        self.x3d_materials += other.x3d_materials;
    }
}

impl fmt::Display for ResultStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} feature(s), {} local appearance(s), {} ParameterizedTexture, {} GeoreferencedTexture, {} X3DMaterial",
            self.features,
            self.appearances,
            self.parameterized_textures,
            self.georeferenced_textures,
            self.x3d_materials
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_kind_and_merges() {
        let mut a = ResultStatistic::new();
        a.features = 2;
        a.record_surface_data(SurfaceDataKind::X3dMaterial);
        a.record_surface_data(SurfaceDataKind::ParameterizedTexture);

        let mut b = ResultStatistic::new();
        b.appearances = 1;
        b.record_surface_data(SurfaceDataKind::GeoreferencedTexture);

        a += b;
        assert_eq!(a.features, 2);
        assert_eq!(a.appearances, 1);
        assert_eq!(a.surface_data(), 3);
        assert_eq!(a.georeferenced_textures, 1);
    }
}
