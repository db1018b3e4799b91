use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::appearance::Appearance;
use super::geometry::{Geometry, ImplicitGeometry};

/// A city object, possibly with nested sub-features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Feature type name, e.g. `Building` or `WallSurface`.
    pub kind: String,
    /// Attributes carried through unchanged.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implicit_geometries: Vec<ImplicitGeometry>,
    /// Nested sub-features.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Feature>,
    /// Local appearances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub appearances: Vec<Appearance>,
}

impl Feature {
    /// Creates an empty feature of the given type.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    /// Adds an implicit geometry.
    #[must_use]
    pub fn with_implicit_geometry(mut self, implicit: ImplicitGeometry) -> Self {
        self.implicit_geometries.push(implicit);
        self
    }

    /// Adds a nested sub-feature.
    #[must_use]
    pub fn with_child(mut self, child: Feature) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the nested feature at `path` (child indices from this feature),
    /// or `None` if the path leaves the tree.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Feature> {
        path.iter()
            .try_fold(self, |feature, &index| feature.children.get_mut(index))
    }

    /// Counts local appearances in this feature and all nested features.
    #[must_use]
    pub fn appearance_count(&self) -> usize {
        self.appearances.len()
            + self
                .children
                .iter()
                .map(Feature::appearance_count)
                .sum::<usize>()
    }
}

/// Metadata of the root container (the city model) of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Encoding version of the document, e.g. `2.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}
