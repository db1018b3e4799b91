use serde::{Deserialize, Serialize};

use crate::math::{Matrix2, Matrix3x4, Point2};

/// An appearance: a themed collection of surface data.
///
/// Global appearances are top-level document members that reference their
/// target geometry by identifier; local appearances are owned by a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surface_data: Vec<SurfaceData>,
}

impl Appearance {
    /// Creates an empty appearance with the given theme.
    #[must_use]
    pub fn new(theme: Option<String>) -> Self {
        Self {
            id: None,
            theme,
            surface_data: Vec::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends a surface data object.
    #[must_use]
    pub fn with_surface_data(mut self, surface_data: SurfaceData) -> Self {
        self.surface_data.push(surface_data);
        self
    }
}

/// The three supported kinds of surface data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceDataKind {
    ParameterizedTexture,
    GeoreferencedTexture,
    X3dMaterial,
}

/// A texture or material that decorates target surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceData {
    /// An image texture mapped with texture coordinates or a transformation.
    ParameterizedTexture(ParameterizedTexture),
    /// An image texture positioned in world coordinates.
    GeoreferencedTexture(GeoreferencedTexture),
    /// A constant material.
    X3dMaterial(X3dMaterial),
}

impl SurfaceData {
    /// Returns the identifier of the surface data object, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::ParameterizedTexture(t) => t.id.as_deref(),
            Self::GeoreferencedTexture(t) => t.id.as_deref(),
            Self::X3dMaterial(m) => m.id.as_deref(),
        }
    }

    /// Returns the kind of this surface data.
    #[must_use]
    pub fn kind(&self) -> SurfaceDataKind {
        match self {
            Self::ParameterizedTexture(_) => SurfaceDataKind::ParameterizedTexture,
            Self::GeoreferencedTexture(_) => SurfaceDataKind::GeoreferencedTexture,
            Self::X3dMaterial(_) => SurfaceDataKind::X3dMaterial,
        }
    }

    /// Returns the identifiers of the decorated surfaces, without a leading `#`,
    /// deduplicated in declaration order.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            Self::ParameterizedTexture(t) => t.targets.iter().map(|t| t.uri.as_str()).collect(),
            Self::GeoreferencedTexture(t) => t.targets.iter().map(String::as_str).collect(),
            Self::X3dMaterial(m) => m.targets.iter().map(String::as_str).collect(),
        };

        let mut targets: Vec<&str> = Vec::with_capacity(raw.len());
        for uri in raw {
            let id = strip_fragment(uri);
            if !id.is_empty() && !targets.contains(&id) {
                targets.push(id);
            }
        }
        targets
    }
}

/// Strips the leading `#` of a local cross-reference.
#[must_use]
pub fn strip_fragment(uri: &str) -> &str {
    uri.strip_prefix('#').unwrap_or(uri)
}

/// Texture wrapping behaviour outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    None,
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// An image texture mapped onto its targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterizedTexture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub image_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_mode: Option<WrapMode>,
    /// RGBA border color used with [`WrapMode::Border`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<[f64; 4]>,
    #[serde(default)]
    pub targets: Vec<TextureTarget>,
}

/// A polygon decorated by a parameterized texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureTarget {
    pub uri: String,
    pub parameterization: TextureParameterization,
}

/// How texture space is mapped onto a target polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureParameterization {
    /// Explicit texture coordinates, one list per ring of the polygon.
    TexCoordList(Vec<RingTexCoords>),
    /// A world-to-texture projection.
    TexCoordGen { world_to_texture: Matrix3x4 },
}

/// Texture coordinates of one linear ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingTexCoords {
    pub ring: String,
    pub coords: Vec<Point2>,
}

/// An image texture georeferenced in the horizontal plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoreferencedTexture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub image_uri: String,
    #[serde(default)]
    pub prefer_world_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_point: Option<Point2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Matrix2>,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// A constant X3D material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct X3dMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse_color: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_color: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular_color: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shininess: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(default)]
    pub is_smooth: bool,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl X3dMaterial {
    /// Creates a material with a diffuse color and the given targets.
    #[must_use]
    pub fn new(id: impl Into<String>, diffuse_color: [f64; 3], targets: Vec<String>) -> Self {
        Self {
            id: Some(id.into()),
            ambient_intensity: None,
            diffuse_color: Some(diffuse_color),
            emissive_color: None,
            specular_color: None,
            shininess: None,
            transparency: None,
            is_smooth: false,
            targets,
        }
    }
}

/// Where a pending entry came from in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppearanceOrigin {
    /// Position of the owning global appearance in the pre-pass sequence.
    pub position: usize,
    pub appearance_id: Option<String>,
    pub theme: Option<String>,
}

impl AppearanceOrigin {
    /// Returns the origins of appearances that carry no surface data.
    #[must_use]
    pub fn without_surface_data(appearances: &[Appearance]) -> Vec<AppearanceOrigin> {
        appearances
            .iter()
            .enumerate()
            .filter(|(_, appearance)| appearance.surface_data.is_empty())
            .map(|(position, appearance)| AppearanceOrigin {
                position,
                appearance_id: appearance.id.clone(),
                theme: appearance.theme.clone(),
            })
            .collect()
    }

    /// Creates an appearance with this origin's identifier and theme.
    fn into_appearance(self) -> Appearance {
        Appearance {
            id: self.appearance_id,
            theme: self.theme,
            surface_data: Vec::new(),
        }
    }
}

/// One surface data object of a global appearance, awaiting relocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceEntry {
    pub(crate) sequence: usize,
    pub origin: AppearanceOrigin,
    pub surface_data: SurfaceData,
}

impl AppearanceEntry {
    /// Splits global appearances into one entry per surface data object.
    #[must_use]
    pub fn explode(appearances: Vec<Appearance>) -> Vec<AppearanceEntry> {
        let mut entries = Vec::new();
        for (position, appearance) in appearances.into_iter().enumerate() {
            let origin = AppearanceOrigin {
                position,
                appearance_id: appearance.id,
                theme: appearance.theme,
            };
            for surface_data in appearance.surface_data {
                entries.push(AppearanceEntry {
                    sequence: entries.len(),
                    origin: origin.clone(),
                    surface_data,
                });
            }
        }
        entries
    }

    /// Rebuilds global appearances from entries, preserving source order.
    ///
    /// Entries of the same origin are written back into a single appearance
    /// carrying the original identifier and theme. `empty` are the origins of
    /// appearances without surface data; they are restored in place.
    #[must_use]
    pub fn regroup(mut entries: Vec<AppearanceEntry>, empty: Vec<AppearanceOrigin>) -> Vec<Appearance> {
        entries.sort_by_key(|e| e.sequence);

        let mut appearances: Vec<(usize, Appearance)> = empty
            .into_iter()
            .map(|origin| (origin.position, origin.into_appearance()))
            .collect();
        let mut current: Option<usize> = None;
        for entry in entries {
            if current != Some(entry.origin.position) {
                current = Some(entry.origin.position);
                appearances.push((entry.origin.position, entry.origin.clone().into_appearance()));
            }
            if let Some((_, last)) = appearances.last_mut() {
                last.surface_data.push(entry.surface_data);
            }
        }

        appearances.sort_by_key(|(position, _)| *position);
        appearances.into_iter().map(|(_, appearance)| appearance).collect()
    }

    /// Returns the entry's own identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.surface_data.id()
    }

    /// Returns the theme of the owning global appearance.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.origin.theme.as_deref()
    }

    /// Returns the identifiers this entry decorates.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        self.surface_data.targets()
    }
}
