pub mod appearance;
pub mod feature;
pub mod geometry;

pub use appearance::{
    strip_fragment, Appearance, AppearanceEntry, AppearanceOrigin, GeoreferencedTexture,
    ParameterizedTexture, RingTexCoords, SurfaceData, SurfaceDataKind, TextureParameterization,
    TextureTarget, WrapMode, X3dMaterial,
};
pub use feature::{Feature, RootMetadata};
pub use geometry::{Geometry, GeometryKind, ImplicitGeometry, LinearRing, TemplateGeometry};
