use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Point3};

use super::appearance::strip_fragment;

/// The GML geometry type of a [`Geometry`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Polygon,
    MultiSurface,
    CompositeSurface,
    Shell,
    Solid,
    CompositeSolid,
    MultiSolid,
    MultiCurve,
    MultiPoint,
}

/// A closed linear ring of a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub points: Vec<Point3>,
}

/// A geometry tree.
///
/// Polygons carry rings; aggregates and solids carry member geometries.
/// Every identifier in the tree is a potential appearance target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: GeometryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lod: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rings: Vec<LinearRing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Geometry>,
}

impl Geometry {
    /// Creates a polygon with a single exterior ring.
    #[must_use]
    pub fn polygon(id: impl Into<String>, points: Vec<Point3>) -> Self {
        let id = id.into();
        Self {
            rings: vec![LinearRing {
                id: Some(format!("{id}_ring")),
                points,
            }],
            id: Some(id),
            kind: GeometryKind::Polygon,
            lod: None,
            members: Vec::new(),
        }
    }

    /// Creates an aggregate geometry from member geometries.
    #[must_use]
    pub fn aggregate(kind: GeometryKind, id: Option<String>, members: Vec<Geometry>) -> Self {
        Self {
            id,
            kind,
            lod: None,
            rings: Vec::new(),
            members,
        }
    }

    /// Calls `f` for every identifier in this geometry tree, pre-order.
    ///
    /// Ring identifiers are included because texture coordinates and some
    /// writers reference rings directly.
    pub fn for_each_id<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        if let Some(id) = &self.id {
            f(id);
        }
        for ring in &self.rings {
            if let Some(id) = &ring.id {
                f(id);
            }
        }
        for member in &self.members {
            member.for_each_id(f);
        }
    }
}

/// The prototypical geometry of an implicit geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateGeometry {
    /// The template defined in place (its first occurrence).
    Inline(Geometry),
    /// A cross-reference to a template defined elsewhere.
    Reference { href: String },
}

/// An instance of a template geometry placed by a transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplicitGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub reference_point: Point3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Matrix4>,
    pub template: TemplateGeometry,
}

impl ImplicitGeometry {
    /// Returns the identifier of the referenced template.
    #[must_use]
    pub fn template_id(&self) -> Option<&str> {
        match &self.template {
            TemplateGeometry::Inline(geometry) => geometry.id.as_deref(),
            TemplateGeometry::Reference { href } => Some(strip_fragment(href)),
        }
    }

    /// Returns the inline template geometry, if defined here.
    #[must_use]
    pub fn inline_template(&self) -> Option<&Geometry> {
        match &self.template {
            TemplateGeometry::Inline(geometry) => Some(geometry),
            TemplateGeometry::Reference { .. } => None,
        }
    }
}
