//! Fixture documents shared across integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use appmover::document::jsonl::read_global_appearances;
use appmover::document::{
    CityGmlVersion, DocumentWriter, FeatureStream, JsonlFeatureStream, JsonlWriter, MemoryDocument,
};
use appmover::math::{Matrix3x4, Point2, Point3};
use appmover::model::{
    Appearance, Feature, GeoreferencedTexture, Geometry, GeometryKind, ImplicitGeometry,
    ParameterizedTexture, RingTexCoords, RootMetadata, SurfaceData, TemplateGeometry,
    TextureParameterization, TextureTarget, WrapMode, X3dMaterial,
};

pub fn surface(id: &str) -> Geometry {
    Geometry::aggregate(
        GeometryKind::MultiSurface,
        Some(format!("{id}_MS")),
        vec![Geometry::polygon(
            id,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
        )],
    )
}

pub fn material(id: &str, targets: &[&str]) -> SurfaceData {
    SurfaceData::X3dMaterial(X3dMaterial::new(
        id,
        [0.7, 0.7, 0.7],
        targets.iter().map(|t| format!("#{t}")).collect(),
    ))
}

pub fn texture(id: &str, target: &str) -> SurfaceData {
    SurfaceData::ParameterizedTexture(ParameterizedTexture {
        id: Some(id.into()),
        image_uri: format!("tex/{id}.png"),
        mime_type: Some("image/png".into()),
        wrap_mode: Some(WrapMode::None),
        border_color: None,
        targets: vec![TextureTarget {
            uri: format!("#{target}"),
            parameterization: TextureParameterization::TexCoordList(vec![RingTexCoords {
                ring: format!("#{target}_ring"),
                coords: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 0.0),
                    Point2::new(1.0, 1.0),
                    Point2::new(0.0, 0.0),
                ],
            }]),
        }],
    })
}

pub fn projected_texture(id: &str, target: &str) -> SurfaceData {
    SurfaceData::ParameterizedTexture(ParameterizedTexture {
        id: Some(id.into()),
        image_uri: format!("tex/{id}.jpg"),
        mime_type: None,
        wrap_mode: None,
        border_color: None,
        targets: vec![TextureTarget {
            uri: format!("#{target}"),
            parameterization: TextureParameterization::TexCoordGen {
                world_to_texture: Matrix3x4::identity(),
            },
        }],
    })
}

pub fn georeferenced(id: &str, targets: &[&str]) -> SurfaceData {
    SurfaceData::GeoreferencedTexture(GeoreferencedTexture {
        id: Some(id.into()),
        image_uri: "ortho.tif".into(),
        prefer_world_file: true,
        reference_point: Some(Point2::new(500.0, 600.0)),
        orientation: None,
        targets: targets.iter().map(|t| format!("#{t}")).collect(),
    })
}

pub fn implicit(template: TemplateGeometry) -> ImplicitGeometry {
    ImplicitGeometry {
        id: None,
        mime_type: None,
        reference_point: Point3::new(10.0, 10.0, 0.0),
        transformation: None,
        template,
    }
}

/// F1 owns S1; F2 owns nothing directly, its child F2a owns S2.
/// One global appearance "vis" with E1 -> S1 and E2 -> S2.
pub fn example_document() -> MemoryDocument {
    MemoryDocument::new()
        .with_root(RootMetadata {
            id: Some("CM".into()),
            name: Some("Example".into()),
            ..RootMetadata::default()
        })
        .with_feature(Feature::new("Building").with_id("F1").with_geometry(surface("S1")))
        .with_feature(
            Feature::new("Building")
                .with_id("F2")
                .with_child(Feature::new("BuildingPart").with_id("F2a").with_geometry(surface("S2"))),
        )
        .with_appearance(
            Appearance::new(Some("vis".into()))
                .with_id("GA")
                .with_surface_data(material("E1", &["S1"]))
                .with_surface_data(material("E2", &["S2"])),
        )
}

/// E3 targets S3 inside a template instanced by F1 and F3.
pub fn shared_template_document() -> MemoryDocument {
    let template = Geometry::aggregate(GeometryKind::MultiSurface, Some("TPL".into()), vec![Geometry::polygon(
        "S3",
        vec![Point3::origin()],
    )]);
    MemoryDocument::new()
        .with_feature(
            Feature::new("SolitaryVegetationObject")
                .with_id("F1")
                .with_geometry(surface("S1"))
                .with_implicit_geometry(implicit(TemplateGeometry::Inline(template))),
        )
        .with_feature(
            Feature::new("SolitaryVegetationObject")
                .with_id("F3")
                .with_implicit_geometry(implicit(TemplateGeometry::Reference { href: "#TPL".into() })),
        )
        .with_appearance(
            Appearance::new(Some("vis".into()))
                .with_surface_data(material("E1", &["S1"]))
                .with_surface_data(material("E3", &["S3"])),
        )
}

/// A document mixing all surface data kinds, nested features, shared
/// templates, multi-target entries and dangling references.
pub fn mixed_document() -> MemoryDocument {
    let template = Geometry::aggregate(GeometryKind::MultiSurface, Some("LAMP".into()), vec![Geometry::polygon(
        "LAMP_P",
        vec![Point3::origin()],
    )]);
    let mut document = MemoryDocument::new();
    for b in 0..6 {
        let wall = format!("W{b}");
        let roof = format!("R{b}");
        document = document.with_feature(
            Feature::new("Building")
                .with_id(format!("B{b}"))
                .with_geometry(surface(&format!("G{b}")))
                .with_child(Feature::new("WallSurface").with_geometry(surface(&wall)))
                .with_child(Feature::new("RoofSurface").with_geometry(surface(&roof))),
        );
    }
    document = document
        .with_feature(
            Feature::new("CityFurniture")
                .with_id("CF1")
                .with_implicit_geometry(implicit(TemplateGeometry::Inline(template))),
        )
        .with_feature(
            Feature::new("CityFurniture")
                .with_id("CF2")
                .with_implicit_geometry(implicit(TemplateGeometry::Reference { href: "#LAMP".into() })),
        );

    document
        .with_appearance(
            Appearance::new(Some("rgbTexture".into()))
                .with_id("TEX")
                .with_surface_data(texture("T0", "W0"))
                .with_surface_data(texture("T1", "R1"))
                .with_surface_data(projected_texture("T2", "G2"))
                .with_surface_data(texture("T3", "LAMP_P")),
        )
        .with_appearance(
            Appearance::new(Some("rgbTexture".into()))
                .with_id("MAT")
                .with_surface_data(material("M0", &["W0", "R0"]))
                .with_surface_data(material("M1", &["W3", "R4"]))
                .with_surface_data(material("M2", &["NOWHERE"])),
        )
        .with_appearance(
            Appearance::new(Some("ortho".into()))
                .with_id("GEO")
                .with_surface_data(georeferenced("O5", &["R5"])),
        )
}

/// Surface data identifiers of every local appearance in `feature`, recursively.
pub fn local_surface_data_ids(feature: &Feature) -> Vec<String> {
    let mut ids: Vec<String> = feature
        .appearances
        .iter()
        .flat_map(|a| a.surface_data.iter().filter_map(|s| s.id().map(str::to_owned)))
        .collect();
    for child in &feature.children {
        ids.extend(local_surface_data_ids(child));
    }
    ids
}

/// Surface data identifiers of a list of appearances.
pub fn surface_data_ids(appearances: &[Appearance]) -> Vec<String> {
    appearances
        .iter()
        .flat_map(|a| a.surface_data.iter().filter_map(|s| s.id().map(str::to_owned)))
        .collect()
}

/// Writes `document` as line-delimited JSON to `dir/name`.
pub fn write_jsonl(dir: &Path, name: &str, document: &MemoryDocument) -> PathBuf {
    let path = dir.join(name);
    let mut writer = JsonlWriter::new(BufWriter::new(File::create(&path).unwrap()), CityGmlVersion::V2_0);
    writer.write_start(document.root.as_ref()).unwrap();
    for feature in &document.features {
        writer.write_feature(feature).unwrap();
    }
    for appearance in &document.appearances {
        writer.write_appearance(appearance).unwrap();
    }
    writer.close().unwrap();
    path
}

/// Reads a line-delimited JSON document back into memory.
pub fn read_jsonl(path: &Path) -> MemoryDocument {
    let prepass = read_global_appearances(BufReader::new(File::open(path).unwrap())).unwrap();
    let mut stream = JsonlFeatureStream::new(BufReader::new(File::open(path).unwrap()));

    let mut document = MemoryDocument::new();
    while let Some(feature) = stream.next_feature().unwrap() {
        if document.features.is_empty() {
            document.root = stream.root_metadata().cloned();
        }
        document.features.push(feature);
    }
    if document.features.is_empty() {
        document.root = stream.root_metadata().cloned();
    }
    document.appearances = prepass.appearances;
    document
}
