//! Line-delimited JSON encoding of city model documents.
//!
//! ```text
//! {"type":"model","id":"CM1","version":"2.0"}
//! {"type":"feature","id":"B1","kind":"Building","geometries":[...]}
//! {"type":"appearance","theme":"rgbTexture","surface_data":[...]}
//! ```
//!
//! The optional `model` record must come first. `feature` and `appearance`
//! records may be interleaved; top-level `appearance` records are the global
//! appearances of the document.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::model::{strip_fragment, Appearance, Feature, RootMetadata};
use crate::relocation::TemplateUsage;

use super::{DocumentFormat, DocumentWriter, FeatureStream, GlobalAppearances};

/// Version stamped into the `model` record of written documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CityGmlVersion {
    V1_0,
    #[default]
    V2_0,
}

impl fmt::Display for CityGmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1_0 => "1.0",
            Self::V2_0 => "2.0",
        })
    }
}

impl FromStr for CityGmlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "2.0" => Ok(Self::V2_0),
            other => Err(format!("unsupported CityGML version '{other}', expected 1.0 or 2.0")),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecordRef<'a> {
    Model(&'a RootMetadata),
    Feature(&'a Feature),
    Appearance(&'a Appearance),
}

/// Record view used by the feature stream; appearances are skipped unparsed.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamRecord {
    Model(RootMetadata),
    Feature(Box<Feature>),
    Appearance {},
}

/// Record view used by the pre-pass; features are only scanned for templates.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PrepassRecord {
    Model {},
    Feature(FeatureSkeleton),
    Appearance(Appearance),
}

#[derive(Deserialize)]
struct FeatureSkeleton {
    #[serde(default)]
    implicit_geometries: Vec<ImplicitSkeleton>,
    #[serde(default)]
    children: Vec<FeatureSkeleton>,
}

#[derive(Deserialize)]
struct ImplicitSkeleton {
    template: TemplateSkeleton,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TemplateSkeleton {
    Inline(IdSkeleton),
    Reference { href: String },
}

#[derive(Deserialize)]
struct IdSkeleton {
    #[serde(default)]
    id: Option<String>,
}

impl FeatureSkeleton {
    fn record_templates(&self, usage: &mut TemplateUsage, position: usize, path: &mut Vec<usize>) {
        for implicit in &self.implicit_geometries {
            let template = match &implicit.template {
                TemplateSkeleton::Inline(IdSkeleton { id: Some(id) }) => id.as_str(),
                TemplateSkeleton::Inline(IdSkeleton { id: None }) => continue,
                TemplateSkeleton::Reference { href } => strip_fragment(href),
            };
            usage.record_template(template, position, path);
        }
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            child.record_templates(usage, position, path);
            path.pop();
        }
    }
}

/// Reads the global appearances and template usage of a document.
///
/// # Errors
///
/// Returns an error if a line cannot be read or parsed, or if the `model`
/// record is not the first record.
pub fn read_global_appearances<R: BufRead>(reader: R) -> Result<GlobalAppearances, DecodeError> {
    let mut prepass = GlobalAppearances::default();
    let mut records = 0usize;
    let mut features = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        let record: PrepassRecord = serde_json::from_str(&line)
            .map_err(|source| DecodeError::Malformed { line: number, source })?;
        match record {
            PrepassRecord::Model {} if records > 0 => {
                return Err(DecodeError::UnexpectedRecord {
                    line: number,
                    record: "model",
                });
            }
            PrepassRecord::Model {} => {}
            PrepassRecord::Feature(skeleton) => {
                skeleton.record_templates(&mut prepass.template_usage, features, &mut Vec::new());
                features += 1;
            }
            PrepassRecord::Appearance(appearance) => prepass.appearances.push(appearance),
        }
        records += 1;
    }

    Ok(prepass)
}

/// Streams the features of a line-delimited JSON document.
#[derive(Debug)]
pub struct JsonlFeatureStream<R> {
    reader: R,
    buffer: String,
    line: usize,
    records: usize,
    features: usize,
    root: Option<RootMetadata>,
}

impl<R: BufRead> JsonlFeatureStream<R> {
    /// Creates a stream over `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
            records: 0,
            features: 0,
            root: None,
        }
    }
}

impl<R: BufRead> FeatureStream for JsonlFeatureStream<R> {
    fn next_feature(&mut self) -> Result<Option<Feature>, DecodeError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if self.buffer.trim().is_empty() {
                continue;
            }

            let record: StreamRecord =
                serde_json::from_str(&self.buffer).map_err(|source| DecodeError::Malformed {
                    line: self.line,
                    source,
                })?;
            self.records += 1;
            match record {
                StreamRecord::Model(_) if self.records > 1 => {
                    return Err(DecodeError::UnexpectedRecord {
                        line: self.line,
                        record: "model",
                    });
                }
                StreamRecord::Model(root) => self.root = Some(root),
                StreamRecord::Feature(feature) => {
                    self.features += 1;
                    return Ok(Some(*feature));
                }
                StreamRecord::Appearance {} => {}
            }
        }
    }

    fn root_metadata(&self) -> Option<&RootMetadata> {
        if self.features <= 1 {
            self.root.as_ref()
        } else {
            None
        }
    }
}

/// Writes a line-delimited JSON document.
#[derive(Debug)]
pub struct JsonlWriter<W: Write> {
    out: W,
    version: CityGmlVersion,
    started: bool,
}

impl<W: Write> JsonlWriter<W> {
    /// Creates a writer stamping `version` into the `model` record.
    #[must_use]
    pub fn new(out: W, version: CityGmlVersion) -> Self {
        Self {
            out,
            version,
            started: false,
        }
    }

    /// Consumes the writer and returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, record: &RecordRef<'_>) -> Result<(), EncodeError> {
        if !self.started {
            return Err(EncodeError::Structure("record written before start of document".into()));
        }
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> DocumentWriter for JsonlWriter<W> {
    fn write_start(&mut self, root: Option<&RootMetadata>) -> Result<(), EncodeError> {
        if self.started {
            return Err(EncodeError::Structure("document already started".into()));
        }
        let mut metadata = root.cloned().unwrap_or_default();
        metadata.version = Some(self.version.to_string());

        self.started = true;
        self.write_record(&RecordRef::Model(&metadata))
    }

    fn write_feature(&mut self, feature: &Feature) -> Result<(), EncodeError> {
        self.write_record(&RecordRef::Feature(feature))
    }

    fn write_appearance(&mut self, appearance: &Appearance) -> Result<(), EncodeError> {
        self.write_record(&RecordRef::Appearance(appearance))
    }

    fn close(mut self) -> Result<(), EncodeError> {
        if !self.started {
            return Err(EncodeError::Structure("document closed before it was started".into()));
        }
        self.out.flush()?;
        Ok(())
    }
}

/// The line-delimited JSON format bound to files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlFormat {
    version: CityGmlVersion,
}

impl JsonlFormat {
    /// Creates the format writing documents of the given version.
    #[must_use]
    pub fn new(version: CityGmlVersion) -> Self {
        Self { version }
    }

    #[must_use]
    pub fn version(&self) -> CityGmlVersion {
        self.version
    }
}

impl DocumentFormat for JsonlFormat {
    type Stream = JsonlFeatureStream<BufReader<File>>;
    type Writer = JsonlWriter<BufWriter<File>>;

    fn read_global_appearances(&self, source: &Path) -> Result<GlobalAppearances, DecodeError> {
        read_global_appearances(BufReader::new(File::open(source)?))
    }

    fn open_feature_stream(&self, source: &Path) -> Result<Self::Stream, DecodeError> {
        Ok(JsonlFeatureStream::new(BufReader::new(File::open(source)?)))
    }

    fn open_writer(&self, destination: &Path) -> Result<Self::Writer, EncodeError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)?;
        Ok(JsonlWriter::new(BufWriter::new(file), self.version))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::math::Point2;
    use crate::model::{GeoreferencedTexture, SurfaceData};

    const DOCUMENT: &str = r##"{"type":"model","id":"CM","name":"Test city"}
{"type":"feature","id":"B1","kind":"Building","geometries":[{"id":"S1","kind":"multi_surface"}]}

{"type":"appearance","id":"A1","theme":"vis","surface_data":[{"kind":"x3d_material","id":"M1","diffuse_color":[1.0,0.0,0.0],"targets":["#S1"]}]}
{"type":"feature","id":"T1","kind":"SolitaryVegetationObject","implicit_geometries":[{"reference_point":[0.0,0.0,0.0],"template":{"inline":{"id":"TPL","kind":"multi_surface"}}}]}
{"type":"feature","id":"T2","kind":"SolitaryVegetationObject","implicit_geometries":[{"reference_point":[5.0,0.0,0.0],"template":{"reference":{"href":"#TPL"}}}]}
"##;

    #[test]
    fn prepass_reads_appearances_and_template_usage() {
        let prepass = read_global_appearances(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(prepass.appearances.len(), 1);
        assert_eq!(prepass.appearances[0].theme.as_deref(), Some("vis"));
        assert_eq!(prepass.template_usage.count("TPL"), 2);
        assert!(prepass.shared_templates().contains("TPL"));
    }

    #[test]
    fn prepass_counts_each_feature_once_per_template() {
        let input = r##"{"type":"feature","id":"T1","kind":"SolitaryVegetationObject","implicit_geometries":[{"reference_point":[0.0,0.0,0.0],"template":{"inline":{"id":"TPL","kind":"multi_surface"}}},{"reference_point":[0.0,0.0,0.0],"template":{"reference":{"href":"#TPL"}}}]}
"##;
        let prepass = read_global_appearances(input.as_bytes()).unwrap();
        assert_eq!(prepass.template_usage.count("TPL"), 1);
        assert!(prepass.shared_templates().is_empty());
    }

    #[test]
    fn stream_skips_appearances_and_exposes_root_at_first_feature() {
        let mut stream = JsonlFeatureStream::new(DOCUMENT.as_bytes());

        let first = stream.next_feature().unwrap().unwrap();
        assert_eq!(first.id.as_deref(), Some("B1"));
        assert_eq!(stream.root_metadata().and_then(|r| r.id.as_deref()), Some("CM"));

        let second = stream.next_feature().unwrap().unwrap();
        assert_eq!(second.id.as_deref(), Some("T1"));
        assert!(stream.root_metadata().is_none());

        assert!(stream.next_feature().unwrap().is_some());
        assert!(stream.next_feature().unwrap().is_none());
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let input = "{\"type\":\"feature\",\"kind\":\"Building\"}\n{not json}\n";
        let mut stream = JsonlFeatureStream::new(input.as_bytes());
        assert!(stream.next_feature().unwrap().is_some());
        let err = stream.next_feature().unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { line: 2, .. }));
    }

    #[test]
    fn late_model_record_is_rejected() {
        let input = "{\"type\":\"feature\",\"kind\":\"Building\"}\n{\"type\":\"model\"}\n";
        let err = read_global_appearances(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedRecord { line: 2, record: "model" }));
    }

    #[test]
    fn writer_stamps_version_and_requires_start() {
        let mut writer = JsonlWriter::new(Vec::new(), CityGmlVersion::V1_0);
        assert!(writer.write_feature(&Feature::new("Building")).is_err());

        writer.write_start(None).unwrap();
        writer.write_feature(&Feature::new("Building").with_id("B1")).unwrap();
        assert!(writer.write_start(None).is_err());

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"model","version":"1.0"}"#);
        assert!(lines[1].starts_with(r#"{"type":"feature","id":"B1""#));
    }

    #[test]
    fn georeferenced_texture_survives_round_trip() {
        let appearance = Appearance::new(Some("ortho".into())).with_surface_data(
            SurfaceData::GeoreferencedTexture(GeoreferencedTexture {
                id: Some("G1".into()),
                image_uri: "ortho.tif".into(),
                prefer_world_file: false,
                reference_point: Some(Point2::new(345_000.25, 5_800_000.5)),
                orientation: None,
                targets: vec!["#ROOF".into()],
            }),
        );

        let mut writer = JsonlWriter::new(Vec::new(), CityGmlVersion::V2_0);
        writer.write_start(None).unwrap();
        writer.write_appearance(&appearance).unwrap();
        let bytes = writer.into_inner();

        let prepass = read_global_appearances(bytes.as_slice()).unwrap();
        let SurfaceData::GeoreferencedTexture(texture) = &prepass.appearances[0].surface_data[0] else {
            panic!("expected georeferenced texture");
        };
        let point = texture.reference_point.unwrap();
        assert_relative_eq!(point.x, 345_000.25);
        assert_relative_eq!(point.y, 5_800_000.5);
    }

    #[test]
    fn parses_versions() {
        assert_eq!("1.0".parse::<CityGmlVersion>(), Ok(CityGmlVersion::V1_0));
        assert!("3.0".parse::<CityGmlVersion>().is_err());
        assert_eq!(CityGmlVersion::default().to_string(), "2.0");
    }
}
