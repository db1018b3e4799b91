//! Document collaborator interface.
//!
//! The relocation engine never touches the encoding of a document. It relies
//! on a pre-pass reader for the global appearances, a feature-at-a-time
//! stream, and an incremental writer.

pub mod jsonl;
pub mod memory;

use std::path::Path;

use crate::error::{DecodeError, EncodeError};
use crate::model::{Appearance, Feature, RootMetadata};
use crate::relocation::{SharedTemplates, TemplateUsage};

pub use jsonl::{CityGmlVersion, JsonlFeatureStream, JsonlFormat, JsonlWriter};
pub use memory::{MemoryDocument, MemoryStream};

/// Everything the pre-pass extracts from a document.
#[derive(Debug, Default, Clone)]
pub struct GlobalAppearances {
    /// Global appearances in document order.
    pub appearances: Vec<Appearance>,
    /// Implicit-geometry template usage across all features.
    pub template_usage: TemplateUsage,
}

impl GlobalAppearances {
    /// Returns the templates instanced by more than one implicit geometry.
    #[must_use]
    pub fn shared_templates(&self) -> SharedTemplates {
        self.template_usage.clone().into_shared()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.appearances.is_empty()
    }
}

/// Yields the top-level features of a document one at a time.
pub trait FeatureStream {
    /// Reads the next feature, or `None` at the end of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is malformed or unreadable.
    fn next_feature(&mut self) -> Result<Option<Feature>, DecodeError>;

    /// Root container metadata, available while positioned at the first feature
    /// or at the end of a document without features.
    fn root_metadata(&self) -> Option<&RootMetadata>;
}

/// Serializes a document incrementally.
pub trait DocumentWriter {
    /// Starts the document, seeded with the root container metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn write_start(&mut self, root: Option<&RootMetadata>) -> Result<(), EncodeError>;

    /// Writes one top-level feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn write_feature(&mut self, feature: &Feature) -> Result<(), EncodeError>;

    /// Writes one global appearance.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn write_appearance(&mut self, appearance: &Appearance) -> Result<(), EncodeError>;

    /// Flushes and closes the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn close(self) -> Result<(), EncodeError>
    where
        Self: Sized;
}

/// A concrete document encoding bound to the file system.
pub trait DocumentFormat {
    type Stream: FeatureStream;
    type Writer: DocumentWriter;

    /// Reads the global appearances without materializing the features.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is malformed or unreadable.
    fn read_global_appearances(&self, source: &Path) -> Result<GlobalAppearances, DecodeError>;

    /// Opens a feature-at-a-time reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    fn open_feature_stream(&self, source: &Path) -> Result<Self::Stream, DecodeError>;

    /// Creates a writer for `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created.
    fn open_writer(&self, destination: &Path) -> Result<Self::Writer, EncodeError>;
}
