use std::collections::VecDeque;

use crate::error::{DecodeError, EncodeError};
use crate::model::{Appearance, Feature, RootMetadata};
use crate::relocation::TemplateUsage;

use super::{DocumentWriter, FeatureStream, GlobalAppearances};

/// A document held in memory.
///
/// Serves as a source through [`MemoryDocument::stream`] and as a destination
/// through the [`DocumentWriter`] impl on `&mut MemoryDocument`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pub root: Option<RootMetadata>,
    pub features: Vec<Feature>,
    /// Top-level (global) appearances.
    pub appearances: Vec<Appearance>,
    started: bool,
    closed: bool,
}

impl MemoryDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root container metadata.
    #[must_use]
    pub fn with_root(mut self, root: RootMetadata) -> Self {
        self.root = Some(root);
        self
    }

    /// Adds a top-level feature.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Adds a global appearance.
    #[must_use]
    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearances.push(appearance);
        self
    }

    /// Runs the pre-pass over this document.
    #[must_use]
    pub fn global_appearances(&self) -> GlobalAppearances {
        let mut template_usage = TemplateUsage::new();
        for (position, feature) in self.features.iter().enumerate() {
            template_usage.record_feature(position, feature);
        }
        GlobalAppearances {
            appearances: self.appearances.clone(),
            template_usage,
        }
    }

    /// Opens a feature stream over a copy of the features.
    #[must_use]
    pub fn stream(&self) -> MemoryStream {
        MemoryStream {
            features: self.features.iter().cloned().collect(),
            root: self.root.clone(),
            read: 0,
        }
    }

    /// Returns `true` once the document was written and closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Feature stream over an in-memory document.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    features: VecDeque<Feature>,
    root: Option<RootMetadata>,
    read: usize,
}

impl FeatureStream for MemoryStream {
    fn next_feature(&mut self) -> Result<Option<Feature>, DecodeError> {
        let feature = self.features.pop_front();
        if feature.is_some() {
            self.read += 1;
        }
        Ok(feature)
    }

    fn root_metadata(&self) -> Option<&RootMetadata> {
        if self.read <= 1 {
            self.root.as_ref()
        } else {
            None
        }
    }
}

impl DocumentWriter for &mut MemoryDocument {
    fn write_start(&mut self, root: Option<&RootMetadata>) -> Result<(), EncodeError> {
        if self.started {
            return Err(EncodeError::Structure("document already started".into()));
        }
        self.started = true;
        self.root = root.cloned();
        Ok(())
    }

    fn write_feature(&mut self, feature: &Feature) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.features.push(feature.clone());
        Ok(())
    }

    fn write_appearance(&mut self, appearance: &Appearance) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.appearances.push(appearance.clone());
        Ok(())
    }

    fn close(self) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

impl MemoryDocument {
    fn ensure_open(&self) -> Result<(), EncodeError> {
        if !self.started || self.closed {
            return Err(EncodeError::Structure("document is not open for writing".into()));
        }
        Ok(())
    }
}
