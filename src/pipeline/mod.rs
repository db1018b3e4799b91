use tracing::debug;

use crate::document::{DocumentWriter, FeatureStream, GlobalAppearances};
use crate::error::Result;
use crate::relocation::{LocalAppTarget, RelocationEngine, RelocationOutcome};

/// Sequences reading, relocation and writing of one document.
///
/// Features are written as soon as they are relocated, so memory use does
/// not grow with the number of features. Unclaimed global appearances are
/// written after the last feature.
#[derive(Debug)]
pub struct Pipeline {
    engine: RelocationEngine,
}

impl Pipeline {
    /// Creates a pipeline from the pre-pass result of a document.
    #[must_use]
    pub fn new(prepass: GlobalAppearances, policy: LocalAppTarget) -> Self {
        let shared = prepass.shared_templates();
        let engine = RelocationEngine::new(prepass.appearances, policy).with_shared_templates(shared);
        Self { engine }
    }

    /// Runs the document through the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails. The writer is not closed
    /// in that case.
    pub fn execute<S, W>(mut self, stream: &mut S, mut writer: W) -> Result<RelocationOutcome>
    where
        S: FeatureStream,
        W: DocumentWriter,
    {
        let mut started = false;
        while let Some(mut feature) = stream.next_feature()? {
            if !started {
                writer.write_start(stream.root_metadata())?;
                started = true;
            }
            self.engine.relocate(&mut feature)?;
            writer.write_feature(&feature)?;
        }
        if !started {
            writer.write_start(stream.root_metadata())?;
        }

        let outcome = self.engine.finish()?;
        for appearance in &outcome.remaining {
            writer.write_appearance(appearance)?;
        }
        writer.close()?;

        debug!(
            features = outcome.statistic.features,
            appearances = outcome.statistic.appearances,
            unclaimed = outcome.unclaimed,
            "document relocated"
        );
        Ok(outcome)
    }
}
