mod discover;
mod output;

pub use discover::expand_patterns;
pub use output::{add_file_name_suffix, output_path, temporary_path, OUTPUT_SUFFIX};

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};

use crate::document::{DocumentFormat, GlobalAppearances};
use crate::error::{AppMoverError, BatchError, Result};
use crate::pipeline::Pipeline;
use crate::relocation::{LocalAppTarget, RelocationOutcome, ResultStatistic};

/// Options shared by every document of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub target: LocalAppTarget,
    /// Replace the input files instead of writing `-local-app` siblings.
    pub overwrite: bool,
    /// Number of documents processed in parallel.
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            target: LocalAppTarget::default(),
            overwrite: false,
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    /// The document had no global appearances and was left alone.
    NoGlobalAppearances,
    /// The document was rewritten.
    Relocated(RelocationOutcome),
}

/// Result of one successfully handled document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub input: PathBuf,
    /// Where the rewritten document was placed, if it was rewritten.
    pub output: Option<PathBuf>,
    pub status: DocumentStatus,
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub failures: Vec<(PathBuf, AppMoverError)>,
    /// Statistic summed over all relocated documents.
    pub statistic: ResultStatistic,
    /// Unclaimed surface data objects summed over all relocated documents.
    pub unclaimed: usize,
}

impl BatchReport {
    /// Returns `true` if no document failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, input: PathBuf, result: Result<DocumentReport>) {
        match result {
            Ok(report) => {
                if let DocumentStatus::Relocated(outcome) = &report.status {
                    self.statistic += outcome.statistic;
                    self.unclaimed += outcome.unclaimed;
                }
                self.documents.push(report);
            }
            Err(err) => self.failures.push((input, err)),
        }
    }
}

/// Processes many documents, each with its own relocation engine.
#[derive(Debug)]
pub struct BatchRunner<F> {
    format: F,
    options: BatchOptions,
}

impl<F: DocumentFormat + Sync> BatchRunner<F> {
    /// Creates a new `BatchRunner`.
    #[must_use]
    pub fn new(format: F, options: BatchOptions) -> Self {
        Self { format, options }
    }

    /// Processes all `inputs` on a pool of `workers` threads.
    ///
    /// A failing document is recorded in the report and does not stop the
    /// remaining documents.
    pub fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        let total = inputs.len();
        let work = |(position, input): (usize, &PathBuf)| {
            let result = self.process(input, position + 1, total);
            if let Err(err) = &result {
                error!("Failed to process file '{}': {err}", input.display());
            }
            (input.clone(), result)
        };

        let results: Vec<(PathBuf, Result<DocumentReport>)> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers.max(1))
                .build()
            {
                Ok(pool) => pool.install(|| inputs.par_iter().enumerate().map(work).collect()),
                Err(err) => {
                    warn!("Failed to start worker pool, processing sequentially: {err}");
                    inputs.iter().enumerate().map(work).collect()
                }
            };

        let mut report = BatchReport::default();
        for (input, result) in results {
            report.record(input, result);
        }
        report
    }

    /// Processes a single document.
    ///
    /// The rewritten document is written to a temporary sibling and moved to
    /// its destination only after it was written completely.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination already exists, or if reading,
    /// writing or promoting the document fails.
    pub fn process(&self, input: &Path, position: usize, total: usize) -> Result<DocumentReport> {
        let span = info_span!("document", path = %input.display());
        let _entered = span.enter();
        info!("[{position}|{total}] Processing file '{}'.", input.display());

        let output = output_path(input, self.options.overwrite)?;
        if !self.options.overwrite && output.exists() {
            return Err(BatchError::OutputExists(output).into());
        }

        debug!("Reading global appearances from input file.");
        let prepass = self.format.read_global_appearances(input)?;
        if prepass.is_empty() {
            info!("The file does not contain global appearances. No action required.");
            return Ok(DocumentReport {
                input: input.to_path_buf(),
                output: None,
                status: DocumentStatus::NoGlobalAppearances,
            });
        }
        debug!("Found {} global appearance(s).", prepass.appearances.len());

        let temp = temporary_path(input);
        debug!("Writing temporary output file '{}'.", temp.display());
        let outcome = match self.relocate_into(input, &temp, prepass) {
            Ok(outcome) => outcome,
            Err(err) => {
                discard(&temp);
                return Err(err);
            }
        };

        if let Err(source) = fs::rename(&temp, &output) {
            discard(&temp);
            return Err(BatchError::Replace { path: output, source }.into());
        }
        if self.options.overwrite {
            debug!("Replaced input file with temporary file.");
        } else {
            info!("Writing output to file '{}'.", output.display());
        }

        log_outcome(&outcome);
        Ok(DocumentReport {
            input: input.to_path_buf(),
            output: Some(output),
            status: DocumentStatus::Relocated(outcome),
        })
    }

    fn relocate_into(
        &self,
        input: &Path,
        temp: &Path,
        prepass: GlobalAppearances,
    ) -> Result<RelocationOutcome> {
        debug!("Reading city objects from input file and moving global appearances.");
        let mut stream = self.format.open_feature_stream(input)?;
        let writer = self.format.open_writer(temp)?;
        Pipeline::new(prepass, self.options.target).execute(&mut stream, writer)
    }
}

fn discard(temp: &Path) {
    if temp.exists() {
        if let Err(err) = fs::remove_file(temp) {
            warn!("Failed to remove temporary file '{}': {err}", temp.display());
        }
    }
}

fn log_outcome(outcome: &RelocationOutcome) {
    if outcome.is_complete() {
        info!("Successfully moved all global appearances.");
    } else {
        let dangling = outcome.malformed_references.len();
        warn!(
            "{} global appearance element(s) could not be moved due to implicit geometries.",
            outcome.unclaimed - dangling
        );
        if dangling > 0 {
            warn!("{dangling} global appearance element(s) reference geometry not found in any feature.");
            for reference in &outcome.malformed_references {
                debug!(
                    entry = reference.entry.as_deref().unwrap_or("<anonymous>"),
                    targets = ?reference.targets,
                    "unresolved appearance target"
                );
            }
        }
    }

    let statistic = &outcome.statistic;
    debug!("Processed city objects: {}", statistic.features);
    debug!("Created local appearances: {}", statistic.appearances);
    debug!("Created ParameterizedTexture elements: {}", statistic.parameterized_textures);
    debug!("Created GeoreferencedTexture elements: {}", statistic.georeferenced_textures);
    debug!("Created X3DMaterial elements: {}", statistic.x3d_materials);
}
