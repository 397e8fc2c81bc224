//! Pipeline execution implementation.

use super::config::AnalysisConfig;
use super::run::{RunRecorder, SharedRunState};
use crate::core::exact::{detect_exact, Blake3Hasher, ContentHasher};
use crate::core::group::{DuplicateGroup, GroupKind};
use crate::core::near::{detect_near, FeatureExtractor, GradientFeatureExtractor};
use crate::core::quality::{score_and_rank, LaplacianSharpnessScorer, SharpnessScorer};
use crate::core::source::{ContentReader, FileContentReader, ImageRef};
use crate::core::stage::{CancellationToken, StageRunner};
use crate::error::{AnalysisError, StageError};
use crate::events::{null_sender, RunPhase, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The injected capabilities every stage draws on
#[derive(Clone)]
pub struct Capabilities {
    pub reader: Arc<dyn ContentReader>,
    pub hasher: Arc<dyn ContentHasher>,
    pub extractor: Arc<dyn FeatureExtractor>,
    pub scorer: Arc<dyn SharpnessScorer>,
}

impl Default for Capabilities {
    /// Filesystem reader, BLAKE3, gradient prints and Laplacian sharpness
    fn default() -> Self {
        Self {
            reader: Arc::new(FileContentReader::default()),
            hasher: Arc::new(Blake3Hasher),
            extractor: Arc::new(GradientFeatureExtractor::default()),
            scorer: Arc::new(LaplacianSharpnessScorer::default()),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// All three stages ran; groups are ordered Exact first, then Near
    Completed {
        groups: Vec<DuplicateGroup>,
        summary: RunSummary,
    },
    /// Cancellation was observed; nothing was published
    Cancelled,
}

impl RunOutcome {
    pub fn groups(&self) -> Option<&[DuplicateGroup]> {
        match self {
            RunOutcome::Completed { groups, .. } => Some(groups),
            RunOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }
}

/// Builder for a pipeline
pub struct PipelineBuilder {
    config: AnalysisConfig,
    capabilities: Capabilities,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            capabilities: Capabilities::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the near-duplicate distance threshold
    pub fn distance_threshold(mut self, threshold: f64) -> Self {
        self.config.distance_threshold = threshold;
        self
    }

    /// Set the number of workers per stage
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.stage_concurrency = concurrency;
        self
    }

    /// Set how many completions pass between cancellation checks
    pub fn check_interval(mut self, interval: usize) -> Self {
        self.config.cancellation_check_interval = interval;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn reader(mut self, reader: impl ContentReader + 'static) -> Self {
        self.capabilities.reader = Arc::new(reader);
        self
    }

    pub fn hasher(mut self, hasher: impl ContentHasher + 'static) -> Self {
        self.capabilities.hasher = Arc::new(hasher);
        self
    }

    pub fn extractor(mut self, extractor: impl FeatureExtractor + 'static) -> Self {
        self.capabilities.extractor = Arc::new(extractor);
        self
    }

    pub fn scorer(mut self, scorer: impl SharpnessScorer + 'static) -> Self {
        self.capabilities.scorer = Arc::new(scorer);
        self
    }

    /// Build the pipeline, rejecting invalid configuration
    pub fn build(self) -> Result<Pipeline, AnalysisError> {
        Pipeline::new(self.config, self.capabilities)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The three-stage duplicate analysis
#[derive(Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    capabilities: Capabilities,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(config: AnalysisConfig, capabilities: Capabilities) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            capabilities,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run to completion on the calling thread without events
    pub fn analyze(&self, refs: &[ImageRef]) -> Result<RunOutcome, AnalysisError> {
        let state = SharedRunState::new(Uuid::new_v4());
        let mut recorder = RunRecorder::new(state, null_sender(), self.config.progress_slices);
        self.run(refs, &CancellationToken::new(), &mut recorder)
    }

    /// Run all stages, reporting every state change through `recorder`.
    ///
    /// Cancellation is not an error: it yields [`RunOutcome::Cancelled`].
    /// Only a failure to set up a stage's workers is returned as `Err`,
    /// and the recorder is moved to the terminal phase in that case too.
    pub fn run(
        &self,
        refs: &[ImageRef],
        cancel: &CancellationToken,
        recorder: &mut RunRecorder,
    ) -> Result<RunOutcome, AnalysisError> {
        let start_time = Instant::now();
        recorder.started(refs.len());

        if refs.is_empty() {
            let summary = RunSummary {
                duration_ms: start_time.elapsed().as_millis() as u64,
                ..RunSummary::default()
            };
            recorder.complete(Vec::new(), summary.clone(), "No photos to analyze".to_string());
            return Ok(RunOutcome::Completed {
                groups: Vec::new(),
                summary,
            });
        }

        match self.execute(refs, cancel, recorder, start_time) {
            Ok((groups, summary)) => {
                let message = match groups.len() {
                    0 => "No duplicates found".to_string(),
                    1 => "Found 1 duplicate group".to_string(),
                    n => format!("Found {} duplicate groups", n),
                };
                recorder.complete(groups.clone(), summary.clone(), message);
                Ok(RunOutcome::Completed { groups, summary })
            }
            Err(StageError::Cancelled) => {
                recorder.cancelled();
                Ok(RunOutcome::Cancelled)
            }
            Err(error) => {
                recorder.failed(&error.to_string());
                Err(error.into())
            }
        }
    }

    fn execute(
        &self,
        refs: &[ImageRef],
        cancel: &CancellationToken,
        recorder: &mut RunRecorder,
        start_time: Instant,
    ) -> Result<(Vec<DuplicateGroup>, RunSummary), StageError> {
        let runner = StageRunner::new(
            self.config.stage_concurrency,
            self.config.cancellation_check_interval,
        )?;
        let caps = &self.capabilities;

        // Stage 1: exact duplicates
        checkpoint(cancel)?;
        let total = refs.len();
        recorder.enter_phase(RunPhase::Hashing, format!("Hashing {} photos", total));

        let buckets = detect_exact(
            refs,
            caps.reader.as_ref(),
            caps.hasher.as_ref(),
            &runner,
            cancel,
            |done| recorder.item_done(RunPhase::Hashing, done, total),
        )?;
        recorder.skipped(RunPhase::Hashing, buckets.skipped());

        let mut groups: Vec<DuplicateGroup> = buckets
            .duplicate_buckets()
            .filter_map(|bucket| DuplicateGroup::new(GroupKind::Exact, bucket.members.clone()))
            .collect();
        for group in &groups {
            recorder.group_found(group);
        }
        let exact_groups = groups.len();

        // Stage 2: near duplicates among one representative per bucket
        checkpoint(cancel)?;
        let representatives = buckets.representatives();
        let distinct = representatives.len();
        recorder.enter_phase(
            RunPhase::Clustering,
            format!("Comparing {} distinct photos", distinct),
        );

        let near = detect_near(
            &representatives,
            caps.reader.as_ref(),
            caps.extractor.as_ref(),
            self.config.distance_threshold,
            &runner,
            cancel,
            |done| recorder.item_done(RunPhase::Clustering, done, distinct),
        )?;
        recorder.skipped(RunPhase::Clustering, &near.skipped);

        for members in near.groups {
            let Some(group) = DuplicateGroup::new(GroupKind::Near, members) else {
                continue;
            };
            recorder.group_found(&group);
            groups.push(group);
        }
        let near_groups = groups.len() - exact_groups;

        // Stage 3: pick the sharpest member of every group
        checkpoint(cancel)?;
        let members: usize = groups.iter().map(|g| g.members().len()).sum();
        recorder.enter_phase(
            RunPhase::Scoring,
            format!("Scoring {} photos in {} groups", members, groups.len()),
        );

        let ranked = score_and_rank(
            groups,
            caps.reader.as_ref(),
            caps.scorer.as_ref(),
            &runner,
            cancel,
            |done| recorder.item_done(RunPhase::Scoring, done, members),
        )?;
        recorder.skipped(RunPhase::Scoring, &ranked.skipped);
        checkpoint(cancel)?;

        let summary = RunSummary {
            total_items: total,
            exact_groups,
            near_groups,
            duplicate_count: ranked.groups.iter().map(|g| g.duplicate_count()).sum(),
            skipped_items: buckets.skipped().len() + near.skipped.len() + ranked.skipped.len(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        Ok((ranked.groups, summary))
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), StageError> {
    if cancel.is_cancelled() {
        Err(StageError::Cancelled)
    } else {
        Ok(())
    }
}
