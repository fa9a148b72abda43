//! Runs the ranking pipeline off the caller's task and streams its events back

use crate::config::Config;
use crate::error::{Result, RankerError};
use crate::input::manager::InputManager;
use crate::pipeline::progress::ProgressReporter;
use crate::processing::document::{ExtractionFailure, JobSpec, ResumeInput, ScoredMatch};
use crate::processing::embedding_manager::{global_registry, HubModelSource, ModelRegistry, ModelSource};
use crate::processing::embeddings::MatchingEngine;
use crate::processing::ranker::rank;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Progress allocation across the run
const EXTRACTION_RANGE: (f32, f32) = (0.0, 0.1);
const PROVISIONING_RANGE: (f32, f32) = (0.1, 0.5);
const MATCHING_RANGE: (f32, f32) = (0.5, 1.0);

#[derive(Debug, Clone)]
pub struct RankingRequest {
    pub job: JobSpec,
    pub resumes: Vec<ResumeInput>,
    pub model_name: String,
    pub models_dir: PathBuf,
    pub batch_size: usize,
}

impl RankingRequest {
    pub fn from_config(job: JobSpec, resumes: Vec<ResumeInput>, config: &Config) -> Self {
        Self {
            job,
            resumes,
            model_name: config.models.default_embedding_model.clone(),
            models_dir: config.models.models_dir.clone(),
            batch_size: config.processing.batch_size,
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }
}

/// A finished run: the ranking plus the resumes that were left out of it
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub matches: Vec<ScoredMatch>,
    pub failures: Vec<ExtractionFailure>,
    pub model_name: String,
    pub embedding_dimension: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug)]
pub enum PipelineEvent {
    Progress { fraction: f32, message: String },
    Completed(RankingOutcome),
    /// The run was abandoned; displays as a human-readable cause
    Failed(RankerError),
}

/// Receiving end of a spawned run. `Completed` or `Failed` is always the last event.
pub struct PipelineHandle {
    events: mpsc::UnboundedReceiver<PipelineEvent>,
}

impl PipelineHandle {
    /// Next event, or `None` once the run has ended and every event was consumed
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }
}

pub struct RankingPipeline<S: ModelSource = HubModelSource> {
    registry: Arc<ModelRegistry<S>>,
}

impl Default for RankingPipeline<HubModelSource> {
    fn default() -> Self {
        Self::new(global_registry())
    }
}

impl<S: ModelSource + 'static> RankingPipeline<S> {
    pub fn new(registry: Arc<ModelRegistry<S>>) -> Self {
        Self { registry }
    }

    /// Extract, provision, encode, score and rank.
    ///
    /// Resumes whose text cannot be extracted are reported in
    /// [`RankingOutcome::failures`]; every other error abandons the run.
    pub async fn run(&self, request: RankingRequest, progress: &ProgressReporter) -> Result<RankingOutcome> {
        let start_time = Instant::now();

        request.job.validate()?;
        if request.resumes.is_empty() {
            return Err(RankerError::NoValidInput("no resumes were supplied".to_string()));
        }

        progress.report(0.0, "Initializing analysis...");

        let mut input_manager = InputManager::new();
        let batch = input_manager
            .load_documents(&request.resumes, &progress.sub_range(EXTRACTION_RANGE.0, EXTRACTION_RANGE.1))
            .await;

        if batch.documents.is_empty() {
            return Err(RankerError::NoValidInput(format!(
                "none of the {} supplied resumes could be processed",
                batch.failures.len()
            )));
        }
        if !batch.failures.is_empty() {
            warn!(
                "{} of {} resumes could not be processed and were excluded",
                batch.failures.len(),
                batch.total()
            );
        }

        let model = self
            .registry
            .ensure_model(
                &request.model_name,
                &request.models_dir,
                &progress.sub_range(PROVISIONING_RANGE.0, PROVISIONING_RANGE.1),
            )
            .await?;

        let matching = progress.sub_range(MATCHING_RANGE.0, MATCHING_RANGE.1);
        matching.report(0.0, "Processing resumes...");

        let engine = MatchingEngine::new(request.batch_size);
        let query = request.job.query_text();
        let documents = batch.documents;
        let scoring_model = model.clone();
        let scoring_progress = matching.clone();

        // Encoding is CPU-bound
        let scored = tokio::task::spawn_blocking(move || {
            engine.score(&query, documents, scoring_model.as_ref(), &scoring_progress)
        })
        .await
        .map_err(|e| RankerError::Encoding(format!("encoding task failed: {}", e)))??;

        let matches = rank(scored);
        matching.report(1.0, "Ranking complete");

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Ranked {} resumes with {} in {}ms",
            matches.len(),
            model.model_name(),
            processing_time_ms
        );

        Ok(RankingOutcome {
            matches,
            failures: batch.failures,
            model_name: model.model_name().to_string(),
            embedding_dimension: model.dimension(),
            processing_time_ms,
        })
    }

    /// Run on a background task. Progress, then exactly one `Completed` or
    /// `Failed`, arrive on the returned handle in order.
    pub fn spawn(self: Arc<Self>, request: RankingRequest) -> PipelineHandle {
        let (tx, events) = mpsc::unbounded_channel();

        let progress_tx = tx.clone();
        let progress = ProgressReporter::new(move |fraction, message: &str| {
            // a dropped receiver just means nobody is watching anymore
            let _ = progress_tx.send(PipelineEvent::Progress {
                fraction,
                message: message.to_string(),
            });
        });

        tokio::spawn(async move {
            let event = match self.run(request, &progress).await {
                Ok(outcome) => PipelineEvent::Completed(outcome),
                Err(e) => {
                    error!("Ranking run failed: {}", e);
                    PipelineEvent::Failed(e)
                }
            };
            let _ = tx.send(event);
        });

        PipelineHandle { events }
    }
}
