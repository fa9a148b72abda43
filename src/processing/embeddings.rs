//! Embeddings generation and similarity scoring

use crate::error::{Result, RankerError};
use crate::pipeline::progress::ProgressReporter;
use crate::processing::document::Document;
use anyhow::Context;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// A loaded embedding model.
///
/// Implementations must be deterministic: the same inputs in the same order
/// produce the same vectors.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces
    fn dimension(&self) -> usize;

    /// Encode `texts` in order, one vector per text
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| RankerError::Encoding("model returned no embedding".to_string()))
    }
}

/// Shared handle to a loaded model
pub type ModelHandle = Arc<dyn Embedder>;

/// Model2Vec static embedding model loaded from a local directory
pub struct StaticEmbedder {
    model: StaticModel,
    model_name: String,
    dimension: usize,
}

impl StaticEmbedder {
    pub fn load(model_name: &str, model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();

        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .context("Failed to load model")?;

        let dimension = model.encode_single("test").len();
        if dimension == 0 {
            return Err(RankerError::ModelProvision(format!(
                "Model at {} produced empty embeddings",
                model_path.display()
            )));
        }

        info!("Model loaded successfully in {:.2?} ({} dimensions)", start_time.elapsed(), dimension);

        Ok(Self {
            model,
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl Embedder for StaticEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.encode(texts);
        if embeddings.len() != texts.len() {
            return Err(RankerError::Encoding(format!(
                "expected {} embeddings, model returned {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Cosine similarity between two embeddings. Zero-norm vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RankerError::Encoding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Encodes a job query and a set of resumes, scoring each resume against the query
pub struct MatchingEngine {
    batch_size: usize,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(32)
    }
}

impl MatchingEngine {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Score every document against `job_text`, keeping the input order.
    ///
    /// Reports `0.0..0.9` of `progress`; the last tenth belongs to ranking.
    /// An empty document list returns immediately without touching the model.
    pub fn score(
        &self,
        job_text: &str,
        documents: Vec<Document>,
        model: &dyn Embedder,
        progress: &ProgressReporter,
    ) -> Result<Vec<(Document, f32)>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();

        progress.report(0.0, "Encoding job description...");
        let job_embedding = model.encode(job_text)?;
        check_dimension(&job_embedding, model)?;

        progress.report(0.2, "Encoding resumes...");
        let encoding = progress.sub_range(0.2, 0.7);
        let texts: Vec<String> = documents.iter().map(|d| d.normalized_text.clone()).collect();
        let total_batches = texts.len().div_ceil(self.batch_size);

        let mut resume_embeddings = Vec::with_capacity(texts.len());
        // Static embeddings do not depend on batch composition, so chunking only bounds memory
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            let embeddings = model.encode_batch(batch)?;
            if embeddings.len() != batch.len() {
                return Err(RankerError::Encoding(format!(
                    "batch {} of {}: expected {} embeddings, got {}",
                    i + 1,
                    total_batches,
                    batch.len(),
                    embeddings.len()
                )));
            }
            resume_embeddings.extend(embeddings);

            encoding.report(
                (i + 1) as f32 / total_batches as f32,
                &format!("Encoding resumes (batch {}/{})...", i + 1, total_batches),
            );
        }

        progress.report(0.7, "Computing similarity scores...");
        let mut scored = Vec::with_capacity(documents.len());
        for (document, embedding) in documents.into_iter().zip(resume_embeddings.iter()) {
            check_dimension(embedding, model)?;
            let score = cosine_similarity(&job_embedding, embedding)?;
            scored.push((document, score));
        }

        progress.report(0.9, "Ranking resumes...");
        debug!(
            "Scored {} resumes with {} in {:.2?}",
            scored.len(),
            model.model_name(),
            start_time.elapsed()
        );

        Ok(scored)
    }
}

fn check_dimension(embedding: &[f32], model: &dyn Embedder) -> Result<()> {
    if embedding.len() != model.dimension() {
        return Err(RankerError::Encoding(format!(
            "{} produced a {}-dimensional vector, expected {}",
            model.model_name(),
            embedding.len(),
            model.dimension()
        )));
    }
    Ok(())
}
