//! Ranking report assembled from a finished run

use crate::pipeline::orchestrator::RankingOutcome;
use crate::processing::document::{ExtractionFailure, JobSpec, MatchTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,

    /// Ranked resumes, best match first
    pub entries: Vec<RankedEntry>,

    /// Resumes excluded because their text could not be extracted
    pub failures: Vec<ExtractionFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub ranker_version: String,
    pub job_role: String,
    pub model_name: String,
    pub embedding_dimension: usize,
    pub processing_time_ms: u64,
    pub resumes_submitted: usize,
    pub resumes_ranked: usize,
    pub resumes_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position in the ranking
    pub rank: usize,
    pub candidate_name: String,
    pub display_name: String,
    pub source_path: PathBuf,
    pub score: f32,
    pub percentage: f32,
    pub tier: MatchTier,
}

impl RankedEntry {
    pub fn display_score(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

impl RankingReport {
    pub fn from_outcome(job: &JobSpec, outcome: &RankingOutcome) -> Self {
        let entries: Vec<RankedEntry> = outcome
            .matches
            .iter()
            .enumerate()
            .map(|(index, scored)| RankedEntry {
                rank: index + 1,
                candidate_name: scored.document.candidate_name.clone(),
                display_name: scored.document.display_name.clone(),
                source_path: scored.document.source_path.clone(),
                score: scored.score,
                percentage: scored.percentage(),
                tier: scored.tier(),
            })
            .collect();

        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            ranker_version: env!("CARGO_PKG_VERSION").to_string(),
            job_role: job.role.clone(),
            model_name: outcome.model_name.clone(),
            embedding_dimension: outcome.embedding_dimension,
            processing_time_ms: outcome.processing_time_ms,
            resumes_submitted: entries.len() + outcome.failures.len(),
            resumes_ranked: entries.len(),
            resumes_failed: outcome.failures.len(),
        };

        Self {
            metadata,
            entries,
            failures: outcome.failures.clone(),
        }
    }

    /// Number of pages needed to show every entry; an empty report still has one page
    pub fn total_pages(&self, per_page: usize) -> usize {
        let per_page = per_page.max(1);
        self.entries.len().div_ceil(per_page).max(1)
    }

    /// Entries on a 1-based page. Pages past the end are empty.
    pub fn page(&self, page: usize, per_page: usize) -> &[RankedEntry] {
        let per_page = per_page.max(1);
        let start = page.saturating_sub(1).saturating_mul(per_page);
        if start >= self.entries.len() {
            return &[];
        }
        let end = (start + per_page).min(self.entries.len());
        &self.entries[start..end]
    }

    pub fn count_by_tier(&self, tier: MatchTier) -> usize {
        self.entries.iter().filter(|entry| entry.tier == tier).count()
    }

    /// `"High: 1 | Good: 0 | Medium: 1 | Low: 1"` over the whole ranking
    pub fn tier_summary(&self) -> String {
        MatchTier::ALL
            .iter()
            .map(|tier| format!("{}: {}", tier, self.count_by_tier(*tier)))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
