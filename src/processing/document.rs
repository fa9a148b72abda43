//! Document structures shared by the matching pipeline

use crate::error::{Result, RankerError};
use crate::processing::text_processor::{extract_candidate_name, TextNormalizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shown when the first non-blank line of a resume is missing
pub const UNKNOWN_CANDIDATE: &str = "Unknown Name";

/// A resume accepted into the working set. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source_path: PathBuf,
    pub display_name: String,
    pub candidate_name: String,
    #[serde(skip_serializing, default)]
    pub raw_text: String,
    #[serde(skip_serializing, default)]
    pub normalized_text: String,
}

impl Document {
    pub fn new(
        source_path: PathBuf,
        display_name: String,
        raw_text: String,
        normalizer: &TextNormalizer,
    ) -> Self {
        let candidate_name = match extract_candidate_name(&raw_text) {
            name if name.is_empty() => UNKNOWN_CANDIDATE.to_string(),
            name => name,
        };
        let normalized_text = normalizer.normalize(&raw_text);

        Self {
            source_path,
            display_name,
            candidate_name,
            raw_text,
            normalized_text,
        }
    }
}

/// A resume the caller asked to rank, before extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeInput {
    pub display_name: String,
    pub path: PathBuf,
}

impl ResumeInput {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
        }
    }

    /// Use the file name as the display name
    pub fn from_path(path: &Path) -> Self {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(display_name, path)
    }
}

/// A resume excluded from ranking because its text could not be extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub display_name: String,
    pub source_path: PathBuf,
    pub reason: String,
}

/// Result of partitioning the supplied resumes into usable documents and failures
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    pub documents: Vec<Document>,
    pub failures: Vec<ExtractionFailure>,
}

impl DocumentBatch {
    pub fn total(&self) -> usize {
        self.documents.len() + self.failures.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub role: String,
    pub description: String,
}

impl JobSpec {
    pub fn new(role: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.role.trim().is_empty() {
            return Err(RankerError::InvalidInput("job role must not be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(RankerError::InvalidInput(
                "job description must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The single query string the matching engine encodes
    pub fn query_text(&self) -> String {
        format!("Job Role: {}\n\n{}", self.role, self.description)
    }
}

/// Banding used when presenting a raw cosine score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    High,
    Good,
    Medium,
    Low,
}

impl MatchTier {
    /// Best tier first
    pub const ALL: [MatchTier; 4] = [MatchTier::High, MatchTier::Good, MatchTier::Medium, MatchTier::Low];

    pub fn from_score(score: f32) -> Self {
        if score >= 0.75 {
            MatchTier::High
        } else if score >= 0.60 {
            MatchTier::Good
        } else if score >= 0.45 {
            MatchTier::Medium
        } else {
            MatchTier::Low
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchTier::High => "High",
            MatchTier::Good => "Good",
            MatchTier::Medium => "Medium",
            MatchTier::Low => "Low",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub document: Document,
    /// Raw cosine similarity in [-1, 1]
    pub score: f32,
}

impl ScoredMatch {
    pub fn percentage(&self) -> f32 {
        self.score * 100.0
    }

    pub fn display_score(&self) -> String {
        format!("{:.1}%", self.percentage())
    }

    pub fn tier(&self) -> MatchTier {
        MatchTier::from_score(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(raw: &str) -> Document {
        Document::new(
            PathBuf::from("resumes/jane.pdf"),
            "jane.pdf".to_string(),
            raw.to_string(),
            &TextNormalizer::new(),
        )
    }

    #[test]
    fn test_document_derives_name_and_normalized_text() {
        let doc = document("\n  J A N E Roe  \nSenior   Engineer\n\nRust, Tokio");

        assert_eq!(doc.candidate_name, "J A N E Roe");
        assert_eq!(doc.normalized_text, "JANE Roe Senior Engineer Rust, Tokio");
        assert_eq!(doc.raw_text, "\n  J A N E Roe  \nSenior   Engineer\n\nRust, Tokio");
    }

    #[test]
    fn test_blank_resume_gets_placeholder_name() {
        let doc = document(" \n\t\n");
        assert_eq!(doc.candidate_name, UNKNOWN_CANDIDATE);
        assert_eq!(doc.normalized_text, "");
    }

    #[test]
    fn test_job_query_text() {
        let job = JobSpec::new("Backend Engineer", "Build services in Rust.");
        assert_eq!(job.query_text(), "Job Role: Backend Engineer\n\nBuild services in Rust.");
    }

    #[test]
    fn test_job_validation() {
        assert!(JobSpec::new("Engineer", "Rust").validate().is_ok());
        assert!(matches!(
            JobSpec::new("  ", "Rust").validate(),
            Err(RankerError::InvalidInput(_))
        ));
        assert!(matches!(
            JobSpec::new("Engineer", "\n").validate(),
            Err(RankerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tiers_and_display_score() {
        let scored = ScoredMatch {
            document: document("Jane"),
            score: 0.5714,
        };
        assert_eq!(scored.display_score(), "57.1%");
        assert_eq!(scored.tier(), MatchTier::Medium);

        assert_eq!(MatchTier::from_score(0.75), MatchTier::High);
        assert_eq!(MatchTier::from_score(0.6), MatchTier::Good);
        assert_eq!(MatchTier::from_score(0.1), MatchTier::Low);
        assert_eq!(MatchTier::from_score(-0.3), MatchTier::Low);
    }

    #[test]
    fn test_input_display_name_from_path() {
        let input = ResumeInput::from_path(Path::new("/data/cvs/John_Smith.pdf"));
        assert_eq!(input.display_name, "John_Smith.pdf");
    }
}
