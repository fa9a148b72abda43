//! Input manager for handling different file types

use crate::error::{Result, RankerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::pipeline::progress::ProgressReporter;
use crate::processing::document::{Document, DocumentBatch, ExtractionFailure, ResumeInput};
use crate::processing::text_processor::TextNormalizer;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub struct InputManager {
    cache: HashMap<PathBuf, String>,
    enable_cache: bool,
    normalizer: TextNormalizer,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(path) {
                debug!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        if !path.exists() {
            return Err(RankerError::Extraction {
                path: path.to_path_buf(),
                cause: "file does not exist".to_string(),
            });
        }

        let text = match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(RankerError::Extraction {
                    path: path.to_path_buf(),
                    cause: "unsupported file type".to_string(),
                });
            }
        };

        if self.enable_cache {
            self.cache.insert(path.to_path_buf(), text.clone());
        }

        Ok(text)
    }

    /// Extract and normalize every resume, partitioning them into usable documents
    /// and per-document failures. A failing resume never aborts the batch.
    pub async fn load_documents(
        &mut self,
        inputs: &[ResumeInput],
        progress: &ProgressReporter,
    ) -> DocumentBatch {
        let mut batch = DocumentBatch::default();
        let total = inputs.len();

        progress.report(0.0, &format!("Extracting text (0/{})...", total));

        for (i, input) in inputs.iter().enumerate() {
            match self.extract_text(&input.path).await {
                Ok(raw_text) => {
                    if raw_text.trim().is_empty() {
                        warn!("No text found in {}, ranking it anyway", input.display_name);
                    }
                    batch.documents.push(Document::new(
                        input.path.clone(),
                        input.display_name.clone(),
                        raw_text,
                        &self.normalizer,
                    ));
                }
                Err(e) => {
                    warn!("Could not process {}: {}", input.display_name, e);
                    batch.failures.push(ExtractionFailure {
                        display_name: input.display_name.clone(),
                        source_path: input.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            progress.report(
                (i + 1) as f32 / total as f32,
                &format!("Extracting text ({}/{}): {}", i + 1, total, input.display_name),
            );
        }

        batch
    }
}

/// Expand the given paths into resume inputs.
///
/// Files are kept as given. Directories are expanded one level deep to the files
/// whose extension is in `extensions`, sorted by file name. Repeated paths keep
/// their first occurrence.
pub fn collect_resume_paths(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<ResumeInput>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry_path = entry?.path();
                let supported = entry_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
                    .unwrap_or(false);
                if entry_path.is_file() && supported {
                    entries.push(entry_path);
                }
            }
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            debug!("Found {} resumes in {}", entries.len(), path.display());

            for entry_path in entries {
                if seen.insert(entry_path.clone()) {
                    inputs.push(ResumeInput::from_path(&entry_path));
                }
            }
        } else if seen.insert(path.clone()) {
            inputs.push(ResumeInput::from_path(path));
        }
    }

    Ok(inputs)
}
