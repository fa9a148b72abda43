//! Integration tests for the resume ranker

use resume_ranker::error::{RankerError, Result};
use resume_ranker::input::{collect_resume_paths, InputManager};
use resume_ranker::output::formatter::{PageRequest, ReportGenerator};
use resume_ranker::output::RankingReport;
use resume_ranker::config::OutputFormat;
use resume_ranker::pipeline::{PipelineEvent, PipelineHandle, ProgressReporter, RankingPipeline, RankingRequest};
use resume_ranker::processing::document::{JobSpec, ResumeInput};
use resume_ranker::processing::embedding_manager::{
    EmbeddingModelInfo, ModelRegistry, ModelSource, REQUIRED_MODEL_FILES,
};
use resume_ranker::processing::embeddings::{Embedder, ModelHandle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Bag-of-words embedder: texts sharing words point the same way
struct WordBucketEmbedder;

impl Embedder for WordBucketEmbedder {
    fn model_name(&self) -> &str {
        "word-buckets"
    }

    fn dimension(&self) -> usize {
        128
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0; 128];
                for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2) {
                    let bucket = word
                        .to_lowercase()
                        .bytes()
                        .fold(17usize, |acc, b| acc.wrapping_mul(131).wrapping_add(b as usize));
                    vector[bucket % 128] += 1.0;
                }
                vector
            })
            .collect())
    }
}

/// Writes placeholder model files instead of talking to the Hub
#[derive(Default)]
struct OfflineSource {
    downloads: AtomicUsize,
    unreachable: bool,
}

impl ModelSource for OfflineSource {
    async fn fetch(&self, _info: &EmbeddingModelInfo, dest: &Path, progress: &ProgressReporter) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(RankerError::ModelProvision("network unreachable".to_string()));
        }
        tokio::fs::create_dir_all(dest).await?;
        for (i, file) in REQUIRED_MODEL_FILES.iter().enumerate() {
            tokio::fs::write(dest.join(file), b"placeholder").await?;
            progress.report((i + 1) as f32 / REQUIRED_MODEL_FILES.len() as f32, file);
        }
        Ok(())
    }

    fn load(&self, _model_id: &str, _dir: &Path) -> Result<ModelHandle> {
        Ok(Arc::new(WordBucketEmbedder))
    }
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn web_job() -> JobSpec {
    JobSpec::new(
        "Frontend Engineer",
        "We need a software engineer to build React dashboards and Node.js APIs in TypeScript.",
    )
}

fn request(models_dir: &Path, resumes: Vec<ResumeInput>) -> RankingRequest {
    RankingRequest {
        job: web_job(),
        resumes,
        model_name: "potion-base-8M".to_string(),
        models_dir: models_dir.to_path_buf(),
        batch_size: 2,
    }
}

async fn collect_events(mut handle: PipelineHandle) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    events
}

fn progress_fractions(events: &[PipelineEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_resume.txt")).await.unwrap();

    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("Node.js"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_resume.md")).await.unwrap();

    assert!(text.contains("John Doe"));
    assert!(text.contains("React"));
    assert!(text.contains("JavaScript & TypeScript"));
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();

    let unsupported = manager.extract_text(&fixture("unsupported.xyz")).await;
    assert!(matches!(unsupported, Err(RankerError::Extraction { .. })));

    let missing = manager.extract_text(&fixture("nonexistent.txt")).await;
    assert!(matches!(missing, Err(RankerError::Extraction { .. })));
}

#[test]
fn test_fixture_directory_expansion_skips_unsupported() {
    let extensions = vec!["pdf".to_string(), "txt".to_string(), "md".to_string()];
    let inputs = collect_resume_paths(&[fixture("")], &extensions).unwrap();
    let names: Vec<_> = inputs.iter().map(|i| i.display_name.as_str()).collect();

    assert_eq!(
        names,
        vec!["data_resume.txt", "pastry_resume.md", "sample_resume.md", "sample_resume.txt"]
    );
}

#[tokio::test]
async fn test_partial_failures_are_reported_and_the_rest_ranked() {
    let models = TempDir::new().unwrap();
    let source = OfflineSource::default();
    let pipeline = Arc::new(RankingPipeline::new(Arc::new(ModelRegistry::new(source))));

    let resumes = vec![
        ResumeInput::from_path(&fixture("pastry_resume.md")),
        ResumeInput::from_path(&fixture("unsupported.xyz")),
        ResumeInput::from_path(&fixture("sample_resume.txt")),
        ResumeInput::from_path(&fixture("missing_resume.pdf")),
        ResumeInput::from_path(&fixture("data_resume.txt")),
    ];

    let events = collect_events(pipeline.spawn(request(models.path(), resumes))).await;

    let fractions = progress_fractions(&events);
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));

    let outcome = match events.last() {
        Some(PipelineEvent::Completed(outcome)) => outcome,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(outcome.matches.len(), 3);
    assert_eq!(outcome.matches[0].document.candidate_name, "John Doe");
    assert!(outcome.matches.windows(2).all(|w| w[0].score >= w[1].score));

    let failed: Vec<_> = outcome.failures.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(failed, vec!["unsupported.xyz", "missing_resume.pdf"]);

    let maria = outcome
        .matches
        .iter()
        .find(|m| m.document.display_name == "data_resume.txt")
        .unwrap();
    assert_eq!(maria.document.candidate_name, "M A R I A   G A R C I A");
    assert!(maria.document.normalized_text.starts_with("MARIA GARCIA Data Engineer"));
}

#[tokio::test]
async fn test_all_resumes_failing_never_completes() {
    let models = TempDir::new().unwrap();
    let registry = Arc::new(ModelRegistry::new(OfflineSource::default()));
    let pipeline = Arc::new(RankingPipeline::new(registry.clone()));

    let resumes = vec![
        ResumeInput::from_path(&fixture("unsupported.xyz")),
        ResumeInput::from_path(&fixture("missing_resume.pdf")),
    ];

    let events = collect_events(pipeline.spawn(request(models.path(), resumes))).await;

    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Completed(_))));
    assert!(progress_fractions(&events).iter().all(|f| *f < 1.0));
    match events.last() {
        Some(PipelineEvent::Failed(err)) => assert!(matches!(err, RankerError::NoValidInput(_))),
        other => panic!("expected failure, got {:?}", other),
    }

    // The model is not provisioned when nothing could be extracted
    assert!(!registry.is_model_cached("potion-base-8M", models.path()).await.unwrap());
}

#[tokio::test]
async fn test_model_is_downloaded_once_per_process() {
    let models = TempDir::new().unwrap();
    let registry = Arc::new(ModelRegistry::new(OfflineSource::default()));
    let pipeline = Arc::new(RankingPipeline::new(registry.clone()));

    for _ in 0..2 {
        let resumes = vec![ResumeInput::from_path(&fixture("sample_resume.txt"))];
        let outcome = pipeline
            .run(request(models.path(), resumes), &ProgressReporter::silent())
            .await
            .unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.model_name, "word-buckets");
    }

    assert!(registry.is_model_cached("potion-base-8M", models.path()).await.unwrap());
    assert_eq!(
        registry.list_cached_models(models.path()).await.unwrap(),
        vec!["potion-base-8M".to_string()]
    );
}

#[tokio::test]
async fn test_unreachable_hub_fails_the_run_and_leaves_no_partial_model() {
    let models = TempDir::new().unwrap();
    let source = OfflineSource {
        unreachable: true,
        ..Default::default()
    };
    let registry = Arc::new(ModelRegistry::new(source));
    let pipeline = RankingPipeline::new(registry.clone());

    let resumes = vec![ResumeInput::from_path(&fixture("sample_resume.txt"))];
    let err = pipeline
        .run(request(models.path(), resumes), &ProgressReporter::silent())
        .await
        .unwrap_err();

    assert!(matches!(err, RankerError::ModelProvision(_)));
    assert!(!models.path().join("potion-base-8M").exists());
}

#[tokio::test]
async fn test_report_rendering_from_a_real_run() {
    let models = TempDir::new().unwrap();
    let pipeline = RankingPipeline::new(Arc::new(ModelRegistry::new(OfflineSource::default())));

    let resumes = vec![
        ResumeInput::from_path(&fixture("pastry_resume.md")),
        ResumeInput::from_path(&fixture("sample_resume.md")),
    ];
    let outcome = pipeline
        .run(request(models.path(), resumes), &ProgressReporter::silent())
        .await
        .unwrap();

    let report = RankingReport::from_outcome(&web_job(), &outcome);
    assert_eq!(report.entries[0].display_name, "sample_resume.md");
    assert_eq!(report.entries[1].candidate_name, "Pierre Martin");

    let generator = ReportGenerator::with_options(false, true, true);
    let markdown = generator
        .generate_report(&report, OutputFormat::Markdown, PageRequest::default())
        .unwrap();
    assert!(markdown.contains("# Resume Ranking: Frontend Engineer"));
    assert!(markdown.contains("| 1 | John Doe | `sample_resume.md` |"));

    let json = generator
        .generate_report(&report, OutputFormat::Json, PageRequest::default())
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["metadata"]["resumes_ranked"], 2);
}
