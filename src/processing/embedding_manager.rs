//! Embedding model provisioning: catalog, download and the process-wide handle cache

use crate::error::{Result, RankerError};
use crate::pipeline::progress::ProgressReporter;
use crate::processing::embeddings::{ModelHandle, StaticEmbedder};
use hf_hub::api::tokio::ApiBuilder;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::Mutex;

/// Files a Model2Vec directory must contain to be loadable
pub const REQUIRED_MODEL_FILES: [&str; 3] = ["model.safetensors", "tokenizer.json", "config.json"];

const OPTIONAL_MODEL_FILES: [&str; 1] = ["README.md"];

/// Information about an available embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub model_type: EmbeddingModelType,
    pub dimensions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EmbeddingModelType {
    Model2Vec,
    Potion,
    /// Any other Hugging Face repository, requested by repo id
    Custom,
}

/// A model name resolved to its cache directory name and metadata
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub id: String,
    pub info: EmbeddingModelInfo,
}

/// Known embedding models
pub struct ModelCatalog {
    available_models: HashMap<String, EmbeddingModelInfo>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCatalog {
    pub fn new() -> Self {
        let mut catalog = Self {
            available_models: HashMap::new(),
        };
        catalog.init_available_models();
        catalog
    }

    fn init_available_models(&mut self) {
        // Potion Base 8M (recommended default)
        self.available_models.insert(
            "potion-base-8M".to_string(),
            EmbeddingModelInfo {
                name: "Potion Base 8M".to_string(),
                repo_id: "minishlab/potion-base-8M".to_string(),
                size_mb: 33,
                description: "High-quality Model2Vec embeddings with 8M parameters".to_string(),
                model_type: EmbeddingModelType::Potion,
                dimensions: 256,
            },
        );

        self.available_models.insert(
            "m2v-base".to_string(),
            EmbeddingModelInfo {
                name: "Model2Vec Base".to_string(),
                repo_id: "minishlab/M2V_base_output".to_string(),
                size_mb: 90,
                description: "Legacy Model2Vec base embeddings model".to_string(),
                model_type: EmbeddingModelType::Model2Vec,
                dimensions: 256,
            },
        );

        self.available_models.insert(
            "m2v-large".to_string(),
            EmbeddingModelInfo {
                name: "Model2Vec Large".to_string(),
                repo_id: "minishlab/M2V_large_output".to_string(),
                size_mb: 250,
                description: "High-capacity Model2Vec large embeddings model".to_string(),
                model_type: EmbeddingModelType::Model2Vec,
                dimensions: 512,
            },
        );
    }

    /// Resolve model ID from various formats (repo_id, name, etc.)
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        for (id, info) in &self.available_models {
            if info.repo_id == input {
                return Some(id.clone());
            }
        }

        let input_lower = input.to_lowercase();
        for (id, info) in &self.available_models {
            if info.name.to_lowercase() == input_lower || id.to_lowercase() == input_lower {
                return Some(id.clone());
            }
        }

        None
    }

    /// Resolve a catalog entry, or treat an `owner/name` string as a Hub repository
    pub fn resolve(&self, input: &str) -> Result<ResolvedModel> {
        if let Some(id) = self.resolve_model_id(input) {
            if let Some(info) = self.available_models.get(&id) {
                return Ok(ResolvedModel { id, info: info.clone() });
            }
        }

        let input = input.trim();
        if input.contains('/') && !input.starts_with('/') && !input.contains("..") {
            return Ok(ResolvedModel {
                id: input.replace('/', "--"),
                info: EmbeddingModelInfo {
                    name: input.to_string(),
                    repo_id: input.to_string(),
                    size_mb: 0,
                    description: "Custom Hugging Face model".to_string(),
                    model_type: EmbeddingModelType::Custom,
                    dimensions: 0,
                },
            });
        }

        Err(RankerError::ModelProvision(format!(
            "Unknown embedding model: {}",
            input
        )))
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&EmbeddingModelInfo> {
        self.available_models.get(model_id)
    }

    /// Catalog entries sorted by id
    pub fn list_available_models(&self) -> Vec<(&str, &EmbeddingModelInfo)> {
        let mut models: Vec<_> = self
            .available_models
            .iter()
            .map(|(id, info)| (id.as_str(), info))
            .collect();
        models.sort_by(|a, b| a.0.cmp(b.0));
        models
    }
}

/// Check if a directory contains a loadable embedding model
pub async fn is_valid_embedding_model_directory(path: &Path) -> bool {
    for file in REQUIRED_MODEL_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}

/// Where model files come from and how a model directory becomes a handle
pub trait ModelSource: Send + Sync {
    /// Persist the model files for `info` into `dest`
    fn fetch(
        &self,
        info: &EmbeddingModelInfo,
        dest: &Path,
        progress: &ProgressReporter,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Build a handle from a complete model directory. May block; the registry
    /// calls it on the blocking thread pool.
    fn load(&self, model_id: &str, dir: &Path) -> Result<ModelHandle>;
}

/// Downloads from the Hugging Face Hub and loads Model2Vec static models
#[derive(Debug, Default)]
pub struct HubModelSource;

impl ModelSource for HubModelSource {
    async fn fetch(
        &self,
        info: &EmbeddingModelInfo,
        dest: &Path,
        progress: &ProgressReporter,
    ) -> Result<()> {
        let api = ApiBuilder::new()
            .with_progress(false)
            .build()
            .map_err(|e| RankerError::ModelProvision(format!("Failed to initialize HF API: {}", e)))?;

        info!("Downloading embedding model: {} ({})", info.name, info.repo_id);

        fs::create_dir_all(dest).await.map_err(|e| {
            RankerError::ModelProvision(format!("Failed to create model directory: {}", e))
        })?;

        let repo = api.repo(hf_hub::Repo::model(info.repo_id.clone()));
        let files: Vec<(&str, bool)> = REQUIRED_MODEL_FILES
            .iter()
            .map(|f| (*f, true))
            .chain(OPTIONAL_MODEL_FILES.iter().map(|f| (*f, false)))
            .collect();
        let total = files.len();

        for (i, (file, required)) in files.into_iter().enumerate() {
            match repo.get(file).await {
                Ok(file_path) => {
                    fs::copy(&file_path, dest.join(file)).await.map_err(|e| {
                        RankerError::ModelProvision(format!("Failed to copy {}: {}", file, e))
                    })?;
                    debug!("Downloaded: {}", file);
                }
                Err(e) if !required => {
                    debug!("Optional file {} not found: {}", file, e);
                }
                Err(e) => {
                    return Err(RankerError::ModelProvision(format!(
                        "Failed to download required file {} from {}: {}",
                        file, info.repo_id, e
                    )));
                }
            }
            progress.report(
                (i + 1) as f32 / total as f32,
                &format!("Downloading model files ({}/{})...", i + 1, total),
            );
        }

        Ok(())
    }

    fn load(&self, model_id: &str, dir: &Path) -> Result<ModelHandle> {
        Ok(Arc::new(StaticEmbedder::load(model_id, dir)?))
    }
}

/// Key of the handle cache: one loaded model per name and cache root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub model_id: String,
    pub cache_dir: PathBuf,
}

/// Lazily provisions models and keeps every loaded handle for the life of the process.
///
/// The lock is held for the whole provisioning call, so two callers asking for the
/// same model never download it twice.
pub struct ModelRegistry<S: ModelSource = HubModelSource> {
    source: Arc<S>,
    catalog: ModelCatalog,
    handles: Mutex<HashMap<ModelKey, ModelHandle>>,
}

impl<S: ModelSource + 'static> ModelRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            catalog: ModelCatalog::new(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn model_dir(&self, name: &str, cache_dir: &Path) -> Result<PathBuf> {
        Ok(cache_dir.join(self.catalog.resolve(name)?.id))
    }

    pub async fn is_model_cached(&self, name: &str, cache_dir: &Path) -> Result<bool> {
        let dir = self.model_dir(name, cache_dir)?;
        Ok(is_valid_embedding_model_directory(&dir).await)
    }

    /// Make sure `name` is present under `cache_dir` and loaded.
    ///
    /// Downloads on first use, loads from disk otherwise. Progress runs from 0.0 to
    /// 1.0 on the first call for a key; later calls report completion immediately.
    pub async fn ensure_model(
        &self,
        name: &str,
        cache_dir: &Path,
        progress: &ProgressReporter,
    ) -> Result<ModelHandle> {
        let resolved = self.catalog.resolve(name)?;
        let key = ModelKey {
            model_id: resolved.id.clone(),
            cache_dir: cache_dir.to_path_buf(),
        };

        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(&key) {
            debug!("Reusing loaded model {}", resolved.id);
            progress.report(1.0, "Model ready");
            return Ok(handle.clone());
        }

        let model_dir = cache_dir.join(&resolved.id);
        let handle = if is_valid_embedding_model_directory(&model_dir).await {
            self.load_cached(&resolved, &model_dir, progress).await?
        } else {
            self.download(&resolved, cache_dir, &model_dir, progress).await?
        };

        handles.insert(key, handle.clone());
        Ok(handle)
    }

    async fn load_cached(
        &self,
        resolved: &ResolvedModel,
        model_dir: &Path,
        progress: &ProgressReporter,
    ) -> Result<ModelHandle> {
        progress.report(0.0, "Loading model from disk...");
        let total = REQUIRED_MODEL_FILES.len();
        for (i, file) in REQUIRED_MODEL_FILES.iter().enumerate() {
            progress.report(
                (i + 1) as f32 / total as f32 * 0.5,
                &format!("Loading model components: {}", file),
            );
        }

        let handle = self.load_handle(&resolved.id, model_dir).await?;
        progress.report(1.0, "Model loaded successfully");
        Ok(handle)
    }

    async fn download(
        &self,
        resolved: &ResolvedModel,
        cache_dir: &Path,
        model_dir: &Path,
        progress: &ProgressReporter,
    ) -> Result<ModelHandle> {
        progress.report(0.0, "Downloading model for first use. This may take a few minutes...");

        fs::create_dir_all(cache_dir).await.map_err(|e| {
            RankerError::ModelProvision(format!("Failed to create models directory: {}", e))
        })?;

        let fetched = self
            .source
            .fetch(&resolved.info, model_dir, &progress.sub_range(0.0, 0.9))
            .await;
        if let Err(e) = fetched {
            remove_partial_download(model_dir).await;
            return Err(e);
        }

        if !is_valid_embedding_model_directory(model_dir).await {
            remove_partial_download(model_dir).await;
            return Err(RankerError::ModelProvision(format!(
                "Downloaded model {} is missing required files",
                resolved.info.repo_id
            )));
        }

        let handle = self.load_handle(&resolved.id, model_dir).await?;
        info!("Embedding model {} downloaded successfully", resolved.info.name);
        progress.report(1.0, "Model downloaded successfully");
        Ok(handle)
    }

    /// Reading and parsing model weights is blocking work
    async fn load_handle(&self, model_id: &str, model_dir: &Path) -> Result<ModelHandle> {
        let source = self.source.clone();
        let model_id = model_id.to_string();
        let model_dir = model_dir.to_path_buf();

        tokio::task::spawn_blocking(move || source.load(&model_id, &model_dir))
            .await
            .map_err(|e| RankerError::ModelProvision(format!("model load task failed: {}", e)))?
    }

    /// Delete a cached model directory and forget its loaded handle
    pub async fn remove_model(&self, name: &str, cache_dir: &Path) -> Result<bool> {
        let resolved = self.catalog.resolve(name)?;
        let key = ModelKey {
            model_id: resolved.id.clone(),
            cache_dir: cache_dir.to_path_buf(),
        };

        let mut handles = self.handles.lock().await;
        handles.remove(&key);

        let model_dir = cache_dir.join(&resolved.id);
        if fs::metadata(&model_dir).await.is_err() {
            return Ok(false);
        }
        fs::remove_dir_all(&model_dir).await?;
        Ok(true)
    }

    /// Ids of the models currently present under `cache_dir`
    pub async fn list_cached_models(&self, cache_dir: &Path) -> Result<Vec<String>> {
        let mut cached = Vec::new();
        if fs::metadata(cache_dir).await.is_err() {
            return Ok(cached);
        }

        let mut entries = fs::read_dir(cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && is_valid_embedding_model_directory(&entry.path()).await {
                cached.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        cached.sort();
        Ok(cached)
    }
}

async fn remove_partial_download(model_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(model_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not clean up partial download {}: {}", model_dir.display(), e);
        }
    }
}

/// The registry shared by the whole process
pub fn global_registry() -> Arc<ModelRegistry<HubModelSource>> {
    static REGISTRY: OnceLock<Arc<ModelRegistry<HubModelSource>>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(ModelRegistry::new(HubModelSource)))
        .clone()
}
