//! Configuration management for the support agent.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.support/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers the agent can talk to.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Embedding providers the agent can talk to.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "mock"];

/// Environment variable consulted for the Gemini key when no provider entry names one.
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Number of follow-up suggestions requested per answer.
pub const DEFAULT_FOLLOW_UP_COUNT: usize = 2;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .support/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Knowledge corpus (file or directory), relative paths resolve against the workspace
    pub corpus: PathBuf,

    /// Generation provider (e.g., "gemini", "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider (e.g., "gemini", "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Expected embedding dimensionality, if known
    pub embedding_dimensions: Option<usize>,

    /// API key override for remote providers
    pub api_key: Option<String>,

    /// Retrieval tuning
    pub retrieval: RetrievalConfig,

    /// Number of follow-up suggestions to keep
    pub follow_up_count: usize,

    /// Output token cap for generation
    pub max_output_tokens: u32,

    /// Per-call timeout for embedding and generation requests
    pub request_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,
}

/// Retrieval settings: ranking cutoffs and fan-out limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Maximum number of facts returned
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a fact to be kept
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Maximum in-flight corpus embedding calls
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Fail the request when the corpus cannot be read at all
    #[serde(default)]
    pub strict_corpus: bool,

    /// Reuse sentence embeddings while the corpus document is unchanged
    #[serde(default)]
    pub cache_embeddings: bool,
}

fn default_top_k() -> usize {
    3
}

fn default_min_similarity() -> f32 {
    0.6
}

fn default_max_concurrency() -> usize {
    16
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            max_concurrency: default_max_concurrency(),
            strict_corpus: false,
            cache_embeddings: false,
        }
    }
}

/// Provider configuration block from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
    },
}

impl ProviderConfig {
    /// Generation model named by this provider entry.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model named by this provider entry, if any.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::Gemini {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    corpus: Option<String>,
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalConfig>,
    answer: Option<AnswerSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerSettings {
    follow_up_count: Option<usize>,
    max_output_tokens: Option<u32>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            corpus: PathBuf::from("data/faq.txt"),
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            embedding_provider: "gemini".to_string(),
            embedding_model: "embedding-001".to_string(),
            embedding_dimensions: None,
            api_key: None,
            retrieval: RetrievalConfig::default(),
            follow_up_count: DEFAULT_FOLLOW_UP_COUNT,
            max_output_tokens: 2048,
            request_timeout_secs: 30,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config file and environment variables.
    ///
    /// Environment variables:
    /// - `SUPPORT_WORKSPACE`: Override workspace path
    /// - `SUPPORT_CONFIG`: Path to config file
    /// - `SUPPORT_CORPUS`: Corpus file or directory
    /// - `SUPPORT_PROVIDER` / `SUPPORT_MODEL`: Generation provider and model
    /// - `SUPPORT_EMBEDDING_PROVIDER` / `SUPPORT_EMBEDDING_MODEL`: Embedding provider and model
    /// - `SUPPORT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use support_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `SUPPORT_WORKSPACE` / `SUPPORT_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var_os("SUPPORT_WORKSPACE").map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        let config_file =
            config_file.or_else(|| std::env::var_os("SUPPORT_CONFIG").map(PathBuf::from));
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.support_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(corpus) = std::env::var("SUPPORT_CORPUS") {
            config.corpus = PathBuf::from(corpus);
        }

        if let Ok(provider) = std::env::var("SUPPORT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SUPPORT_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("SUPPORT_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(model) = std::env::var("SUPPORT_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.api_key = std::env::var("SUPPORT_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(corpus) = config_file.corpus {
            result.corpus = PathBuf::from(corpus);
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(answer) = config_file.answer {
            if let Some(count) = answer.follow_up_count {
                result.follow_up_count = count;
            }
            if let Some(tokens) = answer.max_output_tokens {
                result.max_output_tokens = tokens;
            }
            if let Some(secs) = answer.request_timeout_secs {
                result.request_timeout_secs = secs;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            if let Some(embedding_model) = llm
                .providers
                .get(&llm.active_embedding_provider)
                .and_then(|pc| pc.embedding_model())
            {
                result.embedding_model = embedding_model.to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        corpus: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(corpus) = corpus {
            self.corpus = corpus;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .support directory.
    pub fn support_dir(&self) -> PathBuf {
        self.workspace.join(".support")
    }

    /// Resolve the corpus path against the workspace.
    pub fn corpus_path(&self) -> PathBuf {
        if self.corpus.is_absolute() {
            self.corpus.clone()
        } else {
            self.workspace.join(&self.corpus)
        }
    }

    /// Get a provider configuration entry by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Custom endpoint configured for a provider.
    pub fn endpoint_for(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit `SUPPORT_API_KEY`, then the provider entry's
    /// `apiKeyEnv`, then `GEMINI_API_KEY` for the gemini provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env.as_str()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "gemini" => Some(DEFAULT_GEMINI_KEY_ENV),
            None => None,
        };

        env_var.and_then(|name| std::env::var(name).ok())
    }

    /// Validate configuration before any provider is constructed.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.min_similarity) {
            return Err(AppError::Config(format!(
                "retrieval.minSimilarity must be within [-1, 1], got {}",
                self.retrieval.min_similarity
            )));
        }

        if self.retrieval.max_concurrency == 0 {
            return Err(AppError::Config(
                "retrieval.maxConcurrency must be at least 1".to_string(),
            ));
        }

        for provider in [&self.provider, &self.embedding_provider] {
            if provider == "gemini" && self.resolve_api_key(provider).is_none() {
                return Err(AppError::Config(format!(
                    "API key not found for provider '{}'. Set SUPPORT_API_KEY or {}",
                    provider, DEFAULT_GEMINI_KEY_ENV
                )));
            }
        }

        Ok(())
    }
}
