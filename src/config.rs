//! Layered configuration for the assistant.
//!
//! Sources, lowest to highest precedence:
//! - Default values
//! - TOML configuration file (`.secondbrain/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SB_` and use double underscores
//! to separate nested levels:
//! - `SB_STORE__TOP_K=5` sets `store.top_k`
//! - `SB_LLM__MODEL=gemini-2.5-flash` sets `llm.model`
//! - `SB_GUARD__FORWARD_MASKED=true` sets `guard.forward_masked`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::documents::ChunkingConfig;

/// Directory holding settings and local state.
pub const WORKSPACE_DIR: &str = ".secondbrain";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SB_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .secondbrain is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorpusConfig {
    /// A PDF file or a directory searched for PDFs
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// fastembed model name, or `hashing` for the offline embedder
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where model weights are cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Vector size used by the hashing embedder
    #[serde(default = "default_hashing_dimension")]
    pub hashing_dimension: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Directory holding collection files
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Name of the active collection
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Chunks concatenated into the retrieved context
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    /// Conversation log file
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    /// Maximum working-memory items
    #[serde(default = "default_memory_capacity")]
    pub capacity: usize,

    /// Append rendered memory context to model prompts
    #[serde(default)]
    pub inject_context: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GuardConfig {
    /// Entity kinds the guard detects
    #[serde(default = "default_guard_entities")]
    pub entities: Vec<String>,

    /// Send masked input to the model instead of refusing
    #[serde(default)]
    pub forward_masked: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Instructions template; the bundled template is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PdfConfig {
    /// Directory containing libpdfium; the system library is used otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `orchestrator = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("docs")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_hashing_dimension() -> usize {
    384
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".secondbrain/vectors")
}
fn default_collection() -> String {
    "knowledge-docs".to_string()
}
fn default_top_k() -> usize {
    3
}
fn default_memory_path() -> PathBuf {
    PathBuf::from(".secondbrain/conversations.json")
}
fn default_memory_capacity() -> usize {
    10
}
fn default_guard_entities() -> Vec<String> {
    vec!["EMAIL_ADDRESS".to_string(), "PHONE_NUMBER".to_string()]
}
fn default_llm_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            corpus: CorpusConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            memory: MemoryConfig::default(),
            guard: GuardConfig::default(),
            llm: LlmConfig::default(),
            pdf: PdfConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            hashing_dimension: default_hashing_dimension(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
            top_k: default_top_k(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            capacity: default_memory_capacity(),
            inject_context: false,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            entities: default_guard_entities(),
            forward_masked: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            base_url: default_llm_base_url(),
            temperature: None,
            instructions_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nesting; single underscores stay in field names
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
    }

    /// Find `.secondbrain/settings.toml` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(WORKSPACE_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .secondbrain is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(WORKSPACE_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Check the values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), String> {
        self.chunking.validate()?;
        if self.store.top_k == 0 {
            return Err("store.top_k must be at least 1".to_string());
        }
        if self.memory.capacity == 0 {
            return Err("memory.capacity must be at least 1".to_string());
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(WORKSPACE_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
