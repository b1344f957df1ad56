use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{GatewayError, Result};

/// Main configuration structure for Recall
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM backend configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Memory store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Single-shot generation used by the interest summary
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists. Falls back to defaults when no file is found.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".recall").join("config.toml")),
            dirs::config_dir().map(|c| c.join("recall").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {e}")))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:9000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// The single logical user all memories belong to
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Upstream connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum idle time between upstream reads in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            user_id: default_user_id(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:9000".to_string()
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    300
}

/// Backends the gateway can forward to. Exactly one is picked at startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Local default backend (Ollama), always available
    #[serde(default)]
    pub local: LocalBackendConfig,
    /// Cloud backend (Groq), needs an API key
    #[serde(default)]
    pub cloud: CloudBackendConfig,
    /// On-device NPU backend (AnythingLLM), needs an API key
    #[serde(default)]
    pub npu: NpuBackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalBackendConfig {
    #[serde(default = "default_local_base_url")]
    pub base_url: String,
    #[serde(default = "default_local_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_local_model")]
    pub model: String,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_local_base_url(),
            path_prefix: default_local_path_prefix(),
            model: default_local_model(),
        }
    }
}

fn default_local_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_local_path_prefix() -> String {
    "/v1".to_string()
}

fn default_local_model() -> String {
    "llama3.2:3b".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudBackendConfig {
    #[serde(default = "default_cloud_base_url")]
    pub base_url: String,
    #[serde(default = "default_cloud_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_cloud_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_cloud_api_key_env")]
    pub api_key_env: String,
}

impl Default for CloudBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_cloud_base_url(),
            path_prefix: default_cloud_path_prefix(),
            model: default_cloud_model(),
            api_key_env: default_cloud_api_key_env(),
        }
    }
}

fn default_cloud_base_url() -> String {
    "https://api.groq.com".to_string()
}

fn default_cloud_path_prefix() -> String {
    "/openai/v1".to_string()
}

fn default_cloud_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_cloud_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpuBackendConfig {
    #[serde(default = "default_npu_base_url")]
    pub base_url: String,
    #[serde(default = "default_npu_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_npu_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_npu_api_key_env")]
    pub api_key_env: String,
}

impl Default for NpuBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_npu_base_url(),
            path_prefix: default_npu_path_prefix(),
            model: default_npu_model(),
            api_key_env: default_npu_api_key_env(),
        }
    }
}

fn default_npu_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_npu_path_prefix() -> String {
    "/api/v1/openai".to_string()
}

fn default_npu_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_npu_api_key_env() -> String {
    "ANYTHING_LLM_API_KEY".to_string()
}

/// Which memory store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// mem0-compatible REST memory server
    #[default]
    Mem0,
    /// Process-local store, lost on restart
    Memory,
}

/// Memory store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base URL of the memory server
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_store_timeout_secs() -> u64 {
    30
}

/// Generation endpoint configuration for the interest summary
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Ollama base URL
    #[serde(default = "default_generation_url")]
    pub url: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            model: default_generation_model(),
            temperature: 0.0,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generation_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.user_id, "default_user");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.server.read_timeout_secs, 300);
        assert_eq!(config.providers.local.base_url, "http://localhost:11434");
        assert_eq!(config.providers.local.path_prefix, "/v1");
        assert_eq!(config.providers.cloud.path_prefix, "/openai/v1");
        assert_eq!(config.providers.cloud.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.providers.npu.path_prefix, "/api/v1/openai");
        assert_eq!(config.providers.npu.api_key_env, "ANYTHING_LLM_API_KEY");
        assert_eq!(config.store.backend, StoreBackend::Mem0);
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.generation.model, "llama3.2:3b");
        assert_eq!(config.generation.temperature, 0.0);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:9000"
user_id = "alice"

[providers.cloud]
base_url = "https://cloud.example.com"
api_key_env = "MY_CLOUD_KEY"

[providers.npu]
base_url = "http://npu.local:3001"
model = "phi-3.5"

[store]
backend = "memory"
url = "http://mem0.local:8000"

[generation]
url = "http://ollama.local:11434"
model = "qwen2.5:7b"
temperature = 0.1
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.user_id, "alice");
        assert_eq!(config.providers.cloud.base_url, "https://cloud.example.com");
        assert_eq!(config.providers.cloud.api_key_env, "MY_CLOUD_KEY");
        assert_eq!(config.providers.cloud.path_prefix, "/openai/v1");
        assert_eq!(config.providers.npu.base_url, "http://npu.local:3001");
        assert_eq!(config.providers.npu.model, "phi-3.5");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.url, "http://mem0.local:8000");
        assert_eq!(config.generation.model, "qwen2.5:7b");
        assert!((config.generation.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[providers.local]
base_url = "http://gpu-box:11434"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.providers.local.base_url, "http://gpu-box:11434");
        assert_eq!(config.providers.local.path_prefix, "/v1");
        assert_eq!(config.providers.local.model, "llama3.2:3b");
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.store.backend, StoreBackend::Mem0);
    }

    #[test]
    fn test_unknown_store_backend_is_rejected() {
        let toml_str = r#"
[store]
backend = "redis"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nuser_id = \"bob\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.user_id, "bob");
    }

    #[test]
    fn test_load_missing_explicit_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
