//! Backend resolution
//!
//! Picks the single backend the gateway forwards to. The choice is a pure
//! function of which credentials are present and is made once at startup.

use std::env;
use std::fmt;

use crate::config::ProvidersConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// On-device backend running models on the NPU
    Npu,
    /// Hosted OpenAI-compatible API
    Cloud,
    /// Local default, needs no credential
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Npu => "npu",
            ProviderKind::Cloud => "cloud",
            ProviderKind::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How requests to the backend are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Credentials found in the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub npu_api_key: Option<String>,
    pub cloud_api_key: Option<String>,
}

impl Credentials {
    /// Read the API keys from the variables named in config.
    /// Empty values count as absent.
    pub fn from_env(config: &ProvidersConfig) -> Self {
        Self {
            npu_api_key: read_key(&config.npu.api_key_env),
            cloud_api_key: read_key(&config.cloud.api_key_env),
        }
    }
}

fn read_key(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// The active backend, immutable after startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub base_url: String,
    pub path_prefix: String,
    pub auth: Auth,
    /// Model name reported to clients
    pub model: String,
}

impl ProviderDescriptor {
    /// Resolve the active backend: NPU, then cloud, then the local default.
    pub fn resolve(config: &ProvidersConfig, credentials: &Credentials) -> Self {
        if let Some(key) = &credentials.npu_api_key {
            return Self {
                kind: ProviderKind::Npu,
                base_url: config.npu.base_url.clone(),
                path_prefix: config.npu.path_prefix.clone(),
                auth: Auth::Bearer(key.clone()),
                model: config.npu.model.clone(),
            };
        }

        if let Some(key) = &credentials.cloud_api_key {
            return Self {
                kind: ProviderKind::Cloud,
                base_url: config.cloud.base_url.clone(),
                path_prefix: config.cloud.path_prefix.clone(),
                auth: Auth::Bearer(key.clone()),
                model: config.cloud.model.clone(),
            };
        }

        Self {
            kind: ProviderKind::Local,
            base_url: config.local.base_url.clone(),
            path_prefix: config.local.path_prefix.clone(),
            auth: Auth::None,
            model: config.local.model.clone(),
        }
    }

    /// Build the upstream URL for a subpath and optional raw query string
    pub fn endpoint(&self, subpath: &str, query: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path_prefix.trim_matches('/'),
            subpath.trim_start_matches('/')
        );
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        url
    }
}
