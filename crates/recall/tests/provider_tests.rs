//! Integration tests for backend resolution
//!
//! The active backend depends only on which credentials are present:
//! NPU beats cloud, cloud beats the local default.

use recall_server::config::ProvidersConfig;
use recall_server::proxy::{Auth, Credentials, ProviderDescriptor, ProviderKind};

fn credentials(npu: Option<&str>, cloud: Option<&str>) -> Credentials {
    Credentials {
        npu_api_key: npu.map(str::to_string),
        cloud_api_key: cloud.map(str::to_string),
    }
}

// =============================================================================
// Priority
// =============================================================================

#[test]
fn test_npu_credential_selects_npu() {
    let descriptor =
        ProviderDescriptor::resolve(&ProvidersConfig::default(), &credentials(Some("npu"), None));

    assert_eq!(descriptor.kind, ProviderKind::Npu);
    assert_eq!(descriptor.base_url, "http://localhost:3001");
    assert_eq!(descriptor.path_prefix, "/api/v1/openai");
    assert_eq!(descriptor.auth, Auth::Bearer("npu".into()));
    assert_eq!(descriptor.model, "llama3.2:3b");
}

#[test]
fn test_cloud_credential_selects_cloud() {
    let descriptor = ProviderDescriptor::resolve(
        &ProvidersConfig::default(),
        &credentials(None, Some("gsk_cloud")),
    );

    assert_eq!(descriptor.kind, ProviderKind::Cloud);
    assert_eq!(descriptor.base_url, "https://api.groq.com");
    assert_eq!(descriptor.path_prefix, "/openai/v1");
    assert_eq!(descriptor.auth, Auth::Bearer("gsk_cloud".into()));
    assert_eq!(descriptor.model, "llama3-70b-8192");
}

#[test]
fn test_no_credentials_selects_local_default() {
    let descriptor =
        ProviderDescriptor::resolve(&ProvidersConfig::default(), &credentials(None, None));

    assert_eq!(descriptor.kind, ProviderKind::Local);
    assert_eq!(descriptor.auth, Auth::None);
    assert_eq!(
        descriptor.endpoint("chat/completions", None),
        "http://localhost:11434/v1/chat/completions"
    );
}

#[test]
fn test_npu_wins_over_cloud() {
    let descriptor = ProviderDescriptor::resolve(
        &ProvidersConfig::default(),
        &credentials(Some("npu"), Some("cloud")),
    );
    assert_eq!(descriptor.kind, ProviderKind::Npu);
}

#[test]
fn test_resolution_uses_configured_urls() {
    let mut config = ProvidersConfig::default();
    config.cloud.base_url = "https://llm.internal".to_string();

    let descriptor = ProviderDescriptor::resolve(&config, &credentials(None, Some("k")));
    assert_eq!(
        descriptor.endpoint("models", Some("page=2")),
        "https://llm.internal/openai/v1/models?page=2"
    );
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn test_empty_environment_value_counts_as_absent() {
    let mut config = ProvidersConfig::default();
    config.npu.api_key_env = "RECALL_TEST_EMPTY_NPU_KEY".to_string();
    config.cloud.api_key_env = "RECALL_TEST_SET_CLOUD_KEY".to_string();

    // SAFETY: these variable names are only touched by this test
    unsafe {
        std::env::set_var("RECALL_TEST_EMPTY_NPU_KEY", "");
        std::env::set_var("RECALL_TEST_SET_CLOUD_KEY", "gsk_from_env");
    }

    let found = Credentials::from_env(&config);
    assert_eq!(found, credentials(None, Some("gsk_from_env")));
    assert_eq!(
        ProviderDescriptor::resolve(&config, &found).kind,
        ProviderKind::Cloud
    );
}

#[test]
fn test_unset_environment_resolves_local() {
    let mut config = ProvidersConfig::default();
    config.npu.api_key_env = "RECALL_TEST_UNSET_NPU_KEY".to_string();
    config.cloud.api_key_env = "RECALL_TEST_UNSET_CLOUD_KEY".to_string();

    let found = Credentials::from_env(&config);
    assert_eq!(found, Credentials::default());
    assert_eq!(
        ProviderDescriptor::resolve(&config, &found).kind,
        ProviderKind::Local
    );
}
