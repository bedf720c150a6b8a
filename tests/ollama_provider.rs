//! Ollama provider tests against a mocked daemon
//!
//! wiremock stands in for the Ollama REST API so the full request/response
//! path, including the streamed pull, is exercised in-process.

use llm_manager::{
    ManagerConfig, ModelError, ModelManager, ModelProvider, ModelSource, ModelStore, ModelType,
    OllamaProvider, config::OllamaConfig,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> OllamaProvider {
    let config = OllamaConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
        install_timeout_secs: 10,
    };
    OllamaProvider::new(&config).expect("Failed to build provider")
}

fn show_body() -> serde_json::Value {
    json!({
        "modelfile": "FROM llama2",
        "parameters": "stop \"[INST]\"",
        "details": {
            "format": "gguf",
            "family": "llama",
            "families": ["llama"],
            "parameter_size": "7B",
            "quantization_level": "Q4_0"
        }
    })
}

async fn mount_show(server: &MockServer, name: &str) {
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .and(body_partial_json(json!({"name": name})))
        .respond_with(ResponseTemplate::new(200).set_body_json(show_body()))
        .mount(server)
        .await;
}

// ============================================================================
// Connectivity and listing
// ============================================================================

#[tokio::test]
async fn test_check_server_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "0.1.0"})))
        .mount(&server)
        .await;

    assert!(provider_for(&server).check_server_running().await);
}

#[tokio::test]
async fn test_check_server_unreachable() {
    let config = OllamaConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 1,
        install_timeout_secs: 1,
    };
    let provider = OllamaProvider::new(&config).unwrap();
    assert!(!provider.check_server_running().await);
}

#[tokio::test]
async fn test_list_models_enriches_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llama2:7b", "size": 3_826_793_677u64, "digest": "sha256:78e26419b446"},
                {"name": "nomic-embed-text:latest", "size": 274_302_450u64}
            ]
        })))
        .mount(&server)
        .await;
    mount_show(&server, "llama2:7b").await;
    // No show details for the embedding model; the tag entry alone is used

    let models = provider_for(&server).list_models().await;
    assert_eq!(models.len(), 2);

    let llama = &models[0];
    assert_eq!(llama.id, "llama2:7b");
    assert_eq!(llama.source, ModelSource::Ollama);
    assert_eq!(llama.size, Some(3_826_793_677));
    assert_eq!(llama.parameters, Some(7_000_000_000));
    assert!(llama.tags.contains("llama"));

    let embed = &models[1];
    assert_eq!(embed.model_type, ModelType::Embedding);
    assert!(embed.parameters.is_none());
}

#[tokio::test]
async fn test_list_models_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(provider.list_models().await.is_empty());
    assert!(provider.search_models("llama").await.is_empty());
}

async fn mount_pull_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"success\"}\n"))
        .mount(server)
        .await;
}

/// Responds to every endpoint, but slower than a one second timeout
async fn slow_server() -> (MockServer, OllamaProvider) {
    let server = MockServer::start().await;
    let slow = ResponseTemplate::new(200)
        .set_body_json(json!({"models": [{"name": "llama2:7b"}]}))
        .set_delay(Duration::from_secs(3));
    Mock::given(wiremock::matchers::any())
        .respond_with(slow)
        .mount(&server)
        .await;

    let config = OllamaConfig {
        base_url: server.uri(),
        request_timeout_secs: 1,
        install_timeout_secs: 1,
    };
    let provider = OllamaProvider::new(&config).unwrap();
    (server, provider)
}

#[tokio::test]
async fn test_list_timeout_degrades_to_empty() {
    let (_server, provider) = slow_server().await;
    assert!(provider.list_models().await.is_empty());
}

#[tokio::test]
async fn test_fetch_timeout_is_provider_error() {
    let (_server, provider) = slow_server().await;

    let err = provider.fetch_model_info("llama2:7b").await.unwrap_err();
    assert!(matches!(err, ModelError::Provider { .. }), "{:?}", err);
    assert!(err.to_string().starts_with("Failed to fetch model info for llama2:7b"));
}

#[tokio::test]
async fn test_install_timeout_is_installation_error() {
    let (_server, provider) = slow_server().await;

    let err = provider.install_model("llama2:7b").await.unwrap_err();
    assert!(matches!(err, ModelError::Installation { .. }), "{:?}", err);
    assert!(!provider.is_model_installed("llama2:7b").await);
}

#[tokio::test]
async fn test_search_filters_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama2:7b"}, {"name": "mistral:latest"}]
        })))
        .mount(&server)
        .await;

    let results = provider_for(&server).search_models("MISTRAL").await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "mistral:latest");
}

// ============================================================================
// Model info
// ============================================================================

#[tokio::test]
async fn test_fetch_model_info() {
    let server = MockServer::start().await;
    mount_show(&server, "llama2:7b").await;

    let provider = provider_for(&server);
    let info = provider.fetch_model_info("llama2:7b").await.unwrap();
    assert_eq!(info["details"]["family"], "llama");

    let model = provider.get_model("llama2:7b").await.unwrap().unwrap();
    assert_eq!(model.config["quantization_level"], "Q4_0");
}

#[tokio::test]
async fn test_fetch_model_info_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model 'nope' not found"})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.fetch_model_info("nope").await.unwrap_err();
    assert!(matches!(err, ModelError::NotFound { .. }));
    assert!(provider.get_model("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_model_info_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .fetch_model_info("llama2:7b")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to fetch model info"));
}

// ============================================================================
// Install / uninstall
// ============================================================================

#[tokio::test]
async fn test_install_success_records_model() {
    let server = MockServer::start().await;
    let progress = concat!(
        "{\"status\":\"pulling manifest\"}\n",
        "{\"status\":\"downloading\",\"completed\":512,\"total\":1024}\n",
        "{\"status\":\"success\"}\n"
    );
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({"name": "llama2:7b"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(progress))
        .expect(1)
        .mount(&server)
        .await;
    mount_show(&server, "llama2:7b").await;

    let store_dir = TempDir::new().unwrap();
    let store = ModelStore::new(store_dir.path());
    let provider = provider_for(&server).with_store(store.clone());

    assert!(provider.install_model("llama2:7b").await.unwrap());
    assert!(provider.is_model_installed("llama2:7b").await);
    assert_eq!(provider.installed_models().await, vec!["llama2:7b"]);

    let saved = store.load_model_metadata("ollama/llama2:7b").unwrap();
    assert_eq!(saved["details"]["parameter_size"], "7B");
    assert_eq!(saved["name"], "llama2:7b");
}

#[tokio::test]
async fn test_install_stream_error_leaves_cache_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"status\":\"pulling manifest\"}\n{\"error\":\"pull model manifest: file does not exist\"}\n",
        ))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let before = provider.installed_models().await;

    let err = provider.install_model("nope:latest").await.unwrap_err();
    assert!(matches!(err, ModelError::Installation { .. }));
    assert!(err.to_string().contains("file does not exist"));
    assert_eq!(provider.installed_models().await, before);
}

#[tokio::test]
async fn test_install_http_error_leaves_cache_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(provider.install_model("llama2:7b").await.is_err());
    assert!(!provider.is_model_installed("llama2:7b").await);
}

#[tokio::test]
async fn test_uninstall_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"success\"}\n"))
        .mount(&server)
        .await;
    mount_show(&server, "llama2:7b").await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete"))
        .and(body_partial_json(json!({"name": "llama2:7b"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store_dir = TempDir::new().unwrap();
    let store = ModelStore::new(store_dir.path());
    let provider = provider_for(&server).with_store(store.clone());
    provider.install_model("llama2:7b").await.unwrap();
    assert!(store.is_model_installed("ollama/llama2:7b"));

    assert!(provider.uninstall_model("llama2:7b").await);
    assert!(!provider.is_model_installed("llama2:7b").await);
    assert!(!store.is_model_installed("ollama/llama2:7b"));
}

#[tokio::test]
async fn test_uninstall_failure_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"success\"}\n"))
        .mount(&server)
        .await;
    mount_show(&server, "llama2:7b").await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.install_model("llama2:7b").await.unwrap();

    assert!(!provider.uninstall_model("llama2:7b").await);
    assert!(provider.is_model_installed("llama2:7b").await);
}

// ============================================================================
// Persistence across restarts
// ============================================================================

#[tokio::test]
async fn test_installed_models_survive_restart() {
    let server = MockServer::start().await;
    mount_pull_success(&server).await;
    mount_show(&server, "llama2:7b").await;

    let store_dir = TempDir::new().unwrap();
    let store = ModelStore::new(store_dir.path());
    provider_for(&server)
        .with_store(store.clone())
        .install_model("llama2:7b")
        .await
        .unwrap();

    let restarted = provider_for(&server).with_store(store);
    assert!(restarted.is_model_installed("llama2:7b").await);
    assert_eq!(restarted.installed_models().await, vec!["llama2:7b"]);
}

#[tokio::test]
async fn test_default_model_accepted_after_restart() {
    let server = MockServer::start().await;
    mount_pull_success(&server).await;
    mount_show(&server, "llama2:7b").await;

    let store_dir = TempDir::new().unwrap();
    let hub_cache = TempDir::new().unwrap();
    let mut config = ManagerConfig {
        models_dir: store_dir.path().to_path_buf(),
        ..Default::default()
    };
    config.ollama.base_url = server.uri();
    config.huggingface.cache_dir = Some(hub_cache.path().to_path_buf());

    ModelManager::from_config(&config)
        .unwrap()
        .install_model("ollama/llama2:7b")
        .await
        .unwrap();

    let manager = ModelManager::from_config(&config).unwrap();
    manager.set_default_model("ollama/llama2:7b").await.unwrap();
    assert_eq!(
        manager.get_default_model().await.as_deref(),
        Some("ollama/llama2:7b")
    );
}

#[tokio::test]
async fn test_uninstall_is_not_restored() {
    let server = MockServer::start().await;
    mount_pull_success(&server).await;
    mount_show(&server, "llama2:7b").await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store_dir = TempDir::new().unwrap();
    let store = ModelStore::new(store_dir.path());
    let provider = provider_for(&server).with_store(store.clone());
    provider.install_model("llama2:7b").await.unwrap();
    assert!(provider.uninstall_model("llama2:7b").await);

    let restarted = provider_for(&server).with_store(store);
    assert!(!restarted.is_model_installed("llama2:7b").await);
}

#[tokio::test]
async fn test_list_falls_back_to_install_time_details() {
    let server = MockServer::start().await;
    mount_pull_success(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(show_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama2:7b", "size": 3_826_793_677u64}]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.install_model("llama2:7b").await.unwrap();

    // `/api/show` is gone now; the listing still carries the details
    let models = provider.list_models().await;
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].parameters, Some(7_000_000_000));
    assert_eq!(models[0].size, Some(3_826_793_677));
}
