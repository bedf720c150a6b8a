//! Shared test fixtures: an in-memory provider that records every call

#![allow(dead_code)]

use async_trait::async_trait;
use llm_manager::{
    ModelError, ModelMetadata, ModelProvider, ModelResult, ModelSource, ModelType,
};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// Provider double with a fixed catalog
pub struct MockProvider {
    source: ModelSource,
    catalog: HashMap<String, Value>,
    order: Vec<String>,
    installed: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
    fail_installs: bool,
    fail_uninstalls: bool,
}

impl MockProvider {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            catalog: HashMap::new(),
            order: Vec::new(),
            installed: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            fail_installs: false,
            fail_uninstalls: false,
        }
    }

    pub fn with_model(mut self, name: &str, description: &str) -> Self {
        self.catalog.insert(
            name.to_string(),
            json!({"name": name, "description": description}),
        );
        self.order.push(name.to_string());
        self
    }

    pub fn with_installed(self, name: &str) -> Self {
        self.installed.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn failing_installs(mut self) -> Self {
        self.fail_installs = true;
        self
    }

    pub fn failing_uninstalls(mut self) -> Self {
        self.fail_uninstalls = true;
        self
    }

    /// Calls received so far, as `op:name`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, name: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", op, name));
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn source(&self) -> ModelSource {
        self.source
    }

    async fn list_models(&self) -> Vec<ModelMetadata> {
        self.record("list", "");
        self.order
            .iter()
            .map(|name| self.model_dict_to_metadata(name, &self.catalog[name]))
            .collect()
    }

    async fn search_models(&self, query: &str) -> Vec<ModelMetadata> {
        self.record("search", query);
        self.list_models()
            .await
            .into_iter()
            .filter(|m| m.matches_query(query))
            .collect()
    }

    async fn fetch_model_info(&self, name: &str) -> ModelResult<Value> {
        self.record("info", name);
        self.catalog
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::NotFound {
                model_id: name.to_string(),
            })
    }

    async fn install_model(&self, name: &str) -> ModelResult<bool> {
        self.record("install", name);
        if self.fail_installs {
            return Err(ModelError::installation(name, "mock install failure"));
        }
        self.installed.lock().unwrap().insert(name.to_string());
        Ok(true)
    }

    async fn uninstall_model(&self, name: &str) -> bool {
        self.record("uninstall", name);
        if self.fail_uninstalls {
            return false;
        }
        self.installed.lock().unwrap().remove(name);
        true
    }

    async fn is_model_installed(&self, name: &str) -> bool {
        self.record("installed", name);
        self.installed.lock().unwrap().contains(name)
    }

    async fn installed_models(&self) -> Vec<String> {
        self.installed.lock().unwrap().iter().cloned().collect()
    }

    fn model_dict_to_metadata(&self, name: &str, raw: &Value) -> ModelMetadata {
        let mut model = ModelMetadata::new(name, self.source)
            .with_model_type(ModelType::Text)
            .with_tags(["mock"]);
        model.description = raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        model
    }
}
