// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Ollama Backend Adapter
//
// Local inference backend. Supports air-gapped deployments where the only
// model is a local one.

use crate::domain::backend::{BackendError, InferenceBackend, InvocationOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct OllamaBackend {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(name: String, endpoint: String, model: String) -> Self {
        Self {
            name,
            client: reqwest::Client::new(),
            endpoint,
            model,
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe_available(&self) -> bool {
        // Listing models doubles as a liveness probe.
        let url = format!("{}/api/tags", self.endpoint.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn invoke(&self, prompt: &str, options: &InvocationOptions) -> Result<String, BackendError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens.map(|t| t as i32),
            }),
        };

        let url = format!("{}/api/generate", self.endpoint.trim_end_matches('/'));

        let mut builder = self.client.post(&url).json(&request);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| super::classify_request_error(e, options.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Provider(format!("HTTP {}: {}", status, error_text)));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Provider(format!("Failed to parse response: {}", e)))?;

        Ok(ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_omits_absent_options() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "hello".to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: None,
                num_predict: Some(128),
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("num_predict"));
        assert!(!json.contains("temperature"));
    }
}
