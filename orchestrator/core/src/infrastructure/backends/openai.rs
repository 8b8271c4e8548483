// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// OpenAI-Compatible Backend Adapter
//
// Remote managed inference backend. Also works with OpenAI-compatible
// servers (LM Studio, vLLM, etc.).

use crate::domain::backend::{BackendError, InferenceBackend, InvocationOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct OpenAiCompatibleBackend {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiCompatibleBackend {
    pub fn new(name: String, endpoint: String, api_key: String, model: String) -> Self {
        Self {
            name,
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl InferenceBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe_available(&self) -> bool {
        let url = format!("{}/models", self.endpoint.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn invoke(&self, prompt: &str, options: &InvocationOptions) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request);
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

            return Err(if status == 503 {
                BackendError::Unavailable(error_text)
            } else {
                BackendError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Provider(format!("Failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Provider("response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "summarize".to_string(),
            }],
            max_tokens: Some(256),
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"messages\""));
        assert!(json.contains("\"max_tokens\":256"));
        assert!(!json.contains("temperature"));
    }
}
