//! Language model access through an Ollama-compatible HTTP endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{ReleaseError, ReleaseResult};
use crate::services::LanguageModelService;

pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }
}

#[async_trait]
impl LanguageModelService for OllamaClient {
    async fn complete(&self, prompt: &str) -> ReleaseResult<String> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
                temperature: 0.3,
                top_p: 0.9,
            },
        };

        let response = self
            .http
            .post(self.generate_endpoint())
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                ReleaseError::LanguageModel(format!("failed to call model endpoint: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(ReleaseError::LanguageModel(format!(
                "model endpoint responded with {status}: {body}"
            )));
        }

        let payload: GenerateResponse = response.json().await.map_err(|err| {
            ReleaseError::LanguageModel(format!("failed to parse model response: {err}"))
        })?;
        Ok(payload.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}
