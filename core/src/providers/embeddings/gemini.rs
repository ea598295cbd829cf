use crate::config::{ConfigError, GeminiConfig};
use crate::embeddings::{model::EmbeddingModel, EmbedderError, TaskType};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

/// Implementation of the `EmbeddingModel` trait for Google's Gemini API,
/// calling the `embedContent` method of the configured embedding model.
pub struct GeminiEmbeddingModel {
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiEmbeddingModel {
    /// Fails when the HTTP client for `config` can't be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: config.method_url(&config.embedding_model, "embedContent"),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            client: config.http_client()?,
        })
    }
}

#[derive(Deserialize)]
struct GeminiEmbeddingResponse {
    pub embedding: GeminiEmbeddingValues,
}

#[derive(Deserialize)]
struct GeminiEmbeddingValues {
    pub values: Vec<f64>,
}

#[async_trait]
impl EmbeddingModel for GeminiEmbeddingModel {
    #[instrument(skip(self, data), fields(model = %self.model, data_len = data.len()))]
    async fn embed(&self, data: &str, task: TaskType) -> Result<Vec<f64>, EmbedderError> {
        let request_body = json!({
            "model": format!("models/{}", self.model),
            "content": {"parts": [{"text": data}]},
            "taskType": task.as_str(),
        });
        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Embedding request failed");
                EmbedderError::RequestError(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "Received embedding response");
        if status.is_success() {
            let response = response
                .json::<GeminiEmbeddingResponse>()
                .await
                .map_err(|e| EmbedderError::ParseError(e.to_string()))?;
            if response.embedding.values.is_empty() {
                return Err(EmbedderError::ParseError(
                    "Response contained an empty embedding".to_string(),
                ));
            }
            Ok(response.embedding.values)
        } else {
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_message, "Embedding API returned error");
            Err(EmbedderError::ProviderError(status.into(), error_message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn model_for(server: &mockito::ServerGuard) -> GeminiEmbeddingModel {
        let config = GeminiConfig::new("test-key")
            .with_api_url(server.url())
            .with_embedding_model("embed-test");
        GeminiEmbeddingModel::new(&config).unwrap()
    }

    #[tokio::test]
    async fn embed_sends_task_type_and_returns_values() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/embed-test:embedContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Json(json!({
                "model": "models/embed-test",
                "content": {"parts": [{"text": "hello"}]},
                "taskType": "RETRIEVAL_QUERY",
            })))
            .with_status(200)
            .with_body(r#"{"embedding": {"values": [0.5, -0.25, 1.0]}}"#)
            .create_async()
            .await;

        let values = model_for(&server)
            .embed("hello", TaskType::Query)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(values, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn documents_use_the_document_task_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/embed-test:embedContent")
            .match_body(Matcher::PartialJson(
                json!({"taskType": "RETRIEVAL_DOCUMENT"}),
            ))
            .with_status(200)
            .with_body(r#"{"embedding": {"values": [1.0]}}"#)
            .create_async()
            .await;

        model_for(&server)
            .embed("a passage", TaskType::Document)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_failure_is_an_error_not_a_zero_vector() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/embed-test:embedContent")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let err = model_for(&server)
            .embed("hello", TaskType::Document)
            .await
            .unwrap_err();
        assert_eq!(err, EmbedderError::ProviderError(500, "internal".to_string()));
    }

    #[tokio::test]
    async fn empty_embedding_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/embed-test:embedContent")
            .with_status(200)
            .with_body(r#"{"embedding": {"values": []}}"#)
            .create_async()
            .await;

        let err = model_for(&server)
            .embed("hello", TaskType::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedderError::ParseError(_)));
    }

    #[tokio::test]
    #[ignore]
    async fn simple_gemini_embed_request() {
        let config = GeminiConfig::from_env().unwrap();
        let model = GeminiEmbeddingModel::new(&config).unwrap();
        let response = model.embed("test", TaskType::Document).await;
        assert!(response.is_ok_and(|v| !v.is_empty()));
    }
}
