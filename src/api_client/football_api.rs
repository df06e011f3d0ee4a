//! Thin client routing every provider call through the dispatch queue

use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::fetch_utils::fetch_json;
use super::http_client::create_http_client;
use super::urls::{build_endpoint_url, request_key};
use crate::config::Config;
use crate::dispatch::{DispatchConfig, DispatchQueue, QueueStatus};
use crate::error::AppError;

/// Football statistics API client.
///
/// Every request is keyed by endpoint and parameters and submitted to the
/// shared dispatch queue, so concurrent identical requests cost one call.
#[derive(Clone)]
pub struct FootballApi {
    client: Client,
    base_url: String,
    queue: DispatchQueue<Value>,
}

impl FootballApi {
    pub fn new(client: Client, base_url: impl Into<String>, queue: DispatchQueue<Value>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            queue,
        }
    }

    /// Builds the HTTP client and a fresh dispatch queue from configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = create_http_client(config.http_timeout_seconds, config.api_key.as_deref())?;
        let queue = DispatchQueue::new(DispatchConfig::with_max_per_window(
            config.max_requests_per_minute,
        )?);
        Ok(Self::new(client, config.api_base_url.clone(), queue))
    }

    pub fn queue(&self) -> &DispatchQueue<Value> {
        &self.queue
    }

    /// GET `endpoint` with borrowed parameters.
    pub async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.request(endpoint, params).await
    }

    /// GET `endpoint` through the dispatch queue.
    ///
    /// Resolves with the parsed body, or with the error of the final attempt.
    #[instrument(skip(self, params))]
    pub async fn request(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
    ) -> Result<Value, AppError> {
        let key = request_key(endpoint, &params);
        let url = build_endpoint_url(&self.base_url, endpoint);
        debug!("Submitting request: key={key}");

        let client = self.client.clone();
        let params = Arc::new(params);
        self.queue
            .submit(key, move || {
                let client = client.clone();
                let url = url.clone();
                let params = Arc::clone(&params);
                async move { fetch_json(&client, &url, &params).await }
            })
            .await
    }

    /// Snapshot of the shared queue for dashboards.
    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::http_client::create_test_http_client;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn api_for(server: &MockServer) -> FootballApi {
        FootballApi::new(
            create_test_http_client(),
            server.uri(),
            DispatchQueue::new(DispatchConfig::with_max_per_window(10).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_request_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/fixtures/events"))
            .and(query_param("fixture", "215662"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [],
                "response": [{"type": "Goal"}]
            })))
            .mount(&mock_server)
            .await;

        let api = api_for(&mock_server);
        let body = api
            .get("/fixtures/events", &[("fixture", "215662")])
            .await
            .unwrap();

        assert_eq!(body["response"][0]["type"], "Goal");
        assert_eq!(api.queue_status().admitted_in_last_window, 1);
    }

    #[tokio::test]
    async fn test_identical_concurrent_requests_hit_provider_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errors": [], "response": [{"team": {"id": 33}}]}))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_for(&mock_server);
        let (a, b, c) = tokio::join!(
            api.get("/teams", &[("id", "33"), ("season", "2024")]),
            api.get("/teams", &[("season", "2024"), ("id", "33")]),
            api.get("teams", &[("id", "33"), ("season", "2024")]),
        );

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(a["response"][0]["team"]["id"], 33);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/odds"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_for(&mock_server);
        let error = api.get("/odds", &[("fixture", "1")]).await.unwrap_err();

        assert!(matches!(error, AppError::ApiClientError { status: 403, .. }));
    }

    #[test]
    fn test_from_config_rejects_zero_budget() {
        let config = Config {
            max_requests_per_minute: 0,
            ..Config::default()
        };
        assert!(matches!(
            FootballApi::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_uses_budget() {
        let config = Config {
            max_requests_per_minute: 25,
            ..Config::default()
        };
        let api = FootballApi::from_config(&config).unwrap();
        assert_eq!(api.queue().config().max_per_window.get(), 25);
    }
}
