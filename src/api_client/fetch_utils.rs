//! Single-shot HTTP fetching with error classification.
//!
//! Retries are not done here: the dispatch queue owns the retry policy, and
//! this layer only reports what went wrong in terms the queue can classify.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::error::AppError;

/// Performs one GET request and parses the body as JSON.
///
/// # Arguments
/// * `client` - HTTP client for making requests
/// * `url` - Endpoint URL without query string
/// * `params` - Query parameters
///
/// # Returns
/// * `Ok(Value)` - Parsed JSON body
/// * `Err(AppError)` - Status-specific, network or parse error. A 200 body
///   whose `errors` object reports `rateLimit` becomes `ApiRateLimit`.
#[instrument(skip(client, params))]
pub async fn fetch_json(
    client: &Client,
    url: &str,
    params: &[(String, String)],
) -> Result<Value, AppError> {
    debug!("Fetching data from URL: {url} params={params:?}");

    let response = client.get(url).query(params).send().await.map_err(|e| {
        error!("Request failed for URL {}: {}", url, e);
        if e.is_timeout() {
            AppError::network_timeout(url)
        } else if e.is_connect() {
            AppError::network_connection(url, e.to_string())
        } else {
            AppError::ApiFetch(e)
        }
    })?;

    let status = response.status();
    debug!("Response status: {status}");

    if !status.is_success() {
        let status_code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or("Unknown error");

        error!("HTTP {} - {} (URL: {})", status_code, reason, url);

        return Err(match status_code {
            404 => AppError::api_not_found(url),
            429 => AppError::api_rate_limit(reason, url),
            400..=499 => AppError::api_client_error(status_code, reason, url),
            502 | 503 => AppError::api_service_unavailable(status_code, reason, url),
            _ => AppError::api_server_error(status_code, reason, url),
        });
    }

    let response_text = response.text().await.map_err(|e| {
        error!("Failed to read response text from URL {}: {}", url, e);
        AppError::ApiFetch(e)
    })?;
    debug!("Response length: {} bytes", response_text.len());

    if response_text.trim().is_empty() {
        return Err(AppError::api_no_data("Response body is empty", url));
    }

    let body: Value = serde_json::from_str(&response_text).map_err(|e| {
        error!("Failed to parse API response: {} (URL: {})", e, url);
        let preview: String = response_text.chars().take(200).collect();
        error!("Response text (first 200 chars): {preview}");
        AppError::api_malformed_json(e.to_string(), url)
    })?;

    if let Some(message) = body_rate_limit_message(&body) {
        error!("Provider reported rate limit in body: {} (URL: {})", message, url);
        return Err(AppError::api_rate_limit(message, url));
    }

    Ok(body)
}

/// The provider answers throttled calls with HTTP 200 and
/// `{"errors": {"rateLimit": "..."}}`; other `errors` entries are left to the caller.
fn body_rate_limit_message(body: &Value) -> Option<String> {
    let rate_limit = body.get("errors")?.as_object()?.get("rateLimit")?;
    Some(
        rate_limit
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| rate_limit.to_string()),
    )
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

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let mock_server = MockServer::start().await;
        let client = create_test_http_client();

        Mock::given(method("GET"))
            .and(path("/standings"))
            .and(query_param("league", "39"))
            .and(query_param("season", "2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [],
                "results": 1,
                "response": [{"league": {"id": 39}}]
            })))
            .mount(&mock_server)
            .await;

        let url = format!("{}/standings", mock_server.uri());
        let body = fetch_json(&client, &url, &params(&[("league", "39"), ("season", "2024")]))
            .await
            .unwrap();

        assert_eq!(body["results"], 1);
        assert_eq!(body["response"][0]["league"]["id"], 39);
    }

    #[tokio::test]
    async fn test_fetch_json_status_429_is_rate_limit() {
        let mock_server = MockServer::start().await;
        let client = create_test_http_client();

        Mock::given(method("GET"))
            .and(path("/fixtures"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let url = format!("{}/fixtures", mock_server.uri());
        let error = fetch_json(&client, &url, &[]).await.unwrap_err();

        assert!(matches!(error, AppError::ApiRateLimit { .. }));
        assert!(error.is_rate_limited());
    }

    #[tokio::test]
    async fn test_fetch_json_body_rate_limit() {
        let mock_server = MockServer::start().await;
        let client = create_test_http_client();

        Mock::given(method("GET"))
            .and(path("/players"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": {"rateLimit": "Too many requests. Your rate limit is 10 requests per minute."},
                "results": 0,
                "response": []
            })))
            .mount(&mock_server)
            .await;

        let url = format!("{}/players", mock_server.uri());
        let error = fetch_json(&client, &url, &[]).await.unwrap_err();

        assert!(matches!(error, AppError::ApiRateLimit { .. }));
        assert!(error.to_string().contains("10 requests per minute"));
    }

    #[tokio::test]
    async fn test_fetch_json_other_body_errors_pass_through() {
        let mock_server = MockServer::start().await;
        let client = create_test_http_client();

        Mock::given(method("GET"))
            .and(path("/players"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": {"season": "The Season field must contain 4 characters."},
                "results": 0,
                "response": []
            })))
            .mount(&mock_server)
            .await;

        let url = format!("{}/players", mock_server.uri());
        let body = fetch_json(&client, &url, &[]).await.unwrap();
        assert_eq!(body["results"], 0);
    }

    #[tokio::test]
    async fn test_fetch_json_status_mapping() {
        let cases = [
            (404, "not_found"),
            (400, "client"),
            (500, "server"),
            (503, "unavailable"),
        ];

        for (status, kind) in cases {
            let mock_server = MockServer::start().await;
            let client = create_test_http_client();

            Mock::given(method("GET"))
                .and(path("/teams"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;

            let url = format!("{}/teams", mock_server.uri());
            let error = fetch_json(&client, &url, &[]).await.unwrap_err();

            let matched = match kind {
                "not_found" => matches!(error, AppError::ApiNotFound { .. }),
                "client" => matches!(error, AppError::ApiClientError { status: 400, .. }),
                "server" => matches!(error, AppError::ApiServerError { status: 500, .. }),
                _ => matches!(error, AppError::ApiServiceUnavailable { status: 503, .. }),
            };
            assert!(matched, "status {status} mapped to {error:?}");
            assert!(!error.is_rate_limited());
        }
    }

    #[tokio::test]
    async fn test_fetch_json_empty_and_malformed_bodies() {
        let mock_server = MockServer::start().await;
        let client = create_test_http_client();

        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let empty = fetch_json(&client, &format!("{}/empty", mock_server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(empty, AppError::ApiNoData { .. }));

        let garbled = fetch_json(&client, &format!("{}/garbled", mock_server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(garbled, AppError::ApiMalformedJson { .. }));
    }

    #[test]
    fn test_body_rate_limit_message_ignores_empty_error_list() {
        assert_eq!(body_rate_limit_message(&json!({"errors": []})), None);
        assert_eq!(body_rate_limit_message(&json!({"response": []})), None);
        assert_eq!(
            body_rate_limit_message(&json!({"errors": {"rateLimit": "slow down"}})),
            Some("slow down".to_string())
        );
    }
}
