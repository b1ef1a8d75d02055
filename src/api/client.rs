use std::sync::Arc;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

use super::storage::{TokenStore, TOKEN_KEY};
use crate::error::{ApiError, AppError, REQUEST_FAILED};

/// JSON client for the backend API rooted at a fixed base URL.
///
/// One attempt per call: no retry, no timeout, no backoff.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            store,
        })
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> Result<(), AppError> {
        self.store.set(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> Result<(), AppError> {
        self.store.remove(TOKEN_KEY)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, AppError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, AppError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    /// Full URL for an endpoint path such as `/sessions?year=2`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AppError> {
        let url = self.endpoint(path);
        debug!("{} {}", method, url);

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            error!("API Error: {} {} failed: {}", method, path, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            let message = error_message(&text);
            error!("API Error: {} {} returned {}: {}", method, path, status, message);
            return Err(ApiError::Request {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        decode_body(status, &text)
    }
}

/// Picks the server's `error` or `message` field, else the fixed fallback.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"].iter().find_map(|key| {
                v.get(*key)
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| REQUEST_FAILED.to_string())
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, AppError> {
    // Empty success bodies decode as JSON null so `()` and `Option<_>` work.
    let raw = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(raw).map_err(|e| {
        error!("Undecodable {} response body: {}", status, e);
        ApiError::Decode(e.to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryTokenStore;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        ApiClient::new(&format!("{}/api", server.uri()), Arc::new(store)).unwrap()
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"Session is full"}"#), "Session is full");
        assert_eq!(error_message(r#"{"message":"Not allowed"}"#), "Not allowed");
        assert_eq!(error_message(r#"{"title":"Title is required"}"#), REQUEST_FAILED);
        assert_eq!(error_message("<html>gateway</html>"), REQUEST_FAILED);
        assert_eq!(error_message(""), REQUEST_FAILED);
        assert_eq!(error_message(r#"{"error":"","message":"Already requested"}"#), "Already requested");
        assert_eq!(error_message(r#"{"error":" ","message":""}"#), REQUEST_FAILED);
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "name": "Ada"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret-token")).await;
        let user: serde_json::Value = client.get("/users/me").await.unwrap();
        assert_eq!(user["name"], "Ada");
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let sessions: Vec<serde_json::Value> = client.get("/sessions").await.unwrap();
        assert!(sessions.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0]
            .headers
            .iter()
            .all(|(name, _)| !name.as_str().eq_ignore_ascii_case("authorization")));
    }

    #[tokio::test]
    async fn test_non_2xx_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions/s1/request"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Session is full"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("t")).await;
        let err = client
            .post::<serde_json::Value, _>("/sessions/s1/request", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "Session is full");
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/sessions/s1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("t")).await;
        let unit: () = client.delete("/sessions/s1").await.unwrap();
        assert_eq!(unit, ());
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new("http://127.0.0.1:9/api", store).unwrap();
        let err = client.get::<serde_json::Value>("/sessions").await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Transport(_))));
    }
}
