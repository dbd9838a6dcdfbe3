//! # API Client
//!
//! Thin JSON wrapper over `reqwest` for the back-office REST API.
//!
//! ```text
//! ┌──────────────┐   GET/POST/PUT/DELETE   ┌────────────────────────────┐
//! │  Repository  │ ──────────────────────► │  {base_url}{resource path} │
//! │              │   Bearer token, JSON    │                            │
//! │              │ ◄────────────────────── │  2xx: JSON body            │
//! └──────────────┘                         │  401: SessionExpired       │
//!                                          │  4xx/5xx: Api { message }  │
//!                                          └────────────────────────────┘
//! ```

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{backend_message, ClientError, ClientResult};

/// Query string pairs, already stripped of empty filters.
pub type QueryPairs = [(String, String)];

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;

        Ok(ApiClient {
            http,
            base_url: config.api.url.trim_end_matches('/').to_string(),
            token: config.api.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a resource path such as `/driver/index`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &QueryPairs) -> ClientResult<T> {
        let request = self.request(Method::GET, path).query(query);
        let body = self.send(request, Method::GET, path).await?;
        decode(&body, path)
    }

    pub async fn post<B, T>(&self, path: &str, payload: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(payload);
        let body = self.send(request, Method::POST, path).await?;
        decode(&body, path)
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> ClientResult<()> {
        let request = self.request(Method::PUT, path).json(payload);
        self.send(request, Method::PUT, path).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path);
        self.send(request, Method::DELETE, path).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, method: Method, path: &str) -> ClientResult<String> {
        debug!(%method, path, "API request");

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "API request failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, path, "Session expired");
            return Err(ClientError::SessionExpired);
        }

        if !status.is_success() {
            let message = backend_message(&body);
            warn!(%method, path, status = status.as_u16(), ?message, "API returned error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%method, path, status = status.as_u16(), bytes = body.len(), "API response");
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str, path: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(format!("{}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;
    use serde_json::{json, Value};

    fn client_for(base_url: &str, token: Option<&str>) -> ApiClient {
        let mut config = ClientConfig::default();
        config.api.url = format!("{}/", base_url);
        config.api.token = token.map(str::to_string);
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("http://localhost:8000/api", None);
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/driver/index"), "http://localhost:8000/api/driver/index");
        assert_eq!(client.url("driver/index"), "http://localhost:8000/api/driver/index");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.api.url = "localhost".to_string();
        assert!(ApiClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_get_sends_token_and_query() {
        let server = StubServer::start(&[("GET", "/driver/index", 200, r#"[{"id": 1, "name": "Karwan"}]"#)]).await;
        let client = client_for(&server.base_url, Some("abc"));

        let query = vec![("page".to_string(), "2".to_string())];
        let drivers: Vec<Value> = client.get("/driver/index", &query).await.unwrap();
        assert_eq!(drivers, vec![json!({"id": 1, "name": "Karwan"})]);

        let requests = server.requests();
        assert_eq!(requests[0].target, "/driver/index?page=2");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_post_sends_json() {
        let server = StubServer::start(&[("POST", "/driver/store", 201, r#"{"id": 9}"#)]).await;
        let client = client_for(&server.base_url, None);

        let created: Value = client.post("/driver/store", &json!({"name": "Azad"})).await.unwrap();
        assert_eq!(created["id"], 9);
        assert_eq!(server.requests()[0].json(), json!({"name": "Azad"}));
        assert_eq!(server.requests()[0].authorization, None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_session_expired() {
        let server = StubServer::start(&[("DELETE", "/driver/delete/3", 401, "{}")]).await;
        let client = client_for(&server.base_url, Some("stale"));

        let err = client.delete("/driver/delete/3").await.unwrap_err();
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_error_carries_backend_message() {
        let server = StubServer::start(&[(
            "PUT",
            "/branch/update/1",
            422,
            r#"{"error": "Name already taken"}"#,
        )])
        .await;
        let client = client_for(&server.base_url, None);

        let err = client.put("/branch/update/1", &json!({})).await.unwrap_err();
        match &err {
            ClientError::Api { status, .. } => assert_eq!(*status, 422),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), "Name already taken");
    }

    #[tokio::test]
    async fn test_bad_body_is_decode_error() {
        let server = StubServer::start(&[("GET", "/currency/index", 200, "not json")]).await;
        let client = client_for(&server.base_url, None);

        let result: ClientResult<Vec<Value>> = client.get("/currency/index", &[]).await;
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }
}
