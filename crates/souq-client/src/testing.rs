//! In-process HTTP stub for client tests.
//!
//! An axum router whose fallback answers canned JSON per `METHOD /path`
//! (query ignored) and records every request it sees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string, as sent.
    pub target: String,
    pub body: String,
    pub authorization: Option<String>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }
}

type Routes = HashMap<(String, String), (u16, String)>;

#[derive(Clone)]
struct StubState {
    routes: Arc<Routes>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    /// Starts a stub answering `(method, path, status, body)` routes.
    /// Unknown routes answer 404.
    pub async fn start(routes: &[(&str, &str, u16, &str)]) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = StubState {
            routes: Arc::new(
                routes
                    .iter()
                    .map(|(m, p, s, b)| ((m.to_string(), p.to_string()), (*s, b.to_string())))
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();

        let app = Router::new().fallback(answer).with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        StubServer {
            base_url: format!("http://{}/api", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD target` of every request, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.target))
            .collect()
    }
}

async fn answer(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/api").to_string();
    let target = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.clone(),
    };

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        target,
        body: String::from_utf8_lossy(&body).to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let (status, payload) = state
        .routes
        .get(&(method.to_string(), path))
        .cloned()
        .unwrap_or((404, r#"{"message":"not found"}"#.to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, [(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_records_body_and_answers_routes() {
        let stub = StubServer::start(&[("POST", "/driver/store", 200, r#"{"id":4}"#)]).await;
        let http = reqwest::Client::new();

        let reply = http
            .post(format!("{}/driver/store?x=1", stub.base_url))
            .bearer_auth("tok")
            .json(&serde_json::json!({ "name": "Azad" }))
            .send()
            .await
            .unwrap();
        assert_eq!(reply.status().as_u16(), 200);
        assert_eq!(reply.json::<serde_json::Value>().await.unwrap()["id"], 4);

        let missing = http.get(format!("{}/nowhere", stub.base_url)).send().await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        let recorded = stub.requests();
        assert_eq!(recorded[0].target, "/driver/store?x=1");
        assert_eq!(recorded[0].path(), "/driver/store");
        assert_eq!(recorded[0].json()["name"], "Azad");
        assert_eq!(recorded[0].authorization.as_deref(), Some("Bearer tok"));
        assert_eq!(stub.calls()[1], "GET /nowhere");
    }
}
