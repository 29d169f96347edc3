// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Minimal stand-in for the Kubernetes API server, for testing the
//! Kubernetes-backed store and sink without a cluster.
//!
//! Every request is recorded and answered with a canned status code and body.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use kube::{Client, Config};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request as seen by the fake server.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub body: serde_json::Value,
}

struct Shared {
    status: StatusCode,
    response: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle on a running fake API server.
pub struct FakeApiServer {
    shared: Arc<Shared>,
    client: Client,
}

impl FakeApiServer {
    /// Serve `response` with `status` for every request.
    pub async fn start(status: StatusCode, response: serde_json::Value) -> Self {
        let shared = Arc::new(Shared {
            status,
            response: response.to_string(),
            requests: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(shared.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let uri = format!("http://{addr}").parse().unwrap();
        let client = Client::try_from(Config::new(uri)).unwrap();
        Self { shared, client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    shared.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        content_type,
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    (
        shared.status,
        [(header::CONTENT_TYPE, "application/json")],
        shared.response.clone(),
    )
}
