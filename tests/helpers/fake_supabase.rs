use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRpc {
    pub function: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Stand-in for the Supabase REST gateway serving the two lock functions.
#[derive(Clone, Default)]
pub struct FakeSupabase {
    pub held: Arc<Mutex<HashSet<String>>>,
    pub requests: Arc<Mutex<Vec<RecordedRpc>>>,
    pub unavailable: Arc<AtomicBool>,
}

impl FakeSupabase {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_held(&self, lock_name: &str) -> bool {
        self.held.lock().unwrap().contains(lock_name)
    }

    pub fn requests(&self) -> Vec<RecordedRpc> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/rest/v1/rpc/:function", post(rpc))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Supabase");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn rpc(
    State(state): State<FakeSupabase>,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRpc {
        function: function.clone(),
        apikey: header(&headers, "apikey"),
        authorization: header(&headers, "authorization"),
        body: body.clone(),
    });

    if state.unavailable.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream connect error").into_response();
    }

    let lock_name = body["lock_name"].as_str().unwrap_or_default().to_string();
    match function.as_str() {
        "try_acquire_cron_lock" => {
            let acquired = state.held.lock().unwrap().insert(lock_name);
            Json(acquired).into_response()
        }
        "release_cron_lock" => {
            state.held.lock().unwrap().remove(&lock_name);
            StatusCode::NO_CONTENT.into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Could not find the function {}", function) })),
        )
            .into_response(),
    }
}
