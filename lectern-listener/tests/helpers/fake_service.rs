//! Fake playback-coordination service
//!
//! Serves the same endpoints as the real service on an ephemeral port and
//! records what it receives.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A request as seen by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: &'static str,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct ServiceState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    app_state: Arc<Mutex<(StatusCode, String)>>,
}

impl ServiceState {
    fn record(&self, method: &'static str, path: &'static str, body: Option<Value>) {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { method, path, body });
    }
}

/// Running fake service; shut down on drop
pub struct FakeService {
    pub base_url: String,
    state: ServiceState,
    handle: JoinHandle<()>,
}

impl FakeService {
    /// Start on 127.0.0.1 with an idle session document.
    pub async fn start() -> Self {
        let initial = json!({"playing": false, "currentTime": 0, "sliderHead": 0}).to_string();
        let state = ServiceState {
            requests: Arc::new(Mutex::new(Vec::new())),
            app_state: Arc::new(Mutex::new((StatusCode::OK, initial))),
        };

        let router = Router::new()
            .route("/connect", post(connect))
            .route("/play", get(play))
            .route("/pause", post(pause))
            .route("/shiftSlider", post(shift_slider))
            .route("/data/appState.json", get(app_state))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Serve `session` as the state document.
    pub fn set_session(&self, session: Value) {
        *self.state.app_state.lock().unwrap() = (StatusCode::OK, session.to_string());
    }

    /// Serve an arbitrary status and body as the state document.
    pub fn set_state_response(&self, status: StatusCode, body: &str) {
        *self.state.app_state.lock().unwrap() = (status, body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Notification requests only (state fetches excluded).
    pub fn notifications(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != "/data/appState.json")
            .collect()
    }

    /// Wait until at least `count` notifications arrived or `timeout` passes.
    pub async fn wait_for_notifications(&self, count: usize, timeout: Duration) -> Vec<RecordedRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let seen = self.notifications();
            if seen.len() >= count || tokio::time::Instant::now() >= deadline {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn connect(State(state): State<ServiceState>, Json(body): Json<Value>) -> &'static str {
    state.record("POST", "/connect", Some(body));
    "connected"
}

async fn play(State(state): State<ServiceState>) -> StatusCode {
    state.record("GET", "/play", None);
    StatusCode::OK
}

async fn pause(State(state): State<ServiceState>, Json(body): Json<Value>) -> StatusCode {
    state.record("POST", "/pause", Some(body));
    StatusCode::OK
}

async fn shift_slider(State(state): State<ServiceState>, Json(body): Json<Value>) -> StatusCode {
    state.record("POST", "/shiftSlider", Some(body));
    StatusCode::OK
}

async fn app_state(State(state): State<ServiceState>) -> (StatusCode, String) {
    state.record("GET", "/data/appState.json", None);
    state.app_state.lock().unwrap().clone()
}
