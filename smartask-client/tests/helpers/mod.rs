//! In-process fake SmartTask backend for integration tests
//!
//! Serves the REST endpoints the client uses, records analysis submissions,
//! and exposes a server-sent-events stream fed by `FakeBackend::publish`.
//! Requests without a dedicated route land in a fallback that records the
//! method, raw path and body before answering from a small fixture table.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::stream::{Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// One analysis submission as received by the fake backend
#[derive(Debug, Clone, Default)]
pub struct RecordedAnalysis {
    pub request_id: String,
    pub fields: BTreeMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// A request served by the fallback route
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path as sent, percent-encoding included
    pub path: String,
    /// JSON body, `Null` when empty
    pub body: Value,
}

#[derive(Default)]
struct Recorded {
    analyses: Vec<RecordedAnalysis>,
    topics: Vec<String>,
    rulesets: Vec<Value>,
    uploads: Vec<(String, String)>,
    generated: Vec<Value>,
    requests: Vec<RecordedRequest>,
}

struct BackendState {
    schedules: Vec<Value>,
    recorded: Mutex<Recorded>,
    frames: broadcast::Sender<String>,
    fail_analysis: AtomicBool,
}

/// Handle to a running fake backend
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Bind on a random local port and serve `schedules` until the test ends
    pub async fn start(schedules: Vec<Value>) -> Self {
        let (frames, _) = broadcast::channel(64);
        let state = Arc::new(BackendState {
            schedules,
            recorded: Mutex::new(Recorded::default()),
            frames,
            fail_analysis: AtomicBool::new(false),
        });

        let router = Router::new()
            .route("/schedules/fetch", get(list_schedules))
            .route("/schedules/fetch/:id", get(fetch_schedule))
            .route("/schedules/generate", post(generate))
            .route("/schedules/analyze", post(analyze))
            .route("/clearnreset/clean-schedules", delete(|| async { "cleaned" }))
            .route("/tasks", get(list_tasks))
            .route("/rulesets", get(list_rulesets).post(create_ruleset))
            .route("/rulesets/rules/available", get(available_rules))
            .route("/reference/", get(list_references))
            .route("/reference/create", post(create_reference))
            .route("/stream", get(stream))
            .fallback(record_request)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake backend");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stream_url(&self) -> String {
        format!("{}/stream", self.base_url())
    }

    /// Push a frame to every open event stream; returns streams reached
    pub fn publish(&self, frame: impl Into<String>) -> usize {
        self.state.frames.send(frame.into()).unwrap_or(0)
    }

    pub fn stream_subscribers(&self) -> usize {
        self.state.frames.receiver_count()
    }

    pub fn fail_analysis(&self, fail: bool) {
        self.state.fail_analysis.store(fail, Ordering::SeqCst);
    }

    pub fn analyses(&self) -> Vec<RecordedAnalysis> {
        self.state.recorded.lock().unwrap().analyses.clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.state.recorded.lock().unwrap().topics.clone()
    }

    pub fn rulesets(&self) -> Vec<Value> {
        self.state.recorded.lock().unwrap().rulesets.clone()
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.state.recorded.lock().unwrap().uploads.clone()
    }

    pub fn generated(&self) -> Vec<Value> {
        self.state.recorded.lock().unwrap().generated.clone()
    }

    /// Requests answered by the fallback route, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorded.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request reached the fallback")
    }
}

/// A small calendar with the metadata analysis needs
pub fn sample_schedule(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "algorithm": "CSP Scheduling",
        "timestamp": "2025-03-01T10:00:00Z",
        "data": [
            ["", "1", "2", "3"],
            ["Ana", "M_A", "0", "F"],
            ["Rui", "N_B", "T_B", "0"]
        ],
        "metadata": {
            "year": 2025,
            "vacationTemplateData": {"Ana": ["2025-01-03"]},
            "minimunsTemplateData": [["M", "A", "1"]],
            "employeesTeamInfo": [
                {"name": "Ana", "teams": ["A"]},
                {"name": "Rui", "teams": ["B"]}
            ]
        }
    })
}

async fn list_schedules(State(state): State<Arc<BackendState>>) -> Json<Vec<Value>> {
    Json(state.schedules.clone())
}

async fn fetch_schedule(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if id == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response();
    }
    match state.schedules.iter().find(|s| s["id"] == id.as_str()) {
        Some(schedule) => Json(schedule.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no such schedule").into_response(),
    }
}

async fn generate(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> &'static str {
    state.recorded.lock().unwrap().generated.push(body);
    "Schedule generation started"
}

async fn analyze(
    State(state): State<Arc<BackendState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    if state.fail_analysis.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let mut recorded = RecordedAnalysis::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            recorded.file_name = field.file_name().map(str::to_string);
            recorded.content_type = field.content_type().map(str::to_string);
        }
        let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        recorded.fields.insert(name, text);
    }

    let request_id = Uuid::new_v4().to_string();
    recorded.request_id = request_id.clone();
    state.recorded.lock().unwrap().analyses.push(recorded);
    Ok(Json(json!({ "requestId": request_id })))
}

async fn list_tasks() -> Json<Value> {
    Json(json!([
        {"taskId": "t-1", "status": "COMPLETED", "updatedAt": "2025-03-01T10:00:00Z",
         "request": {"title": "Old plan"}},
        {"taskId": "t-2", "status": "in_progress", "updatedAt": "2025-03-02T09:00:00Z",
         "request": {"title": "New plan"}},
        {"taskId": "t-3", "status": "QUEUED"}
    ]))
}

async fn list_rulesets(State(state): State<Arc<BackendState>>) -> Json<Vec<Value>> {
    let mut sets = vec![json!({"name": "Default", "rules": []})];
    sets.extend(state.recorded.lock().unwrap().rulesets.iter().cloned());
    Json(sets)
}

async fn create_ruleset(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.recorded.lock().unwrap().rulesets.push(body.clone());
    let mut created = body;
    created["id"] = json!("rs-1");
    Json(created)
}

async fn available_rules() -> Json<Value> {
    Json(json!([
        {"type": "maxConsecutiveDays", "kind": "hard",
         "description": "No more than N working days in a row", "params": {"max": 5}},
        {"type": "minRestHours", "kind": "soft",
         "description": "Minimum rest between shifts", "params": {"hours": 11}}
    ]))
}

async fn list_references() -> Json<Value> {
    Json(json!([{"id": "ref-1", "name": "Base", "minimuns": [["M", "A", "1"]]}]))
}

async fn create_reference(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    let name = query.get("name").cloned().ok_or(StatusCode::BAD_REQUEST)?;
    let mut csv = String::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() == Some("file") {
            csv = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        }
    }
    state
        .recorded
        .lock()
        .unwrap()
        .uploads
        .push((name.clone(), csv));
    Ok(Json(json!({"id": "ref-2", "name": name, "minimuns": []})))
}

async fn stream(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topic = query.get("topic").cloned().unwrap_or_default();
    state.recorded.lock().unwrap().topics.push(topic);

    let events = BroadcastStream::new(state.frames.subscribe())
        .filter_map(|item| async move { item.ok().map(|frame| Ok(Event::default().data(frame))) });
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn record_request(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    state.recorded.lock().unwrap().requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: body.clone(),
    });

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["schedules", title]) => {
            let found = state.schedules.iter().find(|s| {
                s["title"]
                    .as_str()
                    .is_some_and(|t| t.replace(' ', "%20") == *title)
            });
            match found {
                Some(schedule) => Json(schedule.clone()).into_response(),
                None => (StatusCode::NOT_FOUND, "no schedule with that title").into_response(),
            }
        }
        ("GET", ["tasks", "t-2"]) => Json(json!({
            "taskId": "t-2",
            "status": "FAILED",
            "updatedAt": "2025-03-02T09:30:00Z",
            "request": {"title": "New plan"}
        }))
        .into_response(),
        ("GET", ["rulesets", "Default"]) => Json(json!({
            "id": "rs-0",
            "name": "Default",
            "description": "Baseline rules",
            "rules": [{"type": "minRestHours", "kind": "soft", "params": {"hours": 11}}]
        }))
        .into_response(),
        ("PUT", ["rulesets", _]) => {
            let mut updated = body;
            updated["id"] = json!("rs-1");
            Json(updated).into_response()
        }
        ("DELETE", ["rulesets", _]) => "Rule set deleted".into_response(),
        ("GET", ["vacation", ""]) => Json(json!([
            {"id": 4, "name": "Summer", "vacations": [["Ana", "2025-08-01"]]}
        ]))
        .into_response(),
        ("POST", ["vacation", ""]) => "Vacation template created".into_response(),
        ("POST", ["vacation", "random", _]) => "Random vacation template created".into_response(),
        ("GET", ["api", "v1", "employees", ""]) => Json(json!([
            {"id": 7, "name": "Ana"},
            {"id": "8", "name": "Rui", "restrictions": {"nights": false}}
        ]))
        .into_response(),
        ("POST", ["api", "v1", "employees", ""]) => "Employee created".into_response(),
        ("PUT", ["api", "v1", "employees", _]) => "Employee updated".into_response(),
        ("DELETE", ["api", "v1", "employees", _]) => "Employee deleted".into_response(),
        ("GET", ["api", "v1", "teams", ""]) => Json(json!([
            {"id": 1, "name": "A", "employees": [{"id": 7, "name": "Ana"}]},
            {"id": 2, "name": "B", "employees": []}
        ]))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "no such endpoint").into_response(),
    }
}
