use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const LEADER_ADDR: &str = "172.16.0.1";

/// In-memory stand-in for a cluster's state.
#[derive(Debug, Clone, Default)]
pub struct ClusterState {
    pub members: Vec<Value>,
    pub jobs: BTreeMap<String, Value>,
    pub executions: BTreeMap<String, Vec<Value>>,
    pub busy: Vec<Value>,
}

impl ClusterState {
    /// Two members, the first one leading, and no jobs.
    pub fn seeded() -> Self {
        Self {
            members: vec![
                json!({"Name": "node1", "Addr": LEADER_ADDR, "Port": 8946, "Status": 1}),
                json!({"Name": "node2", "Addr": "172.16.0.2", "Port": 8946, "Status": 1}),
            ],
            ..Self::default()
        }
    }
}

pub type Db = Arc<RwLock<ClusterState>>;

#[derive(Deserialize)]
pub struct CreateParams {
    #[serde(default)]
    pub run_on_create: Option<String>,
}

pub fn db(state: ClusterState) -> Db {
    Arc::new(RwLock::new(state))
}

pub fn app() -> Router {
    router(db(ClusterState::seeded()))
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/v1/", get(status))
        .route("/v1/leader", get(leader))
        .route("/v1/members", get(members))
        .route("/v1/busy", get(busy))
        .route("/v1/jobs", get(list_jobs).post(upsert_job))
        .route("/v1/jobs/{name}", get(get_job).delete(delete_job))
        .route("/v1/jobs/{name}/executions", get(job_executions))
        .route("/v1/jobs/{name}/toggle", post(toggle_job))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

async fn status(State(db): State<Db>) -> Json<Value> {
    let state = db.read().await;
    Json(json!({
        "agent": {"name": "node1", "version": "mock"},
        "serf": {
            "encrypted": false,
            "failed": 0,
            "health_score": 0,
            "left": 0,
            "members": state.members.len(),
            "event_queue": 0,
            "query_queue": 0
        },
        "tags": {}
    }))
}

async fn leader(State(db): State<Db>) -> Json<Value> {
    let state = db.read().await;
    let leader = state
        .members
        .iter()
        .find(|m| m["Addr"] == LEADER_ADDR)
        .cloned()
        .unwrap_or_else(|| json!({}));
    Json(leader)
}

async fn members(State(db): State<Db>) -> Json<Vec<Value>> {
    Json(db.read().await.members.clone())
}

async fn busy(State(db): State<Db>) -> Json<Vec<Value>> {
    Json(db.read().await.busy.clone())
}

async fn list_jobs(State(db): State<Db>) -> Json<Vec<Value>> {
    Json(db.read().await.jobs.values().cloned().collect())
}

async fn upsert_job(
    State(db): State<Db>,
    Query(params): Query<CreateParams>,
    Json(mut job): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let name = job
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or(StatusCode::BAD_REQUEST)?;

    let mut state = db.write().await;
    if job.get("disabled").is_none() {
        job["disabled"] = json!(false);
    }
    state.jobs.insert(name.clone(), job.clone());
    let executions = state.executions.entry(name.clone()).or_default();
    if params.run_on_create.as_deref() == Some("true") {
        executions.push(json!({
            "job_name": name,
            "started_at": "2020-01-01T00:00:00Z",
            "success": true,
            "node_name": "node1"
        }));
    }
    Ok((StatusCode::CREATED, Json(job)))
}

async fn get_job(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let state = db.read().await;
    state.jobs.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn job_executions(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    let state = db.read().await;
    if !state.jobs.contains_key(&name) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.executions.get(&name).cloned().unwrap_or_default()))
}

async fn toggle_job(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = db.write().await;
    let job = state.jobs.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    let disabled = job["disabled"].as_bool().unwrap_or(false);
    job["disabled"] = json!(!disabled);
    Ok(Json(job.clone()))
}

async fn delete_job(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = db.write().await;
    state.executions.remove(&name);
    state.jobs.remove(&name).map(Json).ok_or(StatusCode::NOT_FOUND)
}
