//! Cluster-level queries: status, leader, members and job names.
//!
//! An empty member, job or running-job list is a valid answer and comes
//! back as an empty `Vec`. Status and leader queries treat an empty body
//! as an error.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::{ClusterClient, Payload};
use crate::error::{ApiError, Result};
use crate::transport::Transport;
use crate::types::{Execution, JobSummary, Member};

/// Which sections `Cluster::info` gathers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfoKind {
    #[default]
    All,
    Status,
    Leader,
    Members,
    Jobs,
}

impl InfoKind {
    fn includes(self, section: InfoKind) -> bool {
        self == InfoKind::All || self == section
    }
}

impl FromStr for InfoKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(InfoKind::All),
            "status" => Ok(InfoKind::Status),
            "leader" => Ok(InfoKind::Leader),
            "members" | "nodes" => Ok(InfoKind::Members),
            "jobs" => Ok(InfoKind::Jobs),
            other => Err(format!("unknown info type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<String>>,
}

pub struct Cluster<'a, T> {
    client: &'a ClusterClient<T>,
}

impl<'a, T: Transport> Cluster<'a, T> {
    pub fn new(client: &'a ClusterClient<T>) -> Self {
        Self { client }
    }

    /// The `serf` section of `GET /`, or `{}` when the server omits it.
    pub fn status(&self) -> Result<Value> {
        let response = self.client.get("/", 200, &[])?.require()?;
        Ok(response
            .get("serf")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// Address of the leader node, `""` when the cluster reports none.
    pub fn leader(&self) -> Result<String> {
        let response = self.client.get("/leader", 200, &[])?.require()?;
        if is_falsy(&response) {
            return Ok(String::new());
        }
        let leader: Member = from_value(response)?;
        Ok(leader.addr)
    }

    pub fn members(&self) -> Result<Vec<String>> {
        let members: Vec<Member> = list(self.client.get("/members", 200, &[])?)?;
        Ok(members.into_iter().map(|m| m.addr).collect())
    }

    /// Names of all jobs, or only of those currently executing.
    pub fn jobs(&self, busy_only: bool) -> Result<Vec<String>> {
        let jobs: Vec<JobSummary> = list(self.client.get("/jobs", 200, &[])?)?;
        let mut names: Vec<String> = jobs.into_iter().map(|j| j.name).collect();
        if busy_only {
            let running = self.running_jobs()?;
            names.retain(|name| running.contains(name));
        }
        Ok(names)
    }

    /// Names of jobs with an execution in progress.
    pub fn running_jobs(&self) -> Result<Vec<String>> {
        let busy: Vec<Execution> = list(self.client.get("/busy", 200, &[])?)?;
        Ok(busy.into_iter().map(|e| e.job_name).collect())
    }

    pub fn info(&self, kind: InfoKind, busy_only: bool) -> Result<ClusterInfo> {
        let mut info = ClusterInfo::default();
        if kind.includes(InfoKind::Status) {
            info.status = Some(self.status()?);
        }
        if kind.includes(InfoKind::Leader) {
            info.leader = Some(self.leader()?);
        }
        if kind.includes(InfoKind::Members) {
            info.members = Some(self.members()?);
        }
        if kind.includes(InfoKind::Jobs) {
            info.jobs = Some(self.jobs(busy_only)?);
        }
        Ok(info)
    }
}

/// Decode a list body; `Empty` and falsy bodies are an empty list.
pub(crate) fn list<D: DeserializeOwned>(payload: Payload) -> Result<Vec<D>> {
    match payload {
        Payload::Empty => Ok(Vec::new()),
        Payload::Content(value) if is_falsy(&value) => Ok(Vec::new()),
        Payload::Content(value) => from_value(value),
    }
}

pub(crate) fn from_value<D: DeserializeOwned>(value: Value) -> Result<D> {
    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// `null`, `false`, `0`, `""`, `[]` and `{}`.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
