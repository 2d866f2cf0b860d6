//! Domain DTOs for the cluster API.
//!
//! # Design
//! Response types name only the fields the facades read and keep the rest
//! in a flattened map, so nothing the server sends is dropped when a value
//! is handed back to the caller. `JobSpec` is the typed request side of a
//! job definition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// A node as reported by `/members` and `/leader`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "Addr")]
    pub addr: String,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Job summary as returned by `/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One execution, as returned by `/busy` and `/jobs/{name}/executions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub job_name: String,
    /// RFC 3339 timestamp; compared as text when ordering history.
    #[serde(default)]
    pub started_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a mutating operation, with whether the cluster was changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changed<T> {
    pub data: T,
    pub changed: bool,
}

impl<T> Changed<T> {
    pub fn new(data: T, changed: bool) -> Self {
        Self { data, changed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concurrency {
    #[default]
    Allow,
    Forbid,
}

impl From<bool> for Concurrency {
    fn from(allow: bool) -> Self {
        if allow {
            Concurrency::Allow
        } else {
            Concurrency::Forbid
        }
    }
}

/// How the job runs. Shell and HTTP are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executor {
    Shell(BTreeMap<String, String>),
    Http(BTreeMap<String, String>),
}

impl Executor {
    pub fn shell(command: impl Into<String>) -> Self {
        let mut config = BTreeMap::new();
        config.insert("command".to_string(), command.into());
        Executor::Shell(config)
    }

    pub fn http(method: impl Into<String>, url: impl Into<String>) -> Self {
        let mut config = BTreeMap::new();
        config.insert("method".to_string(), method.into().to_uppercase());
        config.insert("url".to_string(), url.into());
        Executor::Http(config)
    }

    /// Add one executor option, e.g. `cwd` or `expect_code`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Executor::Shell(config) | Executor::Http(config) => {
                config.insert(key.into(), value.into());
            }
        }
        self
    }

    fn kind(&self) -> &'static str {
        match self {
            Executor::Shell(_) => "shell",
            Executor::Http(_) => "http",
        }
    }

    fn config(&self) -> &BTreeMap<String, String> {
        match self {
            Executor::Shell(config) | Executor::Http(config) => config,
        }
    }
}

/// Desired definition of a job, sent to `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub displayname: Option<String>,
    pub schedule: String,
    pub timezone: String,
    pub owner: Option<String>,
    pub owner_email: Option<String>,
    pub disabled: bool,
    pub tags: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub retries: u32,
    pub parent_job: Option<String>,
    pub concurrency: Concurrency,
    pub processors: BTreeMap<String, BTreeMap<String, String>>,
    pub executor: Option<Executor>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            displayname: None,
            schedule: schedule.into(),
            timezone: "UTC".to_string(),
            owner: None,
            owner_email: None,
            disabled: false,
            tags: BTreeMap::new(),
            metadata: BTreeMap::new(),
            retries: 0,
            parent_job: None,
            concurrency: Concurrency::Allow,
            processors: BTreeMap::new(),
            executor: None,
        }
    }

    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn file_processor(mut self, log_dir: impl Into<String>, forward: bool) -> Self {
        let mut config = BTreeMap::new();
        config.insert("log_dir".to_string(), log_dir.into());
        config.insert("forward".to_string(), forward.to_string());
        self.processors.insert("files".to_string(), config);
        self
    }

    pub fn log_processor(mut self, forward: bool) -> Self {
        self.processors
            .insert("log".to_string(), forward_only(forward));
        self
    }

    pub fn syslog_processor(mut self, forward: bool) -> Self {
        self.processors
            .insert("syslog".to_string(), forward_only(forward));
        self
    }

    /// JSON body for `POST /jobs`. Fails when no executor is set.
    pub fn to_body(&self) -> Result<Value> {
        let executor = self.executor.as_ref().ok_or_else(|| {
            ApiError::Configuration("a shell or http executor is required".to_string())
        })?;
        if self.name.is_empty() {
            return Err(ApiError::Configuration("job name is required".to_string()));
        }

        let body = JobBody {
            name: &self.name,
            displayname: self.displayname.as_deref(),
            schedule: &self.schedule,
            timezone: &self.timezone,
            owner: self.owner.as_deref(),
            owner_email: self.owner_email.as_deref(),
            disabled: self.disabled,
            tags: &self.tags,
            metadata: &self.metadata,
            retries: self.retries,
            parent_job: self.parent_job.as_deref(),
            concurrency: self.concurrency,
            processors: &self.processors,
            executor: executor.kind(),
            executor_config: executor.config(),
        };
        serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

fn forward_only(forward: bool) -> BTreeMap<String, String> {
    let mut config = BTreeMap::new();
    config.insert("forward".to_string(), forward.to_string());
    config
}

fn is_empty<K, V>(map: &&BTreeMap<K, V>) -> bool {
    map.is_empty()
}

#[derive(Serialize)]
struct JobBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    displayname: Option<&'a str>,
    schedule: &'a str,
    timezone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_email: Option<&'a str>,
    disabled: bool,
    #[serde(skip_serializing_if = "is_empty")]
    tags: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "is_empty")]
    metadata: &'a BTreeMap<String, String>,
    retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_job: Option<&'a str>,
    concurrency: Concurrency,
    #[serde(skip_serializing_if = "is_empty")]
    processors: &'a BTreeMap<String, BTreeMap<String, String>>,
    executor: &'a str,
    executor_config: &'a BTreeMap<String, String>,
}
