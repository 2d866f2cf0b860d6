//! Job queries and idempotent job changes.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::client::{ClusterClient, Payload};
use crate::cluster::{from_value, is_falsy, Cluster};
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{Changed, Execution, JobSpec};

/// Configuration and recent history of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobInfo {
    pub configuration: Value,
    pub history: Vec<Execution>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Replace an existing job of the same name instead of leaving it alone.
    pub overwrite: bool,
    pub run_on_create: bool,
    /// Report what would change without writing.
    pub check_mode: bool,
}

pub struct Jobs<'a, T> {
    client: &'a ClusterClient<T>,
}

impl<'a, T: Transport> Jobs<'a, T> {
    pub fn new(client: &'a ClusterClient<T>) -> Self {
        Self { client }
    }

    /// Stored definition of `name`. An empty response is an error.
    pub fn config(&self, name: &str) -> Result<Value> {
        let response = self
            .client
            .get(&format!("/jobs/{name}"), 200, &[])?
            .require()?;
        if is_falsy(&response) {
            return Ok(Value::Object(Default::default()));
        }
        Ok(response)
    }

    /// Executions of `name`, newest first. `limit` of 0 keeps all of them.
    pub fn history(&self, name: &str, limit: usize) -> Result<Vec<Execution>> {
        let response = self
            .client
            .get(&format!("/jobs/{name}/executions"), 200, &[])?
            .require()?;
        if is_falsy(&response) {
            return Ok(Vec::new());
        }
        let mut history: Vec<Execution> = from_value(response)?;
        history.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if limit > 0 {
            history.truncate(limit);
        }
        Ok(history)
    }

    /// Configuration and history for each named job, or for every job
    /// when `names` is empty.
    pub fn info(&self, names: &[String], limit: usize) -> Result<Vec<JobInfo>> {
        let names = if names.is_empty() {
            Cluster::new(self.client).jobs(false)?
        } else {
            names.to_vec()
        };
        names
            .iter()
            .map(|name| -> Result<JobInfo> {
                Ok(JobInfo {
                    configuration: self.config(name)?,
                    history: self.history(name, limit)?,
                })
            })
            .collect()
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(Cluster::new(self.client)
            .jobs(false)?
            .iter()
            .any(|job| job == name))
    }

    /// Create or replace a job.
    ///
    /// Without `overwrite`, an existing job is returned untouched with
    /// `changed = false`.
    pub fn upsert(&self, spec: &JobSpec, options: UpsertOptions) -> Result<Changed<Value>> {
        let body = spec.to_body()?;

        if !options.overwrite && self.exists(&spec.name)? {
            return Ok(Changed::new(self.config(&spec.name)?, false));
        }
        if options.check_mode {
            return Ok(Changed::new(json!({}), true));
        }

        let query: &[(&str, &str)] = if options.run_on_create {
            &[("run_on_create", "true")]
        } else {
            &[]
        };
        let created = self.client.post("/jobs", 201, query, Some(&body))?;
        info!(job = %spec.name, "job created or updated");
        Ok(Changed::new(payload_or_empty(created), true))
    }

    /// Remove a job if it exists.
    pub fn delete(&self, name: &str, check_mode: bool) -> Result<Changed<Option<Value>>> {
        if !self.exists(name)? {
            return Ok(Changed::new(None, false));
        }
        if check_mode {
            return Ok(Changed::new(Some(json!({})), true));
        }
        let deleted = self.client.delete(&format!("/jobs/{name}"), 200)?;
        info!(job = %name, "job deleted");
        Ok(Changed::new(deleted, true))
    }

    /// Flip the job's enabled state; returns the new `disabled` flag.
    pub fn toggle(&self, name: &str, check_mode: bool) -> Result<Changed<Value>> {
        if check_mode {
            return Ok(Changed::new(json!({}), true));
        }
        let response = self
            .client
            .post(&format!("/jobs/{name}/toggle"), 200, &[], None)?
            .require()?;
        info!(job = %name, "job toggled");
        let disabled = response.get("disabled").cloned().unwrap_or(Value::Null);
        Ok(Changed::new(json!({ "disabled": disabled }), true))
    }
}

fn payload_or_empty(payload: Payload) -> Value {
    payload
        .into_content()
        .unwrap_or_else(|| Value::Object(Default::default()))
}
