//! Subcommand handlers. Each maps onto one facade call and reports an
//! `Outcome`; queries never report a change.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use dkron_core::{
    Cluster, ClusterClient, Concurrency, Executor, InfoKind, JobSpec, Jobs, Transport,
    UpsertOptions,
};
use serde_json::Value;

use crate::output::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobState {
    /// Create the job, or replace it with --overwrite
    Present,
    /// Delete the job if it exists
    Absent,
    /// Flip the job between enabled and disabled
    Toggled,
}

#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Name of the job
    #[arg(long)]
    pub job_name: String,

    #[arg(long, value_enum, default_value_t = JobState::Present)]
    pub state: JobState,

    /// Cron-style schedule, required for --state present
    #[arg(long)]
    pub schedule: Option<String>,

    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub owner_email: Option<String>,

    /// Create the job disabled
    #[arg(long)]
    pub disabled: bool,

    /// Target-node tag as KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,

    /// Metadata entry as KEY=VALUE (repeatable)
    #[arg(long = "metadata", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    #[arg(long)]
    pub parent_job: Option<String>,

    /// Forbid concurrent executions
    #[arg(long)]
    pub forbid_concurrency: bool,

    /// Command run by the shell executor
    #[arg(long, conflicts_with = "http_url")]
    pub shell_command: Option<String>,

    /// Environment for the shell executor, e.g. "A=1,B=2"
    #[arg(long, requires = "shell_command")]
    pub shell_env: Option<String>,

    #[arg(long, requires = "shell_command")]
    pub shell_cwd: Option<String>,

    /// URL called by the HTTP executor
    #[arg(long)]
    pub http_url: Option<String>,

    #[arg(long, default_value = "GET")]
    pub http_method: String,

    #[arg(long, requires = "http_url")]
    pub http_body: Option<String>,

    #[arg(long, requires = "http_url")]
    pub http_expect_code: Option<String>,

    /// Directory for the file processor's logs
    #[arg(long)]
    pub file_processor_dir: Option<String>,

    #[arg(long)]
    pub log_processor: bool,

    #[arg(long)]
    pub syslog_processor: bool,

    /// Forward output from each processor to the next
    #[arg(long)]
    pub forward: bool,

    /// Replace an existing job of the same name
    #[arg(long)]
    pub overwrite: bool,

    #[arg(long)]
    pub run_on_create: bool,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    Ok((key.to_string(), value.to_string()))
}

impl JobArgs {
    pub fn to_spec(&self) -> Result<JobSpec> {
        let schedule = self
            .schedule
            .clone()
            .context("--schedule is required for --state present")?;

        let executor = match (&self.shell_command, &self.http_url) {
            (Some(command), None) => {
                let mut executor = Executor::shell(command);
                if let Some(env) = &self.shell_env {
                    executor = executor.with("env", env);
                }
                if let Some(cwd) = &self.shell_cwd {
                    executor = executor.with("cwd", cwd);
                }
                executor
            }
            (None, Some(url)) => {
                let mut executor = Executor::http(&self.http_method, url);
                if let Some(body) = &self.http_body {
                    executor = executor.with("body", body);
                }
                if let Some(code) = &self.http_expect_code {
                    executor = executor.with("expectCode", code);
                }
                executor
            }
            _ => bail!("one of --shell-command or --http-url is required"),
        };

        let mut spec = JobSpec::new(&self.job_name, schedule).executor(executor);
        spec.displayname = self.display_name.clone();
        spec.timezone = self.timezone.clone();
        spec.owner = self.owner.clone();
        spec.owner_email = self.owner_email.clone();
        spec.disabled = self.disabled;
        spec.tags = self.tags.iter().cloned().collect::<BTreeMap<_, _>>();
        spec.metadata = self.metadata.iter().cloned().collect::<BTreeMap<_, _>>();
        spec.retries = self.retries;
        spec.parent_job = self.parent_job.clone();
        spec.concurrency = Concurrency::from(!self.forbid_concurrency);

        if let Some(dir) = &self.file_processor_dir {
            spec = spec.file_processor(dir, self.forward);
        }
        if self.log_processor {
            spec = spec.log_processor(self.forward);
        }
        if self.syslog_processor {
            spec = spec.syslog_processor(self.forward);
        }
        Ok(spec)
    }
}

pub fn cluster_info<T: Transport>(
    client: &ClusterClient<T>,
    kind: InfoKind,
    busy_only: bool,
) -> Result<Outcome> {
    let info = Cluster::new(client)
        .info(kind, busy_only)
        .context("cluster query failed")?;
    Ok(Outcome {
        changed: false,
        data: serde_json::to_value(info)?,
    })
}

pub fn job_info<T: Transport>(
    client: &ClusterClient<T>,
    job_names: &[String],
    limit_history: usize,
) -> Result<Outcome> {
    let info = Jobs::new(client)
        .info(job_names, limit_history)
        .context("job query failed")?;
    Ok(Outcome {
        changed: false,
        data: serde_json::to_value(info)?,
    })
}

pub fn job<T: Transport>(client: &ClusterClient<T>, args: &JobArgs) -> Result<Outcome> {
    let jobs = Jobs::new(client);
    match args.state {
        JobState::Present => {
            let spec = args.to_spec()?;
            let options = UpsertOptions {
                overwrite: args.overwrite,
                run_on_create: args.run_on_create,
                check_mode: args.check,
            };
            let result = jobs
                .upsert(&spec, options)
                .context("job create/update failed")?;
            Ok(Outcome {
                changed: result.changed,
                data: result.data,
            })
        }
        JobState::Absent => {
            let result = jobs
                .delete(&args.job_name, args.check)
                .context("job deletion failed")?;
            Ok(Outcome {
                changed: result.changed,
                data: result.data.unwrap_or(Value::Null),
            })
        }
        JobState::Toggled => {
            let result = jobs
                .toggle(&args.job_name, args.check)
                .context("job toggle failed")?;
            Ok(Outcome {
                changed: result.changed,
                data: result.data,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use dkron_core::EndpointConfig;
    use serde_json::json;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        job: JobArgs,
    }

    fn args(extra: &[&str]) -> JobArgs {
        let argv = ["dkron-ctl", "--job-name", "job1"].iter().chain(extra);
        TestCli::try_parse_from(argv).unwrap().job
    }

    fn start_mock_server() -> std::net::SocketAddr {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    }

    fn client() -> ClusterClient {
        let addr = start_mock_server();
        let config = EndpointConfig::new(addr.ip().to_string()).port(addr.port());
        ClusterClient::new(&config).unwrap()
    }

    #[test]
    fn job_spec_from_shell_args() {
        let spec = args(&[
            "--schedule",
            "@hourly",
            "--shell-command",
            "date",
            "--shell-cwd",
            "/tmp",
            "--tag",
            "region=eu1",
            "--forbid-concurrency",
            "--log-processor",
            "--forward",
        ])
        .to_spec()
        .unwrap();
        let body = spec.to_body().unwrap();
        assert_eq!(body["executor"], "shell");
        assert_eq!(body["executor_config"], json!({"command": "date", "cwd": "/tmp"}));
        assert_eq!(body["tags"], json!({"region": "eu1"}));
        assert_eq!(body["concurrency"], "forbid");
        assert_eq!(body["processors"], json!({"log": {"forward": "true"}}));
    }

    #[test]
    fn job_spec_requires_schedule_and_executor() {
        assert!(args(&["--shell-command", "date"]).to_spec().is_err());
        assert!(args(&["--schedule", "@hourly"]).to_spec().is_err());
    }

    #[test]
    fn shell_and_http_executors_conflict() {
        let argv = [
            "dkron-ctl",
            "--job-name",
            "job1",
            "--shell-command",
            "date",
            "--http-url",
            "http://example.com",
        ];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn bad_tag_is_rejected() {
        let argv = ["dkron-ctl", "--job-name", "job1", "--tag", "novalue"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn present_then_absent_against_mock_cluster() {
        let client = client();
        let present = args(&["--schedule", "@hourly", "--shell-command", "date"]);

        let created = job(&client, &present).unwrap();
        assert!(created.changed);

        let unchanged = job(&client, &present).unwrap();
        assert!(!unchanged.changed);

        let toggled = job(&client, &args(&["--state", "toggled"])).unwrap();
        assert_eq!(toggled.data, json!({"disabled": true}));

        let listed = cluster_info(&client, InfoKind::Jobs, false).unwrap();
        assert_eq!(listed.data, json!({"jobs": ["job1"]}));
        assert!(!listed.changed);

        let removed = job(&client, &args(&["--state", "absent"])).unwrap();
        assert!(removed.changed);
        let removed = job(&client, &args(&["--state", "absent"])).unwrap();
        assert!(!removed.changed);
        assert_eq!(removed.data, Value::Null);
    }

    #[test]
    fn job_info_for_missing_job_fails() {
        let client = client();
        let err = job_info(&client, &["ghost".to_string()], 0).unwrap_err();
        assert!(err.to_string().contains("job query failed"));
    }
}
