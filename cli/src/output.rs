//! Result envelope printed on stdout.

use dkron_core::ApiError;
use serde::Serialize;
use serde_json::Value;

/// What a command reports: whether the cluster changed, and the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub data: Value,
}

#[derive(Debug, Serialize)]
struct Failure<'a> {
    failed: bool,
    msg: &'a str,
    /// HTTP status when the cluster rejected the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

pub fn print_outcome(outcome: &Outcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

pub fn print_failure(err: &anyhow::Error) {
    let msg = format!("{err:#}");
    let failure = Failure {
        failed: true,
        msg: &msg,
        status: rejected_status(err),
    };
    match serde_json::to_string_pretty(&failure) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"failed\": true}}"),
    }
}

fn rejected_status(err: &anyhow::Error) -> Option<u16> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(ApiError::status)
}
