//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Request bodies are compared as
//! parsed JSON so field ordering does not matter.

use dkron_core::{
    ApiError, ClusterClient, EndpointConfig, HttpMethod, HttpRequest, HttpResponse, Payload,
};
use serde_json::Value;

const BASE_URL: &str = "http://172.16.0.1:8080/v1";

fn client() -> ClusterClient<()> {
    ClusterClient::with_transport(&EndpointConfig::new("172.16.0.1"), ()).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn query(input: &Value) -> Vec<(String, String)> {
    input["query"]
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .map(|p| {
                    let p = p.as_array().unwrap();
                    (p[0].as_str().unwrap().to_string(), p[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

fn verify_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(Value::Null) | None => assert!(req.body.is_none(), "{name}: body should be None"),
        Some(body) => {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().map(str::to_string),
    }
}

fn verify_error(name: &str, err: ApiError, expected: &Value) {
    if let Some(status) = expected.get("request") {
        let status = status.as_u64().unwrap() as u16;
        assert!(
            matches!(err, ApiError::Request { status: s } if s == status),
            "{name}: expected Request({status}), got {err:?}"
        );
        return;
    }
    match expected.as_str().unwrap() {
        "deserialization" => assert!(
            matches!(err, ApiError::Deserialization(_)),
            "{name}: expected Deserialization"
        ),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

fn verify_payload(name: &str, payload: Payload, expected: &Value) {
    if expected == "empty" {
        assert_eq!(payload, Payload::Empty, "{name}: expected empty marker");
    } else {
        assert_eq!(payload, Payload::Content(expected["content"].clone()), "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    let raw = include_str!("../../test-vectors/get.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let pairs = query(input);
        let pairs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let req = c.build_get(input["path"].as_str().unwrap(), &pairs);
        verify_request(name, &req, &case["expected_request"]);

        let expected_status = input["expected_status"].as_u64().unwrap() as u16;
        let result = c.parse_payload(simulated(case), expected_status);
        match case.get("expected_error") {
            Some(expected) => verify_error(name, result.unwrap_err(), expected),
            None => verify_payload(name, result.unwrap(), &case["expected_result"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

#[test]
fn post_test_vectors() {
    let raw = include_str!("../../test-vectors/post.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let pairs = query(input);
        let pairs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let body = input.get("body").filter(|b| !b.is_null());

        let req = c.build_post(input["path"].as_str().unwrap(), &pairs, body).unwrap();
        verify_request(name, &req, &case["expected_request"]);

        let expected_status = input["expected_status"].as_u64().unwrap() as u16;
        let result = c.parse_payload(simulated(case), expected_status);
        match case.get("expected_error") {
            Some(expected) => verify_error(name, result.unwrap_err(), expected),
            None => verify_payload(name, result.unwrap(), &case["expected_result"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];

        let req = c.build_delete(input["path"].as_str().unwrap());
        verify_request(name, &req, &case["expected_request"]);

        let expected_status = input["expected_status"].as_u64().unwrap() as u16;
        let result = c.parse_delete(simulated(case), expected_status);
        match case.get("expected_error") {
            Some(expected) => verify_error(name, result.unwrap_err(), expected),
            None => {
                let expected = match &case["expected_result"] {
                    Value::Null => None,
                    value => Some(value.clone()),
                };
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}
