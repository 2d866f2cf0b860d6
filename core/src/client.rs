//! Typed client for the cluster's `v1` control-plane API.
//!
//! # Design
//! `ClusterClient` holds the base URL, the header list computed once at
//! construction, and a `Transport`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that shapes the `HttpResponse`; `get`/`post`/`delete` join the two
//! around exactly one transport call.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// Decoded body of a successful GET or POST.
///
/// `Empty` stands for a body that decoded to the JSON string `""`. It is
/// never produced for JSON `null`, which arrives as `Content(Value::Null)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Content(Value),
    Empty,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// The decoded value, or `EmptyResponse` for callers that need content.
    pub fn require(self) -> Result<Value> {
        match self {
            Payload::Content(value) => Ok(value),
            Payload::Empty => Err(ApiError::EmptyResponse),
        }
    }

    pub fn into_content(self) -> Option<Value> {
        match self {
            Payload::Content(value) => Some(value),
            Payload::Empty => None,
        }
    }
}

/// Client for one cluster endpoint.
///
/// Construction is the only state transition: it either yields a ready
/// client or fails with `ApiError::Configuration`.
#[derive(Debug, Clone)]
pub struct ClusterClient<T = UreqTransport> {
    base_url: String,
    headers: Vec<(String, String)>,
    transport: T,
}

impl ClusterClient<UreqTransport> {
    /// Client backed by a blocking `ureq` agent honouring `config.timeout`.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new(config.timeout))
    }
}

impl<T> ClusterClient<T> {
    pub fn with_transport(config: &EndpointConfig, transport: T) -> Result<Self> {
        config.validate()?;

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some((username, password)) = config.basic_auth() {
            let token = STANDARD.encode(format!("{username}:{password}"));
            headers.push(("Authorization".to_string(), format!("Basic {token}")));
        }

        Ok(Self {
            base_url: config.base_url(),
            headers,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_get(&self, path: &str, query: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url(path, query),
            headers: self.headers.clone(),
            body: None,
        }
    }

    pub fn build_post(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<HttpRequest> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path, query),
            headers: self.headers.clone(),
            body,
        })
    }

    pub fn build_delete(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.url(path, &[]),
            headers: self.headers.clone(),
            body: None,
        }
    }

    /// Status check and empty-string normalisation shared by GET and POST.
    pub fn parse_payload(&self, response: HttpResponse, expected: u16) -> Result<Payload> {
        check_status(&response, expected)?;
        let body = response
            .body
            .ok_or_else(|| ApiError::Deserialization("response has no body".to_string()))?;
        match decode(&body)? {
            Value::String(s) if s.is_empty() => Ok(Payload::Empty),
            value => Ok(Payload::Content(value)),
        }
    }

    /// A 404 counts as success and yields `{}`; a missing body yields `None`.
    pub fn parse_delete(&self, response: HttpResponse, expected: u16) -> Result<Option<Value>> {
        if response.status == 404 {
            debug!("delete target already absent");
            return Ok(Some(Value::Object(Default::default())));
        }
        check_status(&response, expected)?;
        match response.body {
            Some(body) => decode(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Base URL plus path, with query parameters appended verbatim in order.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}{path}", self.base_url);
        for (name, value) in query {
            let sep = if url.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str(name);
            url.push('=');
            url.push_str(value);
        }
        url
    }
}

impl<T: Transport> ClusterClient<T> {
    pub fn get(&self, path: &str, expected: u16, query: &[(&str, &str)]) -> Result<Payload> {
        let response = self.send(&self.build_get(path, query))?;
        self.parse_payload(response, expected)
    }

    pub fn post(
        &self,
        path: &str,
        expected: u16,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Payload> {
        let response = self.send(&self.build_post(path, query, body)?)?;
        self.parse_payload(response, expected)
    }

    pub fn delete(&self, path: &str, expected: u16) -> Result<Option<Value>> {
        let response = self.send(&self.build_delete(path))?;
        self.parse_delete(response, expected)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending cluster API request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received cluster API response");
        Ok(response)
    }
}

fn check_status(response: &HttpResponse, expected: u16) -> Result<()> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::Request {
        status: response.status,
    })
}

fn decode(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
