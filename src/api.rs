use std::fmt;
use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::http_client::http_client;

const MAX_MESSAGE_LEN: usize = 200;

/// Every failure an operation against the roster API can end in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response at all. The detail is kept for logs, not shown to users.
    #[error("Network error: could not reach the server")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("{message}")]
    Remote { status: u16, message: String },
    /// Rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FilePart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path and query, starting with `/api/`.
    pub path: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request to the backend and back.
///
/// Only a missing response is an `Err`; non-success statuses come back as
/// regular responses and are interpreted by `ApiClient`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

pub struct HttpTransport {
    client: &'static Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        }
        .header(USER_AGENT, "roster_terminal");
        if let Some(token) = self.token.as_ref() {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = form.part(
                        part.field.clone(),
                        Part::bytes(part.bytes.clone()).file_name(part.filename.clone()),
                    );
                }
                req.multipart(form)
            }
        };

        let resp = req
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|err| ApiError::Transport(format!("failed reading body: {err}")))?;
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Sends a request and turns any non-success status into `ApiError::Remote`.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
        };
        debug!(%method, path, "api request");
        let resp = self.transport.send(&request).inspect_err(|err| {
            warn!(%method, path, error = ?err, "api request failed");
        })?;
        if resp.is_success() {
            return Ok(resp);
        }
        let message = error_message(resp.status, &resp.body);
        warn!(%method, path, status = resp.status, %message, "api request rejected");
        Err(ApiError::Remote {
            status: resp.status,
            message,
        })
    }

    pub fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let resp = self.request(method, path, body)?;
        decode_json(&resp.body)
    }

    pub fn request_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        Ok(self.request(Method::Get, path, RequestBody::Empty)?.body)
    }
}

pub fn json_body<T: serde::Serialize>(payload: &T) -> Result<RequestBody, ApiError> {
    serde_json::to_value(payload)
        .map(RequestBody::Json)
        .map_err(|err| ApiError::Validation(format!("could not encode request: {err}")))
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Human-readable message for a rejected request: the server's `detail`,
/// else its first field error, else the raw body, else the status.
pub fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = message_from_json(&value) {
            return truncate(message.trim());
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP {status}")
    } else {
        truncate(text)
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(message_from_json),
        Value::Object(map) => {
            if let Some(detail) = map.get("detail").and_then(message_from_json) {
                return Some(detail);
            }
            map.iter().find_map(|(field, value)| {
                let message = message_from_json(value)?;
                if field == "non_field_errors" {
                    Some(message)
                } else {
                    Some(format!("{field}: {message}"))
                }
            })
        }
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_LEN).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_wins_over_field_errors() {
        let body = br#"{"detail": "Player already removed.", "name": ["bad"]}"#;
        assert_eq!(error_message(404, body), "Player already removed.");
    }

    #[test]
    fn first_field_error_is_prefixed() {
        let body = br#"{"name": ["This field may not be blank."]}"#;
        assert_eq!(error_message(400, body), "name: This field may not be blank.");
        let body = br#"{"non_field_errors": ["Duplicate evaluation."]}"#;
        assert_eq!(error_message(400, body), "Duplicate evaluation.");
    }

    #[test]
    fn falls_back_to_text_then_status() {
        assert_eq!(error_message(502, b"Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(500, b""), "HTTP 500");
        assert_eq!(error_message(500, b"{}"), "{}");
    }
}
