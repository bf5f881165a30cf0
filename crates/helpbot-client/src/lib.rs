// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Body of a successful `POST /query`. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AnalysisResponse {
    pub user_issue: Option<String>,
    pub explanation: Option<String>,
    pub resolution_steps: Option<String>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub enhanced: Option<bool>,
    pub conversational_response: Option<String>,
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("cannot reach {base_url} ({source})")]
    Transport {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status}: {reason}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        reason: String,
        detail: Option<String>,
    },
    #[error("the analysis service returned an unreadable response")]
    Malformed { detail: String },
}

impl QueryError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Malformed { .. } => None,
        }
    }

    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// Builds a client for `base_url`. With no timeout the transport's own
    /// failure signaling is the only bound on a request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("endpoint.base_url must not be empty");
        }
        validate_base_url(&base_url)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn analyze(&self, query: &str) -> Result<AnalysisResponse, QueryError> {
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .json(&QueryRequest { query })
            .send()
            .map_err(|source| QueryError::Transport {
                base_url: self.base_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response.text().map_err(|source| QueryError::Transport {
            base_url: self.base_url.clone(),
            source,
        })?;
        decode_analysis(&body).inspect_err(|error| {
            if let QueryError::Malformed { detail } = error {
                tracing::warn!(base_url = %self.base_url, %detail, "malformed analysis response");
            }
        })
    }
}

pub fn validate_base_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).with_context(|| {
        format!("base URL {raw:?} is not an absolute URL; use for example http://localhost:8000")
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "base URL {raw:?} uses scheme {:?}; only http and https are supported",
            parsed.scheme()
        );
    }
    if parsed.host_str().is_none() {
        bail!("base URL {raw:?} has no host");
    }
    Ok(parsed)
}

pub fn decode_analysis(body: &str) -> Result<AnalysisResponse, QueryError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|error| QueryError::Malformed {
            detail: format!("invalid JSON: {error}"),
        })?;
    if !value.is_object() {
        return Err(QueryError::Malformed {
            detail: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    }
    serde_json::from_value(value).map_err(|error| QueryError::Malformed {
        detail: format!("unexpected field shape: {error}"),
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(" - {detail}"))
        .unwrap_or_default()
}

fn clean_error_response(status: StatusCode, body: &str) -> QueryError {
    let reason = status.canonical_reason().unwrap_or("Unknown Status").to_owned();

    let detail = if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail
        && !detail.is_empty()
    {
        Some(detail)
    } else if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        Some(body.trim().to_owned())
    } else {
        None
    };

    QueryError::Status {
        status: status.as_u16(),
        reason,
        detail,
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{QueryError, clean_error_response, decode_analysis, validate_base_url};
    use reqwest::StatusCode;

    #[test]
    fn decode_accepts_partial_payloads() {
        let parsed = decode_analysis(r#"{"explanation":"x"}"#).expect("partial body decodes");
        assert_eq!(parsed.explanation.as_deref(), Some("x"));
        assert_eq!(parsed.user_issue, None);
        assert_eq!(parsed.suggestions, None);
    }

    #[test]
    fn decode_rejects_non_object_bodies() {
        let error = decode_analysis("[1,2]").expect_err("array body should fail");
        match error {
            QueryError::Malformed { detail } => assert!(detail.contains("an array")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_wrong_field_types() {
        let error = decode_analysis(r#"{"suggestions":"not a list"}"#)
            .expect_err("string suggestions should fail");
        assert!(error.is_malformed());
        assert_eq!(
            error.to_string(),
            "the analysis service returned an unreadable response"
        );
    }

    #[test]
    fn status_errors_unwrap_detail_envelopes() {
        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Query cannot be empty"}"#,
        );
        assert_eq!(error.status(), Some(400));
        assert_eq!(
            error.to_string(),
            "HTTP 400: Bad Request - Query cannot be empty"
        );
    }

    #[test]
    fn status_errors_fall_back_to_reason() {
        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "{\"weird\":1}");
        assert_eq!(error.to_string(), "HTTP 500: Internal Server Error");

        let short = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(short.to_string(), "HTTP 502: Bad Gateway - upstream down");
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(validate_base_url("http://localhost:8000").is_ok());
        let error = validate_base_url("ftp://example.com").expect_err("ftp should fail");
        assert!(error.to_string().contains("only http and https"));
        let error = validate_base_url("localhost").expect_err("relative should fail");
        assert!(error.to_string().contains("not an absolute URL"));
    }
}
