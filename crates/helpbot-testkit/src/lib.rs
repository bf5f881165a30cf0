// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! A local stand-in for the analysis endpoint: a real HTTP server on an
//! ephemeral port that answers `POST /query` from a responder closure.

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    /// The `query` field of a JSON request body, if any.
    pub fn query(&self) -> Option<String> {
        serde_json::from_str::<Value>(&self.body)
            .ok()?
            .get("query")?
            .as_str()
            .map(str::to_owned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubReply {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }
}

type Responder = dyn Fn(&RecordedRequest) -> StubReply + Send + Sync;

pub struct StubEndpoint {
    base_url: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    worker: Option<JoinHandle<()>>,
}

impl StubEndpoint {
    pub fn start<F>(responder: F) -> Result<Self>
    where
        F: Fn(&RecordedRequest) -> StubReply + Send + Sync + 'static,
    {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start stub analysis endpoint: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || serve(&server, &requests, responder.as_ref()))
        };

        Ok(Self {
            base_url,
            server,
            requests,
            worker: Some(worker),
        })
    }

    /// Answers every request with the same reply.
    pub fn fixed(reply: StubReply) -> Result<Self> {
        Self::start(move |_| reply.clone())
    }

    /// Serves canned analyses keyed on words in the query.
    pub fn demo() -> Result<Self> {
        Self::start(demo_reply)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubEndpoint {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn serve(server: &Server, requests: &Mutex<Vec<RecordedRequest>>, responder: &Responder) {
    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(error) = request.as_reader().read_to_string(&mut body) {
            tracing::debug!(%error, "stub endpoint failed to read request body");
        }
        let recorded = RecordedRequest {
            method: request.method().to_string(),
            url: request.url().to_owned(),
            body,
        };
        tracing::debug!(method = %recorded.method, url = %recorded.url, "stub endpoint request");

        let reply = if recorded.method == "POST" && recorded.url == "/query" {
            responder(&recorded)
        } else {
            StubReply::json(404, &json!({ "detail": "Not Found" }))
        };
        requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
            response = response.with_header(header);
        }
        if let Err(error) = request.respond(response) {
            tracing::debug!(%error, "stub endpoint failed to respond");
        }
    }
}

pub fn database_timeout_analysis() -> Value {
    json!({
        "user_issue": "database connection timeout",
        "explanation": "The DB is unreachable.",
        "resolution_steps": "Check network and credentials.",
        "severity": "high",
    })
}

pub fn enhanced_analysis(query: &str) -> Value {
    json!({
        "user_issue": query,
        "explanation": "The service ran out of heap while loading the report batch.",
        "resolution_steps": "1. Lower the batch size.\n2. Raise the worker memory limit.\n3. Restart the worker.",
        "severity": "medium",
        "category": "memory",
        "enhanced": true,
        "conversational_response": "\"It looks like the worker is running out of memory. Smaller batches usually fix this.\"",
        "suggestions": ["How do I raise the memory limit?", "Check worker logs"],
    })
}

fn demo_reply(request: &RecordedRequest) -> StubReply {
    let query = request.query().unwrap_or_default();
    let lowered = query.to_ascii_lowercase();

    if lowered.contains("fail") {
        return StubReply::json(500, &json!({ "detail": "analysis backend crashed" }));
    }
    if lowered.contains("database") || lowered.contains("timeout") {
        let mut body = database_timeout_analysis();
        body["user_issue"] = Value::String(query);
        body["category"] = Value::String("database".to_owned());
        body["enhanced"] = Value::Bool(false);
        body["suggestions"] = json!(["Check timeout", "Check DSN"]);
        return StubReply::ok(&body);
    }
    if lowered.contains("memory") || lowered.contains("heap") {
        return StubReply::ok(&enhanced_analysis(&query));
    }
    if lowered.contains("permission") || lowered.contains("denied") {
        return StubReply::ok(&json!({
            "user_issue": query,
            "explanation": "The process user lacks access to the target path.",
            "resolution_steps": "Grant the service account read access or run with the correct user.",
            "severity": "low",
            "category": "permissions",
        }));
    }

    StubReply::ok(&json!({
        "user_issue": query,
        "explanation": "No matching error entry was found.",
        "resolution_steps": "Please refine your search query with the exact error text.",
        "suggestions": ["database connection timeout", "out of memory", "permission denied"],
    }))
}
