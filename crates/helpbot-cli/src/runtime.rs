// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use helpbot_app::{AnalysisResult, QueryTicket, Severity};
use helpbot_client::{AnalysisResponse, Client};
use helpbot_tui::{AnalysisReply, AppRuntime};
use std::thread;

/// Runs analyses against the configured endpoint, one worker thread per
/// request.
pub struct ClientRuntime {
    client: Client,
}

impl ClientRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ClientRuntime {
    fn run_analysis(&mut self, query: &str) -> Result<AnalysisResult> {
        let response = self.client.analyze(query)?;
        Ok(analysis_result(response))
    }

    fn spawn_analysis(&mut self, ticket: &QueryTicket, reply: AnalysisReply) -> Result<()> {
        let client = self.client.clone();
        let query = ticket.query.clone();
        thread::Builder::new()
            .name(format!("helpbot-query-{}", ticket.request_id))
            .spawn(move || {
                let outcome = client
                    .analyze(&query)
                    .map(analysis_result)
                    .map_err(|error| error.to_string());
                reply.send(outcome);
            })
            .context("spawn analysis worker")?;
        Ok(())
    }
}

pub fn analysis_result(response: AnalysisResponse) -> AnalysisResult {
    let severity = response.severity.as_deref().and_then(|raw| {
        let parsed = Severity::parse(raw);
        if parsed.is_none() {
            tracing::warn!(severity = raw, "ignoring unknown severity");
        }
        parsed
    });

    AnalysisResult {
        user_issue: response.user_issue,
        explanation: response.explanation,
        resolution_steps: response.resolution_steps,
        severity,
        category: response.category,
        enhanced: response.enhanced,
        conversational_response: response.conversational_response,
        suggestions: response.suggestions.unwrap_or_default(),
    }
}
