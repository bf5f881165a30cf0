// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::AnalysisResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Pending { request_id: u64, query: String },
    Succeeded(AnalysisResult),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Please enter an error description.")]
    EmptyQuery,
    #[error("an analysis is already in progress (request {request_id})")]
    Busy { request_id: u64 },
}

/// Handle for the single request a submission issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub request_id: u64,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPipeline {
    state: QueryState,
    next_request_id: u64,
}

impl Default for QueryPipeline {
    fn default() -> Self {
        Self {
            state: QueryState::Idle,
            next_request_id: 0,
        }
    }
}

impl QueryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &QueryState {
        &self.state
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self.state, QueryState::Pending { .. })
    }

    /// The submit affordance is enabled exactly when nothing is in flight.
    pub const fn submit_enabled(&self) -> bool {
        !self.is_pending()
    }

    pub const fn loading_visible(&self) -> bool {
        self.is_pending()
    }

    pub fn submit(&mut self, raw_text: &str) -> Result<QueryTicket, SubmitError> {
        if let QueryState::Pending { request_id, .. } = &self.state {
            return Err(SubmitError::Busy {
                request_id: *request_id,
            });
        }

        let query = raw_text.trim();
        if query.is_empty() {
            return Err(SubmitError::EmptyQuery);
        }

        let request_id = self.next_request_id();
        self.state = QueryState::Pending {
            request_id,
            query: query.to_owned(),
        };
        tracing::info!(request_id, query, "analysis submitted");
        Ok(QueryTicket {
            request_id,
            query: query.to_owned(),
        })
    }

    /// Moves a pending request to its terminal state. Completions for any
    /// other request id are dropped.
    pub fn complete(
        &mut self,
        request_id: u64,
        outcome: Result<AnalysisResult, String>,
    ) -> Completion {
        match &self.state {
            QueryState::Pending {
                request_id: pending,
                ..
            } if *pending == request_id => {}
            _ => return Completion::Stale,
        }

        self.state = match outcome {
            Ok(result) => {
                tracing::info!(request_id, "analysis succeeded");
                QueryState::Succeeded(result)
            }
            Err(message) => {
                tracing::warn!(request_id, error = %message, "analysis failed");
                QueryState::Failed(message)
            }
        };
        Completion::Applied
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        self.next_request_id
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, QueryPipeline, QueryState, SubmitError};
    use crate::{AnalysisResult, Severity};

    #[test]
    fn empty_and_whitespace_queries_stay_idle() {
        let mut pipeline = QueryPipeline::new();
        for raw in ["", "   ", "\n\t "] {
            let error = pipeline.submit(raw).expect_err("blank query should fail");
            assert_eq!(error, SubmitError::EmptyQuery);
            assert_eq!(pipeline.state(), &QueryState::Idle);
            assert!(pipeline.submit_enabled());
        }
    }

    #[test]
    fn submit_trims_and_moves_to_pending() {
        let mut pipeline = QueryPipeline::new();
        let ticket = pipeline
            .submit("  database connection timeout \n")
            .expect("submit should succeed");
        assert_eq!(ticket.query, "database connection timeout");
        assert_eq!(
            pipeline.state(),
            &QueryState::Pending {
                request_id: ticket.request_id,
                query: "database connection timeout".to_owned(),
            }
        );
        assert!(!pipeline.submit_enabled());
        assert!(pipeline.loading_visible());
    }

    #[test]
    fn second_submit_while_pending_is_rejected() {
        let mut pipeline = QueryPipeline::new();
        let ticket = pipeline.submit("first").expect("submit should succeed");

        let error = pipeline.submit("second").expect_err("busy pipeline");
        assert_eq!(
            error,
            SubmitError::Busy {
                request_id: ticket.request_id
            }
        );
        assert!(matches!(
            pipeline.state(),
            QueryState::Pending { query, .. } if query == "first"
        ));
    }

    #[test]
    fn terminal_transitions_restore_submit_affordance() {
        let outcomes: [Result<AnalysisResult, String>; 2] = [
            Ok(AnalysisResult {
                severity: Some(Severity::Low),
                ..AnalysisResult::default()
            }),
            Err("HTTP 500: Internal Server Error".to_owned()),
        ];
        for outcome in outcomes {
            let mut pipeline = QueryPipeline::new();
            let ticket = pipeline.submit("disk full").expect("submit should succeed");
            assert_eq!(
                pipeline.complete(ticket.request_id, outcome),
                Completion::Applied
            );
            assert!(pipeline.submit_enabled());
            assert!(!pipeline.loading_visible());
            pipeline
                .submit("retry")
                .expect("pipeline should accept a new submission");
        }
    }

    #[test]
    fn failure_keeps_message() {
        let mut pipeline = QueryPipeline::new();
        let ticket = pipeline.submit("oops").expect("submit should succeed");
        pipeline.complete(ticket.request_id, Err("HTTP 500: boom".to_owned()));
        assert_eq!(
            pipeline.state(),
            &QueryState::Failed("HTTP 500: boom".to_owned())
        );
    }

    #[test]
    fn completion_for_unknown_request_is_stale() {
        let mut pipeline = QueryPipeline::new();
        assert_eq!(
            pipeline.complete(7, Ok(AnalysisResult::default())),
            Completion::Stale
        );
        assert_eq!(pipeline.state(), &QueryState::Idle);

        let ticket = pipeline.submit("query").expect("submit should succeed");
        assert_eq!(
            pipeline.complete(ticket.request_id + 1, Err("late".to_owned())),
            Completion::Stale
        );
        assert!(pipeline.is_pending());
    }

    #[test]
    fn new_submission_overwrites_previous_result() {
        let mut pipeline = QueryPipeline::new();
        let first = pipeline.submit("one").expect("submit should succeed");
        pipeline.complete(first.request_id, Ok(AnalysisResult::default()));

        let second = pipeline.submit("two").expect("submit should succeed");
        assert!(second.request_id > first.request_id);
        assert!(matches!(pipeline.state(), QueryState::Pending { .. }));
    }
}
