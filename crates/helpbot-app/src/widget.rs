// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AnalysisResult, Completion, HitTarget, PageScroll, PanelTarget, PanelView,
    PresentationCommand, PresentationController, PresentationEvent, QueryPipeline, QueryState,
    QueryTicket, SubmitError, WidgetConfig, WidgetState, WidgetVisual, project_query,
    project_widget,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetCommand {
    TogglePanel,
    ClosePanel,
    ToggleMode,
    CompleteReopen {
        token: u64,
    },
    Interact(HitTarget),
    Analyze,
    SelectSuggestion(usize),
    QueryFinished {
        request_id: u64,
        outcome: Result<AnalysisResult, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Presentation(PresentationEvent),
    QueryRequested(QueryTicket),
    ValidationFailed(String),
    SubmitRejected { request_id: u64 },
    SuggestionApplied(String),
    QuerySettled { request_id: u64, succeeded: bool },
}

/// The embedded widget: presentation state, query lifecycle and input field.
#[derive(Debug)]
pub struct HelpBot {
    config: WidgetConfig,
    presentation: PresentationController,
    pipeline: QueryPipeline,
    input: String,
    inline_error: Option<String>,
}

impl HelpBot {
    pub fn new(config: WidgetConfig, scroll: PageScroll) -> Self {
        let presentation = PresentationController::new(
            config.anchor,
            config.default_mode,
            config.reopen_delay,
            scroll,
        );
        Self {
            config,
            presentation,
            pipeline: QueryPipeline::new(),
            input: String::new(),
            inline_error: None,
        }
    }

    pub const fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub const fn state(&self) -> &WidgetState {
        self.presentation.state()
    }

    pub const fn query_state(&self) -> &QueryState {
        self.pipeline.state()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn visual(&self) -> WidgetVisual {
        project_widget(self.presentation.state())
    }

    pub fn panel_view(&self) -> PanelView {
        project_query(self.pipeline.state(), self.inline_error.as_deref())
    }

    pub fn suggestions(&self) -> &[String] {
        match self.pipeline.state() {
            QueryState::Succeeded(result) if self.inline_error.is_none() => &result.suggestions,
            _ => &[],
        }
    }

    pub fn dispatch(&mut self, command: WidgetCommand) -> Vec<WidgetEvent> {
        match command {
            WidgetCommand::TogglePanel => self.present(PresentationCommand::TogglePanel),
            WidgetCommand::ClosePanel => self.present(PresentationCommand::ClosePanel),
            WidgetCommand::ToggleMode => self.present(PresentationCommand::ToggleMode),
            WidgetCommand::CompleteReopen { token } => {
                self.present(PresentationCommand::CompleteReopen { token })
            }
            WidgetCommand::Interact(HitTarget::Panel(target)) => self.interact_inside(target),
            WidgetCommand::Interact(target) => self.present(PresentationCommand::Interact(target)),
            WidgetCommand::Analyze => self.analyze(),
            WidgetCommand::SelectSuggestion(index) => self.select_suggestion(index),
            WidgetCommand::QueryFinished {
                request_id,
                outcome,
            } => {
                let succeeded = outcome.is_ok();
                match self.pipeline.complete(request_id, outcome) {
                    Completion::Applied => vec![WidgetEvent::QuerySettled {
                        request_id,
                        succeeded,
                    }],
                    Completion::Stale => Vec::new(),
                }
            }
        }
    }

    fn present(&mut self, command: PresentationCommand) -> Vec<WidgetEvent> {
        self.presentation
            .dispatch(command)
            .into_iter()
            .map(WidgetEvent::Presentation)
            .collect()
    }

    fn interact_inside(&mut self, target: PanelTarget) -> Vec<WidgetEvent> {
        match target {
            PanelTarget::ModeToggle => self.present(PresentationCommand::ToggleMode),
            PanelTarget::AnalyzeButton => self.analyze(),
            PanelTarget::Suggestion(index) => self.select_suggestion(index),
            PanelTarget::Body | PanelTarget::Input => Vec::new(),
        }
    }

    fn analyze(&mut self) -> Vec<WidgetEvent> {
        match self.pipeline.submit(&self.input) {
            Ok(ticket) => {
                self.inline_error = None;
                vec![WidgetEvent::QueryRequested(ticket)]
            }
            Err(SubmitError::EmptyQuery) => {
                let message = SubmitError::EmptyQuery.to_string();
                self.inline_error = Some(message.clone());
                vec![WidgetEvent::ValidationFailed(message)]
            }
            Err(SubmitError::Busy { request_id }) => {
                tracing::debug!(request_id, "submit ignored while analysis is pending");
                vec![WidgetEvent::SubmitRejected { request_id }]
            }
        }
    }

    fn select_suggestion(&mut self, index: usize) -> Vec<WidgetEvent> {
        let Some(suggestion) = self.suggestions().get(index).cloned() else {
            return Vec::new();
        };
        self.input.clone_from(&suggestion);
        vec![WidgetEvent::SuggestionApplied(suggestion)]
    }
}

#[cfg(test)]
mod tests {
    use super::{HelpBot, WidgetCommand, WidgetEvent};
    use crate::{
        AnalysisResult, DisplayMode, HitTarget, PageScroll, PanelTarget, PresentationEvent,
        QueryState, Severity, WidgetConfig,
    };
    use std::time::Duration;

    fn widget() -> HelpBot {
        HelpBot::new(
            WidgetConfig {
                reopen_delay: Duration::ZERO,
                ..WidgetConfig::default()
            },
            PageScroll::new(),
        )
    }

    fn submit(widget: &mut HelpBot, text: &str) -> u64 {
        widget.input_mut().push_str(text);
        match widget.dispatch(WidgetCommand::Analyze).as_slice() {
            [WidgetEvent::QueryRequested(ticket)] => ticket.request_id,
            other => panic!("expected query request, got {other:?}"),
        }
    }

    #[test]
    fn blank_input_reports_inline_error_without_request() {
        let mut widget = widget();
        widget.input_mut().push_str("   ");

        let events = widget.dispatch(WidgetCommand::Analyze);
        assert_eq!(
            events,
            vec![WidgetEvent::ValidationFailed(
                "Please enter an error description.".to_owned()
            )]
        );
        assert_eq!(widget.query_state(), &QueryState::Idle);
        let panel = widget.panel_view();
        assert_eq!(
            panel.error.as_deref(),
            Some("Please enter an error description.")
        );
        assert!(panel.submit_enabled);
    }

    #[test]
    fn analyze_button_click_submits_and_is_contained() {
        let mut widget = widget();
        widget.dispatch(WidgetCommand::TogglePanel);
        widget.input_mut().push_str("disk full");

        let events = widget.dispatch(WidgetCommand::Interact(HitTarget::Panel(
            PanelTarget::AnalyzeButton,
        )));
        assert!(matches!(events.as_slice(), [WidgetEvent::QueryRequested(ticket)] if ticket.query == "disk full"));
        assert!(widget.state().is_open);
        assert!(widget.panel_view().loading);
    }

    #[test]
    fn second_analyze_while_pending_is_rejected() {
        let mut widget = widget();
        let request_id = submit(&mut widget, "first");

        let events = widget.dispatch(WidgetCommand::Analyze);
        assert_eq!(events, vec![WidgetEvent::SubmitRejected { request_id }]);
    }

    #[test]
    fn selecting_suggestion_fills_input_without_submitting() {
        let mut widget = widget();
        let request_id = submit(&mut widget, "db timeout");
        widget.dispatch(WidgetCommand::QueryFinished {
            request_id,
            outcome: Ok(AnalysisResult {
                suggestions: vec!["Check timeout".to_owned(), "Check DSN".to_owned()],
                ..AnalysisResult::default()
            }),
        });

        let events = widget.dispatch(WidgetCommand::Interact(HitTarget::Panel(
            PanelTarget::Suggestion(1),
        )));
        assert_eq!(
            events,
            vec![WidgetEvent::SuggestionApplied("Check DSN".to_owned())]
        );
        assert_eq!(widget.input(), "Check DSN");
        assert!(matches!(widget.query_state(), QueryState::Succeeded(_)));
    }

    #[test]
    fn out_of_range_suggestion_is_ignored() {
        let mut widget = widget();
        assert!(widget.dispatch(WidgetCommand::SelectSuggestion(3)).is_empty());
        assert_eq!(widget.input(), "");
    }

    #[test]
    fn result_arriving_after_close_is_retained() {
        let mut widget = widget();
        widget.dispatch(WidgetCommand::TogglePanel);
        let request_id = submit(&mut widget, "db timeout");
        widget.dispatch(WidgetCommand::Interact(HitTarget::Page));
        assert!(!widget.state().is_open);

        let events = widget.dispatch(WidgetCommand::QueryFinished {
            request_id,
            outcome: Ok(AnalysisResult {
                severity: Some(Severity::High),
                ..AnalysisResult::default()
            }),
        });
        assert_eq!(
            events,
            vec![WidgetEvent::QuerySettled {
                request_id,
                succeeded: true
            }]
        );
        widget.dispatch(WidgetCommand::TogglePanel);
        assert!(widget.panel_view().results.is_some());
    }

    #[test]
    fn mode_toggle_inside_panel_switches_mode() {
        let mut widget = widget();
        widget.dispatch(WidgetCommand::TogglePanel);

        let events = widget.dispatch(WidgetCommand::Interact(HitTarget::Panel(
            PanelTarget::ModeToggle,
        )));
        assert!(events.contains(&WidgetEvent::Presentation(PresentationEvent::ModeChanged(
            DisplayMode::Sidebar
        ))));
        assert!(widget.state().is_open);
        assert_eq!(widget.visual().mode_label, "Sidebar");
    }

    #[test]
    fn failed_query_surfaces_message_and_allows_retry() {
        let mut widget = widget();
        let request_id = submit(&mut widget, "db timeout");
        widget.dispatch(WidgetCommand::QueryFinished {
            request_id,
            outcome: Err("HTTP 500: Internal Server Error".to_owned()),
        });

        let panel = widget.panel_view();
        assert!(panel.error.is_some_and(|error| error.contains("500")));
        assert!(panel.submit_enabled);
        assert!(!panel.loading);
        assert!(matches!(
            widget.dispatch(WidgetCommand::Analyze).as_slice(),
            [WidgetEvent::QueryRequested(_)]
        ));
    }
}
