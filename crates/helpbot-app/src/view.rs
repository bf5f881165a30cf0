// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Projection of widget and query state into render-ready view data. Every
//! state maps to exactly one view, so renderers never inspect raw state.

use crate::{
    AnalysisResult, Anchor, DisplayMode, NO_EXPLANATION_PLACEHOLDER, NO_ISSUE_PLACEHOLDER,
    NO_RESOLUTION_PLACEHOLDER, QueryState, Severity, SidebarEdge, WidgetState,
};

pub const TOGGLE_GLYPH_CLOSED: &str = "?";
pub const TOGGLE_GLYPH_OPEN: &str = "✕";
pub const LOADING_TEXT: &str = "Analyzing your error...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualState {
    ClosedWidget,
    OpenWidget,
    ClosedSidebar,
    OpenSidebar,
}

impl VisualState {
    pub const ALL: [Self; 4] = [
        Self::ClosedWidget,
        Self::OpenWidget,
        Self::ClosedSidebar,
        Self::OpenSidebar,
    ];

    pub const fn of(state: &WidgetState) -> Self {
        match (state.is_open, state.display_mode) {
            (false, DisplayMode::Widget) => Self::ClosedWidget,
            (true, DisplayMode::Widget) => Self::OpenWidget,
            (false, DisplayMode::Sidebar) => Self::ClosedSidebar,
            (true, DisplayMode::Sidebar) => Self::OpenSidebar,
        }
    }

    pub const fn panel_visible(self) -> bool {
        matches!(self, Self::OpenWidget | Self::OpenSidebar)
    }

    pub const fn overlay_visible(self) -> bool {
        matches!(self, Self::OpenSidebar)
    }

    pub const fn mode(self) -> DisplayMode {
        match self {
            Self::ClosedWidget | Self::OpenWidget => DisplayMode::Widget,
            Self::ClosedSidebar | Self::OpenSidebar => DisplayMode::Sidebar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelPlacement {
    /// Bounded-height panel beside the toggle in its corner.
    Floating(Anchor),
    /// Full-height panel against one edge.
    Docked(SidebarEdge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetVisual {
    pub state: VisualState,
    pub anchor: Anchor,
    pub placement: PanelPlacement,
    pub toggle_active: bool,
    pub toggle_glyph: &'static str,
    pub mode_label: &'static str,
}

pub fn project_widget(state: &WidgetState) -> WidgetVisual {
    let visual = VisualState::of(state);
    let placement = match state.display_mode {
        DisplayMode::Widget => PanelPlacement::Floating(state.anchor()),
        DisplayMode::Sidebar => PanelPlacement::Docked(state.sidebar_edge()),
    };
    let toggle_active = visual.panel_visible();
    WidgetVisual {
        state: visual,
        anchor: state.anchor(),
        placement,
        toggle_active,
        toggle_glyph: if toggle_active {
            TOGGLE_GLYPH_OPEN
        } else {
            TOGGLE_GLYPH_CLOSED
        },
        mode_label: state.display_mode.label(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaView {
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub enhanced: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub user_issue: String,
    pub explanation: String,
    pub resolution_steps: String,
    pub meta: Option<MetaView>,
    pub conversational_response: Option<String>,
    pub suggestions: Vec<String>,
}

impl ResultView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let meta = result.has_meta().then(|| MetaView {
            severity: result.severity,
            category: result.category.clone(),
            enhanced: result.enhanced.map(enhanced_label),
        });
        let conversational_response = result
            .conversational_response
            .as_deref()
            .map(strip_wrapping_quotes)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);

        Self {
            user_issue: text_or_placeholder(result.user_issue.as_deref(), NO_ISSUE_PLACEHOLDER),
            explanation: text_or_placeholder(
                result.explanation.as_deref(),
                NO_EXPLANATION_PLACEHOLDER,
            ),
            resolution_steps: text_or_placeholder(
                result.resolution_steps.as_deref(),
                NO_RESOLUTION_PLACEHOLDER,
            ),
            meta,
            conversational_response,
            suggestions: result.suggestions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub submit_enabled: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub results: Option<ResultView>,
}

pub fn project_query(state: &QueryState, inline_error: Option<&str>) -> PanelView {
    match state {
        QueryState::Pending { .. } => PanelView {
            submit_enabled: false,
            loading: true,
            error: None,
            results: None,
        },
        _ if inline_error.is_some() => PanelView {
            submit_enabled: true,
            loading: false,
            error: inline_error.map(str::to_owned),
            results: None,
        },
        QueryState::Idle => PanelView {
            submit_enabled: true,
            loading: false,
            error: None,
            results: None,
        },
        QueryState::Succeeded(result) => PanelView {
            submit_enabled: true,
            loading: false,
            error: None,
            results: Some(ResultView::from_result(result)),
        },
        QueryState::Failed(message) => PanelView {
            submit_enabled: true,
            loading: false,
            error: Some(format!("Failed to analyze error: {message}")),
            results: None,
        },
    }
}

/// Removes one pair of double quotes wrapping the whole text.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    if text.len() >= 2
        && let Some(inner) = text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"'))
    {
        return inner;
    }
    text
}

const fn enhanced_label(enhanced: bool) -> &'static str {
    if enhanced { "AI Enhanced" } else { "Basic" }
}

fn text_or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => placeholder.to_owned(),
    }
}
