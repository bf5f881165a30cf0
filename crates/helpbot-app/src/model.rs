// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REOPEN_DELAY: Duration = Duration::from_millis(100);

pub const NO_ISSUE_PLACEHOLDER: &str = "No issue description available";
pub const NO_EXPLANATION_PLACEHOLDER: &str = "No explanation available";
pub const NO_RESOLUTION_PLACEHOLDER: &str = "No resolution steps available";

/// Screen corner the widget is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Anchor {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "top-left" => Some(Self::TopLeft),
            "top-right" => Some(Self::TopRight),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    pub const fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    pub const fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// Edge the sidebar docks to when anchored here.
    pub const fn sidebar_edge(self) -> SidebarEdge {
        if self.is_left() {
            SidebarEdge::Left
        } else {
            SidebarEdge::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SidebarEdge {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Widget,
    Sidebar,
}

impl DisplayMode {
    pub const ALL: [Self; 2] = [Self::Widget, Self::Sidebar];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Widget => "widget",
            Self::Sidebar => "sidebar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "widget" => Some(Self::Widget),
            "sidebar" => Some(Self::Sidebar),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Widget => Self::Sidebar,
            Self::Sidebar => Self::Widget,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Widget => "Widget",
            Self::Sidebar => "Sidebar",
        }
    }
}

/// Styling selector. Opaque to the state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub const fn badge(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Settings supplied once by the embedding host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub base_url: String,
    pub anchor: Anchor,
    pub theme: Theme,
    pub default_mode: DisplayMode,
    pub reopen_delay: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            anchor: Anchor::default(),
            theme: Theme::default(),
            default_mode: DisplayMode::default(),
            reopen_delay: DEFAULT_REOPEN_DELAY,
        }
    }
}

/// Normalized analysis returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisResult {
    pub user_issue: Option<String>,
    pub explanation: Option<String>,
    pub resolution_steps: Option<String>,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub enhanced: Option<bool>,
    pub conversational_response: Option<String>,
    pub suggestions: Vec<String>,
}

impl AnalysisResult {
    pub fn has_meta(&self) -> bool {
        self.severity.is_some() || self.category.is_some() || self.enhanced.is_some()
    }
}
