// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{HelpBot, PageScroll, WidgetConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Install {
    Created,
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("a HelpBot widget is already mounted on this page")]
    AlreadyMounted,
}

/// The page hosting the widget. At most one widget is mounted per page.
#[derive(Debug, Default)]
pub struct HostPage {
    scroll: PageScroll,
    widget: Option<HelpBot>,
}

impl HostPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> &PageScroll {
        &self.scroll
    }

    pub fn widget(&self) -> Option<&HelpBot> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut HelpBot> {
        self.widget.as_mut()
    }

    /// Creates and mounts the widget, or returns the one already mounted.
    pub fn install(&mut self, config: WidgetConfig) -> (&mut HelpBot, Install) {
        let install = if self.widget.is_some() {
            tracing::warn!("HelpBot widget already loaded");
            Install::AlreadyActive
        } else {
            tracing::info!(
                base_url = %config.base_url,
                anchor = config.anchor.as_str(),
                mode = config.default_mode.as_str(),
                "HelpBot widget installed"
            );
            Install::Created
        };
        let scroll = self.scroll.clone();
        let widget = self
            .widget
            .get_or_insert_with(|| HelpBot::new(config, scroll));
        (widget, install)
    }

    pub fn mount(&mut self, widget: HelpBot) -> Result<&mut HelpBot, MountError> {
        if self.widget.is_some() {
            return Err(MountError::AlreadyMounted);
        }
        Ok(self.widget.insert(widget))
    }
}
