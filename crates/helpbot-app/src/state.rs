// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Anchor, DisplayMode, PageScroll, ScrollSuspension, SidebarEdge};
use std::time::Duration;

/// Visual state of the widget. `is_open` and `display_mode` vary independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetState {
    pub is_open: bool,
    pub display_mode: DisplayMode,
    anchor: Anchor,
}

impl WidgetState {
    pub const fn new(anchor: Anchor, display_mode: DisplayMode) -> Self {
        Self {
            is_open: false,
            display_mode,
            anchor,
        }
    }

    pub const fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub const fn sidebar_edge(&self) -> SidebarEdge {
        self.anchor.sidebar_edge()
    }

    pub const fn overlay_active(&self) -> bool {
        self.is_open && matches!(self.display_mode, DisplayMode::Sidebar)
    }
}

/// Where a pointer interaction landed on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Toggle,
    Overlay,
    Page,
    Panel(PanelTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTarget {
    Body,
    ModeToggle,
    Input,
    AnalyzeButton,
    Suggestion(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationCommand {
    TogglePanel,
    ClosePanel,
    ToggleMode,
    CompleteReopen { token: u64 },
    Interact(HitTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationEvent {
    PanelOpened(DisplayMode),
    PanelClosed(DisplayMode),
    ModeChanged(DisplayMode),
    ReopenScheduled { token: u64, delay: Duration },
}

#[derive(Debug)]
pub struct PresentationController {
    state: WidgetState,
    scroll: PageScroll,
    scroll_hold: Option<ScrollSuspension>,
    reopen_delay: Duration,
    pending_reopen: Option<u64>,
    next_reopen_token: u64,
}

impl PresentationController {
    pub fn new(
        anchor: Anchor,
        display_mode: DisplayMode,
        reopen_delay: Duration,
        scroll: PageScroll,
    ) -> Self {
        Self {
            state: WidgetState::new(anchor, display_mode),
            scroll,
            scroll_hold: None,
            reopen_delay,
            pending_reopen: None,
            next_reopen_token: 0,
        }
    }

    pub const fn state(&self) -> &WidgetState {
        &self.state
    }

    pub const fn pending_reopen(&self) -> Option<u64> {
        self.pending_reopen
    }

    pub fn scroll(&self) -> &PageScroll {
        &self.scroll
    }

    pub fn dispatch(&mut self, command: PresentationCommand) -> Vec<PresentationEvent> {
        match command {
            PresentationCommand::TogglePanel => self.toggle_panel(),
            PresentationCommand::ClosePanel => {
                self.pending_reopen = None;
                self.close()
            }
            PresentationCommand::ToggleMode => self.toggle_mode(),
            PresentationCommand::CompleteReopen { token } => {
                if self.pending_reopen != Some(token) {
                    return Vec::new();
                }
                self.pending_reopen = None;
                self.open()
            }
            PresentationCommand::Interact(target) => self.close_on_outside_interaction(target),
        }
    }

    fn toggle_panel(&mut self) -> Vec<PresentationEvent> {
        // A toggle during a scheduled reopen means the user wants the panel now.
        if self.pending_reopen.take().is_some() {
            return self.open();
        }
        if self.state.is_open {
            self.close()
        } else {
            self.open()
        }
    }

    fn toggle_mode(&mut self) -> Vec<PresentationEvent> {
        let was_open = self.state.is_open || self.pending_reopen.is_some();
        let mut events = Vec::new();
        if self.state.is_open {
            events.extend(self.close());
        }

        self.state.display_mode = self.state.display_mode.toggled();
        tracing::debug!(mode = self.state.display_mode.as_str(), "display mode changed");
        events.push(PresentationEvent::ModeChanged(self.state.display_mode));

        if was_open {
            if self.reopen_delay.is_zero() {
                self.pending_reopen = None;
                events.extend(self.open());
            } else {
                self.next_reopen_token = self.next_reopen_token.wrapping_add(1);
                let token = self.next_reopen_token;
                self.pending_reopen = Some(token);
                events.push(PresentationEvent::ReopenScheduled {
                    token,
                    delay: self.reopen_delay,
                });
            }
        }
        events
    }

    fn close_on_outside_interaction(&mut self, target: HitTarget) -> Vec<PresentationEvent> {
        match target {
            HitTarget::Panel(_) => Vec::new(),
            HitTarget::Toggle => self.toggle_panel(),
            HitTarget::Overlay => {
                if self.state.overlay_active() {
                    self.pending_reopen = None;
                    self.close()
                } else {
                    Vec::new()
                }
            }
            HitTarget::Page => {
                if self.state.is_open && self.state.display_mode == DisplayMode::Widget {
                    self.pending_reopen = None;
                    self.close()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn open(&mut self) -> Vec<PresentationEvent> {
        if self.state.is_open {
            return Vec::new();
        }
        self.state.is_open = true;
        self.sync_scroll_hold();
        vec![PresentationEvent::PanelOpened(self.state.display_mode)]
    }

    fn close(&mut self) -> Vec<PresentationEvent> {
        if !self.state.is_open {
            return Vec::new();
        }
        self.state.is_open = false;
        self.sync_scroll_hold();
        vec![PresentationEvent::PanelClosed(self.state.display_mode)]
    }

    fn sync_scroll_hold(&mut self) {
        if self.state.overlay_active() {
            if self.scroll_hold.is_none() {
                self.scroll_hold = Some(self.scroll.suspend());
            }
        } else {
            self.scroll_hold = None;
        }
    }
}
