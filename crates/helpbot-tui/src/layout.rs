// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use helpbot_app::{Anchor, HitTarget, PanelPlacement, PanelTarget, SidebarEdge, WidgetVisual};
use ratatui::layout::{Margin, Position, Rect};

const MARGIN: u16 = 1;
pub(crate) const TOGGLE_WIDTH: u16 = 5;
pub(crate) const TOGGLE_HEIGHT: u16 = 3;
const WIDGET_PANEL_WIDTH: u16 = 52;
const WIDGET_PANEL_HEIGHT: u16 = 26;
const SIDEBAR_WIDTH: u16 = 60;
pub(crate) const ANALYZE_LABEL: &str = "[ Analyze Error ]";
pub(crate) const ANALYZING_LABEL: &str = "[ Analyzing... ]";

/// Screen regions of the widget for one frame. Rendering and pointer
/// hit-testing both read from this, so they cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WidgetLayout {
    pub toggle: Rect,
    pub overlay: Option<Rect>,
    pub panel: Option<Rect>,
    pub header: Option<Rect>,
    pub mode_toggle: Option<Rect>,
    pub input_label: Option<Rect>,
    pub input: Option<Rect>,
    pub analyze: Option<Rect>,
    pub body: Option<Rect>,
    pub suggestions_label: Option<Rect>,
    pub suggestions: Vec<Rect>,
}

pub(crate) fn widget_layout(
    area: Rect,
    visual: &WidgetVisual,
    suggestion_count: usize,
) -> WidgetLayout {
    let mut toggle = corner_rect(area, visual.anchor, TOGGLE_WIDTH, TOGGLE_HEIGHT);
    let mut layout = WidgetLayout::default();

    if visual.state.panel_visible() {
        let panel = match visual.placement {
            PanelPlacement::Floating(anchor) => floating_panel_rect(area, anchor, toggle),
            PanelPlacement::Docked(edge) => docked_panel_rect(area, edge),
        };

        if let PanelPlacement::Docked(edge) = visual.placement {
            layout.overlay = overlay_rect(area, panel, edge);
            if toggle.intersects(panel) {
                toggle = beside_panel(toggle, panel, edge, area);
            }
        }

        fill_panel_regions(&mut layout, panel, visual.mode_label, suggestion_count);
        layout.panel = Some(panel);
    }

    layout.toggle = toggle;
    layout
}

pub(crate) fn hit_test(layout: &WidgetLayout, column: u16, row: u16) -> HitTarget {
    let position = Position::new(column, row);
    if layout.toggle.contains(position) {
        return HitTarget::Toggle;
    }

    if let Some(panel) = layout.panel
        && panel.contains(position)
    {
        let inside = |rect: Option<Rect>| rect.is_some_and(|rect| rect.contains(position));
        let target = if inside(layout.mode_toggle) {
            PanelTarget::ModeToggle
        } else if inside(layout.input) {
            PanelTarget::Input
        } else if inside(layout.analyze) {
            PanelTarget::AnalyzeButton
        } else if let Some(index) = layout
            .suggestions
            .iter()
            .position(|rect| rect.contains(position))
        {
            PanelTarget::Suggestion(index)
        } else {
            PanelTarget::Body
        };
        return HitTarget::Panel(target);
    }

    if let Some(overlay) = layout.overlay
        && overlay.contains(position)
    {
        return HitTarget::Overlay;
    }
    HitTarget::Page
}

fn corner_rect(area: Rect, anchor: Anchor, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let spare_x = area.width - width;
    let spare_y = area.height - height;
    let x = if anchor.is_left() {
        area.x + MARGIN.min(spare_x)
    } else {
        area.x + spare_x.saturating_sub(MARGIN)
    };
    let y = if anchor.is_top() {
        area.y + MARGIN.min(spare_y)
    } else {
        area.y + spare_y.saturating_sub(MARGIN)
    };
    Rect::new(x, y, width, height)
}

fn floating_panel_rect(area: Rect, anchor: Anchor, toggle: Rect) -> Rect {
    let region = if anchor.is_top() {
        let top = toggle.bottom().min(area.bottom());
        Rect::new(area.x, top, area.width, area.bottom() - top)
    } else {
        let bottom = toggle.y.max(area.y);
        Rect::new(area.x, area.y, area.width, bottom - area.y)
    };
    corner_rect(region, anchor, WIDGET_PANEL_WIDTH, WIDGET_PANEL_HEIGHT)
}

fn docked_panel_rect(area: Rect, edge: SidebarEdge) -> Rect {
    let width = SIDEBAR_WIDTH.min(area.width);
    let x = match edge {
        SidebarEdge::Left => area.x,
        SidebarEdge::Right => area.right() - width,
    };
    Rect::new(x, area.y, width, area.height)
}

fn overlay_rect(area: Rect, panel: Rect, edge: SidebarEdge) -> Option<Rect> {
    let width = area.width - panel.width;
    if width == 0 {
        return None;
    }
    let x = match edge {
        SidebarEdge::Left => panel.right(),
        SidebarEdge::Right => area.x,
    };
    Some(Rect::new(x, area.y, width, area.height))
}

fn beside_panel(toggle: Rect, panel: Rect, edge: SidebarEdge, area: Rect) -> Rect {
    let x = match edge {
        SidebarEdge::Left => panel
            .right()
            .min(area.right().saturating_sub(toggle.width)),
        SidebarEdge::Right => panel.x.saturating_sub(toggle.width).max(area.x),
    };
    Rect::new(x, toggle.y, toggle.width, toggle.height)
}

fn fill_panel_regions(
    layout: &mut WidgetLayout,
    panel: Rect,
    mode_label: &str,
    suggestion_count: usize,
) {
    let inner = panel.inner(Margin::new(1, 1));
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let row = |offset: u16| -> Option<Rect> {
        let y = inner.y.checked_add(offset)?;
        (y < inner.bottom()).then(|| Rect::new(inner.x, y, inner.width, 1))
    };

    layout.header = row(0);
    let mode_width = (mode_label.chars().count() as u16 + 2).min(inner.width);
    layout.mode_toggle = layout.header.map(|header| {
        Rect::new(header.right() - mode_width, header.y, mode_width, 1)
    });
    layout.input_label = row(2);
    layout.input = row(3);
    let analyze_width = (ANALYZE_LABEL.chars().count() as u16).min(inner.width);
    layout.analyze = row(4).map(|line| Rect::new(line.x, line.y, analyze_width, 1));

    let body_top = inner.y.saturating_add(6);
    if body_top >= inner.bottom() {
        return;
    }
    let available = inner.bottom() - body_top;

    // Suggestions take the bottom rows and keep at least two rows of body.
    let mut suggestion_rows = 0;
    if suggestion_count > 0 && available > 4 {
        let max_rows = available - 4;
        suggestion_rows = (suggestion_count as u16).min(max_rows);
    }
    let reserved = if suggestion_rows > 0 {
        suggestion_rows + 2
    } else {
        0
    };

    layout.body = Some(Rect::new(
        inner.x,
        body_top,
        inner.width,
        available - reserved,
    ));
    if suggestion_rows > 0 {
        let label_y = inner.bottom() - suggestion_rows - 1;
        layout.suggestions_label = Some(Rect::new(inner.x, label_y, inner.width, 1));
        layout.suggestions = (0..suggestion_rows)
            .map(|index| Rect::new(inner.x, label_y + 1 + index, inner.width, 1))
            .collect();
    }
}
