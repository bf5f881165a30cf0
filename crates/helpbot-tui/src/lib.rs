// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod layout;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use helpbot_app::{
    AnalysisResult, HelpBot, HitTarget, HostPage, LOADING_TEXT, PanelTarget, PanelView,
    PresentationEvent, QueryTicket, ResultView, Severity, Theme, WidgetCommand, WidgetConfig,
    WidgetEvent,
};
use layout::{ANALYZE_LABEL, ANALYZING_LABEL, WidgetLayout, hit_test, widget_layout};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const HOST_PAGE_LINES: u16 = 120;
const PAGE_STEP: u16 = 10;
const WHEEL_STEP: u16 = 3;
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);
const DROPPED_REPLY_MESSAGE: &str = "analysis worker stopped before replying";

/// How the host page starts: the widget settings and whether to mount the
/// widget before the first frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Launch {
    pub config: WidgetConfig,
    pub auto_init: bool,
}

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Reopen {
        token: u64,
    },
    Analysis {
        request_id: u64,
        outcome: Result<AnalysisResult, String>,
    },
}

/// One-shot reply slot for an analysis request. Dropping it unsent reports a
/// failure, so a worker that errors out or panics still settles the request.
#[derive(Debug)]
pub struct AnalysisReply {
    request_id: u64,
    tx: Sender<InternalEvent>,
    sent: bool,
}

impl AnalysisReply {
    pub fn new(request_id: u64, tx: Sender<InternalEvent>) -> Self {
        Self {
            request_id,
            tx,
            sent: false,
        }
    }

    pub const fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn send(mut self, outcome: Result<AnalysisResult, String>) {
        self.sent = true;
        let _ = self.tx.send(InternalEvent::Analysis {
            request_id: self.request_id,
            outcome,
        });
    }
}

impl Drop for AnalysisReply {
    fn drop(&mut self) {
        if self.sent {
            return;
        }
        tracing::warn!(request_id = self.request_id, "analysis reply dropped unsent");
        let _ = self.tx.send(InternalEvent::Analysis {
            request_id: self.request_id,
            outcome: Err(DROPPED_REPLY_MESSAGE.to_owned()),
        });
    }
}

pub trait AppRuntime {
    fn run_analysis(&mut self, query: &str) -> Result<AnalysisResult>;
    fn spawn_analysis(&mut self, ticket: &QueryTicket, reply: AnalysisReply) -> Result<()> {
        let outcome = self
            .run_analysis(&ticket.query)
            .map_err(|error| error.to_string());
        reply.send(outcome);
        Ok(())
    }
}

#[derive(Debug)]
struct ViewData {
    config: WidgetConfig,
    area: Rect,
    page_offset: u16,
    suggestion_cursor: usize,
    status: Option<String>,
    status_token: u64,
}

impl ViewData {
    fn new(config: WidgetConfig) -> Self {
        Self {
            config,
            area: Rect::default(),
            page_offset: 0,
            suggestion_cursor: 0,
            status: None,
            status_token: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    page: Style,
    panel: Style,
    accent: Style,
    muted: Style,
    heading: Style,
    error: Style,
    overlay: Style,
    highlight: Style,
    status: Style,
}

fn palette(theme: Theme) -> Palette {
    let (fg, bg, accent, muted) = match theme {
        Theme::Default => (Color::Reset, Color::Reset, Color::Cyan, Color::DarkGray),
        Theme::Dark => (Color::White, Color::Black, Color::LightBlue, Color::Gray),
        Theme::Light => (Color::Black, Color::White, Color::Blue, Color::DarkGray),
    };
    let base = Style::default().fg(fg).bg(bg);
    Palette {
        page: Style::default(),
        panel: base,
        accent: base.fg(accent),
        muted: base.fg(muted),
        heading: base.fg(accent).add_modifier(Modifier::BOLD),
        error: base.fg(Color::Red),
        overlay: Style::default().add_modifier(Modifier::DIM),
        highlight: base.fg(bg_or_black(bg)).bg(accent),
        status: Style::default().add_modifier(Modifier::REVERSED),
    }
}

fn bg_or_black(bg: Color) -> Color {
    if bg == Color::Reset { Color::Black } else { bg }
}

pub fn run_app<R: AppRuntime>(page: &mut HostPage, launch: &Launch, runtime: &mut R) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    let mut view_data = ViewData::new(launch.config.clone());
    if launch.auto_init {
        page.install(launch.config.clone());
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        process_internal_events(page, runtime, &mut view_data, &internal_tx, &internal_rx);

        match terminal.size() {
            Ok(size) => view_data.area = Rect::new(0, 0, size.width, size.height),
            Err(error) => {
                result = Err(error).context("read terminal size");
                break;
            }
        }
        if let Err(error) = terminal.draw(|frame| render(frame, page, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(page, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(page, runtime, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    page: &mut HostPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Reopen { token } => {
                dispatch_widget(
                    page,
                    runtime,
                    view_data,
                    tx,
                    WidgetCommand::CompleteReopen { token },
                );
            }
            InternalEvent::Analysis {
                request_id,
                outcome,
            } => {
                if let Err(error) = &outcome {
                    tracing::warn!(request_id, %error, "analysis failed");
                }
                dispatch_widget(
                    page,
                    runtime,
                    view_data,
                    tx,
                    WidgetCommand::QueryFinished {
                        request_id,
                        outcome,
                    },
                );
            }
        }
    }
}

fn dispatch_widget<R: AppRuntime>(
    page: &mut HostPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: WidgetCommand,
) {
    let Some(widget) = page.widget_mut() else {
        return;
    };
    let events = widget.dispatch(command);
    for event in events {
        match event {
            WidgetEvent::Presentation(PresentationEvent::ReopenScheduled { token, delay }) => {
                schedule_reopen(tx, token, delay);
            }
            WidgetEvent::Presentation(PresentationEvent::ModeChanged(mode)) => {
                emit_status(view_data, tx, format!("{} mode", mode.as_str()));
            }
            WidgetEvent::Presentation(
                PresentationEvent::PanelOpened(_) | PresentationEvent::PanelClosed(_),
            ) => {}
            WidgetEvent::QueryRequested(ticket) => {
                view_data.suggestion_cursor = 0;
                start_analysis(runtime, view_data, tx, &ticket);
            }
            WidgetEvent::ValidationFailed(_) => {}
            WidgetEvent::SubmitRejected { .. } => {
                emit_status(view_data, tx, "analysis already in progress");
            }
            WidgetEvent::SuggestionApplied(_) => {
                emit_status(view_data, tx, "suggestion copied; press Enter to analyze");
            }
            WidgetEvent::QuerySettled { succeeded, .. } => {
                view_data.suggestion_cursor = 0;
                let status = if succeeded {
                    "analysis complete"
                } else {
                    "analysis failed"
                };
                emit_status(view_data, tx, status);
            }
        }
    }
}

fn start_analysis<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    ticket: &QueryTicket,
) {
    tracing::info!(request_id = ticket.request_id, "analysis requested");
    let reply = AnalysisReply::new(ticket.request_id, tx.clone());
    if let Err(error) = runtime.spawn_analysis(ticket, reply) {
        tracing::error!(request_id = ticket.request_id, %error, "analysis could not start");
        emit_status(view_data, tx, format!("analysis could not start: {error}"));
    }
}

fn schedule_reopen(internal_tx: &Sender<InternalEvent>, token: u64, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::Reopen { token });
    });
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    page: &mut HostPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match key.code {
        KeyCode::F(1) => {
            if page.widget().is_some() {
                dispatch_widget(page, runtime, view_data, internal_tx, WidgetCommand::TogglePanel);
            } else {
                page.install(view_data.config.clone());
                emit_status(view_data, internal_tx, "HelpBot loaded; press F1 to open");
            }
            return false;
        }
        KeyCode::F(2) => {
            dispatch_widget(page, runtime, view_data, internal_tx, WidgetCommand::ToggleMode);
            return false;
        }
        KeyCode::PageUp => {
            scroll_page(page, view_data, -i32::from(PAGE_STEP));
            return false;
        }
        KeyCode::PageDown => {
            scroll_page(page, view_data, i32::from(PAGE_STEP));
            return false;
        }
        _ => {}
    }

    let Some(widget) = page.widget_mut().filter(|widget| widget.state().is_open) else {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => scroll_page(page, view_data, -1),
            KeyCode::Down => scroll_page(page, view_data, 1),
            KeyCode::Home => scroll_page(page, view_data, -i32::from(HOST_PAGE_LINES)),
            KeyCode::End => scroll_page(page, view_data, i32::from(HOST_PAGE_LINES)),
            _ => {}
        }
        return false;
    };

    let command = match key.code {
        KeyCode::Esc => Some(WidgetCommand::ClosePanel),
        KeyCode::Enter => Some(WidgetCommand::Analyze),
        KeyCode::Tab => Some(WidgetCommand::SelectSuggestion(view_data.suggestion_cursor)),
        KeyCode::Up => {
            view_data.suggestion_cursor = view_data.suggestion_cursor.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            let count = widget.suggestions().len();
            if count > 0 {
                view_data.suggestion_cursor = (view_data.suggestion_cursor + 1).min(count - 1);
            }
            None
        }
        KeyCode::Backspace => {
            widget.input_mut().pop();
            None
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            widget.input_mut().push(ch);
            None
        }
        _ => None,
    };
    if let Some(command) = command {
        dispatch_widget(page, runtime, view_data, internal_tx, command);
    }
    false
}

fn handle_mouse_event<R: AppRuntime>(
    page: &mut HostPage,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    let target = hit_target(page, view_data, mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(target) = target else {
                return;
            };
            if let HitTarget::Panel(PanelTarget::Suggestion(index)) = target {
                view_data.suggestion_cursor = index;
            }
            dispatch_widget(
                page,
                runtime,
                view_data,
                internal_tx,
                WidgetCommand::Interact(target),
            );
        }
        MouseEventKind::ScrollUp if !matches!(target, Some(HitTarget::Panel(_))) => {
            scroll_page(page, view_data, -i32::from(WHEEL_STEP));
        }
        MouseEventKind::ScrollDown if !matches!(target, Some(HitTarget::Panel(_))) => {
            scroll_page(page, view_data, i32::from(WHEEL_STEP));
        }
        _ => {}
    }
}

fn hit_target(page: &HostPage, view_data: &ViewData, column: u16, row: u16) -> Option<HitTarget> {
    let widget = page.widget()?;
    let (page_area, _) = split_screen(view_data.area);
    let layout = current_layout(widget, page_area);
    Some(hit_test(&layout, column, row))
}

/// Moves the host page unless the sidebar holds it still.
fn scroll_page(page: &HostPage, view_data: &mut ViewData, delta: i32) {
    if page.scroll().is_suspended() {
        return;
    }
    let max_offset = i32::from(HOST_PAGE_LINES.saturating_sub(1));
    let next = (i32::from(view_data.page_offset) + delta).clamp(0, max_offset);
    view_data.page_offset = u16::try_from(next).unwrap_or(0);
}

fn split_screen(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn current_layout(widget: &HelpBot, area: Rect) -> WidgetLayout {
    widget_layout(area, &widget.visual(), widget.suggestions().len())
}

fn render(frame: &mut ratatui::Frame<'_>, page: &HostPage, view_data: &ViewData) {
    let palette = palette(view_data.config.theme);
    let (page_area, status_area) = split_screen(frame.area());

    let host = Paragraph::new(host_page_lines())
        .style(palette.page)
        .scroll((view_data.page_offset, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" service console "),
        );
    frame.render_widget(host, page_area);

    if let Some(widget) = page.widget() {
        let layout = current_layout(widget, page_area);
        if let Some(overlay) = layout.overlay {
            frame.render_widget(Block::default().style(palette.overlay), overlay);
        }
        render_panel(frame, widget, &layout, &palette, view_data.suggestion_cursor);
        render_toggle(frame, widget, layout.toggle, &palette);
    }

    frame.render_widget(
        Paragraph::new(status_text(page, view_data)).style(palette.status),
        status_area,
    );
}

fn render_toggle(frame: &mut ratatui::Frame<'_>, widget: &HelpBot, area: Rect, palette: &Palette) {
    let visual = widget.visual();
    let style = if visual.toggle_active {
        palette.highlight
    } else {
        palette.accent
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(visual.toggle_glyph)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style)),
        area,
    );
}

fn render_panel(
    frame: &mut ratatui::Frame<'_>,
    widget: &HelpBot,
    layout: &WidgetLayout,
    palette: &Palette,
    suggestion_cursor: usize,
) {
    let Some(panel) = layout.panel else {
        return;
    };
    let visual = widget.visual();
    let view = widget.panel_view();

    frame.render_widget(Clear, panel);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(" HelpBot ")
            .border_style(palette.accent)
            .style(palette.panel),
        panel,
    );

    if let Some(header) = layout.header {
        frame.render_widget(
            Paragraph::new("AI Error Assistant").style(palette.heading),
            header,
        );
    }
    if let Some(mode_toggle) = layout.mode_toggle {
        frame.render_widget(
            Paragraph::new(format!("[{}]", visual.mode_label)).style(palette.accent),
            mode_toggle,
        );
    }
    if let Some(label) = layout.input_label {
        frame.render_widget(
            Paragraph::new("Describe the error you are seeing:").style(palette.muted),
            label,
        );
    }
    if let Some(input) = layout.input {
        frame.render_widget(
            Paragraph::new(format!("> {}_", widget.input())).style(palette.panel),
            input,
        );
    }
    if let Some(analyze) = layout.analyze {
        let (label, style) = if view.submit_enabled {
            (ANALYZE_LABEL, palette.highlight)
        } else {
            (ANALYZING_LABEL, palette.muted)
        };
        frame.render_widget(Paragraph::new(label).style(style), analyze);
    }
    if let Some(body) = layout.body {
        frame.render_widget(
            Paragraph::new(panel_body_lines(&view, palette))
                .style(palette.panel)
                .wrap(Wrap { trim: false }),
            body,
        );
    }
    if let Some(label) = layout.suggestions_label {
        frame.render_widget(
            Paragraph::new("Related queries (Up/Down, Tab to use):").style(palette.muted),
            label,
        );
    }
    for (index, (rect, suggestion)) in layout
        .suggestions
        .iter()
        .zip(widget.suggestions())
        .enumerate()
    {
        let style = if index == suggestion_cursor {
            palette.highlight
        } else {
            palette.accent
        };
        frame.render_widget(Paragraph::new(format!("  {suggestion}")).style(style), *rect);
    }
}

fn panel_body_lines(view: &PanelView, palette: &Palette) -> Vec<Line<'static>> {
    if view.loading {
        return vec![Line::styled(LOADING_TEXT, palette.muted)];
    }
    if let Some(error) = &view.error {
        return vec![Line::styled(error.clone(), palette.error)];
    }
    match &view.results {
        Some(results) => result_lines(results, palette),
        None => vec![Line::styled(
            "Paste an error message and press Enter to analyze it.",
            palette.muted,
        )],
    }
}

fn result_lines(results: &ResultView, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled("Your issue", palette.heading)];
    push_text(&mut lines, &results.user_issue, palette.panel);

    if let Some(meta) = &results.meta {
        let mut badges = Vec::new();
        if let Some(severity) = meta.severity {
            badges.push(Span::styled(
                format!("[{}]", severity.badge()),
                severity_style(severity, palette),
            ));
        }
        if let Some(category) = &meta.category {
            badges.push(Span::styled(format!("[{category}]"), palette.accent));
        }
        if let Some(enhanced) = meta.enhanced {
            badges.push(Span::styled(format!("[{enhanced}]"), palette.muted));
        }
        let mut spans = Vec::with_capacity(badges.len() * 2);
        for (index, badge) in badges.into_iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(badge);
        }
        lines.push(Line::from(spans));
    }

    if let Some(response) = &results.conversational_response {
        lines.push(Line::default());
        lines.push(Line::styled("AI Assistant", palette.heading));
        push_text(&mut lines, response, palette.panel);
    }

    lines.push(Line::default());
    lines.push(Line::styled("Explanation", palette.heading));
    push_text(&mut lines, &results.explanation, palette.panel);

    lines.push(Line::default());
    lines.push(Line::styled("Resolution steps", palette.heading));
    push_text(&mut lines, &results.resolution_steps, palette.panel);
    lines
}

fn push_text(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    lines.extend(text.lines().map(|line| Line::styled(line.to_owned(), style)));
}

fn severity_style(severity: Severity, palette: &Palette) -> Style {
    match severity {
        Severity::High => palette.panel.fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::Medium => palette.panel.fg(Color::Yellow),
        Severity::Low => palette.panel.fg(Color::Green),
    }
}

fn status_text(page: &HostPage, view_data: &ViewData) -> String {
    if let Some(status) = &view_data.status {
        return status.clone();
    }
    match page.widget() {
        None => "F1 load HelpBot | arrows/PgUp/PgDn scroll | q quit".to_owned(),
        Some(widget) if widget.state().is_open => {
            let mut text = "Enter analyze | Tab use suggestion | F2 mode | Esc close".to_owned();
            if page.scroll().is_suspended() {
                text.push_str(" | page scroll locked");
            }
            text
        }
        Some(_) => "F1 HelpBot | F2 mode | arrows/PgUp/PgDn scroll | q quit".to_owned(),
    }
}

fn host_page_lines() -> Vec<Line<'static>> {
    (1..=HOST_PAGE_LINES)
        .map(|line| {
            let worker = line % 4 + 1;
            if line % 9 == 0 {
                Line::styled(
                    format!(
                        "{line:>4}  ERROR worker-{worker}: database connection timeout after 30s"
                    ),
                    Style::default().fg(Color::Red),
                )
            } else if line % 13 == 0 {
                Line::styled(
                    format!("{line:>4}  WARN  worker-{worker}: heap usage at 92%"),
                    Style::default().fg(Color::Yellow),
                )
            } else {
                Line::raw(format!(
                    "{line:>4}  INFO  worker-{worker}: processed batch {}",
                    line * 17
                ))
            }
        })
        .collect()
}
