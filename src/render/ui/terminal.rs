//! Terminal UI implementation using ratatui
//!
//! Draws on stderr so stdout stays free for the selection. The layout is fixed: the prompt on
//! the first line, the match counter below it, and the results underneath with the best match
//! first.

use crate::error::Result;
use crate::render::ui::{ColorTheme, ResultRow, UIRenderer, ViewState};
use ratatui::crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stderr};

type CrosstermTerminal = Terminal<CrosstermBackend<Stderr>>;

const PROMPT: &str = "> ";
const POINTER: char = '>';
const MARKER: char = '*';

/// Terminal UI implementation with ratatui backend
pub struct TerminalUI {
    terminal: Option<CrosstermTerminal>,
    theme: ColorTheme,
}

impl TerminalUI {
    pub fn new() -> Result<Self> {
        Self::with_theme(ColorTheme::default())
    }

    /// Create terminal UI with custom theme
    pub fn with_theme(theme: ColorTheme) -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme,
        })
    }
}

/// Draw a whole frame. Split out from [`TerminalUI`] so any backend can be used.
pub fn draw_frame(frame: &mut Frame, view_state: &ViewState, theme: &ColorTheme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(frame.size());

    render_prompt(frame, chunks[0], view_state, theme);
    render_status(frame, chunks[1], view_state, theme);
    render_results(frame, chunks[2], view_state, theme);
}

fn render_prompt(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
    let line = Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(theme.prompt)),
        Span::styled(view_state.prompt.clone(), base_style(theme)),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let before_cursor: String = view_state
        .prompt
        .chars()
        .take(view_state.prompt_cursor)
        .collect();
    let offset = PROMPT.len() + Span::raw(before_cursor).width();
    let x = area
        .x
        .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
        .min(area.right().saturating_sub(1));
    frame.set_cursor(x, area.y);
}

fn render_status(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
    let status_style = Style::default().bg(theme.status_bg).fg(theme.status_fg);
    let mut spans = vec![Span::styled(view_state.format_status_line(), status_style)];
    if let Some(ref error) = view_state.status_line.error {
        spans.push(Span::styled(
            format!(" [{error}]"),
            Style::default().fg(theme.error_text),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_results(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
    let lines: Vec<Line> = view_state
        .rows
        .iter()
        .map(|row| result_line(row, theme))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn base_style(theme: &ColorTheme) -> Style {
    match theme.normal_text {
        Some(color) => Style::default().fg(color),
        None => Style::default(),
    }
}

fn result_line(row: &ResultRow, theme: &ColorTheme) -> Line<'static> {
    let (base, highlight) = if row.selected {
        (theme.selection, theme.selected_match)
    } else {
        (base_style(theme), theme.match_highlight)
    };

    let pointer = if row.selected { POINTER } else { ' ' };
    let marker = if row.marked { MARKER } else { ' ' };

    let mut spans = vec![
        Span::styled(pointer.to_string(), base.fg(theme.prompt)),
        Span::styled(marker.to_string(), base.fg(theme.marker)),
    ];
    spans.extend(highlighted_spans(&row.text, &row.positions, base, highlight));
    Line::from(spans)
}

/// Split `text` into runs of highlighted and plain chars.
///
/// `positions` are sorted char indices. Control chars are made visible so they cannot move the
/// terminal cursor.
pub fn highlighted_spans(
    text: &str,
    positions: &[usize],
    base: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_highlighted = false;
    let mut next = positions.iter().copied().peekable();

    for (index, c) in text.chars().enumerate() {
        let highlighted = next.peek() == Some(&index);
        if highlighted {
            next.next();
        }
        if highlighted != run_highlighted && !run.is_empty() {
            let style = if run_highlighted { highlight } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_highlighted = highlighted;
        run.push(printable(c));
    }

    if !run.is_empty() {
        let style = if run_highlighted { highlight } else { base };
        spans.push(Span::styled(run, style));
    }
    spans
}

fn printable(c: char) -> char {
    match c {
        '\t' => ' ',
        c if c.is_control() => '?',
        c => c,
    }
}

impl UIRenderer for TerminalUI {
    fn render(&mut self, view_state: &ViewState) -> Result<()> {
        if let Some(ref mut terminal) = self.terminal {
            let theme = &self.theme;
            terminal.draw(|frame| draw_frame(frame, view_state, theme))?;
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stderr = io::stderr();
        execute!(
            stderr,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;

        let backend = CrosstermBackend::new(stderr);
        let terminal = Terminal::new(backend)?;
        self.terminal = Some(terminal);

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if let Some(mut terminal) = self.terminal.take() {
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                DisableBracketedPaste,
                DisableMouseCapture,
                LeaveAlternateScreen
            )?;
            terminal.show_cursor()?;
        }
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = ratatui::crossterm::terminal::size()?;
        Ok((cols, rows))
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
