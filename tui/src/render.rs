//! Frame Rendering
//!
//! Pure projection of `(WatchState, WatchConfig)` into a terminal frame:
//! a status line, the annotated console panel, and a control legend.
//!
//! Each character's visual style is composed from two sources: the
//! per-cell style strategy (plain, recognizer-sampled color, or the error
//! style for the unrecognized placeholder) and the changed-cell highlight
//! overlay from the diff.

use std::time::Instant;

use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use termscope_core::{approximate, Cell, ChangeSet, StyleToken, WatchConfig, WatchState};

use crate::theme;

/// How a single cell resolves before the change overlay is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    /// Default terminal foreground.
    Plain,
    /// Foreground from the recognizer's color side channel.
    Colored(StyleToken),
    /// The unrecognized-character placeholder, always distinct.
    ErrorHighlight,
}

/// Pick the style strategy for one cell.
///
/// The placeholder wins regardless of color mode; otherwise the sampled
/// color is used only when color mode is enabled and a sample exists.
#[must_use]
pub fn resolve(cell: &Cell, color_mode: bool) -> CellStyle {
    if cell.is_unrecognized() {
        CellStyle::ErrorHighlight
    } else if color_mode {
        match cell.color {
            Some(rgb) => CellStyle::Colored(approximate(rgb)),
            None => CellStyle::Plain,
        }
    } else {
        CellStyle::Plain
    }
}

/// Combine a cell's style strategy with the change-highlight overlay.
#[must_use]
pub fn compose(style: CellStyle, changed: bool) -> Style {
    let base = match style {
        CellStyle::Plain => Style::default(),
        CellStyle::Colored(token) => Style::default().fg(token_color(token)),
        CellStyle::ErrorHighlight => Style::default()
            .fg(theme::ERROR_FG)
            .add_modifier(Modifier::BOLD),
    };

    if changed {
        base.bg(theme::CHANGE_HIGHLIGHT)
    } else {
        base
    }
}

/// Map a color category onto the terminal's own palette.
#[must_use]
pub fn token_color(token: StyleToken) -> Color {
    match token {
        StyleToken::Black => Color::Black,
        StyleToken::Red => Color::Red,
        StyleToken::Green => Color::Green,
        StyleToken::Yellow => Color::Yellow,
        StyleToken::Blue => Color::Blue,
        StyleToken::Magenta => Color::Magenta,
        StyleToken::Cyan => Color::Cyan,
        StyleToken::White => Color::Gray,
        StyleToken::BrightBlack => Color::DarkGray,
        StyleToken::BrightRed => Color::LightRed,
        StyleToken::BrightGreen => Color::LightGreen,
        StyleToken::BrightYellow => Color::LightYellow,
        StyleToken::BrightBlue => Color::LightBlue,
        StyleToken::BrightMagenta => Color::LightMagenta,
        StyleToken::BrightCyan => Color::LightCyan,
        StyleToken::BrightWhite => Color::White,
    }
}

/// Draw one full frame.
pub fn draw(frame: &mut Frame, state: &WatchState, config: &WatchConfig, now: Instant) {
    let [status_area, content_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(status_line(state, config, now), status_area);

    match &state.current {
        Some(_) => {
            let lines = content_lines(state, config);
            frame.render_widget(Paragraph::new(lines), content_area);
        }
        None => {
            let waiting = Paragraph::new(Line::from(Span::styled(
                "waiting for first capture...",
                Style::default().fg(theme::WAITING_FG),
            )));
            frame.render_widget(waiting, content_area);
        }
    }

    frame.render_widget(footer(), footer_area);
}

/// Status line: generation, counters, sample age, configured cadence.
fn status_line<'a>(state: &WatchState, config: &WatchConfig, now: Instant) -> Paragraph<'a> {
    let age = match state.seconds_since_sample(now) {
        Some(secs) => format!("{secs}s ago"),
        None => "never".to_string(),
    };

    let status = format!(
        " gen {} | samples {} | changed cells {} | last sample {} | every {:.1}s",
        state.generation,
        state.total_samples,
        state.total_changed_cells,
        age,
        config.refresh_interval_secs,
    );

    Paragraph::new(Line::from(Span::styled(
        status,
        Style::default().fg(theme::STATUS_FG),
    )))
}

/// One rendered line per console row, styled cell by cell.
///
/// Rows keep their console index for numbering and change lookup even
/// when blank-line filtering drops some of them from the panel.
pub fn content_lines<'a>(state: &'a WatchState, config: &WatchConfig) -> Vec<Line<'a>> {
    let Some(grid) = &state.current else {
        return Vec::new();
    };

    let gutter_width = digits(grid.len().saturating_sub(1).max(1));
    let mut lines = Vec::new();

    for (row, cells) in grid.rows().iter().enumerate() {
        if config.filter_blank_lines && grid.is_blank_row(row) {
            continue;
        }

        let mut spans = Vec::with_capacity(cells.len() + 1);

        if config.show_line_numbers {
            spans.push(Span::styled(
                format!("{row:>gutter_width$} "),
                Style::default().fg(theme::GUTTER_FG),
            ));
        }

        spans.extend(cells.iter().enumerate().map(|(col, cell)| {
            let style = compose(
                resolve(cell, config.color_mode),
                state.changes.contains(row, col),
            );
            Span::styled(cell.ch.to_string(), style)
        }));

        lines.push(Line::from(spans));
    }

    lines
}

/// Static control legend.
fn footer<'a>() -> Paragraph<'a> {
    Paragraph::new(Line::from(Span::styled(
        " q quit | r refresh now | any other key: accept screen as new baseline",
        Style::default().fg(theme::DIM_GRAY),
    )))
}

fn digits(mut n: usize) -> usize {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}
