//! Render functions for the TUI.
//!
//! This module handles the screen chrome (header, tab bar, status bar) and
//! dispatches the body to the renderer of the current screen.

use crate::app::{App, Screen, Tab};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::loop_runner::SPINNER_FRAMES;
use super::{detail, help, home, member, people, profile, sign_in, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 12;

const SPINNER: [&str; SPINNER_FRAMES] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main render dispatch function.
///
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);

    match app.screen {
        Screen::SignIn => sign_in::render(f, app, chunks[1]),
        Screen::Home => home::render(f, app, chunks[1]),
        Screen::Detail => detail::render(f, app, chunks[1]),
        Screen::People => people::render(f, app, chunks[1]),
        Screen::MemberDetail => member::render(f, app, chunks[1]),
        Screen::Profile => profile::render(f, app, chunks[1]),
    }

    status::render(f, app, chunks[2]);

    // Render help overlay on top of any screen when active
    if app.show_help {
        help::render(f, app);
    }
}

/// Wordmark on the left, tab bar next to it, spinner on the right.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let mut spans = vec![
        Span::styled(" S", palette.brand_accent),
        Span::styled("arvail", palette.brand_text),
        Span::raw("   "),
    ];

    if let Some(current) = app.screen.tab() {
        for tab in Tab::ALL {
            let style = if tab == current {
                palette.tab_active
            } else {
                palette.tab
            };
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
            spans.push(Span::raw(" "));
        }
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);

    if app.is_busy() {
        let frame = SPINNER[app.spinner_frame % SPINNER_FRAMES];
        let spinner = Paragraph::new(format!("{} ", frame))
            .style(palette.muted)
            .alignment(Alignment::Right);
        f.render_widget(spinner, area);
    }
}

// ============================================================================
// Shared layout helpers
// ============================================================================

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Number of terminal rows `lines` occupy when wrapped to `width` columns.
///
/// Word wrapping can spill a little more than this character count suggests;
/// the estimate only bounds scrolling.
pub(super) fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

/// Server text made safe for the terminal and cut to `max_width` columns.
pub(super) fn fit_text(raw: &str, max_width: usize) -> String {
    let clean = strip_control_chars(raw);
    truncate_to_width(&clean, max_width).into_owned()
}

/// Largest scroll offset that still shows a full page.
pub(super) fn max_scroll(content_rows: usize, visible_rows: usize) -> usize {
    content_rows.saturating_sub(visible_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_height_counts_blank_lines() {
        let lines = vec![Line::from("abcdef"), Line::from(""), Line::from("ab")];
        assert_eq!(wrapped_height(&lines, 4), 2 + 1 + 1);
    }

    #[test]
    fn test_wrapped_height_zero_width() {
        let lines = vec![Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 0), 3);
    }

    #[test]
    fn test_fit_text_strips_escapes_and_truncates() {
        assert_eq!(fit_text("\x1b[31mRed title here", 8), "Red t...");
        assert_eq!(fit_text("short", 10), "short");
    }

    #[test]
    fn test_max_scroll() {
        assert_eq!(max_scroll(10, 4), 6);
        assert_eq!(max_scroll(3, 4), 0);
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r, Rect::new(25, 10, 50, 20));
    }
}
