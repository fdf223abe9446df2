//! Help overlay: key table grouped by screen.

use crate::app::App;
use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

use super::render::centered_rect;

/// Section label and its (key, description) rows, in display order.
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("Tab / S-Tab", "Next / previous tab"),
            ("t", "Cycle theme"),
            ("?", "Toggle this help"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
    (
        "Home",
        &[
            ("j/k, wheel", "Move through posts"),
            ("Enter", "Open post"),
            ("/", "Search titles"),
            ("Esc", "Clear search"),
            ("1-7", "Toggle category"),
            ("[ / ]", "Previous / next featured post"),
            ("c", "Open featured post"),
            ("r", "Refresh feed"),
        ],
    ),
    (
        "Post",
        &[
            ("j/k, PgUp/PgDn", "Scroll"),
            ("o", "Open image in browser"),
            ("r", "Reload"),
            ("b / Esc", "Back to feed"),
        ],
    ),
    (
        "People",
        &[
            ("j/k", "Move through members"),
            ("Enter", "Open member"),
            ("/", "Search usernames"),
            ("r", "Reload directory"),
            ("b / Esc", "Back from member"),
        ],
    ),
    (
        "Profile",
        &[
            ("j/k", "Select field"),
            ("e / Enter", "Edit field"),
            ("s", "Update profile"),
            ("p", "Change picture"),
            ("x", "Log out"),
        ],
    ),
];

/// Render the help overlay on top of the current screen.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 90, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    // Clear the background behind the overlay
    f.render_widget(Clear, overlay);

    let palette = &app.palette;
    let mut rows: Vec<Row> = Vec::new();
    for (label, bindings) in SECTIONS {
        rows.push(
            Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {} --", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(palette.detail_heading),
        );
        for (key, description) in *bindings {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let widths = [Constraint::Length(18), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.panel_border_focused)
                .title(" Help (? to close) "),
        )
        .style(palette.detail_body);

    f.render_widget(table, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_section_has_bindings() {
        for (label, bindings) in SECTIONS {
            assert!(!bindings.is_empty(), "{} has no bindings", label);
        }
    }
}
