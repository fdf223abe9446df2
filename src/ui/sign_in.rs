//! Sign-in screen.

use crate::app::{App, SignInField};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render::{centered_rect, fit_text};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let form = &app.sign_in;

    let mut panel = centered_rect(60, 80, area);
    panel.height = panel.height.min(14);
    if panel.width < 20 || panel.height < 8 {
        return;
    }
    let field_width = usize::from(panel.width.saturating_sub(14));

    let field_line = |label: &'static str, value: String, field: SignInField| {
        let focused = form.field == field;
        let label_style = if focused {
            palette.form_focused
        } else {
            palette.form_label
        };
        let cursor = if focused && !form.submitting { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<10}", label), label_style),
            Span::styled(format!("{}{}", value, cursor), palette.form_value),
        ])
    };

    let masked = "•".repeat(form.password.chars().count().min(field_width));
    let mut lines = vec![
        Line::from(vec![
            Span::styled("S", palette.brand_accent),
            Span::styled("arvail", palette.brand_text),
        ])
        .alignment(Alignment::Center),
        Line::from(Span::styled("Welcome back, sign in to continue", palette.muted))
            .alignment(Alignment::Center),
        Line::from(""),
        field_line("Email", fit_text(&form.username, field_width), SignInField::Username),
        Line::from(""),
        field_line("Password", masked, SignInField::Password),
        Line::from(""),
    ];

    if form.submitting {
        lines.push(Line::from(Span::styled("Signing in...", palette.muted)));
    } else {
        lines.push(Line::from(Span::styled(" Enter: Sign In ", palette.button)));
    }
    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.clone(), palette.error)));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.panel_border_focused)
            .title(" Sign In "),
    );
    f.render_widget(paragraph, panel);
}
