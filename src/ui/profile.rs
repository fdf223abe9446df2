//! Profile screen: avatar, editable form and the picture prompt.

use crate::app::App;
use crate::profile::ProfileField;
use crate::util::{initial_of, strip_control_chars};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::render::{centered_rect, fit_text};

const LABEL_WIDTH: usize = 14;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let palette = &app.palette;
    let profile = &app.profile;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // Heading: avatar initial, name, picture link
    let form = &profile.form;
    let display_name = form.display_name();
    let heading_name = if display_name.is_empty() {
        form.username.clone()
    } else {
        display_name
    };
    let picture = app
        .session
        .user()
        .and_then(|u| u.user.ds_profile_pic.as_deref())
        .unwrap_or("No profile picture");
    let inner_width = usize::from(chunks[0].width.saturating_sub(2));
    let heading = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", initial_of(&heading_name).unwrap_or('?')),
                palette.avatar,
            ),
            Span::raw(" "),
            Span::styled(strip_control_chars(&heading_name).into_owned(), palette.member_name),
        ]),
        Line::from(Span::styled(fit_text(picture, inner_width), palette.muted)),
    ];
    f.render_widget(
        Paragraph::new(heading).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.panel_border)
                .title(" Profile "),
        ),
        chunks[0],
    );

    // Form rows
    let value_width = inner_width.saturating_sub(LABEL_WIDTH + 1);
    let mut lines: Vec<Line> = Vec::with_capacity(ProfileField::ALL.len() + 2);
    for field in ProfileField::ALL {
        let focused = field == profile.field;
        let label_style = if focused {
            palette.form_focused
        } else {
            palette.form_label
        };
        let mut value = fit_text(form.field(field), value_width);
        if focused && profile.editing {
            value.push('_');
        }
        let value_style = if field.is_submitted() {
            palette.form_value
        } else {
            palette.muted
        };
        let marker = if focused { "›" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{:<width$}", marker, field.label(), width = LABEL_WIDTH), label_style),
            Span::styled(value, value_style),
        ]));
    }
    lines.push(Line::from(""));
    let update_label = if profile.saving { " Saving... " } else { " [s] Update " };
    lines.push(Line::from(vec![
        Span::styled(update_label, palette.button),
        Span::raw("  "),
        Span::styled(" [p] Picture ", palette.button),
        Span::raw("  "),
        Span::styled(" [x] Log Out ", palette.button),
    ]));

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if profile.editing {
                    palette.panel_border_focused
                } else {
                    palette.panel_border
                })
                .title(" Details "),
        ),
        chunks[1],
    );

    if let Some(input) = &profile.picture_input {
        render_picture_prompt(f, app, input);
    }
}

/// Centered one-line prompt for the new picture path or URL.
fn render_picture_prompt(f: &mut Frame, app: &App, input: &str) {
    let area = centered_rect(70, 30, f.area());
    let overlay = Rect {
        height: area.height.clamp(3, 5),
        ..area
    };
    if overlay.width < 10 {
        return;
    }
    f.render_widget(Clear, overlay);
    let palette = &app.palette;
    let prompt = Paragraph::new(vec![
        Line::from(Span::styled(format!("{}_", input), palette.form_value)),
        Line::from(Span::styled("Enter upload · Esc cancel", palette.muted)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.panel_border_focused)
            .title(" Profile picture (path or URL) "),
    );
    f.render_widget(prompt, overlay);
}
