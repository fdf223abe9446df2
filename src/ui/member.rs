//! Member detail screen.

use crate::api::MemberDetail;
use crate::app::{App, LoadState};
use crate::theme::ColorPalette;
use crate::util::{initial_of, strip_control_chars};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render::{max_scroll, wrapped_height};

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let palette = &app.palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(" Member ");

    let lines = match &app.member {
        LoadState::Idle | LoadState::Loading => {
            f.render_widget(
                Paragraph::new("Loading member...").style(palette.muted).block(block),
                area,
            );
            return;
        }
        LoadState::Failed(error) => {
            f.render_widget(
                Paragraph::new(error.as_str())
                    .style(palette.error)
                    .wrap(Wrap { trim: true })
                    .block(block),
                area,
            );
            return;
        }
        LoadState::Loaded(detail) => member_lines(detail, palette),
    };

    let visible = usize::from(area.height.saturating_sub(2));
    let limit = max_scroll(wrapped_height(&lines, area.width.saturating_sub(2)), visible);
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    app.member_scroll = app.member_scroll.min(limit);
    let scroll = u16::try_from(app.member_scroll).unwrap_or(u16::MAX);
    f.render_widget(paragraph.scroll((scroll, 0)), area);
}

/// Heading, then the "Personal Details" rows. Absent values show as blank.
fn member_lines(detail: &MemberDetail, palette: &ColorPalette) -> Vec<Line<'static>> {
    let user = detail.user.clone().unwrap_or_default();
    let meta = detail.user_meta.clone().unwrap_or_default();
    let name = detail.name();
    let text = |v: &Option<String>| strip_control_chars(v.as_deref().unwrap_or("")).into_owned();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", initial_of(&name).unwrap_or('?')), palette.avatar),
            Span::raw(" "),
            Span::styled(strip_control_chars(&name).into_owned(), palette.member_name),
        ]),
    ];
    if let Some(batch) = &user.ds_batch {
        lines.push(Line::from(Span::styled(
            format!("Batch {}", strip_control_chars(batch)),
            palette.post_meta,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Personal Details", palette.detail_heading)));
    lines.push(Line::from(""));

    let rows = [
        ("First Name", text(&meta.first_name)),
        ("Batch", text(&user.ds_batch)),
        ("Email", text(&user.user_email)),
        ("Mobile (Res)", text(&meta.ds_res_mobile)),
        ("Mobile (Off)", text(&meta.ds_off_mobile)),
        ("Profession", text(&user.ds_profession)),
        (
            "Address",
            strip_control_chars(&meta.address().unwrap_or_default()).into_owned(),
        ),
    ];
    for (label, value) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14}", label), palette.form_label),
            Span::styled(value, palette.form_value),
        ]));
    }
    lines
}
