//! Post detail screen.

use crate::app::{App, LoadState, MAX_SCROLL};
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
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
        .title(" Post ");

    let view = match &app.detail {
        LoadState::Idle | LoadState::Loading => {
            f.render_widget(Paragraph::new("Loading post...").style(palette.muted).block(block), area);
            return;
        }
        LoadState::Failed(error) => {
            let text = format!("Failed to load post: {}\n\nPress r to retry, Esc to go back", error);
            let paragraph = Paragraph::new(text)
                .style(palette.error)
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(paragraph, area);
            return;
        }
        LoadState::Loaded(view) => view,
    };

    let post = &view.post;
    let mut lines: Vec<Line> = Vec::with_capacity(view.body.lines.len() + 6);
    if let Some(category) = post.primary_category() {
        lines.push(Line::from(Span::styled(
            format!(" {} ", strip_control_chars(category)),
            palette.detail_category,
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        strip_control_chars(post.title_or_blank()).into_owned(),
        palette.detail_title,
    )));
    if let Some(date) = post.formatted_date() {
        lines.push(Line::from(Span::styled(date, palette.post_meta)));
    }
    lines.push(Line::from(""));
    match post.image("large") {
        Some(url) => lines.push(Line::from(vec![
            Span::styled("[image] ", palette.muted),
            Span::styled(strip_control_chars(url).into_owned(), palette.detail_image),
        ])),
        None => lines.push(Line::from(Span::styled("Image not available", palette.muted))),
    }
    lines.push(Line::from(""));
    lines.extend(view.body.lines.iter().cloned());

    let inner_width = area.width.saturating_sub(2);
    let visible = usize::from(area.height.saturating_sub(2));
    let limit = max_scroll(wrapped_height(&lines, inner_width), visible).min(MAX_SCROLL);
    let text = Text::from(lines);
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });

    // Clamp before drawing so a resize never shows an empty page
    app.detail_scroll = app.detail_scroll.min(limit);
    let scroll = u16::try_from(app.detail_scroll).unwrap_or(u16::MAX);
    f.render_widget(paragraph.scroll((scroll, 0)), area);
}
