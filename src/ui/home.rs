//! Home screen: search bar, category chips, carousel and the post list.

use crate::app::App;
use crate::feed::CategoryKey;
use crate::util::display_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::render::fit_text;

const SEARCH_HEIGHT: u16 = 3;
const CAROUSEL_HEIGHT: u16 = 4;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let show_search = app.search_editing || app.scroll.affordance().is_visible();
    let show_carousel = !app.feed.carousel().is_empty();

    let mut constraints = Vec::with_capacity(4);
    if show_search {
        constraints.push(Constraint::Length(SEARCH_HEIGHT));
    }
    constraints.push(Constraint::Length(1));
    if show_carousel {
        constraints.push(Constraint::Length(CAROUSEL_HEIGHT));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut rects = chunks.iter().copied();
    if show_search {
        if let Some(rect) = rects.next() {
            render_search(f, app, rect);
        }
    }
    if let Some(rect) = rects.next() {
        render_chips(f, app, rect);
    }
    if show_carousel {
        if let Some(rect) = rects.next() {
            render_carousel(f, app, rect);
        }
    }
    if let Some(rect) = rects.next() {
        render_posts(f, app, rect);
    }
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let query = app.feed.query();
    let text = if app.search_editing {
        Line::from(vec![
            Span::styled(query.to_string(), palette.search),
            Span::styled("_", palette.search),
        ])
    } else if query.is_empty() {
        Line::from(Span::styled("Press / to search posts", palette.muted))
    } else {
        Line::from(Span::styled(query.to_string(), palette.search))
    };

    let border = if app.search_editing {
        palette.panel_border_focused
    } else {
        palette.panel_border
    };
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Search "),
    );
    f.render_widget(paragraph, area);
}

/// One line of chips, `[n] Label`, scrolled so the last selected chip stays
/// in view on narrow terminals.
fn render_chips(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let selection = app.feed.selection();

    let mut spans = Vec::with_capacity(CategoryKey::ALL.len() * 2);
    let mut focus_end = 0usize;
    let mut width = 0usize;
    for (i, key) in CategoryKey::ALL.iter().enumerate() {
        let selected = selection.contains(*key);
        let chip = format!(" {} {} ", i + 1, key.label());
        let style = if selected {
            palette.chip_selected
        } else {
            palette.chip
        };
        width += display_width(&chip);
        if selected {
            focus_end = width;
        }
        spans.push(Span::styled(chip, style));
        spans.push(Span::raw(" "));
        width += 1;
    }

    let offset = focus_end.saturating_sub(usize::from(area.width));
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    f.render_widget(Paragraph::new(Line::from(spans)).scroll((0, offset)), area);
}

fn render_carousel(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let Some(post) = app.current_carousel_post() else {
        return;
    };
    let inner_width = usize::from(area.width.saturating_sub(2));

    let title = match post.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => fit_text(t, inner_width),
        _ => String::new(),
    };
    let image = post
        .image("medium_large")
        .map(|url| fit_text(url, inner_width))
        .unwrap_or_else(|| "Image not available".to_string());

    let dots: String = (0..app.feed.carousel().len())
        .map(|i| if i == app.carousel_index { "● " } else { "○ " })
        .collect();

    let lines = vec![
        Line::from(Span::styled(title, palette.carousel_title)),
        Line::from(Span::styled(image, palette.detail_image)),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.panel_border)
            .title(" Featured ")
            .title_bottom(Line::from(dots.trim_end().to_string()).alignment(Alignment::Right)),
    );
    f.render_widget(paragraph, area);
}

fn render_posts(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let feed = &app.feed;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(" Latest News ");

    let displayed = feed.displayed();
    if displayed.is_empty() {
        // Loading, error and empty are whole-panel states
        let (text, style) = if feed.is_loading() {
            ("Loading posts...".to_string(), palette.muted)
        } else if let Some(error) = feed.error() {
            (format!("Feed unavailable: {}\n\nPress r to retry", error), palette.error)
        } else if !feed.query().trim().is_empty() {
            (format!("No posts match \"{}\"", feed.query()), palette.muted)
        } else {
            ("No posts found".to_string(), palette.muted)
        };
        let paragraph = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let block = match feed.error() {
        Some(error) if !feed.is_loading() => block.title_bottom(
            Line::from(Span::styled(format!(" Refresh failed: {} ", error), palette.error)),
        ),
        _ => block,
    };

    let inner_width = usize::from(area.width.saturating_sub(2));
    let items: Vec<ListItem> = displayed
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let title_style = if i == app.selected_post {
                palette.post_selected
            } else {
                palette.post_title
            };
            let meta = match (post.formatted_date(), post.primary_category()) {
                (Some(date), Some(cat)) => format!("{} · {}", date, cat),
                (Some(date), None) => date,
                (None, Some(cat)) => cat.to_string(),
                (None, None) => String::new(),
            };
            // Two lines per row, matching POST_ROW_HEIGHT
            ListItem::new(vec![
                Line::from(Span::styled(fit_text(post.title_or_blank(), inner_width), title_style)),
                Line::from(Span::styled(fit_text(&meta, inner_width), palette.post_meta)),
            ])
        })
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(app.selected_post));
    f.render_stateful_widget(list, area, &mut state);
}
