//! People screen: member directory with an always-visible search bar.

use crate::app::App;
use crate::util::initial_of;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::render::fit_text;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_search(f, app, chunks[0]);
    render_members(f, app, chunks[1]);
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let query = app.people.query();
    let line = if app.people_search_editing {
        Line::from(Span::styled(format!("{}_", query), palette.search))
    } else if query.is_empty() {
        Line::from(Span::styled("Press / to search by username", palette.muted))
    } else {
        Line::from(Span::styled(query.to_string(), palette.search))
    };
    let border = if app.people_search_editing {
        palette.panel_border_focused
    } else {
        palette.panel_border
    };
    f.render_widget(
        Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Search "),
        ),
        area,
    );
}

fn render_members(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let people = &app.people;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(format!(" Members ({}) ", people.displayed().len()));

    if people.displayed().is_empty() {
        let (text, style) = if !app.session.is_logged_in() {
            ("Sign in to see the directory".to_string(), palette.muted)
        } else if people.is_loading() {
            ("Loading members...".to_string(), palette.muted)
        } else if let Some(error) = people.error() {
            (format!("{}\n\nPress r to retry", error), palette.error)
        } else if !people.query().trim().is_empty() {
            (format!("No members match \"{}\"", people.query()), palette.muted)
        } else {
            ("No members found".to_string(), palette.muted)
        };
        f.render_widget(
            Paragraph::new(text)
                .style(style)
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    // Avatar badge " X " plus a space
    let inner_width = usize::from(area.width.saturating_sub(2)).saturating_sub(4);
    let items: Vec<ListItem> = people
        .displayed()
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let name = member.name();
            let avatar = initial_of(name).unwrap_or('?');
            let name_style = if i == app.selected_member {
                palette.post_selected
            } else {
                palette.member_name
            };

            let mut details: Vec<String> = [&member.user_email, &member.ds_profession]
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            if let Some(batch) = &member.ds_batch {
                details.push(format!("Batch {}", batch));
            }

            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!(" {} ", avatar), palette.avatar),
                    Span::raw(" "),
                    Span::styled(fit_text(name, inner_width), name_style),
                ]),
                Line::from(vec![
                    Span::raw("    "),
                    Span::styled(fit_text(&details.join(" · "), inner_width), palette.post_meta),
                ]),
            ])
        })
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(app.selected_member));
    f.render_stateful_widget(list, area, &mut state);
}
