use crate::app::{App, Screen};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Borrowed(hints(app))
    };

    let paragraph = Paragraph::new(text).style(app.palette.status_bar);
    f.render_widget(paragraph, area);
}

/// Static key hints for the current screen and mode.
fn hints(app: &App) -> &'static str {
    match app.screen {
        Screen::SignIn => "Type to fill in | [Tab]next field [Enter]sign in [Esc]quit",
        Screen::Home if app.search_editing => "Type to search | [Esc]clear [Enter]done",
        Screen::Home => {
            "[j/k]move [Enter]open [/]search [1-7]category [[/]]carousel [r]efresh [Tab]next tab [?]help [q]uit"
        }
        Screen::Detail => "[b]ack [j/k]scroll [o]pen image [r]eload [q]uit",
        Screen::People if app.people_search_editing => "Type to search | [Esc]clear [Enter]done",
        Screen::People => "[j/k]move [Enter]open [/]search [r]eload [Tab]next tab [?]help [q]uit",
        Screen::MemberDetail => "[b]ack [j/k]scroll [r]eload [q]uit",
        Screen::Profile if app.profile.picture_input.is_some() => {
            "Type a path or URL | [Enter]upload [Esc]cancel"
        }
        Screen::Profile if app.profile.editing => "Type to edit | [Enter/Esc]done",
        Screen::Profile => {
            "[j/k]field [e]dit [s]ave [p]icture [x]log out [Tab]next tab [?]help [q]uit"
        }
    }
}
