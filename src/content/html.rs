use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::borrow::Cow;

use crate::theme::ColorPalette;
use crate::util::{collapse_whitespace, strip_control_chars};

/// A post body converted for the terminal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedBody {
    pub lines: Vec<Line<'static>>,
    /// Link and image targets, numbered from 1 as they appear in `lines`.
    pub links: Vec<String>,
}

/// Convert WordPress `post_content` HTML into styled lines.
///
/// Block elements become paragraphs separated by one blank line, list items
/// get bullets or numbers, links are footnoted (`[n]`) with their targets
/// listed under the body, and images and embeds become placeholders. Raw
/// content without `<p>` tags is split on blank lines the way WordPress
/// does. Markup that cannot be tokenized falls back to tag-stripped text.
pub fn render_html(html: &str, palette: &ColorPalette) -> RenderedBody {
    let mut renderer = Renderer::new(palette);
    if let Err(e) = renderer.run(html) {
        tracing::debug!(error = %e, "Post body is not well-formed; rendering as plain text");
        renderer = Renderer::new(palette);
        renderer.text(&strip_tags(html));
    }
    renderer.finish()
}

// ============================================================================
// Renderer
// ============================================================================

struct Renderer<'p> {
    palette: &'p ColorPalette,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    links: Vec<String>,
    bold: usize,
    italic: usize,
    heading: bool,
    in_link: bool,
    pre: bool,
    quote: usize,
    skip: usize,
    /// Open lists; `Some(n)` is an ordered list about to print item `n`.
    lists: Vec<Option<u32>>,
}

impl<'p> Renderer<'p> {
    fn new(palette: &'p ColorPalette) -> Self {
        Self {
            palette,
            lines: Vec::new(),
            current: Vec::new(),
            links: Vec::new(),
            bold: 0,
            italic: 0,
            heading: false,
            in_link: false,
            pre: false,
            quote: 0,
            skip: 0,
            lists: Vec::new(),
        }
    }

    fn run(&mut self, html: &str) -> Result<(), quick_xml::Error> {
        let mut reader = Reader::from_str(html);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        loop {
            match reader.read_event()? {
                Event::Start(e) => self.open(&e, false),
                Event::Empty(e) => self.open(&e, true),
                Event::End(e) => self.close(&tag_name(e.local_name().as_ref())),
                Event::Text(e) => {
                    if self.skip == 0 {
                        let raw = String::from_utf8_lossy(&e);
                        self.text(&decode_entities(&raw));
                    }
                }
                Event::CData(e) => {
                    if self.skip == 0 {
                        self.text(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = tag_name(e.local_name().as_ref());
        if matches!(name.as_str(), "script" | "style" | "noscript") {
            if !empty {
                self.skip += 1;
            }
            return;
        }
        if self.skip > 0 {
            return;
        }

        match name.as_str() {
            "p" | "div" | "section" | "article" | "figure" | "figcaption" | "table" | "tr" => {
                self.block_break()
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.block_break();
                self.heading = !empty;
            }
            "blockquote" => {
                self.block_break();
                if !empty {
                    self.quote += 1;
                }
            }
            "pre" => {
                self.block_break();
                self.pre = !empty;
            }
            "ul" | "ol" => {
                if self.lists.is_empty() {
                    self.block_break();
                } else {
                    self.flush_line();
                }
                if !empty {
                    self.lists.push((name == "ol").then_some(1));
                }
            }
            "li" => {
                self.flush_line();
                let depth = self.lists.len().max(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{}", "  ".repeat(depth - 1), marker),
                    self.palette.detail_body,
                ));
            }
            "br" => {
                if self.current.is_empty() {
                    self.lines.push(Line::default());
                } else {
                    self.flush_line();
                }
            }
            "hr" => {
                self.block_break();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.palette.muted)));
                self.lines.push(Line::default());
            }
            "strong" | "b" => {
                if !empty {
                    self.bold += 1;
                }
            }
            "em" | "i" => {
                if !empty {
                    self.italic += 1;
                }
            }
            "a" => {
                if let Some(href) = attribute(e, b"href") {
                    self.links.push(href);
                    if empty {
                        self.push_footnote();
                    } else {
                        self.in_link = true;
                    }
                }
            }
            "img" => {
                let alt = attribute(e, b"alt").filter(|a| !a.trim().is_empty());
                let label = match alt {
                    Some(alt) => format!("[Image: {}]", alt.trim()),
                    None => "[Image]".to_string(),
                };
                self.push_span(label, self.palette.detail_image);
                if let Some(src) = attribute(e, b"src") {
                    self.links.push(src);
                    self.push_footnote();
                }
            }
            "iframe" | "video" | "audio" => {
                self.push_span("[Embedded media]".to_string(), self.palette.detail_image);
                if let Some(src) = attribute(e, b"src") {
                    self.links.push(src);
                    self.push_footnote();
                }
                if !empty {
                    self.skip += 1;
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if matches!(name, "script" | "style" | "noscript" | "iframe" | "video" | "audio") {
            self.skip = self.skip.saturating_sub(1);
            return;
        }
        if self.skip > 0 {
            return;
        }

        match name {
            "p" | "div" | "section" | "article" | "figure" | "figcaption" | "table" | "tr" => {
                self.block_break()
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.heading = false;
                self.block_break();
            }
            "blockquote" => {
                self.block_break();
                self.quote = self.quote.saturating_sub(1);
            }
            "pre" => {
                self.pre = false;
                self.block_break();
            }
            "ul" | "ol" => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.block_break();
                } else {
                    self.flush_line();
                }
            }
            "li" => self.flush_line(),
            "strong" | "b" => self.bold = self.bold.saturating_sub(1),
            "em" | "i" => self.italic = self.italic.saturating_sub(1),
            "a" => {
                if self.in_link {
                    self.in_link = false;
                    self.push_footnote();
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    fn text(&mut self, raw: &str) {
        let clean = strip_control_chars(raw);
        let normalized = clean.replace("\r\n", "\n");

        if self.pre {
            let style = self.style();
            let mut parts = normalized.split('\n').peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    self.current.push(Span::styled(part.to_string(), style));
                }
                if parts.peek().is_some() {
                    self.flush_line();
                }
            }
            return;
        }

        let mut paragraphs = normalized.split("\n\n").peekable();
        while let Some(paragraph) = paragraphs.next() {
            self.inline_text(paragraph);
            if paragraphs.peek().is_some() {
                self.block_break();
            }
        }
    }

    fn inline_text(&mut self, raw: &str) {
        let collapsed = collapse_whitespace(raw);
        if collapsed.is_empty() {
            if raw.chars().any(|c| c.is_ascii_whitespace()) {
                self.space();
            }
            return;
        }
        if raw.starts_with(|c: char| c.is_ascii_whitespace()) {
            self.space();
        }
        let style = self.style();
        self.push_span(collapsed, style);
    }

    fn space(&mut self) {
        let ends_with_space = self
            .current
            .last()
            .is_some_and(|s| s.content.ends_with(' '));
        if !self.current.is_empty() && !ends_with_space {
            self.current.push(Span::raw(" "));
        }
    }

    fn push_span(&mut self, text: String, style: Style) {
        if self.current.is_empty() && self.quote > 0 {
            self.current
                .push(Span::styled("│ ".repeat(self.quote), self.palette.muted));
        }
        self.current.push(Span::styled(text, style));
    }

    fn push_footnote(&mut self) {
        let label = format!("[{}]", self.links.len());
        self.current.push(Span::styled(label, self.palette.muted));
    }

    fn style(&self) -> Style {
        let mut style = self.palette.detail_body;
        if self.heading {
            style = style.patch(self.palette.detail_heading);
        }
        if self.bold > 0 {
            style = style.patch(self.palette.detail_strong);
        }
        if self.italic > 0 || self.quote > 0 {
            style = style.patch(self.palette.detail_emphasis);
        }
        if self.in_link {
            style = style.patch(self.palette.detail_link);
        }
        style
    }

    // ------------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------------

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = std::mem::take(&mut self.current);
        if let Some(last) = spans.last_mut() {
            let trimmed = last.content.trim_end();
            if trimmed.len() != last.content.len() {
                last.content = Cow::Owned(trimmed.to_string());
            }
        }
        spans.retain(|s| !s.content.is_empty());
        if !spans.is_empty() {
            self.lines.push(Line::from(spans));
        }
    }

    /// End the current block, leaving exactly one blank line after it.
    fn block_break(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| !is_blank(l)) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> RenderedBody {
        self.flush_line();
        while self.lines.last().is_some_and(is_blank) {
            self.lines.pop();
        }
        while self.lines.first().is_some_and(is_blank) {
            self.lines.remove(0);
        }

        if !self.links.is_empty() {
            self.lines.push(Line::default());
            self.lines
                .push(Line::from(Span::styled("Links", self.palette.detail_heading)));
            for (i, link) in self.links.iter().enumerate() {
                self.lines.push(Line::from(vec![
                    Span::styled(format!("[{}] ", i + 1), self.palette.muted),
                    Span::styled(link.clone(), self.palette.detail_link),
                ]));
            }
        }

        RenderedBody {
            lines: self.lines,
            links: self.links,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_blank(line: &Line<'_>) -> bool {
    line.spans.iter().all(|s| s.content.trim().is_empty())
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref().eq_ignore_ascii_case(key))
        .map(|attr| decode_entities(&String::from_utf8_lossy(&attr.value)).into_owned())
        .map(|v| strip_control_chars(v.trim()).into_owned())
        .filter(|v| !v.is_empty())
}

/// Resolve the named entities WordPress emits; numeric references are
/// handled by quick-xml. Unknown entities leave the text untouched.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    unescape_with(raw, |entity| {
        Some(match entity {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "apos" => "'",
            "nbsp" => "\u{a0}",
            "hellip" => "…",
            "ndash" => "–",
            "mdash" => "—",
            "lsquo" => "‘",
            "rsquo" => "’",
            "ldquo" => "“",
            "rdquo" => "”",
            "bull" => "•",
            "copy" => "©",
            "reg" => "®",
            "trade" => "™",
            "deg" => "°",
            "rarr" => "→",
            "larr" => "←",
            _ => return None,
        })
    })
    .unwrap_or(Cow::Borrowed(raw))
}

/// Last-resort tag stripper for bodies quick-xml rejects.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    decode_entities(&out).into_owned()
}
