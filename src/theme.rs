//! Theme system for the TUI.
//!
//! Semantic color roles resolved to ratatui `Style` values. `ThemeVariant`
//! selects the palette; the dark palette follows the Sarvail brand (orange
//! accent on a near-black background).

use ratatui::style::{Color, Modifier, Style};

/// Brand accent used for the "S" of the wordmark and selected chips.
const ACCENT: Color = Color::Rgb(0xFF, 0x9C, 0x01);
const ACCENT_LIGHT: Color = Color::Rgb(0xC2, 0x6A, 0x00);

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark -> Light -> Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    // -- Branding and chrome --
    pub brand_accent: Style,
    pub brand_text: Style,
    pub tab: Style,
    pub tab_active: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub muted: Style,
    pub error: Style,

    // -- Feed --
    pub chip: Style,
    pub chip_selected: Style,
    pub search: Style,
    pub carousel_title: Style,
    pub post_title: Style,
    pub post_selected: Style,
    pub post_meta: Style,

    // -- Post detail --
    pub detail_category: Style,
    pub detail_title: Style,
    pub detail_heading: Style,
    pub detail_body: Style,
    pub detail_emphasis: Style,
    pub detail_strong: Style,
    pub detail_link: Style,
    pub detail_image: Style,

    // -- People and profile --
    pub avatar: Style,
    pub member_name: Style,
    pub form_label: Style,
    pub form_value: Style,
    pub form_focused: Style,
    pub button: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            brand_accent: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            brand_text: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            tab: Style::default().fg(Color::Gray),
            tab_active: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(ACCENT),
            muted: Style::default().fg(Color::DarkGray),
            error: Style::default().fg(Color::Red),

            chip: Style::default().fg(Color::Gray),
            chip_selected: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            search: Style::default().fg(Color::White),
            carousel_title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            post_title: Style::default().add_modifier(Modifier::BOLD),
            post_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            post_meta: Style::default().fg(Color::DarkGray),

            detail_category: Style::default().fg(Color::Black).bg(ACCENT),
            detail_title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            detail_heading: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            detail_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            detail_strong: Style::default().add_modifier(Modifier::BOLD),
            detail_link: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
            detail_image: Style::default().fg(Color::Blue),

            avatar: Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            member_name: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            form_label: Style::default().fg(Color::Gray),
            form_value: Style::default().fg(Color::White),
            form_focused: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            button: Style::default().fg(Color::Black).bg(ACCENT),
        }
    }

    fn light() -> Self {
        Self {
            brand_accent: Style::default()
                .fg(ACCENT_LIGHT)
                .add_modifier(Modifier::BOLD),
            brand_text: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            tab: Style::default().fg(Color::DarkGray),
            tab_active: Style::default()
                .fg(ACCENT_LIGHT)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(ACCENT_LIGHT),
            muted: Style::default().fg(Color::DarkGray),
            error: Style::default().fg(Color::Red),

            chip: Style::default().fg(Color::DarkGray),
            chip_selected: Style::default()
                .fg(ACCENT_LIGHT)
                .add_modifier(Modifier::BOLD),
            search: Style::default().fg(Color::Black),
            carousel_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            post_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            post_selected: Style::default().bg(Color::Blue).fg(Color::White),
            post_meta: Style::default().fg(Color::DarkGray),

            detail_category: Style::default().fg(Color::White).bg(ACCENT_LIGHT),
            detail_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            detail_heading: Style::default()
                .fg(ACCENT_LIGHT)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            detail_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            detail_strong: Style::default().add_modifier(Modifier::BOLD),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            detail_image: Style::default().fg(Color::Blue),

            avatar: Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            member_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            form_label: Style::default().fg(Color::DarkGray),
            form_value: Style::default().fg(Color::Black),
            form_focused: Style::default()
                .fg(ACCENT_LIGHT)
                .add_modifier(Modifier::BOLD),
            button: Style::default().fg(Color::White).bg(ACCENT_LIGHT),
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        ThemeVariant::default().palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name(" Light "), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next().name(), "Dark");
    }

    #[test]
    fn selected_chip_uses_brand_accent() {
        let palette = ThemeVariant::Dark.palette();
        assert_eq!(palette.chip_selected.fg, Some(ACCENT));
        assert_ne!(palette.chip, palette.chip_selected);
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.post_selected, light.post_selected);
        assert_ne!(dark.brand_text, light.brand_text);
    }

    #[test]
    fn default_palette_is_dark() {
        assert_eq!(ColorPalette::default(), ThemeVariant::Dark.palette());
    }
}
