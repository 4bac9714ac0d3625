//! Styles for the finder's prompt, result rows and status line.
//!
//! Themes are plain ratatui [`Style`]s and [`Color`]s, selected by name with `--theme`.

use crate::error::{Result, RzfError};
use ratatui::style::{Color, Modifier, Style};

/// Every style the terminal renderer paints with.
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// Unmatched result text; `None` keeps the terminal default
    pub normal_text: Option<Color>,

    /// Matched characters in a result row
    pub match_highlight: Style,

    /// Matched characters in the highlighted row
    pub selected_match: Style,

    /// Highlighted row
    pub selection: Style,

    /// Prompt marker and pointer
    pub prompt: Color,

    /// Multi-select marker
    pub marker: Color,

    /// Status line background
    pub status_bg: Color,

    /// Status line text
    pub status_fg: Color,

    /// Ingestion errors shown under the prompt
    pub error_text: Color,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            normal_text: None,
            match_highlight: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            selected_match: Style::default()
                .fg(Color::LightGreen)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            selection: Style::default().fg(Color::White).bg(Color::DarkGray),
            prompt: Color::Blue,
            marker: Color::Magenta,
            status_bg: Color::Reset,
            status_fg: Color::Yellow,
            error_text: Color::Red,
        }
    }
}

impl ColorTheme {
    /// Attributes only (reverse, underline), for terminals without color.
    pub fn monochrome() -> Self {
        Self {
            normal_text: None,
            match_highlight: Style::default().add_modifier(Modifier::UNDERLINED),
            selected_match: Style::default()
                .add_modifier(Modifier::REVERSED | Modifier::UNDERLINED),
            selection: Style::default().add_modifier(Modifier::REVERSED),
            prompt: Color::Reset,
            marker: Color::Reset,
            status_bg: Color::Reset,
            status_fg: Color::Reset,
            error_text: Color::Reset,
        }
    }

    /// Bright foregrounds on solid backgrounds.
    pub fn high_contrast() -> Self {
        Self {
            normal_text: Some(Color::White),
            match_highlight: Style::default().fg(Color::Black).bg(Color::LightYellow),
            selected_match: Style::default().fg(Color::LightYellow).bg(Color::Black),
            selection: Style::default().fg(Color::White).bg(Color::LightBlue),
            prompt: Color::LightCyan,
            marker: Color::LightGreen,
            status_bg: Color::White,
            status_fg: Color::Black,
            error_text: Color::LightRed,
        }
    }

    /// Look up a theme by name (`default`, `monochrome`/`mono`, `high-contrast`).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" | "dark" => Ok(Self::default()),
            "monochrome" | "mono" | "bw" => Ok(Self::monochrome()),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::high_contrast()),
            other => Err(RzfError::config(format!("unknown theme `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.normal_text, None);
        assert_eq!(theme.match_highlight.fg, Some(Color::Green));
        assert_eq!(theme.selection.bg, Some(Color::DarkGray));
    }

    #[test]
    fn test_monochrome_theme_uses_modifiers_only() {
        let theme = ColorTheme::monochrome();
        assert_eq!(theme.match_highlight.fg, None);
        assert!(theme
            .selection
            .add_modifier
            .contains(Modifier::REVERSED));
    }

    #[test]
    fn test_high_contrast_theme() {
        let theme = ColorTheme::high_contrast();
        assert_eq!(theme.normal_text, Some(Color::White));
        assert_eq!(theme.error_text, Color::LightRed);
        assert_eq!(theme.status_bg, Color::White);
        assert_eq!(theme.status_fg, Color::Black);
    }

    #[test]
    fn test_theme_lookup_by_name() {
        assert!(ColorTheme::from_name("Mono").is_ok());
        assert_eq!(
            ColorTheme::from_name("high-contrast").unwrap().status_bg,
            Color::White
        );
        assert!(matches!(
            ColorTheme::from_name("solarized"),
            Err(RzfError::ConfigError { .. })
        ));
    }
}
