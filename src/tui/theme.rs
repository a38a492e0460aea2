//! TUI color theme.

use ratatui::style::Color;

#[derive(Clone, Copy)]
pub(crate) struct Theme {
    // Primary palette
    pub accent: Color,
    pub optimal: Color,

    // UI chrome
    pub border: Color,
    pub muted: Color,
    pub text: Color,
    pub text_dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(130, 87, 229),
            optimal: Color::Rgb(163, 230, 53),
            border: Color::Gray,
            muted: Color::DarkGray,
            text: Color::White,
            text_dim: Color::Gray,
        }
    }
}
