//! Keybind footer bar. Disabled actions are drawn muted.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::theme::Theme;

pub(crate) struct Hint<'a> {
    pub key: &'a str,
    pub action: &'a str,
    pub enabled: bool,
}

impl<'a> Hint<'a> {
    pub fn new(key: &'a str, action: &'a str) -> Self {
        Self {
            key,
            action,
            enabled: true,
        }
    }

    pub fn enabled_if(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

pub(crate) fn draw_footer(area: Rect, f: &mut ratatui::Frame, theme: &Theme, hints: &[Hint<'_>]) {
    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(theme.muted)));
        }
        let key_color = if hint.enabled { theme.accent } else { theme.muted };
        spans.push(Span::styled(hint.key, Style::default().fg(key_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(theme.muted),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
