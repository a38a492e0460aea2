//! Top header bar: app name, category tag and screenshot badge.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::feedback::FeedbackCategory;
use crate::tui::theme::Theme;

pub(crate) fn draw_header(
    area: Rect,
    f: &mut ratatui::Frame,
    theme: &Theme,
    category: FeedbackCategory,
    screenshot_attached: bool,
) {
    let mut spans = vec![
        Span::styled(
            "FEEDBACK",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  //  {}", category.tag()),
            Style::default().fg(theme.text_dim),
        ),
    ];

    if screenshot_attached {
        spans.push(Span::styled("  [screenshot]", Style::default().fg(theme.optimal)));
    }

    let rule = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(theme.border),
    ));

    f.render_widget(Paragraph::new(vec![Line::from(spans), rule]), area);
}
