//! Feedback form screen drawing.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::feedback::FormView;
use crate::tui::animation::SUCCESS_CHECKMARK;
use crate::tui::state::App;
use crate::tui::theme::Theme;
use crate::tui::widgets::footer::{draw_footer, Hint};

pub(crate) fn draw_form(area: Rect, f: &mut ratatui::Frame, app: &App, theme: Theme) {
    let view = app.form.view();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            view.title,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(view.description, Style::default().fg(theme.muted))),
    ]))
    .wrap(Wrap { trim: true });
    f.render_widget(header, layout[0]);

    draw_comment(layout[1], f, &view, &theme);
    draw_status(layout[2], f, app, &view, &theme);

    let hints = if view.is_loading {
        vec![Hint::new("Esc", "Back")]
    } else if view.screenshot.is_some() {
        vec![
            Hint::new("F3", "Remove screenshot"),
            Hint::new("F5", "Send").enabled_if(view.submit_enabled),
            Hint::new("Esc", "Back"),
        ]
    } else {
        vec![
            Hint::new("F2", "Screenshot"),
            Hint::new("F5", "Send").enabled_if(view.submit_enabled),
            Hint::new("Esc", "Back"),
        ]
    };
    draw_footer(layout[3], f, &theme, &hints);
}

fn draw_comment(area: Rect, f: &mut ratatui::Frame, view: &FormView, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(" Comment ", Style::default().fg(theme.text_dim)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let body = if view.comment.is_empty() {
        Text::from(Line::from(Span::styled(
            view.placeholder,
            Style::default().fg(theme.muted),
        )))
    } else {
        Text::from(view.comment.as_str())
    };

    let para = Paragraph::new(body).block(block).wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, app: &App, view: &FormView, theme: &Theme) {
    let screenshot = match &view.screenshot {
        Some(image) => Span::styled(
            format!("Screenshot: {image}"),
            Style::default().fg(theme.optimal).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("Screenshot: none", Style::default().fg(theme.muted)),
    };

    let button = if let Some(action) = app.pending_action {
        Span::styled(action.busy_label(), Style::default().fg(theme.muted))
    } else if view.is_loading {
        Span::styled("Sending...", Style::default().fg(theme.muted))
    } else if view.submit_enabled {
        Span::styled(
            "[ Send feedback ]",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("[ Send feedback ]", Style::default().fg(theme.muted))
    };

    let status = Paragraph::new(Line::from(vec![screenshot, Span::raw("   "), button])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(status, area);
}

pub(crate) fn draw_sent(area: Rect, f: &mut ratatui::Frame, theme: Theme) {
    let mut lines: Vec<Line> = vec![Line::from("")];

    for art_line in SUCCESS_CHECKMARK {
        lines.push(Line::from(Span::styled(
            format!("       {art_line}"),
            Style::default()
                .fg(theme.optimal)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Thanks for your feedback!",
        Style::default()
            .fg(theme.optimal)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press Enter to close.",
        Style::default().fg(theme.text),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.optimal));

    let para = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}
