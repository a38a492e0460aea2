//! Fullscreen terminal UI (TUI) for the feedback form.
//!
//! Async work (capture, submit) runs on the shared runtime between frames; the screen is
//! redrawn once before each action so the busy label is visible.

pub(crate) mod animation;
pub(crate) mod input;
pub(crate) mod screens;
pub(crate) mod state;
pub(crate) mod theme;
pub(crate) mod widgets;

use std::io;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Terminal;

use crate::api::ApiClient;
use crate::config::Config;
use crate::feedback::{CaptureRequest, CaptureSource, FeedbackCategory, FeedbackForm, FsFileReader};
use state::*;
use theme::Theme;

const FRAME_TIME: Duration = Duration::from_millis(16);

pub(crate) use state::TuiExit;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

pub(crate) fn run_tui(
    rt: &tokio::runtime::Runtime,
    config: &Config,
    category: FeedbackCategory,
) -> Result<TuiExit> {
    let (tx, rx) = mpsc::channel();
    let (on_cancel, on_sent) = signal_callbacks(tx);
    let form = FeedbackForm::new(
        category,
        CaptureSource::from_config(&config.capture)?,
        FsFileReader,
        ApiClient::from_config(&config.api),
        on_cancel,
        on_sent,
    )
    .with_capture_request(CaptureRequest::from_config(&config.capture));

    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(form, rx);

    loop {
        terminal.draw(|f| draw(f.area(), f, &app))?;

        app.drain_signals();
        if app.exit.is_some() {
            break;
        }

        if let Some(action) = app.pending_action.take() {
            input::handle_action(rt, &mut app, action);
            continue;
        }

        if event::poll(FRAME_TIME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && input::handle_key(&mut app, key)? {
                    break;
                }
            }
        }
    }

    Ok(app.exit.unwrap_or(TuiExit::Quit))
}

fn draw(area: Rect, f: &mut ratatui::Frame, app: &App) {
    let theme = Theme::default();

    let outer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(0),    // content
        ])
        .split(area);

    let view = app.form.view();
    widgets::header::draw_header(
        outer_layout[0],
        f,
        &theme,
        view.category,
        view.screenshot.is_some(),
    );

    match app.screen {
        Screen::Form => screens::feedback::draw_form(outer_layout[1], f, app, theme),
        Screen::Sent => screens::feedback::draw_sent(outer_layout[1], f, theme),
    }
}
