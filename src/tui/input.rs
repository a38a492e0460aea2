//! TUI keyboard input handling.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::state::*;

pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.exit = Some(TuiExit::Quit);
        return Ok(true);
    }

    match app.screen {
        Screen::Form => handle_form_key(app, key),
        Screen::Sent => handle_sent_key(app, key),
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Editing is locked while a request is in flight, like a disabled input.
    let locked = app.form.is_submitting();

    if key.code == KeyCode::F(5)
        || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        if app.form.submit_enabled() {
            app.pending_action = Some(Action::Submit);
        } else {
            debug!("submit key ignored; button disabled");
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => app.form.cancel(),
        KeyCode::F(2) if !locked => app.pending_action = Some(Action::Capture),
        KeyCode::F(3) if !locked => app.form.remove_screenshot(),
        KeyCode::Backspace if !locked => app.form.edit_comment(|c| {
            c.pop();
        }),
        KeyCode::Enter if !locked => app.form.edit_comment(|c| c.push('\n')),
        KeyCode::Char(c) if !locked => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(false);
            }
            app.form.edit_comment(|comment| comment.push(c));
        }
        _ => {}
    }

    Ok(false)
}

fn handle_sent_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            app.exit = Some(TuiExit::Sent);
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub(crate) fn handle_action(rt: &tokio::runtime::Runtime, app: &mut App, action: Action) {
    match action {
        Action::Capture => {
            rt.block_on(app.form.request_screenshot());
        }
        Action::Submit => {
            let outcome = rt.block_on(app.form.submit());
            debug!(?outcome, "submit finished");
        }
    }
    app.drain_signals();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::mpsc;

    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::feedback::capture::StaticCapture;
    use crate::feedback::{CaptureSource, FeedbackCategory, FeedbackForm, FsFileReader};

    fn app() -> App {
        let (tx, rx) = mpsc::channel();
        let (on_cancel, on_sent) = signal_callbacks(tx);
        let form = FeedbackForm::new(
            FeedbackCategory::Bug,
            CaptureSource::Static(StaticCapture::new(PathBuf::from("/nonexistent.png"))),
            FsFileReader,
            ApiClient::from_config(&ApiConfig::default()),
            on_cancel,
            on_sent,
        );
        App::new(form, rx)
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn key(code: KeyCode) -> KeyEvent {
        press(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_edits_comment() {
        let mut app = app();
        for c in "hey".chars() {
            handle_key(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, key(KeyCode::Backspace)).unwrap();
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.form.view().comment, "he\n");
    }

    #[test]
    fn test_submit_key_ignored_while_comment_empty() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::F(5))).unwrap();
        assert_eq!(app.pending_action, None);

        handle_key(&mut app, key(KeyCode::Char('x'))).unwrap();
        handle_key(&mut app, press(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(app.pending_action, Some(Action::Submit));
        assert_eq!(app.form.view().comment, "x");
    }

    #[test]
    fn test_capture_key_queues_action() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::F(2))).unwrap();
        assert_eq!(app.pending_action, Some(Action::Capture));
    }

    #[test]
    fn test_escape_cancels_through_callback() {
        let mut app = app();
        let quit = handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(!quit);

        app.drain_signals();
        assert_eq!(app.exit, Some(TuiExit::Canceled));
    }

    #[test]
    fn test_failed_capture_action_keeps_form_usable() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app();

        handle_action(&rt, &mut app, Action::Capture);

        assert_eq!(app.form.view().screenshot, None);
        assert_eq!(app.screen, Screen::Form);
        assert_eq!(app.exit, None);
    }
}
