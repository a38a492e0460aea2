//! TUI application state types.

use std::sync::mpsc;

use crate::api::ApiClient;
use crate::feedback::form::Callback;
use crate::feedback::{CaptureSource, FeedbackForm, FsFileReader};

pub(crate) type TuiForm = FeedbackForm<CaptureSource, FsFileReader, ApiClient>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Form,
    Sent,
}

/// Work that needs the async runtime; run after the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Capture,
    Submit,
}

impl Action {
    pub fn busy_label(self) -> &'static str {
        match self {
            Action::Capture => "Taking screenshot...",
            Action::Submit => "Sending...",
        }
    }
}

/// Parent notifications raised by the form callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormSignal {
    Canceled,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiExit {
    Sent,
    Canceled,
    Quit,
}

pub(crate) struct App {
    pub screen: Screen,
    pub form: TuiForm,
    pub signals: mpsc::Receiver<FormSignal>,
    pub pending_action: Option<Action>,
    pub exit: Option<TuiExit>,
}

impl App {
    pub fn new(form: TuiForm, signals: mpsc::Receiver<FormSignal>) -> Self {
        Self {
            screen: Screen::Form,
            form,
            signals,
            pending_action: None,
            exit: None,
        }
    }

    /// Applies callback notifications queued since the last frame.
    pub fn drain_signals(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                FormSignal::Sent => self.screen = Screen::Sent,
                FormSignal::Canceled => self.exit = Some(TuiExit::Canceled),
            }
        }
    }
}

/// Callbacks that forward form notifications into the TUI loop.
pub(crate) fn signal_callbacks(
    tx: mpsc::Sender<FormSignal>,
) -> (Callback, Callback) {
    let cancel_tx = tx.clone();
    let on_cancel: Callback = Box::new(move || {
        let _ = cancel_tx.send(FormSignal::Canceled);
    });
    let on_sent: Callback = Box::new(move || {
        let _ = tx.send(FormSignal::Sent);
    });
    (on_cancel, on_sent)
}
