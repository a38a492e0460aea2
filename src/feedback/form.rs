//! The feedback form: local state plus the submit workflow.
//!
//! Submission lifecycle:
//!
//! | from       | event        | to         |
//! |------------|--------------|------------|
//! | Idle       | `Begin`      | Submitting |
//! | Submitting | `Delivered`  | Sent       |
//! | Submitting | `Rejected`   | Idle       |
//! | Submitting | `ReadFailed` | Submitting |
//!
//! Any other pair leaves the phase as it is. `Sent` is terminal; the parent is expected to drop
//! the form after `on_sent` fires. A failed screenshot read leaves the form stuck in
//! `Submitting`.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info};

use super::{
    CaptureRequest, FeedbackCategory, FeedbackError, FeedbackPayload, FileReader, ImageRef,
    ScreenCapture, FEEDBACKS_PATH,
};
use crate::api::SubmissionClient;

pub(crate) type Callback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionPhase {
    Idle,
    Submitting,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionEvent {
    Begin,
    Delivered,
    Rejected,
    ReadFailed,
}

impl SubmissionPhase {
    pub(crate) fn on(self, event: SubmissionEvent) -> Self {
        use SubmissionEvent::*;
        use SubmissionPhase::*;

        match (self, event) {
            (Idle, Begin) => Submitting,
            (Submitting, Delivered) => Sent,
            (Submitting, Rejected) => Idle,
            (Submitting, ReadFailed) => Submitting,
            (phase, _) => phase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    /// A request was already in flight (or already delivered).
    Ignored,
    Sent,
    Failed,
}

#[derive(Debug, Clone)]
struct FormState {
    phase: SubmissionPhase,
    screenshot: Option<ImageRef>,
    comment: String,
}

/// Everything a screen needs to draw the form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FormView {
    pub(crate) category: FeedbackCategory,
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
    pub(crate) placeholder: &'static str,
    pub(crate) comment: String,
    pub(crate) screenshot: Option<ImageRef>,
    pub(crate) submit_enabled: bool,
    pub(crate) is_loading: bool,
}

pub(crate) struct FeedbackForm<C, R, S> {
    category: FeedbackCategory,
    capture: C,
    reader: R,
    client: S,
    capture_request: CaptureRequest,
    state: Mutex<FormState>,
    on_cancel: Callback,
    on_sent: Callback,
}

impl<C, R, S> FeedbackForm<C, R, S>
where
    C: ScreenCapture,
    R: FileReader,
    S: SubmissionClient,
{
    pub(crate) fn new(
        category: FeedbackCategory,
        capture: C,
        reader: R,
        client: S,
        on_cancel: Callback,
        on_sent: Callback,
    ) -> Self {
        Self {
            category,
            capture,
            reader,
            client,
            capture_request: CaptureRequest::default(),
            state: Mutex::new(FormState {
                phase: SubmissionPhase::Idle,
                screenshot: None,
                comment: String::new(),
            }),
            on_cancel,
            on_sent,
        }
    }

    pub(crate) fn with_capture_request(mut self, request: CaptureRequest) -> Self {
        self.capture_request = request;
        self
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        // State is plain data; a panic elsewhere cannot leave it half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, event: SubmissionEvent) -> SubmissionPhase {
        let mut state = self.state();
        let next = state.phase.on(event);
        debug!(from = ?state.phase, to = ?next, ?event, "feedback phase transition");
        state.phase = next;
        next
    }

    pub(crate) fn category(&self) -> FeedbackCategory {
        self.category
    }

    pub(crate) fn phase(&self) -> SubmissionPhase {
        self.state().phase
    }

    /// True while a request is outstanding, and stays true once delivered.
    pub(crate) fn is_submitting(&self) -> bool {
        self.phase() != SubmissionPhase::Idle
    }

    pub(crate) fn screenshot(&self) -> Option<ImageRef> {
        self.state().screenshot.clone()
    }

    pub(crate) fn submit_enabled(&self) -> bool {
        let state = self.state();
        !state.comment.is_empty() && state.phase == SubmissionPhase::Idle
    }

    pub(crate) fn view(&self) -> FormView {
        let state = self.state();
        FormView {
            category: self.category,
            title: self.category.label(),
            description: self.category.description(),
            placeholder: self.category.placeholder(),
            comment: state.comment.clone(),
            screenshot: state.screenshot.clone(),
            submit_enabled: !state.comment.is_empty() && state.phase == SubmissionPhase::Idle,
            is_loading: state.phase != SubmissionPhase::Idle,
        }
    }

    /// Returns whether a screenshot is attached after the attempt.
    pub(crate) async fn request_screenshot(&self) -> bool {
        match self.capture.capture(&self.capture_request).await {
            Ok(image) => {
                debug!(image = %image, "screenshot captured");
                self.state().screenshot = Some(image);
                true
            }
            Err(err) => {
                let err = FeedbackError::from(err);
                error!(error = %err, "screenshot capture failed");
                self.state().screenshot.is_some()
            }
        }
    }

    pub(crate) fn remove_screenshot(&self) {
        self.state().screenshot = None;
    }

    pub(crate) fn update_comment(&self, text: impl Into<String>) {
        self.state().comment = text.into();
    }

    /// Edits the comment in place; used by screens that feed keystrokes one at a time.
    pub(crate) fn edit_comment(&self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.state().comment);
    }

    pub(crate) fn cancel(&self) {
        (self.on_cancel)();
    }

    pub(crate) async fn submit(&self) -> SubmitOutcome {
        let (screenshot, comment) = {
            let mut state = self.state();
            if state.phase != SubmissionPhase::Idle {
                debug!(phase = ?state.phase, "submit ignored");
                return SubmitOutcome::Ignored;
            }
            state.phase = state.phase.on(SubmissionEvent::Begin);
            (state.screenshot.clone(), state.comment.clone())
        };

        let screenshot_base64 = match screenshot {
            Some(image) => match self.reader.read_base64(&image).await {
                Ok(encoded) => Some(encoded),
                Err(err) => {
                    let err = FeedbackError::from(err);
                    error!(error = %err, image = %image, "could not read screenshot");
                    self.apply(SubmissionEvent::ReadFailed);
                    return SubmitOutcome::Failed;
                }
            },
            None => None,
        };

        let payload = FeedbackPayload::new(self.category, screenshot_base64.as_deref(), &comment);

        match self.client.post(FEEDBACKS_PATH, &payload).await {
            Ok(()) => {
                self.apply(SubmissionEvent::Delivered);
                info!(category = %self.category, "feedback sent");
                (self.on_sent)();
                SubmitOutcome::Sent
            }
            Err(err) => {
                let err = FeedbackError::from(err);
                error!(error = %err, "feedback submission failed");
                self.apply(SubmissionEvent::Rejected);
                SubmitOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::api::ApiError;
    use crate::feedback::{CaptureError, FsFileReader, ReadError};

    #[derive(Default)]
    struct FakeCapture {
        results: Mutex<VecDeque<Result<ImageRef, CaptureError>>>,
        calls: AtomicUsize,
    }

    impl FakeCapture {
        fn returning(results: Vec<Result<ImageRef, CaptureError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScreenCapture for FakeCapture {
        async fn capture(&self, _request: &CaptureRequest) -> Result<ImageRef, CaptureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CaptureError::NotConfigured))
        }
    }

    struct FakeReader {
        fail: bool,
    }

    impl FileReader for FakeReader {
        async fn read_base64(&self, image: &ImageRef) -> Result<String, ReadError> {
            if self.fail {
                return Err(ReadError::Io {
                    path: image.to_path(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(format!("b64({})", image.as_str()))
        }
    }

    #[derive(Default)]
    struct FakeClient {
        reject: bool,
        posts: Mutex<Vec<(String, FeedbackPayload)>>,
    }

    impl FakeClient {
        fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::default()
            }
        }

        fn post_count(&self) -> usize {
            self.posts.lock().unwrap().len()
        }
    }

    impl SubmissionClient for FakeClient {
        async fn post(&self, path: &str, payload: &FeedbackPayload) -> Result<(), ApiError> {
            // Lets a second submit run while this one is in flight.
            tokio::task::yield_now().await;
            self.posts
                .lock()
                .unwrap()
                .push((path.to_string(), payload.clone()));
            if self.reject {
                return Err(ApiError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    struct Harness<R = FakeReader> {
        form: FeedbackForm<FakeCapture, R, FakeClient>,
        sent: Arc<AtomicUsize>,
        canceled: Arc<AtomicUsize>,
    }

    fn harness<R: FileReader>(
        category: FeedbackCategory,
        capture: FakeCapture,
        reader: R,
        client: FakeClient,
    ) -> Harness<R> {
        let sent = Arc::new(AtomicUsize::new(0));
        let canceled = Arc::new(AtomicUsize::new(0));
        let on_sent = {
            let sent = sent.clone();
            Box::new(move || {
                sent.fetch_add(1, Ordering::SeqCst);
            })
        };
        let on_cancel = {
            let canceled = canceled.clone();
            Box::new(move || {
                canceled.fetch_add(1, Ordering::SeqCst);
            })
        };
        Harness {
            form: FeedbackForm::new(category, capture, reader, client, on_cancel, on_sent),
            sent,
            canceled,
        }
    }

    fn default_harness() -> Harness {
        harness(
            FeedbackCategory::Bug,
            FakeCapture::default(),
            FakeReader { fail: false },
            FakeClient::default(),
        )
    }

    #[test]
    fn test_transition_table() {
        use SubmissionEvent::*;
        use SubmissionPhase::*;

        assert_eq!(Idle.on(Begin), Submitting);
        assert_eq!(Submitting.on(Delivered), Sent);
        assert_eq!(Submitting.on(Rejected), Idle);
        assert_eq!(Submitting.on(ReadFailed), Submitting);
        assert_eq!(Submitting.on(Begin), Submitting);
        assert_eq!(Sent.on(Begin), Sent);
        assert_eq!(Sent.on(Rejected), Sent);
        assert_eq!(Idle.on(Delivered), Idle);
    }

    #[test]
    fn test_initial_state() {
        let h = default_harness();
        assert_eq!(h.form.phase(), SubmissionPhase::Idle);
        assert!(!h.form.is_submitting());
        assert_eq!(h.form.screenshot(), None);
        assert_eq!(h.form.view().comment, "");
        assert_eq!(h.form.category(), FeedbackCategory::Bug);
    }

    #[test]
    fn test_submit_disabled_for_empty_comment_regardless_of_screenshot() {
        let h = default_harness();
        assert!(!h.form.submit_enabled());

        h.form.state().screenshot = Some(ImageRef::new("img://1"));
        assert!(!h.form.submit_enabled());
        assert!(!h.form.view().submit_enabled);
    }

    #[test]
    fn test_submit_enabled_for_non_empty_comment_while_idle() {
        let h = default_harness();
        for text in [" ", "x", "app crashes", "multi\nline"] {
            h.form.update_comment(text);
            assert!(h.form.submit_enabled(), "comment {text:?}");
        }
    }

    #[test]
    fn test_update_comment_is_verbatim() {
        let h = default_harness();
        h.form.update_comment("  padded  ");
        assert_eq!(h.form.view().comment, "  padded  ");

        h.form.edit_comment(|c| {
            c.pop();
            c.push('!');
        });
        assert_eq!(h.form.view().comment, "  padded !");
    }

    #[tokio::test]
    async fn test_submit_while_submitting_is_noop() {
        let h = default_harness();
        h.form.update_comment("hello");
        h.form.state().phase = SubmissionPhase::Submitting;

        assert_eq!(h.form.submit().await, SubmitOutcome::Ignored);
        assert_eq!(h.form.client.post_count(), 0);
        assert_eq!(h.form.phase(), SubmissionPhase::Submitting);
        assert_eq!(h.sent.load(Ordering::SeqCst), 0);
        assert!(!h.form.submit_enabled());
    }

    #[tokio::test]
    async fn test_concurrent_submits_post_once() {
        let h = default_harness();
        h.form.update_comment("double click");

        let (first, second) = tokio::join!(h.form.submit(), h.form.submit());

        let mut outcomes = [first, second];
        outcomes.sort_by_key(|outcome| *outcome == SubmitOutcome::Ignored);
        assert_eq!(outcomes, [SubmitOutcome::Sent, SubmitOutcome::Ignored]);
        assert_eq!(h.form.client.post_count(), 1);
        assert_eq!(h.sent.load(Ordering::SeqCst), 1);
        assert_eq!(h.form.phase(), SubmissionPhase::Sent);
    }

    #[tokio::test]
    async fn test_capture_sets_screenshot_once_per_call() {
        let capture = FakeCapture::returning(vec![
            Ok(ImageRef::new("img://1")),
            Ok(ImageRef::new("img://2")),
        ]);
        let h = harness(
            FeedbackCategory::Idea,
            capture,
            FakeReader { fail: false },
            FakeClient::default(),
        );

        assert!(h.form.request_screenshot().await);
        assert_eq!(h.form.screenshot(), Some(ImageRef::new("img://1")));
        assert_eq!(h.form.capture.calls.load(Ordering::SeqCst), 1);

        assert!(h.form.request_screenshot().await);
        assert_eq!(h.form.screenshot(), Some(ImageRef::new("img://2")));
        assert_eq!(h.form.capture.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capture_failure_leaves_state_unchanged() {
        let capture = FakeCapture::returning(vec![
            Ok(ImageRef::new("img://1")),
            Err(CaptureError::NotConfigured),
        ]);
        let h = harness(
            FeedbackCategory::Bug,
            capture,
            FakeReader { fail: false },
            FakeClient::default(),
        );

        assert!(h.form.request_screenshot().await);
        // Failed capture keeps the earlier screenshot attached.
        assert!(h.form.request_screenshot().await);
        assert_eq!(h.form.capture.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.form.screenshot(), Some(ImageRef::new("img://1")));
        assert_eq!(h.form.phase(), SubmissionPhase::Idle);
    }

    #[test]
    fn test_remove_screenshot_is_idempotent() {
        let h = default_harness();
        h.form.remove_screenshot();
        assert_eq!(h.form.screenshot(), None);

        h.form.state().screenshot = Some(ImageRef::new("img://1"));
        h.form.remove_screenshot();
        h.form.remove_screenshot();
        assert_eq!(h.form.screenshot(), None);
        assert_eq!(h.form.phase(), SubmissionPhase::Idle);
    }

    #[tokio::test]
    async fn test_bug_without_screenshot_sends_empty_data_uri() {
        let h = default_harness();
        h.form.update_comment("app crashes");

        assert_eq!(h.form.submit().await, SubmitOutcome::Sent);

        let posts = h.form.client.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "/feedbacks");
        assert_eq!(
            serde_json::to_value(&posts[0].1).unwrap(),
            serde_json::json!({
                "type": "BUG",
                "screenshot": "data:image/png;base64, ",
                "comment": "app crashes",
            })
        );
        assert_eq!(h.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sent_is_terminal() {
        let h = default_harness();
        h.form.update_comment("thanks");

        assert_eq!(h.form.submit().await, SubmitOutcome::Sent);
        assert_eq!(h.form.phase(), SubmissionPhase::Sent);
        assert!(h.form.is_submitting());
        assert!(h.form.view().is_loading);

        assert_eq!(h.form.submit().await, SubmitOutcome::Ignored);
        assert_eq!(h.form.client.post_count(), 1);
        assert_eq!(h.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_submission_returns_to_idle() {
        let h = harness(
            FeedbackCategory::Other,
            FakeCapture::default(),
            FakeReader { fail: false },
            FakeClient::rejecting(),
        );
        h.form.update_comment("hello");

        assert_eq!(h.form.submit().await, SubmitOutcome::Failed);
        assert_eq!(h.form.phase(), SubmissionPhase::Idle);
        assert!(!h.form.is_submitting());
        assert!(h.form.submit_enabled());
        assert_eq!(h.sent.load(Ordering::SeqCst), 0);

        // Manual retry is allowed and posts again.
        assert_eq!(h.form.submit().await, SubmitOutcome::Failed);
        assert_eq!(h.form.client.post_count(), 2);
        assert_eq!(h.sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_screenshot_is_embedded_as_data_uri() {
        let capture = FakeCapture::returning(vec![Ok(ImageRef::new("img://1"))]);
        let h = harness(
            FeedbackCategory::Bug,
            capture,
            FakeReader { fail: false },
            FakeClient::default(),
        );
        h.form.update_comment("see attached");
        h.form.request_screenshot().await;

        assert_eq!(h.form.submit().await, SubmitOutcome::Sent);

        let posts = h.form.client.posts.lock().unwrap().clone();
        assert_eq!(posts[0].1.screenshot, "data:image/png;base64, b64(img://1)");
    }

    #[tokio::test]
    async fn test_removed_screenshot_is_not_sent() {
        let capture = FakeCapture::returning(vec![Ok(ImageRef::new("img://1"))]);
        let h = harness(
            FeedbackCategory::Bug,
            capture,
            FakeReader { fail: false },
            FakeClient::default(),
        );
        h.form.update_comment("never mind the picture");
        assert!(h.form.request_screenshot().await);
        h.form.remove_screenshot();

        assert_eq!(h.form.submit().await, SubmitOutcome::Sent);

        let posts = h.form.client.posts.lock().unwrap().clone();
        assert_eq!(posts[0].1.screenshot, "data:image/png;base64, ");
    }

    #[tokio::test]
    async fn test_read_failure_keeps_submitting_without_posting() {
        let capture = FakeCapture::returning(vec![Ok(ImageRef::new("img://1"))]);
        let h = harness(
            FeedbackCategory::Bug,
            capture,
            FakeReader { fail: true },
            FakeClient::default(),
        );
        h.form.update_comment("broken");
        h.form.request_screenshot().await;

        assert_eq!(h.form.submit().await, SubmitOutcome::Failed);
        assert_eq!(h.form.phase(), SubmissionPhase::Submitting);
        assert_eq!(h.form.client.post_count(), 0);
        assert_eq!(h.form.submit().await, SubmitOutcome::Ignored);
        assert_eq!(h.sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_screenshot_file_is_still_sent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.jpg");
        std::fs::write(&path, []).unwrap();

        let capture = FakeCapture::returning(vec![Ok(ImageRef::from(path.as_path()))]);
        let h = harness(
            FeedbackCategory::Bug,
            capture,
            FsFileReader,
            FakeClient::default(),
        );
        h.form.update_comment("screen was blank");
        assert!(h.form.request_screenshot().await);

        assert_eq!(h.form.submit().await, SubmitOutcome::Sent);
        assert_eq!(h.form.phase(), SubmissionPhase::Sent);

        let posts = h.form.client.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1.screenshot, "data:image/png;base64, ");
        assert_eq!(h.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_notifies_parent() {
        let h = default_harness();
        h.form.update_comment("draft");

        h.form.cancel();

        assert_eq!(h.canceled.load(Ordering::SeqCst), 1);
        assert_eq!(h.sent.load(Ordering::SeqCst), 0);
        assert_eq!(h.form.phase(), SubmissionPhase::Idle);
        assert_eq!(h.form.view().comment, "draft");
        assert_eq!(h.form.client.post_count(), 0);
    }

    #[test]
    fn test_view_reflects_category_and_state() {
        let h = default_harness();
        h.form.update_comment("hi");

        let view = h.form.view();
        assert_eq!(view.category, FeedbackCategory::Bug);
        assert_eq!(view.title, FeedbackCategory::Bug.label());
        assert_eq!(view.placeholder, FeedbackCategory::Bug.placeholder());
        assert_eq!(view.comment, "hi");
        assert!(view.submit_enabled);
        assert!(!view.is_loading);
        assert_eq!(view.screenshot, None);
    }
}
