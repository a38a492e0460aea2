//! Feedback capture and submission.
//!
//! Goals:
//! - Let users report a bug, an idea or anything else with one short comment.
//! - Optionally attach a screenshot of the current screen.
//! - Keep every failure local: capture, read and submit errors are logged, never fatal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;

pub(crate) mod capture;
pub(crate) mod cli;
pub(crate) mod form;
pub(crate) mod reader;

pub(crate) use capture::{CaptureError, CaptureRequest, CaptureSource, ImageRef, ScreenCapture};
pub(crate) use form::{FeedbackForm, FormView, SubmitOutcome};
pub(crate) use reader::{FileReader, FsFileReader, ReadError};

/// Endpoint path every form posts to.
pub(crate) const FEEDBACKS_PATH: &str = "/feedbacks";

/// Media-type header of the screenshot field. The trailing space is part of the wire format.
pub(crate) const SCREENSHOT_DATA_URI_PREFIX: &str = "data:image/png;base64, ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum FeedbackCategory {
    Bug,
    Idea,
    Other,
}

impl FeedbackCategory {
    pub(crate) const ALL: [FeedbackCategory; 3] = [
        FeedbackCategory::Bug,
        FeedbackCategory::Idea,
        FeedbackCategory::Other,
    ];

    /// Wire tag sent in the `type` field.
    pub(crate) fn tag(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => "BUG",
            FeedbackCategory::Idea => "IDEA",
            FeedbackCategory::Other => "OTHER",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => "Problem",
            FeedbackCategory::Idea => "Idea",
            FeedbackCategory::Other => "Other",
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => "Something is broken or not working as expected.",
            FeedbackCategory::Idea => "A suggestion or something you would like to see.",
            FeedbackCategory::Other => "Anything else.",
        }
    }

    /// Hint shown in the empty comment box.
    pub(crate) fn placeholder(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => {
                "Something not working right? We want to fix it. Tell us in detail what is happening."
            }
            FeedbackCategory::Idea => "Have an idea for an improvement or a new feature? Tell us!",
            FeedbackCategory::Other => "We'd love to hear from you. What would you like to tell us?",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown feedback category '{0}' (expected bug, idea or other)")]
pub(crate) struct UnknownCategory(String);

impl FromStr for FeedbackCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FeedbackCategory::ALL
            .into_iter()
            .find(|category| category.tag().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCategory(needle.to_string()))
    }
}

/// Body of `POST /feedbacks`. Built fresh for each submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FeedbackPayload {
    #[serde(rename = "type")]
    pub(crate) category: FeedbackCategory,
    pub(crate) screenshot: String,
    pub(crate) comment: String,
}

impl FeedbackPayload {
    pub(crate) fn new(
        category: FeedbackCategory,
        screenshot_base64: Option<&str>,
        comment: &str,
    ) -> Self {
        Self {
            category,
            screenshot: screenshot_data_uri(screenshot_base64),
            comment: comment.to_string(),
        }
    }
}

/// The field is always present; without a screenshot the base64 part is empty.
pub(crate) fn screenshot_data_uri(base64: Option<&str>) -> String {
    format!("{SCREENSHOT_DATA_URI_PREFIX}{}", base64.unwrap_or_default())
}

/// Anything the form can fail at. All of them are logged and contained.
#[derive(Debug, Error)]
pub(crate) enum FeedbackError {
    #[error("Screenshot capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Screenshot read failed: {0}")]
    Read(#[from] ReadError),

    #[error("Feedback submission failed: {0}")]
    Submission(#[from] ApiError),
}
