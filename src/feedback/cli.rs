use std::path::PathBuf;

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::warn;

use crate::api::ApiClient;
use crate::config::Config;
use crate::feedback::capture::StaticCapture;
use crate::feedback::{
    CaptureRequest, CaptureSource, FeedbackCategory, FeedbackForm, FsFileReader, SubmitOutcome,
};

pub(crate) struct SendArgs {
    pub(crate) category: FeedbackCategory,
    pub(crate) comment: String,
    pub(crate) screenshot: Option<PathBuf>,
    pub(crate) capture: bool,
}

pub(crate) fn run_send(rt: &tokio::runtime::Runtime, config: &Config, args: SendArgs) -> Result<()> {
    let capture = match args.screenshot {
        Some(path) => CaptureSource::Static(StaticCapture::new(path)),
        None => CaptureSource::from_config(&config.capture)?,
    };
    let wants_screenshot = args.capture || matches!(capture, CaptureSource::Static(_));

    let client = ApiClient::from_config(&config.api);
    let endpoint = client.base_url().to_string();

    let form = FeedbackForm::new(
        args.category,
        capture,
        FsFileReader,
        client,
        Box::new(|| {}),
        Box::new(|| println!("{}", "✓ Feedback sent. Thank you.".bright_green())),
    )
    .with_capture_request(CaptureRequest::from_config(&config.capture));

    println!();
    println!(
        "{} {}",
        form.view().title.bright_cyan().bold(),
        format!("({})", form.category().tag()).bright_black()
    );

    form.update_comment(args.comment);
    if !form.submit_enabled() {
        bail!("A comment is required before feedback can be sent.");
    }

    if wants_screenshot {
        if rt.block_on(form.request_screenshot()) {
            if let Some(image) = form.screenshot() {
                println!("  {} {}", "Screenshot:".bright_white(), image);
            }
        } else {
            warn!("sending feedback without a screenshot");
        }
    }

    println!("{} {}", "Sending feedback to".bright_cyan(), endpoint);

    match rt.block_on(form.submit()) {
        SubmitOutcome::Sent => Ok(()),
        SubmitOutcome::Failed => bail!("Feedback was not sent. Run with --verbose for details."),
        SubmitOutcome::Ignored => bail!("Feedback is already being sent."),
    }
}

pub(crate) fn print_categories() {
    println!();
    println!("{}", "Feedback categories".bright_cyan().bold());
    for category in FeedbackCategory::ALL {
        println!(
            "  {:<6} {} {}",
            category.tag().to_ascii_lowercase().bright_white(),
            category.label().bold(),
            format!("— {}", category.description()).bright_black()
        );
    }
}
