//! Screen capture backends.
//!
//! By default the primary monitor is grabbed in-process with `xcap`. A configured shell command
//! replaces that, for example a compositor-specific tool. Either way the image lands in a
//! private temp directory that is removed together with the backend, and the form gets the
//! path back as an [`ImageRef`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use crate::config::CaptureConfig;

const FILE_SCHEME: &str = "file://";

/// Opaque reference to a captured image. Usually a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageRef(String);

impl ImageRef {
    pub(crate) fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Local path for the reference, with any `file://` scheme stripped.
    pub(crate) fn to_path(&self) -> PathBuf {
        let uri = self.as_str();
        PathBuf::from(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri))
    }
}

impl From<&Path> for ImageRef {
    fn from(path: &Path) -> Self {
        Self(path.display().to_string())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CaptureRequest {
    pub(crate) image_format: String,
    /// 0.0 to 1.0
    pub(crate) quality: f32,
}

impl CaptureRequest {
    pub(crate) fn from_config(config: &CaptureConfig) -> Self {
        Self {
            image_format: config.image_format.clone(),
            quality: config.quality.clamp(0.0, 1.0),
        }
    }
}

impl CaptureRequest {
    fn extension(&self) -> &str {
        let ext = self.image_format.trim().trim_start_matches('.');
        if ext.is_empty() {
            "png"
        } else {
            ext
        }
    }

    #[cfg_attr(not(feature = "screen-capture"), allow(dead_code))]
    fn is_jpeg(&self) -> bool {
        matches!(self.extension().to_ascii_lowercase().as_str(), "jpg" | "jpeg")
    }

    fn quality_pct(&self) -> u32 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

#[derive(Error, Debug)]
pub(crate) enum CaptureError {
    #[error("No screenshot command configured")]
    NotConfigured,

    #[error("Screenshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Screenshot command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Screenshot command produced no image at {0}")]
    MissingOutput(PathBuf),

    #[cfg_attr(not(feature = "screen-capture"), allow(dead_code))]
    #[error("Screen grab failed: {0}")]
    Screen(String),

    #[cfg_attr(not(feature = "screen-capture"), allow(dead_code))]
    #[error("Could not encode screenshot: {0}")]
    Encode(String),
}

pub(crate) trait ScreenCapture {
    async fn capture(&self, request: &CaptureRequest) -> Result<ImageRef, CaptureError>;
}

/// Temp directory holding captured images. Deleted when the last clone is dropped.
#[derive(Debug, Clone)]
pub(crate) struct CaptureDir(Arc<TempDir>);

impl CaptureDir {
    pub(crate) fn new() -> Result<Self, CaptureError> {
        let dir = tempfile::Builder::new()
            .prefix("feedback-form-")
            .tempdir()?;
        Ok(Self(Arc::new(dir)))
    }

    #[cfg(test)]
    fn from_temp_dir(dir: TempDir) -> Self {
        Self(Arc::new(dir))
    }

    pub(crate) fn path(&self) -> &Path {
        self.0.path()
    }

    fn image_path(&self, request: &CaptureRequest) -> PathBuf {
        self.path().join(format!(
            "feedback-screenshot-{}.{}",
            Uuid::new_v4().simple(),
            request.extension()
        ))
    }
}

/// Runs a shell command template such as `grim -t {format} {path}`.
#[derive(Debug, Clone)]
pub(crate) struct CommandCapture {
    template: Option<String>,
    dir: CaptureDir,
}

impl CommandCapture {
    pub(crate) fn new(template: Option<&str>, dir: CaptureDir) -> Self {
        Self {
            template: template
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            dir,
        }
    }
}

impl ScreenCapture for CommandCapture {
    async fn capture(&self, request: &CaptureRequest) -> Result<ImageRef, CaptureError> {
        let template = self.template.as_deref().ok_or(CaptureError::NotConfigured)?;
        let path = self.dir.image_path(request);
        let command_line = expand_template(template, &path, request);
        debug!(command = %command_line, "running screenshot command");

        let output = shell(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(CaptureError::MissingOutput(path));
        }

        Ok(ImageRef::from(path.as_path()))
    }
}

/// Grabs the monitor at the desktop origin with `xcap`.
#[cfg(feature = "screen-capture")]
#[derive(Debug, Clone)]
pub(crate) struct ScreenGrab {
    dir: CaptureDir,
}

#[cfg(feature = "screen-capture")]
impl ScreenGrab {
    pub(crate) fn new(dir: CaptureDir) -> Self {
        Self { dir }
    }
}

#[cfg(feature = "screen-capture")]
impl ScreenCapture for ScreenGrab {
    async fn capture(&self, request: &CaptureRequest) -> Result<ImageRef, CaptureError> {
        let path = self.dir.image_path(request);
        let target = path.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || grab_primary_monitor(&target, &request))
            .await
            .map_err(|e| CaptureError::Screen(e.to_string()))??;

        Ok(ImageRef::from(path.as_path()))
    }
}

#[cfg(feature = "screen-capture")]
fn grab_primary_monitor(path: &Path, request: &CaptureRequest) -> Result<(), CaptureError> {
    let monitor =
        xcap::Monitor::from_point(0, 0).map_err(|e| CaptureError::Screen(e.to_string()))?;
    let frame = monitor
        .capture_image()
        .map_err(|e| CaptureError::Screen(e.to_string()))?;
    debug!(width = frame.width(), height = frame.height(), "grabbed monitor");
    write_image(frame, path, request)
}

/// JPEG has no alpha channel, so the frame is flattened to RGB first.
#[cfg(feature = "screen-capture")]
fn write_image(
    frame: image::RgbaImage,
    path: &Path,
    request: &CaptureRequest,
) -> Result<(), CaptureError> {
    use std::io::{BufWriter, Write};

    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageFormat};

    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    if request.is_jpeg() {
        let rgb = DynamicImage::ImageRgba8(frame).into_rgb8();
        let quality = request.quality_pct().clamp(1, 100) as u8;
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(&rgb)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    } else {
        frame
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Attaches an image that already exists on disk.
#[derive(Debug, Clone)]
pub(crate) struct StaticCapture {
    path: PathBuf,
}

impl StaticCapture {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ScreenCapture for StaticCapture {
    async fn capture(&self, _request: &CaptureRequest) -> Result<ImageRef, CaptureError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Err(CaptureError::MissingOutput(self.path.clone()));
        }
        Ok(ImageRef::from(self.path.as_path()))
    }
}

/// Backend picked at startup (command line or config).
#[derive(Debug, Clone)]
pub(crate) enum CaptureSource {
    #[cfg(feature = "screen-capture")]
    Screen(ScreenGrab),
    Command(CommandCapture),
    Static(StaticCapture),
}

impl CaptureSource {
    /// A configured command wins; otherwise the screen is grabbed directly.
    pub(crate) fn from_config(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let dir = CaptureDir::new()?;
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match command {
            Some(template) => Ok(CaptureSource::Command(CommandCapture::new(Some(template), dir))),
            #[cfg(feature = "screen-capture")]
            None => Ok(CaptureSource::Screen(ScreenGrab::new(dir))),
            #[cfg(not(feature = "screen-capture"))]
            None => Ok(CaptureSource::Command(CommandCapture::new(None, dir))),
        }
    }
}

impl ScreenCapture for CaptureSource {
    async fn capture(&self, request: &CaptureRequest) -> Result<ImageRef, CaptureError> {
        match self {
            #[cfg(feature = "screen-capture")]
            CaptureSource::Screen(inner) => inner.capture(request).await,
            CaptureSource::Command(inner) => inner.capture(request).await,
            CaptureSource::Static(inner) => inner.capture(request).await,
        }
    }
}

fn expand_template(template: &str, path: &Path, request: &CaptureRequest) -> String {
    let quality = request.quality.clamp(0.0, 1.0);
    template
        .replace("{path}", &quote_path(path))
        .replace("{format}", request.image_format.trim())
        .replace("{quality_pct}", &request.quality_pct().to_string())
        .replace("{quality}", &format!("{quality:.2}"))
}

/// Paths go through the shell as a single word.
#[cfg(windows)]
fn quote_path(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

#[cfg(not(windows))]
fn quote_path(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

#[cfg(windows)]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(command_line);
    cmd
}

#[cfg(not(windows))]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}
