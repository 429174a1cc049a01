use crate::{Error, Result};
use chrono::{DateTime, Local};
use playwright::api::{Page, ScreenshotType};
use skua_core::report::AttachmentSink;
use std::fs;
use std::path::{Path, PathBuf};

/// Captures page screenshots into a directory and mirrors the PNG bytes
/// to the report attachment sink.
pub struct ScreenshotRecorder {
    screenshot_dir: PathBuf,
}

impl ScreenshotRecorder {
    /// Create a recorder, ensuring the target directory exists. Safe to
    /// call against an existing directory.
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Result<Self> {
        let screenshot_dir = screenshot_dir.into();
        fs::create_dir_all(&screenshot_dir)?;
        Ok(Self { screenshot_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.screenshot_dir
    }

    /// Capture the page to a timestamped PNG and attach the same bytes
    /// to the report under the name `Screenshot`.
    ///
    /// File names carry second precision: two captures within the same
    /// wall-clock second map to the same path and the later one
    /// overwrites the earlier. Capture, write, and attach failures all
    /// propagate to the caller.
    pub async fn take_screenshot(
        &self,
        page: &Page,
        sink: &dyn AttachmentSink,
    ) -> Result<PathBuf> {
        let path = self.screenshot_dir.join(file_name_at(Local::now()));

        let bytes = page
            .screenshot_builder()
            .path(path.clone())
            .r#type(ScreenshotType::Png)
            .screenshot()
            .await
            .map_err(|e| Error::Screenshot(format!("page capture failed: {e}")))?;

        sink.attach("Screenshot", "image/png", &bytes)?;
        Ok(path)
    }
}

fn file_name_at(at: DateTime<Local>) -> String {
    format!("screenshot_{}.png", at.format("%Y-%m-%d_%H-%M-%S"))
}
