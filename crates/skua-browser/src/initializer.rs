use crate::{Error, Result};
use playwright::Playwright;
use playwright::api::browser_type::RecordVideo;
use playwright::api::{Browser, BrowserContext, Page};
use skua_core::config::{BrowserKind, HarnessConfig, Viewport};

/// Self-contained browser setup kept alongside [`BrowserSession`].
///
/// This is the reusable-object path: it owns its configuration and
/// exposes explicit `setup_browser`/`close` calls. It launches with the
/// headless flag only -- no Docker/local argument selection -- while
/// keeping the video-recording conditional and viewport sizing, and it
/// does not navigate anywhere. Its `close` also expects the resources
/// to exist rather than skipping missing ones.
///
/// [`BrowserSession`]: crate::BrowserSession
pub struct BrowserInitializer {
    config: HarnessConfig,
    playwright: Option<Playwright>,
    browser: Option<Browser>,
    context: Option<BrowserContext>,
    page: Option<Page>,
}

impl BrowserInitializer {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            playwright: None,
            browser: None,
            context: None,
            page: None,
        }
    }

    /// Start the driver, launch the configured engine headless or not,
    /// open a context (recording video when enabled) and a page, and
    /// apply the configured window size.
    pub async fn setup_browser(&mut self) -> Result<&Page> {
        let playwright = Playwright::initialize()
            .await
            .map_err(|e| Error::Browser(format!("failed to start playwright driver: {e}")))?;
        let browser_type = match self.config.browser {
            BrowserKind::Chromium => playwright.chromium(),
            BrowserKind::Firefox => playwright.firefox(),
            BrowserKind::Webkit => playwright.webkit(),
        };
        self.playwright = Some(playwright);

        let browser = browser_type
            .launcher()
            .headless(self.config.headless)
            .launch()
            .await
            .map_err(|e| {
                Error::Browser(format!(
                    "failed to launch {}: {e}",
                    self.config.browser.as_str()
                ))
            })?;
        let browser = self.browser.insert(browser);

        let context = if self.config.video_recording {
            std::fs::create_dir_all(&self.config.video_dir)?;
            browser
                .context_builder()
                .record_video(RecordVideo {
                    dir: &self.config.video_dir,
                    size: None,
                })
                .build()
                .await
        } else {
            browser.context_builder().build().await
        }
        .map_err(|e| Error::Browser(format!("failed to open browser context: {e}")))?;
        let context = self.context.insert(context);

        let page = context
            .new_page()
            .await
            .map_err(|e| Error::Browser(format!("failed to open page: {e}")))?;
        if let Some(viewport) = self.config.viewport() {
            Self::set_window_size(&page, viewport).await?;
        }
        Ok(self.page.insert(page))
    }

    /// Resize a page to the given viewport.
    pub async fn set_window_size(page: &Page, viewport: Viewport) -> Result<()> {
        page.set_viewport_size(playwright::api::Viewport {
            width: viewport.width as i32,
            height: viewport.height as i32,
        })
        .await
        .map_err(|e| Error::Browser(format!("failed to set viewport: {e}")))
    }

    pub fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(Error::NotLaunched)
    }

    /// Release context, browser, and driver. Fails with
    /// [`Error::NotLaunched`] when `setup_browser` never ran.
    pub async fn close(&mut self) -> Result<()> {
        self.page.take();

        let context = self.context.take().ok_or(Error::NotLaunched)?;
        context
            .close()
            .await
            .map_err(|e| Error::Browser(format!("failed to close context: {e}")))?;

        let browser = self.browser.take().ok_or(Error::NotLaunched)?;
        browser
            .close()
            .await
            .map_err(|e| Error::Browser(format!("failed to close browser: {e}")))?;

        self.playwright.take().ok_or(Error::NotLaunched)?;
        Ok(())
    }
}
