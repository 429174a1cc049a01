use crate::{Error, Result};
use playwright::Playwright;
use playwright::api::browser_type::RecordVideo;
use playwright::api::{Browser, BrowserContext, BrowserType, Page};
use skua_core::config::{BrowserKind, HarnessConfig};
use tracing::{debug, warn};

/// One live browser session: driver, browser, isolated context, page.
///
/// Every resource is optional so a setup that failed partway can still
/// be torn down. Ordering invariant: the driver outlives the browser,
/// the browser outlives the context, the context outlives the page.
pub struct BrowserSession {
    playwright: Option<Playwright>,
    browser: Option<Browser>,
    context: Option<BrowserContext>,
    page: Option<Page>,
}

impl BrowserSession {
    /// A session with nothing launched yet.
    pub fn empty() -> Self {
        Self {
            playwright: None,
            browser: None,
            context: None,
            page: None,
        }
    }

    /// Bring the whole chain up: start the driver, launch the engine
    /// selected by the config with the environment's launch arguments,
    /// open one isolated context (recording video when enabled), open a
    /// page, size it, and navigate to the base URL.
    ///
    /// Resources are stored as soon as they exist, so on failure the
    /// session holds whatever came up and `close` can release it.
    pub async fn launch(&mut self, config: &HarnessConfig) -> Result<()> {
        let playwright = Playwright::initialize()
            .await
            .map_err(|e| Error::Browser(format!("failed to start playwright driver: {e}")))?;
        let browser_type = select_browser_type(&playwright, config.browser);
        self.playwright = Some(playwright);

        let args = config.browser_args().to_vec();
        debug!(
            "launching {} (headless: {}, args: {:?})",
            config.browser.as_str(),
            config.headless,
            args
        );
        let browser = browser_type
            .launcher()
            .headless(config.headless)
            .args(&args)
            .launch()
            .await
            .map_err(|e| {
                Error::Browser(format!("failed to launch {}: {e}", config.browser.as_str()))
            })?;
        let browser = self.browser.insert(browser);

        let context = if config.video_recording {
            std::fs::create_dir_all(&config.video_dir)?;
            browser
                .context_builder()
                .record_video(RecordVideo {
                    dir: &config.video_dir,
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
        if let Some(viewport) = config.viewport() {
            page.set_viewport_size(playwright::api::Viewport {
                width: viewport.width as i32,
                height: viewport.height as i32,
            })
            .await
            .map_err(|e| Error::Browser(format!("failed to set viewport: {e}")))?;
        }
        self.page = Some(page);

        self.goto(&config.base_url).await
    }

    /// Whether the full chain is up.
    pub fn is_launched(&self) -> bool {
        self.page.is_some()
    }

    /// The live page, or an error when setup has not run.
    pub fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(Error::NotLaunched)
    }

    /// Navigate the page.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        page.goto_builder(url)
            .goto()
            .await
            .map_err(|e| Error::Browser(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    /// Evaluate a JavaScript expression on the page and return its
    /// string result.
    pub async fn eval_string(&self, expression: &str) -> Result<String> {
        let page = self.page()?;
        page.evaluate::<_, String>(expression, ())
            .await
            .map_err(|e| Error::Browser(format!("evaluate failed: {e}")))
    }

    /// Clear context cookies plus the page's local and session storage.
    pub async fn clear_storage(&self) -> Result<()> {
        let context = self.context.as_ref().ok_or(Error::NotLaunched)?;
        let page = self.page()?;

        context
            .clear_cookies()
            .await
            .map_err(|e| Error::Browser(format!("failed to clear cookies: {e}")))?;
        page.evaluate::<_, ()>(
            "() => { window.sessionStorage.clear(); window.localStorage.clear(); }",
            (),
        )
        .await
        .map_err(|e| Error::Browser(format!("failed to clear storage: {e}")))?;
        Ok(())
    }

    /// Release everything in reverse order of acquisition. Resources
    /// that never came up are skipped; close errors are demoted to
    /// warnings so teardown cannot fail a run that already has a
    /// verdict.
    pub async fn close(&mut self) {
        self.page.take();
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close().await {
                warn!("browser context close failed: {e}");
            }
        }
        if let Some(browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {e}");
            }
        }
        // Dropping the driver handle stops the playwright process.
        self.playwright.take();
    }
}

fn select_browser_type(playwright: &Playwright, kind: BrowserKind) -> BrowserType {
    match kind {
        BrowserKind::Chromium => playwright.chromium(),
        BrowserKind::Firefox => playwright.firefox(),
        BrowserKind::Webkit => playwright.webkit(),
    }
}
