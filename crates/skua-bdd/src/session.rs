use crate::hooks::SessionOps;
use crate::Result;
use async_trait::async_trait;
use skua_browser::{BrowserSession, ScreenshotRecorder};
use skua_core::config::HarnessConfig;
use skua_core::logger::RunLogger;
use skua_core::report::ReportDir;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shared state for one test run: configuration snapshot, run logger,
/// screenshot recorder, report sink, and the live browser session.
///
/// Created once at run start, handed to every hook behind an `Arc`, and
/// shut down once at run end. The browser half sits behind a mutex
/// because teardown needs exclusive access.
pub struct Session {
    config: HarnessConfig,
    logger: RunLogger,
    recorder: ScreenshotRecorder,
    report: ReportDir,
    browser: Mutex<BrowserSession>,
}

impl Session {
    /// Bring the whole run up: logging, reporting, then the browser
    /// chain navigated to the base URL. Any failure propagates and
    /// aborts the run; the caller never retries.
    pub async fn initialize(config: HarnessConfig) -> Result<Self> {
        let session = Self::offline(config)?;
        session
            .browser
            .lock()
            .await
            .launch(&session.config)
            .await?;
        info!(
            "browser session ready ({}, base url {})",
            session.config.browser.as_str(),
            session.config.base_url
        );
        Ok(session)
    }

    /// Assemble the non-browser half only; the browser comes up in
    /// [`Session::initialize`].
    fn offline(config: HarnessConfig) -> Result<Self> {
        let logger = RunLogger::create(&config.log_dir)?;
        let recorder = ScreenshotRecorder::new(&config.screenshot_dir)?;
        let report = ReportDir::create(&config.report_dir)?;

        Ok(Self {
            config,
            logger,
            recorder,
            report,
            browser: Mutex::new(BrowserSession::empty()),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Resolve a path against the configured base URL; absolute URLs
    /// pass through untouched.
    pub fn resolve_url(&self, path: &str) -> String {
        join_base(&self.config.base_url, path)
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        Ok(self.browser.lock().await.goto(url).await?)
    }

    /// Evaluate a JavaScript expression on the page and return its
    /// string result.
    pub async fn eval_string(&self, expression: &str) -> Result<String> {
        Ok(self.browser.lock().await.eval_string(expression).await?)
    }

    /// Tear the run down: close the browser chain (every resource
    /// presence-guarded, so a partially initialized session is fine)
    /// and write the log trailer. Never fails.
    pub async fn shutdown(&self) {
        self.browser.lock().await.close().await;
        if let Err(e) = self.logger.log_end() {
            warn!("failed to write run log trailer: {e}");
        }
    }
}

#[async_trait(?Send)]
impl SessionOps for Session {
    fn logger(&self) -> &RunLogger {
        &self.logger
    }

    async fn clear_storage(&self) -> Result<()> {
        Ok(self.browser.lock().await.clear_storage().await?)
    }

    async fn capture_failure_screenshot(&self) -> Result<PathBuf> {
        let browser = self.browser.lock().await;
        let page = browser.page()?;
        Ok(self.recorder.take_screenshot(page, &self.report).await?)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn join_base(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
