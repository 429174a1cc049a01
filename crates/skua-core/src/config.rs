use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which browser engine the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Rendered page dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Harness configuration, read from an optional `skua.toml`.
///
/// Every field has a default, applied per field, so a partial file is
/// fine and a missing file yields the stock setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default)]
    pub browser: BrowserKind,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,

    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// Requested window size as `"WIDTHxHEIGHT"`, e.g. `"1280x720"`.
    /// Anything that does not parse as two integers joined by `x` is
    /// ignored and the browser keeps its default viewport.
    #[serde(default)]
    pub window_size: Option<String>,

    #[serde(default)]
    pub video_recording: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Launch arguments used when the harness runs inside a container.
    #[serde(default = "default_docker_args")]
    pub docker_browser_args: Vec<String>,

    /// Launch arguments used on a developer machine.
    #[serde(default)]
    pub local_browser_args: Vec<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Captured from `RUNNING_IN_DOCKER` when the config is loaded.
    #[serde(skip)]
    pub running_in_docker: bool,
}

fn default_headless() -> bool {
    true
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("recordings/videos")
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("recordings/screenshots")
}

fn default_base_url() -> String {
    "https://www.playwright.dev/".to_string()
}

fn default_docker_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("recordings/logs")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: default_headless(),
            video_dir: default_video_dir(),
            screenshot_dir: default_screenshot_dir(),
            window_size: None,
            video_recording: false,
            base_url: default_base_url(),
            docker_browser_args: default_docker_args(),
            local_browser_args: Vec::new(),
            log_dir: default_log_dir(),
            report_dir: default_report_dir(),
            running_in_docker: false,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. The `RUNNING_IN_DOCKER` environment flag is
    /// resolved here, once, so later lookups are pure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Self = if path.exists() {
            tracing::debug!("loading configuration from {}", path.display());
            toml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            tracing::debug!("no config file at {}, using defaults", path.display());
            Self::default()
        };
        config.running_in_docker = env_flag("RUNNING_IN_DOCKER");
        Ok(config)
    }

    /// The viewport parsed from `window_size`, or `None` when unset or
    /// malformed.
    pub fn viewport(&self) -> Option<Viewport> {
        parse_window_size(self.window_size.as_deref()?)
    }

    /// Launch arguments for the current environment: the Docker list
    /// when `RUNNING_IN_DOCKER` was set at load time, the local list
    /// otherwise.
    pub fn browser_args(&self) -> &[String] {
        if self.running_in_docker {
            &self.docker_browser_args
        } else {
            &self.local_browser_args
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn parse_window_size(raw: &str) -> Option<Viewport> {
    let (width, height) = raw.split_once('x')?;
    Some(Viewport {
        width: width.parse().ok()?,
        height: height.parse().ok()?,
    })
}
