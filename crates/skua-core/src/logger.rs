use crate::Result;
use chrono::Local;
use console::style;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Outcome of a lifecycle phase as rendered in the run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Passed,
    Failed,
    Skipped,
}

impl RunStatus {
    /// Label padded so the status column lines up across phases.
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "START ",
            RunStatus::Passed => "PASSED",
            RunStatus::Failed => "FAILED",
            RunStatus::Skipped => "SKIPPED",
        }
    }
}

/// Lifecycle phase column of a run-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Feature,
    Scenario,
    Step,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Feature => " FEATURE",
            Phase::Scenario => "SCENARIO",
            Phase::Step => "  STEP  ",
        }
    }
}

/// Appends status lines to a per-run log file and mirrors each line to
/// the console with status-based coloring.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Open a fresh log file under `log_dir`, creating the directory if
    /// needed. The file name carries the run's start timestamp.
    pub fn create(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        std::fs::create_dir_all(log_dir)?;

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = log_dir.join(format!("run_{stamp}.log"));
        let file = File::create(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Where this run's log lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one status line, e.g. `PASSED - SCENARIO - Login works`.
    pub fn log(&self, status: RunStatus, phase: Phase, name: &str) -> Result<()> {
        let line = format!("{} - {} - {}", status.label(), phase.label(), name);
        self.write_line(&line)?;
        self.mirror(status, &line);
        Ok(())
    }

    /// Spacer line between features.
    pub fn blank(&self) -> Result<()> {
        self.write_line("")?;
        println!();
        Ok(())
    }

    /// Trailer written when the run shuts down.
    pub fn log_end(&self) -> Result<()> {
        let line = format!(
            "Test run finished - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.write_line(&line)?;
        println!("{line}");
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut file = self.file.lock().expect("run log mutex poisoned");
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn mirror(&self, status: RunStatus, line: &str) {
        let styled = match status {
            RunStatus::InProgress => style(line).cyan(),
            RunStatus::Passed => style(line).green(),
            RunStatus::Failed => style(line).red(),
            RunStatus::Skipped => style(line).yellow(),
        };
        println!("{styled}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_log(logger: &RunLogger) -> String {
        std::fs::read_to_string(logger.path()).unwrap()
    }

    #[test]
    fn test_log_line_shape() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::create(dir.path()).unwrap();

        logger
            .log(RunStatus::InProgress, Phase::Feature, "Checkout")
            .unwrap();
        logger
            .log(RunStatus::Passed, Phase::Scenario, "Adds an item")
            .unwrap();
        logger
            .log(RunStatus::Failed, Phase::Step, "When the cart is empty")
            .unwrap();

        let contents = read_log(&logger);
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], "START  -  FEATURE - Checkout");
        assert_eq!(lines[1], "PASSED - SCENARIO - Adds an item");
        assert_eq!(lines[2], "FAILED -   STEP   - When the cart is empty");
    }

    #[test]
    fn test_blank_and_end_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::create(dir.path()).unwrap();

        logger
            .log(RunStatus::Passed, Phase::Feature, "Smoke")
            .unwrap();
        logger.blank().unwrap();
        logger.log_end().unwrap();

        let contents = read_log(&logger);
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("Test run finished - "));
    }

    #[test]
    fn test_log_file_created_under_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::create(dir.path().join("logs")).unwrap();

        assert!(logger.path().starts_with(dir.path().join("logs")));
        assert!(logger.path().exists());
        let name = logger.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("run_") && name.ends_with(".log"));
    }
}
