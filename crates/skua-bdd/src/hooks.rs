use crate::Result;
use async_trait::async_trait;
use cucumber::gherkin;
use skua_core::logger::{Phase, RunLogger, RunStatus};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Scenario tag that opts into cookie/storage isolation on both sides
/// of the scenario. Compared exactly, case-sensitive.
pub const ISOLATE_TAG: &str = "isolate";

/// Feature metadata as the hooks see it.
#[derive(Debug, Clone)]
pub struct FeatureInfo {
    pub name: String,
}

impl From<&gherkin::Feature> for FeatureInfo {
    fn from(feature: &gherkin::Feature) -> Self {
        Self {
            name: feature.name.clone(),
        }
    }
}

/// Scenario metadata as the hooks see it.
#[derive(Debug, Clone)]
pub struct ScenarioInfo {
    pub name: String,
    pub tags: Vec<String>,
}

impl ScenarioInfo {
    pub fn is_isolated(&self) -> bool {
        self.tags.iter().any(|tag| tag == ISOLATE_TAG)
    }
}

impl From<&gherkin::Scenario> for ScenarioInfo {
    fn from(scenario: &gherkin::Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            tags: scenario.tags.clone(),
        }
    }
}

/// Step metadata as the hooks see it.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub keyword: String,
    pub name: String,
}

impl From<&gherkin::Step> for StepInfo {
    fn from(step: &gherkin::Step) -> Self {
        Self {
            keyword: step.keyword.trim().to_string(),
            name: step.value.clone(),
        }
    }
}

/// What the lifecycle hooks need from the run session.
#[async_trait(?Send)]
pub trait SessionOps {
    fn logger(&self) -> &RunLogger;

    /// Clear cookies plus local and session storage.
    async fn clear_storage(&self) -> Result<()>;

    /// Capture a screenshot of the current page into the report.
    async fn capture_failure_screenshot(&self) -> Result<PathBuf>;
}

/// Lifecycle hooks binding the runner's events to run logging, storage
/// isolation, and failure screenshots.
///
/// The runner invokes `scenario_started`/`scenario_finished` around
/// every scenario (these carry the browser side effects and are awaited
/// in execution order), while the event observer feeds `after_step` and
/// `after_feature` for logging.
pub struct SessionHooks<S> {
    session: Arc<S>,
    current_feature: Mutex<Option<String>>,
}

impl<S: SessionOps> SessionHooks<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            current_feature: Mutex::new(None),
        }
    }

    /// Per-scenario setup: runs the feature hook when this scenario
    /// opens a new feature, then the scenario hook.
    pub async fn scenario_started(
        &self,
        feature: &FeatureInfo,
        scenario: &ScenarioInfo,
    ) -> Result<()> {
        if self.enter_feature(&feature.name) {
            self.before_feature(feature).await?;
        }
        self.before_scenario(scenario).await
    }

    /// Per-scenario teardown: captures a screenshot when the scenario
    /// died on a failed step, then runs the scenario hook. A failing
    /// capture propagates and fails this teardown with it.
    pub async fn scenario_finished(
        &self,
        scenario: &ScenarioInfo,
        status: RunStatus,
        step_failed: bool,
    ) -> Result<()> {
        if step_failed {
            let path = self.session.capture_failure_screenshot().await?;
            debug!("failure screenshot written to {}", path.display());
        }
        self.after_scenario(scenario, status).await
    }

    /// Log the feature start and reset browser state for it.
    pub async fn before_feature(&self, feature: &FeatureInfo) -> Result<()> {
        self.session
            .logger()
            .log(RunStatus::InProgress, Phase::Feature, &feature.name)?;
        self.session.clear_storage().await
    }

    /// Log the feature verdict plus the spacer line.
    pub async fn after_feature(&self, feature: &FeatureInfo, status: RunStatus) -> Result<()> {
        self.session
            .logger()
            .log(status, Phase::Feature, &feature.name)?;
        self.session.logger().blank()?;
        Ok(())
    }

    /// Log the scenario start; isolated scenarios get fresh storage.
    pub async fn before_scenario(&self, scenario: &ScenarioInfo) -> Result<()> {
        self.session
            .logger()
            .log(RunStatus::InProgress, Phase::Scenario, &scenario.name)?;
        if scenario.is_isolated() {
            self.session.clear_storage().await?;
        }
        Ok(())
    }

    /// Log the scenario verdict; isolated scenarios get fresh storage
    /// again so they leak nothing into the next one.
    pub async fn after_scenario(&self, scenario: &ScenarioInfo, status: RunStatus) -> Result<()> {
        self.session
            .logger()
            .log(status, Phase::Scenario, &scenario.name)?;
        if scenario.is_isolated() {
            self.session.clear_storage().await?;
        }
        Ok(())
    }

    /// Log a step result. Screenshot capture for failed steps happens
    /// in `scenario_finished`, which the runner awaits in order.
    pub async fn after_step(&self, step: &StepInfo, status: RunStatus) -> Result<()> {
        let name = format!("{} {}", step.keyword, step.name);
        self.session.logger().log(status, Phase::Step, &name)?;
        Ok(())
    }

    /// Record `name` as the current feature; true when it differs from
    /// the previous one.
    fn enter_feature(&self, name: &str) -> bool {
        let mut current = self
            .current_feature
            .lock()
            .expect("current feature mutex poisoned");
        if current.as_deref() == Some(name) {
            false
        } else {
            *current = Some(name.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSession {
        logger: RunLogger,
        clear_calls: AtomicUsize,
        capture_calls: AtomicUsize,
        _dir: tempfile::TempDir,
    }

    impl FakeSession {
        fn new() -> Arc<Self> {
            let dir = tempfile::tempdir().unwrap();
            Arc::new(Self {
                logger: RunLogger::create(dir.path()).unwrap(),
                clear_calls: AtomicUsize::new(0),
                capture_calls: AtomicUsize::new(0),
                _dir: dir,
            })
        }

        fn clears(&self) -> usize {
            self.clear_calls.load(Ordering::SeqCst)
        }

        fn captures(&self) -> usize {
            self.capture_calls.load(Ordering::SeqCst)
        }

        fn log_lines(&self) -> Vec<String> {
            std::fs::read_to_string(self.logger.path())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl SessionOps for FakeSession {
        fn logger(&self) -> &RunLogger {
            &self.logger
        }

        async fn clear_storage(&self) -> Result<()> {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn capture_failure_screenshot(&self) -> Result<PathBuf> {
            self.capture_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::from("screenshot.png"))
        }
    }

    fn scenario(name: &str, tags: &[&str]) -> ScenarioInfo {
        ScenarioInfo {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn feature(name: &str) -> FeatureInfo {
        FeatureInfo {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_isolated_scenario_clears_before_and_after() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());
        let isolated = scenario("login", &["isolate"]);

        hooks.before_scenario(&isolated).await.unwrap();
        hooks
            .after_scenario(&isolated, RunStatus::Passed)
            .await
            .unwrap();

        assert_eq!(session.clears(), 2);
    }

    #[tokio::test]
    async fn test_untagged_scenario_never_clears() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());
        let plain = scenario("browse", &["smoke"]);

        hooks.before_scenario(&plain).await.unwrap();
        hooks
            .after_scenario(&plain, RunStatus::Failed)
            .await
            .unwrap();

        assert_eq!(session.clears(), 0);
    }

    #[tokio::test]
    async fn test_isolate_tag_match_is_exact() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());

        hooks
            .before_scenario(&scenario("x", &["Isolate", "isolated"]))
            .await
            .unwrap();

        assert_eq!(session.clears(), 0);
    }

    #[tokio::test]
    async fn test_failed_step_captures_exactly_once() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());

        hooks
            .scenario_finished(&scenario("broken", &[]), RunStatus::Failed, true)
            .await
            .unwrap();

        assert_eq!(session.captures(), 1);
    }

    #[tokio::test]
    async fn test_passed_scenario_captures_nothing() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());

        hooks
            .scenario_finished(&scenario("fine", &[]), RunStatus::Passed, false)
            .await
            .unwrap();
        hooks
            .after_step(
                &StepInfo {
                    keyword: "Then".to_string(),
                    name: "it works".to_string(),
                },
                RunStatus::Passed,
            )
            .await
            .unwrap();

        assert_eq!(session.captures(), 0);
    }

    #[tokio::test]
    async fn test_hook_failure_without_failed_step_skips_capture() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());

        hooks
            .scenario_finished(&scenario("aborted", &[]), RunStatus::Failed, false)
            .await
            .unwrap();

        assert_eq!(session.captures(), 0);
    }

    #[tokio::test]
    async fn test_feature_hook_runs_once_per_feature() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());
        let checkout = feature("Checkout");

        hooks
            .scenario_started(&checkout, &scenario("a", &[]))
            .await
            .unwrap();
        hooks
            .scenario_started(&checkout, &scenario("b", &[]))
            .await
            .unwrap();
        hooks
            .scenario_started(&feature("Search"), &scenario("c", &[]))
            .await
            .unwrap();

        // One storage reset per feature entered, none per plain scenario.
        assert_eq!(session.clears(), 2);

        let feature_starts: Vec<String> = session
            .log_lines()
            .into_iter()
            .filter(|l| l.contains(" FEATURE - "))
            .collect();
        assert_eq!(
            feature_starts,
            vec![
                "START  -  FEATURE - Checkout".to_string(),
                "START  -  FEATURE - Search".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_log_lines_match_expected_shape() {
        let session = FakeSession::new();
        let hooks = SessionHooks::new(session.clone());

        hooks
            .scenario_started(&feature("Docs"), &scenario("opens intro", &[]))
            .await
            .unwrap();
        hooks
            .after_step(
                &StepInfo {
                    keyword: "Given".to_string(),
                    name: "the browser is on the start page".to_string(),
                },
                RunStatus::Passed,
            )
            .await
            .unwrap();
        hooks
            .scenario_finished(&scenario("opens intro", &[]), RunStatus::Passed, false)
            .await
            .unwrap();
        hooks
            .after_feature(&feature("Docs"), RunStatus::Passed)
            .await
            .unwrap();

        assert_eq!(
            session.log_lines(),
            vec![
                "START  -  FEATURE - Docs".to_string(),
                "START  - SCENARIO - opens intro".to_string(),
                "PASSED -   STEP   - Given the browser is on the start page".to_string(),
                "PASSED - SCENARIO - opens intro".to_string(),
                "PASSED -  FEATURE - Docs".to_string(),
                String::new(),
            ]
        );
    }
}
