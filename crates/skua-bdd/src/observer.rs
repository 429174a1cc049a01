use crate::hooks::{FeatureInfo, SessionHooks, SessionOps, StepInfo};
use async_trait::async_trait;
use cucumber::{cli, event, gherkin, parser, writer, Event, World, Writer};
use skua_core::logger::RunStatus;
use std::sync::Arc;
use tracing::error;

/// Replays the runner's ordered event stream into the run log and keeps
/// step statistics for the process exit code.
///
/// Writers receive events asynchronously to scenario execution, so this
/// type never touches the browser; storage clearing and failure
/// screenshots live in the before/after hooks, which the runner awaits
/// in execution order.
pub struct SessionObserver<S> {
    hooks: Arc<SessionHooks<S>>,
    feature_failed: bool,
    passed: usize,
    skipped: usize,
    failed: usize,
    retried: usize,
    parsing_errors: usize,
    hook_errors: usize,
}

impl<S: SessionOps> SessionObserver<S> {
    pub fn new(hooks: Arc<SessionHooks<S>>) -> Self {
        Self {
            hooks,
            feature_failed: false,
            passed: 0,
            skipped: 0,
            failed: 0,
            retried: 0,
            parsing_errors: 0,
            hook_errors: 0,
        }
    }

    async fn step_finished(&mut self, step: &gherkin::Step, status: RunStatus) {
        match status {
            RunStatus::Passed => self.passed += 1,
            RunStatus::Skipped => self.skipped += 1,
            RunStatus::Failed => {
                self.failed += 1;
                self.feature_failed = true;
            }
            RunStatus::InProgress => {}
        }
        if let Err(e) = self.hooks.after_step(&StepInfo::from(step), status).await {
            error!("failed to log step result: {e}");
        }
    }

    async fn scenario_event<W: World>(&mut self, ev: event::Scenario<W>) {
        match ev {
            event::Scenario::Step(step, ev) | event::Scenario::Background(step, ev) => match ev {
                event::Step::Started => {}
                event::Step::Passed(..) => self.step_finished(&step, RunStatus::Passed).await,
                event::Step::Skipped => self.step_finished(&step, RunStatus::Skipped).await,
                event::Step::Failed(..) => self.step_finished(&step, RunStatus::Failed).await,
            },
            event::Scenario::Hook(_, event::Hook::Failed(..)) => {
                self.hook_errors += 1;
                self.feature_failed = true;
            }
            _ => {}
        }
    }

    async fn feature_finished(&mut self, feature: &gherkin::Feature) {
        let status = if self.feature_failed {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        if let Err(e) = self
            .hooks
            .after_feature(&FeatureInfo::from(feature), status)
            .await
        {
            error!("failed to log feature result: {e}");
        }
    }
}

#[async_trait(?Send)]
impl<W: World, S: SessionOps> Writer<W> for SessionObserver<S> {
    type Cli = cli::Empty;

    async fn handle_event(
        &mut self,
        ev: parser::Result<Event<event::Cucumber<W>>>,
        _cli: &Self::Cli,
    ) {
        match ev {
            Err(e) => {
                self.parsing_errors += 1;
                error!("feature parsing failed: {e}");
            }
            Ok(ev) => match ev.into_inner() {
                event::Cucumber::Feature(feature, ev) => match ev {
                    event::Feature::Started => self.feature_failed = false,
                    event::Feature::Scenario(_, scenario) => {
                        self.scenario_event(scenario.event).await;
                    }
                    event::Feature::Rule(_, event::Rule::Scenario(_, scenario)) => {
                        self.scenario_event(scenario.event).await;
                    }
                    event::Feature::Rule(..) => {}
                    event::Feature::Finished => self.feature_finished(&feature).await,
                },
                _ => {}
            },
        }
    }
}

impl<W: World, S: SessionOps> writer::Stats<W> for SessionObserver<S> {
    fn passed_steps(&self) -> usize {
        self.passed
    }

    fn skipped_steps(&self) -> usize {
        self.skipped
    }

    fn failed_steps(&self) -> usize {
        self.failed
    }

    fn retried_steps(&self) -> usize {
        self.retried
    }

    fn parsing_errors(&self) -> usize {
        self.parsing_errors
    }

    fn hook_errors(&self) -> usize {
        self.hook_errors
    }
}

impl<S> writer::NonTransforming for SessionObserver<S> {}
