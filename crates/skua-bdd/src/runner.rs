use crate::hooks::{FeatureInfo, ScenarioInfo, SessionHooks};
use crate::observer::SessionObserver;
use crate::session::Session;
use crate::world::SessionWorld;
use cucumber::event::ScenarioFinished;
use cucumber::writer::Stats as _;
use cucumber::{World as _, WriterExt as _};
use futures::FutureExt as _;
use skua_core::logger::RunStatus;
use std::path::Path;
use std::sync::Arc;

/// Run the BDD suite under `features` against an initialized session.
///
/// Scenarios run one at a time: the harness owns a single browser
/// session and the hooks mutate its storage, so interleaving would
/// cross-contaminate scenarios. Returns `true` when any step failed, a
/// hook errored, or a feature file failed to parse.
pub async fn run_suite(session: Arc<Session>, features: impl AsRef<Path>) -> bool {
    let hooks = Arc::new(SessionHooks::new(session));
    let observer = SessionObserver::new(hooks.clone());

    let before_hooks = hooks.clone();
    let after_hooks = hooks.clone();

    let writer = SessionWorld::cucumber()
        .max_concurrent_scenarios(1)
        .with_writer(observer.normalized())
        .before(move |feature, _rule, scenario, _world| {
            let hooks = before_hooks.clone();
            let feature = FeatureInfo::from(feature);
            let scenario = ScenarioInfo::from(scenario);
            async move {
                if let Err(e) = hooks.scenario_started(&feature, &scenario).await {
                    panic!("scenario setup failed: {e}");
                }
            }
            .boxed_local()
        })
        .after(move |_feature, _rule, scenario, finished, _world| {
            let hooks = after_hooks.clone();
            let scenario = ScenarioInfo::from(scenario);
            let (status, step_failed) = match finished {
                ScenarioFinished::StepPassed => (RunStatus::Passed, false),
                ScenarioFinished::StepFailed(..) => (RunStatus::Failed, true),
                _ => (RunStatus::Failed, false),
            };
            async move {
                if let Err(e) = hooks.scenario_finished(&scenario, status, step_failed).await {
                    panic!("scenario teardown failed: {e}");
                }
            }
            .boxed_local()
        })
        .run(features)
        .await;

    writer.execution_has_failed()
}
