//! Action command

use anyhow::Result;
use log::warn;
use onos_charm::{dispatch, ActionOutcome, CharmContext, HookTools};
use onos_shared_types::ActionInvocation;

/// Runs one host action and reports its result
pub struct ActionCommand {
    context: CharmContext,
    reporter: Option<HookTools>,
}

impl ActionCommand {
    /// `reporter` receives `action-set`/`action-fail` calls when given
    pub fn new(context: CharmContext, reporter: Option<HookTools>) -> Self {
        Self { context, reporter }
    }

    pub async fn execute(&self, name: &str, params: &[String]) -> Result<ActionOutcome> {
        let result = self.run(name, params).await;
        if let Err(ref err) = result {
            report_failure(self.reporter.as_ref(), err).await;
        }
        result
    }

    async fn run(&self, name: &str, params: &[String]) -> Result<ActionOutcome> {
        let invocation = ActionInvocation::from_args(name, params)?;
        let outcome = dispatch(&self.context, &invocation).await?;

        let results = outcome.results();
        if let Some(ref tools) = self.reporter {
            tools.action_set(&results).await?;
        }
        super::print_json(&results)?;
        Ok(outcome)
    }
}

/// Hand `err` to `action-fail`, including its causes
pub async fn report_failure(reporter: Option<&HookTools>, err: &anyhow::Error) {
    if let Some(tools) = reporter {
        if let Err(report_err) = tools.action_fail(&format!("{:#}", err)).await {
            warn!("Could not report action failure: {}", report_err);
        }
    }
}
