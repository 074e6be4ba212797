use crate::context::ScriptContext;
use crate::elements::ElementDescription;
use crate::engine::RegistrationEngine;
use crate::error::RerunError;
use crate::identity::WidgetId;
use crate::rules::RuleChecker;
use crate::store::{PendingUpdate, WidgetStateStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub enforce_form_rules: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enforce_form_rules: true,
        }
    }
}

#[derive(Debug)]
pub struct RerunOutcome {
    pub rerun: u64,
    pub elements: Vec<ElementDescription>,
    pub pruned: Vec<WidgetId>,
}

/// A rerun that stopped early. `elements` holds the incomplete output.
#[derive(Debug, thiserror::Error)]
#[error("rerun {rerun} aborted: {error}")]
pub struct RerunAborted {
    pub rerun: u64,
    #[source]
    pub error: RerunError,
    pub elements: Vec<ElementDescription>,
}

#[derive(Debug, Default)]
pub struct Session {
    engine: RegistrationEngine,
    cancel: CancelToken,
    reruns: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            engine: RegistrationEngine::new(RuleChecker {
                enforce_form_rules: config.enforce_form_rules,
            }),
            ..Self::default()
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn enqueue(&mut self, update: PendingUpdate) {
        self.engine.enqueue(update);
    }

    /// Runs `script` top to bottom once.
    ///
    /// Updates enqueued before this call are visible to the script; the cancel
    /// token is not reset here, the transport owns that.
    pub fn rerun<F>(&mut self, script: F) -> Result<RerunOutcome, RerunAborted>
    where
        F: FnOnce(&mut ScriptContext<'_>) -> Result<(), RerunError>,
    {
        self.reruns += 1;
        let rerun = self.reruns;
        let mut elements = Vec::new();

        self.engine.begin_rerun();
        let result = {
            let mut ctx = ScriptContext::new(&mut self.engine, &mut elements, &self.cancel);
            script(&mut ctx)
        };

        match result {
            Ok(()) => {
                let pruned = self.engine.finish_rerun();
                tracing::info!(
                    rerun,
                    widgets = self.engine.store().len(),
                    elements = elements.len(),
                    pruned = pruned.len(),
                    "rerun finished"
                );
                Ok(RerunOutcome {
                    rerun,
                    elements,
                    pruned,
                })
            }
            Err(error) => {
                self.engine.abort_rerun();
                tracing::warn!(rerun, code = error.code(), %error, "rerun aborted");
                Err(RerunAborted {
                    rerun,
                    error,
                    elements,
                })
            }
        }
    }

    pub fn reruns(&self) -> u64 {
        self.reruns
    }

    pub fn store(&self) -> &WidgetStateStore {
        self.engine.store()
    }

    pub fn engine(&self) -> &RegistrationEngine {
        &self.engine
    }
}
