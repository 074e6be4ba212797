use crate::elements::ElementDescription;
use crate::engine::RegistrationEngine;
use crate::error::RerunError;
use crate::form::GroupContext;
use crate::session::CancelToken;
use crate::session_state::SessionState;
use serde_json::json;

pub struct ScriptContext<'s> {
    pub(crate) engine: &'s mut RegistrationEngine,
    pub(crate) elements: &'s mut Vec<ElementDescription>,
    cancel: &'s CancelToken,
    pub(crate) group: GroupContext,
}

impl<'s> ScriptContext<'s> {
    pub(crate) fn new(
        engine: &'s mut RegistrationEngine,
        elements: &'s mut Vec<ElementDescription>,
        cancel: &'s CancelToken,
    ) -> Self {
        Self {
            engine,
            elements,
            cancel,
            group: GroupContext::root(),
        }
    }

    pub fn group(&self) -> &GroupContext {
        &self.group
    }

    pub fn session_state(&mut self) -> &mut SessionState {
        self.engine.session_state_mut()
    }

    pub fn checkpoint(&self) -> Result<(), RerunError> {
        if self.cancel.is_cancelled() {
            Err(RerunError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `body` inside a form; widgets declared there are batched until the
    /// form's submit button fires.
    pub fn form<T, F>(&mut self, key: &str, body: F) -> Result<T, RerunError>
    where
        F: FnOnce(&mut ScriptContext<'_>) -> Result<T, RerunError>,
    {
        let group = self.engine.open_form(key)?;
        self.elements.push(ElementDescription::container(
            "form",
            key,
            json!({ "clear_on_submit": false }),
        ));

        let result = {
            let mut inner = ScriptContext {
                engine: &mut *self.engine,
                elements: &mut *self.elements,
                cancel: self.cancel,
                group,
            };
            body(&mut inner)
        };

        self.engine.close_form(key);
        result
    }
}
