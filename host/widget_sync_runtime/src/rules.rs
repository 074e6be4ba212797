use crate::error::{WidgetError, WidgetResult};
use crate::form::{FormRole, GroupContext};
use crate::session_state::SessionState;

const FORM_DOCS_INFO: &str = "only form submit buttons can trigger actions inside a form";

#[derive(Debug, Clone, Copy)]
pub struct RuleChecker {
    pub enforce_form_rules: bool,
}

impl Default for RuleChecker {
    fn default() -> Self {
        Self {
            enforce_form_rules: true,
        }
    }
}

impl RuleChecker {
    pub fn check_placement(
        &self,
        type_tag: &str,
        role: FormRole,
        group: &GroupContext,
    ) -> WidgetResult<()> {
        if !self.enforce_form_rules {
            return Ok(());
        }
        match (role, group.group_id()) {
            (FormRole::Standalone, Some(form)) => Err(WidgetError::IncompatibleWithForm {
                widget: type_tag.to_string(),
                reason: format!("found inside form '{form}'; {FORM_DOCS_INFO}"),
            }),
            (FormRole::Submitter, _) if !group.is_open() => Err(WidgetError::MissingFormContext {
                widget: type_tag.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Runs after identity derivation, so a key shared by two widgets has
    /// already failed as a duplicate.
    pub fn check_state_writes(
        &self,
        user_key: Option<&str>,
        writes_allowed: bool,
        has_default: bool,
        session_state: &SessionState,
    ) -> WidgetResult<()> {
        let Some(key) = user_key else {
            return Ok(());
        };
        if !session_state.contains(key) {
            return Ok(());
        }

        if !writes_allowed {
            return Err(WidgetError::ConflictingWidgetState {
                key: key.to_string(),
                reason: "this widget's value can't be set through session state".to_string(),
            });
        }

        if has_default {
            tracing::warn!(
                key,
                "widget was created with a default value but its value was also set through session state"
            );
        }
        Ok(())
    }
}
