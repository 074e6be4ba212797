use crate::callback::CallbackBinding;
use crate::error::{WidgetError, WidgetResult};
use crate::identity::WidgetId;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupContext {
    group_id: Option<String>,
}

impl GroupContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn form(group_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.group_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRole {
    Member,
    /// Rejected inside forms.
    Standalone,
    Submitter,
}

#[derive(Debug)]
pub struct QueuedCallback {
    pub id: WidgetId,
    pub binding: CallbackBinding,
}

#[derive(Debug, Default)]
pub struct FormBuffer {
    /// Members changed since their form was last submitted, per form.
    awaiting: HashMap<String, IndexSet<WidgetId>>,
    queued: HashMap<String, Vec<QueuedCallback>>,
    declared: HashSet<WidgetId>,
    opened: HashSet<String>,
    submitters: HashSet<String>,
    submitted: HashSet<String>,
    current: Option<String>,
}

impl FormBuffer {
    pub fn begin_rerun(&mut self) {
        self.queued.clear();
        self.declared.clear();
        self.opened.clear();
        self.submitters.clear();
        self.submitted.clear();
        self.current = None;
    }

    pub fn open(&mut self, group_id: &str) -> WidgetResult<GroupContext> {
        if let Some(current) = &self.current {
            return Err(WidgetError::IncompatibleWithForm {
                widget: "form".to_string(),
                reason: format!("forms can't be nested (inside '{current}')"),
            });
        }
        if !self.opened.insert(group_id.to_string()) {
            return Err(WidgetError::DuplicateWidgetKey {
                key: group_id.to_string(),
            });
        }
        self.current = Some(group_id.to_string());
        Ok(GroupContext::form(group_id))
    }

    pub fn close(&mut self, group_id: &str) {
        if self.current.as_deref() == Some(group_id) {
            self.current = None;
        }
        if !self.submitters.contains(group_id) {
            tracing::warn!(form = group_id, "form has no submit button; its members can't be submitted");
        }
        if let Some(unreleased) = self.queued.remove(group_id) {
            tracing::trace!(
                form = group_id,
                callbacks = unreleased.len(),
                "member callbacks stay deferred until submit"
            );
        }
    }

    /// Holds back a member's callback. `changed` marks the member as awaiting
    /// submit; a member already awaiting submit queues its current binding.
    ///
    /// Returns the binding to run right away when the form was already
    /// submitted earlier in this rerun.
    pub fn defer(
        &mut self,
        group_id: &str,
        id: &WidgetId,
        changed: bool,
        binding: Option<CallbackBinding>,
    ) -> Option<CallbackBinding> {
        self.declared.insert(id.clone());
        let awaiting = self.awaiting.entry(group_id.to_string()).or_default();
        if changed {
            awaiting.insert(id.clone());
        }
        if !awaiting.contains(id) {
            return None;
        }
        if self.submitted.contains(group_id) {
            awaiting.shift_remove(id);
            return binding;
        }
        if let Some(binding) = binding {
            self.queued
                .entry(group_id.to_string())
                .or_default()
                .push(QueuedCallback {
                    id: id.clone(),
                    binding,
                });
        }
        None
    }

    pub fn note_submitter(&mut self, group_id: &str) {
        self.submitters.insert(group_id.to_string());
    }

    /// Releases the form's queued member callbacks in registration order.
    /// Members declared after the submit button stay awaiting until they
    /// register.
    pub fn release(&mut self, group_id: &str) -> Vec<QueuedCallback> {
        self.submitted.insert(group_id.to_string());
        if let Some(members) = self.awaiting.get_mut(group_id) {
            members.retain(|id| !self.declared.contains(id));
            if members.is_empty() {
                self.awaiting.remove(group_id);
            }
        }
        self.queued.remove(group_id).unwrap_or_default()
    }

    pub fn is_awaiting(&self, id: &WidgetId) -> bool {
        self.awaiting.values().any(|members| members.contains(id))
    }

    pub fn forget(&mut self, pruned: &[WidgetId]) {
        for members in self.awaiting.values_mut() {
            members.retain(|id| !pruned.contains(id));
        }
        self.awaiting.retain(|_, members| !members.is_empty());
    }
}
