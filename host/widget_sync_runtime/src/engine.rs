use crate::callback::CallbackBinding;
use crate::codec::WidgetCodec;
use crate::error::{WidgetError, WidgetResult};
use crate::form::{FormBuffer, FormRole, GroupContext};
use crate::identity::{IdentityDeriver, IdentitySeed, WidgetId};
use crate::rules::RuleChecker;
use crate::session_state::SessionState;
use crate::store::{PendingUpdate, WidgetStateStore};
use crate::value::{Origin, WireValue};

pub struct WidgetRegistration<'a, C: WidgetCodec> {
    pub codec: &'a C,
    pub label: &'a str,
    pub user_key: Option<&'a str>,
    pub role: FormRole,
    pub writes_allowed: bool,
    pub default: Option<C::Value>,
    pub callback: Option<CallbackBinding>,
}

impl<'a, C: WidgetCodec> WidgetRegistration<'a, C> {
    pub fn new(codec: &'a C, label: &'a str) -> Self {
        Self {
            codec,
            label,
            user_key: None,
            role: FormRole::Member,
            writes_allowed: true,
            default: None,
            callback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registered<T> {
    pub id: WidgetId,
    pub value: T,
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct RegistrationEngine {
    store: WidgetStateStore,
    forms: FormBuffer,
    deriver: IdentityDeriver,
    rules: RuleChecker,
    session_state: SessionState,
}

impl RegistrationEngine {
    pub fn new(rules: RuleChecker) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn enqueue(&mut self, update: PendingUpdate) {
        self.store.enqueue(update);
    }

    pub fn begin_rerun(&mut self) {
        self.store.begin_rerun();
        self.forms.begin_rerun();
        self.deriver.reset();
    }

    pub fn finish_rerun(&mut self) -> Vec<WidgetId> {
        let pruned = self.store.finish_rerun();
        self.forms.forget(&pruned);
        pruned
    }

    pub fn abort_rerun(&mut self) {
        self.store.abort_rerun();
    }

    pub fn open_form(&mut self, group_id: &str) -> WidgetResult<GroupContext> {
        self.forms.open(group_id)
    }

    pub fn close_form(&mut self, group_id: &str) {
        self.forms.close(group_id);
    }

    pub fn register<C: WidgetCodec>(
        &mut self,
        widget: WidgetRegistration<'_, C>,
        group: &GroupContext,
    ) -> WidgetResult<Registered<C::Value>> {
        let codec = widget.codec;
        let type_tag = codec.type_tag();

        self.rules.check_placement(type_tag, widget.role, group)?;
        let id = self.deriver.derive(&IdentitySeed {
            type_tag,
            label: widget.label,
            user_key: widget.user_key,
            group_id: group.group_id(),
        })?;
        self.rules.check_state_writes(
            widget.user_key,
            widget.writes_allowed,
            widget.default.is_some(),
            &self.session_state,
        )?;

        let decode = |wire: &WireValue| {
            codec
                .deserialize(wire)
                .map_err(|source| WidgetError::CodecMismatch {
                    id: id.clone(),
                    type_tag: type_tag.to_string(),
                    source,
                })
        };
        // Defaults are normalized through the codec as well.
        let default = widget.default.unwrap_or_else(|| codec.default_value());
        let default = decode(&codec.serialize(&default))?;

        let prior = match self.store.last(&id) {
            Some(wire) => Some(decode(wire)?),
            None => None,
        };
        let prior_by_client = self.store.get(&id).is_some_and(|entry| entry.set_by_client);

        let external_key = widget.user_key.filter(|_| widget.writes_allowed);
        let external = match external_key.and_then(|key| self.session_state.get(key)) {
            Some(wire) => Some(decode(wire)?),
            None => None,
        };
        let (value, origin) = if let Some(value) = external {
            (value, Origin::SessionState)
        } else if let Some(wire) = self.store.take_pending(&id) {
            (decode(&wire)?, Origin::Client)
        } else if let Some(value) = &prior {
            let origin = if prior_by_client {
                Origin::Client
            } else {
                Origin::ScriptDefault
            };
            (value.clone(), origin)
        } else {
            (default.clone(), Origin::ScriptDefault)
        };

        let previous = prior.unwrap_or_else(|| default.clone());
        let changed = origin == Origin::Client && previous != value;

        let trigger_reset = codec.is_trigger().then(|| codec.serialize(&default));
        self.store
            .commit(&id, codec.serialize(&value), origin, trigger_reset);
        self.store.mark_seen(&id);
        if origin == Origin::SessionState
            && let Some(key) = external_key
        {
            self.session_state.remove(key);
        }

        tracing::debug!(widget = %id, type_tag, ?origin, changed, "widget.register");

        self.dispatch_callbacks(&id, widget.role, group, changed, widget.callback)?;

        Ok(Registered { id, value, changed })
    }

    fn dispatch_callbacks(
        &mut self,
        id: &WidgetId,
        role: FormRole,
        group: &GroupContext,
        changed: bool,
        callback: Option<CallbackBinding>,
    ) -> WidgetResult<()> {
        match (role, group.group_id()) {
            (FormRole::Member, Some(form)) => match self.forms.defer(form, id, changed, callback) {
                Some(binding) => self.invoke(id, binding),
                None => Ok(()),
            },
            (FormRole::Submitter, Some(form)) => {
                self.forms.note_submitter(form);
                if !changed {
                    return Ok(());
                }
                for queued in self.forms.release(form) {
                    self.invoke(&queued.id, queued.binding)?;
                }
                match callback {
                    Some(binding) => self.invoke(id, binding),
                    None => Ok(()),
                }
            }
            _ => match callback {
                Some(binding) if changed => self.invoke(id, binding),
                _ => Ok(()),
            },
        }
    }

    fn invoke(&mut self, id: &WidgetId, binding: CallbackBinding) -> WidgetResult<()> {
        tracing::trace!(widget = %id, "widget.callback");
        binding
            .invoke(&mut self.session_state)
            .map_err(WidgetError::Callback)
    }

    pub fn store(&self) -> &WidgetStateStore {
        &self.store
    }

    pub fn session_state(&self) -> &SessionState {
        &self.session_state
    }

    pub fn session_state_mut(&mut self) -> &mut SessionState {
        &mut self.session_state
    }

    pub fn is_awaiting_submit(&self, id: &WidgetId) -> bool {
        self.forms.is_awaiting(id)
    }
}
