use crate::identity::WidgetId;
use crate::value::{Origin, WireValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub id: WidgetId,
    pub value: WireValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEntry {
    pub id: WidgetId,
    pub wire_value: WireValue,
    pub set_by_client: bool,
    /// Value restored once the current rerun ends, for trigger widgets.
    pub trigger_reset: Option<WireValue>,
}

#[derive(Debug, Default)]
pub struct WidgetStateStore {
    entries: IndexMap<WidgetId, WidgetEntry>,
    pending: HashMap<WidgetId, WireValue>,
    inbox: Vec<PendingUpdate>,
    seen: HashSet<WidgetId>,
}

impl WidgetStateStore {
    pub fn enqueue(&mut self, update: PendingUpdate) {
        self.inbox.push(update);
    }

    pub fn begin_rerun(&mut self) {
        for update in self.inbox.drain(..) {
            self.pending.insert(update.id, update.value);
        }
        self.seen.clear();
    }

    pub fn take_pending(&mut self, id: &WidgetId) -> Option<WireValue> {
        self.pending.remove(id)
    }

    pub fn last(&self, id: &WidgetId) -> Option<&WireValue> {
        self.entries.get(id).map(|entry| &entry.wire_value)
    }

    pub fn get(&self, id: &WidgetId) -> Option<&WidgetEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn commit(
        &mut self,
        id: &WidgetId,
        wire_value: WireValue,
        origin: Origin,
        trigger_reset: Option<WireValue>,
    ) {
        let set_by_client = origin == Origin::Client;
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.wire_value = wire_value;
                entry.set_by_client = set_by_client;
                entry.trigger_reset = trigger_reset;
            }
            None => {
                self.entries.insert(
                    id.clone(),
                    WidgetEntry {
                        id: id.clone(),
                        wire_value,
                        set_by_client,
                        trigger_reset,
                    },
                );
            }
        }
    }

    pub fn mark_seen(&mut self, id: &WidgetId) {
        self.seen.insert(id.clone());
    }

    /// Ends a completed rerun. Returns the ids pruned because the script no
    /// longer registered them.
    pub fn finish_rerun(&mut self) -> Vec<WidgetId> {
        let seen = &self.seen;
        let mut pruned = Vec::new();
        self.entries.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                pruned.push(id.clone());
            }
            keep
        });
        self.pending.clear();
        self.reset_triggers();
        pruned
    }

    /// Ends an aborted rerun. Unseen entries and unconsumed updates survive.
    pub fn abort_rerun(&mut self) {
        self.reset_triggers();
    }

    fn reset_triggers(&mut self) {
        let resets: Vec<(WidgetId, WireValue)> = self
            .entries
            .values()
            .filter_map(|entry| {
                let reset = entry.trigger_reset.as_ref()?;
                (entry.wire_value != *reset).then(|| (entry.id.clone(), reset.clone()))
            })
            .collect();
        for (id, reset) in resets {
            let trigger_reset = Some(reset.clone());
            self.commit(&id, reset, Origin::ScriptDefault, trigger_reset);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> WidgetId {
        WidgetId::from(raw)
    }

    #[test]
    fn updates_wait_for_next_rerun() {
        let mut store = WidgetStateStore::default();
        store.enqueue(PendingUpdate {
            id: id("a"),
            value: WireValue::Bool(true),
        });
        assert_eq!(store.take_pending(&id("a")), None);

        store.begin_rerun();
        assert_eq!(store.take_pending(&id("a")), Some(WireValue::Bool(true)));
        assert_eq!(store.take_pending(&id("a")), None);
    }

    #[test]
    fn later_update_for_same_widget_wins() {
        let mut store = WidgetStateStore::default();
        for value in ["one", "two"] {
            store.enqueue(PendingUpdate {
                id: id("a"),
                value: WireValue::String(value.to_string()),
            });
        }
        store.begin_rerun();
        assert_eq!(
            store.take_pending(&id("a")),
            Some(WireValue::String("two".to_string()))
        );
    }

    #[test]
    fn commit_keeps_one_entry_per_id() {
        let mut store = WidgetStateStore::default();
        assert_eq!(store.last(&id("a")), None);
        store.commit(&id("a"), WireValue::Int(1), Origin::ScriptDefault, None);
        store.commit(&id("a"), WireValue::Int(2), Origin::Client, None);
        assert_eq!(store.last(&id("a")), Some(&WireValue::Int(2)));

        assert_eq!(store.len(), 1);
        let entry = store.get(&id("a")).expect("entry committed");
        assert_eq!(entry.wire_value, WireValue::Int(2));
        assert!(entry.set_by_client);
    }

    #[test]
    fn finish_prunes_unseen_entries_and_stale_updates() {
        let mut store = WidgetStateStore::default();
        store.begin_rerun();
        store.commit(&id("kept"), WireValue::Bool(false), Origin::ScriptDefault, None);
        store.commit(&id("gone"), WireValue::Bool(false), Origin::ScriptDefault, None);
        store.mark_seen(&id("kept"));
        store.mark_seen(&id("gone"));
        assert!(store.finish_rerun().is_empty());

        store.enqueue(PendingUpdate {
            id: id("nobody"),
            value: WireValue::Bool(true),
        });
        store.begin_rerun();
        store.mark_seen(&id("kept"));
        assert_eq!(store.finish_rerun(), vec![id("gone")]);
        assert!(store.contains(&id("kept")));
        assert!(!store.contains(&id("gone")));

        store.begin_rerun();
        assert_eq!(store.take_pending(&id("nobody")), None);
    }

    #[test]
    fn abort_keeps_unseen_entries_and_unconsumed_updates() {
        let mut store = WidgetStateStore::default();
        store.commit(&id("a"), WireValue::Bool(false), Origin::ScriptDefault, None);
        store.enqueue(PendingUpdate {
            id: id("b"),
            value: WireValue::Bool(true),
        });
        store.begin_rerun();
        store.abort_rerun();

        assert!(store.contains(&id("a")));
        assert_eq!(store.take_pending(&id("b")), Some(WireValue::Bool(true)));
    }

    #[test]
    fn triggers_reset_when_rerun_ends() {
        let mut store = WidgetStateStore::default();
        store.begin_rerun();
        store.commit(
            &id("btn"),
            WireValue::Bool(true),
            Origin::Client,
            Some(WireValue::Bool(false)),
        );
        store.mark_seen(&id("btn"));
        store.finish_rerun();

        let entry = store.get(&id("btn")).expect("button kept");
        assert_eq!(entry.wire_value, WireValue::Bool(false));
        assert!(!entry.set_by_client);
    }
}
