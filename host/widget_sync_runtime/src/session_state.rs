use crate::value::WireValue;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct SessionState {
    writes: IndexMap<String, WireValue>,
}

impl SessionState {
    pub fn set(&mut self, key: impl Into<String>, value: WireValue) {
        self.writes.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.writes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.writes.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<WireValue> {
        self.writes.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
