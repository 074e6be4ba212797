use crate::error::{WidgetError, WidgetResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;

const WIDGET_ID_PREFIX: &str = "$$WIDGET";
const NO_KEY: &str = "None";
const NO_GROUP: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The user-supplied key this id was derived from, if any.
    pub fn user_key(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(WIDGET_ID_PREFIX)?.strip_prefix('-')?;
        let (_digest, key) = rest.split_once('-')?;
        if key == NO_KEY { None } else { Some(key) }
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(raw: &str) -> Self {
        WidgetId(raw.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentitySeed<'a> {
    pub type_tag: &'a str,
    pub label: &'a str,
    pub user_key: Option<&'a str>,
    pub group_id: Option<&'a str>,
}

/// Derives the id for `seed`.
///
/// Keyed seeds hash only `(type_tag, user_key)`, so the id survives label edits
/// and moves between forms. Un-keyed seeds hash the visible content plus the
/// group and `disambiguator`.
pub fn derive_widget_id(seed: &IdentitySeed<'_>, disambiguator: u32) -> WidgetId {
    let mut h = Sha256::new();
    match seed.user_key {
        Some(key) => {
            hash_field(&mut h, b"keyed");
            hash_field(&mut h, seed.type_tag.as_bytes());
            hash_field(&mut h, key.as_bytes());
        }
        None => {
            hash_field(&mut h, b"content");
            hash_field(&mut h, seed.type_tag.as_bytes());
            hash_field(&mut h, seed.label.as_bytes());
            hash_field(&mut h, seed.group_id.unwrap_or(NO_GROUP).as_bytes());
            hash_field(&mut h, &disambiguator.to_be_bytes());
        }
    }
    let digest = h.finalize();

    let mut out = String::with_capacity(WIDGET_ID_PREFIX.len() + 34 + 8);
    out.push_str(WIDGET_ID_PREFIX);
    out.push('-');
    for b in &digest[..16] {
        out.push_str(&format!("{:02x}", b));
    }
    out.push('-');
    out.push_str(seed.user_key.unwrap_or(NO_KEY));
    WidgetId(out)
}

fn hash_field(h: &mut Sha256, field: &[u8]) {
    h.update((field.len() as u64).to_be_bytes());
    h.update(field);
}

#[derive(Debug, Default)]
pub struct IdentityDeriver {
    seen_keys: HashSet<String>,
    content_counts: HashMap<(String, String, String), u32>,
}

impl IdentityDeriver {
    pub fn derive(&mut self, seed: &IdentitySeed<'_>) -> WidgetResult<WidgetId> {
        if let Some(key) = seed.user_key {
            if !self.seen_keys.insert(key.to_string()) {
                return Err(WidgetError::DuplicateWidgetKey {
                    key: key.to_string(),
                });
            }
            return Ok(derive_widget_id(seed, 0));
        }

        let content = (
            seed.type_tag.to_string(),
            seed.label.to_string(),
            seed.group_id.unwrap_or(NO_GROUP).to_string(),
        );
        let count = self.content_counts.entry(content).or_insert(0);
        let disambiguator = *count;
        *count += 1;
        Ok(derive_widget_id(seed, disambiguator))
    }

    pub fn reset(&mut self) {
        self.seen_keys.clear();
        self.content_counts.clear();
    }
}
