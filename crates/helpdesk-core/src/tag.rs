//! Canonical tags
//!
//! Users tag tickets freely ("RDP", "remote desktop", "remoting"), but
//! queries need one identity per concept. A [`TagRegistry`] folds raw text to
//! lower case, follows at most one synonym hop, applies a preferred
//! capitalization, and interns the result so every lookup of the same concept
//! yields the same [`Tag`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::{Error, Result};

/// An interned tag. Equality, hashing and ordering ignore case.
#[derive(Debug, Clone)]
pub struct Tag {
    inner: Arc<TagInner>,
}

#[derive(Debug)]
struct TagInner {
    key: String,
    value: String,
}

impl Tag {
    fn new(key: String, value: String) -> Self {
        Self {
            inner: Arc::new(TagInner { key, value }),
        }
    }

    /// Display form, e.g. `GitHub`
    pub fn value(&self) -> &str {
        &self.inner.value
    }

    /// Lower-cased identity used for comparison
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// True when both handles point at the same interned tag
    pub fn same_instance(&self, other: &Tag) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value())
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// alias -> canonical key, both lower case
    synonyms: HashMap<String, String>,
    /// key -> preferred display form
    capitalizations: HashMap<String, String>,
    interned: BTreeMap<String, Tag>,
}

/// Shared handle to the synonym, capitalization and interning tables.
///
/// Register synonyms and capitalizations before tagging anything: a tag's
/// display form is fixed when it is first interned.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `alias` as another spelling of `target`
    pub fn add_synonym(&self, alias: &str, target: &str) {
        let alias = alias.to_lowercase();
        let target = target.to_lowercase();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.interned.contains_key(&alias) {
            warn!(
                alias = %alias,
                target = %target,
                "Synonym registered after the alias was already interned"
            );
        }
        debug!(alias = %alias, target = %target, "Registered tag synonym");
        state.synonyms.insert(alias, target);
    }

    /// Display tags matching `preferred` case-insensitively as `preferred`
    pub fn add_capitalization(&self, preferred: &str) {
        let key = preferred.to_lowercase();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.interned.get(&key) {
            if existing.value() != preferred {
                warn!(
                    tag = %existing,
                    preferred = %preferred,
                    "Capitalization registered after the tag was already interned"
                );
            }
        }
        state.capitalizations.insert(key, preferred.to_string());
    }

    /// Resolve raw text to its canonical, interned tag
    pub fn tag(&self, input: &str) -> Result<Tag> {
        if input.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Tag values must be non-empty".to_string(),
            ));
        }

        let lowered = input.to_lowercase();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let key = state.synonyms.get(&lowered).cloned().unwrap_or(lowered);
        if let Some(tag) = state.interned.get(&key) {
            return Ok(tag.clone());
        }

        let value = state
            .capitalizations
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.clone());
        let tag = Tag::new(key.clone(), value);
        state.interned.insert(key, tag.clone());
        Ok(tag)
    }

    /// All interned tags in case-insensitive order
    pub fn tags(&self) -> Vec<Tag> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.interned.values().cloned().collect()
    }
}
