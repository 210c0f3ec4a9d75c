//! Persisted key-value store used across full page navigations.
//!
//! The host backs this with session storage. Values are plain strings; the only keys the crate
//! uses are [`RETURN_SECTION_KEY`] and [`SPLASH_COMPLETED_KEY`].

use std::collections::BTreeMap;

/// Section to resume at after coming back from a project page.
pub const RETURN_SECTION_KEY: &str = "returnToSection";
/// Set to `"true"` once a full splash has played in this session.
pub const SPLASH_COMPLETED_KEY: &str = "splashCompleted";

/// Opaque get/set/remove storage.
pub trait KeyValueStore {
    /// Value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;
    /// Insert or replace `key`.
    fn set(&mut self, key: &str, value: &str);
    /// Remove `key` if present.
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and the simulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// `true` if a return section is waiting to be consumed.
pub fn has_return_section(store: &dyn KeyValueStore) -> bool {
    store.get(RETURN_SECTION_KEY).is_some()
}

/// Remember `section` so the next load resumes there.
pub fn store_return_section(store: &mut dyn KeyValueStore, section: u32) {
    store.set(RETURN_SECTION_KEY, &section.to_string());
}

/// Read and remove the stored return section.
///
/// `None` when nothing is stored. A stored value that is not a section in `1..=section_count`
/// resumes at section 1.
pub fn take_return_section(store: &mut dyn KeyValueStore, section_count: u32) -> Option<u32> {
    let raw = store.get(RETURN_SECTION_KEY)?;
    store.remove(RETURN_SECTION_KEY);
    match raw.trim().parse::<u32>() {
        Ok(s) if (1..=section_count).contains(&s) => Some(s),
        _ => {
            tracing::debug!(value = %raw, "invalid stored return section; using 1");
            Some(1)
        }
    }
}

/// `true` once a full splash has completed in this session.
pub fn splash_completed(store: &dyn KeyValueStore) -> bool {
    store.get(SPLASH_COMPLETED_KEY).as_deref() == Some("true")
}

/// Record that the full splash has played.
pub fn mark_splash_completed(store: &mut dyn KeyValueStore) {
    store.set(SPLASH_COMPLETED_KEY, "true");
}
