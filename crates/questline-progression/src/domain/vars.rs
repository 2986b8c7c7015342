//! Player variables: the flat key/value map rules read and actions write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variable holding the player's chosen narrative branch.
pub const PATH_VAR: &str = "path";

/// Text used for `{path}` when no path has been chosen yet.
const UNCHOSEN_PATH: &str = "your homeland";

/// Flat map of player variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(BTreeMap<String, Value>);

impl Vars {
    /// Creates an empty variable map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for literals.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` when `key` holds a truthy value: `true`, a non-empty
    /// string or a non-zero number.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::Array(_) | Value::Object(_)) => true,
            Some(Value::Null) | None => false,
        }
    }

    /// Chosen path, normalized to lowercase.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        match self.0.get(PATH_VAR) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_lowercase()),
            _ => None,
        }
    }

    /// Display form of the chosen path (`dreadheim` → `Dreadheim`).
    #[must_use]
    pub fn path_display(&self) -> Option<String> {
        self.path().map(|p| display_name(&p))
    }

    /// Shallow merge; returns `true` if any key changed.
    pub fn merge(&mut self, partial: &Vars) -> bool {
        let mut changed = false;
        for (key, value) in &partial.0 {
            if self.0.get(key) != Some(value) {
                self.0.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    /// Iterates over the variable names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `true` when no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces every `{path}` in `template` with the chosen path's display name.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        if !template.contains("{path}") {
            return template.to_owned();
        }
        let path = self
            .path_display()
            .unwrap_or_else(|| UNCHOSEN_PATH.to_owned());
        template.replace("{path}", &path)
    }
}

impl FromIterator<(String, Value)> for Vars {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn display_name(path: &str) -> String {
    let mut chars = path.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
