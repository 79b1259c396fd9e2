//! Preference declarations
//!
//! The notification state is stored as a global preference. It is declared
//! API-only so it never shows up in a user-facing preferences form.

use serde::Serialize;
use std::collections::BTreeMap;

/// How a preference is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    /// Readable and writable through the API only, not user-editable
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceDefinition {
    pub name: String,
    pub kind: PreferenceKind,
}

/// Preferences declared during preference registration
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferenceRegistry {
    pub preferences: BTreeMap<String, PreferenceDefinition>,
}

impl PreferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, kind: PreferenceKind) {
        let name = name.into();
        self.preferences
            .insert(name.clone(), PreferenceDefinition { name, kind });
    }

    pub fn get(&self, name: &str) -> Option<&PreferenceDefinition> {
        self.preferences.get(name)
    }
}
