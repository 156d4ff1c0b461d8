use crate::core::parameter::ParameterCollection;
use crate::core::value::DatabaseValue;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Name → value view of a command's parameters at the moment of execution
///
/// Built right before dispatch, serialized into the pre-execution record and then
/// dropped. Entries keep binding order. Serialized as a mapping where every entry
/// gets its own key: unnamed parameters are keyed by 1-based position (`?1`, `?2`)
/// and a repeated name is suffixed with its position (`Id#3`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSnapshot {
    entries: Vec<(String, DatabaseValue)>,
}

impl ParameterSnapshot {
    /// Capture every parameter currently bound
    pub fn capture(parameters: &ParameterCollection) -> Self {
        Self {
            entries: parameters
                .iter()
                .map(|p| (p.name().to_string(), p.value().clone()))
                .collect(),
        }
    }

    /// Value of the first entry called `name`, compared exactly
    pub fn get(&self, name: &str) -> Option<&DatabaseValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters were bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatabaseValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Serialization keys, one distinct key per entry in binding order
    pub fn keys(&self) -> Vec<String> {
        let mut used = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (name, _))| {
                let position = index + 1;
                let mut key = if name.is_empty() {
                    format!("?{}", position)
                } else if used.contains(name.as_str()) {
                    format!("{}#{}", name, position)
                } else {
                    name.clone()
                };
                while used.contains(&key) {
                    key.push('#');
                }
                used.insert(key.clone());
                key
            })
            .collect()
    }
}

impl Serialize for ParameterSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, (_, value)) in self.keys().iter().zip(&self.entries) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
