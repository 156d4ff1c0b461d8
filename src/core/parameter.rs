//! Command parameters
//!
//! Parameters are an ordered sequence of name/value pairs owned by a command.
//! Names may carry a SQL prefix (`@Id`, `:Id`, `$Id`); lookups ignore it.

use super::value::DatabaseValue;

/// A single bound parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    name: String,
    value: DatabaseValue,
}

impl Parameter {
    /// Create a parameter with a name and value
    pub fn new<N: Into<String>, V: Into<DatabaseValue>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parameter name exactly as it was given
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the parameter name
    pub fn set_name<N: Into<String>>(&mut self, name: N) {
        self.name = name.into();
    }

    /// Bound value
    pub fn value(&self) -> &DatabaseValue {
        &self.value
    }

    /// Replace the bound value
    pub fn set_value<V: Into<DatabaseValue>>(&mut self, value: V) {
        self.value = value.into();
    }

    /// Name without its `@`, `:` or `$` prefix
    pub fn bare_name(&self) -> &str {
        strip_prefix(&self.name)
    }
}

/// Strip a leading SQL parameter prefix from a name
pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(['@', ':', '$']).unwrap_or(name)
}

/// Ordered collection of parameters attached to a command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterCollection {
    items: Vec<Parameter>,
}

impl ParameterCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    pub fn add(&mut self, parameter: Parameter) {
        self.items.push(parameter);
    }

    /// Append a parameter built from a name and value, returning it for further changes
    pub fn add_with_value<N: Into<String>, V: Into<DatabaseValue>>(
        &mut self,
        name: N,
        value: V,
    ) -> &mut Parameter {
        self.items.push(Parameter::new(name, value));
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// Position of the first parameter matching `name`, prefixes ignored
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let wanted = strip_prefix(name);
        self.items.iter().position(|p| p.bare_name() == wanted)
    }

    /// Whether a parameter named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Look up a parameter by name, prefixes ignored
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).map(|i| &self.items[i])
    }

    /// Look up a parameter mutably by name, prefixes ignored
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        let index = self.index_of(name)?;
        self.items.get_mut(index)
    }

    /// Parameter at a position
    pub fn at(&self, index: usize) -> Option<&Parameter> {
        self.items.get(index)
    }

    /// Remove the first parameter matching `name`
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let index = self.index_of(name)?;
        Some(self.items.remove(index))
    }

    /// Remove every parameter
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in binding order
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.items.iter()
    }
}

impl Extend<Parameter> for ParameterCollection {
    fn extend<T: IntoIterator<Item = Parameter>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl FromIterator<Parameter> for ParameterCollection {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParameterCollection {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
