//! Template variable sets.
//!
//! A [`TemplateVariables`] set is the renderer's only input. Values are either
//! scalars (substituted into `{{KEY}}` placeholders) or lists of nested sets
//! (expanded by `{{#NAME}} ... {{/NAME}}` blocks).

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A single template variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<TemplateVariables>),
}

impl TemplateValue {
    /// Canonical string form of a scalar. Lists have none.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            TemplateValue::String(s) => Some(s.clone()),
            TemplateValue::Integer(i) => Some(i.to_string()),
            TemplateValue::Boolean(b) => Some(b.to_string()),
            TemplateValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TemplateVariables]> {
        match self {
            TemplateValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_scalar() {
            Some(s) => f.write_str(&s),
            None => f.write_str("[list]"),
        }
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<&String> for TemplateValue {
    fn from(value: &String) -> Self {
        TemplateValue::String(value.clone())
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Integer(value)
    }
}

impl From<u32> for TemplateValue {
    fn from(value: u32) -> Self {
        TemplateValue::Integer(i64::from(value))
    }
}

impl From<u16> for TemplateValue {
    fn from(value: u16) -> Self {
        TemplateValue::Integer(i64::from(value))
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Boolean(value)
    }
}

impl From<Vec<TemplateVariables>> for TemplateValue {
    fn from(value: Vec<TemplateVariables>) -> Self {
        TemplateValue::List(value)
    }
}

/// A mapping from variable name to [`TemplateValue`].
///
/// Inserting an existing key replaces its value, so callers layer sources in
/// order and the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables {
    values: BTreeMap<String, TemplateValue>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TemplateValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Layer every entry of `other` over this set.
    pub fn extend(&mut self, other: TemplateVariables) {
        self.values.extend(other.values);
    }

    /// Layer string pairs over this set.
    pub fn extend_strings<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in pairs {
            self.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.values.get(key)
    }

    /// Canonical string form of a scalar variable.
    pub fn get_scalar(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(TemplateValue::as_scalar)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TemplateValue> {
        self.values.iter()
    }

    /// Build one merged scope per loop item: `shared` first, then the item's
    /// own keys on top.
    ///
    /// Each iteration renders with its item alone, so blocks nested inside a
    /// loop body only see outer values that were copied in here.
    pub fn scoped_items(
        shared: &TemplateVariables,
        items: impl IntoIterator<Item = TemplateVariables>,
    ) -> Vec<TemplateVariables> {
        items
            .into_iter()
            .map(|item| {
                let mut scope = shared.clone();
                scope.extend(item);
                scope
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateVariables
where
    K: Into<String>,
    V: Into<TemplateValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut vars = TemplateVariables::new();
        for (key, value) in iter {
            vars.insert(key, value);
        }
        vars
    }
}

impl<'a> IntoIterator for &'a TemplateVariables {
    type Item = (&'a String, &'a TemplateValue);
    type IntoIter = btree_map::Iter<'a, String, TemplateValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
