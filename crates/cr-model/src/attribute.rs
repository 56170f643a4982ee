//! Typed attributes attached to users and groups.
//!
//! Attribute names are unique per owner, compared case-insensitively. Each
//! attribute carries a sequence index recording insertion order; removing an
//! attribute re-compacts the indices so iteration order stays reproducible.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    /// Free-form text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
}

impl AttributeValue {
    /// Returns the tag name of the variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A named attribute with its insertion sequence index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name as first written.
    pub name: String,
    /// Position in insertion order, starting at 0.
    pub seq: usize,
    /// The value.
    pub value: AttributeValue,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}({})", self.name, self.value, self.value.type_name())
    }
}

/// Ordered, case-insensitively keyed attribute collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Returns attribute names in sequence order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|a| a.name.clone()).collect()
    }

    /// Returns whether an attribute with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Looks up an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.position(name).map(|i| &self.0[i].value)
    }

    /// Adds a new attribute at the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AttributeExists`] if the name is taken.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> ModelResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ModelError::AttributeExists(name));
        }
        self.compact();
        let seq = self.0.len();
        self.0.push(Attribute { name, seq, value });
        Ok(())
    }

    /// Removes an attribute, returning its value if it existed.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.position(name)?;
        let removed = self.0.remove(index);
        self.compact();
        Some(removed.value)
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterates in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Data read from storage may carry gaps or be out of order.
    fn compact(&mut self) {
        self.0.sort_by_key(|a| a.seq);
        for (seq, attr) in self.0.iter_mut().enumerate() {
            attr.seq = seq;
        }
    }
}

/// Capability shared by every entity that carries attributes.
///
/// Implementors only expose their [`Attributes`]; the operations are
/// provided.
pub trait Attributable {
    /// Borrow the attribute collection.
    fn attributes(&self) -> &Attributes;

    /// Mutably borrow the attribute collection.
    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Names of all attributes in sequence order.
    fn attribute_names(&self) -> Vec<String> {
        self.attributes().names()
    }

    /// Whether an attribute with this name (any case) exists.
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes().contains(name)
    }

    /// Removes an attribute; returns whether one was removed.
    fn remove_attribute(&mut self, name: &str) -> bool {
        self.attributes_mut().remove(name).is_some()
    }

    /// Removes all attributes.
    fn remove_all_attributes(&mut self) {
        self.attributes_mut().clear();
    }

    /// Gets an attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AttributeNotFound`] if absent.
    fn attribute(&self, name: &str) -> ModelResult<&AttributeValue> {
        self.attributes()
            .get(name)
            .ok_or_else(|| ModelError::AttributeNotFound(name.to_string()))
    }

    /// Sets a new attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AttributeExists`] if the name is taken.
    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> ModelResult<()> {
        self.attributes_mut().insert(name, value)
    }
}
