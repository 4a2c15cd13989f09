use std::{
    collections::{BTreeSet, HashMap},
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::{
    algebra::types::{DataType, Value},
    error::{Error, Result},
};

/// Schema column descriptor
///
/// The owning relation is referenced by name only. Two attributes are equal
/// when their short names and types match, whichever relation owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub datatype: DataType,
    /// Name of the owning relation, None if it is anonymous
    pub relation: Option<String>,
}

impl Attribute {
    pub fn new(relation: Option<&str>, datatype: DataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype,
            relation: relation.map(str::to_string),
        }
    }

    /// Fully qualified `relation.name`, or the short name when the owner is anonymous
    pub fn pedantic_name(&self) -> String {
        match &self.relation {
            Some(relation) => format!("{}.{}", relation, self.name),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.datatype == other.datatype
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.datatype.hash(state);
    }
}

/// Ordered row of values
///
/// A tuple does not know its relation; names are resolved through
/// `Relation::value_of`. Equality, hashing and ordering cover the values only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, pos: usize) -> Option<&Value> {
        self.values.get(pos)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values of `self` followed by the values of `other`
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Tuple { values }
    }

    /// Keeps the values at the given positions, in the given order (repeats allowed)
    pub fn project(&self, positions: &[usize]) -> Tuple {
        Tuple {
            values: positions.iter().map(|&pos| self.values[pos].clone()).collect(),
        }
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Position of a name in the attribute list and how often the name occurs
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexEntry {
    pos: usize,
    count: usize,
}

/// Named set of same-degree tuples with an ordered attribute list
#[derive(Debug, Clone, Default)]
pub struct Relation {
    name: Option<String>,
    attributes: Vec<Attribute>,
    tuples: BTreeSet<Tuple>,
    /// Short and pedantic names -> position and occurrence count
    index: HashMap<String, IndexEntry>,
}

impl Relation {
    /// Creates an empty relation with no attributes
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    /// Creates an empty relation whose attributes are bound to it
    pub fn with_schema(name: &str, columns: &[(&str, DataType)]) -> Self {
        let mut relation = Self::new(Some(name));
        relation.set_attributes(
            columns
                .iter()
                .map(|(col, datatype)| Attribute::new(Some(name), *datatype, *col))
                .collect(),
        );
        relation
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Changes the name only, attributes keep their owner
    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_string);
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Assigns a new attribute list and rebuilds the lookup index
    pub fn set_attributes(&mut self, attributes: Vec<Attribute>) {
        self.attributes = attributes;
        self.index.clear();
        for (pos, attr) in self.attributes.iter().enumerate() {
            let short = attr.name.clone();
            let pedantic = attr.pedantic_name();
            let keys = if short == pedantic {
                vec![short]
            } else {
                vec![short, pedantic]
            };
            for key in keys {
                self.index
                    .entry(key)
                    .or_insert(IndexEntry { pos, count: 0 })
                    .count += 1;
            }
        }
    }

    /// Returns the position of a short or pedantic attribute name
    pub fn lookup(&self, name: &str) -> Result<usize> {
        match self.index.get(name) {
            None => Err(Error::attribute_not_found(self.name(), name)),
            Some(entry) if entry.count > 1 => Err(Error::attribute_ambiguous(self.name(), name)),
            Some(entry) => Ok(entry.pos),
        }
    }

    /// Retrieves the value of the named attribute from a tuple of this relation
    pub fn value_of<'t>(&self, tuple: &'t Tuple, name: &str) -> Result<&'t Value> {
        let pos = self.lookup(name)?;
        tuple.get(pos).ok_or(Error::ArityMismatch {
            expected: self.degree(),
            got: tuple.len(),
        })
    }

    /// Inserts a tuple; returns false if an equal tuple was already present
    pub fn add_tuple(&mut self, tuple: Tuple) -> Result<bool> {
        if tuple.len() != self.degree() {
            return Err(Error::ArityMismatch {
                expected: self.degree(),
                got: tuple.len(),
            });
        }
        Ok(self.tuples.insert(tuple))
    }

    pub fn remove_tuple(&mut self, tuple: &Tuple) -> bool {
        self.tuples.remove(tuple)
    }

    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.tuples.contains(tuple)
    }

    pub fn tuples(&self) -> &BTreeSet<Tuple> {
        &self.tuples
    }

    pub fn clear(&mut self) {
        self.tuples.clear();
    }

    /// Number of tuples
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Number of attributes
    pub fn degree(&self) -> usize {
        self.attributes.len()
    }

    /// An empty relation with the same name and attribute list
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            tuples: BTreeSet::new(),
            index: self.index.clone(),
        }
    }

    /// Whether two attributes share a short name (case-insensitive)
    pub fn has_duplicate_attributes(&self) -> bool {
        self.attributes.iter().enumerate().any(|(i, a)| {
            self.attributes[i + 1..]
                .iter()
                .any(|b| a.name.eq_ignore_ascii_case(&b.name))
        })
    }
}
