use crate::{
    algebra::{
        parser::{self, ast::Consts},
        schema::{Attribute, Relation},
    },
    error::{Error, Result},
};

use super::Executor;

/// Selection executor - keeps the tuples a predicate holds for
pub struct Select<'a> {
    source: &'a Relation,
    condition: String,
}

impl<'a> Select<'a> {
    pub fn new(source: &'a Relation, condition: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            source,
            condition: condition.into(),
        })
    }
}

impl Executor for Select<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        if self.condition.trim().is_empty() {
            return Ok(self.source.clone());
        }
        // Parse and resolve names once, then evaluate per tuple
        let predicate = parser::compile(&self.condition, self.source)?;

        let mut result = self.source.empty_like();
        for candidate in self.source.tuples() {
            match predicate.evaluate(candidate)? {
                Consts::Boolean(true) => {
                    result.add_tuple(candidate.clone())?;
                }
                Consts::Boolean(false) => {}
                v => {
                    return Err(Error::InvalidExpression(format!(
                        "{} evaluates to {:?}, not a boolean",
                        self.condition, v
                    )));
                }
            }
        }
        Ok(result)
    }
}

/// Projection executor - keeps the named attributes in the given order
pub struct Project<'a> {
    source: &'a Relation,
    names: Vec<String>,
}

impl<'a> Project<'a> {
    pub fn new(source: &'a Relation, names: Vec<String>) -> Box<Self> {
        Box::new(Self { source, names })
    }
}

impl Executor for Project<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let positions = self
            .names
            .iter()
            .map(|name| self.source.lookup(name))
            .collect::<Result<Vec<_>>>()?;

        let mut projection = Relation::new(None);
        projection.set_attributes(
            positions
                .iter()
                .map(|&pos| self.source.attributes()[pos].clone())
                .collect(),
        );
        // Rows that become equal after dropping columns collapse into one
        for tuple in self.source.tuples() {
            projection.add_tuple(tuple.project(&positions))?;
        }
        Ok(projection)
    }
}

/// Renames a relation and rebinds its attributes to the new name
pub struct RenameRelation<'a> {
    source: &'a Relation,
    name: String,
}

impl<'a> RenameRelation<'a> {
    pub fn new(source: &'a Relation, name: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            source,
            name: name.into(),
        })
    }
}

impl Executor for RenameRelation<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let mut renamed = self.source.clone();
        let attrs = renamed
            .attributes()
            .iter()
            .map(|a| Attribute::new(Some(&self.name), a.datatype, a.name.clone()))
            .collect();
        renamed.set_name(Some(&self.name));
        // Pedantic names changed, so the index has to be rebuilt
        renamed.set_attributes(attrs);
        Ok(renamed)
    }
}

/// Renames every attribute of a relation, short names in schema order
pub struct RenameAttributes<'a> {
    source: &'a Relation,
    names: Vec<String>,
}

impl<'a> RenameAttributes<'a> {
    pub fn new(source: &'a Relation, names: Vec<String>) -> Box<Self> {
        Box::new(Self { source, names })
    }
}

impl Executor for RenameAttributes<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let Self { source, names } = *self;
        if names.len() != source.degree() {
            return Err(Error::ArityMismatch {
                expected: source.degree(),
                got: names.len(),
            });
        }
        let mut renamed = source.clone();
        let attrs = source
            .attributes()
            .iter()
            .zip(names)
            .map(|(a, name)| Attribute::new(source.name(), a.datatype, name))
            .collect();
        renamed.set_attributes(attrs);
        Ok(renamed)
    }
}
