use crate::{
    algebra::schema::{Attribute, Relation},
    error::Result,
};

mod agg;
mod join;
mod query;
mod set;

pub use agg::{AggFn, Aggregate, Calculator};
pub use join::{HashJoin, NaturalJoin, SortMergeJoin};
pub use query::{Project, RenameAttributes, RenameRelation, Select};
pub use set::{Intersect, Minus, Times, Union};

/// Relational operator executor
///
/// Each operator reads its input relations and builds a fresh output relation.
/// Inputs are never modified.
pub trait Executor {
    fn execute(self: Box<Self>) -> Result<Relation>;
}

/// Same degree and pairwise-equal attribute types by position
pub fn is_compatible(first: &Relation, second: &Relation) -> bool {
    first.degree() == second.degree()
        && first
            .attributes()
            .iter()
            .zip(second.attributes())
            .all(|(a, b)| a.datatype == b.datatype)
}

/// Attributes of `r1` that also appear in `r2` (by name and type), in `r1`'s order
pub(crate) fn common_attributes(r1: &Relation, r2: &Relation) -> Vec<Attribute> {
    let mut common: Vec<Attribute> = Vec::new();
    for attr in r1.attributes() {
        if r2.attributes().contains(attr) && !common.contains(attr) {
            common.push(attr.clone());
        }
    }
    common
}

/// `r1`'s attributes followed by those of `r2` not already in the list
pub(crate) fn join_attributes(r1: &Relation, r2: &Relation) -> Vec<Attribute> {
    let mut attrs = r1.attributes().to_vec();
    for attr in r2.attributes() {
        if !attrs.contains(attr) {
            attrs.push(attr.clone());
        }
    }
    attrs
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{
        algebra::{
            schema::{Relation, Tuple},
            types::{DataType, Value},
        },
        error::Result,
    };

    /// Builds a relation of TEXT attributes from string rows
    pub fn text_relation(name: &str, columns: &[&str], rows: &[&[&str]]) -> Result<Relation> {
        let schema: Vec<(&str, DataType)> = columns.iter().map(|c| (*c, DataType::Text)).collect();
        let mut relation = Relation::with_schema(name, &schema);
        for row in rows {
            relation.add_tuple(Tuple::new(row.iter().map(|v| Value::from(*v)).collect()))?;
        }
        Ok(relation)
    }

    /// Offices(code, city) = {('1','NYC'), ('2','LA')}
    pub fn offices() -> Result<Relation> {
        text_relation("Offices", &["code", "city"], &[&["1", "NYC"], &["2", "LA"]])
    }

    /// Employees(code, name) = {('1','Alice'), ('1','Bob'), ('3','Carol')}
    pub fn employees() -> Result<Relation> {
        text_relation(
            "Employees",
            &["code", "name"],
            &[&["1", "Alice"], &["1", "Bob"], &["3", "Carol"]],
        )
    }

    pub fn row(values: &[&str]) -> Tuple {
        Tuple::new(values.iter().map(|v| Value::from(*v)).collect())
    }
}
