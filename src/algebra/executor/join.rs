use std::{cmp::Ordering, collections::HashMap};

use tracing::trace;

use crate::{
    algebra::{
        parser::ast::{Consts, Expression, Operation},
        schema::{Attribute, Relation, Tuple},
        types::Value,
    },
    error::{Error, Result},
};

use super::{Executor, Times, common_attributes, join_attributes};

/// Natural join executor
///
/// Built from primitives: `project(select(times(r1, r2), r1.c = r2.c && ...), schema)`
/// where the projected schema is `r1`'s attributes followed by the ones of `r2`
/// not already present. The common attributes are matched by position in each
/// operand, so anonymous or identically named operands join like any other.
pub struct NaturalJoin<'a> {
    left: &'a Relation,
    right: &'a Relation,
}

impl<'a> NaturalJoin<'a> {
    pub fn new(left: &'a Relation, right: &'a Relation) -> Box<Self> {
        Box::new(Self { left, right })
    }
}

impl Executor for NaturalJoin<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let common = common_attributes(self.left, self.right);
        if common.is_empty() {
            return Times::new(self.left, self.right).execute();
        }
        let layout = JoinLayout::new(self.left, self.right, &common)?;
        let offset = self.left.degree();

        // In the product, `right`'s columns start after all of `left`'s
        let predicate = layout
            .left_key
            .iter()
            .zip(&layout.right_key)
            .map(|(&l, &r)| {
                Expression::from(Operation::Equal(
                    Box::new(Expression::Column(l)),
                    Box::new(Expression::Column(offset + r)),
                ))
            })
            .reduce(|acc, eq| Operation::And(Box::new(acc), Box::new(eq)).into())
            .unwrap_or(Expression::Consts(Consts::Boolean(true)));
        let projection: Vec<usize> = (0..offset)
            .chain(layout.right_payload.iter().map(|&pos| offset + pos))
            .collect();

        let product = Times::new(self.left, self.right).execute()?;
        let mut join = layout.output();
        for tuple in product.tuples() {
            if predicate.evaluate(tuple)? == Consts::Boolean(true) {
                join.add_tuple(tuple.project(&projection))?;
            }
        }
        Ok(join)
    }
}

/// Positions of the common attributes in `relation`, in `common`'s order
fn key_positions(relation: &Relation, common: &[Attribute]) -> Result<Vec<usize>> {
    common
        .iter()
        .map(|c| {
            relation
                .attributes()
                .iter()
                .position(|a| a == c)
                .ok_or_else(|| Error::attribute_not_found(relation.name(), &c.name))
        })
        .collect()
}

fn key_of(tuple: &Tuple, positions: &[usize]) -> Vec<Value> {
    positions.iter().map(|&pos| tuple.values()[pos].clone()).collect()
}

/// Equi-join layout shared by the natural, hash and sort-merge joins
struct JoinLayout {
    left_key: Vec<usize>,
    right_key: Vec<usize>,
    /// Positions of `right` that are not join attributes
    right_payload: Vec<usize>,
    schema: Vec<Attribute>,
}

impl JoinLayout {
    fn new(left: &Relation, right: &Relation, common: &[Attribute]) -> Result<Self> {
        // Excluded by position, never by value
        let right_payload = right
            .attributes()
            .iter()
            .enumerate()
            .filter(|(_, a)| !common.contains(a))
            .map(|(pos, _)| pos)
            .collect();
        Ok(Self {
            left_key: key_positions(left, common)?,
            right_key: key_positions(right, common)?,
            right_payload,
            schema: join_attributes(left, right),
        })
    }

    fn output(&self) -> Relation {
        let mut join = Relation::new(None);
        join.set_attributes(self.schema.clone());
        join
    }

    fn combine(&self, left: &Tuple, right: &Tuple) -> Tuple {
        left.concat(&right.project(&self.right_payload))
    }
}

/// Hash join executor
///
/// Builds a hash table over `left` keyed by the common attribute values, then
/// looks up every tuple of `right` in it. The key values of `left` must be
/// unique; a repeated key fails the whole join.
pub struct HashJoin<'a> {
    left: &'a Relation,
    right: &'a Relation,
}

impl<'a> HashJoin<'a> {
    pub fn new(left: &'a Relation, right: &'a Relation) -> Box<Self> {
        Box::new(Self { left, right })
    }
}

impl Executor for HashJoin<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let common = common_attributes(self.left, self.right);
        if common.is_empty() {
            return Times::new(self.left, self.right).execute();
        }
        let layout = JoinLayout::new(self.left, self.right, &common)?;

        // Build phase
        let mut table: HashMap<Vec<Value>, &Tuple> = HashMap::with_capacity(self.left.len());
        for tuple in self.left.tuples() {
            let key = key_of(tuple, &layout.left_key);
            if table.contains_key(&key) {
                return Err(Error::UniquenessViolation(format!(
                    "hash join key {:?} occurs more than once in relation {}",
                    key,
                    self.left.name().unwrap_or_default()
                )));
            }
            table.insert(key, tuple);
        }
        trace!(entries = table.len(), "hash join build finished");

        // Lookup phase
        let mut join = layout.output();
        let mut matches = 0usize;
        for tuple in self.right.tuples() {
            if let Some(matched) = table.get(&key_of(tuple, &layout.right_key)) {
                join.add_tuple(layout.combine(matched, tuple))?;
                matches += 1;
            }
        }
        trace!(matches, "hash join lookup finished");
        Ok(join)
    }
}

/// Sort-merge join executor
///
/// Sorts both inputs on the common attribute values and merges runs of equal
/// keys. Produces the same relation as `NaturalJoin` without requiring unique keys.
pub struct SortMergeJoin<'a> {
    left: &'a Relation,
    right: &'a Relation,
}

impl<'a> SortMergeJoin<'a> {
    pub fn new(left: &'a Relation, right: &'a Relation) -> Box<Self> {
        Box::new(Self { left, right })
    }
}

/// Tuples ordered by their key values
fn sorted_by_key<'r>(relation: &'r Relation, positions: &[usize]) -> Vec<(Vec<Value>, &'r Tuple)> {
    let mut rows: Vec<_> = relation
        .tuples()
        .iter()
        .map(|t| (key_of(t, positions), t))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Length of the run of equal keys starting at `start`
fn run_len(rows: &[(Vec<Value>, &Tuple)], start: usize) -> usize {
    rows[start..]
        .iter()
        .take_while(|(key, _)| *key == rows[start].0)
        .count()
}

impl Executor for SortMergeJoin<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let common = common_attributes(self.left, self.right);
        if common.is_empty() {
            return Times::new(self.left, self.right).execute();
        }
        let layout = JoinLayout::new(self.left, self.right, &common)?;
        let left = sorted_by_key(self.left, &layout.left_key);
        let right = sorted_by_key(self.right, &layout.right_key);

        let mut join = layout.output();
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match left[i].0.cmp(&right[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let (left_run, right_run) = (run_len(&left, i), run_len(&right, j));
                    for (_, l) in &left[i..i + left_run] {
                        for (_, r) in &right[j..j + right_run] {
                            join.add_tuple(layout.combine(l, r))?;
                        }
                    }
                    i += left_run;
                    j += right_run;
                }
            }
        }
        Ok(join)
    }
}
