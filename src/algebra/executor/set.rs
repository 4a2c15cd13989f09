use crate::{
    algebra::{render::Renderer, schema::Relation},
    error::{Error, Result},
};

use super::{Executor, is_compatible};

fn check_compatible(op: &str, first: &Relation, second: &Relation) -> Result<()> {
    if !is_compatible(first, second) {
        let renderer = Renderer::default();
        return Err(Error::TypeMismatch(format!(
            "{}: incompatible relations {} and {}",
            op,
            renderer.render_schema(first),
            renderer.render_schema(second)
        )));
    }
    Ok(())
}

/// Union executor - `first`'s schema, tuples of both
pub struct Union<'a> {
    first: &'a Relation,
    second: &'a Relation,
}

impl<'a> Union<'a> {
    pub fn new(first: &'a Relation, second: &'a Relation) -> Box<Self> {
        Box::new(Self { first, second })
    }
}

impl Executor for Union<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        check_compatible("union", self.first, self.second)?;
        let mut result = self.first.clone();
        for tuple in self.second.tuples() {
            result.add_tuple(tuple.clone())?;
        }
        Ok(result)
    }
}

/// Set difference executor - `first`'s tuples not present in `second`
pub struct Minus<'a> {
    first: &'a Relation,
    second: &'a Relation,
}

impl<'a> Minus<'a> {
    pub fn new(first: &'a Relation, second: &'a Relation) -> Box<Self> {
        Box::new(Self { first, second })
    }
}

impl Executor for Minus<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        check_compatible("set difference", self.first, self.second)?;
        let mut result = self.first.clone();
        for tuple in self.second.tuples() {
            result.remove_tuple(tuple);
        }
        Ok(result)
    }
}

/// Intersection executor, computed as `first - (first - second)`
pub struct Intersect<'a> {
    first: &'a Relation,
    second: &'a Relation,
}

impl<'a> Intersect<'a> {
    pub fn new(first: &'a Relation, second: &'a Relation) -> Box<Self> {
        Box::new(Self { first, second })
    }
}

impl Executor for Intersect<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let only_first = Minus::new(self.first, self.second).execute()?;
        Minus::new(self.first, &only_first).execute()
    }
}

/// Cartesian product executor
///
/// The schema is `first`'s attributes followed by `second`'s; duplicate names
/// stay and are told apart by their pedantic names.
pub struct Times<'a> {
    first: &'a Relation,
    second: &'a Relation,
}

impl<'a> Times<'a> {
    pub fn new(first: &'a Relation, second: &'a Relation) -> Box<Self> {
        Box::new(Self { first, second })
    }
}

impl Executor for Times<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        let mut product = Relation::new(None);
        let mut attrs = self.first.attributes().to_vec();
        attrs.extend_from_slice(self.second.attributes());
        product.set_attributes(attrs);

        // Nested loop: every tuple of first against every tuple of second
        for tuple in self.first.tuples() {
            for other in self.second.tuples() {
                product.add_tuple(tuple.concat(other))?;
            }
        }
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Intersect, Minus, Times, Union};
    use crate::{
        algebra::{
            executor::{
                Executor,
                fixtures::{employees, offices, row, text_relation},
            },
            schema::{Relation, Tuple},
            types::{DataType, Value},
        },
        error::{Error, Result},
    };

    #[test]
    fn test_union_minus_intersect() -> Result<()> {
        let a = text_relation("A", &["x"], &[&["1"], &["2"], &["3"]])?;
        let b = text_relation("B", &["y"], &[&["2"], &["3"], &["4"]])?;

        let union = Union::new(&a, &b).execute()?;
        assert_eq!(union.len(), 4);
        assert_eq!(union.name(), Some("A"));
        assert_eq!(union.attributes()[0].name, "x");

        let minus = Minus::new(&a, &b).execute()?;
        assert_eq!(minus.tuples().iter().collect::<Vec<_>>(), vec![&row(&["1"])]);

        let intersect = Intersect::new(&a, &b).execute()?;
        assert_eq!(intersect.len(), 2);
        assert!(intersect.contains(&row(&["2"])) && intersect.contains(&row(&["3"])));
        Ok(())
    }

    #[test]
    fn test_incompatible_operands() -> Result<()> {
        let offices = offices()?;
        let numeric = Relation::with_schema("N", &[("code", DataType::Numeric), ("c", DataType::Text)]);
        let one = text_relation("One", &["code"], &[])?;

        assert!(matches!(Union::new(&offices, &numeric).execute(), Err(Error::TypeMismatch(_))));
        assert!(matches!(Minus::new(&offices, &one).execute(), Err(Error::TypeMismatch(_))));
        assert!(matches!(Intersect::new(&offices, &one).execute(), Err(Error::TypeMismatch(_))));
        Ok(())
    }

    #[test]
    fn test_times() -> Result<()> {
        let offices = offices()?;
        let employees = employees()?;
        let product = Times::new(&offices, &employees).execute()?;

        assert_eq!(product.len(), offices.len() * employees.len());
        assert_eq!(product.degree(), 4);
        assert_eq!(product.name(), None);
        assert!(product.contains(&row(&["2", "LA", "1", "Bob"])));
        assert_eq!(product.lookup("Employees.code")?, 2);
        assert!(product.lookup("code").is_err());
        Ok(())
    }

    fn relation_from(name: &str, rows: &[(i8, i8)]) -> Relation {
        let mut r = Relation::with_schema(name, &[("a", DataType::Numeric), ("b", DataType::Numeric)]);
        for (a, b) in rows {
            r.add_tuple(Tuple::new(vec![
                Value::Numeric(f64::from(*a)),
                Value::Numeric(f64::from(*b)),
            ]))
            .expect("degree matches");
        }
        r
    }

    fn small_rows() -> impl Strategy<Value = Vec<(i8, i8)>> {
        prop::collection::vec((0..4i8, 0..4i8), 0..12)
    }

    proptest! {
        #[test]
        fn prop_set_laws(left in small_rows(), right in small_rows()) {
            let a = relation_from("A", &left);
            let b = relation_from("B", &right);

            let union = Union::new(&a, &b).execute().unwrap();
            let minus = Minus::new(&a, &b).execute().unwrap();
            let intersect = Intersect::new(&a, &b).execute().unwrap();

            let expected_union: Vec<_> = a.tuples().union(b.tuples()).cloned().collect();
            let expected_minus: Vec<_> = a.tuples().difference(b.tuples()).cloned().collect();
            let expected_intersect: Vec<_> = a.tuples().intersection(b.tuples()).cloned().collect();

            prop_assert_eq!(union.tuples().iter().cloned().collect::<Vec<_>>(), expected_union);
            prop_assert_eq!(minus.tuples().iter().cloned().collect::<Vec<_>>(), expected_minus);
            prop_assert_eq!(intersect.tuples().iter().cloned().collect::<Vec<_>>(), expected_intersect);
        }

        #[test]
        fn prop_times_cardinality(left in small_rows(), right in small_rows()) {
            let a = relation_from("A", &left);
            let b = relation_from("B", &right);
            let product = Times::new(&a, &b).execute().unwrap();
            prop_assert_eq!(product.len(), a.len() * b.len());
            prop_assert_eq!(product.degree(), a.degree() + b.degree());
        }
    }
}
