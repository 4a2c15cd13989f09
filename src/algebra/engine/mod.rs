use std::{
    borrow::{Borrow, Cow},
    time::Duration,
};

use tracing::debug;

use crate::{
    algebra::{
        executor::{
            AggFn, Aggregate, Executor, HashJoin, Intersect, Minus, NaturalJoin, Project,
            RenameAttributes, RenameRelation, Select, SortMergeJoin, Times, Union,
        },
        schema::Relation,
    },
    error::Result,
    perf::{Stopwatch, Timeable},
};

/// Relational algebra query engine
///
/// Every operator reads its inputs and returns a new relation. The engine
/// accumulates the wall-clock time of each call in its stopwatch until
/// `reset_elapsed_time` is called.
#[derive(Debug, Default)]
pub struct QueryEngine {
    stopwatch: Stopwatch,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one top-level operator and records its duration
    fn timed<R: Borrow<Relation>>(
        &mut self,
        operator: &'static str,
        f: impl FnOnce() -> Result<R>,
    ) -> Result<R> {
        let (result, elapsed) = self.stopwatch.time(f);
        let relation = result?;
        debug!(
            operator,
            tuples = relation.borrow().len(),
            elapsed_us = elapsed.as_micros() as u64,
            "operator finished"
        );
        Ok(relation)
    }

    /// Tuples of `r` satisfying `condition`; an empty condition returns `r` itself
    pub fn select<'a>(&mut self, r: &'a Relation, condition: &str) -> Result<Cow<'a, Relation>> {
        self.timed("select", || {
            if condition.trim().is_empty() {
                return Ok(Cow::Borrowed(r));
            }
            Select::new(r, condition).execute().map(Cow::Owned)
        })
    }

    /// Keeps the named attributes, in the given order
    pub fn project(&mut self, r: &Relation, attrs: &[&str]) -> Result<Relation> {
        self.timed("project", || Project::new(r, owned(attrs)).execute())
    }

    pub fn rename_relation(&mut self, r: &Relation, name: &str) -> Result<Relation> {
        self.timed("rename", || RenameRelation::new(r, name).execute())
    }

    /// Renames every attribute of `r`, in schema order
    pub fn rename_attributes(&mut self, r: &Relation, names: &[&str]) -> Result<Relation> {
        self.timed("rename", || RenameAttributes::new(r, owned(names)).execute())
    }

    pub fn union(&mut self, a: &Relation, b: &Relation) -> Result<Relation> {
        self.timed("union", || Union::new(a, b).execute())
    }

    pub fn intersect(&mut self, a: &Relation, b: &Relation) -> Result<Relation> {
        self.timed("intersect", || Intersect::new(a, b).execute())
    }

    pub fn minus(&mut self, a: &Relation, b: &Relation) -> Result<Relation> {
        self.timed("minus", || Minus::new(a, b).execute())
    }

    pub fn times(&mut self, a: &Relation, b: &Relation) -> Result<Relation> {
        self.timed("times", || Times::new(a, b).execute())
    }

    pub fn natural_join(&mut self, r1: &Relation, r2: &Relation) -> Result<Relation> {
        self.timed("natural_join", || NaturalJoin::new(r1, r2).execute())
    }

    /// Equi-join on the common attributes; their values must be unique in `r1`
    pub fn hash_join(&mut self, r1: &Relation, r2: &Relation) -> Result<Relation> {
        self.timed("hash_join", || HashJoin::new(r1, r2).execute())
    }

    pub fn sort_join(&mut self, r1: &Relation, r2: &Relation) -> Result<Relation> {
        self.timed("sort_join", || SortMergeJoin::new(r1, r2).execute())
    }

    /// Applies `fns[i]` to `attrs[i]`, per group of `groups` values or over all of `r`
    pub fn aggregate(
        &mut self,
        r: &Relation,
        fns: &[AggFn],
        attrs: &[&str],
        groups: Option<&[&str]>,
    ) -> Result<Relation> {
        self.timed("aggregate", || {
            Aggregate::new(
                r,
                fns.to_vec(),
                owned(attrs),
                owned(groups.unwrap_or_default()),
            )
            .execute()
        })
    }
}

impl Timeable for QueryEngine {
    fn elapsed_time(&self) -> Duration {
        self.stopwatch.elapsed_time()
    }

    fn reset_elapsed_time(&mut self) {
        self.stopwatch.reset_elapsed_time();
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, io::Write, time::Duration};

    use super::QueryEngine;
    use crate::{
        algebra::{
            executor::AggFn,
            schema::{Relation, Tuple},
            types::Value,
        },
        error::{Error, Result},
        logging,
        perf::Timeable,
        storage::Catalog,
    };

    fn row(values: &[&str]) -> Tuple {
        Tuple::new(values.iter().map(|v| Value::from(*v)).collect())
    }

    fn short_names(relation: &Relation) -> Vec<&str> {
        relation.attributes().iter().map(|a| a.name.as_str()).collect()
    }

    /// Loads Offices and Employees from temporary schema and data files
    fn scenario() -> Result<Catalog> {
        let dir = tempfile::tempdir()?;
        let schema = dir.path().join("schema.txt");
        std::fs::write(&schema, "Offices(code TEXT, city TEXT)\nEmployees(code TEXT, name TEXT)\n")?;

        let offices = dir.path().join("offices.dat");
        let mut file = std::fs::File::create(&offices)?;
        writeln!(file, "'1'|'NYC'\n'2'|'LA'")?;
        let employees = dir.path().join("employees.dat");
        let mut file = std::fs::File::create(&employees)?;
        writeln!(file, "'1'|'Alice'\n'1'|'Bob'\n'3'|'Carol'")?;

        let mut catalog = Catalog::open(&schema)?;
        catalog.load("Offices", &offices)?;
        catalog.load("Employees", &employees)?;
        Ok(catalog)
    }

    #[test]
    fn test_offices_employees_scenario() -> Result<()> {
        logging::init_test();
        let catalog = scenario()?;
        let offices = catalog.must_get_relation("Offices")?;
        let employees = catalog.must_get_relation("Employees")?;
        let mut engine = QueryEngine::new();

        let join = engine.natural_join(offices, employees)?;
        assert_eq!(short_names(&join), vec!["code", "city", "name"]);
        assert_eq!(join.len(), 2);
        assert!(join.contains(&row(&["1", "NYC", "Alice"])));
        assert!(join.contains(&row(&["1", "NYC", "Bob"])));

        let hashed = engine.hash_join(offices, employees)?;
        assert_eq!(hashed.tuples(), join.tuples());
        let sorted = engine.sort_join(offices, employees)?;
        assert_eq!(sorted.tuples(), join.tuples());
        assert!(matches!(
            engine.hash_join(employees, offices),
            Err(Error::UniquenessViolation(_))
        ));

        let counts = engine.aggregate(employees, &[AggFn::Count], &["name"], Some(&["code"][..]))?;
        assert_eq!(short_names(&counts), vec!["code", "COUNT(name)"]);
        assert!(counts.contains(&Tuple::new(vec![Value::from("1"), Value::from(2.0)])));
        assert!(counts.contains(&Tuple::new(vec![Value::from("3"), Value::from(1.0)])));
        Ok(())
    }

    #[test]
    fn test_composed_query() -> Result<()> {
        let catalog = scenario()?;
        let offices = catalog.must_get_relation("Offices")?;
        let employees = catalog.must_get_relation("Employees")?;
        let mut engine = QueryEngine::new();

        // Names of employees working in NYC
        let product = engine.times(offices, employees)?;
        let matched = engine.select(&product, "Offices.code = Employees.code && city = 'NYC'")?;
        let names = engine.project(&matched, &["name"])?;
        assert_eq!(names.len(), 2);

        let renamed = engine.rename_attributes(&names, &["who"])?;
        let people = engine.rename_relation(&renamed, "People")?;
        assert_eq!(people.lookup("People.who")?, 0);

        let everyone = engine.project(employees, &["name"])?;
        let everyone = engine.rename_attributes(&everyone, &["who"])?;
        let others = engine.minus(&everyone, &people)?;
        assert!(others.contains(&row(&["Carol"])));
        assert_eq!(engine.union(&others, &people)?.len(), 3);
        assert_eq!(engine.intersect(&everyone, &people)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_select_without_condition_is_identity() -> Result<()> {
        let catalog = scenario()?;
        let offices = catalog.must_get_relation("Offices")?;
        let mut engine = QueryEngine::new();

        let all = engine.select(offices, "")?;
        assert!(matches!(all, Cow::Borrowed(r) if std::ptr::eq(r, offices)));
        let some = engine.select(offices, "city = 'LA'")?;
        assert!(matches!(some, Cow::Owned(_)));
        assert_eq!(some.len(), 1);
        Ok(())
    }

    #[test]
    fn test_elapsed_time_accumulates_until_reset() -> Result<()> {
        let catalog = scenario()?;
        let offices = catalog.must_get_relation("Offices")?;
        let employees = catalog.must_get_relation("Employees")?;
        let mut engine = QueryEngine::new();
        assert_eq!(engine.elapsed_time(), Duration::ZERO);

        engine.natural_join(offices, employees)?;
        let after_join = engine.elapsed_time();
        engine.times(offices, employees)?;
        assert!(engine.elapsed_time() >= after_join);

        engine.reset_elapsed_time();
        assert_eq!(engine.elapsed_time(), Duration::ZERO);
        Ok(())
    }
}
