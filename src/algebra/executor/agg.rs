use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt::Display,
};

use crate::{
    algebra::{
        schema::{Attribute, Relation, Tuple},
        types::{DataType, Value},
    },
    error::{Error, Result},
};

use super::Executor;

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFn {
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
    Count,
    CountDistinct,
    Max,
    Min,
}

impl AggFn {
    /// Parses a function name such as `SUM` or `count_distinct` (case-insensitive)
    pub fn from_str(name: &str) -> Option<AggFn> {
        Some(match name.to_uppercase().as_ref() {
            "SUM" => AggFn::Sum,
            "SUM_DISTINCT" => AggFn::SumDistinct,
            "AVG" => AggFn::Avg,
            "AVG_DISTINCT" => AggFn::AvgDistinct,
            "COUNT" => AggFn::Count,
            "COUNT_DISTINCT" => AggFn::CountDistinct,
            "MAX" => AggFn::Max,
            "MIN" => AggFn::Min,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            AggFn::Sum => "SUM",
            AggFn::SumDistinct => "SUM_DISTINCT",
            AggFn::Avg => "AVG",
            AggFn::AvgDistinct => "AVG_DISTINCT",
            AggFn::Count => "COUNT",
            AggFn::CountDistinct => "COUNT_DISTINCT",
            AggFn::Max => "MAX",
            AggFn::Min => "MIN",
        }
    }

    /// Whether the function needs NUMERIC input
    fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            AggFn::Sum | AggFn::SumDistinct | AggFn::Avg | AggFn::AvgDistinct
        )
    }

    /// Type of the aggregate's output attribute for an input of type `source`
    pub fn output_type(&self, source: DataType) -> DataType {
        match self {
            AggFn::Max | AggFn::Min => source,
            _ => DataType::Numeric,
        }
    }
}

impl Display for AggFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Aggregate executor - groups tuples and reduces each group to one tuple
///
/// Output schema: grouping attributes in the given order, then one `FN(attr)`
/// attribute per function. Without grouping attributes the whole relation is
/// a single group, so exactly one tuple is produced even for empty input.
pub struct Aggregate<'a> {
    source: &'a Relation,
    fns: Vec<AggFn>,
    attrs: Vec<String>,
    groups: Vec<String>,
}

impl<'a> Aggregate<'a> {
    pub fn new(
        source: &'a Relation,
        fns: Vec<AggFn>,
        attrs: Vec<String>,
        groups: Vec<String>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            fns,
            attrs,
            groups,
        })
    }

    fn schema(&self, attr_pos: &[usize], group_pos: &[usize]) -> Vec<Attribute> {
        let source = self.source.attributes();
        // Grouping columns are named as the caller wrote them
        let mut schema: Vec<Attribute> = self
            .groups
            .iter()
            .zip(group_pos)
            .map(|(name, &pos)| Attribute::new(None, source[pos].datatype, name.clone()))
            .collect();
        for ((func, attr), &pos) in self.fns.iter().zip(&self.attrs).zip(attr_pos) {
            schema.push(Attribute::new(
                None,
                func.output_type(source[pos].datatype),
                format!("{}({})", func, attr),
            ));
        }
        schema
    }
}

/// Lexicographic comparison of two tuples on the given positions
fn compare_on(positions: &[usize], a: &Tuple, b: &Tuple) -> Ordering {
    for &pos in positions {
        match a.values()[pos].cmp(&b.values()[pos]) {
            Ordering::Equal => {}
            o => return o,
        }
    }
    Ordering::Equal
}

impl Executor for Aggregate<'_> {
    fn execute(self: Box<Self>) -> Result<Relation> {
        if self.fns.is_empty() || self.attrs.is_empty() {
            return Err(Error::EmptyAggregationSpec);
        }
        if self.fns.len() != self.attrs.len() {
            return Err(Error::ArityMismatch {
                expected: self.fns.len(),
                got: self.attrs.len(),
            });
        }

        let attr_pos = self
            .attrs
            .iter()
            .map(|name| self.source.lookup(name))
            .collect::<Result<Vec<_>>>()?;
        let group_pos = self
            .groups
            .iter()
            .map(|name| self.source.lookup(name))
            .collect::<Result<Vec<_>>>()?;

        // Arithmetic over TEXT is rejected before any group is reduced
        for ((func, attr), &pos) in self.fns.iter().zip(&self.attrs).zip(&attr_pos) {
            let datatype = self.source.attributes()[pos].datatype;
            if func.is_arithmetic() && datatype == DataType::Text {
                return Err(Error::TypeMismatch(format!(
                    "{} cannot be applied to {} attribute {}",
                    func, datatype, attr
                )));
            }
        }

        let mut result = Relation::new(None);
        result.set_attributes(self.schema(&attr_pos, &group_pos));
        let calculators: Vec<_> = self.fns.iter().map(|f| <dyn Calculator>::build(*f)).collect();

        // Sort by the grouping key, then reduce each run of equal keys
        let mut tuples: Vec<&Tuple> = self.source.tuples().iter().collect();
        tuples.sort_by(|a, b| compare_on(&group_pos, a, b));
        let groups: Vec<&[&Tuple]> = if group_pos.is_empty() {
            vec![tuples.as_slice()]
        } else {
            tuples
                .chunk_by(|a, b| compare_on(&group_pos, a, b) == Ordering::Equal)
                .collect()
        };

        for group in groups {
            let mut values = match group.first() {
                Some(first) => first.project(&group_pos).into_values(),
                None => Vec::new(),
            };
            for (calculator, &pos) in calculators.iter().zip(&attr_pos) {
                values.push(calculator.calc(pos, group)?);
            }
            result.add_tuple(Tuple::new(values))?;
        }
        Ok(result)
    }
}

/// Reduces the values at `pos` of a group of tuples to one value
pub trait Calculator {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value>;
}

impl dyn Calculator {
    /// Runtime dispatch to the calculator of an aggregate function
    pub fn build(func: AggFn) -> Box<dyn Calculator> {
        match func {
            AggFn::Count => Count::new(false),
            AggFn::CountDistinct => Count::new(true),
            AggFn::Sum => Sum::new(false),
            AggFn::SumDistinct => Sum::new(true),
            AggFn::Avg => Avg::new(false),
            AggFn::AvgDistinct => Avg::new(true),
            AggFn::Max => Max::new(),
            AggFn::Min => Min::new(),
        }
    }
}

/// Values at `pos`, deduplicated when `distinct` is set
fn column<'t>(pos: usize, group: &[&'t Tuple], distinct: bool) -> Vec<&'t Value> {
    let values = group.iter().map(|t| &t.values()[pos]);
    if distinct {
        values.collect::<BTreeSet<_>>().into_iter().collect()
    } else {
        values.collect()
    }
}

/// COUNT - group cardinality; COUNT_DISTINCT - number of distinct values
pub struct Count {
    distinct: bool,
}

impl Count {
    fn new(distinct: bool) -> Box<Self> {
        Box::new(Self { distinct })
    }
}

impl Calculator for Count {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value> {
        Ok(Value::Numeric(column(pos, group, self.distinct).len() as f64))
    }
}

/// SUM - sum of the non-null values
pub struct Sum {
    distinct: bool,
}

impl Sum {
    fn new(distinct: bool) -> Box<Self> {
        Box::new(Self { distinct })
    }
}

impl Calculator for Sum {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value> {
        let mut sum = 0.0;
        for value in column(pos, group, self.distinct) {
            match value {
                Value::Null => {}
                Value::Numeric(v) => sum += v,
                Value::Text(v) => {
                    return Err(Error::TypeMismatch(format!("can not sum text value {}", v)));
                }
            }
        }
        Ok(Value::Numeric(sum))
    }
}

/// AVG - sum divided by the group cardinality
///
/// AVG_DISTINCT sums distinct values but still divides by the full group size.
pub struct Avg {
    distinct: bool,
}

impl Avg {
    fn new(distinct: bool) -> Box<Self> {
        Box::new(Self { distinct })
    }
}

impl Calculator for Avg {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value> {
        if group.is_empty() {
            return Ok(Value::Null);
        }
        Ok(match Sum::new(self.distinct).calc(pos, group)? {
            Value::Numeric(sum) => Value::Numeric(sum / group.len() as f64),
            _ => Value::Null,
        })
    }
}

/// MAX - greatest non-null value in natural order
pub struct Max;

impl Max {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Max {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value> {
        Ok(column(pos, group, false)
            .into_iter()
            .filter(|v| !v.is_null())
            .max()
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// MIN - least non-null value in natural order
pub struct Min;

impl Min {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Min {
    fn calc(&self, pos: usize, group: &[&Tuple]) -> Result<Value> {
        Ok(column(pos, group, false)
            .into_iter()
            .filter(|v| !v.is_null())
            .min()
            .cloned()
            .unwrap_or(Value::Null))
    }
}
