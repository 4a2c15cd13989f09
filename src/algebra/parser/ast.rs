use std::cmp::Ordering;

use crate::{
    algebra::{
        schema::{Relation, Tuple},
        types::Value,
    },
    error::{Error, Result},
};

/// Predicate expression tree
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// Attribute reference by short or pedantic name
    Field(String),
    /// Attribute reference resolved to a tuple position
    Column(usize),
    /// Constant value
    Consts(Consts),
    /// Comparison or logical connective
    Operation(Operation),
}

impl From<Consts> for Expression {
    fn from(value: Consts) -> Self {
        Self::Consts(value)
    }
}

impl From<Operation> for Expression {
    fn from(value: Operation) -> Self {
        Self::Operation(value)
    }
}

/// Constant values, also the result of evaluating an expression
#[derive(Debug, PartialEq, Clone)]
pub enum Consts {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<&Value> for Consts {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Consts::Null,
            Value::Text(s) => Consts::String(s.clone()),
            Value::Numeric(n) => Consts::Number(*n),
        }
    }
}

/// Binary operations
#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    Less(Box<Expression>, Box<Expression>),
    LessEqual(Box<Expression>, Box<Expression>),
    Greater(Box<Expression>, Box<Expression>),
    GreaterEqual(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Operation {
    fn map_operands<F>(self, mut f: F) -> Result<Operation>
    where
        F: FnMut(Expression) -> Result<Expression>,
    {
        let mut apply = |l: Box<Expression>, r: Box<Expression>| -> Result<_> {
            Ok((Box::new(f(*l)?), Box::new(f(*r)?)))
        };
        Ok(match self {
            Operation::Equal(l, r) => apply(l, r).map(|(l, r)| Operation::Equal(l, r))?,
            Operation::NotEqual(l, r) => apply(l, r).map(|(l, r)| Operation::NotEqual(l, r))?,
            Operation::Less(l, r) => apply(l, r).map(|(l, r)| Operation::Less(l, r))?,
            Operation::LessEqual(l, r) => apply(l, r).map(|(l, r)| Operation::LessEqual(l, r))?,
            Operation::Greater(l, r) => apply(l, r).map(|(l, r)| Operation::Greater(l, r))?,
            Operation::GreaterEqual(l, r) => {
                apply(l, r).map(|(l, r)| Operation::GreaterEqual(l, r))?
            }
            Operation::And(l, r) => apply(l, r).map(|(l, r)| Operation::And(l, r))?,
            Operation::Or(l, r) => apply(l, r).map(|(l, r)| Operation::Or(l, r))?,
        })
    }
}

impl Expression {
    /// Resolves every field reference to its position in `relation`
    ///
    /// Missing or ambiguous names make the whole predicate invalid.
    pub fn bind(self, relation: &Relation) -> Result<Expression> {
        match self {
            Expression::Field(name) => relation
                .lookup(&name)
                .map(Expression::Column)
                .map_err(|err| Error::InvalidExpression(err.to_string())),
            Expression::Operation(op) => Ok(op.map_operands(|e| e.bind(relation))?.into()),
            expr => Ok(expr),
        }
    }

    /// Evaluates the expression against one tuple
    pub fn evaluate(&self, tuple: &Tuple) -> Result<Consts> {
        Ok(match self {
            Expression::Consts(c) => c.clone(),
            Expression::Column(pos) => match tuple.get(*pos) {
                Some(v) => v.into(),
                None => {
                    return Err(Error::InvalidExpression(format!(
                        "column {} out of range",
                        pos
                    )));
                }
            },
            Expression::Field(name) => {
                return Err(Error::InvalidExpression(format!("unbound attribute {}", name)));
            }
            Expression::Operation(op) => match op {
                Operation::And(l, r) => {
                    Consts::Boolean(as_bool(l.evaluate(tuple)?)? && as_bool(r.evaluate(tuple)?)?)
                }
                Operation::Or(l, r) => {
                    Consts::Boolean(as_bool(l.evaluate(tuple)?)? || as_bool(r.evaluate(tuple)?)?)
                }
                Operation::Equal(l, r) => Consts::Boolean(equals(&l.evaluate(tuple)?, &r.evaluate(tuple)?)?),
                Operation::NotEqual(l, r) => {
                    Consts::Boolean(!equals(&l.evaluate(tuple)?, &r.evaluate(tuple)?)?)
                }
                Operation::Less(l, r) => ordered(l, r, tuple, |o| o == Ordering::Less)?,
                Operation::LessEqual(l, r) => ordered(l, r, tuple, |o| o != Ordering::Greater)?,
                Operation::Greater(l, r) => ordered(l, r, tuple, |o| o == Ordering::Greater)?,
                Operation::GreaterEqual(l, r) => ordered(l, r, tuple, |o| o != Ordering::Less)?,
            },
        })
    }
}

fn as_bool(value: Consts) -> Result<bool> {
    match value {
        Consts::Boolean(b) => Ok(b),
        v => Err(Error::InvalidExpression(format!(
            "expected a boolean operand, got {:?}",
            v
        ))),
    }
}

/// Orders two non-null operands of the same kind
fn compare(l: &Consts, r: &Consts) -> Result<Option<Ordering>> {
    Ok(match (l, r) {
        (Consts::Number(a), Consts::Number(b)) => a.partial_cmp(b),
        (Consts::String(a), Consts::String(b)) => Some(a.cmp(b)),
        (Consts::Boolean(a), Consts::Boolean(b)) => Some(a.cmp(b)),
        (a, b) => {
            return Err(Error::InvalidExpression(format!(
                "cannot compare {:?} with {:?}",
                a, b
            )));
        }
    })
}

/// `null = null` holds, null never equals a non-null value
fn equals(l: &Consts, r: &Consts) -> Result<bool> {
    match (l, r) {
        (Consts::Null, Consts::Null) => Ok(true),
        (Consts::Null, _) | (_, Consts::Null) => Ok(false),
        (l, r) => Ok(compare(l, r)? == Some(Ordering::Equal)),
    }
}

/// Ordering comparisons are false whenever null is involved
fn ordered<F>(l: &Expression, r: &Expression, tuple: &Tuple, accept: F) -> Result<Consts>
where
    F: Fn(Ordering) -> bool,
{
    let (l, r) = (l.evaluate(tuple)?, r.evaluate(tuple)?);
    if l == Consts::Null || r == Consts::Null {
        return Ok(Consts::Boolean(false));
    }
    Ok(Consts::Boolean(compare(&l, &r)?.is_some_and(accept)))
}
