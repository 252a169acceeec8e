// ConfigSynth: Synthesizing Resilient Network Security Configurations
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Models
//!
//! A [`Model`] is the valuation of a set of variables returned by a solver. Terms can be evaluated
//! in a model with [`Term::eval`], which is used to read derived quantities out of a solution and
//! to check assertions against hand-built valuations.

use super::term::{Sort, Term, Var};

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

const EPSILON: f64 = 1e-9;

/// Value of a variable in a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real value
    Real(f64),
}

impl Value {
    /// Sort of the value
    pub fn sort(&self) -> Sort {
        match self {
            Value::Bool(_) => Sort::Bool,
            Value::Int(_) => Sort::Int,
            Value::Real(_) => Sort::Real,
        }
    }

    /// Returns the boolean value
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            v => Err(EvalError::SortMismatch { expected: Sort::Bool, found: v.sort() }),
        }
    }

    /// Returns the integer value
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i),
            v => Err(EvalError::SortMismatch { expected: Sort::Int, found: v.sort() }),
        }
    }

    /// Returns the numeric value as a real. Integers are converted.
    pub fn as_real(&self) -> Result<f64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Real(r) => Ok(*r),
            v => Err(EvalError::SortMismatch { expected: Sort::Real, found: v.sort() }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
        }
    }
}

/// Errors while evaluating a term in a model
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// The variable has no value in the model
    #[error("Variable {0} has no value in the model")]
    UnknownVariable(String),
    /// A value has the wrong sort
    #[error("Expected a value of sort {expected}, but found {found}")]
    SortMismatch {
        /// Expected sort
        expected: Sort,
        /// Actual sort
        found: Sort,
    },
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

/// Valuation of variables
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    values: HashMap<String, Value>,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a variable
    pub fn set(&mut self, var: &Var, value: Value) {
        self.values.insert(var.name().to_string(), value);
    }

    /// Set the value of a variable by name
    pub fn set_named(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get the value of a variable
    pub fn evaluate(&self, var: &Var) -> Result<Value, EvalError> {
        self.values
            .get(var.name())
            .copied()
            .ok_or_else(|| EvalError::UnknownVariable(var.name().to_string()))
    }

    /// Number of variables with a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variable has a value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge all values of `other` into `self`, overwriting existing values.
    pub fn extend(&mut self, other: Model) {
        self.values.extend(other.values)
    }
}

fn numeric_op(
    a: Value,
    b: Value,
    int_op: impl Fn(i64, i64) -> i64,
    real_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(x, y))),
        (a, b) => Ok(Value::Real(real_op(a.as_real()?, b.as_real()?))),
    }
}

fn compare(a: Value, b: Value) -> Result<Option<std::cmp::Ordering>, EvalError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(&y))),
        (a, b) => {
            let (x, y) = (a.as_real()?, b.as_real()?);
            if (x - y).abs() <= EPSILON * (1.0 + x.abs().max(y.abs())) {
                Ok(Some(std::cmp::Ordering::Equal))
            } else {
                Ok(x.partial_cmp(&y))
            }
        }
    }
}

impl Term {
    /// Evaluate the term in a model. Real comparisons use a small relative tolerance.
    pub fn eval(&self, model: &Model) -> Result<Value, EvalError> {
        use std::cmp::Ordering::*;
        Ok(match self {
            Term::Bool(b) => Value::Bool(*b),
            Term::Int(i) => Value::Int(*i),
            Term::Real(r) => Value::Real(*r),
            Term::Var(v) => model.evaluate(v)?,
            Term::Not(t) => Value::Bool(!t.eval(model)?.as_bool()?),
            Term::And(ts) => {
                for t in ts {
                    if !t.eval(model)?.as_bool()? {
                        return Ok(Value::Bool(false));
                    }
                }
                Value::Bool(true)
            }
            Term::Or(ts) => {
                for t in ts {
                    if t.eval(model)?.as_bool()? {
                        return Ok(Value::Bool(true));
                    }
                }
                Value::Bool(false)
            }
            Term::Implies(a, b) => {
                Value::Bool(!a.eval(model)?.as_bool()? || b.eval(model)?.as_bool()?)
            }
            Term::Ite(c, a, b) => {
                if c.eval(model)?.as_bool()? {
                    a.eval(model)?
                } else {
                    b.eval(model)?
                }
            }
            Term::Eq(a, b) => match (a.eval(model)?, b.eval(model)?) {
                (Value::Bool(x), Value::Bool(y)) => Value::Bool(x == y),
                (x, y) => Value::Bool(compare(x, y)? == Some(Equal)),
            },
            Term::Le(a, b) => Value::Bool(matches!(
                compare(a.eval(model)?, b.eval(model)?)?,
                Some(Less) | Some(Equal)
            )),
            Term::Ge(a, b) => Value::Bool(matches!(
                compare(a.eval(model)?, b.eval(model)?)?,
                Some(Greater) | Some(Equal)
            )),
            Term::Lt(a, b) => Value::Bool(compare(a.eval(model)?, b.eval(model)?)? == Some(Less)),
            Term::Gt(a, b) => {
                Value::Bool(compare(a.eval(model)?, b.eval(model)?)? == Some(Greater))
            }
            Term::Add(ts) => {
                let mut acc = Value::Int(0);
                for t in ts {
                    acc = numeric_op(acc, t.eval(model)?, |x, y| x + y, |x, y| x + y)?;
                }
                acc
            }
            Term::Mul(ts) => {
                let mut acc = Value::Int(1);
                for t in ts {
                    acc = numeric_op(acc, t.eval(model)?, |x, y| x * y, |x, y| x * y)?;
                }
                acc
            }
            Term::Div(a, b) => {
                let x = a.eval(model)?.as_real()?;
                let y = b.eval(model)?.as_real()?;
                if y == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Real(x / y)
            }
        })
    }

    /// Evaluate a boolean term in a model
    pub fn holds(&self, model: &Model) -> Result<bool, EvalError> {
        self.eval(model)?.as_bool()
    }
}
