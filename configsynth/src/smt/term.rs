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

//! # Terms
//!
//! Solver-neutral representation of typed symbolic expressions. Every [`Term`] prints itself in
//! SMT-LIB 2 syntax, which is what the [`SmtLibSolver`](super::SmtLibSolver) sends to the solver
//! and what ends up in the assertion trace.

use std::fmt;

/// Sort of a variable or term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    /// Boolean
    Bool,
    /// Mathematical integer
    Int,
    /// Mathematical real
    Real,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
        }
    }
}

/// Symbolic variable (an uninterpreted constant)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    name: String,
    sort: Sort,
}

impl Var {
    /// Create a new variable
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self { name: name.into(), sort }
    }

    /// Name of the variable
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort of the variable
    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// Term referring to this variable
    pub fn term(&self) -> Term {
        Term::Var(self.clone())
    }

    /// SMT-LIB declaration of this variable
    pub fn declaration(&self) -> String {
        format!("(declare-const {} {})", self.name, self.sort)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// # Term
///
/// Typed expression tree over [`Var`]s. Use the constructor functions instead of building the
/// variants by hand; they flatten nested conjunctions and keep single-element sums small.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Boolean constant
    Bool(bool),
    /// Integer constant
    Int(i64),
    /// Real constant
    Real(f64),
    /// Variable
    Var(Var),
    /// Negation
    Not(Box<Term>),
    /// Conjunction. The empty conjunction is `true`.
    And(Vec<Term>),
    /// Disjunction. The empty disjunction is `false`.
    Or(Vec<Term>),
    /// Implication
    Implies(Box<Term>, Box<Term>),
    /// If-then-else
    Ite(Box<Term>, Box<Term>, Box<Term>),
    /// Equality
    Eq(Box<Term>, Box<Term>),
    /// Less or equal
    Le(Box<Term>, Box<Term>),
    /// Greater or equal
    Ge(Box<Term>, Box<Term>),
    /// Strictly less
    Lt(Box<Term>, Box<Term>),
    /// Strictly greater
    Gt(Box<Term>, Box<Term>),
    /// Sum
    Add(Vec<Term>),
    /// Product
    Mul(Vec<Term>),
    /// Real division
    Div(Box<Term>, Box<Term>),
}

impl Term {
    /// Boolean constant
    pub fn bool(b: bool) -> Self {
        Term::Bool(b)
    }

    /// Integer constant
    pub fn int(i: i64) -> Self {
        Term::Int(i)
    }

    /// Real constant
    pub fn real(r: f64) -> Self {
        Term::Real(r)
    }

    /// Negation of `self`
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Term::Not(Box::new(self))
    }

    /// Conjunction of all terms. Nested conjunctions are flattened, and a single term is returned
    /// as is.
    pub fn and(terms: Vec<Term>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Term::And(inner) => flat.extend(inner),
                t => flat.push(t),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or(Term::Bool(true))
        } else {
            Term::And(flat)
        }
    }

    /// Disjunction of all terms. A single term is returned as is.
    pub fn or(mut terms: Vec<Term>) -> Self {
        if terms.len() == 1 {
            terms.pop().unwrap_or(Term::Bool(false))
        } else {
            Term::Or(terms)
        }
    }

    /// `self ⇒ other`
    pub fn implies(self, other: Term) -> Self {
        Term::Implies(Box::new(self), Box::new(other))
    }

    /// `if self then a else b`
    pub fn ite(self, a: Term, b: Term) -> Self {
        Term::Ite(Box::new(self), Box::new(a), Box::new(b))
    }

    /// `self = other`
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: Term) -> Self {
        Term::Eq(Box::new(self), Box::new(other))
    }

    /// `self ≤ other`
    pub fn le(self, other: Term) -> Self {
        Term::Le(Box::new(self), Box::new(other))
    }

    /// `self ≥ other`
    pub fn ge(self, other: Term) -> Self {
        Term::Ge(Box::new(self), Box::new(other))
    }

    /// `self < other`
    pub fn lt(self, other: Term) -> Self {
        Term::Lt(Box::new(self), Box::new(other))
    }

    /// `self > other`
    pub fn gt(self, other: Term) -> Self {
        Term::Gt(Box::new(self), Box::new(other))
    }

    /// Sum of all terms
    pub fn add(terms: Vec<Term>) -> Self {
        Term::Add(terms)
    }

    /// Real sum of all terms. The empty sum is `0.0`, and a single term is returned as is.
    pub fn real_sum(mut terms: Vec<Term>) -> Self {
        match terms.len() {
            0 => Term::Real(0.0),
            1 => terms.pop().unwrap_or(Term::Real(0.0)),
            _ => Term::Add(terms),
        }
    }

    /// Product of all terms
    pub fn mul(terms: Vec<Term>) -> Self {
        Term::Mul(terms)
    }

    /// `self / other`
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: Term) -> Self {
        Term::Div(Box::new(self), Box::new(other))
    }

    /// `lo ≤ self ≤ hi`
    pub fn within(self, lo: Term, hi: Term) -> Self {
        Term::and(vec![self.clone().ge(lo), self.le(hi)])
    }

    /// Sort of the term. Arithmetic terms are `Real` as soon as one operand is `Real`.
    pub fn sort(&self) -> Sort {
        match self {
            Term::Bool(_) => Sort::Bool,
            Term::Int(_) => Sort::Int,
            Term::Real(_) => Sort::Real,
            Term::Var(v) => v.sort(),
            Term::Not(_)
            | Term::And(_)
            | Term::Or(_)
            | Term::Implies(_, _)
            | Term::Eq(_, _)
            | Term::Le(_, _)
            | Term::Ge(_, _)
            | Term::Lt(_, _)
            | Term::Gt(_, _) => Sort::Bool,
            Term::Ite(_, a, _) => a.sort(),
            Term::Add(ts) | Term::Mul(ts) => {
                if ts.iter().any(|t| t.sort() == Sort::Real) {
                    Sort::Real
                } else {
                    Sort::Int
                }
            }
            Term::Div(_, _) => Sort::Real,
        }
    }

    /// Collect all variables in the term, in order of their first appearance.
    pub fn vars(&self) -> Vec<&Var> {
        let mut result: Vec<&Var> = Vec::new();
        self.collect_vars(&mut result);
        result
    }

    fn collect_vars<'a>(&'a self, acc: &mut Vec<&'a Var>) {
        match self {
            Term::Bool(_) | Term::Int(_) | Term::Real(_) => {}
            Term::Var(v) => {
                if !acc.contains(&v) {
                    acc.push(v)
                }
            }
            Term::Not(t) => t.collect_vars(acc),
            Term::And(ts) | Term::Or(ts) | Term::Add(ts) | Term::Mul(ts) => {
                ts.iter().for_each(|t| t.collect_vars(acc))
            }
            Term::Implies(a, b)
            | Term::Eq(a, b)
            | Term::Le(a, b)
            | Term::Ge(a, b)
            | Term::Lt(a, b)
            | Term::Gt(a, b)
            | Term::Div(a, b) => {
                a.collect_vars(acc);
                b.collect_vars(acc);
            }
            Term::Ite(c, a, b) => {
                c.collect_vars(acc);
                a.collect_vars(acc);
                b.collect_vars(acc);
            }
        }
    }
}

impl From<&Var> for Term {
    fn from(v: &Var) -> Self {
        v.term()
    }
}

/// Format a real constant as an SMT-LIB decimal
pub(crate) fn fmt_real(r: f64) -> String {
    let abs = r.abs();
    let s = if abs.fract() == 0.0 { format!("{:.1}", abs) } else { format!("{}", abs) };
    if r < 0.0 {
        format!("(- {})", s)
    } else {
        s
    }
}

fn fmt_nary(f: &mut fmt::Formatter<'_>, op: &str, ts: &[Term]) -> fmt::Result {
    write!(f, "({}", op)?;
    for t in ts {
        write!(f, " {}", t)?;
    }
    write!(f, ")")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bool(b) => write!(f, "{}", b),
            Term::Int(i) if *i < 0 => write!(f, "(- {})", -(*i as i128)),
            Term::Int(i) => write!(f, "{}", i),
            Term::Real(r) => write!(f, "{}", fmt_real(*r)),
            Term::Var(v) => write!(f, "{}", v),
            Term::Not(t) => write!(f, "(not {})", t),
            Term::And(ts) if ts.is_empty() => write!(f, "true"),
            Term::And(ts) => fmt_nary(f, "and", ts),
            Term::Or(ts) if ts.is_empty() => write!(f, "false"),
            Term::Or(ts) => fmt_nary(f, "or", ts),
            Term::Implies(a, b) => write!(f, "(=> {} {})", a, b),
            Term::Ite(c, a, b) => write!(f, "(ite {} {} {})", c, a, b),
            Term::Eq(a, b) => write!(f, "(= {} {})", a, b),
            Term::Le(a, b) => write!(f, "(<= {} {})", a, b),
            Term::Ge(a, b) => write!(f, "(>= {} {})", a, b),
            Term::Lt(a, b) => write!(f, "(< {} {})", a, b),
            Term::Gt(a, b) => write!(f, "(> {} {})", a, b),
            Term::Add(ts) if ts.is_empty() => write!(f, "0"),
            Term::Add(ts) => fmt_nary(f, "+", ts),
            Term::Mul(ts) if ts.is_empty() => write!(f, "1"),
            Term::Mul(ts) => fmt_nary(f, "*", ts),
            Term::Div(a, b) => write!(f, "(/ {} {})", a, b),
        }
    }
}
