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

//! # Z3 Backend
//!
//! In-process solver using the `z3` crate. The solver borrows a [`z3::Context`], which must
//! outlive it:
//!
//! ```rust,ignore
//! let ctx = z3::Context::new(&z3::Config::new());
//! let solver = Z3Solver::new(&ctx, 60_000);
//! ```

use super::{Assertion, Model, SatResult, Solver, SolverError, Sort, Term, Value, Var};

use log::*;
use std::collections::HashMap;
use z3::ast::{self, Ast};
use z3::{Context, Params};

/// Translated term
enum Z3Term<'ctx> {
    Bool(ast::Bool<'ctx>),
    Int(ast::Int<'ctx>),
    Real(ast::Real<'ctx>),
}

impl<'ctx> Z3Term<'ctx> {
    fn bool(self) -> Result<ast::Bool<'ctx>, SolverError> {
        match self {
            Z3Term::Bool(b) => Ok(b),
            _ => Err(SolverError::Backend(String::from("expected a boolean term"))),
        }
    }

    /// Returns the term as a real, converting integers.
    fn real(self) -> Result<ast::Real<'ctx>, SolverError> {
        match self {
            Z3Term::Real(r) => Ok(r),
            Z3Term::Int(i) => Ok(ast::Real::from_int(&i)),
            Z3Term::Bool(_) => Err(SolverError::Backend(String::from("expected a numeric term"))),
        }
    }

    fn is_real(&self) -> bool {
        matches!(self, Z3Term::Real(_))
    }
}

/// # Z3 Solver
/// In-process solver. Every assertion is tracked by its name to obtain unsat cores.
pub struct Z3Solver<'ctx> {
    ctx: &'ctx Context,
    solver: z3::Solver<'ctx>,
    vars: HashMap<String, Sort>,
}

impl<'ctx> Z3Solver<'ctx> {
    /// Create a new solver with the timeout (in milliseconds) for every check.
    pub fn new(ctx: &'ctx Context, timeout_ms: u64) -> Self {
        let solver = z3::Solver::new(ctx);
        let mut params = Params::new(ctx);
        params.set_u32("timeout", timeout_ms.min(u32::MAX as u64) as u32);
        solver.set_params(&params);
        Self { ctx, solver, vars: HashMap::new() }
    }

    fn var(&self, var: &Var) -> Result<Z3Term<'ctx>, SolverError> {
        match self.vars.get(var.name()) {
            Some(Sort::Bool) => Ok(Z3Term::Bool(ast::Bool::new_const(self.ctx, var.name()))),
            Some(Sort::Int) => Ok(Z3Term::Int(ast::Int::new_const(self.ctx, var.name()))),
            Some(Sort::Real) => Ok(Z3Term::Real(ast::Real::new_const(self.ctx, var.name()))),
            None => Err(SolverError::Backend(format!("undeclared variable {}", var.name()))),
        }
    }

    fn real_const(&self, r: f64) -> Result<ast::Real<'ctx>, SolverError> {
        let (num, den) = rational(r);
        ast::Real::from_real_str(self.ctx, &num, &den)
            .ok_or_else(|| SolverError::Backend(format!("cannot represent {}", r)))
    }

    fn translate(&self, term: &Term) -> Result<Z3Term<'ctx>, SolverError> {
        Ok(match term {
            Term::Bool(b) => Z3Term::Bool(ast::Bool::from_bool(self.ctx, *b)),
            Term::Int(i) => Z3Term::Int(ast::Int::from_i64(self.ctx, *i)),
            Term::Real(r) => Z3Term::Real(self.real_const(*r)?),
            Term::Var(v) => self.var(v)?,
            Term::Not(t) => Z3Term::Bool(self.translate(t)?.bool()?.not()),
            Term::And(ts) => {
                let bs = self.bools(ts)?;
                Z3Term::Bool(ast::Bool::and(self.ctx, &bs.iter().collect::<Vec<_>>()))
            }
            Term::Or(ts) => {
                let bs = self.bools(ts)?;
                Z3Term::Bool(ast::Bool::or(self.ctx, &bs.iter().collect::<Vec<_>>()))
            }
            Term::Implies(a, b) => {
                let a = self.translate(a)?.bool()?;
                let b = self.translate(b)?.bool()?;
                Z3Term::Bool(a.implies(&b))
            }
            Term::Ite(c, a, b) => {
                let c = self.translate(c)?.bool()?;
                match (self.translate(a)?, self.translate(b)?) {
                    (Z3Term::Bool(a), Z3Term::Bool(b)) => Z3Term::Bool(c.ite(&a, &b)),
                    (Z3Term::Int(a), Z3Term::Int(b)) => Z3Term::Int(c.ite(&a, &b)),
                    (a, b) => Z3Term::Real(c.ite(&a.real()?, &b.real()?)),
                }
            }
            Term::Eq(a, b) => match (self.translate(a)?, self.translate(b)?) {
                (Z3Term::Bool(a), Z3Term::Bool(b)) => Z3Term::Bool(a._eq(&b)),
                (Z3Term::Int(a), Z3Term::Int(b)) => Z3Term::Bool(a._eq(&b)),
                (a, b) => Z3Term::Bool(a.real()?._eq(&b.real()?)),
            },
            Term::Le(a, b) => self.compare(a, b, |x, y| x.le(y), |x, y| x.le(y))?,
            Term::Ge(a, b) => self.compare(a, b, |x, y| x.ge(y), |x, y| x.ge(y))?,
            Term::Lt(a, b) => self.compare(a, b, |x, y| x.lt(y), |x, y| x.lt(y))?,
            Term::Gt(a, b) => self.compare(a, b, |x, y| x.gt(y), |x, y| x.gt(y))?,
            Term::Add(ts) | Term::Mul(ts) => {
                let is_add = matches!(term, Term::Add(_));
                let operands =
                    ts.iter().map(|t| self.translate(t)).collect::<Result<Vec<_>, _>>()?;
                if operands.iter().any(Z3Term::is_real) {
                    let rs = operands.into_iter().map(Z3Term::real).collect::<Result<Vec<_>, _>>()?;
                    let refs: Vec<&ast::Real<'ctx>> = rs.iter().collect();
                    Z3Term::Real(if is_add {
                        ast::Real::add(self.ctx, &refs)
                    } else {
                        ast::Real::mul(self.ctx, &refs)
                    })
                } else {
                    let is = operands
                        .into_iter()
                        .map(|t| match t {
                            Z3Term::Int(i) => Ok(i),
                            _ => Err(SolverError::Backend(String::from("expected a numeric term"))),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let refs: Vec<&ast::Int<'ctx>> = is.iter().collect();
                    Z3Term::Int(if is_add {
                        ast::Int::add(self.ctx, &refs)
                    } else {
                        ast::Int::mul(self.ctx, &refs)
                    })
                }
            }
            Term::Div(a, b) => {
                let a = self.translate(a)?.real()?;
                let b = self.translate(b)?.real()?;
                Z3Term::Real(a.div(&b))
            }
        })
    }

    fn bools(&self, ts: &[Term]) -> Result<Vec<ast::Bool<'ctx>>, SolverError> {
        ts.iter().map(|t| self.translate(t)?.bool()).collect()
    }

    fn compare(
        &self,
        a: &Term,
        b: &Term,
        int_op: impl Fn(&ast::Int<'ctx>, &ast::Int<'ctx>) -> ast::Bool<'ctx>,
        real_op: impl Fn(&ast::Real<'ctx>, &ast::Real<'ctx>) -> ast::Bool<'ctx>,
    ) -> Result<Z3Term<'ctx>, SolverError> {
        Ok(Z3Term::Bool(match (self.translate(a)?, self.translate(b)?) {
            (Z3Term::Int(x), Z3Term::Int(y)) => int_op(&x, &y),
            (x, y) => real_op(&x.real()?, &y.real()?),
        }))
    }
}

impl<'ctx> Solver for Z3Solver<'ctx> {
    fn declare(&mut self, var: &Var) -> Result<(), SolverError> {
        self.vars.insert(var.name().to_string(), var.sort());
        Ok(())
    }

    fn assert(&mut self, assertion: &Assertion) -> Result<(), SolverError> {
        let b = self.translate(&assertion.term)?.bool()?;
        let tracker = ast::Bool::new_const(self.ctx, assertion.name.as_str());
        self.solver.assert_and_track(&b, &tracker);
        Ok(())
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        Ok(match self.solver.check() {
            z3::SatResult::Sat => SatResult::Sat,
            z3::SatResult::Unsat => SatResult::Unsat,
            z3::SatResult::Unknown => {
                let reason = self.solver.get_reason_unknown().unwrap_or_else(|| "unknown".into());
                debug!("z3 returned unknown: {}", reason);
                SatResult::Unknown(reason)
            }
        })
    }

    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError> {
        let z3_model = self
            .solver
            .get_model()
            .ok_or_else(|| SolverError::Backend(String::from("no model available")))?;
        let mut model = Model::new();
        for var in vars {
            let missing = || SolverError::MissingValue(var.name().to_string());
            let value = match self.var(var)? {
                Z3Term::Bool(b) => {
                    let v = z3_model.eval(&b, true).and_then(|v| v.as_bool());
                    Value::Bool(v.ok_or_else(missing)?)
                }
                Z3Term::Int(i) => {
                    let v = z3_model.eval(&i, true).and_then(|v| v.as_i64());
                    Value::Int(v.ok_or_else(missing)?)
                }
                Z3Term::Real(r) => {
                    let (num, den) =
                        z3_model.eval(&r, true).and_then(|v| v.as_real()).ok_or_else(missing)?;
                    Value::Real(num as f64 / den as f64)
                }
            };
            model.set(var, value);
        }
        Ok(model)
    }

    fn unsat_core(&mut self) -> Result<Vec<String>, SolverError> {
        Ok(self
            .solver
            .get_unsat_core()
            .iter()
            .map(|b| b.to_string().trim_matches('|').to_string())
            .collect())
    }
}

/// Exact decimal expansion of `r` as a fraction of two integer strings.
fn rational(r: f64) -> (String, String) {
    let s = format!("{}", r.abs());
    let (int_part, frac_part) = match s.find('.') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s.as_str(), ""),
    };
    let digits = format!("{}{}", int_part, frac_part);
    let digits = digits.trim_start_matches('0');
    let num = if digits.is_empty() { "0" } else { digits };
    let sign = if r < 0.0 { "-" } else { "" };
    (format!("{}{}", sign, num), format!("1{}", "0".repeat(frac_part.len())))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::smt::Term;
    use z3::Config;

    #[test]
    fn rationals() {
        assert_eq!(rational(3.0), ("3".to_string(), "1".to_string()));
        assert_eq!(rational(-0.25), ("-25".to_string(), "100".to_string()));
        assert_eq!(rational(0.0), ("0".to_string(), "1".to_string()));
    }

    #[test]
    fn solve_small_problem() {
        let ctx = Context::new(&Config::new());
        let mut s = Z3Solver::new(&ctx, 10_000);
        let x = Var::new("x", Sort::Int);
        let r = Var::new("r", Sort::Real);
        s.declare(&x).unwrap();
        s.declare(&r).unwrap();
        s.assert(&Assertion::new("x@1", x.term().within(Term::int(2), Term::int(2)))).unwrap();
        s.assert(&Assertion::new(
            "r@1",
            r.term().eq(Term::real_sum(vec![x.term(), Term::real(0.5)]).div(Term::real(2.0))),
        ))
        .unwrap();
        assert_eq!(s.check().unwrap(), SatResult::Sat);
        let m = s.model(&[x.clone(), r.clone()]).unwrap();
        assert_eq!(m.evaluate(&x), Ok(Value::Int(2)));
        assert_eq!(m.evaluate(&r), Ok(Value::Real(1.25)));

        s.assert(&Assertion::new("x@2", x.term().gt(Term::int(5)))).unwrap();
        assert_eq!(s.check().unwrap(), SatResult::Unsat);
        let mut core = s.unsat_core().unwrap();
        core.sort();
        assert_eq!(core, vec!["x@1".to_string(), "x@2".to_string()]);
    }
}
