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

//! # Solver Interface
//!
//! This module contains the solver-neutral term language ([`Term`], [`Var`], [`Sort`]), models
//! ([`Model`], [`Value`]), and the [`Solver`] trait through which the synthesis talks to the
//! decision procedure. Two backends are provided:
//!
//! - [`SmtLibSolver`]: drives an external solver process over SMT-LIB 2 (by default `z3 -in
//!   -smt2`).
//! - `Z3Solver`: in-process solver using the `z3` crate. Only available with the feature `z3`.
//!
//! Every assertion is named, such that the solver can report an unsat core in terms of the
//! assertion names.

pub mod model;
pub mod smtlib;
pub mod term;
#[cfg(feature = "z3")]
pub mod z3_backend;

pub use model::{EvalError, Model, Value};
pub use smtlib::SmtLibSolver;
pub use term::{Sort, Term, Var};
#[cfg(feature = "z3")]
pub use z3_backend::Z3Solver;

use std::fmt;
use thiserror::Error;

/// Named assertion
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    /// Name, used to report the unsat core
    pub name: String,
    /// Boolean term which must hold
    pub term: Term,
}

impl Assertion {
    /// Create a new named assertion
    pub fn new(name: impl Into<String>, term: Term) -> Self {
        Self { name: name.into(), term }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(assert (! {} :named {}))", self.term, self.name)
    }
}

/// Result of a satisfiability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResult {
    /// The assertions are satisfiable; a model is available.
    Sat,
    /// The assertions are unsatisfiable; an unsat core is available.
    Unsat,
    /// The solver gave up, with the reason reported by the solver (e.g., `timeout`).
    Unknown(String),
}

/// Errors while talking to the solver
#[derive(Debug, Error)]
pub enum SolverError {
    /// Io Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// The solver process could not be started
    #[error("Cannot start the solver {cmd}: {source}")]
    Spawn {
        /// Command that was executed
        cmd: String,
        /// Cause
        source: std::io::Error,
    },
    /// The solver terminated unexpectedly
    #[error("The solver terminated unexpectedly")]
    Closed,
    /// The solver reported an error
    #[error("The solver reported an error: {0}")]
    Reported(String),
    /// The response of the solver could not be understood
    #[error("Unexpected response from the solver: {0}")]
    Protocol(String),
    /// The solver did not return a value for a variable
    #[error("The solver returned no value for {0}")]
    MissingValue(String),
    /// The solver gave up
    #[error("The solver returned unknown: {0}")]
    Unknown(String),
    /// Error of the in-process backend
    #[error("Backend error: {0}")]
    Backend(String),
}

/// # Solver
///
/// Incremental solver. Variables must be declared before they are used in an assertion, and
/// assertions accumulate over the lifetime of the solver. The timeout is set when the solver is
/// created.
pub trait Solver {
    /// Declare a variable
    fn declare(&mut self, var: &Var) -> Result<(), SolverError>;

    /// Add a named assertion
    fn assert(&mut self, assertion: &Assertion) -> Result<(), SolverError>;

    /// Check the conjunction of all assertions
    fn check(&mut self) -> Result<SatResult, SolverError>;

    /// Get the values of the given variables after a [`SatResult::Sat`] check.
    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError>;

    /// Get the names of the assertions in the unsat core after a [`SatResult::Unsat`] check.
    fn unsat_core(&mut self) -> Result<Vec<String>, SolverError>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn declare(&mut self, var: &Var) -> Result<(), SolverError> {
        (**self).declare(var)
    }

    fn assert(&mut self, assertion: &Assertion) -> Result<(), SolverError> {
        (**self).assert(assertion)
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        (**self).check()
    }

    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError> {
        (**self).model(vars)
    }

    fn unsat_core(&mut self) -> Result<Vec<String>, SolverError> {
        (**self).unsat_core()
    }
}

/// Render declarations and assertions as a complete SMT-LIB 2 script, ending in `(check-sat)`.
pub fn script(declarations: &[Var], assertions: &[Assertion]) -> String {
    let mut smt = String::new();
    smt.push_str("(set-option :produce-unsat-cores true)\n");
    for var in declarations {
        smt.push_str(&var.declaration());
        smt.push('\n');
    }
    for assertion in assertions {
        smt.push_str(&assertion.to_string());
        smt.push('\n');
    }
    smt.push_str("(check-sat)\n");
    smt
}
