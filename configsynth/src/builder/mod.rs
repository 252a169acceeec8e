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

//! # Constraint Builder
//!
//! This module translates a [`Scenario`] into a [`ConstraintSet`]: the symbolic variables and the
//! named assertions which encode the isolation, diversity, resiliency, usability and cost model,
//! together with the threshold targets derived from the sliders.
//!
//! The assertions are emitted in a fixed order: first the isolation model, then diversity,
//! resiliency, the routes of every flow, the cost model, and finally the thresholds. Every
//! assertion is named `<tag>@<n>`, where `tag` describes the constraint (for example
//! `reach_msr_1_2`) and `n` is its position in the set. These names appear in the unsat core.

mod cost;
mod diversity;
mod isolation;
mod resiliency;
mod routes;
pub mod targets;
pub mod vars;

pub use targets::Targets;
pub use vars::{SynthVars, VarTable};

use crate::config::SynthConfig;
use crate::enumerate::Solution;
use crate::scenario::Scenario;
use crate::smt::{script, Assertion, Solver, SolverError, Term, Var};
use crate::topology::Route;
use crate::types::{all_flows, DeviceId, Flow};
use crate::Error;

use log::*;
use std::collections::BTreeMap;

/// Ordered list of named assertions
#[derive(Debug, Clone, Default)]
pub struct Assertions {
    list: Vec<Assertion>,
}

impl Assertions {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assertion named `<tag>@<n>`.
    pub fn add(&mut self, tag: impl AsRef<str>, term: Term) {
        let name = format!("{}@{}", tag.as_ref(), self.list.len() + 1);
        self.list.push(Assertion::new(name, term));
    }

    /// Number of assertions
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if no assertion was added
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// All assertions in the order they were added
    pub fn as_slice(&self) -> &[Assertion] {
        &self.list
    }
}

/// # Constraint Set
///
/// Complete encoding of one synthesis problem. Submit it to a solver with
/// [`ConstraintSet::submit`], or render it as an SMT-LIB script with [`ConstraintSet::script`].
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    /// All symbolic variables
    pub vars: SynthVars,
    /// Weights, maxima and thresholds
    pub targets: Targets,
    /// Routes of every off-diagonal flow
    pub routes: BTreeMap<Flow, Vec<Route>>,
    assertions: Assertions,
}

impl ConstraintSet {
    /// All variables in declaration order
    pub fn declarations(&self) -> &[Var] {
        self.vars.declarations()
    }

    /// All assertions in the order they were emitted
    pub fn assertions(&self) -> &[Assertion] {
        self.assertions.as_slice()
    }

    /// Declare all variables and add all assertions to the solver.
    pub fn submit<S: Solver>(&self, solver: &mut S) -> Result<(), SolverError> {
        debug!(
            "Submitting {} variables and {} assertions",
            self.declarations().len(),
            self.assertions().len()
        );
        for var in self.declarations() {
            solver.declare(var)?;
        }
        for assertion in self.assertions() {
            solver.assert(assertion)?;
        }
        Ok(())
    }

    /// Render the whole problem as an SMT-LIB 2 script
    pub fn script(&self) -> String {
        script(self.declarations(), self.assertions())
    }

    /// Variables whose values make up a [`Solution`]: device placements, flow isolation patterns,
    /// operating systems, services and the three objectives.
    pub fn solution_vars(&self, scenario: &Scenario) -> Result<Vec<Var>, Error> {
        let mut result = Vec::new();
        for l in scenario.topology.link_ids() {
            for d in scenario.policy.devices.deployable() {
                result.push(self.vars.dev_in_link.get((l, d))?.clone());
            }
        }
        for f in all_flows(scenario.topology.num_hosts()) {
            result.push(self.vars.flow_iso_msr.get(f)?.clone());
        }
        for h in scenario.topology.hosts() {
            result.push(self.vars.h_os.get(h)?.clone());
            for s in scenario.policy.services() {
                result.push(self.vars.h_serv.get((h, s))?.clone());
            }
        }
        result.push(self.vars.resiliency.clone());
        result.push(self.vars.usability.clone());
        result.push(self.vars.cost.clone());
        Ok(result)
    }

    /// Clause that excludes the device placement and the flow isolation of `solution`:
    /// `¬(∧ lit(dev_in_link(l, d)) ∧ ∧ flow_iso_msr(i, j) = v(i, j))` over all links, all devices
    /// `d ≥ 1`, and all flows including the diagonal. Operating systems and services are not
    /// part of the clause.
    pub fn blocking_clause(&self, solution: &Solution) -> Result<Term, Error> {
        let mut lits = Vec::new();
        let mut links: Vec<_> = self.vars.dev_in_link.keys().collect();
        links.sort();
        for (l, d) in links {
            if d == DeviceId::NONE {
                continue;
            }
            let var = self.vars.dev_in_link.term((l, d))?;
            if solution.devices.contains(&(l, d)) {
                lits.push(var);
            } else {
                lits.push(var.not());
            }
        }
        for (flow, dev) in solution.isolation.iter() {
            lits.push(self.vars.flow_iso_msr.term(*flow)?.eq(Term::int(dev.0 as i64)));
        }
        Ok(Term::and(lits).not())
    }
}

/// Build the constraint set of a scenario.
pub fn build(scenario: &Scenario, config: &SynthConfig) -> Result<ConstraintSet, Error> {
    config.validate()?;
    let targets = Targets::compute(scenario, config)?;
    info!(
        "Targets: resiliency >= {}, usability >= {}, cost <= {}",
        targets.c_res, targets.c_usa, targets.c_cost
    );

    let mut vars = SynthVars::new(scenario, config);
    let mut out = Assertions::new();

    isolation::emit(scenario, config, &vars, &mut out)?;
    diversity::emit(scenario, &vars, &mut out)?;
    resiliency::emit(scenario, config, &targets, &vars, &mut out)?;
    let routes = routes::emit(scenario, config, &mut vars, &mut out)?;
    cost::emit(scenario, &vars, &mut out)?;
    targets::emit(&targets, &vars, &mut out);

    info!(
        "Built the model with {} variables and {} assertions",
        vars.declarations().len(),
        out.len()
    );

    Ok(ConstraintSet { vars, targets, routes, assertions: out })
}
