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

//! # Solution Enumeration
//!
//! The [`SolutionEnumerator`] drives a [`Solver`] over a [`ConstraintSet`]. Every satisfying
//! assignment is turned into a [`Solution`], after which a blocking clause excludes its device
//! placement and flow isolation, and the solver is asked again. The enumeration stops when the
//! requested number of solutions is found, when no further solution exists, or when the solver
//! fails.

use crate::builder::ConstraintSet;
use crate::scenario::Scenario;
use crate::smt::{Assertion, Model, SatResult, Solver, SolverError};
use crate::types::{all_flows, DeviceId, Flow, LinkId, NodeId, OsId, ServiceId};
use crate::Error;

use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// State of the enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumState {
    /// Ready to search for the next solution
    Ready,
    /// The solver is running
    Solving,
    /// The requested number of solutions was found.
    Solved,
    /// No further solution exists.
    Exhausted,
    /// The solver failed or gave up.
    Error,
}

/// Reason why the enumeration stopped
#[derive(Debug)]
pub enum Termination {
    /// The requested number of solutions was found.
    LimitReached,
    /// No (further) solution exists. The unsat core names the assertions which contradict each
    /// other; it may be empty if the solver could not provide one.
    Exhausted {
        /// Names of the assertions in the unsat core
        unsat_core: Vec<String>,
    },
    /// The solver failed, timed out or returned unknown.
    Error(SolverError),
}

/// Result of an enumeration
#[derive(Debug)]
pub struct Outcome {
    /// All solutions, in the order they were found
    pub solutions: Vec<Solution>,
    /// Reason for stopping
    pub termination: Termination,
    /// Blocking clauses added after each solution, `block@k` excludes solution `k`.
    pub blocking: Vec<Assertion>,
}

impl Outcome {
    /// Returns true if at least one solution was found.
    pub fn is_sat(&self) -> bool {
        !self.solutions.is_empty()
    }
}

/// # Solution
///
/// One satisfying configuration, read from the model of the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Index of the solution, starting at 1
    pub index: usize,
    /// Deployed devices `(link, device)`, with `device ≥ 1`
    pub devices: BTreeSet<(LinkId, DeviceId)>,
    /// Isolation pattern of every flow, including the diagonal
    pub isolation: BTreeMap<Flow, DeviceId>,
    /// Off-diagonal flows whose isolation pattern has a non-zero usability, with their pattern
    pub allowed: Vec<(Flow, DeviceId)>,
    /// Operating system of every host
    pub os: BTreeMap<NodeId, OsId>,
    /// Services running on every host
    pub services: BTreeMap<NodeId, BTreeSet<ServiceId>>,
    /// Total resiliency
    pub resiliency: f64,
    /// Total usability
    pub usability: f64,
    /// Total cost
    pub cost: f64,
    /// Resiliency relative to the largest possible resiliency
    pub norm_resiliency: f64,
    /// Usability relative to the largest possible usability
    pub norm_usability: f64,
    /// Cost relative to the largest possible cost
    pub norm_cost: f64,
}

impl Solution {
    /// Read the solution from a model which contains a value for all
    /// [`ConstraintSet::solution_vars`].
    pub fn from_model(
        index: usize,
        scenario: &Scenario,
        constraints: &ConstraintSet,
        model: &Model,
    ) -> Result<Self, Error> {
        let vars = &constraints.vars;
        let targets = &constraints.targets;

        let mut devices = BTreeSet::new();
        for l in scenario.topology.link_ids() {
            for d in scenario.policy.devices.deployable() {
                if model.evaluate(vars.dev_in_link.get((l, d))?)?.as_bool()? {
                    devices.insert((l, d));
                }
            }
        }

        let mut isolation = BTreeMap::new();
        let mut allowed = Vec::new();
        for f in all_flows(scenario.topology.num_hosts()) {
            let msr = model.evaluate(vars.flow_iso_msr.get(f)?)?.as_int()?;
            let dev = DeviceId(msr.max(0) as usize);
            isolation.insert(f, dev);
            let usable =
                scenario.policy.devices.get(dev).map(|d| d.usability != 0.0).unwrap_or(false);
            if !f.is_self_flow() && usable {
                allowed.push((f, dev));
            }
        }

        let mut os = BTreeMap::new();
        let mut services = BTreeMap::new();
        for h in scenario.topology.hosts() {
            os.insert(h, OsId(model.evaluate(vars.h_os.get(h)?)?.as_int()?.max(0) as usize));
            let mut running = BTreeSet::new();
            for s in scenario.policy.services() {
                if model.evaluate(vars.h_serv.get((h, s))?)?.as_bool()? {
                    running.insert(s);
                }
            }
            services.insert(h, running);
        }

        let resiliency = model.evaluate(&vars.resiliency)?.as_real()?;
        let usability = model.evaluate(&vars.usability)?.as_real()?;
        let cost = model.evaluate(&vars.cost)?.as_real()?;

        Ok(Self {
            index,
            devices,
            isolation,
            allowed,
            os,
            services,
            resiliency,
            usability,
            cost,
            norm_resiliency: targets.normalized_resiliency(resiliency),
            norm_usability: targets.normalized_usability(usability),
            norm_cost: targets.normalized_cost(cost),
        })
    }
}

/// # Solution Enumerator
///
/// State machine `Ready → Solving → {Ready, Solved, Exhausted, Error}`. Use
/// [`SolutionEnumerator::next_solution`] to step through the solutions one by one, or
/// [`SolutionEnumerator::run`] to collect all of them.
pub struct SolutionEnumerator<'a, S: Solver> {
    scenario: &'a Scenario,
    constraints: &'a ConstraintSet,
    solver: S,
    state: EnumState,
    max_solutions: usize,
    found: usize,
    blocking: Vec<Assertion>,
    termination: Option<Termination>,
}

impl<'a, S: Solver> SolutionEnumerator<'a, S> {
    /// Submit the constraint set to the solver and prepare the enumeration.
    pub fn new(
        scenario: &'a Scenario,
        constraints: &'a ConstraintSet,
        mut solver: S,
        max_solutions: usize,
    ) -> Result<Self, Error> {
        constraints.submit(&mut solver)?;
        Ok(Self {
            scenario,
            constraints,
            solver,
            state: EnumState::Ready,
            max_solutions,
            found: 0,
            blocking: Vec::new(),
            termination: None,
        })
    }

    /// Current state
    pub fn state(&self) -> EnumState {
        self.state
    }

    /// Number of solutions found so far
    pub fn num_found(&self) -> usize {
        self.found
    }

    /// All blocking clauses added so far
    pub fn blocking_clauses(&self) -> &[Assertion] {
        &self.blocking
    }

    /// Search for the next solution. Returns `Ok(None)` once the enumeration has terminated; the
    /// reason is then available from [`SolutionEnumerator::termination`].
    pub fn next_solution(&mut self) -> Result<Option<Solution>, Error> {
        if self.state != EnumState::Ready {
            return Ok(None);
        }
        self.state = EnumState::Solving;
        debug!("Checking for solution {}", self.found + 1);

        match self.solver.check() {
            Ok(SatResult::Sat) => {}
            Ok(SatResult::Unsat) => {
                let unsat_core = match self.solver.unsat_core() {
                    Ok(core) => core,
                    Err(e) => {
                        warn!("Cannot get the unsat core: {}", e);
                        Vec::new()
                    }
                };
                if self.found == 0 {
                    info!("We have no solution");
                } else {
                    info!("No further solution exists");
                }
                self.finish(EnumState::Exhausted, Termination::Exhausted { unsat_core });
                return Ok(None);
            }
            Ok(SatResult::Unknown(reason)) => {
                error!("The solver returned unknown: {}", reason);
                self.finish(EnumState::Error, Termination::Error(SolverError::Unknown(reason)));
                return Ok(None);
            }
            Err(e) => {
                error!("Solver error: {}", e);
                self.finish(EnumState::Error, Termination::Error(e));
                return Ok(None);
            }
        }

        let solution = match self.extract() {
            Ok(solution) => solution,
            Err(e) => {
                self.state = EnumState::Error;
                return Err(e);
            }
        };
        self.found += 1;
        info!("{}: We have a solution", self.found);

        if self.found >= self.max_solutions {
            self.finish(EnumState::Solved, Termination::LimitReached);
        } else {
            let clause = match self.constraints.blocking_clause(&solution) {
                Ok(clause) => clause,
                Err(e) => {
                    self.state = EnumState::Error;
                    return Err(e);
                }
            };
            let assertion = Assertion::new(format!("block@{}", self.found), clause);
            if let Err(e) = self.solver.assert(&assertion) {
                error!("Cannot add the blocking clause: {}", e);
                self.blocking.push(assertion);
                self.finish(EnumState::Error, Termination::Error(e));
                return Ok(Some(solution));
            }
            self.blocking.push(assertion);
            info!("Searching for another solution...");
            self.state = EnumState::Ready;
        }
        Ok(Some(solution))
    }

    /// Reason for the termination, if the enumeration has terminated
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// Enumerate all remaining solutions.
    pub fn run(mut self) -> Result<Outcome, Error> {
        let mut solutions = Vec::new();
        while let Some(solution) = self.next_solution()? {
            solutions.push(solution);
        }
        let termination = self.termination.take().unwrap_or(Termination::LimitReached);
        Ok(Outcome { solutions, termination, blocking: self.blocking })
    }

    /// Give back the solver
    pub fn into_solver(self) -> S {
        self.solver
    }

    fn extract(&mut self) -> Result<Solution, Error> {
        let vars = self.constraints.solution_vars(self.scenario)?;
        let model = self.solver.model(&vars)?;
        Solution::from_model(self.found + 1, self.scenario, self.constraints, &model)
    }

    fn finish(&mut self, state: EnumState, termination: Termination) {
        self.state = state;
        self.termination = Some(termination);
    }
}
