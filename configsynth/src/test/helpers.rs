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

#![cfg(test)]
//! Shared test utilities: a scripted solver, and a propagation procedure that completes a partial
//! assignment of the decision variables into a full model of a constraint set.

use crate::builder::ConstraintSet;
use crate::scenario::Scenario;
use crate::smt::{Assertion, Model, SatResult, Solver, SolverError, Term, Value, Var};
use crate::types::{all_flows, DeviceId, Flow, LinkId, NodeId};

use std::collections::VecDeque;

/// Solver which replays a fixed sequence of check results, and answers every model query from
/// the same model.
pub struct MockSolver {
    pub checks: VecDeque<Result<SatResult, SolverError>>,
    pub model: Model,
    pub core: Vec<String>,
    pub declared: Vec<Var>,
    pub asserted: Vec<Assertion>,
    pub fail_assert_on: Option<String>,
}

impl MockSolver {
    pub fn new(checks: Vec<Result<SatResult, SolverError>>, model: Model) -> Self {
        Self {
            checks: checks.into_iter().collect(),
            model,
            core: Vec::new(),
            declared: Vec::new(),
            asserted: Vec::new(),
            fail_assert_on: None,
        }
    }
}

impl Solver for MockSolver {
    fn declare(&mut self, var: &Var) -> Result<(), SolverError> {
        self.declared.push(var.clone());
        Ok(())
    }

    fn assert(&mut self, assertion: &Assertion) -> Result<(), SolverError> {
        if let Some(prefix) = self.fail_assert_on.as_ref() {
            if assertion.name.starts_with(prefix.as_str()) {
                return Err(SolverError::Closed);
            }
        }
        self.asserted.push(assertion.clone());
        Ok(())
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        self.checks.pop_front().unwrap_or(Err(SolverError::Closed))
    }

    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError> {
        let mut m = Model::new();
        for v in vars {
            let value = self
                .model
                .evaluate(v)
                .map_err(|_| SolverError::MissingValue(v.name().to_string()))?;
            m.set(v, value);
        }
        Ok(m)
    }

    fn unsat_core(&mut self) -> Result<Vec<String>, SolverError> {
        Ok(self.core.clone())
    }
}

/// Collect the assignments implied by `term`: equalities between an unassigned variable and an
/// evaluable term, below conjunctions, implications with a true premise, and if-then-else.
fn implied(term: &Term, model: &Model, out: &mut Vec<(Var, Value)>) {
    match term {
        Term::Eq(a, b) => {
            for (var, expr) in [(&**a, &**b), (&**b, &**a)].iter() {
                if let Term::Var(v) = var {
                    if model.evaluate(v).is_err() {
                        if let Ok(x) = expr.eval(model) {
                            out.push((v.clone(), x));
                            return;
                        }
                    }
                }
            }
        }
        Term::And(ts) => ts.iter().for_each(|t| implied(t, model, out)),
        Term::Implies(c, t) => {
            if let Ok(true) = c.holds(model) {
                implied(t, model, out)
            }
        }
        Term::Ite(c, a, b) => match c.holds(model) {
            Ok(true) => implied(a, model, out),
            Ok(false) => implied(b, model, out),
            Err(_) => {}
        },
        _ => {}
    }
}

/// Extend `model` with every value implied by the assertions of the constraint set.
pub fn complete(constraints: &ConstraintSet, mut model: Model) -> Model {
    loop {
        let mut new = Vec::new();
        for a in constraints.assertions() {
            implied(&a.term, &model, &mut new);
        }
        if new.is_empty() {
            return model;
        }
        for (var, value) in new {
            model.set(&var, value);
        }
    }
}

/// Names of all assertions which do not hold in the model, or cannot be evaluated.
pub fn violated(constraints: &ConstraintSet, model: &Model) -> Vec<String> {
    constraints
        .assertions()
        .iter()
        .filter(|a| !matches!(a.term.holds(model), Ok(true)))
        .map(|a| a.name.clone())
        .collect()
}

/// Assignment of the decision variables.
pub struct Decisions<'a> {
    pub scenario: &'a Scenario,
    pub constraints: &'a ConstraintSet,
    pub model: Model,
}

impl<'a> Decisions<'a> {
    /// No device on any link, every flow reachable without isolation, all hosts on OS 1 and no
    /// service running.
    pub fn open(scenario: &'a Scenario, constraints: &'a ConstraintSet) -> Self {
        let mut d = Self { scenario, constraints, model: Model::new() };
        for l in scenario.topology.link_ids() {
            d.place(l, DeviceId::NONE);
        }
        for f in all_flows(scenario.topology.num_hosts()) {
            d.flow(f, true, DeviceId::NONE);
        }
        for h in scenario.topology.hosts() {
            d.host(h, 1, &[]);
        }
        d
    }

    /// Deploy exactly the device `dev` on the link.
    pub fn place(&mut self, link: LinkId, dev: DeviceId) -> &mut Self {
        self.place_all(link, &[dev])
    }

    /// Deploy exactly the devices `devs` on the link.
    pub fn place_all(&mut self, link: LinkId, devs: &[DeviceId]) -> &mut Self {
        let vars = &self.constraints.vars;
        for d in self.scenario.policy.devices.ids() {
            let var = vars.dev_in_link.get((link, d)).unwrap();
            self.model.set(var, Value::Bool(devs.contains(&d)));
        }
        self
    }

    /// Set reachability and isolation of a flow.
    pub fn flow(&mut self, f: Flow, reachable: bool, iso: DeviceId) -> &mut Self {
        let vars = &self.constraints.vars;
        self.model.set(vars.reachable.get(f).unwrap(), Value::Bool(reachable));
        self.model.set(vars.flow_iso_msr.get(f).unwrap(), Value::Int(iso.0 as i64));
        self
    }

    /// Set the OS and the running services of a host.
    pub fn host(&mut self, h: NodeId, os: usize, services: &[usize]) -> &mut Self {
        let vars = &self.constraints.vars;
        self.model.set(vars.h_os.get(h).unwrap(), Value::Int(os as i64));
        for s in self.scenario.policy.services() {
            self.model.set(vars.h_serv.get((h, s)).unwrap(), Value::Bool(services.contains(&s.0)));
        }
        self
    }

    /// Complete the model by propagation. Routes of flows without isolation get no device.
    pub fn complete(&self) -> Model {
        let vars = &self.constraints.vars;
        let mut model = self.model.clone();
        for f in all_flows(self.scenario.topology.num_hosts()) {
            let msr = model.evaluate(vars.flow_iso_msr.get(f).unwrap()).unwrap();
            if msr == Value::Int(0) {
                model.set(vars.dev_in_all_flow_routes.get(f).unwrap(), Value::Int(0));
            }
        }
        complete(self.constraints, model)
    }
}

/// Read a real variable from a model
pub fn real(model: &Model, var: &Var) -> f64 {
    model.evaluate(var).unwrap().as_real().unwrap()
}
