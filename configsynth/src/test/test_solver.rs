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
use super::helpers::*;
use crate::builder::build;
use crate::config::SynthConfig;
use crate::enumerate::{Outcome, SolutionEnumerator, Termination};
use crate::example_networks::{default_policy, line_scenario};
use crate::input::load_files;
use crate::policy::Sliders;
use crate::scenario::Scenario;
use crate::smt::{Model, SatResult, SmtLibSolver, Value, Var};
use crate::synthesize;
use crate::types::Flow;

use std::collections::HashSet;
use std::io::Cursor;

fn format_value(v: Value) -> String {
    match v {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) if i < 0 => format!("(- {})", -i),
        Value::Int(i) => i.to_string(),
        Value::Real(r) if r < 0.0 => format!("(- {:?})", -r),
        Value::Real(r) => format!("{:?}", r),
    }
}

fn get_value_response(model: &Model, vars: &[Var]) -> String {
    let pairs: Vec<String> = vars
        .iter()
        .map(|v| format!("({} {})", v.name(), format_value(model.evaluate(v).unwrap())))
        .collect();
    format!("({})\n", pairs.join("\n "))
}

#[test]
fn enumeration_over_smtlib_streams() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.flows.require(Flow::new(2, 3));
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let model = Decisions::open(&scenario, &c).complete();

    let mut responses = "success\n".repeat(4 + c.declarations().len() + c.assertions().len());
    responses.push_str("sat\n");
    responses.push_str(&get_value_response(&model, &c.solution_vars(&scenario).unwrap()));
    // blocking clause, then no further solution
    responses.push_str("success\nunsat\n(block@1)\n");

    let solver =
        SmtLibSolver::from_streams(Vec::new(), Cursor::new(responses.into_bytes()), 1000).unwrap();
    let mut e = SolutionEnumerator::new(&scenario, &c, solver, 2).unwrap();
    let from_streams = e.next_solution().unwrap().unwrap();
    assert!(e.next_solution().unwrap().is_none());
    match e.termination() {
        Some(Termination::Exhausted { unsat_core }) => assert_eq!(unsat_core, &["block@1"]),
        t => panic!("unexpected termination: {:?}", t),
    }
    let sent = String::from_utf8(e.into_solver().input().clone()).unwrap();
    assert!(sent.contains("(declare-const reachable_2_3 Bool)\n"));
    assert!(sent.contains(":named block@1))\n(check-sat)\n(get-unsat-core)\n"));

    // the same model through the scripted solver gives the same solution
    let mock = MockSolver::new(vec![Ok(SatResult::Sat)], model);
    let mut e = SolutionEnumerator::new(&scenario, &c, mock, 1).unwrap();
    assert_eq!(e.next_solution().unwrap().unwrap(), from_streams);
}

fn small_scenario() -> Scenario {
    let dir = format!("{}/test_files", env!("CARGO_MANIFEST_DIR"));
    let mut scenario = load_files(&[
        format!("{}/small_policy.txt", dir),
        format!("{}/small_topology.txt", dir),
    ])
    .unwrap();
    scenario.sliders = Sliders { resiliency: 3.0, usability: 3.0, cost: 1000 };
    scenario
}

fn check_outcome(scenario: &Scenario, config: &SynthConfig, outcome: &Outcome) {
    let targets = build(scenario, config).unwrap().targets;
    assert!(outcome.is_sat());
    let mut seen = HashSet::new();
    for sol in outcome.solutions.iter() {
        assert!(sol.resiliency >= targets.c_res as f64 - 1e-6);
        assert!(sol.usability >= targets.c_usa as f64 - 1e-6);
        assert!(sol.cost <= targets.c_cost as f64 + 1e-6);
        for f in scenario.flows.required_flows() {
            assert!(sol.isolation[&f].0 != 1, "required flow {} is denied", f);
        }
        for (h, services) in sol.services.iter() {
            for s in scenario.services.services(*h) {
                assert!(services.contains(&s));
            }
        }
        // blocking clauses keep the device placement and isolation distinct
        assert!(seen.insert((sol.devices.clone(), sol.isolation.clone())));
    }
}

#[test]
#[ignore = "requires z3 in the PATH"]
fn external_solver() {
    let scenario = small_scenario();
    let config = SynthConfig { max_solutions: 3, ..Default::default() };
    let solver = SmtLibSolver::spawn_default(config.timeout_ms).unwrap();
    let outcome = synthesize(&scenario, &config, solver).unwrap();
    check_outcome(&scenario, &config, &outcome);
}

#[cfg(feature = "z3")]
#[test]
fn in_process_solver() {
    use crate::smt::Z3Solver;
    let scenario = small_scenario();
    let config = SynthConfig { max_solutions: 3, ..Default::default() };
    let ctx = z3::Context::new(&z3::Config::new());
    let solver = Z3Solver::new(&ctx, config.timeout_ms);
    let outcome = synthesize(&scenario, &config, solver).unwrap();
    check_outcome(&scenario, &config, &outcome);
}
