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

//! # Helper (printer) functions
//! Module containing helper functions to get formatted strings of the solutions, the full report
//! of an enumeration, and the assertion trace.

use crate::builder::{ConstraintSet, Targets};
use crate::enumerate::{Outcome, Solution, Termination};
use crate::scenario::Scenario;

const SEPARATOR: &str = "***********************************";
const SOLUTION_SEPARATOR: &str = "..................................";

/// Get the lines describing one solution: deployed devices, allowed traffic, operating systems
/// and services, followed by the normalized objectives.
pub fn solution(sol: &Solution) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(String::from("# Deployed security devices"));
    for (l, d) in sol.devices.iter() {
        lines.push(format!("{} {}", l.0, d.0));
    }
    lines.push(sol.devices.len().to_string());
    lines.push(String::new());

    lines.push(String::from("# Allowed traffic"));
    for (f, d) in sol.allowed.iter() {
        lines.push(format!("{} {} {}", f.src.0, f.dst.0, d.0));
    }
    lines.push(sol.allowed.len().to_string());
    lines.push(String::new());

    lines.push(String::from("# Deployed operating systems"));
    for (h, os) in sol.os.iter() {
        lines.push(format!("{} {}", h.0, os.0));
    }
    lines.push(String::new());

    lines.push(String::from("# Deployed services"));
    for (h, services) in sol.services.iter() {
        let s: Vec<String> = services.iter().map(|s| s.0.to_string()).collect();
        lines.push(format!("{}: {}", h.0, s.join(" ")));
    }
    lines.push(String::new());

    lines.push(format!("Resiliency: {}", sol.norm_resiliency));
    lines.push(format!("Usability: {}", sol.norm_usability));
    lines.push(format!("Cost: {} ({})", sol.cost, sol.norm_cost));
    lines
}

/// Get the complete report of an enumeration, including the problem size, the thresholds, all
/// solutions, and the reason why the enumeration stopped.
pub fn report(scenario: &Scenario, targets: &Targets, outcome: &Outcome) -> String {
    let mut lines = vec![
        String::from(SEPARATOR),
        format!(
            "Problem with Hosts {} and Routers {}:",
            scenario.topology.num_hosts(),
            scenario.topology.num_routers()
        ),
        format!(
            "Resiliency, Usability, and Cost constraints are {}, {}, and {}",
            scenario.sliders.resiliency, scenario.sliders.usability, scenario.sliders.cost
        ),
        format!("Constraints: {} {} {}", targets.c_res, targets.c_usa, targets.c_cost),
    ];

    for (i, sol) in outcome.solutions.iter().enumerate() {
        if i > 0 {
            lines.push(String::from(SOLUTION_SEPARATOR));
            lines.push(String::from("Searching for another solution..."));
        }
        lines.push(format!("{}: We have a solution", sol.index));
        lines.extend(solution(sol));
    }

    match &outcome.termination {
        Termination::LimitReached => {}
        Termination::Exhausted { unsat_core } if outcome.solutions.is_empty() => {
            lines.push(format!("({})", unsat_core.join(" ")));
            lines.push(String::from("We have no solution"));
        }
        Termination::Exhausted { .. } => {
            lines.push(String::from(SOLUTION_SEPARATOR));
            lines.push(String::from("No further solution exists"));
        }
        Termination::Error(e) => {
            lines.push(format!("The solver failed: {}", e));
            if outcome.solutions.is_empty() {
                lines.push(String::from("We have no solution"));
            }
        }
    }
    lines.push(String::from(SEPARATOR));
    lines.push(String::new());
    lines.join("\n")
}

/// Print the report to stdout
pub fn print_report(scenario: &Scenario, targets: &Targets, outcome: &Outcome) {
    println!("{}", report(scenario, targets, outcome));
}

/// Get the assertion trace: the SMT-LIB script of the constraint set, followed by one block per
/// solution with its blocking clause.
pub fn trace(constraints: &ConstraintSet, outcome: &Outcome) -> String {
    let mut s = constraints.script();
    for sol in outcome.solutions.iter() {
        s.push_str(&format!("; solution {}\n", sol.index));
        for line in solution(sol) {
            if !line.is_empty() {
                s.push_str(&format!(";   {}\n", line));
            }
        }
        if let Some(block) = outcome.blocking.get(sol.index - 1) {
            s.push_str(&format!("{}\n(check-sat)\n", block));
        }
    }
    match &outcome.termination {
        Termination::LimitReached => {}
        Termination::Exhausted { unsat_core } => {
            s.push_str(&format!("; unsat core: ({})\n", unsat_core.join(" ")))
        }
        Termination::Error(e) => s.push_str(&format!("; solver failed: {}\n", e)),
    }
    s
}
