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

//! Statistics record of a single synthesis run, exported as one CSV row.

use configsynth::builder::ConstraintSet;
use configsynth::enumerate::{Outcome, Termination};
use configsynth::scenario::Scenario;

use csv::WriterBuilder;
use serde::Serialize;

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Result of a run
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Start of the run, in seconds since the UNIX epoch
    pub timestamp: u64,
    /// Input files, separated by `+`
    pub input: String,
    /// Number of security devices
    pub num_devices: usize,
    /// Number of hosts
    pub num_hosts: usize,
    /// Number of routers
    pub num_routers: usize,
    /// Number of links
    pub num_links: usize,
    /// Resiliency slider
    pub slider_resiliency: f64,
    /// Usability slider
    pub slider_usability: f64,
    /// Cost budget
    pub slider_cost: i64,
    /// Number of declared variables
    pub num_vars: usize,
    /// Number of assertions, without blocking clauses
    pub num_assertions: usize,
    /// Whether at least one solution was found
    pub satisfiable: bool,
    /// Number of solutions found
    pub num_solutions: usize,
    /// `limit`, `exhausted` or `error`
    pub termination: &'static str,
    /// Time for building the constraints, in milliseconds
    pub build_ms: u64,
    /// Time spent in the enumeration, in milliseconds
    pub duration_ms: u64,
    /// Normalized resiliency of the first solution
    pub resiliency: Option<f64>,
    /// Normalized usability of the first solution
    pub usability: Option<f64>,
    /// Normalized cost of the first solution
    pub cost: Option<f64>,
}

impl Stats {
    pub fn new(
        input: &[String],
        scenario: &Scenario,
        constraints: &ConstraintSet,
        outcome: &Outcome,
        build_time: Duration,
        solve_time: Duration,
    ) -> Self {
        let first = outcome.solutions.first();
        let timestamp = SystemTime::now()
            .checked_sub(build_time + solve_time)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            timestamp,
            input: input.join("+"),
            num_devices: scenario.policy.num_devices(),
            num_hosts: scenario.topology.num_hosts(),
            num_routers: scenario.topology.num_routers(),
            num_links: scenario.topology.num_links(),
            slider_resiliency: scenario.sliders.resiliency,
            slider_usability: scenario.sliders.usability,
            slider_cost: scenario.sliders.cost,
            num_vars: constraints.declarations().len(),
            num_assertions: constraints.assertions().len(),
            satisfiable: outcome.is_sat(),
            num_solutions: outcome.solutions.len(),
            termination: match outcome.termination {
                Termination::LimitReached => "limit",
                Termination::Exhausted { .. } => "exhausted",
                Termination::Error(_) => "error",
            },
            build_ms: build_time.as_millis() as u64,
            duration_ms: solve_time.as_millis() as u64,
            resiliency: first.map(|s| s.norm_resiliency),
            usability: first.map(|s| s.norm_usability),
            cost: first.map(|s| s.norm_cost),
        }
    }

    /// Append the record to a CSV file. The header is written only if the file is new or empty.
    pub fn append_to(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        let new_file = path.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut wtr = WriterBuilder::new().has_headers(new_file).from_writer(file);
        wtr.serialize(self)?;
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use configsynth::builder::build;
    use configsynth::config::SynthConfig;
    use configsynth::example_networks::{default_policy, line_scenario};

    #[test]
    fn header_is_written_once() {
        let scenario = line_scenario(3, default_policy()).unwrap();
        let constraints = build(&scenario, &SynthConfig::default()).unwrap();
        let outcome = Outcome {
            solutions: Vec::new(),
            termination: Termination::Exhausted { unsat_core: Vec::new() },
            blocking: Vec::new(),
        };
        let input = vec!["policy.txt".to_string(), "topology.txt".to_string()];
        let stats = Stats::new(
            &input,
            &scenario,
            &constraints,
            &outcome,
            Duration::from_millis(20),
            Duration::from_millis(1500),
        );
        assert!(!stats.satisfiable);
        assert_eq!(stats.duration_ms, 1500);
        assert_eq!(stats.num_devices, 3);

        let name = format!("configsynth_stats_{}.csv", std::process::id());
        let path = std::env::temp_dir().join(name);
        let _ = std::fs::remove_file(&path);
        stats.append_to(&path).unwrap();
        stats.append_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,input,num_devices,num_hosts"));
        assert!(lines[1].contains(",policy.txt+topology.txt,3,3,3,5,"));
        assert!(lines[1].contains(",false,0,exhausted,20,1500,,,"));
        assert_eq!(lines[1], lines[2]);
    }
}
