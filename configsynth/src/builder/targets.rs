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

//! # Targets
//!
//! Weights of the objectives, their largest possible values, and the thresholds derived from the
//! slider positions. All weights are computed with integer floor semantics.

use super::{Assertions, SynthVars};
use crate::config::{ConfigError, SynthConfig};
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::types::host_pairs;
use crate::Error;

/// Weights and thresholds of one synthesis problem
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    /// Weight of the isolation in the resiliency of a flow, scaled to the diversity range
    pub isolation_weight: i64,
    /// Weight of the diversity in the resiliency of a flow
    pub diversity_weight: i64,
    /// Weight of the isolation usability, scaled by the average flow usability
    pub iso_usability_weight: i64,
    /// Weight of the OS usability
    pub div_usability_weight: i64,
    /// Resiliency of a single flow that is denied (`MAX_RES`)
    pub max_flow_res: i64,
    /// Largest total resiliency
    pub max_res: i64,
    /// Largest total usability
    pub max_usa: i64,
    /// Largest total cost: every device on every link, and the most expensive OS on every host
    pub max_cost: f64,
    /// Resiliency threshold
    pub c_res: i64,
    /// Usability threshold
    pub c_usa: i64,
    /// Cost budget
    pub c_cost: i64,
}

impl Targets {
    /// Compute the targets of the scenario.
    pub fn compute(scenario: &Scenario, config: &SynthConfig) -> Result<Self, Error> {
        let p = &scenario.policy;
        if p.max_isolation == 0 {
            return Err(ConfigError::ZeroMaxIsolation.into());
        }
        let n = scenario.topology.num_hosts() as i64;
        let pairs = n * (n - 1);
        let scale = config.max_slider as f64;

        let isolation_weight =
            (config.isolation_weight() * p.max_diversity).div_euclid(p.max_isolation);
        let diversity_weight = config.diversity_weight();
        let max_flow_res = p.max_isolation * isolation_weight + p.max_diversity * diversity_weight;
        let max_res: i64 =
            config.transitivity_weights.iter().map(|w| pairs * max_flow_res * w).sum();
        let c_res = (scenario.sliders.resiliency * max_res as f64 / scale).floor() as i64;

        let max_iso_usa: i64 = host_pairs(n as usize)
            .map(|f| p.max_iso_usability * scenario.flows.rank(f))
            .sum();
        let avg_iso_usa = max_iso_usa as f64 / pairs as f64;
        if avg_iso_usa == 0.0 {
            return Err(ConfigError::DegenerateUsability.into());
        }
        let iso_usability_weight = ((config.iso_usability_weight() * p.max_div_usability) as f64
            / avg_iso_usa)
            .floor() as i64;
        let div_usability_weight = config.div_usability_weight();
        let max_usa = pairs
            * (p.max_iso_usability * iso_usability_weight
                + p.max_div_usability * div_usability_weight);
        let c_usa = (scenario.sliders.usability * max_usa as f64 / scale).floor() as i64;

        let max_cost = scenario.topology.num_links() as f64 * p.devices.total_cost()
            + n as f64 * p.os.max_cost();

        Ok(Self {
            isolation_weight,
            diversity_weight,
            iso_usability_weight,
            div_usability_weight,
            max_flow_res,
            max_res,
            max_usa,
            max_cost,
            c_res,
            c_usa,
            c_cost: scenario.sliders.cost,
        })
    }

    /// Resiliency relative to its largest value
    pub fn normalized_resiliency(&self, resiliency: f64) -> f64 {
        normalize(resiliency, self.max_res as f64)
    }

    /// Usability relative to its largest value
    pub fn normalized_usability(&self, usability: f64) -> f64 {
        normalize(usability, self.max_usa as f64)
    }

    /// Cost relative to its largest value
    pub fn normalized_cost(&self, cost: f64) -> f64 {
        normalize(cost, self.max_cost)
    }
}

fn normalize(x: f64, max: f64) -> f64 {
    if max == 0.0 {
        0.0
    } else {
        x / max
    }
}

pub(super) fn emit(targets: &Targets, vars: &SynthVars, out: &mut Assertions) {
    out.add("target_res", vars.resiliency.term().ge(Term::real(targets.c_res as f64)));
    out.add("target_usa", vars.usability.term().ge(Term::real(targets.c_usa as f64)));
    out.add("target_cost", vars.cost.term().le(Term::real(targets.c_cost as f64)));
}
