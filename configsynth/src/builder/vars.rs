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

//! # Symbolic Variables
//!
//! Typed maps from domain identifiers to the symbolic variables of the model. All variables are
//! created when the [`SynthVars`] are constructed, except the per-route variables, which are only
//! known once the routes of a flow are enumerated.

use crate::config::SynthConfig;
use crate::scenario::Scenario;
use crate::smt::{Sort, Term, Var};
use crate::types::{all_flows, DeviceId, Flow, LinkId, NodeId, ServiceId};
use crate::Error;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Map from a domain key to its variable
#[derive(Debug, Clone)]
pub struct VarTable<K: Eq + Hash> {
    kind: &'static str,
    vars: HashMap<K, Var>,
}

impl<K: Eq + Hash + Copy + Debug> VarTable<K> {
    fn new(kind: &'static str) -> Self {
        Self { kind, vars: HashMap::new() }
    }

    fn insert(&mut self, key: K, var: Var) {
        self.vars.insert(key, var);
    }

    /// Get the variable of `key`
    pub fn get(&self, key: K) -> Result<&Var, Error> {
        self.vars
            .get(&key)
            .ok_or_else(|| Error::MissingVariable(format!("{} {:?}", self.kind, key)))
    }

    /// Get a term referring to the variable of `key`
    pub fn term(&self, key: K) -> Result<Term, Error> {
        self.get(key).map(Var::term)
    }

    /// Iterate over all keys, in arbitrary order
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.vars.keys().copied()
    }

    /// Number of variables in the table
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if the table is empty
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Collects the declaration order of all variables
#[derive(Debug, Clone, Default)]
struct Declarations(Vec<Var>);

impl Declarations {
    fn var(&mut self, name: String, sort: Sort) -> Var {
        let v = Var::new(name, sort);
        self.0.push(v.clone());
        v
    }
}

/// # Synthesis Variables
///
/// All symbolic variables of one synthesis problem. Flow variables exist for every ordered host
/// pair including the diagonal, and resiliency variables for every transitivity level
/// `0..=transitivity_level`.
#[derive(Debug, Clone)]
pub struct SynthVars {
    /// `Reachable(i, j)`: traffic from `i` to `j` is allowed (Bool)
    pub reachable: VarTable<Flow>,
    /// `FlowIsoMsr(i, j)`: isolation pattern applied to the flow (Int)
    pub flow_iso_msr: VarTable<Flow>,
    /// Isolation score of the flow (Real)
    pub flow_iso: VarTable<Flow>,
    /// Isolation usability of the flow, weighted by its rank (Real)
    pub flow_iso_usa: VarTable<Flow>,
    /// Diversity score of the flow (Real)
    pub flow_div: VarTable<Flow>,
    /// Resiliency of the flow at a transitivity level (Real)
    pub flow_res: VarTable<(Flow, usize)>,
    /// Resiliency of the flow over all transitivity levels (Real)
    pub flow_res_ult: VarTable<Flow>,
    /// Device type deployed on all routes of the flow (Int)
    pub dev_in_all_flow_routes: VarTable<Flow>,
    /// Device type deployed on one route of the flow, keyed by the 1-based route index (Int)
    pub dev_in_flow_route: VarTable<(Flow, usize)>,
    /// Isolation usability of a host (Real)
    pub h_iso_usa: VarTable<NodeId>,
    /// Diversity (OS) usability of a host (Real)
    pub h_div_usa: VarTable<NodeId>,
    /// Resiliency of a host (Real)
    pub h_res: VarTable<NodeId>,
    /// Usability of a host (Real)
    pub h_res_usa: VarTable<NodeId>,
    /// Operating system of a host (Int)
    pub h_os: VarTable<NodeId>,
    /// Family code of the operating system of a host (Int)
    pub h_os_family: VarTable<NodeId>,
    /// Installation cost of the operating system of a host (Real)
    pub h_os_cost: VarTable<NodeId>,
    /// Service running on a host (Bool)
    pub h_serv: VarTable<(NodeId, ServiceId)>,
    /// Device type deployed on a link, including device `0` (Bool)
    pub dev_in_link: VarTable<(LinkId, DeviceId)>,
    /// Cost of a device type on a link, for devices `1..=n_dev` (Real)
    pub link_dev_cost: VarTable<(LinkId, DeviceId)>,
    /// Total resiliency (Real)
    pub resiliency: Var,
    /// Total usability (Real)
    pub usability: Var,
    /// Total cost (Real)
    pub cost: Var,
    declarations: Declarations,
}

impl SynthVars {
    /// Create all variables of the scenario
    pub fn new(scenario: &Scenario, config: &SynthConfig) -> Self {
        let n_hosts = scenario.topology.num_hosts();
        let mut d = Declarations::default();

        let mut reachable = VarTable::new("reachable");
        let mut flow_iso_msr = VarTable::new("flow_iso_msr");
        let mut flow_iso = VarTable::new("flow_iso");
        let mut flow_iso_usa = VarTable::new("flow_iso_usa");
        let mut flow_div = VarTable::new("flow_div");
        let mut flow_res = VarTable::new("flow_res");
        let mut flow_res_ult = VarTable::new("flow_res_ult");
        let mut dev_in_all_flow_routes = VarTable::new("dev_in_all_flow_routes");
        for f in all_flows(n_hosts) {
            let (i, j) = (f.src.0, f.dst.0);
            reachable.insert(f, d.var(format!("reachable_{}_{}", i, j), Sort::Bool));
            flow_iso_msr.insert(f, d.var(format!("flow_iso_msr_{}_{}", i, j), Sort::Int));
            flow_iso.insert(f, d.var(format!("flow_iso_{}_{}", i, j), Sort::Real));
            flow_iso_usa.insert(f, d.var(format!("flow_iso_usa_{}_{}", i, j), Sort::Real));
            flow_div.insert(f, d.var(format!("flow_div_{}_{}", i, j), Sort::Real));
            for l in 0..=config.transitivity_level {
                flow_res.insert((f, l), d.var(format!("flow_res_{}_{}_{}", i, j, l), Sort::Real));
            }
            flow_res_ult.insert(f, d.var(format!("flow_res_ult_{}_{}", i, j), Sort::Real));
            dev_in_all_flow_routes
                .insert(f, d.var(format!("dev_in_all_flow_routes_{}_{}", i, j), Sort::Int));
        }

        let mut h_iso_usa = VarTable::new("h_iso_usa");
        let mut h_div_usa = VarTable::new("h_div_usa");
        let mut h_res = VarTable::new("h_res");
        let mut h_res_usa = VarTable::new("h_res_usa");
        let mut h_os = VarTable::new("h_os");
        let mut h_os_family = VarTable::new("h_os_family");
        let mut h_os_cost = VarTable::new("h_os_cost");
        let mut h_serv = VarTable::new("h_serv");
        for h in scenario.topology.hosts() {
            let i = h.0;
            h_iso_usa.insert(h, d.var(format!("h_iso_usa_{}", i), Sort::Real));
            h_div_usa.insert(h, d.var(format!("h_div_usa_{}", i), Sort::Real));
            h_res.insert(h, d.var(format!("h_res_{}", i), Sort::Real));
            h_res_usa.insert(h, d.var(format!("h_res_usa_{}", i), Sort::Real));
            h_os.insert(h, d.var(format!("h_os_{}", i), Sort::Int));
            h_os_family.insert(h, d.var(format!("h_os_family_{}", i), Sort::Int));
            h_os_cost.insert(h, d.var(format!("h_os_cost_{}", i), Sort::Real));
            for s in scenario.policy.services() {
                h_serv.insert((h, s), d.var(format!("h_serv_{}_{}", i, s.0), Sort::Bool));
            }
        }

        let mut dev_in_link = VarTable::new("dev_in_link");
        let mut link_dev_cost = VarTable::new("link_dev_cost");
        for l in scenario.topology.link_ids() {
            for dev in scenario.policy.devices.ids() {
                dev_in_link.insert(
                    (l, dev),
                    d.var(format!("dev_in_link_{}_{}", l.0, dev.0), Sort::Bool),
                );
                if dev != DeviceId::NONE {
                    link_dev_cost.insert(
                        (l, dev),
                        d.var(format!("link_dev_cost_{}_{}", l.0, dev.0), Sort::Real),
                    );
                }
            }
        }

        let resiliency = d.var("resiliency".to_string(), Sort::Real);
        let usability = d.var("usability".to_string(), Sort::Real);
        let cost = d.var("cost".to_string(), Sort::Real);

        Self {
            reachable,
            flow_iso_msr,
            flow_iso,
            flow_iso_usa,
            flow_div,
            flow_res,
            flow_res_ult,
            dev_in_all_flow_routes,
            dev_in_flow_route: VarTable::new("dev_in_flow_route"),
            h_iso_usa,
            h_div_usa,
            h_res,
            h_res_usa,
            h_os,
            h_os_family,
            h_os_cost,
            h_serv,
            dev_in_link,
            link_dev_cost,
            resiliency,
            usability,
            cost,
            declarations: d,
        }
    }

    /// Create the variable for route `index` (1-based) of `flow`.
    pub fn declare_route(&mut self, flow: Flow, index: usize) -> Var {
        let var = self.declarations.var(
            format!("dev_in_flow_route_{}_{}_{}", flow.src.0, flow.dst.0, index),
            Sort::Int,
        );
        self.dev_in_flow_route.insert((flow, index), var.clone());
        var
    }

    /// All variables in the order of their creation
    pub fn declarations(&self) -> &[Var] {
        &self.declarations.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::example_networks::{default_policy, line_scenario};

    #[test]
    fn variables_are_complete() {
        let scenario = line_scenario(3, default_policy()).unwrap();
        let config = SynthConfig::default();
        let mut vars = SynthVars::new(&scenario, &config);
        let n_links = scenario.topology.num_links();
        let n_dev = scenario.policy.num_devices();
        assert_eq!(vars.reachable.len(), 9);
        assert_eq!(vars.flow_res.len(), 9 * 3);
        assert_eq!(vars.dev_in_link.len(), n_links * (n_dev + 1));
        assert_eq!(vars.link_dev_cost.len(), n_links * n_dev);
        assert_eq!(vars.h_serv.len(), 3 * scenario.policy.num_services);
        assert!(vars.dev_in_flow_route.is_empty());

        assert_eq!(vars.reachable.get(Flow::new(1, 2)).unwrap().name(), "reachable_1_2");
        assert_eq!(vars.flow_res.get((Flow::new(2, 3), 2)).unwrap().sort(), Sort::Real);
        assert!(matches!(vars.h_os.get(NodeId(4)), Err(Error::MissingVariable(_))));

        let before = vars.declarations().len();
        let v = vars.declare_route(Flow::new(1, 3), 1);
        assert_eq!(v.name(), "dev_in_flow_route_1_3_1");
        assert_eq!(vars.declarations().len(), before + 1);
        assert_eq!(vars.dev_in_flow_route.get((Flow::new(1, 3), 1)).unwrap(), &v);

        // names are unique
        let names: std::collections::HashSet<&str> =
            vars.declarations().iter().map(|v| v.name()).collect();
        assert_eq!(names.len(), vars.declarations().len());
    }
}
