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

//! # Scenario
//!
//! A complete problem instance: the policy tables, the physical topology, the flow and service
//! requirements, and the slider inputs. Scenarios are read with [`crate::input`], generated with
//! [`crate::example_networks`], and written back to the input format with
//! [`Scenario::to_input_string`].

use crate::policy::{FlowPolicy, PolicyTables, ServiceRequirements, Sliders};
use crate::topology::Topology;
use crate::types::FamilyId;

use std::fmt::{self, Write};

/// Complete problem instance
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Device, OS and diversity tables
    pub policy: PolicyTables,
    /// Physical network
    pub topology: Topology,
    /// Reachability requirements and flow ranks
    pub flows: FlowPolicy,
    /// Services required on each host
    pub services: ServiceRequirements,
    /// Requested objective levels
    pub sliders: Sliders,
}

impl Scenario {
    /// Serialize the scenario into the input format understood by [`crate::input::parse_input`].
    /// The policy part comes first, followed by the topology part.
    pub fn to_input_string(&self) -> String {
        let mut s = String::new();
        // writing into a string cannot fail
        let _ = self.write_input(&mut s);
        s
    }

    /// Write the complete input description to `w`.
    pub fn write_input(&self, w: &mut impl Write) -> fmt::Result {
        self.write_policy(w)?;
        writeln!(w)?;
        self.write_topology(w)
    }

    /// Serialize only the policy part (devices, operating systems, diversity and services).
    pub fn policy_string(&self) -> String {
        let mut s = String::new();
        let _ = self.write_policy(&mut s);
        s
    }

    /// Serialize only the topology part (hosts, routers, links, requirements and sliders).
    pub fn topology_string(&self) -> String {
        let mut s = String::new();
        let _ = self.write_topology(&mut s);
        s
    }

    fn write_policy(&self, s: &mut impl Write) -> fmt::Result {
        let p = &self.policy;
        let devices: Vec<_> = p.devices.iter().skip(1).map(|(_, d)| *d).collect();
        writeln!(s, "# Number of security devices\n{}\n", devices.len())?;
        writeln!(s, "# Maximum isolation\n{}", p.max_isolation)?;
        writeln!(s, "# Isolation scores\n{}\n", join(devices.iter().map(|d| d.isolation)))?;
        writeln!(s, "# Maximum isolation usability\n{}", p.max_iso_usability)?;
        writeln!(s, "# Isolation usability\n{}\n", join(devices.iter().map(|d| d.usability)))?;
        writeln!(s, "# Device cost\n{}\n", join(devices.iter().map(|d| d.cost)))?;

        writeln!(s, "# Number of operating systems\n{}\n", p.os.num_os())?;
        writeln!(s, "# Operating system families\n{}", p.os.num_families())?;
        for f in 1..=p.os.num_families() {
            let members = p.os.family_members(FamilyId(f));
            writeln!(s, "{}", join(members.iter().map(|o| o.0)))?;
        }
        writeln!(s)?;
        writeln!(s, "# Maximum diversity\n{}", p.max_diversity)?;
        writeln!(s, "# Diversity scores\n{}\n", join(p.diversity.0.iter()))?;
        writeln!(s, "# Maximum diversity usability\n{}", p.max_div_usability)?;
        writeln!(s, "# OS usability\n{}\n", join(p.os.iter().map(|(_, o)| o.usability)))?;
        writeln!(s, "# OS cost\n{}\n", join(p.os.iter().map(|(_, o)| o.cost)))?;
        writeln!(s, "# Number of services\n{}", p.num_services)
    }

    fn write_topology(&self, s: &mut impl Write) -> fmt::Result {
        let t = &self.topology;
        writeln!(s, "# Number of hosts\n{}\n", t.num_hosts())?;
        writeln!(s, "# Number of routers\n{}\n", t.num_routers())?;
        writeln!(s, "# Number of links\n{}", t.num_links())?;
        for (_, a, b) in t.links() {
            writeln!(s, "{} {}", a.0, b.0)?;
        }
        writeln!(s)?;

        writeln!(s, "# Reachability requirements")?;
        for h in t.hosts() {
            let dsts = self.flows.required_destinations(h);
            writeln!(s, "{}", join(dsts.iter().map(|d| d.0).chain(std::iter::once(0))))?;
        }
        writeln!(s)?;

        let ranks: Vec<_> = self.flows.explicit_ranks().collect();
        writeln!(s, "# Flow ranks\n{}", ranks.len())?;
        for (flow, rank) in ranks {
            writeln!(s, "{} {} {}", flow.src.0, flow.dst.0, rank)?;
        }
        writeln!(s)?;

        writeln!(s, "# Service requirements")?;
        for h in t.hosts() {
            let services = self.services.services(h);
            writeln!(s, "{}", join(services.iter().map(|x| x.0).chain(std::iter::once(0))))?;
        }
        writeln!(s)?;

        writeln!(
            s,
            "# Sliders (resiliency, usability, cost)\n{} {} {}",
            self.sliders.resiliency, self.sliders.usability, self.sliders.cost
        )
    }
}

fn join<T: ToString>(iter: impl Iterator<Item = T>) -> String {
    iter.map(|x| x.to_string()).collect::<Vec<_>>().join(" ")
}
