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

//! # Example Networks
//!
//! Topologies and complete scenarios for testing and evaluation. The fixed topologies
//! ([`LineNet`], [`MeshNet`]) are deterministic, while the generated ones ([`TreeNet`],
//! [`StarNet`], [`StarLevelNet`]) draw their links from a random number generator. Use
//! [`generate`] to obtain a complete scenario with random reachability requirements, ranks and
//! service requirements, or [`plain_scenario`] for a scenario without any requirement.
//!
//! ```rust
//! use configsynth::example_networks::{generate, TreeNet};
//! use rand::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let scenario = generate::<TreeNet, _>(10, 4, &mut rng).unwrap();
//! assert_eq!(scenario.topology.num_links(), 14);
//! ```

use crate::policy::{
    DeviceTable, DeviceType, DiversityTable, FlowPolicy, OperatingSystem, OsTable, PolicyTables,
    ServiceRequirements, Sliders,
};
use crate::scenario::Scenario;
use crate::topology::{Topology, TopologyError};
use crate::types::{FamilyId, Flow, NodeId, ServiceId};
use crate::Error;

use rand::prelude::*;

mod fixed;
pub use fixed::{LineNet, MeshNet};

mod star;
pub use star::{StarLevelNet, StarNet};

mod tree;
pub use tree::TreeNet;

/// Percentage of the hosts a host is at most required to reach
const MAX_REACH_REQUIREMENTS: usize = 20;
/// Number of services a host may be required to run
const NUM_SERVICES: usize = 4;
/// Resiliency and usability slider of generated scenarios
const SLIDER: f64 = 5.0;
/// Cost factor of generated scenarios
const COST: i64 = 28;
/// Most expensive device of the default policy
const MAX_DEV_COST: i64 = 20;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Build the topology with the given number of hosts and routers.
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        rng: &mut R,
    ) -> Result<Topology, TopologyError>;
}

/// Default policy tables: three devices (firewall, encryption, IDS), four operating systems in
/// two families, and four services.
pub fn default_policy() -> PolicyTables {
    let dev = |isolation, usability, cost| DeviceType { isolation, usability, cost };
    let os = |family, usability, cost| OperatingSystem {
        family: FamilyId(family),
        usability,
        cost,
    };
    PolicyTables {
        devices: DeviceTable::new(
            10,
            vec![dev(10.0, 0.0, 20.0), dev(6.0, 8.0, 15.0), dev(4.0, 6.0, 10.0)],
        ),
        max_isolation: 10,
        max_iso_usability: 10,
        os: OsTable::new(
            vec![os(1, 8.0, 5.0), os(1, 7.0, 3.0), os(2, 9.0, 4.0), os(2, 6.0, 2.0)],
            2,
        ),
        max_diversity: 10,
        diversity: DiversityTable([10.0, 8.0, 6.0, 4.0, 2.0, 0.0]),
        max_div_usability: 10,
        num_services: NUM_SERVICES,
    }
}

/// Scenario on the topology of `N` without any reachability or service requirement, and with
/// sliders that every configuration satisfies.
pub fn plain_scenario<N: ExampleNetwork>(
    n_hosts: usize,
    n_routers: usize,
    policy: PolicyTables,
) -> Result<Scenario, Error> {
    let mut rng = StdRng::seed_from_u64(0);
    let flows = FlowPolicy::new(n_hosts, policy.max_iso_usability);
    Ok(Scenario {
        policy,
        topology: N::topology(n_hosts, n_routers, &mut rng)?,
        flows,
        services: ServiceRequirements::new(),
        sliders: Sliders { resiliency: 0.0, usability: 0.0, cost: i32::MAX as i64 },
    })
}

/// [`plain_scenario`] on a [`LineNet`] with as many routers as hosts.
pub fn line_scenario(n_hosts: usize, policy: PolicyTables) -> Result<Scenario, Error> {
    plain_scenario::<LineNet>(n_hosts, n_hosts, policy)
}

/// [`plain_scenario`] on a [`MeshNet`].
pub fn mesh_scenario(
    n_hosts: usize,
    n_routers: usize,
    policy: PolicyTables,
) -> Result<Scenario, Error> {
    plain_scenario::<MeshNet>(n_hosts, n_routers, policy)
}

/// Generate a complete scenario on the topology of `N`, using the [`default_policy`]. Every host
/// must reach up to 20% of the other hosts, some flows get a higher rank, every host must run
/// one or two services, and the cost budget grows with the size of the network.
pub fn generate<N: ExampleNetwork, R: Rng>(
    n_hosts: usize,
    n_routers: usize,
    rng: &mut R,
) -> Result<Scenario, Error> {
    let policy = default_policy();
    let topology = N::topology(n_hosts, n_routers, rng)?;
    let flows = random_flows(n_hosts, policy.max_iso_usability, rng);
    let services = random_services(n_hosts, rng);
    let cost = 100 * COST * (n_routers + n_hosts / n_routers.max(1)) as i64 * MAX_DEV_COST;
    Ok(Scenario {
        policy,
        topology,
        flows,
        services,
        sliders: Sliders { resiliency: SLIDER, usability: SLIDER, cost },
    })
}

/// Random reachability requirements and ranks.
fn random_flows<R: Rng>(n_hosts: usize, required_rank: i64, rng: &mut R) -> FlowPolicy {
    let mut flows = FlowPolicy::new(n_hosts, required_rank);
    for i in 1..=n_hosts {
        let n_reach = rng.gen_range(1, n_hosts + 1) * MAX_REACH_REQUIREMENTS / 100;
        for _ in 0..n_reach {
            let k = loop {
                let k = rng.gen_range(1, n_hosts + 1);
                if k != i {
                    break k;
                }
            };
            flows.require(Flow::new(i, k));
        }
    }

    // high ranks are only given to flows among the hosts 1..n_hosts-1
    let n_ranks = match n_hosts {
        0..=2 => 0,
        3..=7 => 5,
        _ => rng.gen_range(5, n_hosts - 2),
    };
    let mut written = 0;
    while written < n_ranks {
        let src = rng.gen_range(1, n_hosts);
        let dst = rng.gen_range(1, n_hosts);
        if src != dst {
            flows.set_rank(Flow::new(src, dst), 2);
            written += 1;
        }
    }
    flows
}

/// One or two distinct random services for every host.
fn random_services<R: Rng>(n_hosts: usize, rng: &mut R) -> ServiceRequirements {
    let mut services = ServiceRequirements::new();
    for h in 1..=n_hosts {
        let n = rng.gen_range(1, 3);
        let mut chosen = Vec::with_capacity(n);
        while chosen.len() < n {
            let s = rng.gen_range(1, NUM_SERVICES + 1);
            if !chosen.contains(&s) {
                chosen.push(s);
                services.require(NodeId(h), ServiceId(s));
            }
        }
    }
    services
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::host_pairs;

    #[test]
    fn generated_requirements() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = generate::<TreeNet, _>(12, 4, &mut rng).unwrap();
        for h in s.topology.hosts() {
            let dsts = s.flows.required_destinations(h);
            assert!(dsts.len() <= 12 * MAX_REACH_REQUIREMENTS / 100);
            assert!(!dsts.contains(&h));
            let serv = s.services.services(h);
            assert!(!serv.is_empty() && serv.len() <= 2);
            assert!(serv.iter().all(|s| s.0 >= 1 && s.0 <= NUM_SERVICES));
        }
        for (f, r) in s.flows.explicit_ranks() {
            assert_eq!(r, 2);
            assert!(f.src.0 < 12 && f.dst.0 < 12);
        }
        assert!(s.flows.explicit_ranks().count() >= 1);
        assert_eq!(s.sliders.cost, 100 * 28 * (4 + 3) * 20);
        assert!(host_pairs(12).all(|f| s.flows.rank(f) >= 1));
        // required flows without an explicit rank get the maximum isolation usability
        let explicit: Vec<_> = s.flows.explicit_ranks().map(|(f, _)| f).collect();
        for f in s.flows.required_flows().filter(|f| !explicit.contains(f)) {
            assert_eq!(s.flows.rank(f), s.policy.max_iso_usability);
        }
    }

    #[test]
    fn generation_is_reproducible() {
        let a = generate::<StarNet, _>(8, 4, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate::<StarNet, _>(8, 4, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.to_input_string(), b.to_input_string());
    }

    #[test]
    fn two_hosts_get_no_ranks() {
        let s = generate::<TreeNet, _>(2, 2, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(s.flows.explicit_ranks().count(), 0);
    }
}
