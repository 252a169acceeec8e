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

//! # Tree Network

use super::ExampleNetwork;
use crate::topology::{Topology, TopologyError};
use crate::types::NodeId;

use rand::Rng;

/// # Tree
///
/// Every host is attached to a random router, and every router is linked to a random router with
/// a higher id, which results in a tree over the routers. One additional link between two random
/// routers closes a cycle. The network has `n_hosts + n_routers` links and requires at least two
/// routers.
pub struct TreeNet {}

impl ExampleNetwork for TreeNet {
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        if n_routers < 2 {
            return Err(TopologyError::TooFewRouters { required: 2, found: n_routers });
        }
        let mut t = Topology::new(n_hosts, n_routers)?;
        let last = n_hosts + n_routers;

        for h in 1..=n_hosts {
            t.add_link(NodeId(h), NodeId(n_hosts + rng.gen_range(1, n_routers + 1)))?;
        }

        for r in n_hosts + 1..last {
            t.add_link(NodeId(r), NodeId(rng.gen_range(r + 1, last + 1)))?;
        }

        let a = n_hosts + rng.gen_range(1, n_routers + 1);
        let b = loop {
            let b = n_hosts + rng.gen_range(1, n_routers + 1);
            if b != a {
                break b;
            }
        };
        t.add_link(NodeId(a), NodeId(b))?;

        Ok(t)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn tree_is_connected() {
        for seed in 0..10 {
            let t = TreeNet::topology(10, 5, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(t.num_links(), 15);
            for h in t.hosts() {
                assert_eq!(t.router_neighbors(h).len(), 1);
            }
            // every pair of hosts is connected
            for f in t.host_pairs() {
                assert!(t.paths(f.src, f.dst, 20).next().is_some(), "{} is not connected", f);
            }
        }
        assert!(TreeNet::topology(4, 1, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
