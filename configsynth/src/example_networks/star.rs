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

//! # Star Networks

use super::ExampleNetwork;
use crate::topology::{Topology, TopologyError};
use crate::types::NodeId;

use rand::Rng;

/// # Star
///
/// A random router forms the center, and all other routers are linked to it. The hosts are
/// distributed round-robin over the routers except the center, and one additional link connects
/// two random routers other than the center. The network has `n_hosts + n_routers` links and
/// requires at least three routers.
pub struct StarNet {}

impl ExampleNetwork for StarNet {
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        if n_routers < 3 {
            return Err(TopologyError::TooFewRouters { required: 3, found: n_routers });
        }
        let mut t = Topology::new(n_hosts, n_routers)?;
        let center = NodeId(n_hosts + rng.gen_range(1, n_routers + 1));
        let outer: Vec<NodeId> = t.routers().filter(|r| *r != center).collect();

        for r in outer.iter() {
            t.add_link(*r, center)?;
        }

        for (h, r) in t.hosts().zip(outer.iter().cycle()).collect::<Vec<_>>() {
            t.add_link(h, *r)?;
        }

        let (a, b) = loop {
            let a = NodeId(n_hosts + rng.gen_range(1, n_routers + 1));
            let b = NodeId(n_hosts + rng.gen_range(1, n_routers + 1));
            if a != b && a != center && b != center {
                break (a, b);
            }
        };
        t.add_link(a, b)?;

        Ok(t)
    }
}

/// Number of routers in the inner level of a [`StarLevelNet`]
const INNER_ROUTERS: usize = 4;

/// # Two-level Star
///
/// The first router forms the center, and the next four routers are linked to it. All remaining
/// routers are linked round-robin to those four inner routers, and the hosts are distributed
/// round-robin over the outer routers. The network has `n_hosts + n_routers - 1` links and
/// requires at least six routers.
pub struct StarLevelNet {}

impl ExampleNetwork for StarLevelNet {
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        _rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        if n_routers < INNER_ROUTERS + 2 {
            return Err(TopologyError::TooFewRouters {
                required: INNER_ROUTERS + 2,
                found: n_routers,
            });
        }
        let mut t = Topology::new(n_hosts, n_routers)?;
        let routers: Vec<NodeId> = t.routers().collect();
        let center = routers[0];
        let inner = &routers[1..=INNER_ROUTERS];
        let outer = &routers[INNER_ROUTERS + 1..];

        for r in inner.iter() {
            t.add_link(*r, center)?;
        }
        for (r, i) in outer.iter().zip(inner.iter().cycle()) {
            t.add_link(*r, *i)?;
        }
        for (h, r) in t.hosts().zip(outer.iter().cycle()).collect::<Vec<_>>() {
            t.add_link(h, *r)?;
        }

        Ok(t)
    }
}
