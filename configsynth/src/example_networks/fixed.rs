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

//! # Fixed Networks

use super::ExampleNetwork;
use crate::topology::{Topology, TopologyError};
use crate::types::NodeId;

use rand::Rng;

/// # Line
///
/// Routers connected in a chain. Host `i` is attached to router `((i - 1) mod n_routers) + 1`,
/// counting routers from 1. With three hosts and three routers:
///
/// ```text
/// 1   2   3
/// |   |   |
/// 4 - 5 - 6
/// ```
pub struct LineNet {}

impl ExampleNetwork for LineNet {
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        _rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        if n_routers == 0 {
            return Err(TopologyError::TooFewRouters { required: 1, found: 0 });
        }
        let mut t = Topology::new(n_hosts, n_routers)?;
        for h in 1..=n_hosts {
            t.add_link(NodeId(h), NodeId(n_hosts + 1 + (h - 1) % n_routers))?;
        }
        for r in n_hosts + 1..n_hosts + n_routers {
            t.add_link(NodeId(r), NodeId(r + 1))?;
        }
        Ok(t)
    }
}

/// # Mesh
///
/// All routers are connected to each other, and every host is connected to every router. The
/// number of routes between two hosts grows factorially with the number of routers.
pub struct MeshNet {}

impl ExampleNetwork for MeshNet {
    fn topology<R: Rng>(
        n_hosts: usize,
        n_routers: usize,
        _rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        let mut t = Topology::new(n_hosts, n_routers)?;
        let routers: Vec<NodeId> = t.routers().collect();
        for h in t.hosts().collect::<Vec<_>>() {
            for r in routers.iter() {
                t.add_link(h, *r)?;
            }
        }
        for (i, a) in routers.iter().enumerate() {
            for b in routers.iter().skip(i + 1) {
                t.add_link(*a, *b)?;
            }
        }
        Ok(t)
    }
}
