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

//! # Topology
//!
//! Undirected graph of hosts and routers. Hosts have the ids `1..=n_hosts`, and routers the ids
//! `n_hosts+1..=n_hosts+n_routers`. Every link gets the next free link id, starting at `1`.
//!
//! ```rust
//! use configsynth::topology::Topology;
//! use configsynth::types::{LinkId, NodeId};
//!
//! // 1 -- 3 -- 2
//! let mut t = Topology::new(2, 1).unwrap();
//! t.add_link(NodeId(1), NodeId(3)).unwrap();
//! t.add_link(NodeId(3), NodeId(2)).unwrap();
//!
//! assert_eq!(t.adjacency(NodeId(2), NodeId(3)), Some(LinkId(2)));
//! assert_eq!(t.adjacency(NodeId(1), NodeId(2)), None);
//! ```

pub mod paths;
pub use paths::{PathEnumerator, Route};

use crate::types::{host_pairs, Flow, LinkId, NodeId};

use petgraph::prelude::*;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

type IndexType = u32;
/// Graph holding the physical topology. Node weights are the node ids, and edge weights the link
/// ids.
pub type TopologyGraph = Graph<NodeId, LinkId, Undirected, IndexType>;

/// Topology Errors
#[derive(Error, Debug, PartialEq)]
pub enum TopologyError {
    /// The node id is not part of the topology
    #[error("Node {0} is not part of the topology (valid ids: 1..={1})")]
    NodeOutOfRange(usize, usize),
    /// Fewer than two hosts are present.
    #[error("At least two hosts are required, but only {0} were declared")]
    TooFewHosts(usize),
    /// The link id is unknown
    #[error("Link {0} does not exist")]
    UnknownLink(usize),
    /// The generated topology needs more routers.
    #[error("The topology requires at least {required} routers, but only {found} were requested")]
    TooFewRouters {
        /// Smallest number of routers
        required: usize,
        /// Requested number of routers
        found: usize,
    },
}

/// # Topology
/// Physical network of hosts and routers. Once built, the topology is never changed.
#[derive(Debug, Clone)]
pub struct Topology {
    n_hosts: usize,
    n_routers: usize,
    graph: TopologyGraph,
    links: Vec<(NodeId, NodeId)>,
    adjacency: HashMap<(NodeId, NodeId), LinkId>,
}

impl Topology {
    /// Create a new topology without any links.
    pub fn new(n_hosts: usize, n_routers: usize) -> Result<Self, TopologyError> {
        if n_hosts < 2 {
            return Err(TopologyError::TooFewHosts(n_hosts));
        }
        let mut graph = TopologyGraph::with_capacity(n_hosts + n_routers, 0);
        for id in 1..=(n_hosts + n_routers) {
            graph.add_node(NodeId(id));
        }
        Ok(Self { n_hosts, n_routers, graph, links: Vec::new(), adjacency: HashMap::new() })
    }

    /// Add an undirected link between `a` and `b`, returning the new link id. Duplicate links and
    /// self-links are accepted. If two links connect the same pair of nodes, the adjacency lookup
    /// returns the link that was added last.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> Result<LinkId, TopologyError> {
        let a_idx = self.node_index(a)?;
        let b_idx = self.node_index(b)?;
        self.links.push((a, b));
        let link = LinkId(self.links.len());
        self.graph.add_edge(a_idx, b_idx, link);
        self.adjacency.insert((a, b), link);
        self.adjacency.insert((b, a), link);
        Ok(link)
    }

    /// Returns the link connecting `u` and `v`, or `None` if they are not adjacent.
    pub fn adjacency(&self, u: NodeId, v: NodeId) -> Option<LinkId> {
        self.adjacency.get(&(u, v)).copied()
    }

    /// Number of hosts
    pub fn num_hosts(&self) -> usize {
        self.n_hosts
    }

    /// Number of routers
    pub fn num_routers(&self) -> usize {
        self.n_routers
    }

    /// Number of links
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Returns true if the node is a host
    pub fn is_host(&self, node: NodeId) -> bool {
        node.0 >= 1 && node.0 <= self.n_hosts
    }

    /// Returns true if the node is a router
    pub fn is_router(&self, node: NodeId) -> bool {
        node.0 > self.n_hosts && node.0 <= self.n_hosts + self.n_routers
    }

    /// Iterate over all hosts
    pub fn hosts(&self) -> impl Iterator<Item = NodeId> {
        (1..=self.n_hosts).map(NodeId)
    }

    /// Iterate over all routers
    pub fn routers(&self) -> impl Iterator<Item = NodeId> {
        (self.n_hosts + 1..=self.n_hosts + self.n_routers).map(NodeId)
    }

    /// Iterate over all link ids
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> {
        (1..=self.links.len()).map(LinkId)
    }

    /// Iterate over all links together with their endpoints, in the order they were added.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, NodeId, NodeId)> + '_ {
        self.links.iter().enumerate().map(|(i, (a, b))| (LinkId(i + 1), *a, *b))
    }

    /// Returns the endpoints of a link.
    pub fn link_endpoints(&self, link: LinkId) -> Result<(NodeId, NodeId), TopologyError> {
        if link.0 == 0 {
            return Err(TopologyError::UnknownLink(link.0));
        }
        self.links.get(link.0 - 1).copied().ok_or(TopologyError::UnknownLink(link.0))
    }

    /// Iterate over all ordered pairs of distinct hosts.
    pub fn host_pairs(&self) -> impl Iterator<Item = Flow> {
        host_pairs(self.n_hosts)
    }

    /// Returns all routers adjacent to `node`, sorted by id and without duplicates.
    pub fn router_neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let idx = match self.node_index(node) {
            Ok(idx) => idx,
            Err(_) => return Vec::new(),
        };
        let neighbors: BTreeSet<NodeId> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n])
            .filter(|n| self.is_router(*n))
            .collect();
        neighbors.into_iter().collect()
    }

    /// Returns a reference to the underlying graph.
    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Enumerate all simple paths from `src` to `dst` through routers, with at most `max_len`
    /// nodes. See [`PathEnumerator`].
    pub fn paths(&self, src: NodeId, dst: NodeId, max_len: usize) -> PathEnumerator<'_> {
        PathEnumerator::new(self, src, dst, max_len)
    }

    fn node_index(&self, node: NodeId) -> Result<NodeIndex<IndexType>, TopologyError> {
        let n = self.n_hosts + self.n_routers;
        if node.0 == 0 || node.0 > n {
            Err(TopologyError::NodeOutOfRange(node.0, n))
        } else {
            Ok(NodeIndex::new(node.0 - 1))
        }
    }
}
