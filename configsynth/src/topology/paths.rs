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

//! # Path Enumeration
//!
//! Depth-first search for all simple paths between two hosts. Hosts only appear as the endpoints
//! of a path, every interior node is a router. The search keeps an explicit stack of path
//! prefixes, and every prefix on the stack is owned by the stack alone, so backtracking never has
//! to undo anything.

use super::Topology;
use crate::types::{LinkId, NodeId};

use std::fmt;

/// A simple path from a source host to a destination host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    nodes: Vec<NodeId>,
    links: Vec<LinkId>,
}

impl Route {
    /// All nodes on the route, starting at the source and ending at the destination.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// All links on the route, in order. There is always one link less than there are nodes.
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Number of nodes on the route
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the route contains no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First link of the route
    pub fn first_link(&self) -> Option<LinkId> {
        self.links.first().copied()
    }

    /// Last link of the route
    pub fn last_link(&self) -> Option<LinkId> {
        self.links.last().copied()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.iter().map(|n| n.0.to_string()).collect();
        write!(f, "[{}]", nodes.join(" -> "))
    }
}

#[derive(Debug, Clone)]
struct Prefix {
    nodes: Vec<NodeId>,
    links: Vec<LinkId>,
}

impl Prefix {
    fn last(&self) -> NodeId {
        // a prefix always contains at least the source
        self.nodes[self.nodes.len() - 1]
    }

    fn extend(&self, node: NodeId, link: LinkId) -> Self {
        let mut nodes = self.nodes.clone();
        let mut links = self.links.clone();
        nodes.push(node);
        links.push(link);
        Self { nodes, links }
    }
}

/// # Path Enumerator
///
/// Lazy iterator over all simple paths from `src` to `dst`. At every branching point, routers are
/// explored in ascending order of their id, and a prefix which already reaches the destination is
/// reported before its extensions. The number of nodes on every path is bounded by `max_len`.
///
/// ```rust
/// use configsynth::topology::Topology;
/// use configsynth::types::NodeId;
///
/// // 1 -- 3 -- 2
/// let mut t = Topology::new(2, 1).unwrap();
/// t.add_link(NodeId(1), NodeId(3)).unwrap();
/// t.add_link(NodeId(3), NodeId(2)).unwrap();
///
/// let paths: Vec<_> = t.paths(NodeId(1), NodeId(2), 20).collect();
/// assert_eq!(paths.len(), 1);
/// assert_eq!(paths[0].nodes(), &[NodeId(1), NodeId(3), NodeId(2)]);
/// ```
#[derive(Debug)]
pub struct PathEnumerator<'a> {
    topo: &'a Topology,
    dst: NodeId,
    max_len: usize,
    stack: Vec<Prefix>,
}

impl<'a> PathEnumerator<'a> {
    /// Create a new path enumerator. If `src == dst`, or if `max_len < 2`, the enumerator yields
    /// nothing.
    pub fn new(topo: &'a Topology, src: NodeId, dst: NodeId, max_len: usize) -> Self {
        let stack = if src != dst && max_len >= 2 {
            vec![Prefix { nodes: vec![src], links: Vec::new() }]
        } else {
            Vec::new()
        };
        Self { topo, dst, max_len, stack }
    }
}

impl<'a> Iterator for PathEnumerator<'a> {
    type Item = Route;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(prefix) = self.stack.pop() {
            let last = prefix.last();

            // extend the prefix by one router, if there is still space for the destination
            if prefix.nodes.len() + 2 <= self.max_len {
                let extensions: Vec<Prefix> = self
                    .topo
                    .router_neighbors(last)
                    .into_iter()
                    .filter(|r| !prefix.nodes.contains(r))
                    .filter_map(|r| self.topo.adjacency(last, r).map(|l| prefix.extend(r, l)))
                    .collect();
                // push in reverse, such that the smallest router id is explored first
                self.stack.extend(extensions.into_iter().rev());
            }

            if let Some(link) = self.topo.adjacency(last, self.dst) {
                let done = prefix.extend(self.dst, link);
                return Some(Route { nodes: done.nodes, links: done.links });
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn route(nodes: &[usize]) -> Vec<NodeId> {
        nodes.iter().map(|n| NodeId(*n)).collect()
    }

    #[test]
    fn single_router() {
        // 1 -- 3 -- 2
        let mut t = Topology::new(2, 1).unwrap();
        t.add_link(NodeId(1), NodeId(3)).unwrap();
        t.add_link(NodeId(3), NodeId(2)).unwrap();
        let paths: Vec<Route> = t.paths(NodeId(1), NodeId(2), 20).collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes(), route(&[1, 3, 2]).as_slice());
        assert_eq!(paths[0].links(), &[LinkId(1), LinkId(2)]);
        assert_eq!(paths[0].to_string(), "[1 -> 3 -> 2]");
    }

    /// ```text
    ///      .-- 4 --.
    /// 1 -- 3       6 -- 2
    ///      '-- 5 --'
    /// ```
    #[test]
    fn parallel_routers() {
        let mut t = Topology::new(2, 4).unwrap();
        t.add_link(NodeId(1), NodeId(3)).unwrap();
        t.add_link(NodeId(3), NodeId(4)).unwrap();
        t.add_link(NodeId(3), NodeId(5)).unwrap();
        t.add_link(NodeId(4), NodeId(6)).unwrap();
        t.add_link(NodeId(5), NodeId(6)).unwrap();
        t.add_link(NodeId(6), NodeId(2)).unwrap();
        let paths: Vec<Vec<NodeId>> =
            t.paths(NodeId(1), NodeId(2), 20).map(|r| r.nodes().to_vec()).collect();
        assert_eq!(paths, vec![route(&[1, 3, 4, 6, 2]), route(&[1, 3, 5, 6, 2])]);
    }

    #[test]
    fn direct_host_link() {
        // 1 -- 2, and 1 -- 3 -- 2
        let mut t = Topology::new(2, 1).unwrap();
        t.add_link(NodeId(1), NodeId(2)).unwrap();
        t.add_link(NodeId(1), NodeId(3)).unwrap();
        t.add_link(NodeId(3), NodeId(2)).unwrap();
        let paths: Vec<Vec<NodeId>> =
            t.paths(NodeId(1), NodeId(2), 20).map(|r| r.nodes().to_vec()).collect();
        assert_eq!(paths, vec![route(&[1, 2]), route(&[1, 3, 2])]);
    }

    #[test]
    fn prefix_reaching_destination_is_still_extended() {
        // 1 -- 4 -- 2, 4 -- 5 -- 2
        let mut t = Topology::new(3, 2).unwrap();
        t.add_link(NodeId(1), NodeId(4)).unwrap();
        t.add_link(NodeId(4), NodeId(2)).unwrap();
        t.add_link(NodeId(4), NodeId(5)).unwrap();
        t.add_link(NodeId(5), NodeId(2)).unwrap();
        let paths: Vec<Vec<NodeId>> =
            t.paths(NodeId(1), NodeId(2), 20).map(|r| r.nodes().to_vec()).collect();
        assert_eq!(paths, vec![route(&[1, 4, 2]), route(&[1, 4, 5, 2])]);
    }

    #[test]
    fn hosts_are_never_interior_nodes() {
        // 1 -- 4 -- 3 -- 5 -- 2: host 3 sits in between
        let mut t = Topology::new(3, 2).unwrap();
        t.add_link(NodeId(1), NodeId(4)).unwrap();
        t.add_link(NodeId(4), NodeId(3)).unwrap();
        t.add_link(NodeId(3), NodeId(5)).unwrap();
        t.add_link(NodeId(5), NodeId(2)).unwrap();
        assert_eq!(t.paths(NodeId(1), NodeId(2), 20).count(), 0);
        assert_eq!(t.paths(NodeId(1), NodeId(3), 20).count(), 1);
    }

    #[test]
    fn full_mesh_is_simple_and_bounded() {
        // two hosts attached to a full mesh of 4 routers
        let mut t = Topology::new(2, 4).unwrap();
        t.add_link(NodeId(1), NodeId(3)).unwrap();
        t.add_link(NodeId(2), NodeId(6)).unwrap();
        for a in 3..=6 {
            for b in (a + 1)..=6 {
                t.add_link(NodeId(a), NodeId(b)).unwrap();
            }
        }
        let all: Vec<Route> = t.paths(NodeId(1), NodeId(2), 20).collect();
        // 3 -> 6 directly, through one of {4, 5}, or through both in either order
        assert_eq!(all.len(), 5);
        let unique: HashSet<Vec<NodeId>> = all.iter().map(|r| r.nodes().to_vec()).collect();
        assert_eq!(unique.len(), all.len());
        for r in all.iter() {
            let nodes: HashSet<NodeId> = r.nodes().iter().copied().collect();
            assert_eq!(nodes.len(), r.len());
            assert_eq!(r.links().len(), r.len() - 1);
        }

        // bounding the length removes the longer paths
        let short: Vec<Route> = t.paths(NodeId(1), NodeId(2), 4).collect();
        assert_eq!(short.len(), 1);
        assert!(t.paths(NodeId(1), NodeId(2), 5).all(|r| r.len() <= 5));
        assert_eq!(t.paths(NodeId(1), NodeId(2), 5).count(), 3);
    }

    #[test]
    fn degenerate_requests() {
        let mut t = Topology::new(2, 1).unwrap();
        t.add_link(NodeId(1), NodeId(3)).unwrap();
        t.add_link(NodeId(3), NodeId(2)).unwrap();
        assert_eq!(t.paths(NodeId(1), NodeId(1), 20).count(), 0);
        assert_eq!(t.paths(NodeId(1), NodeId(2), 1).count(), 0);
        assert_eq!(t.paths(NodeId(1), NodeId(2), 2).count(), 0);
    }
}
