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

//! Module containing all identifier types shared by the whole crate.
//!
//! All identifiers are 1-based, exactly as they appear in the input description. The index `0`
//! only has a meaning for [`DeviceId`] (no device) and [`FamilyId`] (no family).

use itertools::iproduct;
use std::fmt;

/// Node identification. Hosts are numbered `1..=n_hosts`, routers `n_hosts+1..=n_hosts+n_routers`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct NodeId(pub usize);

/// Link identification (`1..=n_links`).
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct LinkId(pub usize);

/// Security device type, which doubles as the isolation pattern index of a flow.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct DeviceId(pub usize);

impl DeviceId {
    /// No device deployed, or no isolation applied to a flow.
    pub const NONE: DeviceId = DeviceId(0);
    /// Isolation pattern with zero usability. Denied flows use exactly this pattern.
    pub const DENY: DeviceId = DeviceId(1);
    /// Encryption-class device. It must bracket the route (tunnel endpoints).
    pub const ENCRYPTION: DeviceId = DeviceId(2);
}

/// Operating system (`1..=n_os`).
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct OsId(pub usize);

/// Operating system family. `FamilyId(0)` means that the OS belongs to no family.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct FamilyId(pub usize);

impl FamilyId {
    /// OS without an explicit family
    pub const NONE: FamilyId = FamilyId(0);
}

/// Service that may run on a host (`1..=n_services`).
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ServiceId(pub usize);

/// Ordered host pair, from `src` to `dst`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct Flow {
    /// Source host
    pub src: NodeId,
    /// Destination host
    pub dst: NodeId,
}

impl Flow {
    /// Create a new flow between two hosts
    pub fn new(src: usize, dst: usize) -> Self {
        Self { src: NodeId(src), dst: NodeId(dst) }
    }

    /// Returns true if source and destination are the same host.
    pub fn is_self_flow(&self) -> bool {
        self.src == self.dst
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src.0, self.dst.0)
    }
}

/// Iterate over all ordered host pairs of `n_hosts` hosts, including the diagonal.
pub fn all_flows(n_hosts: usize) -> impl Iterator<Item = Flow> {
    iproduct!(1..=n_hosts, 1..=n_hosts).map(|(i, j)| Flow::new(i, j))
}

/// Iterate over all ordered host pairs `(i, j)` with `i != j`.
pub fn host_pairs(n_hosts: usize) -> impl Iterator<Item = Flow> {
    all_flows(n_hosts).filter(|f| !f.is_self_flow())
}
