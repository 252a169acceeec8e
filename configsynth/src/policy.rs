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

//! # Policy Tables
//!
//! Static tables describing the security devices, the operating systems and the diversity scores,
//! together with the per-flow and per-host requirements and the slider inputs. Everything in this
//! module is plain data; the symbolic encoding happens in [`crate::builder`].

use crate::types::{all_flows, DeviceId, FamilyId, Flow, NodeId, OsId, ServiceId};

use std::collections::{BTreeMap, BTreeSet};

/// Properties of a security device type (isolation pattern).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceType {
    /// Isolation score of the pattern
    pub isolation: f64,
    /// Usability of a flow which is isolated with this pattern
    pub usability: f64,
    /// Cost of deploying one device on a link
    pub cost: f64,
}

/// # Device Table
/// Indexed by [`DeviceId`]. Index `0` is the implicit "no device" pattern with isolation 0, cost 0
/// and the maximum isolation usability.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTable {
    devices: Vec<DeviceType>,
}

impl DeviceTable {
    /// Create a device table from the declared devices `1..=n_dev`.
    pub fn new(max_iso_usability: i64, devices: Vec<DeviceType>) -> Self {
        let none = DeviceType { isolation: 0.0, usability: max_iso_usability as f64, cost: 0.0 };
        let mut table = Vec::with_capacity(devices.len() + 1);
        table.push(none);
        table.extend(devices);
        Self { devices: table }
    }

    /// Number of declared devices (`n_dev`), not counting the "no device" pattern.
    pub fn num_devices(&self) -> usize {
        self.devices.len() - 1
    }

    /// Get the properties of a device, or `None` if the id is out of range.
    pub fn get(&self, dev: DeviceId) -> Option<&DeviceType> {
        self.devices.get(dev.0)
    }

    /// Iterate over all device ids including `0`.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> {
        (0..self.devices.len()).map(DeviceId)
    }

    /// Iterate over the declared devices `1..=n_dev`.
    pub fn deployable(&self) -> impl Iterator<Item = DeviceId> {
        (1..self.devices.len()).map(DeviceId)
    }

    /// Iterate over all devices with their id, including the "no device" pattern.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &DeviceType)> {
        self.devices.iter().enumerate().map(|(i, d)| (DeviceId(i), d))
    }

    /// Returns the sum of the cost of all deployable devices.
    pub fn total_cost(&self) -> f64 {
        self.devices.iter().map(|d| d.cost).sum()
    }
}

/// Properties of an operating system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingSystem {
    /// Family, or [`FamilyId::NONE`]
    pub family: FamilyId,
    /// Usability score of a host running this OS
    pub usability: f64,
    /// Installation cost
    pub cost: f64,
}

/// # Operating System Table
/// Indexed by [`OsId`], starting at `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct OsTable {
    systems: Vec<OperatingSystem>,
    num_families: usize,
}

impl OsTable {
    /// Create a new table. `systems[0]` describes [`OsId(1)`](OsId).
    pub fn new(systems: Vec<OperatingSystem>, num_families: usize) -> Self {
        Self { systems, num_families }
    }

    /// Number of operating systems
    pub fn num_os(&self) -> usize {
        self.systems.len()
    }

    /// Number of declared families
    pub fn num_families(&self) -> usize {
        self.num_families
    }

    /// Get the properties of an operating system.
    pub fn get(&self, os: OsId) -> Option<&OperatingSystem> {
        if os.0 == 0 {
            None
        } else {
            self.systems.get(os.0 - 1)
        }
    }

    /// Iterate over all operating systems with their id.
    pub fn iter(&self) -> impl Iterator<Item = (OsId, &OperatingSystem)> {
        self.systems.iter().enumerate().map(|(i, o)| (OsId(i + 1), o))
    }

    /// All members of a family, sorted by id.
    pub fn family_members(&self, family: FamilyId) -> Vec<OsId> {
        self.iter().filter(|(_, o)| o.family == family).map(|(id, _)| id).collect()
    }

    /// Integer code of the family of `os` as used in the model. An OS without a family gets a code
    /// of its own, such that it never shares the family with another OS.
    pub fn family_code(&self, os: OsId) -> i64 {
        match self.get(os) {
            Some(o) if o.family != FamilyId::NONE => o.family.0 as i64,
            _ => (self.num_families + os.0) as i64,
        }
    }

    /// Largest installation cost of all operating systems
    pub fn max_cost(&self) -> f64 {
        self.systems.iter().map(|o| o.cost).fold(0.0, f64::max)
    }
}

/// Relation between the software stacks of two hosts. Each case has its own diversity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiversityCase {
    /// Different OS family and no shared service
    DiffFamilyDiffServ,
    /// Different OS family, but at least one shared service
    DiffFamilySameServ,
    /// Same family, different OS and no shared service
    SameFamilyDiffServ,
    /// Same family, different OS, but at least one shared service
    SameFamilySameServ,
    /// Same OS and no shared service
    SameOsDiffServ,
    /// Same OS and at least one shared service
    SameOsSameServ,
}

impl DiversityCase {
    /// All cases, in the order of the diversity table.
    pub const ALL: [DiversityCase; 6] = [
        DiversityCase::DiffFamilyDiffServ,
        DiversityCase::DiffFamilySameServ,
        DiversityCase::SameFamilyDiffServ,
        DiversityCase::SameFamilySameServ,
        DiversityCase::SameOsDiffServ,
        DiversityCase::SameOsSameServ,
    ];

    /// Position in the diversity table
    pub fn index(&self) -> usize {
        match self {
            Self::DiffFamilyDiffServ => 0,
            Self::DiffFamilySameServ => 1,
            Self::SameFamilyDiffServ => 2,
            Self::SameFamilySameServ => 3,
            Self::SameOsDiffServ => 4,
            Self::SameOsSameServ => 5,
        }
    }

    /// Classify the relation of two hosts. If both run the same OS, the family is ignored.
    pub fn classify(same_family: bool, same_os: bool, shared_service: bool) -> Self {
        match (same_os, same_family, shared_service) {
            (true, _, false) => Self::SameOsDiffServ,
            (true, _, true) => Self::SameOsSameServ,
            (false, true, false) => Self::SameFamilyDiffServ,
            (false, true, true) => Self::SameFamilySameServ,
            (false, false, false) => Self::DiffFamilyDiffServ,
            (false, false, true) => Self::DiffFamilySameServ,
        }
    }

    /// Whether this case requires both hosts to share a service
    pub fn shares_service(&self) -> bool {
        matches!(self, Self::DiffFamilySameServ | Self::SameFamilySameServ | Self::SameOsSameServ)
    }
}

/// Diversity score of each [`DiversityCase`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityTable(pub [f64; 6]);

impl DiversityTable {
    /// Score of a case
    pub fn score(&self, case: DiversityCase) -> f64 {
        self.0[case.index()]
    }
}

/// # Policy Tables
/// All static scores and costs of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTables {
    /// Security devices
    pub devices: DeviceTable,
    /// Largest isolation score
    pub max_isolation: i64,
    /// Usability of a flow without isolation
    pub max_iso_usability: i64,
    /// Operating systems
    pub os: OsTable,
    /// Largest diversity score
    pub max_diversity: i64,
    /// Diversity scores
    pub diversity: DiversityTable,
    /// Largest OS usability
    pub max_div_usability: i64,
    /// Number of distinct services
    pub num_services: usize,
}

impl PolicyTables {
    /// Number of declared devices
    pub fn num_devices(&self) -> usize {
        self.devices.num_devices()
    }

    /// Iterate over all services
    pub fn services(&self) -> impl Iterator<Item = ServiceId> {
        (1..=self.num_services).map(ServiceId)
    }
}

/// # Flow Policy
///
/// Reachability requirements and ranks of all ordered host pairs. A flow on the diagonal is always
/// required. A required off-diagonal flow has the rank of the policy (usually
/// `max_iso_usability`), every other flow has rank 1, and explicit ranks override both.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPolicy {
    n_hosts: usize,
    required_rank: i64,
    required: BTreeSet<Flow>,
    ranks: BTreeMap<Flow, i64>,
}

impl FlowPolicy {
    /// Create an empty policy for `n_hosts` hosts, where required flows get `required_rank`.
    pub fn new(n_hosts: usize, required_rank: i64) -> Self {
        Self { n_hosts, required_rank, required: BTreeSet::new(), ranks: BTreeMap::new() }
    }

    /// Number of hosts covered by the policy
    pub fn num_hosts(&self) -> usize {
        self.n_hosts
    }

    /// Require that traffic can flow from `flow.src` to `flow.dst`.
    pub fn require(&mut self, flow: Flow) {
        if !flow.is_self_flow() {
            self.required.insert(flow);
        }
    }

    /// Override the rank of a flow. A rank given twice keeps the last value.
    pub fn set_rank(&mut self, flow: Flow, rank: i64) {
        self.ranks.insert(flow, rank);
    }

    /// Returns true if the flow must be reachable.
    pub fn is_required(&self, flow: Flow) -> bool {
        flow.is_self_flow() || self.required.contains(&flow)
    }

    /// Rank of the flow
    pub fn rank(&self, flow: Flow) -> i64 {
        match self.ranks.get(&flow) {
            Some(rank) => *rank,
            None if self.required.contains(&flow) => self.required_rank,
            None => 1,
        }
    }

    /// All required off-diagonal flows, sorted
    pub fn required_flows(&self) -> impl Iterator<Item = Flow> + '_ {
        self.required.iter().copied()
    }

    /// All flows with an explicit rank, sorted
    pub fn explicit_ranks(&self) -> impl Iterator<Item = (Flow, i64)> + '_ {
        self.ranks.iter().map(|(f, r)| (*f, *r))
    }

    /// Destinations that `src` must reach, sorted
    pub fn required_destinations(&self, src: NodeId) -> Vec<NodeId> {
        self.required.iter().filter(|f| f.src == src).map(|f| f.dst).collect()
    }

    /// Sum of the ranks of all off-diagonal flows
    pub fn total_rank(&self) -> i64 {
        all_flows(self.n_hosts).filter(|f| !f.is_self_flow()).map(|f| self.rank(f)).sum()
    }
}

/// Services each host is required to run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceRequirements {
    required: BTreeMap<NodeId, BTreeSet<ServiceId>>,
}

impl ServiceRequirements {
    /// Create empty requirements
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `host` to run `service`
    pub fn require(&mut self, host: NodeId, service: ServiceId) {
        self.required.entry(host).or_insert_with(BTreeSet::new).insert(service);
    }

    /// Returns true if `host` must run `service`.
    pub fn is_required(&self, host: NodeId, service: ServiceId) -> bool {
        self.required.get(&host).map(|s| s.contains(&service)).unwrap_or(false)
    }

    /// All services required on `host`, sorted
    pub fn services(&self, host: NodeId) -> Vec<ServiceId> {
        self.required.get(&host).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }
}

/// Slider positions of the three objectives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sliders {
    /// Requested resiliency, on the slider scale
    pub resiliency: f64,
    /// Requested usability, on the slider scale
    pub usability: f64,
    /// Absolute cost budget
    pub cost: i64,
}
