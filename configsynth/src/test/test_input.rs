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

#![cfg(test)]
use crate::example_networks::{generate, StarLevelNet, StarNet, TreeNet};
use crate::input::{load_files, parse_input, parse_sources, InputError, Location};
use crate::topology::TopologyError;
use crate::types::{DeviceId, Flow, NodeId, OsId, ServiceId};
use crate::Error;

use lazy_static::lazy_static;
use rand::prelude::*;
use std::fs::read_to_string;

lazy_static! {
    static ref POLICY: String = read_to_string(test_file("small_policy.txt")).unwrap();
    static ref TOPOLOGY: String = read_to_string(test_file("small_topology.txt")).unwrap();
}

fn test_file(name: &str) -> String {
    format!("{}/test_files/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn parse(policy: &str, topology: &str) -> Result<crate::scenario::Scenario, Error> {
    parse_sources(&[("policy.txt", policy), ("topology.txt", topology)])
}

#[test]
fn small_scenario() {
    let s = load_files(&[test_file("small_policy.txt"), test_file("small_topology.txt")]).unwrap();

    assert_eq!(s.policy.num_devices(), 3);
    assert_eq!(s.policy.devices.get(DeviceId(2)).unwrap().usability, 8.0);
    // the implicit pattern without device gets the maximum isolation usability
    assert_eq!(s.policy.devices.get(DeviceId::NONE).unwrap().usability, 10.0);
    assert_eq!(s.policy.os.num_os(), 4);
    assert_eq!(s.policy.os.family_members(crate::types::FamilyId(2)), vec![OsId(3), OsId(4)]);
    assert_eq!(s.policy.os.get(OsId(4)).unwrap().cost, 2.0);
    assert_eq!(s.policy.diversity.0, [10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
    assert_eq!(s.policy.num_services, 4);

    assert_eq!(s.topology.num_hosts(), 3);
    assert_eq!(s.topology.num_routers(), 2);
    assert_eq!(s.topology.num_links(), 4);
    assert!(s.topology.adjacency(NodeId(4), NodeId(5)).is_some());

    assert_eq!(
        s.flows.required_flows().collect::<Vec<_>>(),
        vec![Flow::new(1, 2), Flow::new(3, 1)]
    );
    assert_eq!(s.flows.rank(Flow::new(1, 3)), 2);
    // required flows get the maximum isolation usability as rank
    assert_eq!(s.flows.rank(Flow::new(3, 1)), 10);
    assert_eq!(s.flows.rank(Flow::new(1, 2)), 10);
    assert_eq!(s.flows.rank(Flow::new(2, 3)), 1);
    assert_eq!(s.services.services(NodeId(2)), vec![ServiceId(2), ServiceId(3)]);
    assert!(s.services.services(NodeId(3)).is_empty());
    assert_eq!(s.sliders.resiliency, 5.0);
    assert_eq!(s.sliders.cost, 1000);
}

#[test]
fn single_stream() {
    let joined = format!("{}\n{}", *POLICY, *TOPOLOGY);
    let a = parse_input(&joined).unwrap();
    let b = parse(&POLICY, &TOPOLOGY).unwrap();
    assert_eq!(a.to_input_string(), b.to_input_string());
}

#[test]
fn error_locations() {
    let topology = TOPOLOGY.replacen("1 4\n", "1 9\n", 1);
    match parse(&POLICY, &topology) {
        Err(Error::InputError(InputError::IdOutOfRange { at, id, max, .. })) => {
            assert_eq!(at, Location { source: "topology.txt".to_string(), line: 9 });
            assert_eq!(id, 9);
            assert_eq!(max, 5);
        }
        r => panic!("unexpected result: {:?}", r.map(|s| s.to_input_string())),
    }

    let policy = POLICY.replacen("10 6 4", "10 6", 1);
    match parse(&policy, &TOPOLOGY) {
        Err(Error::InputError(InputError::TokenCount { at, expected, found, .. })) => {
            assert_eq!(at.source, "policy.txt");
            assert_eq!((expected, found), (3, 2));
        }
        r => panic!("unexpected result: {:?}", r.map(|s| s.to_input_string())),
    }
}

#[test]
fn malformed_input() {
    let err = |policy: &str, topology: &str| match parse(policy, topology) {
        Err(Error::InputError(e)) => e,
        r => panic!("unexpected result: {:?}", r.map(|s| s.to_input_string())),
    };

    // missing sliders
    let truncated = TOPOLOGY.replace("5 5 1000", "");
    assert!(matches!(err(&POLICY, &truncated), InputError::UnexpectedEof { section: "sliders" }));

    let trailing = format!("{}\n42\n", *TOPOLOGY);
    assert!(matches!(err(&POLICY, &trailing), InputError::TrailingInput(_)));

    let rank = TOPOLOGY.replacen("1 3 2", "1 3 0", 1);
    assert!(matches!(err(&POLICY, &rank), InputError::InvalidValue { value: 0, .. }));

    let family = POLICY.replacen("1 2\n", "1 2 3 4\n", 1);
    assert!(matches!(err(&family, &TOPOLOGY), InputError::TooManyTokens { max: 3, .. }));

    let services = TOPOLOGY.replacen("2 3 0", "2 3", 1);
    assert!(matches!(err(&POLICY, &services), InputError::MissingTerminator { .. }));

    let slider = TOPOLOGY.replacen("5 5 1000", "5 five 1000", 1);
    assert!(matches!(err(&POLICY, &slider), InputError::ParseFloat { .. }));

    for slider in &["inf 5 1000", "5 NaN 1000", "-infinity 5 1000"] {
        let topology = TOPOLOGY.replacen("5 5 1000", slider, 1);
        assert!(matches!(
            err(&POLICY, &topology),
            InputError::ParseFloat { section: "sliders", .. }
        ));
    }
    let diversity = POLICY.replacen("10 8 6 4 2 0", "10 8 NaN 4 2 0", 1);
    assert!(matches!(
        err(&diversity, &TOPOLOGY),
        InputError::ParseFloat { section: "diversity scores", .. }
    ));

    assert!(matches!(
        load_files(&[test_file("does_not_exist.txt")]),
        Err(Error::InputError(InputError::IoError(_)))
    ));
}

#[test]
fn explicit_rank_overrides_required_rank() {
    let topology = TOPOLOGY.replacen("1 3 2", "3 1 4", 1);
    let s = parse(&POLICY, &topology).unwrap();
    assert_eq!(s.flows.rank(Flow::new(3, 1)), 4);
    assert_eq!(s.flows.rank(Flow::new(1, 2)), 10);
    assert_eq!(s.flows.rank(Flow::new(1, 3)), 1);
    assert_eq!(s.flows.total_rank(), 4 + 10 + 4 * 1);
}

#[test]
fn single_host() {
    let topology = TOPOLOGY.replacen("3\n", "1\n", 1);
    assert!(matches!(
        parse(&POLICY, &topology),
        Err(Error::TopologyError(TopologyError::TooFewHosts(1)))
    ));
}

#[test]
fn generated_scenarios_can_be_read_back() {
    let mut rng = StdRng::seed_from_u64(11);
    let scenarios = vec![
        generate::<TreeNet, _>(12, 4, &mut rng).unwrap(),
        generate::<StarNet, _>(9, 3, &mut rng).unwrap(),
        generate::<StarLevelNet, _>(10, 8, &mut rng).unwrap(),
    ];
    for s in scenarios {
        let text = s.to_input_string();
        let read = parse_input(&text).unwrap();
        assert_eq!(read.to_input_string(), text);
        assert_eq!(read.topology.num_links(), s.topology.num_links());
        assert_eq!(read.flows, s.flows);
        assert_eq!(read.services, s.services);
        assert_eq!(read.policy, s.policy);

        // policy and topology can be stored separately
        let split = parse(&s.policy_string(), &s.topology_string()).unwrap();
        assert_eq!(split.to_input_string(), text);
    }
}
