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
use super::helpers::*;
use crate::builder::build;
use crate::config::SynthConfig;
use crate::example_networks::{default_policy, line_scenario, mesh_scenario};
use crate::policy::{DiversityCase, Sliders};
use crate::types::{DeviceId, Flow, LinkId, NodeId};

use assert_approx_eq::assert_approx_eq;
use std::collections::HashSet;

#[test]
fn assertion_names_are_numbered() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let mut names = HashSet::new();
    for (i, a) in c.assertions().iter().enumerate() {
        let (tag, n) = a.name.split_at(a.name.rfind('@').unwrap());
        assert!(!tag.is_empty());
        assert_eq!(n[1..].parse::<usize>().unwrap(), i + 1);
        assert!(names.insert(a.name.clone()));
    }
}

#[test]
fn all_variables_are_declared() {
    let scenario = mesh_scenario(3, 2, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let mut declared = HashSet::new();
    for v in c.declarations() {
        assert!(declared.insert(v.name().to_string()), "{} declared twice", v.name());
    }
    for a in c.assertions() {
        for v in a.term.vars() {
            assert!(declared.contains(v.name()), "{} used in {} but not declared", v, a.name);
        }
    }
}

#[test]
fn emission_order() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let position = |prefix: &str| {
        c.assertions().iter().position(|a| a.name.starts_with(prefix)).unwrap()
    };
    assert!(position("h_iso_usa_3@") < position("os_range_1@"));
    assert!(position("div_usa_3_4@") < position("res0_deny_1_2@"));
    assert!(position("usability@") < position("all_routes_self_1@"));
    assert!(position("all_routes_range_3_3@") < position("link_dev_1@"));
    assert!(position("cost@") < position("target_res@"));
    let last: Vec<_> = c.assertions().iter().rev().take(3).map(|a| a.name.clone()).collect();
    assert!(last[0].starts_with("target_cost@"));
    assert!(last[1].starts_with("target_usa@"));
    assert!(last[2].starts_with("target_res@"));
}

#[test]
fn open_network() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let m = Decisions::open(&scenario, &c).complete();
    assert_eq!(violated(&c, &m), Vec::<String>::new());

    // no isolation, same OS without shared services: every flow has diversity 2
    assert_approx_eq!(real(&m, c.vars.flow_res.get((Flow::new(1, 2), 0)).unwrap()), 6.0);
    assert_approx_eq!(real(&m, c.vars.flow_res.get((Flow::new(1, 3), 2)).unwrap()), 6.0);
    assert_approx_eq!(real(&m, c.vars.flow_res_ult.get(Flow::new(3, 1)).unwrap()), 36.0);
    assert_approx_eq!(real(&m, &c.vars.resiliency), 216.0);
    // 2 incoming flows with usability 10, weight 7; OS usability 8 with weight 2 * 3
    assert_approx_eq!(real(&m, c.vars.h_res_usa.get(NodeId(2)).unwrap()), 188.0);
    assert_approx_eq!(real(&m, &c.vars.usability), 564.0);
    // only the operating systems cost
    assert_approx_eq!(real(&m, &c.vars.cost), 15.0);
}

#[test]
fn cheapest_configuration() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let mut d = Decisions::open(&scenario, &c);
    for h in scenario.topology.hosts() {
        d.host(h, 4, &[]);
    }
    let cheapest = real(&d.complete(), &c.vars.cost);
    assert_approx_eq!(cheapest, 3.0 * 2.0);

    // any device or any other operating system costs more
    let mut d = Decisions::open(&scenario, &c);
    for h in scenario.topology.hosts() {
        d.host(h, 4, &[]);
    }
    d.place(LinkId(2), DeviceId(3));
    assert!(real(&d.complete(), &c.vars.cost) > cheapest);
    for os in 1..=3 {
        let mut d = Decisions::open(&scenario, &c);
        for h in scenario.topology.hosts() {
            d.host(h, 4, &[]);
        }
        d.host(NodeId(1), os, &[]);
        let m = d.complete();
        assert_eq!(violated(&c, &m), Vec::<String>::new());
        assert!(real(&m, &c.vars.cost) > cheapest);
    }
}

#[test]
fn firewalls_everywhere() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.flows.require(Flow::new(1, 2));
    scenario.flows.require(Flow::new(2, 1));
    let c = build(&scenario, &SynthConfig::default()).unwrap();

    let mut d = Decisions::open(&scenario, &c);
    for l in scenario.topology.link_ids() {
        d.place(l, DeviceId::DENY);
    }
    // link 4 connects router 4 and 5, and carries both required flows
    d.place_all(LinkId(4), &[DeviceId::DENY, DeviceId(3)]);
    for f in scenario.topology.host_pairs() {
        if scenario.flows.is_required(f) {
            d.flow(f, true, DeviceId(3));
        } else {
            d.flow(f, false, DeviceId::DENY);
        }
    }
    let m = d.complete();
    assert_eq!(violated(&c, &m), Vec::<String>::new());

    // 5 firewalls, one IDS, three times OS 1
    assert_approx_eq!(real(&m, &c.vars.cost), 5.0 * 20.0 + 10.0 + 3.0 * 5.0);
    assert_approx_eq!(real(&m, c.vars.link_dev_cost.get((LinkId(4), DeviceId(3))).unwrap()), 10.0);
    assert_approx_eq!(real(&m, c.vars.link_dev_cost.get((LinkId(1), DeviceId(3))).unwrap()), 0.0);
    // denied flows are maximally resilient
    assert_approx_eq!(real(&m, c.vars.flow_res.get((Flow::new(1, 3), 0)).unwrap()), 100.0);
    // IDS isolation 4 with weight 7, diversity 2 with weight 3
    assert_approx_eq!(real(&m, c.vars.flow_res.get((Flow::new(1, 2), 0)).unwrap()), 34.0);
    // the firewall has no usability
    assert_approx_eq!(real(&m, c.vars.flow_iso_usa.get(Flow::new(1, 3)).unwrap()), 0.0);
    // IDS usability 6, scaled by the rank 10 of a required flow
    assert_approx_eq!(real(&m, c.vars.flow_iso_usa.get(Flow::new(1, 2)).unwrap()), 60.0);
}

#[test]
fn route_without_the_device() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let mut d = Decisions::open(&scenario, &c);
    // the IDS is not on the route 1 - 4 - 5 - 2
    d.place(LinkId(5), DeviceId(3));
    d.flow(Flow::new(1, 2), true, DeviceId(3));
    let v = violated(&c, &d.complete());
    assert_eq!(v.len(), 1);
    assert!(v[0].starts_with("route_dev_1_2_1_3@"));
}

#[test]
fn encryption_brackets_the_route() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    // route 1 - 4 - 5 - 6 - 3 uses the links 1, 4, 5, 3
    let enc = |links: &[usize]| {
        let mut d = Decisions::open(&scenario, &c);
        for l in links {
            d.place(LinkId(*l), DeviceId::ENCRYPTION);
        }
        d.flow(Flow::new(1, 3), true, DeviceId::ENCRYPTION);
        violated(&c, &d.complete())
    };
    assert!(enc(&[1, 3]).is_empty());
    assert!(enc(&[4, 5]).is_empty());
    let v = enc(&[1]);
    assert_eq!(v.len(), 1);
    assert!(v[0].starts_with("route_enc_1_3_1@"));
    assert_eq!(enc(&[2, 4]).len(), 1);
}

#[test]
fn required_flows() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.flows.require(Flow::new(1, 2));
    let c = build(&scenario, &SynthConfig::default()).unwrap();

    let mut d = Decisions::open(&scenario, &c);
    d.flow(Flow::new(1, 2), false, DeviceId::DENY);
    for l in scenario.topology.link_ids() {
        d.place(l, DeviceId::DENY);
    }
    let v = violated(&c, &d.complete());
    assert_eq!(v.len(), 1);
    assert!(v[0].starts_with("reach_1_2@"));

    // a reachable flow cannot use the deny pattern
    let mut d = Decisions::open(&scenario, &c);
    d.flow(Flow::new(2, 3), true, DeviceId::DENY);
    for l in scenario.topology.link_ids() {
        d.place(l, DeviceId::DENY);
    }
    let v = violated(&c, &d.complete());
    assert_eq!(v.len(), 1);
    assert!(v[0].starts_with("reach_msr_2_3@"));
}

#[test]
fn deny_unlisted_flows() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.flows.require(Flow::new(3, 1));
    let config = SynthConfig { deny_unlisted_flows: true, ..Default::default() };
    let c = build(&scenario, &config).unwrap();
    let v = violated(&c, &Decisions::open(&scenario, &c).complete());
    assert_eq!(v.len(), 5);
    assert!(v.iter().all(|n| n.starts_with("unlisted_")));
    assert!(!v.iter().any(|n| n.starts_with("unlisted_3_1@")));

    // without the option, unlisted flows are left to the solver
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    assert!(!c.assertions().iter().any(|a| a.name.starts_with("unlisted_")));
}

#[test]
fn diversity_cases_are_exclusive() {
    let scenario = line_scenario(2, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let families = [1, 1, 2, 2];
    let services: [(&[usize], &[usize]); 3] = [(&[], &[]), (&[1], &[1, 2]), (&[1], &[2])];
    for a in 1..=4 {
        for b in 1..=4 {
            for (sa, sb) in services.iter() {
                let mut d = Decisions::open(&scenario, &c);
                d.host(NodeId(1), a, sa).host(NodeId(2), b, sb);
                let m = d.complete();
                assert_eq!(violated(&c, &m), Vec::<String>::new());
                let shared = sa.iter().any(|s| sb.contains(s));
                let same_family = families[a - 1] == families[b - 1];
                let case = DiversityCase::classify(same_family, a == b, shared);
                let expected = scenario.policy.diversity.score(case);
                let div = real(&m, c.vars.flow_div.get(Flow::new(1, 2)).unwrap());
                assert_approx_eq!(div, expected);
            }
        }
    }
}

#[test]
fn two_hosts() {
    let scenario = line_scenario(2, default_policy()).unwrap();
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let m = Decisions::open(&scenario, &c).complete();
    assert_eq!(violated(&c, &m), Vec::<String>::new());
    // without intermediate hosts, every level repeats the direct resiliency
    let f = Flow::new(2, 1);
    let r0 = real(&m, c.vars.flow_res.get((f, 0)).unwrap());
    assert_approx_eq!(real(&m, c.vars.flow_res.get((f, 1)).unwrap()), r0);
    assert_approx_eq!(real(&m, c.vars.flow_res.get((f, 2)).unwrap()), r0);
    assert_approx_eq!(real(&m, c.vars.flow_res_ult.get(f).unwrap()), 6.0 * r0);
}

#[test]
fn ranks_scale_the_isolation_usability() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.flows.set_rank(Flow::new(1, 2), 2);
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let m = Decisions::open(&scenario, &c).complete();
    assert_approx_eq!(real(&m, c.vars.flow_iso_usa.get(Flow::new(1, 2)).unwrap()), 20.0);
    assert_approx_eq!(real(&m, c.vars.h_iso_usa.get(NodeId(2)).unwrap()), 30.0);
}

#[test]
fn thresholds() {
    let mut scenario = line_scenario(3, default_policy()).unwrap();
    scenario.sliders = Sliders { resiliency: 10.0, usability: 0.0, cost: 15 };
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let v = violated(&c, &Decisions::open(&scenario, &c).complete());
    assert_eq!(v.len(), 1);
    assert!(v[0].starts_with("target_res@"));

    scenario.sliders = Sliders { resiliency: 0.0, usability: 10.0, cost: 14 };
    let c = build(&scenario, &SynthConfig::default()).unwrap();
    let v = violated(&c, &Decisions::open(&scenario, &c).complete());
    assert_eq!(v.len(), 2);
    assert!(v[0].starts_with("target_usa@"));
    assert!(v[1].starts_with("target_cost@"));
}

#[test]
fn invalid_config_is_rejected() {
    let scenario = line_scenario(3, default_policy()).unwrap();
    let config = SynthConfig { transitivity_weights: vec![1], ..Default::default() };
    assert!(build(&scenario, &config).is_err());
}
