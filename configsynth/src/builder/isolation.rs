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

//! Reachability and isolation model: which pattern is applied to every flow, and the resulting
//! isolation score and isolation usability.

use super::{Assertions, SynthVars};
use crate::config::SynthConfig;
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::types::{all_flows, DeviceId, Flow};
use crate::Error;

pub(super) fn emit(
    scenario: &Scenario,
    config: &SynthConfig,
    vars: &SynthVars,
    out: &mut Assertions,
) -> Result<(), Error> {
    let n_hosts = scenario.topology.num_hosts();
    let n_dev = scenario.policy.num_devices() as i64;
    let deny = Term::int(DeviceId::DENY.0 as i64);

    // reachability requirements
    for f in all_flows(n_hosts) {
        let (i, j) = (f.src.0, f.dst.0);
        let reach = vars.reachable.term(f)?;
        if f.is_self_flow() {
            out.add(format!("reach_self_{}", i), reach);
            out.add(
                format!("msr_self_{}", i),
                vars.flow_iso_msr.term(f)?.eq(Term::int(DeviceId::NONE.0 as i64)),
            );
        } else if scenario.flows.is_required(f) {
            out.add(format!("reach_{}_{}", i, j), reach);
        } else if config.deny_unlisted_flows {
            out.add(format!("unlisted_{}_{}", i, j), reach.not());
        }
    }

    for f in all_flows(n_hosts) {
        let (i, j) = (f.src.0, f.dst.0);
        out.add(
            format!("reach_msr_{}_{}", i, j),
            vars.reachable.term(f)?.implies(vars.flow_iso_msr.term(f)?.eq(deny.clone()).not()),
        );
    }

    for f in all_flows(n_hosts) {
        let (i, j) = (f.src.0, f.dst.0);
        out.add(
            format!("deny_msr_{}_{}", i, j),
            vars.reachable.term(f)?.not().implies(vars.flow_iso_msr.term(f)?.eq(deny.clone())),
        );
    }

    for f in all_flows(n_hosts) {
        out.add(
            format!("msr_range_{}_{}", f.src.0, f.dst.0),
            vars.flow_iso_msr.term(f)?.within(Term::int(0), Term::int(n_dev)),
        );
    }

    for f in all_flows(n_hosts) {
        for (k, dev) in scenario.policy.devices.iter() {
            out.add(
                format!("iso_{}_{}_{}", f.src.0, f.dst.0, k.0),
                vars.flow_iso_msr
                    .term(f)?
                    .eq(Term::int(k.0 as i64))
                    .implies(vars.flow_iso.term(f)?.eq(Term::real(dev.isolation))),
            );
        }
    }

    for f in all_flows(n_hosts) {
        let rank = scenario.flows.rank(f) as f64;
        for (k, dev) in scenario.policy.devices.iter() {
            out.add(
                format!("iso_usa_{}_{}_{}", f.src.0, f.dst.0, k.0),
                vars.flow_iso_msr
                    .term(f)?
                    .eq(Term::int(k.0 as i64))
                    .implies(vars.flow_iso_usa.term(f)?.eq(Term::real(dev.usability * rank))),
            );
        }
    }

    // isolation usability of a host, over all incoming flows
    for h in scenario.topology.hosts() {
        let incoming = scenario
            .topology
            .hosts()
            .filter(|j| *j != h)
            .map(|j| vars.flow_iso_usa.term(Flow { src: j, dst: h }))
            .collect::<Result<Vec<Term>, Error>>()?;
        out.add(
            format!("h_iso_usa_{}", h.0),
            vars.h_iso_usa.term(h)?.eq(Term::real_sum(incoming)),
        );
    }

    Ok(())
}
