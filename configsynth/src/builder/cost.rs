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

//! Cost model: legal device placements on links, the cost of every placed device and of every
//! operating system installation.

use super::{Assertions, SynthVars};
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::types::DeviceId;
use crate::Error;

pub(super) fn emit(
    scenario: &Scenario,
    vars: &SynthVars,
    out: &mut Assertions,
) -> Result<(), Error> {
    let devices = &scenario.policy.devices;

    for l in scenario.topology.link_ids() {
        let any = devices
            .ids()
            .map(|d| vars.dev_in_link.term((l, d)))
            .collect::<Result<Vec<Term>, Error>>()?;
        out.add(format!("link_dev_{}", l.0), Term::or(any));
    }

    for l in scenario.topology.link_ids() {
        let none = devices
            .deployable()
            .map(|d| vars.dev_in_link.term((l, d)).map(Term::not))
            .collect::<Result<Vec<Term>, Error>>()?;
        out.add(
            format!("link_none_{}", l.0),
            vars.dev_in_link.term((l, DeviceId::NONE))?.implies(Term::and(none)),
        );
    }

    for l in scenario.topology.link_ids() {
        for (d, dev) in devices.iter().skip(1) {
            let cost = vars.link_dev_cost.term((l, d))?;
            out.add(
                format!("link_cost_{}_{}", l.0, d.0),
                vars.dev_in_link.term((l, d))?.ite(
                    cost.clone().eq(Term::real(dev.cost)),
                    cost.eq(Term::real(0.0)),
                ),
            );
        }
    }

    for h in scenario.topology.hosts() {
        for (id, os) in scenario.policy.os.iter() {
            out.add(
                format!("os_cost_{}_{}", h.0, id.0),
                vars.h_os
                    .term(h)?
                    .eq(Term::int(id.0 as i64))
                    .implies(vars.h_os_cost.term(h)?.eq(Term::real(os.cost))),
            );
        }
    }

    let mut terms = Vec::new();
    for l in scenario.topology.link_ids() {
        for d in devices.deployable() {
            terms.push(vars.link_dev_cost.term((l, d))?);
        }
    }
    for h in scenario.topology.hosts() {
        terms.push(vars.h_os_cost.term(h)?);
    }
    out.add("cost", vars.cost.term().eq(Term::real_sum(terms)));

    Ok(())
}
