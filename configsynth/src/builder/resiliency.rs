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

//! Resiliency and usability model. The resiliency of a flow combines its isolation and diversity,
//! and is propagated transitively through intermediate hosts.

use super::{Assertions, SynthVars, Targets};
use crate::config::SynthConfig;
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::types::{host_pairs, Flow};
use crate::Error;

pub(super) fn emit(
    scenario: &Scenario,
    config: &SynthConfig,
    targets: &Targets,
    vars: &SynthVars,
    out: &mut Assertions,
) -> Result<(), Error> {
    let n_hosts = scenario.topology.num_hosts();
    let iw = Term::real(targets.isolation_weight as f64);
    let dw = Term::real(targets.diversity_weight as f64);

    // level 0: a denied flow is fully resilient
    for f in host_pairs(n_hosts) {
        out.add(
            format!("res0_deny_{}_{}", f.src.0, f.dst.0),
            vars.reachable
                .term(f)?
                .not()
                .implies(vars.flow_res.term((f, 0))?.eq(Term::real(targets.max_flow_res as f64))),
        );
    }

    for f in host_pairs(n_hosts) {
        let res = Term::add(vec![
            Term::mul(vec![vars.flow_iso.term(f)?, iw.clone()]),
            Term::mul(vec![vars.flow_div.term(f)?, dw.clone()]),
        ]);
        out.add(
            format!("res0_{}_{}", f.src.0, f.dst.0),
            vars.reachable.term(f)?.implies(vars.flow_res.term((f, 0))?.eq(res)),
        );
    }

    for l in 1..=config.transitivity_level {
        for f in host_pairs(n_hosts) {
            let current = vars.flow_res.term((f, l))?;
            let value = if n_hosts > 2 {
                let mut terms = Vec::with_capacity(n_hosts - 2);
                for k in scenario.topology.hosts().filter(|k| *k != f.src && *k != f.dst) {
                    terms.push(Term::add(vec![
                        vars.flow_res.term((Flow { src: f.src, dst: k }, l - 1))?,
                        vars.flow_res.term((Flow { src: k, dst: f.dst }, 0))?,
                    ]));
                }
                Term::add(terms).div(Term::real((2 * (n_hosts - 2)) as f64))
            } else {
                // no intermediate host
                vars.flow_res.term((f, l - 1))?
            };
            out.add(format!("res{}_{}_{}", l, f.src.0, f.dst.0), current.eq(value));
        }
    }

    for f in host_pairs(n_hosts) {
        let levels = config
            .transitivity_weights
            .iter()
            .enumerate()
            .map(|(l, w)| -> Result<Term, Error> {
                Ok(Term::mul(vec![vars.flow_res.term((f, l))?, Term::real(*w as f64)]))
            })
            .collect::<Result<Vec<Term>, Error>>()?;
        out.add(
            format!("res_ult_{}_{}", f.src.0, f.dst.0),
            vars.flow_res_ult.term(f)?.eq(Term::real_sum(levels)),
        );
    }

    for h in scenario.topology.hosts() {
        let mut incoming = Vec::with_capacity(n_hosts - 1);
        for j in scenario.topology.hosts().filter(|j| *j != h) {
            incoming.push(vars.flow_res_ult.term(Flow { src: j, dst: h })?);
        }
        out.add(format!("h_res_{}", h.0), vars.h_res.term(h)?.eq(Term::real_sum(incoming)));
    }

    let iuw = Term::real(targets.iso_usability_weight as f64);
    let div_factor = Term::real(((n_hosts - 1) as i64 * targets.div_usability_weight) as f64);
    for h in scenario.topology.hosts() {
        let usa = Term::add(vec![
            Term::mul(vec![vars.h_iso_usa.term(h)?, iuw.clone()]),
            Term::mul(vec![vars.h_div_usa.term(h)?, div_factor.clone()]),
        ]);
        out.add(format!("h_res_usa_{}", h.0), vars.h_res_usa.term(h)?.eq(usa));
    }

    let mut res = Vec::with_capacity(n_hosts);
    let mut usa = Vec::with_capacity(n_hosts);
    for h in scenario.topology.hosts() {
        res.push(vars.h_res.term(h)?);
        usa.push(vars.h_res_usa.term(h)?);
    }
    out.add("resiliency", vars.resiliency.term().eq(Term::real_sum(res)));
    out.add("usability", vars.usability.term().eq(Term::real_sum(usa)));

    Ok(())
}
