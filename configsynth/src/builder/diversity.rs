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

//! Diversity model: operating system and services of every host, the diversity score of every
//! reachable flow, and the OS usability of every host.

use super::{Assertions, SynthVars};
use crate::policy::DiversityCase;
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::types::host_pairs;
use crate::Error;

pub(super) fn emit(
    scenario: &Scenario,
    vars: &SynthVars,
    out: &mut Assertions,
) -> Result<(), Error> {
    let os = &scenario.policy.os;
    let n_os = os.num_os() as i64;

    for h in scenario.topology.hosts() {
        for s in scenario.services.services(h) {
            out.add(format!("serv_{}_{}", h.0, s.0), vars.h_serv.term((h, s))?);
        }
    }

    for h in scenario.topology.hosts() {
        let h_os = vars.h_os.term(h)?;
        out.add(format!("os_range_{}", h.0), h_os.within(Term::int(1), Term::int(n_os)));
    }

    for h in scenario.topology.hosts() {
        for (id, _) in os.iter() {
            out.add(
                format!("os_family_{}_{}", h.0, id.0),
                vars.h_os
                    .term(h)?
                    .eq(Term::int(id.0 as i64))
                    .implies(vars.h_os_family.term(h)?.eq(Term::int(os.family_code(id)))),
            );
        }
    }

    for f in host_pairs(scenario.topology.num_hosts()) {
        let (i, j) = (f.src, f.dst);
        let shared = Term::or(
            scenario
                .policy
                .services()
                .map(|s| -> Result<Term, Error> {
                    Ok(Term::and(vec![vars.h_serv.term((i, s))?, vars.h_serv.term((j, s))?]))
                })
                .collect::<Result<Vec<Term>, Error>>()?,
        );
        let same_family = vars.h_os_family.term(i)?.eq(vars.h_os_family.term(j)?);
        let same_os = vars.h_os.term(i)?.eq(vars.h_os.term(j)?);
        let reach = vars.reachable.term(f)?;

        for case in DiversityCase::ALL.iter() {
            let serv = if case.shares_service() { shared.clone() } else { shared.clone().not() };
            let cond = match case {
                DiversityCase::DiffFamilyDiffServ | DiversityCase::DiffFamilySameServ => {
                    vec![reach.clone(), same_family.clone().not(), serv]
                }
                DiversityCase::SameFamilyDiffServ | DiversityCase::SameFamilySameServ => {
                    vec![reach.clone(), same_family.clone(), same_os.clone().not(), serv]
                }
                DiversityCase::SameOsDiffServ | DiversityCase::SameOsSameServ => {
                    vec![reach.clone(), same_os.clone(), serv]
                }
            };
            out.add(
                format!("div_{}_{}_{}", i.0, j.0, case.index() + 1),
                Term::and(cond).implies(
                    vars.flow_div.term(f)?.eq(Term::real(scenario.policy.diversity.score(*case))),
                ),
            );
        }
    }

    for h in scenario.topology.hosts() {
        for (id, o) in os.iter() {
            out.add(
                format!("div_usa_{}_{}", h.0, id.0),
                vars.h_os
                    .term(h)?
                    .eq(Term::int(id.0 as i64))
                    .implies(vars.h_div_usa.term(h)?.eq(Term::real(o.usability))),
            );
        }
    }

    Ok(())
}
