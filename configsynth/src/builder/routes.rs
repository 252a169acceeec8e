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

//! Routes of every flow, and the devices which must be deployed along a route for the flow to use
//! an isolation pattern.

use super::{Assertions, SynthVars};
use crate::config::{RouteOverflow, SynthConfig};
use crate::scenario::Scenario;
use crate::smt::Term;
use crate::topology::Route;
use crate::types::{all_flows, host_pairs, DeviceId, Flow, LinkId};
use crate::Error;

use log::*;
use std::collections::BTreeMap;

/// Enumerate the routes of `flow`, applying the route bound of the configuration.
pub(super) fn flow_routes(
    scenario: &Scenario,
    config: &SynthConfig,
    flow: Flow,
) -> Result<Vec<Route>, Error> {
    let mut routes: Vec<Route> = scenario
        .topology
        .paths(flow.src, flow.dst, config.max_path_len)
        .take(config.max_routes + 1)
        .collect();
    if routes.len() > config.max_routes {
        match config.route_overflow {
            RouteOverflow::Reject => {
                return Err(Error::TooManyRoutes { flow, limit: config.max_routes })
            }
            RouteOverflow::Truncate => {
                warn!(
                    "Flow {} has more than {} routes, ignoring the rest",
                    flow, config.max_routes
                );
                routes.truncate(config.max_routes);
            }
        }
    }
    Ok(routes)
}

pub(super) fn emit(
    scenario: &Scenario,
    config: &SynthConfig,
    vars: &mut SynthVars,
    out: &mut Assertions,
) -> Result<BTreeMap<Flow, Vec<Route>>, Error> {
    let n_hosts = scenario.topology.num_hosts();
    let n_dev = scenario.policy.num_devices() as i64;
    let mut result = BTreeMap::new();

    for h in scenario.topology.hosts() {
        out.add(
            format!("all_routes_self_{}", h.0),
            vars.dev_in_all_flow_routes.term(Flow { src: h, dst: h })?.eq(Term::int(0)),
        );
    }

    for f in host_pairs(n_hosts) {
        let routes = flow_routes(scenario, config, f)?;
        trace!("Flow {}: {} routes", f, routes.len());

        let mut same_device = Vec::with_capacity(routes.len());
        for (idx, route) in routes.iter().enumerate() {
            let r = idx + 1;
            let tag = format!("{}_{}_{}", f.src.0, f.dst.0, r);
            let dfr = vars.declare_route(f, r).term();

            let range = dfr.clone().within(Term::int(0), Term::int(n_dev));
            out.add(format!("route_range_{}", tag), range);

            for d in scenario.policy.devices.deployable() {
                if d == DeviceId::ENCRYPTION {
                    continue;
                }
                let on_route = route
                    .links()
                    .iter()
                    .map(|l| vars.dev_in_link.term((*l, d)))
                    .collect::<Result<Vec<Term>, Error>>()?;
                out.add(
                    format!("route_dev_{}_{}", tag, d.0),
                    dfr.clone().eq(Term::int(d.0 as i64)).implies(Term::or(on_route)),
                );
            }

            if n_dev >= DeviceId::ENCRYPTION.0 as i64 {
                out.add(
                    format!("route_enc_{}", tag),
                    encryption_rule(vars, route, dfr.clone())?,
                );
            }

            same_device.push(vars.dev_in_all_flow_routes.term(f)?.eq(dfr));
        }

        let all_routes = vars.dev_in_all_flow_routes.term(f)?;
        if same_device.is_empty() {
            out.add(format!("all_routes_{}_{}", f.src.0, f.dst.0), all_routes.eq(Term::int(0)));
        } else {
            out.add(format!("all_routes_{}_{}", f.src.0, f.dst.0), Term::and(same_device));
        }

        result.insert(f, routes);
    }

    for f in all_flows(n_hosts) {
        let msr = vars.flow_iso_msr.term(f)?;
        out.add(
            format!("iso_routes_{}_{}", f.src.0, f.dst.0),
            msr.clone().gt(Term::int(0)).implies(vars.dev_in_all_flow_routes.term(f)?.eq(msr)),
        );
    }

    for f in all_flows(n_hosts) {
        out.add(
            format!("all_routes_range_{}_{}", f.src.0, f.dst.0),
            vars.dev_in_all_flow_routes.term(f)?.within(Term::int(0), Term::int(n_dev)),
        );
    }

    Ok(result)
}

/// The encryption-class device must sit at both ends of the route: within the first two and the
/// last two links of a route with four or more nodes, or on the first and the last link of a
/// shorter route.
fn encryption_rule(vars: &SynthVars, route: &Route, dfr: Term) -> Result<Term, Error> {
    let enc = |l: LinkId| vars.dev_in_link.term((l, DeviceId::ENCRYPTION));
    let uses_enc = dfr.eq(Term::int(DeviceId::ENCRYPTION.0 as i64));
    let links = route.links();
    let n = links.len();
    Ok(if route.len() >= 4 {
        uses_enc.implies(Term::and(vec![
            Term::or(vec![enc(links[0])?, enc(links[1])?]),
            Term::or(vec![enc(links[n - 1])?, enc(links[n - 2])?]),
        ]))
    } else if route.len() >= 2 {
        uses_enc.implies(Term::and(vec![enc(links[0])?, enc(links[n - 1])?]))
    } else {
        uses_enc.not()
    })
}
