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

use configsynth::builder::{build, ConstraintSet};
use configsynth::config::{RouteOverflow, SynthConfig};
use configsynth::enumerate::{Outcome, SolutionEnumerator};
use configsynth::example_networks::{generate, StarLevelNet, StarNet, TreeNet};
use configsynth::input::load_files;
use configsynth::printer;
use configsynth::scenario::Scenario;
use configsynth::smt::{SmtLibSolver, Solver};

use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use rand::prelude::*;
use std::error::Error;
use std::fs;
use std::time::{Duration, Instant};

mod stats;
use stats::Stats;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    match args.cmd {
        MainCommand::Synthesize(args) => synthesize(args)?,
        MainCommand::Generate {
            network,
            n_hosts,
            n_routers,
            seed,
            output,
            topology_output,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let scenario = match network {
                Network::Tree => generate::<TreeNet, _>(n_hosts, n_routers, &mut rng)?,
                Network::Star => generate::<StarNet, _>(n_hosts, n_routers, &mut rng)?,
                Network::StarLevel => generate::<StarLevelNet, _>(n_hosts, n_routers, &mut rng)?,
            };
            info!(
                "Generated {:?} network with {} hosts, {} routers and {} links",
                network,
                scenario.topology.num_hosts(),
                scenario.topology.num_routers(),
                scenario.topology.num_links()
            );
            match (output, topology_output) {
                (Some(policy), Some(topology)) => {
                    fs::write(policy, scenario.policy_string())?;
                    fs::write(topology, scenario.topology_string())?;
                }
                (Some(file), None) => fs::write(file, scenario.to_input_string())?,
                (None, _) => print!("{}", scenario.to_input_string()),
            }
        }
    }
    Ok(())
}

fn synthesize(args: SynthesizeArgs) -> Result<(), Box<dyn Error>> {
    let scenario = load_files(&args.input)?;
    let config = args.config();

    info!(
        "Problem with {} hosts, {} routers and {} links",
        scenario.topology.num_hosts(),
        scenario.topology.num_routers(),
        scenario.topology.num_links()
    );

    let start = Instant::now();
    let constraints = build(&scenario, &config)?;
    let build_time = start.elapsed();

    #[cfg(feature = "z3")]
    {
        if args.in_process {
            let ctx = z3::Context::new(&z3::Config::new());
            let solver = configsynth::smt::Z3Solver::new(&ctx, config.timeout_ms);
            return run(&args, &scenario, &config, &constraints, solver, build_time);
        }
    }
    #[cfg(not(feature = "z3"))]
    {
        if args.in_process {
            return Err("configsynth_main was built without the `z3` feature".into());
        }
    }

    let solver = match args.solver.as_ref() {
        Some(cmd) => SmtLibSolver::spawn(cmd, &args.solver_args, config.timeout_ms)?,
        None => SmtLibSolver::spawn_default(config.timeout_ms)?,
    };
    run(&args, &scenario, &config, &constraints, solver, build_time)
}

fn run<S: Solver>(
    args: &SynthesizeArgs,
    scenario: &Scenario,
    config: &SynthConfig,
    constraints: &ConstraintSet,
    solver: S,
    build_time: Duration,
) -> Result<(), Box<dyn Error>> {
    info!("Solving the problem...");
    let start = Instant::now();
    let outcome: Outcome =
        SolutionEnumerator::new(scenario, constraints, solver, config.max_solutions)?.run()?;
    let solve_time = start.elapsed();
    info!("Found {} solution(s) in {:?}", outcome.solutions.len(), solve_time);

    printer::print_report(scenario, &constraints.targets, &outcome);

    if let Some(file) = args.trace.as_ref() {
        fs::write(file, printer::trace(constraints, &outcome))?;
    }
    if let Some(file) = args.report.as_ref() {
        fs::write(file, printer::report(scenario, &constraints.targets, &outcome))?;
    }
    if let Some(file) = args.stats.as_ref() {
        Stats::new(&args.input, scenario, constraints, &outcome, build_time, solve_time)
            .append_to(file)?;
    }
    Ok(())
}

/// Synthesize network security configurations (security devices, operating systems and
/// services) that meet the resiliency, usability and cost requirements of a network.
#[derive(Parser, Debug)]
#[command(name = "ConfigSynth", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Synthesize configurations for a problem description
    #[command(name = "synthesize")]
    Synthesize(SynthesizeArgs),
    /// Generate a random problem description
    #[command(name = "generate")]
    Generate {
        /// Shape of the topology
        #[arg(value_enum)]
        network: Network,
        /// Number of hosts
        #[arg(short = 'n', long = "hosts", default_value_t = 20)]
        n_hosts: usize,
        /// Number of routers
        #[arg(short = 'r', long = "routers", default_value_t = 6)]
        n_routers: usize,
        /// Random seed, to get reproducable networks
        #[arg(short = 's', long)]
        seed: Option<u64>,
        /// Write the description (or only the policy part, if `--topology-output` is given) to
        /// this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,
        /// Write the topology part to a separate file
        #[arg(long, requires = "output")]
        topology_output: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct SynthesizeArgs {
    /// Input files, read in order as a single description
    #[arg(required = true)]
    input: Vec<String>,
    /// Number of solutions to enumerate
    #[arg(short = 'n', long, default_value_t = 1)]
    max_solutions: usize,
    /// Timeout of each solver call in milliseconds
    #[arg(short = 't', long, default_value_t = 1_800_000)]
    timeout_ms: u64,
    /// Weights of the transitivity levels, starting with the direct resiliency
    #[arg(short = 'w', long, value_delimiter = ',', default_values_t = vec![3, 2, 1])]
    weights: Vec<i64>,
    /// Maximum number of nodes on a route
    #[arg(long, default_value_t = 20)]
    max_path_len: usize,
    /// Maximum number of routes per flow
    #[arg(long, default_value_t = 5)]
    max_routes: usize,
    /// Keep the first routes of a flow with too many routes, instead of failing
    #[arg(long)]
    truncate_routes: bool,
    /// Deny all flows which are not required to be reachable
    #[arg(long)]
    deny_unlisted: bool,
    /// SMT solver executable, speaking SMT-LIB 2 on stdin and stdout
    #[arg(long)]
    solver: Option<String>,
    /// Arguments for the solver executable
    #[arg(long, allow_hyphen_values = true, requires = "solver")]
    solver_args: Vec<String>,
    /// Use the z3 library instead of an external solver (requires the `z3` feature)
    #[arg(long)]
    in_process: bool,
    /// Store the SMT-LIB trace of all assertions in a file
    #[arg(long)]
    trace: Option<String>,
    /// Store the report in a file
    #[arg(long)]
    report: Option<String>,
    /// Append the statistics of the run to a CSV file
    #[arg(long)]
    stats: Option<String>,
}

impl SynthesizeArgs {
    fn config(&self) -> SynthConfig {
        SynthConfig {
            max_solutions: self.max_solutions,
            timeout_ms: self.timeout_ms,
            transitivity_level: self.weights.len().saturating_sub(1),
            transitivity_weights: self.weights.clone(),
            max_path_len: self.max_path_len,
            max_routes: self.max_routes,
            route_overflow: if self.truncate_routes {
                RouteOverflow::Truncate
            } else {
                RouteOverflow::Reject
            },
            deny_unlisted_flows: self.deny_unlisted,
            ..Default::default()
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Network {
    /// Balanced tree of routers
    Tree,
    /// Routers around a single center
    Star,
    /// Two levels of routers around a center
    StarLevel,
}
