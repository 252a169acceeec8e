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

#![deny(missing_docs)]

//! # ConfigSynth: Synthesizing Resilient Network Security Configurations
//! This is a library for synthesizing the placement of security devices, the isolation of every
//! flow, and the software stack of every host in a network, such that the configuration is
//! resilient, usable and affordable at the same time.
//!
//! ## Problem Statement
//! Given
//! - a physical network of hosts and routers,
//! - a table of security devices, operating systems and services, each with an isolation or
//!   diversity score, a usability and a cost,
//! - the flows which must be reachable, and the services each host must run,
//! - three sliders for the requested resiliency, usability and cost,
//!
//! find a device placement, an isolation pattern for every flow, and an operating system and set
//! of services for every host, such that the resiliency and usability reach the requested level,
//! and the cost stays within the budget.
//!
//! ## Structure
//!
//! - **[`Topology`](topology)**: The physical network, and the enumeration of bounded simple
//!   routes between two hosts.
//!
//! - **[`Policy`](policy)**: Device, OS and diversity tables, and the flow and service
//!   requirements. Together with the topology and the sliders, they form a
//!   [`Scenario`](scenario::Scenario), which is read by the [`input`] loader.
//!
//! - **[`Builder`](builder)**: Translates a scenario into a
//!   [`ConstraintSet`](builder::ConstraintSet), which is a set of named assertions over integer,
//!   real and boolean variables.
//!
//! - **[`Smt`](smt)**: The solver-neutral term language and the [`Solver`](smt::Solver) trait,
//!   with a backend which talks SMT-LIB 2 to an external solver, and an in-process backend using
//!   the `z3` crate.
//!
//! - **[`Enumerate`](enumerate)**: Searches for solutions one after another, excluding every
//!   solution that was already found with a blocking clause.
//!
//! - **[`ExampleNetworks`](example_networks)**: Fixed and randomly generated scenarios.
//!
//! ## Features
//!
//! - *`z3`*: Enables the in-process solver backend `Z3Solver`.
//!
//! ## Usage
//!
//! ```no_run
//! use configsynth::config::SynthConfig;
//! use configsynth::input::load_files;
//! use configsynth::smt::SmtLibSolver;
//! use configsynth::{synthesize, Error};
//!
//! fn main() -> Result<(), Error> {
//!     let scenario = load_files(&["policy.txt", "topology.txt"])?;
//!     let config = SynthConfig::default();
//!     let solver = SmtLibSolver::spawn_default(config.timeout_ms)?;
//!
//!     let outcome = synthesize(&scenario, &config, solver)?;
//!     for solution in outcome.solutions.iter() {
//!         println!("{:#?}", solution);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod enumerate;
mod error;
pub mod example_networks;
pub mod input;
pub mod policy;
pub mod printer;
pub mod scenario;
pub mod smt;
mod test;
pub mod topology;
pub mod types;

mod synthesize;
pub use synthesize::synthesize;

pub use error::Error;
