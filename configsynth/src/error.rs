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

//! Module containing all error types

use crate::config::ConfigError;
use crate::input::InputError;
use crate::smt::{EvalError, SolverError};
use crate::topology::TopologyError;
use crate::types::Flow;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// The input description is malformed
    #[error("Input Error: {0}")]
    InputError(#[from] InputError),
    /// The topology is invalid
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
    /// The configuration is invalid
    #[error("Configuration Error: {0}")]
    ConfigError(#[from] ConfigError),
    /// Error while talking to the solver
    #[error("Solver Error: {0}")]
    SolverError(#[from] SolverError),
    /// A model could not be evaluated
    #[error("Evaluation Error: {0}")]
    EvalError(#[from] EvalError),
    /// More simple paths exist for a flow than the configured route bound allows.
    #[error("Flow {flow} has more than {limit} routes")]
    TooManyRoutes {
        /// Flow for which the route table overflows
        flow: Flow,
        /// Configured bound
        limit: usize,
    },
    /// A symbolic variable was requested that was never declared
    #[error("Variable was never declared: {0}")]
    MissingVariable(String),
}
