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

//! # Synthesis Configuration
//!
//! All knobs of the synthesis that are not part of the input description. The defaults reproduce
//! the reference constants: a slider scale of 10, weight fractions of 0.7 and 0.3, two
//! levels of transitivity with weights `[3, 2, 1]`, at most 5 routes of at most 20 nodes per flow,
//! a single solution and a solver timeout of 30 minutes.

use thiserror::Error;

/// What to do when a flow has more simple paths than `max_routes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOverflow {
    /// Abort the synthesis with [`crate::Error::TooManyRoutes`].
    Reject,
    /// Keep the first `max_routes` routes and log a warning.
    Truncate,
}

impl Default for RouteOverflow {
    fn default() -> Self {
        Self::Reject
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The slider scale must be positive
    #[error("The maximum slider value must be positive")]
    ZeroSliderScale,
    /// The number of transitivity weights does not match the transitivity level
    #[error("Transitivity level {level} requires {expected} weights, but {found} were given")]
    TransitivityWeights {
        /// Configured transitivity level
        level: usize,
        /// Expected number of weights (`level + 1`)
        expected: usize,
        /// Number of weights given
        found: usize,
    },
    /// A weight fraction is outside of `[0, 1]`
    #[error("Weight fraction {0} must be in [0, 1]")]
    InvalidFraction(f64),
    /// Paths need room for at least the two endpoints
    #[error("Maximum path length must be at least 2, found {0}")]
    PathLength(usize),
    /// At least one route per flow must be allowed
    #[error("At least one route per flow must be allowed")]
    ZeroRoutes,
    /// At least one solution must be requested
    #[error("At least one solution must be requested")]
    ZeroSolutions,
    /// The maximum isolation of the policy tables is zero, and the isolation weight cannot be
    /// normalized.
    #[error("The maximum isolation must be positive")]
    ZeroMaxIsolation,
    /// The average isolation usability of all flows is zero, and the usability weight cannot be
    /// normalized.
    #[error("The average isolation usability of all flows is zero")]
    DegenerateUsability,
}

/// # Synthesis Configuration
///
/// Use [`SynthConfig::default`] and override the fields that need to be changed. Call
/// [`SynthConfig::validate`] before using a configuration which was built by hand; the builder
/// does this as the first step anyways.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Scale of the sliders (`S`)
    pub max_slider: u32,
    /// Share of isolation in the resiliency of a flow
    pub res_isolation_fraction: f64,
    /// Share of diversity in the resiliency of a flow
    pub res_diversity_fraction: f64,
    /// Share of isolation in the usability of a host
    pub usa_isolation_fraction: f64,
    /// Share of diversity in the usability of a host
    pub usa_diversity_fraction: f64,
    /// Number of transitivity levels (`L`) considered on top of the direct resiliency.
    pub transitivity_level: usize,
    /// Weight of each transitivity level, `transitivity_level + 1` entries.
    pub transitivity_weights: Vec<i64>,
    /// Maximum number of nodes on a route, including both hosts
    pub max_path_len: usize,
    /// Maximum number of routes per flow
    pub max_routes: usize,
    /// What to do if a flow has more routes than `max_routes`
    pub route_overflow: RouteOverflow,
    /// Number of solutions to enumerate
    pub max_solutions: usize,
    /// Timeout of each solver call in milliseconds
    pub timeout_ms: u64,
    /// If set, all flows not listed as required are forced to be denied. Otherwise, the solver may
    /// choose to allow them.
    pub deny_unlisted_flows: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_slider: 10,
            res_isolation_fraction: 0.7,
            res_diversity_fraction: 0.3,
            usa_isolation_fraction: 0.7,
            usa_diversity_fraction: 0.3,
            transitivity_level: 2,
            transitivity_weights: vec![3, 2, 1],
            max_path_len: 20,
            max_routes: 5,
            route_overflow: RouteOverflow::Reject,
            max_solutions: 1,
            timeout_ms: 1_800_000,
            deny_unlisted_flows: false,
        }
    }
}

impl SynthConfig {
    /// Check that the configuration is consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slider == 0 {
            return Err(ConfigError::ZeroSliderScale);
        }
        if self.transitivity_weights.len() != self.transitivity_level + 1 {
            return Err(ConfigError::TransitivityWeights {
                level: self.transitivity_level,
                expected: self.transitivity_level + 1,
                found: self.transitivity_weights.len(),
            });
        }
        for f in [
            self.res_isolation_fraction,
            self.res_diversity_fraction,
            self.usa_isolation_fraction,
            self.usa_diversity_fraction,
        ]
        .iter()
        {
            if !(0.0..=1.0).contains(f) {
                return Err(ConfigError::InvalidFraction(*f));
            }
        }
        if self.max_path_len < 2 {
            return Err(ConfigError::PathLength(self.max_path_len));
        }
        if self.max_routes == 0 {
            return Err(ConfigError::ZeroRoutes);
        }
        if self.max_solutions == 0 {
            return Err(ConfigError::ZeroSolutions);
        }
        Ok(())
    }

    /// Initial isolation weight of the resiliency, `⌊res_isolation_fraction · S⌋`.
    pub fn isolation_weight(&self) -> i64 {
        floor_scaled(self.res_isolation_fraction, self.max_slider)
    }

    /// Diversity weight of the resiliency, `⌊res_diversity_fraction · S⌋`.
    pub fn diversity_weight(&self) -> i64 {
        floor_scaled(self.res_diversity_fraction, self.max_slider)
    }

    /// Initial isolation weight of the usability, `⌊usa_isolation_fraction · S⌋`.
    pub fn iso_usability_weight(&self) -> i64 {
        floor_scaled(self.usa_isolation_fraction, self.max_slider)
    }

    /// Diversity weight of the usability, `⌊usa_diversity_fraction · S⌋`.
    pub fn div_usability_weight(&self) -> i64 {
        floor_scaled(self.usa_diversity_fraction, self.max_slider)
    }
}

fn floor_scaled(fraction: f64, scale: u32) -> i64 {
    (fraction * scale as f64).floor() as i64
}
