//! # ConfigSynth
//! Wrapper function to synthesize security configurations

use crate::builder::build;
use crate::config::SynthConfig;
use crate::enumerate::{Outcome, SolutionEnumerator};
use crate::scenario::Scenario;
use crate::smt::Solver;
use crate::Error;

use log::*;

/// # Synthesize Security Configurations
///
/// This is the main function to interact with the system. It builds the constraint set of the
/// scenario, submits it to the solver, and enumerates up to `config.max_solutions` solutions. The
/// solver must be fresh, since all constraints are added to it.
///
/// ```no_run
/// use configsynth::config::SynthConfig;
/// use configsynth::example_networks::{generate, TreeNet};
/// use configsynth::smt::SmtLibSolver;
/// use configsynth::{synthesize, Error};
/// use rand::prelude::*;
///
/// fn main() -> Result<(), Error> {
///     let scenario = generate::<TreeNet, _>(10, 4, &mut StdRng::seed_from_u64(0))?;
///     let config = SynthConfig { max_solutions: 3, ..Default::default() };
///     let solver = SmtLibSolver::spawn_default(config.timeout_ms)?;
///
///     let outcome = synthesize(&scenario, &config, solver)?;
///     println!("found {} solutions", outcome.solutions.len());
///
///     Ok(())
/// }
/// ```
pub fn synthesize<S: Solver>(
    scenario: &Scenario,
    config: &SynthConfig,
    solver: S,
) -> Result<Outcome, Error> {
    let constraints = build(scenario, config)?;

    info!("Solving the problem...");

    let enumerator = SolutionEnumerator::new(scenario, &constraints, solver, config.max_solutions)?;
    let outcome = enumerator.run()?;

    if outcome.is_sat() {
        info!("Found {} solutions", outcome.solutions.len());
    } else {
        warn!("Could not solve the problem");
    }
    Ok(outcome)
}
