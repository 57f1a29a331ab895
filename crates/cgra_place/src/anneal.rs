//! Generic simulated-annealing driver.
//!
//! All placers share one annealing loop contract: a mutable state, a
//! `propose` that perturbs it in place, and an `energy` that scores it.
//! The driver owns the only RNG, applies a geometric cooling schedule,
//! accepts worsening moves with the Metropolis probability
//! `exp(-delta / T)`, and tracks the best state seen so far, restoring
//! it at termination.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// A geometric cooling schedule.
///
/// Temperature decays by a constant factor each step so that it moves
/// from `t_max` to `t_min` over exactly `steps` iterations.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Initial temperature.
    pub t_max: f64,
    /// Final temperature.
    pub t_min: f64,
    /// Number of annealing iterations.
    pub steps: usize,
}

impl Schedule {
    /// Creates a schedule from explicit parameters.
    pub fn new(t_max: f64, t_min: f64, steps: usize) -> Self {
        Self {
            t_max,
            t_min,
            steps,
        }
    }

    /// The per-step cooling multiplier `(t_min / t_max)^(1 / steps)`.
    fn cooling_factor(&self) -> f64 {
        (self.t_min / self.t_max).powf(1.0 / self.steps.max(1) as f64)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            t_max: 25_000.0,
            t_min: 2.5,
            steps: 50_000,
        }
    }
}

/// A mutable annealing state.
///
/// `propose` perturbs the state in place and returns an undo token; the
/// driver calls [`revert`](Self::revert) with that token when the move is
/// rejected. Returning `None` means the drawn move was illegal and the
/// state is unchanged — the driver skips the energy evaluation entirely.
pub trait AnnealState {
    /// Information needed to undo one proposed move.
    type Undo;
    /// A cheap copy of the mutable placement assignment, used for
    /// best-state tracking.
    type Snapshot: Clone + Send;

    /// Perturbs the state in place. Returns `None` if the drawn move was
    /// not applicable (the state must then be unchanged).
    fn propose(&mut self, rng: &mut StdRng) -> Option<Self::Undo>;

    /// Undoes the most recent accepted-by-`propose` mutation.
    fn revert(&mut self, undo: Self::Undo);

    /// Returns the scalar cost of the current state.
    fn energy(&self) -> f64;

    /// Captures the current assignment.
    fn snapshot(&self) -> Self::Snapshot;

    /// Restores a previously captured assignment.
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// The outcome of one annealing run.
#[derive(Debug, Clone)]
pub struct Annealed<S> {
    /// The best assignment observed.
    pub snapshot: S,
    /// Energy of the best assignment.
    pub energy: f64,
    /// Energy of the state the run started from.
    pub initial_energy: f64,
    /// Number of accepted moves.
    pub accepted: u64,
    /// Number of rejected moves.
    pub rejected: u64,
}

/// The annealing driver: schedule plus RNG seed.
#[derive(Debug, Clone)]
pub struct Annealer {
    /// The cooling schedule.
    pub schedule: Schedule,
    /// Seed for the driver-owned RNG.
    pub seed: u64,
}

impl Annealer {
    /// Creates a driver with the given schedule and seed 0.
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule, seed: 0 }
    }

    /// Creates a driver with an explicit seed.
    pub fn with_seed(schedule: Schedule, seed: u64) -> Self {
        Self { schedule, seed }
    }

    /// Runs one annealing chain to completion.
    ///
    /// On return the state holds the best assignment observed, so the
    /// result energy is never worse than the initial energy. The optional
    /// `cancel` flag is checked between iterations; on cancellation the
    /// best state so far is returned.
    pub fn run<A: AnnealState>(&self, state: &mut A, cancel: Option<&AtomicBool>) -> Annealed<A::Snapshot> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let cooling = self.schedule.cooling_factor();
        let mut temperature = self.schedule.t_max;

        let initial_energy = state.energy();
        let mut energy = initial_energy;
        let mut best = state.snapshot();
        let mut best_energy = energy;
        let mut accepted = 0;
        let mut rejected = 0;

        for _ in 0..self.schedule.steps {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
            }
            if let Some(undo) = state.propose(&mut rng) {
                let proposed = state.energy();
                let delta = proposed - energy;
                if delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp() {
                    energy = proposed;
                    accepted += 1;
                    if energy < best_energy {
                        best_energy = energy;
                        best = state.snapshot();
                    }
                } else {
                    state.revert(undo);
                    rejected += 1;
                }
            }
            temperature *= cooling;
        }

        state.restore(best.clone());
        Annealed {
            snapshot: best,
            energy: best_energy,
            initial_energy,
            accepted,
            rejected,
        }
    }

    /// Runs several independent annealing chains in parallel and returns
    /// the best outcome.
    ///
    /// Each chain clones the template state and anneals with its own seed
    /// (`seed + chain_index`), so there is no shared mutable state. Ties
    /// on energy resolve to the lowest chain index, keeping the result
    /// deterministic.
    pub fn run_chains<A>(
        &self,
        template: &A,
        chains: usize,
        cancel: Option<&AtomicBool>,
    ) -> Annealed<A::Snapshot>
    where
        A: AnnealState + Clone + Send + Sync,
    {
        let results: Vec<(usize, Annealed<A::Snapshot>)> = (0..chains.max(1))
            .into_par_iter()
            .map(|index| {
                let mut state = template.clone();
                let chain = Annealer {
                    schedule: self.schedule.clone(),
                    seed: self.seed.wrapping_add(index as u64),
                };
                (index, chain.run(&mut state, cancel))
            })
            .collect();

        results
            .into_iter()
            .min_by(|(ia, a), (ib, b)| {
                a.energy
                    .partial_cmp(&b.energy)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ia.cmp(ib))
            })
            .map(|(_, outcome)| outcome)
            .expect("at least one chain runs")
    }
}
