use std::time::{Duration, Instant};

use log::{debug, info};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::Config;
use crate::error::PlanError;
use crate::matrix::Matrix2;
use crate::metrics::IterationRecord;
use crate::model::RoutingModel;
use crate::search::assignment::Assignment;
use crate::search::construction::{InsertionStats, construct, find_best_insertion};
use crate::types::{Cost, RideIdx};

/// Iterations without improvement before arc features get penalised.
const STAGNATION_LIMIT: u64 = 25;
/// Upper bound on rides relocated per iteration.
const MAX_RELOCATIONS: usize = 3;

/// Search budget and seeding.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub time_limit: Duration,
    pub max_iterations: u64,
    pub seed: u64,
}

impl SearchParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            time_limit: config.time_limit,
            max_iterations: u64::MAX,
            seed: config.seed,
        }
    }
}

/// Drives the solve: a cheapest-insertion first solution, then guided local
/// search over ride relocations until the wall-clock budget runs out.
///
/// Arc features of stagnating local optima are penalised so the search is
/// steered away from them; acceptance always compares the penalised
/// objective, the returned plan is the best by the true objective.
pub fn solve(
    model: &RoutingModel,
    params: &SearchParams,
    mut records: Option<&mut Vec<IterationRecord>>,
) -> Result<Assignment, PlanError> {
    let started = Instant::now();
    let mut incumbent = construct(model)?;
    let mut incumbent_cost = incumbent.cost(model);
    let mut best = incumbent.clone();
    let mut best_cost = incumbent_cost;
    info!(
        "first solution: cost {}, {} of {} rides dropped",
        best_cost,
        best.dropped_rides().len(),
        model.rides.len()
    );

    let n = model.n_nodes();
    let mut penalties = Matrix2::new(n, n, 0u32);
    let lambda = penalty_weight(model);
    let mut incumbent_penalized = incumbent_cost;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
    let mut stagnation = 0u64;

    let mut iteration = 0u64;
    while iteration < params.max_iterations && started.elapsed() < params.time_limit {
        iteration += 1;
        let mut stats = InsertionStats::default();

        let mut candidate = incumbent.clone();
        let moved = relocate_rides(&mut candidate, model, &mut rng);
        for &ride in &moved {
            if !candidate.is_dropped(ride) {
                continue;
            }
            if let Some(eval) = find_best_insertion(
                &mut candidate,
                model,
                ride,
                Some((&penalties, lambda)),
                &mut stats,
            ) {
                candidate.try_insert(model, eval.vehicle, ride, eval.pickup_pos, eval.delivery_pos);
            }
        }

        if !candidate.is_feasible(model) {
            // a removal can strand a pinned delivery behind its limits
            stagnation += 1;
            stats.infeasible += 1;
            continue;
        }

        let candidate_cost = candidate.cost(model);
        let candidate_penalized =
            candidate_cost + lambda * total_penalty(&candidate, model, &penalties);

        if candidate_penalized < incumbent_penalized {
            incumbent = candidate;
            incumbent_cost = candidate_cost;
            incumbent_penalized = candidate_penalized;
        } else {
            stagnation += 1;
        }

        if incumbent_cost < best_cost {
            best = incumbent.clone();
            best_cost = incumbent_cost;
            stagnation = 0;
            debug!("iteration {}: new best {}", iteration, best_cost);
        }

        if stagnation >= STAGNATION_LIMIT {
            penalize_worst_arcs(&incumbent, model, &mut penalties);
            incumbent_penalized =
                incumbent_cost + lambda * total_penalty(&incumbent, model, &penalties);
            stagnation = 0;
        }

        if let Some(records) = records.as_mut() {
            records.push(IterationRecord {
                iteration: iteration as usize,
                candidate_cost,
                incumbent_cost,
                best_cost,
                penalized_cost: candidate_penalized,
                dropped: incumbent.dropped_rides().len(),
                evaluations: stats.evaluated,
                infeasible: stats.infeasible,
                time: started.elapsed().as_secs_f64(),
            });
        }
    }

    info!(
        "search finished after {} iterations in {:.2?}: cost {}, {} dropped",
        iteration,
        started.elapsed(),
        best_cost,
        best.dropped_rides().len()
    );
    Ok(best)
}

/// Removes up to [`MAX_RELOCATIONS`] movable rides and queues them, plus
/// everything currently dropped, for reinsertion. Returned in pickup-window
/// order so the rebuild is deterministic.
fn relocate_rides(
    candidate: &mut Assignment,
    model: &RoutingModel,
    rng: &mut Xoshiro256PlusPlus,
) -> Vec<RideIdx> {
    let mut movable: Vec<RideIdx> = (0..model.rides.len())
        .filter(|&r| model.is_removable(r))
        .collect();
    if movable.is_empty() {
        return Vec::new();
    }
    movable.shuffle(rng);
    let count = (1 + rng.random_range(0..MAX_RELOCATIONS)).min(movable.len());
    for &ride in &movable[..count] {
        candidate.remove_ride(model, ride);
    }

    let mut queue = candidate.dropped_rides();
    queue.sort_by_key(|&r| (model.windows[model.rides[r].pickup].start, r));
    queue
}

/// The guided-local-search weight: a fraction of the mean arc distance, so a
/// few penalties on an arc weigh like a detour.
fn penalty_weight(model: &RoutingModel) -> Cost {
    let n = model.n_nodes();
    let mut total: Cost = 0;
    let mut count: Cost = 0;
    for i in 0..n {
        for j in 0..n {
            let d = model.distance(i, j);
            if d > 0 {
                total += d;
                count += 1;
            }
        }
    }
    if count == 0 { 1 } else { (total / count / 5).max(1) }
}

fn total_penalty(
    assignment: &Assignment,
    model: &RoutingModel,
    penalties: &Matrix2<u32>,
) -> Cost {
    assignment
        .arcs(model)
        .iter()
        .map(|&(i, j)| *penalties.get(i, j) as Cost)
        .sum()
}

/// Penalises the arcs of the current local optimum with the highest utility
/// `distance / (1 + penalty)`, the classic guided-local-search step.
fn penalize_worst_arcs(
    assignment: &Assignment,
    model: &RoutingModel,
    penalties: &mut Matrix2<u32>,
) {
    let arcs = assignment.arcs(model);
    if arcs.is_empty() {
        return;
    }
    let utilities: Vec<f64> = arcs
        .iter()
        .map(|&(i, j)| model.distance(i, j) as f64 / (1.0 + *penalties.get(i, j) as f64))
        .collect();
    let max = utilities.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return;
    }
    for (&(i, j), utility) in arcs.iter().zip(&utilities) {
        if (utility - max).abs() < f64::EPSILON {
            *penalties.get_mut(i, j) += 1;
        }
    }
}
