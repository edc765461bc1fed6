use log::debug;

use crate::error::PlanError;
use crate::matrix::Matrix2;
use crate::model::RoutingModel;
use crate::search::Assignment;
use crate::types::{Cost, RideIdx, VehicleIdx};

/// One evaluated insertion of a ride into the plan.
#[derive(Debug, Clone, Copy)]
pub struct InsertionEval {
    pub vehicle: VehicleIdx,
    pub pickup_pos: usize,
    pub delivery_pos: usize,
    pub delta: Cost,
}

/// Counters a search round keeps about its insertion attempts.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertionStats {
    pub evaluated: usize,
    pub infeasible: usize,
}

/// Evaluates every feasible insertion of `ride` over all compatible vehicles
/// and positions, returning the cheapest by objective delta (distance, span
/// and lateness; arc penalties on top when `penalty` is given). Ties resolve
/// to the lowest vehicle and earliest positions, so the scan is deterministic.
pub fn find_best_insertion(
    assignment: &mut Assignment,
    model: &RoutingModel,
    ride: RideIdx,
    penalty: Option<(&Matrix2<u32>, Cost)>,
    stats: &mut InsertionStats,
) -> Option<InsertionEval> {
    let mut best: Option<InsertionEval> = None;
    for vehicle in 0..model.vehicles.len() {
        if !model.is_compatible(vehicle, ride) {
            continue;
        }
        let before = assignment.schedule(model, vehicle);
        let old_distance = before.distance;
        let old_soft = before.soft_cost;
        let old_penalty = penalty
            .map(|(p, lambda)| lambda * route_penalty(assignment, model, vehicle, p))
            .unwrap_or(0);
        let span_base = assignment.max_distance_excluding(model, vehicle);
        let route_len = assignment.route(vehicle).len();

        for pickup_pos in 0..=route_len {
            for delivery_pos in pickup_pos..=route_len {
                stats.evaluated += 1;
                if !assignment.try_insert(model, vehicle, ride, pickup_pos, delivery_pos) {
                    stats.infeasible += 1;
                    continue;
                }
                let after = assignment.schedule(model, vehicle);
                let mut delta = if model.params.skip.distance_dim {
                    0
                } else {
                    let grown = after.distance;
                    (grown - old_distance)
                        + model.params.span_coefficient
                            * (span_base.max(grown) - span_base.max(old_distance))
                };
                delta += after.soft_cost - old_soft;
                if let Some((p, lambda)) = penalty {
                    delta += lambda * route_penalty(assignment, model, vehicle, p) - old_penalty;
                }

                if best.is_none_or(|b| delta < b.delta) {
                    best = Some(InsertionEval {
                        vehicle,
                        pickup_pos,
                        delivery_pos,
                        delta,
                    });
                }
                assignment.remove_ride(model, ride);
            }
        }
    }
    best
}

/// Sum of the guided-local-search penalties over one route's arcs.
fn route_penalty(
    assignment: &Assignment,
    model: &RoutingModel,
    vehicle: VehicleIdx,
    penalties: &Matrix2<u32>,
) -> Cost {
    let middle = assignment.route(vehicle);
    if middle.is_empty() {
        return 0;
    }
    let veh = &model.vehicles[vehicle];
    let mut total: Cost = 0;
    let mut prev = veh.start;
    for &node in middle {
        total += *penalties.get(prev, node) as Cost;
        prev = node;
    }
    total += *penalties.get(prev, veh.end) as Cost;
    total
}

/// Builds the first solution: pre-boarded deliveries are already pinned by
/// [`Assignment::new`]; remaining rides are inserted greedily at their
/// cheapest feasible position, earliest pickup windows first. Rides with no
/// feasible slot stay dropped.
pub fn construct(model: &RoutingModel) -> Result<Assignment, PlanError> {
    let mut assignment = Assignment::new(model);

    // A vehicle whose pinned delivery cannot be scheduled makes the whole
    // instance infeasible; there is no disjunction to fall back on.
    for k in 0..model.vehicles.len() {
        let schedule = assignment.schedule(model, k);
        if !schedule.is_feasible {
            return Err(PlanError::SolverInfeasible(format!(
                "pre-boarded delivery on vehicle {} cannot be scheduled: {}",
                model.vehicles[k].id,
                schedule.violation.clone().unwrap_or_default()
            )));
        }
    }

    let mut order: Vec<RideIdx> = (0..model.rides.len())
        .filter(|&r| model.rides[r].preboarded_on.is_none())
        .collect();
    order.sort_by_key(|&r| (model.windows[model.rides[r].pickup].start, r));

    let mut stats = InsertionStats::default();
    for ride in order {
        match find_best_insertion(&mut assignment, model, ride, None, &mut stats) {
            Some(eval) => {
                let inserted = assignment.try_insert(
                    model,
                    eval.vehicle,
                    ride,
                    eval.pickup_pos,
                    eval.delivery_pos,
                );
                debug_assert!(inserted, "evaluated insertion must stay feasible");
            }
            None => debug!("ride {} has no feasible slot in the first solution", ride),
        }
    }
    Ok(assignment)
}
