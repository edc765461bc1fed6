use log::info;

use crate::config::{Config, ELECTRIC_RAMP_TAG};
use crate::error::PlanError;
use crate::matrix::{Matrix2, TravelMatrices};
use crate::model::{ModelParams, RideModel, RoutingModel, VehicleModel};
use crate::problem::{NormalizedProblem, Problem};
use crate::types::Seconds;

/// Derives the full constraint instance from the normalized problem and the
/// travel matrices: service times, effective windows, demands, compatibility,
/// drop penalties, pre-boarded forcings and rest requirements.
pub fn build_model(
    problem: &Problem,
    normalized: &NormalizedProblem,
    matrices: TravelMatrices,
    config: &Config,
) -> Result<RoutingModel, PlanError> {
    let n_nodes = normalized.n_nodes();
    if matrices.n_nodes() != n_nodes {
        return Err(PlanError::SolverInvalid(format!(
            "travel matrices cover {} nodes, problem has {}",
            matrices.n_nodes(),
            n_nodes
        )));
    }

    let skip = config.skip;
    let drop_cost = if skip.drop_penalty {
        0
    } else {
        // one disjunction per ride, scaled by its pickup+delivery group
        config.drop_penalty * 2
    };

    let mut rides: Vec<RideModel> = (0..normalized.n_rides)
        .map(|r| RideModel {
            pickup: normalized.pickup_node(r),
            delivery: normalized.delivery_node(r),
            preboarded_on: None,
            drop_cost,
        })
        .collect();

    let mut vehicles = Vec::with_capacity(normalized.n_vehicles);
    for (k, vehicle) in problem.vehicles.iter().enumerate() {
        let shift = vehicle.time_window;
        vehicles.push(VehicleModel {
            id: vehicle.id.clone(),
            start: normalized.vehicle_starts[k],
            end: normalized.vehicle_ends[k],
            shift,
            start_window: shift.intersect(&vehicle.depot_start.time_window),
            end_window: shift.intersect(&vehicle.depot_end.time_window),
            seat_capacity: normalized.seat_capacities[k],
            wheelchair_capacity: normalized.wheelchair_capacities[k],
            initial_seat_load: 0,
            initial_wheelchair_load: 0,
            with_rest: vehicle.with_rest && !skip.rest,
            forced_delivery: None,
        });
    }

    let mut compatible = Matrix2::new(normalized.n_vehicles, normalized.n_rides, false);
    for (k, vehicle) in problem.vehicles.iter().enumerate() {
        for (r, ride) in problem.rides.iter().enumerate() {
            let tags_ok = ride
                .characteristics
                .iter()
                .all(|tag| vehicle.supported_characteristics.contains(tag));
            let wheelchair_ok = !ride.wheelchair_required || vehicle.wheelchair_capacity > 0;
            *compatible.get_mut(k, r) = skip.compatibility || (tags_ok && wheelchair_ok);
        }
    }

    // Pre-boarded rides: the passenger occupies the vehicle from shift start
    // and its delivery is pinned to that vehicle.
    for (k, vehicle) in problem.vehicles.iter().enumerate() {
        if let Some(ride_id) = &vehicle.active_ride_id_pre_boarded {
            let r = problem
                .rides
                .iter()
                .position(|ride| &ride.id == ride_id)
                .ok_or_else(|| {
                    PlanError::SolverInvalid(format!(
                        "pre-boarded ride {} missing after validation",
                        ride_id
                    ))
                })?;
            if rides[r].preboarded_on.is_some() {
                return Err(PlanError::InvalidInput(format!(
                    "ride {} is pre-boarded on more than one vehicle",
                    ride_id
                )));
            }
            rides[r].preboarded_on = Some(k);
            vehicles[k].forced_delivery = Some(rides[r].delivery);
            vehicles[k].initial_seat_load = problem.rides[r].seat_demand();
            vehicles[k].initial_wheelchair_load = problem.rides[r].wheelchair_demand();
            *compatible.get_mut(k, r) = true;
        }
    }

    let service: Vec<Seconds> = normalized
        .tasks
        .iter()
        .map(|task| match task.ride {
            None => 0,
            Some(r) => {
                let ride = &problem.rides[r];
                if ride.characteristics.contains(ELECTRIC_RAMP_TAG) {
                    config.stop_electric_ramp
                } else if ride.wheelchair_required {
                    config.stop_wheelchair
                } else {
                    config.stop_common
                }
            }
        })
        .collect();

    info!(
        "model built: {} nodes, {} vehicles, {} rides",
        n_nodes,
        normalized.n_vehicles,
        normalized.n_rides
    );

    Ok(RoutingModel {
        kinds: normalized.tasks.iter().map(|t| t.kind).collect(),
        windows: normalized.tasks.iter().map(|t| t.time_window).collect(),
        service,
        seat_demand: normalized.seat_demands.clone(),
        wheelchair_demand: normalized.wheelchair_demands.clone(),
        node_ride: normalized.tasks.iter().map(|t| t.ride).collect(),
        vehicles,
        rides,
        compatible,
        matrices,
        params: ModelParams {
            max_ride_time: config.max_ride_time,
            rest_seconds: config.rest_seconds,
            rest_min_offset: config.rest_min_offset,
            rest_min_tail: config.rest_min_tail,
            span_coefficient: config.span_coefficient,
            soft_delivery_penalty: config.soft_delivery_penalty,
            skip,
        },
    })
}
