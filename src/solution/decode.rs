use crate::matrix::unscale_distance;
use crate::model::RoutingModel;
use crate::problem::{NormalizedProblem, Problem};
use crate::search::Assignment;
use crate::solution::{Route, Solution, Visit};

/// Reconstructs the typed solution from the solver's assignment: per vehicle
/// an ordered visit list with arrival times and service-start windows, the
/// rest window when one was placed, and the list of unserved ride ids.
///
/// Routes that never leave the depots are omitted.
pub fn decode(
    problem: &Problem,
    normalized: &NormalizedProblem,
    model: &RoutingModel,
    assignment: &mut Assignment,
) -> Solution {
    let mut routes = Vec::new();
    for k in 0..model.vehicles.len() {
        let schedule = assignment.schedule(model, k).clone();
        if schedule.n_visits() == 0 {
            continue;
        }
        debug_assert!(schedule.is_feasible, "decoded plan must be feasible");

        let n = schedule.path.len();
        let mut visits = Vec::with_capacity(n);
        for (position, &node) in schedule.path.iter().enumerate() {
            let task = &normalized.tasks[node];
            let ride = task.ride.map(|r| &problem.rides[r]);
            let travel_time_to_next = if position + 1 < n {
                model.travel_time(node, schedule.path[position + 1])
            } else {
                0
            };
            visits.push(Visit {
                position,
                ride_id: ride.map(|r| r.id.clone()),
                user_id: ride.map(|r| r.user_id.clone()),
                direction: ride.and_then(|r| r.direction.clone()),
                address: task.address.clone(),
                coordinates: task.coordinates,
                kind: task.kind,
                stop_id: task.stop_id.clone(),
                arrival_time: schedule.arrival[position],
                travel_time_to_next,
                solution_window: [schedule.earliest[position], schedule.latest[position]],
            });
        }

        routes.push(Route {
            vehicle_id: model.vehicles[k].id.clone(),
            distance: unscale_distance(schedule.distance),
            duration: schedule.arrival[n - 1] - schedule.arrival[0],
            visits,
            time_window: model.vehicles[k].shift,
            rest_time_window: schedule.rest.map(|r| [r.start, r.end]),
            geometry: Vec::new(),
        });
    }

    let dropped_rides = assignment
        .dropped_rides()
        .into_iter()
        .map(|r| problem.rides[r].id.clone())
        .collect();

    Solution {
        routes,
        dropped_rides,
        error_message: None,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::matrix::build_matrices;
    use crate::model::build_model;
    use crate::problem::{TimeWindow, normalize};
    use crate::search::{SearchParams, solve};
    use crate::test_support::{PlanarMatrixSource, problem_with, ride, vehicle};
    use crate::types::TaskKind;
    use std::time::Duration;

    use super::*;

    fn quick_params() -> SearchParams {
        SearchParams {
            time_limit: Duration::from_secs(5),
            max_iterations: 60,
            seed: 0,
        }
    }

    #[test]
    fn decoded_route_carries_visit_metadata() {
        let mut v = vehicle("bus-1", 4, 0);
        v.depot_start.id = "depot".to_string();
        let mut r = ride("ride-1", (1.0, 0.0), (2.0, 0.0));
        r.user_id = "user-9".to_string();
        r.direction = Some("outbound".to_string());
        r.pickup.as_mut().unwrap().stop_id = "stop-a".to_string();
        r.delivery.as_mut().unwrap().time_window = TimeWindow::new(0, 50_000);
        let problem = problem_with(vec![v], vec![r]);

        let normalized = normalize(&problem).unwrap();
        let matrices = build_matrices(
            &PlanarMatrixSource::new(1_000.0, 1.0),
            &normalized.coordinates,
            100,
        )
        .unwrap();
        let model = build_model(&problem, &normalized, matrices, &Config::default()).unwrap();
        let mut assignment = solve(&model, &quick_params(), None).unwrap();
        let solution = decode(&problem, &normalized, &model, &mut assignment);

        assert!(solution.dropped_rides.is_empty());
        assert_eq!(solution.routes.len(), 1);
        let route = &solution.routes[0];
        assert_eq!(route.vehicle_id, "bus-1");
        assert_eq!(
            route.visits.iter().map(|v| v.kind).collect::<Vec<_>>(),
            vec![
                TaskKind::DepotStart,
                TaskKind::Pickup,
                TaskKind::Delivery,
                TaskKind::DepotEnd
            ]
        );

        let pickup = &route.visits[1];
        assert_eq!(pickup.ride_id.as_deref(), Some("ride-1"));
        assert_eq!(pickup.user_id.as_deref(), Some("user-9"));
        assert_eq!(pickup.stop_id, "stop-a");
        assert_eq!(pickup.position, 1);
        assert!(pickup.solution_window[0] <= pickup.arrival_time);
        assert!(pickup.arrival_time <= pickup.solution_window[1]);

        // depot -> 1 km -> pickup
        assert_eq!(route.visits[0].travel_time_to_next, 1_000);
        assert_eq!(route.visits.last().unwrap().travel_time_to_next, 0);
        // 4 km round trip, scaled back to kilometres
        assert!((route.distance - 4.0).abs() < 1e-9);
        assert_eq!(
            route.duration,
            route.visits.last().unwrap().arrival_time - route.visits[0].arrival_time
        );
    }

    #[test]
    fn idle_vehicles_are_omitted() {
        let problem = problem_with(
            vec![vehicle("v1", 4, 0), vehicle("v2", 4, 0)],
            vec![ride("solo", (1.0, 0.0), (2.0, 0.0))],
        );
        let normalized = normalize(&problem).unwrap();
        let matrices = build_matrices(
            &PlanarMatrixSource::new(1_000.0, 1.0),
            &normalized.coordinates,
            100,
        )
        .unwrap();
        let model = build_model(&problem, &normalized, matrices, &Config::default()).unwrap();
        let mut assignment = solve(&model, &quick_params(), None).unwrap();
        let solution = decode(&problem, &normalized, &model, &mut assignment);

        assert_eq!(solution.routes.len(), 1);
        assert!(solution.dropped_rides.is_empty());
        assert!(solution.error_message.is_none());
    }

    #[test]
    fn unserved_rides_are_listed_once() {
        let mut v = vehicle("v1", 4, 0);
        v.time_window = TimeWindow::new(0, 100);
        let mut r = ride("late", (1.0, 0.0), (2.0, 0.0));
        r.pickup.as_mut().unwrap().time_window = TimeWindow::new(110, 120);
        let problem = problem_with(vec![v], vec![r]);

        let normalized = normalize(&problem).unwrap();
        let matrices = build_matrices(
            &PlanarMatrixSource::new(1_000.0, 1.0),
            &normalized.coordinates,
            100,
        )
        .unwrap();
        let model = build_model(&problem, &normalized, matrices, &Config::default()).unwrap();
        let mut assignment = solve(&model, &quick_params(), None).unwrap();
        let solution = decode(&problem, &normalized, &model, &mut assignment);

        assert!(solution.routes.is_empty());
        assert_eq!(solution.dropped_rides, vec!["late".to_string()]);
    }
}
