use crate::error::PlanError;
use crate::problem::{Coordinate, Problem, TimeWindow};
use crate::types::{Demand, Node, RideIdx, TaskKind, VehicleIdx};

/// One stop of the routing instance, with its dense node index assigned.
///
/// Tasks reference their ride (and depots their vehicle) by index into the
/// input arrays, never by pointer.
#[derive(Debug, Clone)]
pub struct Task {
    pub kind: TaskKind,
    pub node: Node,
    pub coordinates: Coordinate,
    pub time_window: TimeWindow,
    pub address: String,
    pub stop_id: String,
    pub ride: Option<RideIdx>,
    pub vehicle: Option<VehicleIdx>,
}

/// The numerically indexed routing instance derived from a [`Problem`].
///
/// Node numbering is deterministic: vehicles in input order occupy nodes
/// `2k` (start depot) and `2k + 1` (end depot); ride `r` occupies
/// `2V + 2r` (pickup) and `2V + 2r + 1` (delivery).
#[derive(Debug, Clone)]
pub struct NormalizedProblem {
    pub tasks: Vec<Task>,
    pub coordinates: Vec<Coordinate>,
    pub seat_demands: Vec<Demand>,
    pub wheelchair_demands: Vec<Demand>,
    pub seat_capacities: Vec<Demand>,
    pub wheelchair_capacities: Vec<Demand>,
    pub vehicle_starts: Vec<Node>,
    pub vehicle_ends: Vec<Node>,
    pub ride_pairs: Vec<(Node, Node)>,
    pub n_vehicles: usize,
    pub n_rides: usize,
}

impl NormalizedProblem {
    #[inline(always)]
    pub fn n_nodes(&self) -> usize {
        self.tasks.len()
    }

    #[inline(always)]
    pub fn pickup_node(&self, ride: RideIdx) -> Node {
        self.ride_pairs[ride].0
    }

    #[inline(always)]
    pub fn delivery_node(&self, ride: RideIdx) -> Node {
        self.ride_pairs[ride].1
    }

    /// The ride a node belongs to, if it is not a depot.
    #[inline(always)]
    pub fn node_ride(&self, node: Node) -> Option<RideIdx> {
        self.tasks[node].ride
    }
}

/// Produces the dense node numbering and the derived demand and capacity
/// vectors the solver operates on. Validates the problem first.
pub fn normalize(problem: &Problem) -> Result<NormalizedProblem, PlanError> {
    problem.validate()?;

    let n_vehicles = problem.vehicles.len();
    let n_rides = problem.rides.len();
    let n_nodes = 2 * n_vehicles + 2 * n_rides;

    let mut tasks = Vec::with_capacity(n_nodes);
    let mut seat_demands = vec![0; n_nodes];
    let mut wheelchair_demands = vec![0; n_nodes];

    for (k, vehicle) in problem.vehicles.iter().enumerate() {
        for (kind, depot) in [
            (TaskKind::DepotStart, &vehicle.depot_start),
            (TaskKind::DepotEnd, &vehicle.depot_end),
        ] {
            tasks.push(Task {
                kind,
                node: tasks.len(),
                coordinates: depot.coordinates,
                time_window: depot.time_window,
                address: depot.address.clone(),
                stop_id: depot.id.clone(),
                ride: None,
                vehicle: Some(k),
            });
        }
    }

    let mut ride_pairs = Vec::with_capacity(n_rides);
    for (r, ride) in problem.rides.iter().enumerate() {
        // validate() guarantees both stops are present
        let pickup = ride.pickup.as_ref().expect("validated pickup");
        let delivery = ride.delivery.as_ref().expect("validated delivery");

        let pickup_node = tasks.len();
        let delivery_node = pickup_node + 1;
        ride_pairs.push((pickup_node, delivery_node));

        for (kind, stop, node) in [
            (TaskKind::Pickup, pickup, pickup_node),
            (TaskKind::Delivery, delivery, delivery_node),
        ] {
            tasks.push(Task {
                kind,
                node,
                coordinates: stop.coordinates,
                time_window: stop.time_window,
                address: stop.address.clone(),
                stop_id: stop.stop_id.clone(),
                ride: Some(r),
                vehicle: None,
            });
        }

        seat_demands[pickup_node] = ride.seat_demand();
        seat_demands[delivery_node] = -ride.seat_demand();
        wheelchair_demands[pickup_node] = ride.wheelchair_demand();
        wheelchair_demands[delivery_node] = -ride.wheelchair_demand();
    }

    Ok(NormalizedProblem {
        coordinates: tasks.iter().map(|t| t.coordinates).collect(),
        seat_demands,
        wheelchair_demands,
        seat_capacities: problem.vehicles.iter().map(|v| v.seat_capacity).collect(),
        wheelchair_capacities: problem
            .vehicles
            .iter()
            .map(|v| v.wheelchair_capacity)
            .collect(),
        vehicle_starts: (0..n_vehicles).map(|k| 2 * k).collect(),
        vehicle_ends: (0..n_vehicles).map(|k| 2 * k + 1).collect(),
        ride_pairs,
        n_vehicles,
        n_rides,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{problem_with, ride, vehicle};

    fn sample() -> Problem {
        let mut wheelchair_ride = ride("r2", (2.0, 0.0), (3.0, 0.0));
        wheelchair_ride.wheelchair_required = true;
        wheelchair_ride.has_companion = true;
        problem_with(
            vec![vehicle("v1", 4, 0), vehicle("v2", 2, 1)],
            vec![ride("r1", (0.0, 0.0), (1.0, 0.0)), wheelchair_ride],
        )
    }

    #[test]
    fn node_count_law_holds() {
        let normalized = normalize(&sample()).unwrap();
        assert_eq!(normalized.n_nodes(), 2 * 2 + 2 * 2);
        for k in 0..2 {
            assert_eq!(normalized.vehicle_starts[k], 2 * k);
            assert_eq!(normalized.vehicle_ends[k], 2 * k + 1);
            assert_eq!(normalized.tasks[2 * k].kind, TaskKind::DepotStart);
            assert_eq!(normalized.tasks[2 * k + 1].kind, TaskKind::DepotEnd);
        }
        for r in 0..2 {
            assert_eq!(normalized.pickup_node(r), 4 + 2 * r);
            assert_eq!(normalized.delivery_node(r), 4 + 2 * r + 1);
            assert_eq!(normalized.node_ride(4 + 2 * r), Some(r));
        }
    }

    #[test]
    fn demands_balance_to_zero() {
        let normalized = normalize(&sample()).unwrap();
        assert_eq!(normalized.seat_demands.iter().sum::<i32>(), 0);
        assert_eq!(normalized.wheelchair_demands.iter().sum::<i32>(), 0);

        // r1: ambulatory rider, no companion
        assert_eq!(normalized.seat_demands[4], 1);
        assert_eq!(normalized.seat_demands[5], -1);
        assert_eq!(normalized.wheelchair_demands[4], 0);

        // r2: wheelchair rider plus companion occupies one of each
        assert_eq!(normalized.seat_demands[6], 1);
        assert_eq!(normalized.wheelchair_demands[6], 1);
        assert_eq!(normalized.wheelchair_demands[7], -1);
    }

    #[test]
    fn capacities_follow_input_order() {
        let normalized = normalize(&sample()).unwrap();
        assert_eq!(normalized.seat_capacities, vec![4, 2]);
        assert_eq!(normalized.wheelchair_capacities, vec![0, 1]);
    }

    #[test]
    fn node_order_is_deterministic() {
        let problem = sample();
        let a = normalize(&problem).unwrap();
        let b = normalize(&problem).unwrap();
        let coords = |n: &NormalizedProblem| {
            n.coordinates
                .iter()
                .map(|c| (c.latitude, c.longitude))
                .collect::<Vec<_>>()
        };
        assert_eq!(coords(&a), coords(&b));
    }
}
