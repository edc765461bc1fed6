use crate::model::{RouteSchedule, RoutingModel, simulate};
use crate::types::{Cost, Node, RideIdx, VehicleIdx};

/// The solver's working state: one node sequence per vehicle (depots
/// implicit) plus the vehicle each ride is currently assigned to.
///
/// Route schedules are evaluated lazily and cached until the route is
/// touched again.
#[derive(Debug, Clone)]
pub struct Assignment {
    routes: Vec<Vec<Node>>,
    ride_vehicle: Vec<Option<VehicleIdx>>,
    schedules: Vec<Option<RouteSchedule>>,
}

impl Assignment {
    /// Starts with every ride unassigned except pre-boarded deliveries,
    /// which are pinned to their vehicle from the outset.
    pub fn new(model: &RoutingModel) -> Self {
        let mut assignment = Self {
            routes: vec![Vec::new(); model.vehicles.len()],
            ride_vehicle: vec![None; model.rides.len()],
            schedules: vec![None; model.vehicles.len()],
        };
        for (r, ride) in model.rides.iter().enumerate() {
            if let Some(k) = ride.preboarded_on {
                assignment.routes[k].push(ride.delivery);
                assignment.ride_vehicle[r] = Some(k);
            }
        }
        assignment
    }

    #[inline(always)]
    pub fn route(&self, vehicle: VehicleIdx) -> &[Node] {
        &self.routes[vehicle]
    }

    #[inline(always)]
    pub fn vehicle_of(&self, ride: RideIdx) -> Option<VehicleIdx> {
        self.ride_vehicle[ride]
    }

    #[inline(always)]
    pub fn is_dropped(&self, ride: RideIdx) -> bool {
        self.ride_vehicle[ride].is_none()
    }

    /// Rides currently unserved, in input order.
    pub fn dropped_rides(&self) -> Vec<RideIdx> {
        self.ride_vehicle
            .iter()
            .enumerate()
            .filter_map(|(r, assigned)| assigned.is_none().then_some(r))
            .collect()
    }

    /// The cached (or freshly simulated) schedule for one vehicle.
    pub fn schedule(&mut self, model: &RoutingModel, vehicle: VehicleIdx) -> &RouteSchedule {
        if self.schedules[vehicle].is_none() {
            self.schedules[vehicle] = Some(simulate(model, vehicle, &self.routes[vehicle]));
        }
        self.schedules[vehicle].as_ref().expect("schedule just simulated")
    }

    /// Inserts a ride with the pickup at `pickup_pos` and the delivery right
    /// after `delivery_pos` (both positions in the pre-insertion sequence,
    /// `pickup_pos <= delivery_pos`). Reverts and reports false when the
    /// resulting route is infeasible.
    pub fn try_insert(
        &mut self,
        model: &RoutingModel,
        vehicle: VehicleIdx,
        ride: RideIdx,
        pickup_pos: usize,
        delivery_pos: usize,
    ) -> bool {
        debug_assert!(self.ride_vehicle[ride].is_none());
        debug_assert!(pickup_pos <= delivery_pos);
        let route = &mut self.routes[vehicle];
        debug_assert!(delivery_pos <= route.len());
        route.insert(delivery_pos, model.rides[ride].delivery);
        route.insert(pickup_pos, model.rides[ride].pickup);

        let schedule = simulate(model, vehicle, &self.routes[vehicle]);
        if schedule.is_feasible {
            self.ride_vehicle[ride] = Some(vehicle);
            self.schedules[vehicle] = Some(schedule);
            true
        } else {
            let route = &mut self.routes[vehicle];
            route.remove(pickup_pos);
            route.remove(delivery_pos);
            false
        }
    }

    /// Removes a ride from its route, leaving it dropped. Pre-boarded rides
    /// are pinned and stay put.
    pub fn remove_ride(&mut self, model: &RoutingModel, ride: RideIdx) -> Option<VehicleIdx> {
        if !model.is_removable(ride) {
            return None;
        }
        let vehicle = self.ride_vehicle[ride].take()?;
        let pickup = model.rides[ride].pickup;
        let delivery = model.rides[ride].delivery;
        self.routes[vehicle].retain(|&node| node != pickup && node != delivery);
        self.schedules[vehicle] = None;
        Some(vehicle)
    }

    /// True when every route's schedule is feasible.
    pub fn is_feasible(&mut self, model: &RoutingModel) -> bool {
        (0..self.routes.len()).all(|k| self.schedule(model, k).is_feasible)
    }

    /// The full objective: arc distance, the global span term on the largest
    /// per-vehicle distance, drop penalties and delivery lateness.
    pub fn cost(&mut self, model: &RoutingModel) -> Cost {
        let params = model.params;
        let mut total = 0;
        let mut max_distance = 0;
        for k in 0..self.routes.len() {
            let schedule = self.schedule(model, k);
            debug_assert!(schedule.is_feasible);
            if !params.skip.distance_dim {
                total += schedule.distance;
                max_distance = max_distance.max(schedule.distance);
            }
            total += schedule.soft_cost;
        }
        if !params.skip.distance_dim {
            total += params.span_coefficient * max_distance;
        }
        for (r, assigned) in self.ride_vehicle.iter().enumerate() {
            if assigned.is_none() {
                total += model.rides[r].drop_cost;
            }
        }
        total
    }

    /// The largest per-vehicle distance, excluding `except`'s route.
    pub fn max_distance_excluding(
        &mut self,
        model: &RoutingModel,
        except: VehicleIdx,
    ) -> Cost {
        (0..self.routes.len())
            .filter(|&k| k != except)
            .map(|k| self.schedule(model, k).distance)
            .max()
            .unwrap_or(0)
    }

    /// Every arc driven by the current routes, depot legs included.
    pub fn arcs(&self, model: &RoutingModel) -> Vec<(Node, Node)> {
        let mut arcs = Vec::new();
        for (k, middle) in self.routes.iter().enumerate() {
            if middle.is_empty() {
                continue;
            }
            let veh = &model.vehicles[k];
            let mut prev = veh.start;
            for &node in middle {
                arcs.push((prev, node));
                prev = node;
            }
            arcs.push((prev, veh.end));
        }
        arcs
    }
}
