mod builder;
mod schedule;

pub use builder::build_model;
pub use schedule::{RestWindow, RouteSchedule, simulate};

use crate::config::SkipFlags;
use crate::matrix::{Matrix2, TravelMatrices};
use crate::problem::TimeWindow;
use crate::types::{Cost, Demand, Node, RideIdx, Seconds, TaskKind, VehicleIdx};

/// Per-vehicle data of the routing model.
#[derive(Debug, Clone)]
pub struct VehicleModel {
    pub id: String,
    pub start: Node,
    pub end: Node,
    /// The working shift.
    pub shift: TimeWindow,
    /// Shift intersected with the start depot's own window.
    pub start_window: TimeWindow,
    /// Shift intersected with the end depot's own window.
    pub end_window: TimeWindow,
    pub seat_capacity: Demand,
    pub wheelchair_capacity: Demand,
    /// Occupancy at shift start, from a pre-boarded ride.
    pub initial_seat_load: Demand,
    pub initial_wheelchair_load: Demand,
    pub with_rest: bool,
    /// Delivery node that must be served by this vehicle (pre-boarded ride).
    pub forced_delivery: Option<Node>,
}

/// Per-ride data of the routing model.
#[derive(Debug, Clone)]
pub struct RideModel {
    pub pickup: Node,
    pub delivery: Node,
    /// Vehicle already carrying this ride's passenger, if any.
    pub preboarded_on: Option<VehicleIdx>,
    /// Objective penalty paid when the ride is left unserved
    /// (the drop disjunction, scaled by the ride's node-group size).
    pub drop_cost: Cost,
}

/// Solver-facing tunables copied out of the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ModelParams {
    pub max_ride_time: Seconds,
    pub rest_seconds: Seconds,
    pub rest_min_offset: Seconds,
    pub rest_min_tail: Seconds,
    pub span_coefficient: Cost,
    pub soft_delivery_penalty: Cost,
    pub skip: SkipFlags,
}

/// The fully derived constraint instance: everything the search needs,
/// indexed by node and vehicle, with no references back into the domain
/// documents.
#[derive(Debug, Clone)]
pub struct RoutingModel {
    pub kinds: Vec<TaskKind>,
    pub windows: Vec<TimeWindow>,
    pub service: Vec<Seconds>,
    pub seat_demand: Vec<Demand>,
    pub wheelchair_demand: Vec<Demand>,
    pub node_ride: Vec<Option<RideIdx>>,
    pub vehicles: Vec<VehicleModel>,
    pub rides: Vec<RideModel>,
    /// vehicle x ride serviceability mask.
    pub compatible: Matrix2<bool>,
    pub matrices: TravelMatrices,
    pub params: ModelParams,
}

impl RoutingModel {
    #[inline(always)]
    pub fn n_nodes(&self) -> usize {
        self.kinds.len()
    }

    #[inline(always)]
    pub fn distance(&self, from: Node, to: Node) -> Cost {
        *self.matrices.distance.get(from, to)
    }

    #[inline(always)]
    pub fn travel_time(&self, from: Node, to: Node) -> Seconds {
        *self.matrices.time.get(from, to)
    }

    /// Time-dimension transit: travel plus the dwell charged when departing `from`.
    #[inline(always)]
    pub fn transit(&self, from: Node, to: Node) -> Seconds {
        self.travel_time(from, to) + self.service[from]
    }

    #[inline(always)]
    pub fn is_compatible(&self, vehicle: VehicleIdx, ride: RideIdx) -> bool {
        *self.compatible.get(vehicle, ride)
    }

    /// Rides a search move may remove from a route; pre-boarded rides are pinned.
    #[inline(always)]
    pub fn is_removable(&self, ride: RideIdx) -> bool {
        self.rides[ride].preboarded_on.is_none()
    }
}
