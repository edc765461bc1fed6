use std::fmt;

/// Index of a node in the normalized problem (depots first, then ride stops).
pub type Node = usize;
/// Seconds of day, or a duration in seconds.
pub type Seconds = i64;
/// Occupancy delta at a node (positive at pickups, negative at deliveries).
pub type Demand = i32;
/// Road distance in integer units (kilometres x 100).
pub type ScaledDistance = i64;
/// Objective value.
pub type Cost = i64;

/// 0-based index of a ride in input order.
pub type RideIdx = usize;
/// 0-based index of a vehicle in input order.
pub type VehicleIdx = usize;

/// Role of a node in the routing instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    DepotStart,
    DepotEnd,
    Pickup,
    Delivery,
}

impl TaskKind {
    #[inline(always)]
    pub fn is_depot(self) -> bool {
        matches!(self, TaskKind::DepotStart | TaskKind::DepotEnd)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::DepotStart => "DEPOT_START",
            TaskKind::DepotEnd => "DEPOT_END",
            TaskKind::Pickup => "PICKUP",
            TaskKind::Delivery => "DELIVERY",
        };
        f.write_str(s)
    }
}
