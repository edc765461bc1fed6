mod decode;

pub use decode::decode;

use serde::{Deserialize, Serialize};

use crate::problem::{Coordinate, TimeWindow};
use crate::types::{Seconds, TaskKind};

/// One decoded stop on a vehicle's route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    pub address: String,
    pub coordinates: Coordinate,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub stop_id: String,
    pub arrival_time: Seconds,
    pub travel_time_to_next: Seconds,
    /// Earliest and latest feasible service start at this stop.
    pub solution_window: [Seconds; 2],
}

/// One vehicle's planned tour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub vehicle_id: String,
    /// Kilometres driven over the whole tour.
    pub distance: f64,
    pub duration: Seconds,
    pub visits: Vec<Visit>,
    pub time_window: TimeWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time_window: Option<[Seconds; 2]>,
    /// Road geometry as `(lon, lat)` pairs.
    pub geometry: Vec<(f64, f64)>,
}

/// The planning result: served routes plus everything left unserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub dropped_rides: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Solution {
    /// A well-formed result that serves nothing, used when the solve failed.
    pub fn all_dropped(ride_ids: Vec<String>, error_message: String) -> Self {
        Self {
            routes: Vec::new(),
            dropped_rides: ride_ids,
            error_message: Some(error_message),
        }
    }
}
