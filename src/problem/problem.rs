use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::types::{Demand, Seconds};

pub const SECONDS_PER_DAY: Seconds = 86_400;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// An inclusive interval in seconds of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Seconds,
    pub end: Seconds,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::full()
    }
}

impl TimeWindow {
    pub fn new(start: Seconds, end: Seconds) -> Self {
        Self { start, end }
    }

    /// The whole day.
    pub fn full() -> Self {
        Self { start: 0, end: SECONDS_PER_DAY }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, t: Seconds) -> bool {
        self.start <= t && t <= self.end
    }

    /// The overlap of two windows; may come out inverted when they are disjoint.
    pub fn intersect(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }
}

/// A vehicle's start or end location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depot {
    pub id: String,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub time_window: TimeWindow,
}

/// One vehicle of the fleet with its shift and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    /// Seats for ambulatory passengers. `capacity` is accepted as a legacy alias.
    #[serde(default, alias = "capacity")]
    pub seat_capacity: Demand,
    #[serde(default)]
    pub wheelchair_capacity: Demand,
    #[serde(default)]
    pub time_window: TimeWindow,
    pub depot_start: Depot,
    pub depot_end: Depot,
    #[serde(default)]
    pub supported_characteristics: BTreeSet<String>,
    #[serde(default)]
    pub with_rest: bool,
    /// Ride whose passenger is already on board at shift start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_ride_id_pre_boarded: Option<String>,
}

/// A pickup or delivery stop of a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    #[serde(default)]
    pub stop_id: String,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub address: String,
}

/// A requested passenger trip from a pickup to a delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub has_companion: bool,
    #[serde(default)]
    pub wheelchair_required: bool,
    pub pickup: Option<Stop>,
    pub delivery: Option<Stop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default)]
    pub characteristics: BTreeSet<String>,
}

impl RideRequest {
    /// Seats taken by this ride: the rider when ambulatory, plus a companion.
    pub fn seat_demand(&self) -> Demand {
        let rider = if self.wheelchair_required { 0 } else { 1 };
        let companion = if self.has_companion { 1 } else { 0 };
        rider + companion
    }

    pub fn wheelchair_demand(&self) -> Demand {
        if self.wheelchair_required { 1 } else { 0 }
    }
}

/// The daily planning request: a fleet and the rides to serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub vehicles: Vec<Vehicle>,
    pub rides: Vec<RideRequest>,
}

impl Problem {
    /// Validates the document before any network or solver work.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut ride_ids = HashSet::with_capacity(self.rides.len());
        for ride in &self.rides {
            if !ride_ids.insert(ride.id.as_str()) {
                return Err(PlanError::InvalidInput(format!(
                    "duplicate ride id {}",
                    ride.id
                )));
            }
            let pickup = ride.pickup.as_ref().ok_or_else(|| {
                PlanError::InvalidInput(format!("ride {} has no pickup", ride.id))
            })?;
            let delivery = ride.delivery.as_ref().ok_or_else(|| {
                PlanError::InvalidInput(format!("ride {} has no delivery", ride.id))
            })?;
            for (label, window) in [("pickup", pickup.time_window), ("delivery", delivery.time_window)] {
                check_window(&window, &format!("ride {} {}", ride.id, label))?;
            }
        }

        for vehicle in &self.vehicles {
            if vehicle.seat_capacity < 0 || vehicle.wheelchair_capacity < 0 {
                return Err(PlanError::NegativeCapacity(format!(
                    "vehicle {} has capacity ({}, {})",
                    vehicle.id, vehicle.seat_capacity, vehicle.wheelchair_capacity
                )));
            }
            check_window(&vehicle.time_window, &format!("vehicle {} shift", vehicle.id))?;
            check_window(
                &vehicle.depot_start.time_window,
                &format!("vehicle {} start depot", vehicle.id),
            )?;
            check_window(
                &vehicle.depot_end.time_window,
                &format!("vehicle {} end depot", vehicle.id),
            )?;
            if let Some(ride_id) = &vehicle.active_ride_id_pre_boarded {
                if !ride_ids.contains(ride_id.as_str()) {
                    return Err(PlanError::InvalidInput(format!(
                        "vehicle {} carries unknown pre-boarded ride {}",
                        vehicle.id, ride_id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_window(window: &TimeWindow, what: &str) -> Result<(), PlanError> {
    if !window.is_valid() {
        return Err(PlanError::InvalidTimeWindow(format!(
            "{} window [{}, {}] is inverted",
            what, window.start, window.end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{problem_with, ride, vehicle};

    #[test]
    fn default_window_spans_the_day() {
        let window = TimeWindow::default();
        assert_eq!(window.start, 0);
        assert_eq!(window.end, SECONDS_PER_DAY);
    }

    #[test]
    fn intersect_narrows_both_sides() {
        let a = TimeWindow::new(100, 500);
        let b = TimeWindow::new(300, 900);
        assert_eq!(a.intersect(&b), TimeWindow::new(300, 500));
    }

    #[test]
    fn validate_rejects_inverted_window() {
        let mut r = ride("r1", (0.0, 0.0), (1.0, 0.0));
        r.pickup.as_mut().unwrap().time_window = TimeWindow::new(500, 100);
        let problem = problem_with(vec![vehicle("v1", 4, 0)], vec![r]);
        let err = problem.validate().unwrap_err();
        assert_eq!(err.kind(), "InvalidTimeWindow");
    }

    #[test]
    fn validate_rejects_missing_delivery() {
        let mut r = ride("r1", (0.0, 0.0), (1.0, 0.0));
        r.delivery = None;
        let problem = problem_with(vec![vehicle("v1", 4, 0)], vec![r]);
        assert_eq!(problem.validate().unwrap_err().kind(), "InvalidInput");
    }

    #[test]
    fn validate_rejects_negative_capacity() {
        let mut v = vehicle("v1", 4, 0);
        v.seat_capacity = -1;
        let problem = problem_with(vec![v], vec![]);
        assert_eq!(problem.validate().unwrap_err().kind(), "NegativeCapacity");
    }

    #[test]
    fn validate_rejects_unknown_preboarded_ride() {
        let mut v = vehicle("v1", 4, 0);
        v.active_ride_id_pre_boarded = Some("ghost".to_string());
        let problem = problem_with(vec![v], vec![ride("r1", (0.0, 0.0), (1.0, 0.0))]);
        assert_eq!(problem.validate().unwrap_err().kind(), "InvalidInput");
    }

    #[test]
    fn legacy_capacity_alias_parses() {
        let json = r#"{
            "id": "v1",
            "capacity": 6,
            "depot_start": {"id": "d", "coordinates": {"latitude": 0.0, "longitude": 0.0}},
            "depot_end": {"id": "d", "coordinates": {"latitude": 0.0, "longitude": 0.0}}
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.seat_capacity, 6);
        assert_eq!(vehicle.wheelchair_capacity, 0);
        assert_eq!(vehicle.time_window, TimeWindow::full());
    }

    #[test]
    fn seat_demand_counts_ambulatory_occupants() {
        let mut r = ride("r1", (0.0, 0.0), (1.0, 0.0));
        assert_eq!(r.seat_demand(), 1);
        r.has_companion = true;
        assert_eq!(r.seat_demand(), 2);
        r.wheelchair_required = true;
        assert_eq!(r.seat_demand(), 1);
        assert_eq!(r.wheelchair_demand(), 1);
    }
}
