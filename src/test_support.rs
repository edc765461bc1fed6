//! Shared fixtures for unit tests: document builders and synthetic
//! road-network sources over a flat plane.

use crate::error::PlanError;
use crate::geometry::RouteSource;
use crate::matrix::{MatrixSource, TableBlock};
use crate::problem::{Coordinate, Depot, Problem, RideRequest, Stop, TimeWindow, Vehicle};

pub fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate { latitude, longitude }
}

fn depot(id: &str) -> Depot {
    Depot {
        id: id.to_string(),
        coordinates: coordinate(0.0, 0.0),
        address: String::new(),
        time_window: TimeWindow::full(),
    }
}

/// A vehicle at the origin with a full-day shift.
pub fn vehicle(id: &str, seats: i32, wheelchairs: i32) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        seat_capacity: seats,
        wheelchair_capacity: wheelchairs,
        time_window: TimeWindow::full(),
        depot_start: depot(&format!("{}-start", id)),
        depot_end: depot(&format!("{}-end", id)),
        supported_characteristics: Default::default(),
        with_rest: false,
        active_ride_id_pre_boarded: None,
    }
}

fn stop(at: (f64, f64)) -> Stop {
    Stop {
        stop_id: String::new(),
        coordinates: coordinate(at.0, at.1),
        time_window: TimeWindow::full(),
        address: String::new(),
    }
}

/// An ambulatory single-rider request with open windows.
pub fn ride(id: &str, pickup: (f64, f64), delivery: (f64, f64)) -> RideRequest {
    RideRequest {
        id: id.to_string(),
        user_id: String::new(),
        has_companion: false,
        wheelchair_required: false,
        pickup: Some(stop(pickup)),
        delivery: Some(stop(delivery)),
        direction: None,
        characteristics: Default::default(),
    }
}

pub fn problem_with(vehicles: Vec<Vehicle>, rides: Vec<RideRequest>) -> Problem {
    Problem { vehicles, rides }
}

/// A flat-earth travel model: straight-line distances at a fixed scale and a
/// constant speed, so test timetables are easy to reason about by hand.
pub struct PlanarMatrixSource {
    metres_per_degree: f64,
    speed: f64,
}

impl PlanarMatrixSource {
    pub fn new(metres_per_degree: f64, speed: f64) -> Self {
        Self {
            metres_per_degree,
            speed,
        }
    }

    fn metres(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        let dlat = a.latitude - b.latitude;
        let dlon = a.longitude - b.longitude;
        (dlat * dlat + dlon * dlon).sqrt() * self.metres_per_degree
    }
}

impl MatrixSource for PlanarMatrixSource {
    fn table(
        &self,
        coordinates: &[Coordinate],
        sources: &[usize],
        destinations: &[usize],
    ) -> Result<TableBlock, PlanError> {
        let mut distances = Vec::with_capacity(sources.len());
        let mut durations = Vec::with_capacity(sources.len());
        for &i in sources {
            let mut dist_row = Vec::with_capacity(destinations.len());
            let mut time_row = Vec::with_capacity(destinations.len());
            for &j in destinations {
                let metres = self.metres(&coordinates[i], &coordinates[j]);
                dist_row.push(Some(metres));
                time_row.push(Some(metres / self.speed));
            }
            distances.push(dist_row);
            durations.push(time_row);
        }
        Ok(TableBlock { distances, durations })
    }
}

/// Echoes the requested stops back as the route geometry.
pub struct StraightLineRoutes;

impl RouteSource for StraightLineRoutes {
    fn route_geometry(&self, coordinates: &[Coordinate]) -> Result<Vec<(f64, f64)>, PlanError> {
        Ok(coordinates
            .iter()
            .map(|c| (c.longitude, c.latitude))
            .collect())
    }
}
