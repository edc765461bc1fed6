use std::env;
use std::time::Duration;

use crate::types::{Cost, Seconds};

/// Characteristic tag marking rides that need the electric boarding ramp.
pub const ELECTRIC_RAMP_TAG: &str = "rampa_electrica";

/// Road-network service endpoints and query parameters.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub matrix_endpoint: String,
    pub matrix_params: String,
    pub route_endpoint: String,
    pub route_params: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            matrix_endpoint: "table/v1/driving".to_string(),
            matrix_params: "annotations=duration,distance".to_string(),
            route_endpoint: "route/v1/driving".to_string(),
            route_params: "overview=full&geometries=polyline".to_string(),
        }
    }
}

impl OsrmConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: env_string("OSRM_BASE_URL", d.base_url),
            matrix_endpoint: env_string("OSRM_MATRIX_ENDPOINT", d.matrix_endpoint),
            matrix_params: env_string("OSRM_MATRIX_PARAMS", d.matrix_params),
            route_endpoint: env_string("OSRM_ROUTE_ENDPOINT", d.route_endpoint),
            route_params: env_string("OSRM_ROUTE_PARAMS", d.route_params),
        }
    }
}

/// Debug switches that each disable one part of the model build.
/// Useful for bisecting an infeasible instance; all default to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFlags {
    pub drop_penalty: bool,
    pub distance_dim: bool,
    pub time_dim: bool,
    pub seat_capacity: bool,
    pub wheelchair_capacity: bool,
    pub pickup_delivery: bool,
    pub max_ride_time: bool,
    pub shift_containment: bool,
    pub compatibility: bool,
    pub rest: bool,
    pub soft_delivery: bool,
}

impl SkipFlags {
    fn from_env() -> Self {
        Self {
            drop_penalty: env_bool("PARAPLAN_SKIP_DROP_PENALTY"),
            distance_dim: env_bool("PARAPLAN_SKIP_DISTANCE_DIM"),
            time_dim: env_bool("PARAPLAN_SKIP_TIME_DIM"),
            seat_capacity: env_bool("PARAPLAN_SKIP_SEAT_CAPACITY"),
            wheelchair_capacity: env_bool("PARAPLAN_SKIP_WHEELCHAIR_CAPACITY"),
            pickup_delivery: env_bool("PARAPLAN_SKIP_PICKUP_DELIVERY"),
            max_ride_time: env_bool("PARAPLAN_SKIP_MAX_RIDE_TIME"),
            shift_containment: env_bool("PARAPLAN_SKIP_SHIFT_CONTAINMENT"),
            compatibility: env_bool("PARAPLAN_SKIP_COMPATIBILITY"),
            rest: env_bool("PARAPLAN_SKIP_REST"),
            soft_delivery: env_bool("PARAPLAN_SKIP_SOFT_DELIVERY"),
        }
    }
}

/// All tunables of the planning core, constructed once at program entry
/// and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub osrm: OsrmConfig,
    pub skip: SkipFlags,

    /// Penalty per unperformed node; a dropped ride pays it once per node.
    pub drop_penalty: Cost,
    /// Maximum in-vehicle time between a pickup and its delivery.
    pub max_ride_time: Seconds,
    /// Mandatory break duration for vehicles with `with_rest`.
    pub rest_seconds: Seconds,
    /// Break may not start within this long of the depot departure.
    pub rest_min_offset: Seconds,
    /// Break may not end within this long of the depot arrival.
    pub rest_min_tail: Seconds,
    /// Dwell time when departing a regular passenger stop.
    pub stop_common: Seconds,
    /// Dwell time when departing a wheelchair stop.
    pub stop_wheelchair: Seconds,
    /// Dwell time when departing a stop that needs the electric ramp.
    pub stop_electric_ramp: Seconds,
    /// Coefficient on the largest per-vehicle distance (fleet balancing).
    pub span_coefficient: Cost,
    /// Penalty per second a delivery lands past its window start.
    pub soft_delivery_penalty: Cost,
    /// Wall-clock budget for one solve.
    pub time_limit: Duration,
    /// Seed for the solver's random stream.
    pub seed: u64,
    /// Largest source x destination block requested from the matrix service.
    pub matrix_batch_size: usize,
    /// Worker pool size for the parallel geometry queries.
    pub geometry_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            osrm: OsrmConfig::default(),
            skip: SkipFlags::default(),
            drop_penalty: 1_000_000_000,
            max_ride_time: 5_000,
            rest_seconds: 1_800,
            rest_min_offset: 3_600,
            rest_min_tail: 3_600,
            stop_common: 120,
            stop_wheelchair: 300,
            stop_electric_ramp: 300,
            span_coefficient: 100,
            soft_delivery_penalty: 1_000,
            time_limit: Duration::from_secs(5),
            seed: 0,
            matrix_batch_size: 100,
            geometry_workers: 10,
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables, falling back to
    /// the documented defaults for anything unset.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            osrm: OsrmConfig::from_env(),
            skip: SkipFlags::from_env(),
            time_limit: env::var("PARAPLAN_TIME_LIMIT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(d.time_limit),
            seed: env::var("PARAPLAN_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.seed),
            matrix_batch_size: env::var("PARAPLAN_MATRIX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.matrix_batch_size),
            geometry_workers: env::var("PARAPLAN_GEOMETRY_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.geometry_workers),
            ..d
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_bool(key: &str) -> bool {
    matches!(
        env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = Config::default();
        assert_eq!(config.drop_penalty, 1_000_000_000);
        assert_eq!(config.max_ride_time, 5_000);
        assert_eq!(config.rest_seconds, 1_800);
        assert_eq!(config.rest_min_offset, 3_600);
        assert_eq!(config.rest_min_tail, 3_600);
        assert_eq!(config.span_coefficient, 100);
        assert_eq!(config.soft_delivery_penalty, 1_000);
        assert_eq!(config.time_limit, Duration::from_secs(5));
        assert!(!config.skip.rest);
    }
}
