//! # paraplan
//!
//! Daily operations planning for a shared paratransit fleet.
//!
//! Given vehicles with heterogeneous capacities and shifts and a set of ride
//! requests with pickups, deliveries, time windows, accessibility needs and
//! companions, the planner produces a feasible, cost-effective schedule and
//! reports whatever could not be served.
//!
//! The pipeline: a [`problem::Problem`] is validated and
//! [normalized](problem::normalize) into a densely indexed instance, travel
//! matrices come from the road-network service through [`matrix`], the
//! [`model`] derives the full constraint instance (capacities, windows,
//! pairing, compatibility, rest breaks, drop penalties), [`search`] drives a
//! cheapest-insertion construction plus guided local search under a
//! wall-clock budget, and [`solution`] decodes the result into routes with
//! arrival times, rest windows and road geometry.
//!
//! ```rust,no_run
//! use paraplan::config::Config;
//! use paraplan::osrm::OsrmClient;
//! use paraplan::planner::Planner;
//!
//! let config = Config::from_env();
//! let osrm = OsrmClient::new(config.osrm.clone());
//! let planner = Planner::new(&config, &osrm, &osrm);
//! let problem = serde_json::from_str(r#"{"vehicles": [], "rides": []}"#).unwrap();
//! let solution = planner.plan_report(&problem).unwrap();
//! println!("{}", serde_json::to_string(&solution).unwrap());
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod metrics;
pub mod model;
pub mod osrm;
pub mod planner;
pub mod problem;
pub mod search;
pub mod solution;
pub mod types;

#[cfg(test)]
pub mod test_support;
