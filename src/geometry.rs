use log::debug;
use rayon::prelude::*;

use crate::error::PlanError;
use crate::problem::Coordinate;
use crate::solution::Route;

/// Source of road geometries for an ordered stop sequence. Implemented by
/// the OSRM client; tests substitute straight-line fakes.
pub trait RouteSource: Sync {
    fn route_geometry(&self, coordinates: &[Coordinate]) -> Result<Vec<(f64, f64)>, PlanError>;
}

/// Fills in each route's geometry, querying the road-network service on a
/// bounded worker pool. Any single failed query fails the whole batch; a
/// partially decorated solution is never returned.
pub fn fetch_geometries(
    source: &dyn RouteSource,
    routes: &mut [Route],
    workers: usize,
) -> Result<(), PlanError> {
    if routes.is_empty() {
        return Ok(());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|err| PlanError::RouteQuery(err.to_string()))?;

    debug!("fetching {} route geometries on {} workers", routes.len(), workers);
    let geometries: Vec<Result<Vec<(f64, f64)>, PlanError>> = pool.install(|| {
        routes
            .par_iter()
            .map(|route| {
                let stops: Vec<Coordinate> =
                    route.visits.iter().map(|visit| visit.coordinates).collect();
                source.route_geometry(&stops)
            })
            .collect()
    });

    for (route, geometry) in routes.iter_mut().zip(geometries) {
        route.geometry = geometry?;
    }
    Ok(())
}
