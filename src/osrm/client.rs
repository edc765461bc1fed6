use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::config::OsrmConfig;
use crate::error::PlanError;
use crate::geometry::RouteSource;
use crate::matrix::{MatrixSource, TableBlock};
use crate::osrm::polyline;
use crate::osrm::response::{OsrmRouteResponse, OsrmTableResponse};
use crate::problem::Coordinate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin HTTP client for the road-network service's table and route endpoints.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmClient {
    /// Creates a client for the configured endpoints.
    pub fn new(config: OsrmConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build road-network client");
        Self { client, config }
    }

    fn url(&self, endpoint: &str, coordinates: &[Coordinate], params: &str) -> String {
        let path = coordinates
            .iter()
            .map(|c| format!("{},{}", c.longitude, c.latitude))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/{}/{}?{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint,
            path,
            params
        )
    }
}

impl MatrixSource for OsrmClient {
    fn table(
        &self,
        coordinates: &[Coordinate],
        sources: &[usize],
        destinations: &[usize],
    ) -> Result<TableBlock, PlanError> {
        let join = |indices: &[usize]| {
            indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(";")
        };
        let params = format!(
            "{}&sources={}&destinations={}",
            self.config.matrix_params,
            join(sources),
            join(destinations)
        );
        let url = self.url(&self.config.matrix_endpoint, coordinates, &params);
        debug!("table query: {} sources x {} destinations", sources.len(), destinations.len());

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| PlanError::MatrixQuery(err.to_string()))?;
        let parsed: OsrmTableResponse = response
            .json()
            .map_err(|err| PlanError::MatrixQuery(err.to_string()))?;
        if parsed.code != "Ok" {
            return Err(PlanError::MatrixQuery(format!(
                "table service answered code {}",
                parsed.code
            )));
        }
        let distances = parsed
            .distances
            .ok_or_else(|| PlanError::MatrixQuery("table response without distances".to_string()))?;
        let durations = parsed
            .durations
            .ok_or_else(|| PlanError::MatrixQuery("table response without durations".to_string()))?;
        Ok(TableBlock { distances, durations })
    }
}

impl RouteSource for OsrmClient {
    fn route_geometry(&self, coordinates: &[Coordinate]) -> Result<Vec<(f64, f64)>, PlanError> {
        let url = self.url(
            &self.config.route_endpoint,
            coordinates,
            &self.config.route_params,
        );
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| PlanError::RouteQuery(err.to_string()))?;
        let parsed: OsrmRouteResponse = response
            .json()
            .map_err(|err| PlanError::RouteQuery(err.to_string()))?;
        if parsed.code != "Ok" {
            return Err(PlanError::RouteQuery(format!(
                "route service answered code {}",
                parsed.code
            )));
        }
        let geometry = parsed
            .routes
            .and_then(|routes| routes.into_iter().next())
            .and_then(|route| route.geometry)
            .ok_or_else(|| PlanError::RouteQuery("route response without geometry".to_string()))?;
        polyline::decode(&geometry)
    }
}
