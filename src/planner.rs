use log::{info, warn};

use crate::config::Config;
use crate::error::PlanError;
use crate::geometry::{RouteSource, fetch_geometries};
use crate::matrix::{MatrixSource, build_matrices};
use crate::metrics::IterationRecord;
use crate::model::build_model;
use crate::problem::{Problem, normalize};
use crate::search::{SearchParams, solve};
use crate::solution::{Solution, decode};

/// The planning pipeline, wired up explicitly at program entry: validation,
/// normalization, matrix fetch, model build, solve, decode, geometry.
pub struct Planner<'a> {
    config: &'a Config,
    matrix_source: &'a dyn MatrixSource,
    route_source: &'a dyn RouteSource,
}

impl<'a> Planner<'a> {
    pub fn new(
        config: &'a Config,
        matrix_source: &'a dyn MatrixSource,
        route_source: &'a dyn RouteSource,
    ) -> Self {
        Self {
            config,
            matrix_source,
            route_source,
        }
    }

    /// Runs one solve. An exhausted solver still yields `Ok`: the legacy
    /// surface reports it as a well-formed solution with every ride dropped
    /// and `error_message` set.
    pub fn plan(&self, problem: &Problem) -> Result<Solution, PlanError> {
        self.plan_instrumented(problem, None)
    }

    /// Like [`Planner::plan`], additionally collecting per-iteration search
    /// records for offline analysis.
    pub fn plan_instrumented(
        &self,
        problem: &Problem,
        records: Option<&mut Vec<IterationRecord>>,
    ) -> Result<Solution, PlanError> {
        let normalized = normalize(problem)?;
        info!(
            "planning {} rides over {} vehicles ({} nodes)",
            normalized.n_rides,
            normalized.n_vehicles,
            normalized.n_nodes()
        );

        let matrices = build_matrices(
            self.matrix_source,
            &normalized.coordinates,
            self.config.matrix_batch_size,
        )?;
        let model = build_model(problem, &normalized, matrices, self.config)?;

        let params = SearchParams::from_config(self.config);
        let mut assignment = match solve(&model, &params, records) {
            Ok(assignment) => assignment,
            Err(err @ PlanError::SolverInfeasible(_)) => {
                warn!("solve failed: {}", err);
                return Ok(all_dropped(problem, &err));
            }
            Err(err) => return Err(err),
        };

        let mut solution = decode(problem, &normalized, &model, &mut assignment);
        fetch_geometries(
            self.route_source,
            &mut solution.routes,
            self.config.geometry_workers,
        )?;
        info!(
            "planned {} routes, {} rides dropped",
            solution.routes.len(),
            solution.dropped_rides.len()
        );
        Ok(solution)
    }

    /// The legacy reporting contract: upstream matrix and geometry failures
    /// come back in-band on an all-dropped solution instead of failing the
    /// request; validation and internal errors still propagate.
    pub fn plan_report(&self, problem: &Problem) -> Result<Solution, PlanError> {
        match self.plan(problem) {
            Ok(solution) => Ok(solution),
            Err(err) if err.is_reportable() => {
                warn!("reporting failure in-band: {}", err);
                Ok(all_dropped(problem, &err))
            }
            Err(err) => Err(err),
        }
    }
}

fn all_dropped(problem: &Problem, err: &PlanError) -> Solution {
    Solution::all_dropped(
        problem.rides.iter().map(|r| r.id.clone()).collect(),
        err.to_string(),
    )
}
