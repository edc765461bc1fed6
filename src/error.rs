use std::fmt;

/// Errors raised across the planning pipeline.
///
/// Each variant carries a stable machine-readable kind (see [`PlanError::kind`])
/// so callers can map it onto their own surface without string matching.
#[derive(Debug)]
pub enum PlanError {
    /// Malformed or incomplete problem document.
    InvalidInput(String),
    /// A time window with `start > end`.
    InvalidTimeWindow(String),
    /// A vehicle with a negative seat or wheelchair capacity.
    NegativeCapacity(String),
    /// The road-network matrix fetch failed or returned a non-Ok payload.
    MatrixQuery(String),
    /// A route-geometry fetch failed.
    RouteQuery(String),
    /// The solver exhausted its budget without a feasible solution.
    SolverInfeasible(String),
    /// The model was built inconsistently; an internal bug.
    SolverInvalid(String),
}

impl PlanError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanError::InvalidInput(_) => "InvalidInput",
            PlanError::InvalidTimeWindow(_) => "InvalidTimeWindow",
            PlanError::NegativeCapacity(_) => "NegativeCapacity",
            PlanError::MatrixQuery(_) => "MatrixQueryError",
            PlanError::RouteQuery(_) => "RouteQueryError",
            PlanError::SolverInfeasible(_) => "SolverInfeasible",
            PlanError::SolverInvalid(_) => "SolverInvalid",
        }
    }

    /// True for failures the legacy surface reports in-band on a well-formed
    /// solution document rather than as a request failure.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            PlanError::MatrixQuery(_) | PlanError::RouteQuery(_) | PlanError::SolverInfeasible(_)
        )
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::InvalidInput(msg)
            | PlanError::InvalidTimeWindow(msg)
            | PlanError::NegativeCapacity(msg)
            | PlanError::MatrixQuery(msg)
            | PlanError::RouteQuery(msg)
            | PlanError::SolverInfeasible(msg)
            | PlanError::SolverInvalid(msg) => write!(f, "{}: {}", self.kind(), msg),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<reqwest::Error> for PlanError {
    fn from(err: reqwest::Error) -> Self {
        PlanError::MatrixQuery(err.to_string())
    }
}
