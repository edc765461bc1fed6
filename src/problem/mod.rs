mod normalize;
mod problem;

pub use normalize::{NormalizedProblem, Task, normalize};
pub use problem::{Coordinate, Depot, Problem, RideRequest, Stop, TimeWindow, Vehicle};
