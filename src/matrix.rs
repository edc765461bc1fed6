use std::hash::{Hash, Hasher};

use bytemuck::Pod;
use log::debug;

use crate::error::PlanError;
use crate::problem::Coordinate;
use crate::types::{ScaledDistance, Seconds};

/// Multiplier applied to kilometre distances so the solver works on integers
/// while keeping sub-kilometre resolution. The inverse is applied on decode.
pub const DISTANCE_SCALE: f64 = 100.0;

/// A dense row-major matrix backed by a flat Vec.
#[derive(Debug, Clone)]
pub struct Matrix2<T> {
    pub data: Vec<T>,
    pub rows: usize,
    pub cols: usize,
}

impl<T: Clone> Matrix2<T> {
    pub fn new(rows: usize, cols: usize, init: T) -> Self {
        Self {
            data: vec![init; rows * cols],
            rows,
            cols,
        }
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }
}

// PartialEq, Eq and Hash via a byte-wise view of the storage.
impl<T: Pod> PartialEq for Matrix2<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && bytemuck::cast_slice::<T, u8>(&self.data) == bytemuck::cast_slice::<T, u8>(&other.data)
    }
}

impl<T: Pod> Eq for Matrix2<T> {}

impl<T: Pod> Hash for Matrix2<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.cols.hash(state);
        bytemuck::cast_slice::<T, u8>(&self.data).hash(state);
    }
}

/// One rectangular block of the travel-cost table, as returned by the
/// road-network service: metres and seconds, `None` where unroutable.
#[derive(Debug, Clone)]
pub struct TableBlock {
    pub distances: Vec<Vec<Option<f64>>>,
    pub durations: Vec<Vec<Option<f64>>>,
}

/// Source of road distance/duration tables. Implemented by the OSRM client;
/// tests substitute synthetic planar sources.
pub trait MatrixSource {
    /// Queries travel cost from every `sources[i]` to every `destinations[j]`,
    /// both given as indices into `coordinates`.
    fn table(
        &self,
        coordinates: &[Coordinate],
        sources: &[usize],
        destinations: &[usize],
    ) -> Result<TableBlock, PlanError>;
}

/// The two N x N integer matrices the routing model runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelMatrices {
    pub distance: Matrix2<ScaledDistance>,
    pub time: Matrix2<Seconds>,
}

impl TravelMatrices {
    pub fn n_nodes(&self) -> usize {
        self.distance.rows
    }
}

/// Fetches the full travel table for `coordinates`, tiling the request into
/// source x destination blocks of at most `batch_size` each when the node
/// count exceeds what the service accepts in one call.
pub fn build_matrices(
    source: &dyn MatrixSource,
    coordinates: &[Coordinate],
    batch_size: usize,
) -> Result<TravelMatrices, PlanError> {
    let n = coordinates.len();
    let mut distance = Matrix2::new(n, n, 0 as ScaledDistance);
    let mut time = Matrix2::new(n, n, 0 as Seconds);

    let all: Vec<usize> = (0..n).collect();
    let chunk = batch_size.max(1);
    for sources in all.chunks(chunk) {
        for destinations in all.chunks(chunk) {
            let block = source.table(coordinates, sources, destinations)?;
            stitch_block(&mut distance, &mut time, sources, destinations, &block)?;
        }
    }

    for i in 0..n {
        *distance.get_mut(i, i) = 0;
        *time.get_mut(i, i) = 0;
    }

    debug!("built {}x{} travel matrices", n, n);
    Ok(TravelMatrices { distance, time })
}

fn stitch_block(
    distance: &mut Matrix2<ScaledDistance>,
    time: &mut Matrix2<Seconds>,
    sources: &[usize],
    destinations: &[usize],
    block: &TableBlock,
) -> Result<(), PlanError> {
    if block.distances.len() != sources.len() || block.durations.len() != sources.len() {
        return Err(PlanError::MatrixQuery(format!(
            "table block has {} rows, expected {}",
            block.distances.len(),
            sources.len()
        )));
    }
    for (bi, &i) in sources.iter().enumerate() {
        let dist_row = &block.distances[bi];
        let time_row = &block.durations[bi];
        if dist_row.len() != destinations.len() || time_row.len() != destinations.len() {
            return Err(PlanError::MatrixQuery(format!(
                "table row {} has {} columns, expected {}",
                i,
                dist_row.len(),
                destinations.len()
            )));
        }
        for (bj, &j) in destinations.iter().enumerate() {
            let metres = dist_row[bj].ok_or_else(|| {
                PlanError::MatrixQuery(format!("no road distance between nodes {} and {}", i, j))
            })?;
            let seconds = time_row[bj].ok_or_else(|| {
                PlanError::MatrixQuery(format!("no road duration between nodes {} and {}", i, j))
            })?;
            *distance.get_mut(i, j) = scale_distance(metres);
            *time.get_mut(i, j) = seconds.round() as Seconds;
        }
    }
    Ok(())
}

/// Metres to the solver's integer distance unit.
#[inline(always)]
pub fn scale_distance(metres: f64) -> ScaledDistance {
    (metres / 1_000.0 * DISTANCE_SCALE).round() as ScaledDistance
}

/// The solver's integer distance unit back to kilometres.
#[inline(always)]
pub fn unscale_distance(scaled: ScaledDistance) -> f64 {
    scaled as f64 / DISTANCE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PlanarMatrixSource;

    fn coords(n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| Coordinate {
                latitude: i as f64 * 0.01,
                longitude: 0.0,
            })
            .collect()
    }

    #[test]
    fn scaling_keeps_ten_metre_resolution() {
        assert_eq!(scale_distance(0.0), 0);
        assert_eq!(scale_distance(10.0), 1);
        assert_eq!(scale_distance(1_234.0), 123);
        assert!((unscale_distance(123) - 1.23).abs() < 1e-9);
    }

    #[test]
    fn tiled_build_matches_single_call() {
        let source = PlanarMatrixSource::new(1_000.0, 1.0);
        let coordinates = coords(7);
        let whole = build_matrices(&source, &coordinates, 100).unwrap();
        let tiled = build_matrices(&source, &coordinates, 3).unwrap();
        assert_eq!(whole, tiled);
        assert_eq!(whole.n_nodes(), 7);
    }

    #[test]
    fn diagonal_is_zero() {
        let source = PlanarMatrixSource::new(1_000.0, 1.0);
        let coordinates = coords(4);
        let matrices = build_matrices(&source, &coordinates, 2).unwrap();
        for i in 0..4 {
            assert_eq!(*matrices.distance.get(i, i), 0);
            assert_eq!(*matrices.time.get(i, i), 0);
        }
    }

    #[test]
    fn missing_entry_is_an_error() {
        struct Holey;
        impl MatrixSource for Holey {
            fn table(
                &self,
                _coordinates: &[Coordinate],
                sources: &[usize],
                destinations: &[usize],
            ) -> Result<TableBlock, PlanError> {
                Ok(TableBlock {
                    distances: vec![vec![None; destinations.len()]; sources.len()],
                    durations: vec![vec![Some(0.0); destinations.len()]; sources.len()],
                })
            }
        }
        let err = build_matrices(&Holey, &coords(2), 10).unwrap_err();
        assert_eq!(err.kind(), "MatrixQueryError");
    }
}
