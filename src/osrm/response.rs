/// Wire types of the road-network service. Any `code` other than `"Ok"`
/// or a missing body is treated as a failed query.
#[derive(serde::Deserialize)]
pub(super) struct OsrmTableResponse {
    pub(super) code: String,
    pub(super) distances: Option<Vec<Vec<Option<f64>>>>,
    pub(super) durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(serde::Deserialize)]
pub(super) struct OsrmRouteResponse {
    pub(super) code: String,
    pub(super) routes: Option<Vec<OsrmRoute>>,
}

#[derive(serde::Deserialize)]
pub(super) struct OsrmRoute {
    pub(super) geometry: Option<String>,
}
