use crate::model::{RoutingModel, VehicleModel};
use crate::problem::TimeWindow;
use crate::types::{Cost, Demand, Node, ScaledDistance, Seconds, VehicleIdx};

/// A placed rest break: `gap` is the position in the path after which the
/// break is taken (the vehicle is empty there by construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestWindow {
    pub start: Seconds,
    pub end: Seconds,
    pub gap: usize,
}

/// The evaluated timetable of one vehicle's route.
///
/// `arrival` holds the reported cumuls after compression (depot departure
/// pushed late, arrival kept early); `earliest`/`latest` bound each stop's
/// feasible service-start interval.
#[derive(Debug, Clone)]
pub struct RouteSchedule {
    pub path: Vec<Node>,
    pub arrival: Vec<Seconds>,
    pub earliest: Vec<Seconds>,
    pub latest: Vec<Seconds>,
    pub seat_load: Vec<Demand>,
    pub wheelchair_load: Vec<Demand>,
    pub distance: ScaledDistance,
    pub rest: Option<RestWindow>,
    pub soft_cost: Cost,
    pub is_feasible: bool,
    pub infeasible_at: Option<usize>,
    pub violation: Option<String>,
}

impl RouteSchedule {
    /// Number of non-depot stops.
    pub fn n_visits(&self) -> usize {
        self.path.len().saturating_sub(2)
    }
}

struct ForwardPass {
    times: Vec<Seconds>,
    rest: Option<RestWindow>,
    ok: bool,
    fail_at: Option<usize>,
    violation: Option<String>,
}

/// Simulates the route `start -> middle... -> end` for the given vehicle:
/// earliest times with waiting and dwell, both capacity dimensions, shift
/// containment, max ride time, rest placement, then the latest-time pass and
/// the final compression.
pub fn simulate(model: &RoutingModel, vehicle: VehicleIdx, middle: &[Node]) -> RouteSchedule {
    let veh = &model.vehicles[vehicle];
    let mut path = Vec::with_capacity(middle.len() + 2);
    path.push(veh.start);
    path.extend_from_slice(middle);
    path.push(veh.end);
    let n = path.len();

    if middle.is_empty() {
        // An idle vehicle never leaves its depot.
        let t = veh.start_window.start.min(veh.start_window.end);
        return RouteSchedule {
            arrival: vec![t; 2],
            earliest: vec![t; 2],
            latest: vec![veh.start_window.end, veh.end_window.end],
            seat_load: vec![veh.initial_seat_load; 2],
            wheelchair_load: vec![veh.initial_wheelchair_load; 2],
            distance: 0,
            rest: None,
            soft_cost: 0,
            is_feasible: true,
            infeasible_at: None,
            violation: None,
            path,
        };
    }

    let skip = &model.params.skip;

    // Occupancy is time-independent; evaluate it first so an overload fails
    // fast and the zero-load gaps for the rest placement are known.
    let mut seat_load = Vec::with_capacity(n);
    let mut wheelchair_load = Vec::with_capacity(n);
    let mut seats = veh.initial_seat_load;
    let mut chairs = veh.initial_wheelchair_load;
    for (i, &node) in path.iter().enumerate() {
        seats += model.seat_demand[node];
        chairs += model.wheelchair_demand[node];
        seat_load.push(seats);
        wheelchair_load.push(chairs);

        let seats_bad = !skip.seat_capacity && (seats < 0 || seats > veh.seat_capacity);
        let chairs_bad =
            !skip.wheelchair_capacity && (chairs < 0 || chairs > veh.wheelchair_capacity);
        if seats_bad || chairs_bad {
            return infeasible_schedule(
                path,
                seat_load,
                wheelchair_load,
                i,
                format!(
                    "load ({}, {}) outside capacity ({}, {}) at node {}",
                    seats, chairs, veh.seat_capacity, veh.wheelchair_capacity, node
                ),
            );
        }
    }

    let mut distance: ScaledDistance = 0;
    for w in path.windows(2) {
        distance += model.distance(w[0], w[1]);
    }

    // Rest placement: try every gap where the vehicle is empty, keep the one
    // with the least lateness, earliest return as tie break.
    let chosen = if veh.with_rest {
        let mut best: Option<(ForwardPass, usize)> = None;
        for gap in 0..n - 1 {
            if seat_load[gap] != 0 || wheelchair_load[gap] != 0 {
                continue;
            }
            let pass = forward(model, veh, &path, veh.start_window.start, Some(gap));
            if !pass.ok || ride_time_violation(model, &path, &pass.times).is_some() {
                continue;
            }
            let better = match &best {
                None => true,
                Some((incumbent, _)) => {
                    let cand = (soft_cost(model, &path, &pass.times), pass.times[n - 1]);
                    let cur = (
                        soft_cost(model, &path, &incumbent.times),
                        incumbent.times[n - 1],
                    );
                    cand < cur
                }
            };
            if better {
                best = Some((pass, gap));
            }
        }
        match best {
            Some((pass, _)) => pass,
            None => {
                return infeasible_schedule(
                    path,
                    seat_load,
                    wheelchair_load,
                    0,
                    format!("no feasible rest placement for vehicle {}", veh.id),
                );
            }
        }
    } else {
        let pass = forward(model, veh, &path, veh.start_window.start, None);
        if !pass.ok {
            let at = pass.fail_at.unwrap_or(0);
            return infeasible_schedule(
                path,
                seat_load,
                wheelchair_load,
                at,
                pass.violation.unwrap_or_else(|| "time window violated".to_string()),
            );
        }
        if let Some((at, msg)) = ride_time_violation(model, &path, &pass.times) {
            return infeasible_schedule(path, seat_load, wheelchair_load, at, msg);
        }
        pass
    };

    let earliest = chosen.times.clone();
    let gap = chosen.rest.map(|r| r.gap);
    let latest = backward(model, veh, &path, &earliest, gap);

    // Compression: leave the depot as late as the windows allow, then keep
    // every later stop as early as that departure permits.
    let mut arrival = earliest.clone();
    let mut rest = chosen.rest;
    if latest[0] > earliest[0] {
        let compressed = forward(model, veh, &path, latest[0], gap);
        if compressed.ok && ride_time_violation(model, &path, &compressed.times).is_none() {
            arrival = compressed.times;
            rest = compressed.rest;
        }
    }

    let soft = soft_cost(model, &path, &arrival);
    RouteSchedule {
        arrival,
        earliest,
        latest,
        seat_load,
        wheelchair_load,
        distance,
        rest,
        soft_cost: soft,
        is_feasible: true,
        infeasible_at: None,
        violation: None,
        path,
    }
}

fn infeasible_schedule(
    path: Vec<Node>,
    seat_load: Vec<Demand>,
    wheelchair_load: Vec<Demand>,
    at: usize,
    violation: String,
) -> RouteSchedule {
    RouteSchedule {
        arrival: Vec::new(),
        earliest: Vec::new(),
        latest: Vec::new(),
        seat_load,
        wheelchair_load,
        distance: 0,
        rest: None,
        soft_cost: 0,
        is_feasible: false,
        infeasible_at: Some(at),
        violation: Some(violation),
        path,
    }
}

/// The service-start window at a path position: the depot windows at the
/// ends (already intersected with the shift), the stop's own window,
/// narrowed to the shift, in between.
fn effective_window(
    model: &RoutingModel,
    veh: &VehicleModel,
    path: &[Node],
    pos: usize,
) -> TimeWindow {
    if pos == 0 {
        veh.start_window
    } else if pos == path.len() - 1 {
        veh.end_window
    } else {
        let window = model.windows[path[pos]];
        if model.params.skip.shift_containment {
            window
        } else {
            window.intersect(&veh.shift)
        }
    }
}

fn forward(
    model: &RoutingModel,
    veh: &VehicleModel,
    path: &[Node],
    departure: Seconds,
    rest_gap: Option<usize>,
) -> ForwardPass {
    let check_time = !model.params.skip.time_dim;
    let n = path.len();
    let mut times = Vec::with_capacity(n);
    let start_window = effective_window(model, veh, path, 0);
    let t0 = departure.max(start_window.start);
    if check_time && t0 > start_window.end {
        return ForwardPass {
            times,
            rest: None,
            ok: false,
            fail_at: Some(0),
            violation: Some(format!(
                "departure {} after start window end {}",
                t0, start_window.end
            )),
        };
    }
    times.push(t0);

    let mut rest = None;
    for i in 1..n {
        let prev = path[i - 1];
        let node = path[i];
        let mut depart = times[i - 1] + model.service[prev];

        if rest_gap == Some(i - 1) {
            let rest_start = depart
                .max(t0 + model.params.rest_min_offset)
                .max(veh.shift.start);
            let rest_end = rest_start + model.params.rest_seconds;
            if check_time && rest_end > veh.shift.end {
                return ForwardPass {
                    times,
                    rest: None,
                    ok: false,
                    fail_at: Some(i - 1),
                    violation: Some(format!(
                        "rest ending {} does not fit the shift end {}",
                        rest_end, veh.shift.end
                    )),
                };
            }
            rest = Some(RestWindow {
                start: rest_start,
                end: rest_end,
                gap: i - 1,
            });
            depart = rest_end;
        }

        let arrive = depart + model.travel_time(prev, node);
        let window = effective_window(model, veh, path, i);
        let t = arrive.max(window.start);
        if check_time && t > window.end {
            return ForwardPass {
                times,
                rest,
                ok: false,
                fail_at: Some(i),
                violation: Some(format!(
                    "arrival {} after window [{}, {}] at node {}",
                    arrive, window.start, window.end, node
                )),
            };
        }
        times.push(t);
    }

    // The break may sit neither at the very start nor the very end of the tour.
    if let Some(r) = rest {
        let depot_arrival = times[n - 1];
        if check_time && r.end > depot_arrival - model.params.rest_min_tail {
            return ForwardPass {
                times,
                rest,
                ok: false,
                fail_at: Some(r.gap),
                violation: Some(format!(
                    "rest ending {} too close to depot arrival {}",
                    r.end, depot_arrival
                )),
            };
        }
    }

    ForwardPass {
        times,
        rest,
        ok: true,
        fail_at: None,
        violation: None,
    }
}

/// Max in-vehicle time per ride served on this path. Returns the failing
/// position and message, or None when every ride is within bounds.
fn ride_time_violation(
    model: &RoutingModel,
    path: &[Node],
    times: &[Seconds],
) -> Option<(usize, String)> {
    let params = &model.params;
    if params.skip.max_ride_time || params.skip.time_dim || params.skip.pickup_delivery {
        return None;
    }
    let mut pickup_pos = vec![None; model.rides.len()];
    for (pos, &node) in path.iter().enumerate() {
        let Some(r) = model.node_ride[node] else { continue };
        if node == model.rides[r].pickup {
            pickup_pos[r] = Some(pos);
        } else if let Some(p) = pickup_pos[r] {
            let on_board = times[pos] - times[p];
            if on_board > params.max_ride_time {
                return Some((
                    pos,
                    format!(
                        "ride {} on board for {}s, limit {}s",
                        r, on_board, params.max_ride_time
                    ),
                ));
            }
        }
    }
    None
}

/// Penalty for deliveries landing past their window start.
fn soft_cost(model: &RoutingModel, path: &[Node], times: &[Seconds]) -> Cost {
    let params = &model.params;
    if params.skip.soft_delivery || params.skip.time_dim {
        return 0;
    }
    let mut cost = 0;
    for (pos, &node) in path.iter().enumerate() {
        let Some(r) = model.node_ride[node] else { continue };
        if node == model.rides[r].delivery {
            let lateness = (times[pos] - model.windows[node].start).max(0);
            cost += lateness * params.soft_delivery_penalty;
        }
    }
    cost
}

/// Latest service start per position that still reaches every later window
/// without adding delivery lateness beyond what the earliest plan pays.
fn backward(
    model: &RoutingModel,
    veh: &VehicleModel,
    path: &[Node],
    earliest: &[Seconds],
    rest_gap: Option<usize>,
) -> Vec<Seconds> {
    let params = &model.params;
    let soft_active = !params.skip.soft_delivery && !params.skip.time_dim;
    let n = path.len();
    let mut latest = vec![0; n];
    latest[n - 1] = effective_window(model, veh, path, n - 1).end;
    for i in (0..n - 1).rev() {
        let rest_extra = if rest_gap == Some(i) {
            params.rest_seconds
        } else {
            0
        };
        let reachable =
            latest[i + 1] - model.travel_time(path[i], path[i + 1]) - model.service[path[i]] - rest_extra;
        let mut bound = effective_window(model, veh, path, i).end.min(reachable);
        if soft_active {
            let node = path[i];
            if let Some(r) = model.node_ride[node] {
                if node == model.rides[r].delivery {
                    // the soft upper bound already priced this cumul
                    bound = bound.min(model.windows[node].start.max(earliest[i]));
                }
            }
        }
        latest[i] = bound;
    }
    for i in 0..n {
        latest[i] = latest[i].max(earliest[i]);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::matrix::build_matrices;
    use crate::model::build_model;
    use crate::problem::{TimeWindow, normalize};
    use crate::test_support::{PlanarMatrixSource, problem_with, ride, vehicle};

    fn model_for(problem: &crate::problem::Problem) -> RoutingModel {
        let normalized = normalize(problem).unwrap();
        let matrices = build_matrices(
            &PlanarMatrixSource::new(1_000.0, 1.0),
            &normalized.coordinates,
            100,
        )
        .unwrap();
        build_model(problem, &normalized, matrices, &Config::default()).unwrap()
    }

    #[test]
    fn waits_for_window_start_and_adds_dwell() {
        let mut r = ride("r1", (1.0, 0.0), (2.0, 0.0));
        r.pickup.as_mut().unwrap().time_window = TimeWindow::new(3_600, 7_200);
        let problem = problem_with(vec![vehicle("v1", 4, 0)], vec![r]);
        let model = model_for(&problem);

        let schedule = simulate(&model, 0, &[model.rides[0].pickup, model.rides[0].delivery]);
        assert!(schedule.is_feasible, "{:?}", schedule.violation);
        // 1 km at 1 m/s, but the pickup window opens at 3600.
        assert_eq!(schedule.earliest[1], 3_600);
        // dwell 120 s, then 1 km to the delivery
        assert_eq!(schedule.earliest[2], 3_600 + 120 + 1_000);
    }

    #[test]
    fn capacity_overload_is_infeasible() {
        let mut a = ride("a", (1.0, 0.0), (4.0, 0.0));
        a.has_companion = true;
        let b = ride("b", (2.0, 0.0), (5.0, 0.0));
        let problem = problem_with(vec![vehicle("v1", 2, 0)], vec![a, b]);
        let model = model_for(&problem);

        // both rides on board at once: 3 seats needed, 2 available
        let schedule = simulate(
            &model,
            0,
            &[
                model.rides[0].pickup,
                model.rides[1].pickup,
                model.rides[0].delivery,
                model.rides[1].delivery,
            ],
        );
        assert!(!schedule.is_feasible);

        // sequential service fits
        let schedule = simulate(
            &model,
            0,
            &[
                model.rides[0].pickup,
                model.rides[0].delivery,
                model.rides[1].pickup,
                model.rides[1].delivery,
            ],
        );
        assert!(schedule.is_feasible, "{:?}", schedule.violation);
    }

    #[test]
    fn max_ride_time_bounds_the_leg() {
        let r = ride("r1", (1.0, 0.0), (8.0, 0.0));
        let problem = problem_with(vec![vehicle("v1", 4, 0)], vec![r]);
        let model = model_for(&problem);

        // 7 km at 1 m/s is 7000 s on board, over the 5000 s limit
        let schedule = simulate(&model, 0, &[model.rides[0].pickup, model.rides[0].delivery]);
        assert!(!schedule.is_feasible);
        assert!(schedule.violation.as_deref().unwrap_or("").contains("on board"));
    }

    #[test]
    fn compression_pushes_departure_late() {
        let mut r = ride("r1", (1.0, 0.0), (2.0, 0.0));
        r.pickup.as_mut().unwrap().time_window = TimeWindow::new(3_600, 7_200);
        let problem = problem_with(vec![vehicle("v1", 4, 0)], vec![r]);
        let model = model_for(&problem);

        let schedule = simulate(&model, 0, &[model.rides[0].pickup, model.rides[0].delivery]);
        assert!(schedule.is_feasible);
        // the earliest plan leaves at 0 and idles at the pickup; the reported
        // plan leaves late enough to skip the idle entirely
        assert_eq!(schedule.earliest[0], 0);
        assert!(schedule.arrival[0] > schedule.earliest[0]);
        assert!(schedule.arrival[1] >= 3_600);
        for i in 0..schedule.path.len() {
            assert!(schedule.arrival[i] <= schedule.latest[i]);
            assert!(schedule.arrival[i] >= schedule.earliest[i]);
        }
    }

    #[test]
    fn rest_is_placed_in_an_empty_gap() {
        let mut v = vehicle("v1", 4, 0);
        v.with_rest = true;
        let rides = vec![
            ride("a", (1.0, 0.0), (2.0, 0.0)),
            ride("b", (4.0, 0.0), (5.0, 0.0)),
            ride("c", (7.0, 0.0), (8.0, 0.0)),
        ];
        let problem = problem_with(vec![v], rides);
        let model = model_for(&problem);

        let middle: Vec<_> = (0..3)
            .flat_map(|r| [model.rides[r].pickup, model.rides[r].delivery])
            .collect();
        let schedule = simulate(&model, 0, &middle);
        assert!(schedule.is_feasible, "{:?}", schedule.violation);

        let rest = schedule.rest.expect("rest window");
        assert_eq!(rest.end - rest.start, 1_800);
        assert!(rest.start >= schedule.arrival[0] + 3_600);
        assert!(rest.end <= schedule.arrival[schedule.path.len() - 1] - 3_600);
        // the chosen gap is empty
        assert_eq!(schedule.seat_load[rest.gap], 0);
        // and the break overlaps no ride interval
        for r in 0..3 {
            let p = schedule.path.iter().position(|&n| n == model.rides[r].pickup).unwrap();
            let d = schedule
                .path
                .iter()
                .position(|&n| n == model.rides[r].delivery)
                .unwrap();
            let overlap = rest.start < schedule.arrival[d] && schedule.arrival[p] < rest.end;
            assert!(!overlap, "rest {:?} overlaps ride {}", rest, r);
        }
    }

    #[test]
    fn rest_infeasible_when_shift_too_short() {
        let mut v = vehicle("v1", 4, 0);
        v.with_rest = true;
        v.time_window = TimeWindow::new(0, 4_000);
        let problem = problem_with(vec![v], vec![ride("r1", (0.5, 0.0), (1.0, 0.0))]);
        let model = model_for(&problem);

        let schedule = simulate(&model, 0, &[model.rides[0].pickup, model.rides[0].delivery]);
        assert!(!schedule.is_feasible);
    }

    #[test]
    fn skip_flags_relax_their_constraint() {
        let mut a = ride("a", (1.0, 0.0), (4.0, 0.0));
        a.has_companion = true;
        let b = ride("b", (2.0, 0.0), (5.0, 0.0));
        let problem = problem_with(vec![vehicle("v1", 2, 0)], vec![a, b]);

        let normalized = normalize(&problem).unwrap();
        let matrices = build_matrices(
            &PlanarMatrixSource::new(1_000.0, 1.0),
            &normalized.coordinates,
            100,
        )
        .unwrap();
        let mut config = Config::default();
        config.skip.seat_capacity = true;
        let model = build_model(&problem, &normalized, matrices, &config).unwrap();

        // the interleaving that overloads the two seats passes once the seat
        // dimension is switched off
        let schedule = simulate(
            &model,
            0,
            &[
                model.rides[0].pickup,
                model.rides[1].pickup,
                model.rides[0].delivery,
                model.rides[1].delivery,
            ],
        );
        assert!(schedule.is_feasible, "{:?}", schedule.violation);
    }

    #[test]
    fn preboarded_occupancy_blocks_overlapping_ride() {
        let mut v = vehicle("v1", 1, 0);
        v.active_ride_id_pre_boarded = Some("pre".to_string());
        let pre = ride("pre", (9.0, 0.0), (1.0, 0.0));
        let other = ride("other", (0.2, 0.0), (0.6, 0.0));
        let problem = problem_with(vec![v], vec![pre, other]);
        let model = model_for(&problem);

        // picking the other ride up before the pre-boarded delivery needs 2 seats
        let schedule = simulate(
            &model,
            0,
            &[
                model.rides[1].pickup,
                model.rides[1].delivery,
                model.rides[0].delivery,
            ],
        );
        assert!(!schedule.is_feasible);

        // delivering the pre-boarded passenger first frees the seat
        let schedule = simulate(
            &model,
            0,
            &[
                model.rides[0].delivery,
                model.rides[1].pickup,
                model.rides[1].delivery,
            ],
        );
        assert!(schedule.is_feasible, "{:?}", schedule.violation);
    }
}
