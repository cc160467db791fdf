use std::{error::Error, fmt::Display};

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};

use crate::{
    linear_system,
    segment::{HermiteCubic, Segment},
    waypoint::{Axis, Waypoint},
};

/// State of the path at time `t`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectorySample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub acceleration_x: f64,
    pub acceleration_y: f64,
}

/// C1 continuous path through time tagged waypoints built from one Hermite cubic per segment.
pub struct Spline {
    waypoints: Vec<Waypoint>,
    x_tangents: DVector<f64>,
    y_tangents: DVector<f64>,
    segments: Vec<Segment>,
}

impl Spline {
    /// Fits spline through `waypoints`. Waypoints must be ordered by strictly increasing time.
    /// # Errors
    /// - [SplineError::NotEnoughWaypoints] for less than 2 waypoints,
    /// - [SplineError::NonIncreasingTime] when time does not strictly increase,
    /// - [SplineError::NonFiniteSystem] when adjacent interior waypoints share `y` coordinate,
    /// - [linear_system::LinearSystemError] when tangent system of any axis is degenerate.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, Box<dyn Error>> {
        if waypoints.len() < 2 {
            return Err(Box::new(SplineError::NotEnoughWaypoints { count: waypoints.len() }));
        }

        let size = waypoints.len();
        let mut spline = Spline {
            waypoints,
            x_tangents: DVector::zeros(size),
            y_tangents: DVector::zeros(size),
            segments: Vec::with_capacity(size - 1),
        };

        spline.check_time_ordering()?;
        debug!("Fitting spline through {} waypoints", size);
        spline.calculate_tangents()?;
        spline.calculate_segments();
        debug!(
            "Finished fitting spline over t in [{}, {}]",
            spline.start_time(),
            spline.end_time()
        );
        Ok(spline)
    }

    /// Fits spline through flat sequence `x1, y1, t1, x2, y2, t2, ...`.
    /// # Example
    /// ```
    /// use path_spline::Spline;
    ///
    /// let spline = Spline::from_flat(&[0.0, 0.0, 0.0, 2.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(spline.waypoints().len(), 2);
    /// assert!(Spline::from_flat(&[0.0, 0.0, 0.0, 2.0]).is_err());
    /// ```
    pub fn from_flat(values: &[f64]) -> Result<Self, Box<dyn Error>> {
        Spline::new(Waypoint::from_flat(values)?)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Segment `k` spans from waypoint `k` to waypoint `k + 1`.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Solved time derivative of `axis` coordinate at every waypoint.
    pub fn tangents(&self, axis: Axis) -> &DVector<f64> {
        match axis {
            Axis::X => &self.x_tangents,
            Axis::Y => &self.y_tangents,
        }
    }

    pub fn start_time(&self) -> f64 {
        self.waypoints[0].get_t()
    }

    pub fn end_time(&self) -> f64 {
        self.waypoints[self.waypoints.len() - 1].get_t()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start_time() <= t && t <= self.end_time()
    }

    /// Index `i` of waypoint which ends segment containing `t`, so that `t[i-1] <= t < t[i]`.
    /// Time of the last waypoint belongs to the last segment.
    /// # Example
    /// ```
    /// use path_spline::Spline;
    ///
    /// let spline = Spline::from_flat(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(spline.locate(0.5), Some(1));
    /// assert_eq!(spline.locate(1.0), Some(2));
    /// assert_eq!(spline.locate(2.0), Some(2));
    /// assert_eq!(spline.locate(2.5), None);
    /// ```
    pub fn locate(&self, t: f64) -> Option<usize> {
        self.find_segment_index(t).map(|index| index + 1)
    }

    /// Position, velocity and acceleration at `t`.
    /// # Errors
    /// [SplineError::OutOfRange] when `t` is outside of waypoints time span.
    pub fn sample(&self, t: f64) -> Result<TrajectorySample, Box<dyn Error>> {
        match self.find_segment_index(t) {
            Some(index) => Ok(self.sample_segment(index, t)),
            None => Err(Box::new(self.out_of_range(t))),
        }
    }

    /// Samples every time in `t_vector`. Consecutive times are expected to be close to each
    /// other, previous segment is checked first.
    pub fn batch_sample(&self, t_vector: &[f64]) -> Result<Vec<TrajectorySample>, Box<dyn Error>> {
        if let Some(t) = t_vector.iter().find(|t| !self.contains(**t)) {
            return Err(Box::new(self.out_of_range(*t)));
        }

        let mut results = Vec::with_capacity(t_vector.len());
        let mut index = 0;

        for t in t_vector {
            index = self.find_segment_index_with_hint(index, *t);
            results.push(self.sample_segment(index, *t));
        }
        Ok(results)
    }

    /// `x` coordinate at `t`, `0.0` outside of waypoints time span.
    pub fn x(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::X, Segment::position)
    }

    /// `y` coordinate at `t`, `0.0` outside of waypoints time span.
    pub fn y(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::Y, Segment::position)
    }

    pub fn velocity_x(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::X, Segment::velocity)
    }

    pub fn velocity_y(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::Y, Segment::velocity)
    }

    pub fn acceleration_x(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::X, Segment::acceleration)
    }

    pub fn acceleration_y(&self, t: f64) -> f64 {
        self.evaluate_or_zero(t, Axis::Y, Segment::acceleration)
    }

    fn check_time_ordering(&self) -> Result<(), Box<dyn Error>> {
        for (i, pair) in self.waypoints.windows(2).enumerate() {
            // negated so that NaN is rejected too
            if !(pair[1].get_t() > pair[0].get_t()) {
                return Err(Box::new(SplineError::NonIncreasingTime { index: i + 1 }));
            }
        }
        Ok(())
    }

    fn calculate_tangents(&mut self) -> Result<(), Box<dyn Error>> {
        let matrix = self.tangent_matrix();
        if matrix.iter().any(|value| !value.is_finite()) {
            return Err(Box::new(SplineError::NonFiniteSystem));
        }

        for axis in Axis::ALL {
            let rhs = self.tangent_rhs(axis);
            let tangents = linear_system::solve(&matrix, &rhs)?;
            trace!("{:?} tangents: {:?}", axis, tangents.as_slice());

            match axis {
                Axis::X => self.x_tangents = tangents,
                Axis::Y => self.y_tangents = tangents,
            }
        }
        Ok(())
    }

    /// Coefficients shared by both axes. Interior rows are weighted with reciprocals of `y`
    /// differences, boundary rows with reciprocals of time spans.
    fn tangent_matrix(&self) -> DMatrix<f64> {
        let size = self.waypoints.len();
        let mut matrix = DMatrix::<f64>::zeros(size, size);

        for i in 1..size - 1 {
            let previous = 1.0 / (self.waypoints[i].get_y() - self.waypoints[i - 1].get_y());
            let next = 1.0 / (self.waypoints[i + 1].get_y() - self.waypoints[i].get_y());

            matrix[(i, i - 1)] = previous;
            matrix[(i, i)] = 2.0 * (previous + next);
            matrix[(i, i + 1)] = next;
        }

        let first_span = self.span(1);
        matrix[(0, 0)] = 2.0 / first_span;
        matrix[(0, 1)] = 1.0 / first_span;

        let last_span = self.span(size - 1);
        matrix[(size - 1, size - 2)] = 1.0 / last_span;
        matrix[(size - 1, size - 1)] = 2.0 / last_span;

        matrix
    }

    fn tangent_rhs(&self, axis: Axis) -> DVector<f64> {
        let size = self.waypoints.len();
        let weighted_delta = |i: usize| {
            let span = self.span(i);
            (self.waypoints[i].coordinate(axis) - self.waypoints[i - 1].coordinate(axis)) / (span * span)
        };

        DVector::<f64>::from_fn(size, |i, _| {
            if i == 0 {
                3.0 * weighted_delta(1)
            } else if i == size - 1 {
                3.0 * weighted_delta(size - 1)
            } else {
                3.0 * (weighted_delta(i) + weighted_delta(i + 1))
            }
        })
    }

    fn calculate_segments(&mut self) {
        for i in 1..self.waypoints.len() {
            let start = &self.waypoints[i - 1];
            let end = &self.waypoints[i];
            let duration = self.span(i);

            let cubic = |axis: Axis| {
                let tangents = self.tangents(axis);
                HermiteCubic::from_tangents(
                    start.coordinate(axis),
                    end.coordinate(axis),
                    tangents[i - 1],
                    tangents[i],
                    duration,
                )
            };

            let segment = Segment::new(start.get_t(), end.get_t(), cubic(Axis::X), cubic(Axis::Y));
            self.segments.push(segment);
        }
    }

    /// Time span of segment ending at waypoint `i`.
    fn span(&self, i: usize) -> f64 {
        self.waypoints[i].get_t() - self.waypoints[i - 1].get_t()
    }

    fn evaluate_or_zero(&self, t: f64, axis: Axis, quantity: fn(&Segment, Axis, f64) -> f64) -> f64 {
        match self.find_segment_index(t) {
            Some(index) => {
                let segment = &self.segments[index];
                quantity(segment, axis, segment.normalize(t))
            }
            None => 0.0,
        }
    }

    fn sample_segment(&self, index: usize, t: f64) -> TrajectorySample {
        let segment = &self.segments[index];
        let c = segment.normalize(t);

        TrajectorySample {
            t,
            x: segment.position(Axis::X, c),
            y: segment.position(Axis::Y, c),
            velocity_x: segment.velocity(Axis::X, c),
            velocity_y: segment.velocity(Axis::Y, c),
            acceleration_x: segment.acceleration(Axis::X, c),
            acceleration_y: segment.acceleration(Axis::Y, c),
        }
    }

    fn find_segment_index(&self, t: f64) -> Option<usize> {
        if !self.contains(t) {
            return None;
        }

        let mut min = 0;
        let mut max = self.waypoints.len() - 1;

        while max - min > 1 {
            let mid = (min + max) / 2;
            if t < self.waypoints[mid].get_t() {
                max = mid;
            } else {
                min = mid;
            }
        }
        Some(min)
    }

    fn find_segment_index_with_hint(&self, index_hint: usize, t: f64) -> usize {
        if self.is_in_segment(index_hint, t) {
            return index_hint;
        }
        if index_hint + 1 < self.segments.len() && self.is_in_segment(index_hint + 1, t) {
            return index_hint + 1;
        }
        self.find_segment_index(t).unwrap_or(index_hint)
    }

    fn is_in_segment(&self, index: usize, t: f64) -> bool {
        let segment = &self.segments[index];
        let is_last = index == self.segments.len() - 1;

        segment.get_t_start() <= t && (t < segment.get_t_end() || (is_last && t == segment.get_t_end()))
    }

    fn out_of_range(&self, t: f64) -> SplineError {
        SplineError::OutOfRange {
            t,
            start: self.start_time(),
            end: self.end_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplineError {
    NotEnoughWaypoints { count: usize },
    NonIncreasingTime { index: usize },
    NonFiniteSystem,
    OutOfRange { t: f64, start: f64, end: f64 },
}

impl Display for SplineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplineError::NotEnoughWaypoints { count } => {
                write!(f, "Error in Spline: at least 2 waypoints are required, got {}", count)
            }
            SplineError::NonIncreasingTime { index } => write!(
                f,
                "Error in Spline: time of waypoint {} is not greater than time of waypoint {}",
                index,
                index - 1
            ),
            SplineError::NonFiniteSystem => write!(
                f,
                "Error in Spline: tangent system is not finite, adjacent waypoints share y coordinate"
            ),
            SplineError::OutOfRange { t, start, end } => {
                write!(f, "Error in Spline: t = {} is out of range [{}, {}]", t, start, end)
            }
        }
    }
}

impl Error for SplineError {}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;

    use super::*;
    use crate::linear_system::LinearSystemError;

    const DEFAULT_PATH: [f64; 12] = [
        0.0, 0.0, 0.0,
        1.0, 1.0, 1.0,
        2.0, 3.0, 2.0,
        0.0, 4.0, 3.0,
    ];

    fn assert_all_zero(spline: &Spline, t: f64) {
        assert_eq!(spline.x(t), 0.0);
        assert_eq!(spline.y(t), 0.0);
        assert_eq!(spline.velocity_x(t), 0.0);
        assert_eq!(spline.velocity_y(t), 0.0);
        assert_eq!(spline.acceleration_x(t), 0.0);
        assert_eq!(spline.acceleration_y(t), 0.0);
    }

    fn assert_c1_at_waypoints(spline: &Spline, eps: f64) {
        for k in 0..spline.segments.len() - 1 {
            let left = &spline.segments[k];
            let right = &spline.segments[k + 1];

            for axis in Axis::ALL {
                let waypoint = spline.waypoints[k + 1].coordinate(axis);
                let tangent = spline.tangents(axis)[k + 1];

                assert_approx_eq!(left.position(axis, 1.0), waypoint, eps);
                assert_approx_eq!(right.position(axis, 0.0), waypoint, eps);
                assert_approx_eq!(left.velocity(axis, 1.0), tangent, eps);
                assert_approx_eq!(right.velocity(axis, 0.0), tangent, eps);
            }
        }
    }

    #[test]
    fn default_path() {
        let eps = 1e-9;
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        assert_eq!(spline.segments.len(), 3);

        assert_approx_eq!(spline.x(0.0), 0.0, eps);
        assert_approx_eq!(spline.y(0.0), 0.0, eps);
        assert_approx_eq!(spline.x(1.0), 1.0, eps);
        assert_approx_eq!(spline.y(1.0), 1.0, eps);
        assert_approx_eq!(spline.x(2.0), 2.0, eps);
        assert_approx_eq!(spline.y(2.0), 3.0, eps);
        assert_approx_eq!(spline.x(3.0), 0.0, eps);
        assert_approx_eq!(spline.y(3.0), 4.0, eps);

        assert_all_zero(&spline, -1.0);
        assert_all_zero(&spline, 3.5);
        assert_all_zero(&spline, f64::NAN);
    }

    #[test]
    fn default_path_tangents_satisfy_equations() {
        let eps = 1e-9;
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();
        let dx = spline.tangents(Axis::X);
        let dy = spline.tangents(Axis::Y);

        // unit time spans: boundary rows read 2 * d0 + d1 = 3 * delta
        assert_approx_eq!(2.0 * dx[0] + dx[1], 3.0, eps);
        assert_approx_eq!(2.0 * dy[0] + dy[1], 3.0, eps);
        assert_approx_eq!(dx[2] + 2.0 * dx[3], -6.0, eps);
        assert_approx_eq!(dy[2] + 2.0 * dy[3], 3.0, eps);

        // interior row 1 uses y differences 1 and 2
        assert_approx_eq!(dx[0] + 3.0 * dx[1] + 0.5 * dx[2], 6.0, eps);
        assert_approx_eq!(dy[0] + 3.0 * dy[1] + 0.5 * dy[2], 9.0, eps);
    }

    #[test]
    fn default_path_continuity() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();
        assert_c1_at_waypoints(&spline, 1e-9);

        let h = 1e-9;
        for t in [1.0, 2.0] {
            assert_approx_eq!(spline.velocity_x(t - h), spline.velocity_x(t), 1e-6);
            assert_approx_eq!(spline.velocity_y(t - h), spline.velocity_y(t), 1e-6);
        }
    }

    #[test]
    fn acceleration_depends_on_coefficients_only() {
        let eps = 1e-9;
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        for t in [0.25, 1.5, 2.75] {
            let index = spline.locate(t).unwrap();
            let segment = &spline.segments[index - 1];
            let dt = segment.duration();
            let c = segment.normalize(t);

            let a = segment.cubic(Axis::X).get_a();
            let b = segment.cubic(Axis::X).get_b();
            let expected = 2.0 * (b - 2.0 * a + (a - b) * 3.0 * c) / (dt * dt);

            assert_approx_eq!(spline.acceleration_x(t), expected, eps);
        }
    }

    #[test]
    fn reproduces_uniform_motion() {
        // y advances together with time, which makes the system a regular clamped spline
        let eps = 1e-9;
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(3.0, 1.0, 1.0),
            Waypoint::new(9.0, 3.0, 3.0),
            Waypoint::new(12.0, 4.0, 4.0),
        ];
        let spline = Spline::new(waypoints).unwrap();

        for t in [0.0, 0.4, 1.0, 1.7, 2.5, 3.2, 4.0] {
            let sample = spline.sample(t).unwrap();

            assert_approx_eq!(sample.x, 3.0 * t, eps);
            assert_approx_eq!(sample.y, t, eps);
            assert_approx_eq!(sample.velocity_x, 3.0, eps);
            assert_approx_eq!(sample.velocity_y, 1.0, eps);
            assert_approx_eq!(sample.acceleration_x, 0.0, eps);
            assert_approx_eq!(sample.acceleration_y, 0.0, eps);
        }
    }

    #[test]
    fn two_waypoints() {
        let eps = 1e-9;
        let spline = Spline::new(vec![Waypoint::new(1.0, 2.0, 0.0), Waypoint::new(3.0, 2.0, 2.0)]).unwrap();

        assert_approx_eq!(spline.x(1.0), 2.0, eps);
        assert_approx_eq!(spline.y(1.0), 2.0, eps);
        assert_approx_eq!(spline.velocity_x(0.5), 1.0, eps);
        assert_approx_eq!(spline.velocity_y(0.5), 0.0, eps);
    }

    #[test]
    fn locate() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        assert_eq!(spline.locate(-0.1), None);
        assert_eq!(spline.locate(0.0), Some(1));
        assert_eq!(spline.locate(0.99), Some(1));
        assert_eq!(spline.locate(1.0), Some(2));
        assert_eq!(spline.locate(2.5), Some(3));
        assert_eq!(spline.locate(3.0), Some(3));
        assert_eq!(spline.locate(3.01), None);
        assert_eq!(spline.locate(f64::NAN), None);
    }

    #[test]
    fn sample_matches_single_queries() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        for t in [0.0, 0.3, 1.0, 1.9, 2.2, 3.0] {
            let sample = spline.sample(t).unwrap();

            assert_eq!(sample.t, t);
            assert_eq!(sample.x, spline.x(t));
            assert_eq!(sample.y, spline.y(t));
            assert_eq!(sample.velocity_x, spline.velocity_x(t));
            assert_eq!(sample.velocity_y, spline.velocity_y(t));
            assert_eq!(sample.acceleration_x, spline.acceleration_x(t));
            assert_eq!(sample.acceleration_y, spline.acceleration_y(t));
        }
    }

    #[test]
    fn sample_out_of_range() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();
        let error = spline.sample(3.5).unwrap_err();

        assert_eq!(
            error.downcast_ref::<SplineError>(),
            Some(&SplineError::OutOfRange { t: 3.5, start: 0.0, end: 3.0 })
        );
    }

    #[test]
    fn batch_sample() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        let t_vector = vec![0.0, 0.5, 1.0, 1.25, 2.9, 3.0, 0.1, 2.0];
        let result = spline.batch_sample(&t_vector).unwrap();

        assert_eq!(t_vector.len(), result.len());
        for (t, sample) in t_vector.iter().zip(result.iter()) {
            assert_eq!(*sample, spline.sample(*t).unwrap());
        }

        let t_vector = vec![0.0, 1.0, 4.0];
        assert!(spline.batch_sample(&t_vector).is_err());
    }

    #[test]
    fn not_enough_waypoints() {
        let error = Spline::new(vec![Waypoint::new(0.0, 0.0, 0.0)]).err().unwrap();
        assert_eq!(
            error.downcast_ref::<SplineError>(),
            Some(&SplineError::NotEnoughWaypoints { count: 1 })
        );

        assert!(Spline::from_flat(&[]).is_err());
    }

    #[test]
    fn malformed_flat_sequence() {
        assert!(Spline::from_flat(&DEFAULT_PATH[..11]).is_err());
    }

    #[test]
    fn non_increasing_time() {
        let values = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 3.0, 1.0];
        let error = Spline::from_flat(&values).err().unwrap();

        assert_eq!(
            error.downcast_ref::<SplineError>(),
            Some(&SplineError::NonIncreasingTime { index: 2 })
        );
    }

    #[test]
    fn repeated_y_coordinate() {
        let values = [0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 2.0, 1.0, 2.0];
        let error = Spline::from_flat(&values).err().unwrap();

        assert_eq!(error.downcast_ref::<SplineError>(), Some(&SplineError::NonFiniteSystem));
    }

    #[test]
    fn degenerate_tangent_system() {
        // y differences 1 and -1 cancel on the diagonal of the interior row
        let values = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0];
        let error = Spline::from_flat(&values).err().unwrap();

        assert_eq!(
            error.downcast_ref::<LinearSystemError>(),
            Some(&LinearSystemError::Singular)
        );
    }

    #[test]
    fn random_waypoints_are_c1() {
        let mut rng = rand::thread_rng();

        for _ in 0..20 {
            let number_of_waypoints = rng.gen_range(2..7);
            let mut t = 0.0;
            let mut y = rng.gen_range(-5.0..5.0);
            let mut waypoints = Vec::with_capacity(number_of_waypoints);

            for _ in 0..number_of_waypoints {
                waypoints.push(Waypoint::new(rng.gen_range(-10.0..10.0), y, t));
                t += rng.gen_range(0.5..2.0);
                y += rng.gen_range(0.5..2.0);
            }

            let spline = Spline::new(waypoints.clone()).unwrap();

            for waypoint in waypoints.iter() {
                assert_approx_eq!(spline.x(waypoint.get_t()), waypoint.get_x(), 1e-9);
                assert_approx_eq!(spline.y(waypoint.get_t()), waypoint.get_y(), 1e-9);
            }
            assert_c1_at_waypoints(&spline, 1e-6);
        }
    }

    #[ignore]
    #[test]
    fn print_default_path() {
        let spline = Spline::from_flat(&DEFAULT_PATH).unwrap();

        let number_of_points = 30;
        let step = (spline.end_time() - spline.start_time()) / number_of_points as f64;
        println!("t;x;y;vx;vy");
        for i in 0..=number_of_points {
            let t = spline.start_time() + step * i as f64;
            let sample = spline.sample(t).unwrap();
            println!(
                "{:.2};{:.3};{:.3};{:.3};{:.3}",
                t, sample.x, sample.y, sample.velocity_x, sample.velocity_y
            );
        }
    }
}
