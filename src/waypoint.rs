use std::{error::Error, fmt::Display};

/// Number of values describing one waypoint in a flat sequence: `x`, `y`, `t`.
pub const VALUES_PER_WAYPOINT: usize = 3;

/// Spatial axis of a waypoint. The fitter solves one independent problem per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];
}

/// Waypoint represents position through which the path passes at given time.
/// - `x` - coordinate,
/// - `y` - coordinate,
/// - `t` - time at which the path reaches (`x`, `y`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    x: f64,
    y: f64,
    t: f64,
}

impl Waypoint {
    /// # Example
    /// ```
    /// use path_spline::Waypoint;
    ///
    /// let waypoint = Waypoint::new(1.0, 3.0, 0.5);
    /// assert_eq!(waypoint.get_t(), 0.5);
    /// ```
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Waypoint { x, y, t }
    }

    /// Splits flat sequence `x1, y1, t1, x2, y2, t2, ...` into waypoints.
    /// # Example
    /// ```
    /// use path_spline::Waypoint;
    ///
    /// let waypoints = Waypoint::from_flat(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(waypoints.len(), 2);
    /// assert_eq!(waypoints[1], Waypoint::new(1.0, 1.0, 1.0));
    /// ```
    /// # Errors
    /// Error is returned when length of `values` is not a multiple of 3.
    /// ```
    /// use path_spline::Waypoint;
    ///
    /// assert!(Waypoint::from_flat(&[0.0, 0.0, 0.0, 1.0]).is_err());
    /// ```
    pub fn from_flat(values: &[f64]) -> Result<Vec<Self>, Box<dyn Error>> {
        if values.len() % VALUES_PER_WAYPOINT != 0 {
            return Err(Box::new(WaypointError(format!(
                "{} values can not be split into (x, y, t) triples",
                values.len()
            ))));
        }

        Ok(values
            .chunks_exact(VALUES_PER_WAYPOINT)
            .map(|chunk| Waypoint::new(chunk[0], chunk[1], chunk[2]))
            .collect())
    }

    pub fn get_x(&self) -> f64 {
        self.x
    }

    pub fn get_y(&self) -> f64 {
        self.y
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn coordinate(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

#[derive(Debug)]
pub struct WaypointError(String);

impl Display for WaypointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in Waypoint: {}", self.0)
    }
}

impl Error for WaypointError {}
