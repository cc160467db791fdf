//! Smooth trajectory through time tagged 2D waypoints.
//!
//! Both coordinates are fitted independently as piecewise Hermite cubics of time. Tangents at
//! waypoints come from a small linear system solved with Cramer's rule, which keeps position
//! and velocity continuous at every waypoint. Position, velocity and acceleration can be
//! queried at any time within the waypoints time span, e.g. as motion profile references.
//!
//! # Example
//! ```
//! use path_spline::{Spline, Waypoint};
//! use assert_approx_eq::assert_approx_eq;
//!
//! let waypoints = vec![
//!     Waypoint::new(0.0, 0.0, 0.0),
//!     Waypoint::new(1.0, 1.0, 1.0),
//!     Waypoint::new(2.0, 3.0, 2.0),
//!     Waypoint::new(0.0, 4.0, 3.0),
//! ];
//! let spline = Spline::new(waypoints).unwrap();
//!
//! assert_approx_eq!(spline.x(2.0), 2.0, 1e-9);
//! assert_approx_eq!(spline.y(3.0), 4.0, 1e-9);
//!
//! // outside of the time span every query is zero, `sample` reports an error instead
//! assert_eq!(spline.velocity_x(3.5), 0.0);
//! assert!(spline.sample(3.5).is_err());
//! ```

pub mod linear_system;
mod segment;
mod spline;
mod waypoint;

pub use linear_system::LinearSystemError;
pub use segment::{HermiteCubic, Segment};
pub use spline::{Spline, SplineError, TrajectorySample};
pub use waypoint::{Axis, Waypoint, WaypointError};
