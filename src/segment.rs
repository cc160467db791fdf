use crate::waypoint::Axis;

/// Hermite cubic of a single axis over one segment, expressed in normalized parameter `c` in `[0, 1]`:
///
/// `p(c) = (1 - c) * start + c * end + c * (1 - c) * (a * (1 - c) + b * c)`
///
/// With `a = d0 * dt - (end - start)` and `b = -d1 * dt + (end - start)` the curve leaves `start`
/// with slope `d0` and reaches `end` with slope `d1` (slopes taken with respect to time).
#[derive(Debug, Clone, PartialEq)]
pub struct HermiteCubic {
    start: f64,
    end: f64,
    a: f64,
    b: f64,
}

impl HermiteCubic {
    pub fn new(start: f64, end: f64, a: f64, b: f64) -> Self {
        HermiteCubic { start, end, a, b }
    }

    /// Builds cubic from endpoint values, endpoint slopes and time span of the segment.
    pub fn from_tangents(start: f64, end: f64, start_tangent: f64, end_tangent: f64, duration: f64) -> Self {
        let delta = end - start;
        HermiteCubic {
            start,
            end,
            a: start_tangent * duration - delta,
            b: -end_tangent * duration + delta,
        }
    }

    pub fn get_a(&self) -> f64 {
        self.a
    }

    pub fn get_b(&self) -> f64 {
        self.b
    }

    pub fn evaluate(&self, c: f64) -> f64 {
        (1.0 - c) * self.start + c * self.end + c * (1.0 - c) * (self.a * (1.0 - c) + self.b * c)
    }

    /// First derivative with respect to `c`.
    pub fn derivative(&self, c: f64) -> f64 {
        self.end - self.start
            + (1.0 - 2.0 * c) * (self.a * (1.0 - c) + self.b * c)
            + c * (1.0 - c) * (self.b - self.a)
    }

    /// Second derivative with respect to `c`. Depends only on `a` and `b`.
    pub fn second_derivative(&self, c: f64) -> f64 {
        2.0 * (self.b - 2.0 * self.a + (self.a - self.b) * 3.0 * c)
    }
}

/// Part of the path between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    t_start: f64,
    t_end: f64,
    x: HermiteCubic,
    y: HermiteCubic,
}

impl Segment {
    pub fn new(t_start: f64, t_end: f64, x: HermiteCubic, y: HermiteCubic) -> Self {
        Segment { t_start, t_end, x, y }
    }

    pub fn get_t_start(&self) -> f64 {
        self.t_start
    }

    pub fn get_t_end(&self) -> f64 {
        self.t_end
    }

    pub fn duration(&self) -> f64 {
        self.t_end - self.t_start
    }

    pub fn cubic(&self, axis: Axis) -> &HermiteCubic {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Fractional progress of `t` through the segment.
    pub fn normalize(&self, t: f64) -> f64 {
        (t - self.t_start) / self.duration()
    }

    pub fn position(&self, axis: Axis, c: f64) -> f64 {
        self.cubic(axis).evaluate(c)
    }

    pub fn velocity(&self, axis: Axis, c: f64) -> f64 {
        self.cubic(axis).derivative(c) / self.duration()
    }

    pub fn acceleration(&self, axis: Axis, c: f64) -> f64 {
        let duration = self.duration();
        self.cubic(axis).second_derivative(c) / (duration * duration)
    }
}
