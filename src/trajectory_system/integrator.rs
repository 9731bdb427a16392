//! Adaptive Runge-Kutta-Fehlberg 4(5) integration with event location.
//!
//! Each step evaluates the six Fehlberg stages, advances with the fifth-order
//! solution and uses the difference to the embedded fourth-order solution as
//! the local error estimate. Steps whose scaled error exceeds one are retried
//! with a smaller step unless the step is already at the configured floor.
//!
//! Events are scalar functions of `(t, y)` checked after every accepted step.
//! When one changes sign in the watched direction, the crossing is bracketed
//! by bisection on the step size, re-stepping from the start of the accepted
//! step, until the bracket is narrower than [`EVENT_TIME_TOLERANCE`].

use tracing::{trace, warn};

use crate::constants::{
    DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_INITIAL_STEP, DEFAULT_MAX_STEP, DEFAULT_MIN_STEP,
    DEFAULT_RELATIVE_TOLERANCE, EVENT_TIME_TOLERANCE,
};
use crate::errors::{Result, SimulationError};

const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MAX_SHRINK: f64 = 0.2;
const MAX_BISECTIONS: usize = 200;

// Fehlberg 4(5) tableau.
const C: [f64; 6] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
    [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
    [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0],
    [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
];
const B5: [f64; 6] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];
const B4: [f64; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

/// Right-hand side `dy/dt = f(t, y)` of a first-order system.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &[f64; N]) -> Result<[f64; N]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    /// Negative to non-negative.
    Rising,
    /// Positive to non-positive.
    Falling,
    Any,
}

impl EventDirection {
    pub fn crossed(&self, before: f64, after: f64) -> bool {
        match self {
            EventDirection::Rising => before < 0.0 && after >= 0.0,
            EventDirection::Falling => before > 0.0 && after <= 0.0,
            EventDirection::Any => {
                EventDirection::Rising.crossed(before, after)
                    || EventDirection::Falling.crossed(before, after)
            }
        }
    }

    /// Already past the crossing, so the event holds at the initial point.
    pub fn satisfied(&self, value: f64) -> bool {
        match self {
            EventDirection::Rising => value > 0.0,
            EventDirection::Falling => value < 0.0,
            EventDirection::Any => false,
        }
    }
}

/// Scalar condition whose sign change ends an integration.
pub trait EventFunction<const N: usize> {
    fn eval(&self, t: f64, y: &[f64; N]) -> f64;

    fn direction(&self) -> EventDirection {
        EventDirection::Any
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerances {
    pub fn new(relative: f64, absolute: f64) -> Self {
        Tolerances { relative, absolute }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances::new(DEFAULT_RELATIVE_TOLERANCE, DEFAULT_ABSOLUTE_TOLERANCE)
    }
}

/// Counters accumulated across every integration run by one [`Rkf45`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
    /// Steps accepted at the minimum step size despite a failing error test.
    pub forced: usize,
}

/// How an integration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Reached the requested end time.
    Completed,
    /// The event at this index of the watched list fired.
    Event(usize),
}

/// Accepted points of one run, starting with the initial state.
#[derive(Debug, Clone)]
pub struct Segment<const N: usize> {
    pub points: Vec<(f64, [f64; N])>,
    pub termination: Termination,
}

impl<const N: usize> Segment<N> {
    /// Final `(t, y)`; a segment always holds at least its initial point.
    pub fn last(&self) -> (f64, [f64; N]) {
        self.points[self.points.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct Rkf45 {
    pub tolerances: Tolerances,
    pub initial_step: f64,
    pub max_step: f64,
    pub min_step: f64,
    stats: StepStats,
}

impl Default for Rkf45 {
    fn default() -> Self {
        Rkf45::new(Tolerances::default())
    }
}

impl Rkf45 {
    pub fn new(tolerances: Tolerances) -> Self {
        Rkf45 {
            tolerances,
            initial_step: DEFAULT_INITIAL_STEP,
            max_step: DEFAULT_MAX_STEP,
            min_step: DEFAULT_MIN_STEP,
            stats: StepStats::default(),
        }
    }

    pub fn with_steps(mut self, initial_step: f64, min_step: f64, max_step: f64) -> Self {
        self.initial_step = initial_step;
        self.min_step = min_step;
        self.max_step = max_step;
        self
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// One Fehlberg step of size `h`: fifth-order solution and error vector.
    ///
    /// Stage times are capped at `t_stop` so the last stage of a step that
    /// ends on a boundary never evaluates past it through round-off.
    fn step<const N: usize, S: OdeSystem<N>>(
        &mut self,
        system: &S,
        t: f64,
        y: &[f64; N],
        h: f64,
        t_stop: f64,
    ) -> Result<([f64; N], [f64; N])> {
        let mut k = [[0.0; N]; 6];
        for stage in 0..6 {
            let mut y_stage = *y;
            for (j, k_j) in k.iter().enumerate().take(stage) {
                let a = A[stage][j];
                if a != 0.0 {
                    for i in 0..N {
                        y_stage[i] += h * a * k_j[i];
                    }
                }
            }
            k[stage] = system.rhs((t + C[stage] * h).min(t_stop), &y_stage)?;
            self.stats.evaluations += 1;
        }

        let mut y_next = *y;
        let mut error = [0.0; N];
        for i in 0..N {
            let mut high = 0.0;
            let mut low = 0.0;
            for stage in 0..6 {
                high += B5[stage] * k[stage][i];
                low += B4[stage] * k[stage][i];
            }
            y_next[i] += h * high;
            error[i] = h * (high - low);
        }
        Ok((y_next, error))
    }

    /// RMS of the error scaled by the mixed tolerance; one is the boundary.
    fn error_norm<const N: usize>(&self, y: &[f64; N], y_next: &[f64; N], error: &[f64; N]) -> f64 {
        let sum: f64 = (0..N)
            .map(|i| {
                let scale = self.tolerances.absolute
                    + self.tolerances.relative * y[i].abs().max(y_next[i].abs());
                (error[i] / scale).powi(2)
            })
            .sum();
        (sum / N as f64).sqrt()
    }

    /// Integrates from `(t0, y0)` until `t_end` or the first watched event.
    pub fn integrate<const N: usize, S: OdeSystem<N>>(
        &mut self,
        system: &S,
        events: &[&dyn EventFunction<N>],
        t0: f64,
        y0: &[f64; N],
        t_end: f64,
    ) -> Result<Segment<N>> {
        let mut points = vec![(t0, *y0)];

        for (index, event) in events.iter().enumerate() {
            if event.direction().satisfied(event.eval(t0, y0)) {
                return Ok(Segment {
                    points,
                    termination: Termination::Event(index),
                });
            }
        }

        let mut t = t0;
        let mut y = *y0;
        let mut h = self.initial_step.min(self.max_step).max(self.min_step);

        while t < t_end {
            let remaining = t_end - t;
            let last_step = h >= remaining;
            let h_try = if last_step { remaining } else { h };

            let t_next = if last_step { t_end } else { t + h_try };
            let (y_next, error) = self.step(system, t, &y, h_try, t_next)?;
            let norm = self.error_norm(&y, &y_next, &error);

            let mut forced = false;
            if !norm.is_finite() || norm > 1.0 {
                if h_try > self.min_step {
                    self.stats.rejected += 1;
                    let factor = if norm.is_finite() {
                        (SAFETY * norm.powf(-0.2)).max(MAX_SHRINK)
                    } else {
                        MAX_SHRINK
                    };
                    h = (h_try * factor).max(self.min_step);
                    continue;
                }
                if !norm.is_finite() {
                    return Err(SimulationError::domain("step error estimate", norm));
                }
                self.stats.forced += 1;
                forced = true;
            }
            self.stats.accepted += 1;

            if let Some((index, t_event, y_event)) =
                self.locate_event(system, events, t, &y, h_try, &y_next)?
            {
                trace!(index, t = t_event, forced, "event located");
                points.push((t_event, y_event));
                return Ok(Segment {
                    points,
                    termination: Termination::Event(index),
                });
            }
            // A discontinuity at an event boundary forces the floor step
            // routinely; anywhere else it means the tolerances are too tight.
            if forced {
                warn!(t, h = h_try, norm, "accepting step at the minimum step size");
            }

            t = t_next;
            y = y_next;
            points.push((t, y));

            let growth = if norm > 0.0 {
                (SAFETY * norm.powf(-0.2)).clamp(MAX_SHRINK, MAX_GROWTH)
            } else {
                MAX_GROWTH
            };
            h = (h_try * growth).clamp(self.min_step, self.max_step);
        }

        Ok(Segment {
            points,
            termination: Termination::Completed,
        })
    }

    /// Earliest crossing inside the accepted step from `(t, y)` of size `h`.
    fn locate_event<const N: usize, S: OdeSystem<N>>(
        &mut self,
        system: &S,
        events: &[&dyn EventFunction<N>],
        t: f64,
        y: &[f64; N],
        h: f64,
        y_next: &[f64; N],
    ) -> Result<Option<(usize, f64, [f64; N])>> {
        let mut earliest: Option<(usize, f64, [f64; N])> = None;

        for (index, event) in events.iter().enumerate() {
            let direction = event.direction();
            let before = event.eval(t, y);
            if !direction.crossed(before, event.eval(t + h, y_next)) {
                continue;
            }

            let mut low = 0.0;
            let mut high = h;
            let mut y_high = *y_next;
            let mut iterations = 0;
            while high - low > EVENT_TIME_TOLERANCE && iterations < MAX_BISECTIONS {
                let mid = 0.5 * (low + high);
                let (y_mid, _) = self.step(system, t, y, mid, t + mid)?;
                if direction.crossed(before, event.eval(t + mid, &y_mid)) {
                    high = mid;
                    y_high = y_mid;
                } else {
                    low = mid;
                }
                iterations += 1;
            }

            let t_event = t + high;
            if earliest.map_or(true, |(_, t_best, _)| t_event < t_best) {
                earliest = Some((index, t_event, y_high));
            }
        }

        Ok(earliest)
    }
}
