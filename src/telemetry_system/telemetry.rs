use std::fmt;

use serde::{Deserialize, Serialize};

use crate::control::flight_phase::FlightPhase;
use crate::trajectory_system::kinematics::FlightState;
use crate::utils::vector2d::Vector2D;

/// One recorded point of the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub downrange: f64,
    pub altitude: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    /// Phase whose segment produced the sample; boundary samples belong to
    /// the phase that ends there.
    pub phase: FlightPhase,
}

impl TrajectorySample {
    pub fn from_state(state: &FlightState, phase: FlightPhase) -> Self {
        TrajectorySample {
            time: state.time,
            downrange: state.position.x,
            altitude: state.position.y,
            vx: state.velocity.x,
            vy: state.velocity.y,
            mass: state.mass,
            phase,
        }
    }

    pub fn velocity(&self) -> Vector2D {
        Vector2D::new(self.vx, self.vy)
    }

    pub fn speed(&self) -> f64 {
        self.velocity().magnitude()
    }
}

/// Key figures of a finished flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub apogee_altitude: f64,
    pub apogee_time: f64,
    pub burnout_time: Option<f64>,
    pub burnout_velocity: Option<f64>,
    pub deployment_time: Option<f64>,
    pub deployment_altitude: Option<f64>,
    pub landing_time: f64,
    pub landing_speed: f64,
    pub downrange: f64,
    pub max_speed: f64,
}

/// Time-ordered trajectory of a whole flight plus its phase log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSeries {
    samples: Vec<TrajectorySample>,
    transitions: Vec<(FlightPhase, f64)>,
    summary: FlightSummary,
}

impl FlightSeries {
    /// Builds the series; `samples` must be non-empty and time ordered.
    pub fn new(samples: Vec<TrajectorySample>, transitions: Vec<(FlightPhase, f64)>) -> Self {
        let summary = Self::summarize(&samples, &transitions);
        FlightSeries {
            samples,
            transitions,
            summary,
        }
    }

    fn summarize(
        samples: &[TrajectorySample],
        transitions: &[(FlightPhase, f64)],
    ) -> FlightSummary {
        let transition_time = |phase: FlightPhase| {
            transitions
                .iter()
                .find(|(entered, _)| *entered == phase)
                .map(|(_, time)| *time)
        };
        let sample_at = |time: f64| samples.iter().find(|sample| sample.time >= time);

        let apogee = samples
            .iter()
            .fold(None::<&TrajectorySample>, |best, sample| match best {
                Some(best) if best.altitude >= sample.altitude => Some(best),
                _ => Some(sample),
            });
        let last = samples.last();

        let burnout_time = transition_time(FlightPhase::Coast);
        let deployment_time = transition_time(FlightPhase::DescentParachute);

        FlightSummary {
            apogee_altitude: apogee.map_or(0.0, |sample| sample.altitude),
            apogee_time: apogee.map_or(0.0, |sample| sample.time),
            burnout_time,
            burnout_velocity: burnout_time
                .and_then(sample_at)
                .map(TrajectorySample::speed),
            deployment_time,
            deployment_altitude: deployment_time
                .and_then(sample_at)
                .map(|sample| sample.altitude),
            landing_time: last.map_or(0.0, |sample| sample.time),
            landing_speed: last.map_or(0.0, TrajectorySample::speed),
            downrange: last.map_or(0.0, |sample| sample.downrange),
            max_speed: samples.iter().map(TrajectorySample::speed).fold(0.0, f64::max),
        }
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    /// `(phase, entry time)` in the order the phases were entered.
    pub fn transitions(&self) -> &[(FlightPhase, f64)] {
        &self.transitions
    }

    pub fn summary(&self) -> &FlightSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.time).collect()
    }

    pub fn altitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.altitude).collect()
    }

    pub fn downranges(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.downrange).collect()
    }

    pub fn vertical_velocities(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.vy).collect()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.mass).collect()
    }

    pub fn phase_at(&self, time: f64) -> Option<FlightPhase> {
        self.transitions
            .iter()
            .take_while(|(_, entered)| *entered <= time)
            .last()
            .map(|(phase, _)| *phase)
    }

    /// At most `count` samples spread evenly over the flight, always keeping
    /// the first and last one.
    pub fn downsample(&self, count: usize) -> Vec<&TrajectorySample> {
        let len = self.samples.len();
        if count >= len || count < 2 {
            return self.samples.iter().take(count).collect();
        }
        (0..count)
            .map(|i| &self.samples[i * (len - 1) / (count - 1)])
            .collect()
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 3600.0 {
            let hours = (elapsed_time / 3600.0).floor();
            let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
        } else if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    fn format_altitude(altitude: f64) -> String {
        if altitude >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }

    /// Human-readable flight report with `rows` trajectory lines.
    pub fn report(&self, rows: usize) -> FlightReport<'_> {
        FlightReport { series: self, rows }
    }
}

/// Text report of a flight, rendered through [`fmt::Display`].
#[derive(Debug, Clone, Copy)]
pub struct FlightReport<'a> {
    series: &'a FlightSeries,
    rows: usize,
}

impl fmt::Display for FlightReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let series = self.series;
        let summary = &series.summary;

        writeln!(f, "--- Trajectory ---")?;
        writeln!(
            f,
            "{:>10} {:>10} {:>10} {:>10} {:>8}  phase",
            "time", "altitude", "downrange", "vy", "mass"
        )?;
        for sample in series.downsample(self.rows) {
            writeln!(
                f,
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>8.3}  {}",
                FlightSeries::format_time(sample.time),
                sample.altitude,
                sample.downrange,
                sample.vy,
                sample.mass,
                sample.phase
            )?;
        }

        writeln!(f, "\n--- Flight Summary ---")?;
        writeln!(
            f,
            "Apogee: {} at {}",
            FlightSeries::format_altitude(summary.apogee_altitude),
            FlightSeries::format_time(summary.apogee_time)
        )?;
        if let (Some(time), Some(velocity)) = (summary.burnout_time, summary.burnout_velocity) {
            writeln!(
                f,
                "Burnout: {:.2} m/s at {}",
                velocity,
                FlightSeries::format_time(time)
            )?;
        }
        if let (Some(time), Some(altitude)) = (summary.deployment_time, summary.deployment_altitude)
        {
            writeln!(
                f,
                "Parachute Deployment: {} at {}",
                FlightSeries::format_altitude(altitude),
                FlightSeries::format_time(time)
            )?;
        }
        writeln!(f, "Max Speed: {:.2} m/s", summary.max_speed)?;
        writeln!(
            f,
            "Landing: {:.2} m/s at {}, {} downrange",
            summary.landing_speed,
            FlightSeries::format_time(summary.landing_time),
            FlightSeries::format_altitude(summary.downrange)
        )?;

        writeln!(f, "\n--- Phase Transitions ---")?;
        for (phase, time) in &series.transitions {
            writeln!(f, "{} entered at {}", phase, FlightSeries::format_time(*time))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, altitude: f64, vy: f64, phase: FlightPhase) -> TrajectorySample {
        TrajectorySample {
            time,
            downrange: time,
            altitude,
            vx: 0.0,
            vy,
            mass: 1.0,
            phase,
        }
    }

    fn series() -> FlightSeries {
        use FlightPhase::*;
        FlightSeries::new(
            vec![
                sample(0.0, 0.0, 0.0, Ascent),
                sample(1.0, 40.0, 80.0, Ascent),
                sample(5.0, 200.0, 0.0, Coast),
                sample(6.0, 195.0, -10.0, DescentFreefall),
                sample(30.0, 0.0, -5.0, DescentParachute),
            ],
            vec![
                (Ascent, 0.0),
                (Coast, 1.0),
                (DescentFreefall, 5.0),
                (DescentParachute, 6.0),
                (Landed, 30.0),
            ],
        )
    }

    #[test]
    fn test_summary_from_samples() {
        let summary = *series().summary();

        assert_eq!(summary.apogee_altitude, 200.0);
        assert_eq!(summary.apogee_time, 5.0);
        assert_eq!(summary.burnout_time, Some(1.0));
        assert_eq!(summary.burnout_velocity, Some(80.0));
        assert_eq!(summary.deployment_altitude, Some(195.0));
        assert_eq!(summary.landing_time, 30.0);
        assert_eq!(summary.landing_speed, 5.0);
        assert_eq!(summary.downrange, 30.0);
        assert_eq!(summary.max_speed, 80.0);
    }

    #[test]
    fn test_column_accessors() {
        let series = series();
        assert_eq!(series.times(), vec![0.0, 1.0, 5.0, 6.0, 30.0]);
        assert_eq!(series.altitudes()[2], 200.0);
        assert_eq!(series.vertical_velocities()[1], 80.0);
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn test_phase_lookup() {
        let series = series();
        assert_eq!(series.phase_at(0.5), Some(FlightPhase::Ascent));
        assert_eq!(series.phase_at(5.5), Some(FlightPhase::DescentFreefall));
        assert_eq!(series.phase_at(100.0), Some(FlightPhase::Landed));
        assert_eq!(series.phase_at(-1.0), None);
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let series = series();
        let rows = series.downsample(3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, 0.0);
        assert_eq!(rows[2].time, 30.0);
        assert_eq!(series.downsample(50).len(), 5);
    }

    #[test]
    fn test_report_formats_summary() {
        let report = series().report(5).to_string();
        assert!(report.contains("Apogee: 200.00 m at 5.00s"));
        assert!(report.contains("parachute descent entered at 6.00s"));
        assert!(report.contains("Burnout: 80.00 m/s"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(FlightSeries::format_time(59.0), "59.00s");
        assert_eq!(FlightSeries::format_time(125.5), "2m 5.50s");
        assert_eq!(FlightSeries::format_time(3725.0), "1h 2m 5.00s");
    }
}
