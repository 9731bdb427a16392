//! Phase-by-phase flight integration.
//!
//! The flight is split into segments with fixed dynamics: powered ascent
//! until burnout, coast until apogee, freefall until the descent rate
//! reaches the deployment speed, then parachute descent until touchdown.
//! Each segment ends on an event located by the integrator; the stitched
//! samples form one strictly time-ordered series.

use tracing::{debug, info, warn};

use super::integrator::{EventDirection, EventFunction, Rkf45, Termination};
use super::kinematics::{FlightDynamics, FlightState, PhaseSystem, STATE_DIM};
use super::settings::SimulationSettings;
use crate::control::flight_phase::{FlightEvent, FlightPhase};
use crate::control::rocket::RocketConfiguration;
use crate::errors::{Result, SimulationError};
use crate::telemetry_system::telemetry::{FlightSeries, TrajectorySample};

pub(crate) type State = [f64; STATE_DIM];

/// Altitude falling through the pad level.
pub(crate) struct GroundContact;

impl EventFunction<STATE_DIM> for GroundContact {
    fn eval(&self, _t: f64, y: &State) -> f64 {
        y[1]
    }

    fn direction(&self) -> EventDirection {
        EventDirection::Falling
    }
}

/// Vertical velocity falling through zero.
pub(crate) struct Apogee;

impl EventFunction<STATE_DIM> for Apogee {
    fn eval(&self, _t: f64, y: &State) -> f64 {
        y[3]
    }

    fn direction(&self) -> EventDirection {
        EventDirection::Falling
    }
}

/// Vertical velocity falling through the (negative) deployment threshold.
pub(crate) struct DeploymentSpeed {
    threshold: f64,
}

impl EventFunction<STATE_DIM> for DeploymentSpeed {
    fn eval(&self, _t: f64, y: &State) -> f64 {
        y[3] - self.threshold
    }

    fn direction(&self) -> EventDirection {
        EventDirection::Falling
    }
}

/// Which events end each phase and where each one leads.
pub(crate) struct PhaseEvents {
    ground: GroundContact,
    apogee: Apogee,
    deployment: DeploymentSpeed,
}

pub(crate) type Exit = (FlightEvent, FlightPhase);

impl PhaseEvents {
    pub(crate) fn new(config: &RocketConfiguration) -> Self {
        PhaseEvents {
            ground: GroundContact,
            apogee: Apogee,
            deployment: DeploymentSpeed {
                threshold: config.parachute.deployment_threshold(),
            },
        }
    }

    /// Watched events of `phase`, in priority order, with their exits.
    pub(crate) fn watch(&self, phase: FlightPhase) -> Vec<(&dyn EventFunction<STATE_DIM>, Exit)> {
        let ground: &dyn EventFunction<STATE_DIM> = &self.ground;
        let apogee: &dyn EventFunction<STATE_DIM> = &self.apogee;
        let deployment: &dyn EventFunction<STATE_DIM> = &self.deployment;
        let landing = (FlightEvent::GroundImpact, FlightPhase::Landed);

        match phase {
            FlightPhase::Ascent => vec![(ground, landing)],
            FlightPhase::Coast => vec![
                (apogee, (FlightEvent::Apogee, FlightPhase::DescentFreefall)),
                (ground, landing),
            ],
            FlightPhase::DescentFreefall => vec![
                (
                    deployment,
                    (FlightEvent::ParachuteDeployment, FlightPhase::DescentParachute),
                ),
                (ground, landing),
            ],
            FlightPhase::DescentParachute => vec![(ground, landing)],
            FlightPhase::Landed => Vec::new(),
        }
    }
}

/// Accumulates segment output into one series.
pub(crate) struct Recorder {
    samples: Vec<TrajectorySample>,
    transitions: Vec<(FlightPhase, f64)>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Recorder {
            samples: Vec::new(),
            transitions: vec![(FlightPhase::Ascent, 0.0)],
        }
    }

    /// Appends a point unless it does not advance time.
    pub(crate) fn push(&mut self, t: f64, y: &State, phase: FlightPhase) {
        if self.samples.last().map_or(false, |last| t <= last.time) {
            return;
        }
        let state = FlightState::from_array(t, y);
        self.samples.push(TrajectorySample::from_state(&state, phase));
    }

    pub(crate) fn enter(&mut self, from: FlightPhase, to: FlightPhase, time: f64) {
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");
        self.transitions.push((to, time));
    }

    pub(crate) fn finish(mut self) -> FlightSeries {
        if let Some(last) = self.samples.last_mut() {
            last.altitude = last.altitude.max(0.0);
        }
        FlightSeries::new(self.samples, self.transitions)
    }
}

/// Logs a transition, flagging the ones that mean something went wrong.
pub(crate) fn log_transition(event: FlightEvent, from: FlightPhase, to: FlightPhase, t: f64, y: &State) {
    match (from, to) {
        (FlightPhase::Ascent, FlightPhase::Landed) => {
            warn!(t, "ground impact under power, ascent aborted")
        }
        (FlightPhase::Coast | FlightPhase::DescentFreefall, FlightPhase::Landed) => {
            warn!(t, vy = y[3], "landed without a parachute")
        }
        _ => {}
    }
    info!(%event, t, altitude = y[1], vy = y[3], "{from} -> {to}");
}

/// Time allowed for `phase` before the run fails.
pub(crate) fn phase_budget(
    config: &RocketConfiguration,
    settings: &SimulationSettings,
    phase: FlightPhase,
) -> f64 {
    match phase {
        FlightPhase::Ascent => config.motor.burn_time,
        FlightPhase::Coast => settings.coast_time_budget,
        FlightPhase::DescentFreefall => settings.freefall_time_budget,
        FlightPhase::DescentParachute => settings.parachute_time_budget,
        FlightPhase::Landed => 0.0,
    }
}

/// One configured flight simulation.
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    config: &'a RocketConfiguration,
    settings: SimulationSettings,
}

impl<'a> Simulation<'a> {
    pub fn new(config: &'a RocketConfiguration) -> Self {
        Simulation {
            config,
            settings: SimulationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Integrates the flight from ignition to touchdown.
    pub fn run(&self) -> Result<FlightSeries> {
        self.settings.validate()?;
        self.config.validate()?;
        self.config.check_liftoff(self.settings.launch_angle)?;

        let dynamics = FlightDynamics::new(self.config, self.settings.launch_angle)
            .with_rail_length(self.settings.rail_length);
        let events = PhaseEvents::new(self.config);
        let mut integrator = self.settings.integrator();
        let mut recorder = Recorder::new();

        info!(
            motor = %self.config.motor.designation,
            initial_mass = self.config.initial_mass(),
            launch_angle = self.settings.launch_angle,
            rail_length = self.settings.rail_length,
            "starting flight simulation"
        );

        let mut phase = FlightPhase::Ascent;
        let mut t = 0.0;
        let mut y = FlightState::at_launch(self.config.initial_mass()).to_array();

        while phase != FlightPhase::Landed {
            let (t_next, mut y_next, event, next) = self.run_phase(
                &mut integrator,
                &dynamics,
                &events,
                phase,
                t,
                &y,
                &mut recorder,
            )?;
            if event == FlightEvent::Burnout {
                y_next[4] = y_next[4].max(dynamics.dry_mass());
            }

            log_transition(event, phase, next, t_next, &y_next);
            recorder.enter(phase, next, t_next);
            phase = next;
            t = t_next;
            y = y_next;
        }

        let stats = integrator.stats();
        debug!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            evaluations = stats.evaluations,
            forced = stats.forced,
            "integration finished"
        );

        let series = recorder.finish();
        let summary = series.summary();
        info!(
            apogee = summary.apogee_altitude,
            apogee_time = summary.apogee_time,
            landing_time = summary.landing_time,
            landing_speed = summary.landing_speed,
            "flight complete"
        );
        Ok(series)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_phase(
        &self,
        integrator: &mut Rkf45,
        dynamics: &FlightDynamics<'_>,
        events: &PhaseEvents,
        phase: FlightPhase,
        t: f64,
        y: &State,
        recorder: &mut Recorder,
    ) -> Result<(f64, State, FlightEvent, FlightPhase)> {
        let budget = phase_budget(self.config, &self.settings, phase);
        // The ascent ends at burnout, measured from ignition.
        let t_end = if phase == FlightPhase::Ascent {
            budget
        } else {
            t + budget
        };
        let watch = events.watch(phase);
        let watched: Vec<&dyn EventFunction<STATE_DIM>> =
            watch.iter().map(|(event, _)| *event).collect();
        let system = PhaseSystem {
            dynamics,
            params: phase.params(),
        };
        debug!(%phase, t, t_end, "integrating phase");

        let segment = integrator.integrate(&system, &watched, t, y, t_end)?;
        for (time, state) in &segment.points {
            recorder.push(*time, state, phase);
        }
        let (t_last, y_last) = segment.last();

        let (event, next) = match segment.termination {
            Termination::Event(index) => watch[index].1,
            Termination::Completed if phase == FlightPhase::Ascent => {
                (FlightEvent::Burnout, FlightPhase::Coast)
            }
            Termination::Completed => {
                return Err(SimulationError::IntegrationTimeout {
                    phase,
                    time: t_last,
                    budget,
                })
            }
        };
        Ok((t_last, y_last, event, next))
    }
}

/// Simulates a flight with the default settings.
pub fn simulate(config: &RocketConfiguration) -> Result<FlightSeries> {
    Simulation::new(config).run()
}
