//! Fixed-step explicit Euler variant of the flight simulation.
//!
//! Shares the dynamics, phase events and output of [`Simulation`](super::scheduler::Simulation)
//! but advances with a constant step and checks each phase's events between
//! consecutive steps, taking the first state past a crossing as the event
//! state. The ascent step is shortened so burnout lands on the burn time.

use tracing::{debug, info};

use super::kinematics::{FlightDynamics, FlightState};
use super::scheduler::{log_transition, phase_budget, PhaseEvents, Recorder, State};
use super::settings::SimulationSettings;
use crate::control::flight_phase::{FlightEvent, FlightPhase};
use crate::control::rocket::RocketConfiguration;
use crate::errors::{Result, SimulationError};
use crate::telemetry_system::telemetry::FlightSeries;

#[derive(Debug, Clone)]
pub struct EulerSimulator<'a> {
    config: &'a RocketConfiguration,
    settings: SimulationSettings,
}

impl<'a> EulerSimulator<'a> {
    pub fn new(config: &'a RocketConfiguration) -> Self {
        EulerSimulator {
            config,
            settings: SimulationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.settings.euler_time_step = time_step;
        self
    }

    pub fn run(&self) -> Result<FlightSeries> {
        self.settings.validate()?;
        self.config.validate()?;
        self.config.check_liftoff(self.settings.launch_angle)?;

        let dt = self.settings.euler_time_step;
        let burn_time = self.config.motor.burn_time;
        let dynamics = FlightDynamics::new(self.config, self.settings.launch_angle)
            .with_rail_length(self.settings.rail_length);
        let events = PhaseEvents::new(self.config);
        let mut recorder = Recorder::new();

        info!(
            motor = %self.config.motor.designation,
            time_step = dt,
            "starting fixed-step flight simulation"
        );

        let mut phase = FlightPhase::Ascent;
        let mut phase_start = 0.0;
        let mut state = FlightState::at_launch(self.config.initial_mass());
        let mut steps = 0usize;
        recorder.push(state.time, &state.to_array(), phase);

        while phase != FlightPhase::Landed {
            let ascent = phase == FlightPhase::Ascent;
            let (h, t_next) = if ascent && state.time + dt >= burn_time {
                (burn_time - state.time, burn_time)
            } else {
                (dt, state.time + dt)
            };

            let derivative = dynamics.derivative(state.time, &state, phase.params())?;
            let y = state.to_array();
            let rate = derivative.to_array();
            let mut y_next: State = y;
            for (value, slope) in y_next.iter_mut().zip(rate.iter()) {
                *value += h * slope;
            }
            let next_state = FlightState::from_array(t_next, &y_next);
            if let Some((quantity, value)) = next_state.non_finite_component() {
                return Err(SimulationError::domain(quantity, value));
            }
            steps += 1;

            let crossing = events.watch(phase).into_iter().find(|(event, _)| {
                let direction = event.direction();
                direction.crossed(event.eval(state.time, &y), event.eval(t_next, &y_next))
                    || direction.satisfied(event.eval(state.time, &y))
            });

            recorder.push(t_next, &y_next, phase);
            state = next_state;

            let exit = match crossing {
                Some((_, exit)) => Some(exit),
                None if ascent && t_next >= burn_time => {
                    Some((FlightEvent::Burnout, FlightPhase::Coast))
                }
                None => None,
            };

            match exit {
                Some((event, next)) => {
                    if event == FlightEvent::Burnout {
                        state.mass = state.mass.max(dynamics.dry_mass());
                    }
                    log_transition(event, phase, next, t_next, &state.to_array());
                    recorder.enter(phase, next, t_next);
                    phase = next;
                    phase_start = t_next;
                }
                None => {
                    let budget = phase_budget(self.config, &self.settings, phase);
                    if !ascent && t_next - phase_start > budget {
                        return Err(SimulationError::IntegrationTimeout {
                            phase,
                            time: t_next,
                            budget,
                        });
                    }
                }
            }
        }

        debug!(steps, "fixed-step integration finished");
        Ok(recorder.finish())
    }
}
