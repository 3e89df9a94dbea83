//! Pilot-initiated takeoff helper.
//!
//! Armed by the mode run loop when the altitude-hold classifier reports the
//! `Takeoff` regime. While running it drives the vertical position target
//! towards the configured takeoff altitude, fed by the (avoidance-adjusted)
//! pilot climb rate.

use crate::flight_modes::ModeInput;
use crate::hw_abstraction::{EventSink, MotorControl, PositionControl};
use crate::types::actuators::SpoolState;
use crate::types::status::FlightEvent;

#[derive(Debug, Default)]
pub struct Takeoff {
    running: bool,
    complete_alt_cm: f32,
}

impl Takeoff {
    pub const fn new() -> Self {
        Self {
            running: false,
            complete_alt_cm: 0.0,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Whether the pilot is asking to leave the ground. Requires ground
    /// contact, a positive climb demand, and motors that have finished
    /// spooling up.
    pub fn triggered(
        &self,
        input: &ModeInput,
        motors: &dyn MotorControl,
        target_climb_rate_cms: f32,
    ) -> bool {
        if !input.landed.complete {
            return false;
        }
        if target_climb_rate_cms <= 0.0 {
            return false;
        }
        if motors.spool_state() != SpoolState::ThrottleUnlimited {
            return false;
        }
        true
    }

    /// Begin a takeoff towards `target_alt_cm` above the current altitude.
    pub fn start(&mut self, target_alt_cm: f32, input: &ModeInput, events: &mut dyn EventSink) {
        self.running = true;
        self.complete_alt_cm = input.alt_above_home_cm + target_alt_cm.clamp(0.0, 1000.0);
        events.event(FlightEvent::TakeoffStart);
    }

    /// Advance the takeoff by one tick. Descending pilot input is ignored
    /// until the takeoff completes.
    pub fn do_pilot_takeoff(
        &mut self,
        climb_rate_cms: f32,
        input: &ModeInput,
        pos: &mut dyn PositionControl,
        events: &mut dyn EventSink,
    ) {
        if !self.running {
            return;
        }
        pos.input_vertical_pos_vel(self.complete_alt_cm, climb_rate_cms.max(0.0));
        if input.alt_above_home_cm >= self.complete_alt_cm {
            self.running = false;
            events.event(FlightEvent::TakeoffComplete);
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_modes::test_input::flying_at;
    use crate::hw_abstraction::mock::{MockEvents, MockMotors, MockPositionControl};

    #[test]
    fn trigger_requires_ground_contact_and_climb() {
        let takeoff = Takeoff::new();
        let motors = MockMotors::default();

        let mut input = flying_at(0.0);
        input.landed.complete = true;
        assert!(takeoff.triggered(&input, &motors, 50.0));
        assert!(!takeoff.triggered(&input, &motors, 0.0));
        assert!(!takeoff.triggered(&input, &motors, -50.0));

        input.landed.complete = false;
        assert!(!takeoff.triggered(&input, &motors, 50.0));
    }

    #[test]
    fn trigger_waits_for_spool_up() {
        let takeoff = Takeoff::new();
        let mut motors = MockMotors::default();
        motors.spool = SpoolState::SpoolingUp;

        let mut input = flying_at(0.0);
        input.landed.complete = true;
        assert!(!takeoff.triggered(&input, &motors, 50.0));
    }

    #[test]
    fn completes_at_target_altitude() {
        let mut takeoff = Takeoff::new();
        let mut pos = MockPositionControl::default();
        let mut events = MockEvents::default();

        let mut input = flying_at(0.0);
        input.alt_above_home_cm = 20.0;
        takeoff.start(300.0, &input, &mut events);
        assert!(takeoff.running());
        assert_eq!(events.events, [FlightEvent::TakeoffStart]);

        takeoff.do_pilot_takeoff(100.0, &input, &mut pos, &mut events);
        assert!(takeoff.running());
        assert_eq!(pos.pos_vel_input, Some((320.0, 100.0)));

        input.alt_above_home_cm = 320.0;
        takeoff.do_pilot_takeoff(100.0, &input, &mut pos, &mut events);
        assert!(!takeoff.running());
        assert_eq!(
            events.events,
            [FlightEvent::TakeoffStart, FlightEvent::TakeoffComplete]
        );
    }

    #[test]
    fn target_altitude_clamped_to_configured_range() {
        let mut takeoff = Takeoff::new();
        let mut events = MockEvents::default();
        let input = flying_at(0.0);

        takeoff.start(5000.0, &input, &mut events);
        let mut pos = MockPositionControl::default();
        takeoff.do_pilot_takeoff(0.0, &input, &mut pos, &mut events);
        assert_eq!(pos.pos_vel_input, Some((1000.0, 0.0)));
    }
}
