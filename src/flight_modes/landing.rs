//! Landing regime detection.
//!
//! Classifies the rangefinder-derived height above ground into three
//! regimes with asymmetric hysteresis: entering the final `Landing` regime
//! requires two seconds of sustained full-down throttle, while losing
//! rangefinder health aborts towards the conservative `AltitudeHigh` regime
//! immediately.

use crate::flight_modes::alt_hold::AltHoldState;
use crate::flight_modes::land_sequence::LandSequence;
use crate::flight_modes::{ModeDeps, ModeInput};
use crate::types::actuators::{DisarmReason, SpoolState};
use crate::types::config::LandingConfig;
use crate::types::measurements::RangefinderStatus;
use crate::types::status::FlightEvent;

/// How long the pilot must hold full-down throttle before the landing
/// commits.
const LAND_REQUEST_DWELL_MS: u32 = 2000;

/// Normalized throttle below which a landing request is recognized.
const LAND_COMMIT_THROTTLE: f32 = -0.9;

/// Normalized throttle above which an active landing is aborted.
const LAND_ABORT_THROTTLE: f32 = 0.1;

/// Guard band added above the low threshold. Only the low boundary carries
/// this band; the high boundary is sharp.
const LOW_THRESHOLD_GUARD_CM: f32 = 30.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LandingState {
    /// Above the pilot-land altitude, full descent authority.
    AltitudeHigh,
    /// Between ground and the pilot-land altitude, descent limited to the
    /// land speed and pilot authority optionally reduced.
    AltitudeLow,
    /// Committed landing, handled by the shared landing sequence.
    Landing,
}

/// What the owning mode must do after a detector update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LandingOutcome {
    Continue,
    /// The vehicle disarmed during the landing; re-initialize the mode
    /// (which resets the regime to `AltitudeHigh`).
    Disarmed,
    /// The pilot aborted the landing; re-initialize the mode, then force the
    /// regime to `AltitudeLow`.
    Aborted,
}

#[derive(Debug)]
pub struct LandingDetector {
    state: LandingState,
    request_start_ms: Option<u32>,
}

impl LandingDetector {
    pub const fn new() -> Self {
        Self {
            state: LandingState::AltitudeHigh,
            request_start_ms: None,
        }
    }

    pub fn state(&self) -> LandingState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = LandingState::AltitudeHigh;
        self.request_start_ms = None;
    }

    pub fn force(&mut self, state: LandingState) {
        self.state = state;
    }

    /// Evaluate the landing regime for this tick. Runs before anything else
    /// in the mode run loop; `alt_hold_state` is the flight regime of the
    /// previous tick.
    pub fn update(
        &mut self,
        input: &ModeInput,
        cfg: &LandingConfig,
        alt_hold_state: AltHoldState,
        land_seq: &mut LandSequence,
        deps: &mut ModeDeps,
    ) -> LandingOutcome {
        // the landing regime ignores rangefinder health, it must finish
        if self.state == LandingState::Landing {
            if !deps.motors.armed() {
                return LandingOutcome::Disarmed;
            }
            if input.landed.complete && deps.motors.spool_state() == SpoolState::GroundIdle {
                deps.arming.disarm(DisarmReason::Landed);
            }
            // wait for spool-down once settled, do not re-evaluate altitude
            if input.landed.complete {
                return LandingOutcome::Continue;
            }
            if input.pilot.throttle > LAND_ABORT_THROTTLE {
                deps.events.event(FlightEvent::LandAbort);
                return LandingOutcome::Aborted;
            }
            return LandingOutcome::Continue;
        }

        // A spurious OutOfRangeHigh reading near the ground would jump the
        // regime to AltitudeHigh and risk a hard landing. Hold the regime
        // while the pilot is not climbing away.
        if self.state == LandingState::AltitudeLow
            && input.rangefinder.status == RangefinderStatus::OutOfRangeHigh
            && input.pilot.throttle < 0.1
        {
            return LandingOutcome::Continue;
        }

        if !input.rangefinder.usable() {
            self.state = LandingState::AltitudeHigh;
            return LandingOutcome::Continue;
        }

        // landing detection only runs while airborne and controlled
        if alt_hold_state != AltHoldState::Flying {
            self.state = LandingState::AltitudeHigh;
            self.request_start_ms = None;
            return LandingOutcome::Continue;
        }

        // thresholds account for the sensor-to-landing-gear offset
        let clearance_cm = input.rangefinder.ground_clearance_cm;
        let low_alt_cm = cfg.pilot_land_low_alt_cm + clearance_cm;
        let high_alt_cm = cfg.pilot_land_alt_cm + clearance_cm;
        let height_cm = input.height_above_ground_cm();

        if height_cm < low_alt_cm + LOW_THRESHOLD_GUARD_CM {
            self.state = LandingState::AltitudeLow;
            if input.pilot.throttle < LAND_COMMIT_THROTTLE {
                match self.request_start_ms {
                    None => self.request_start_ms = Some(input.now_ms),
                    Some(start_ms) => {
                        if input.now_ms.wrapping_sub(start_ms) >= LAND_REQUEST_DWELL_MS {
                            deps.att.reset_yaw_target();
                            land_seq.reset();
                            self.state = LandingState::Landing;
                            deps.events.event(FlightEvent::LandStart);
                        }
                    }
                }
            } else {
                // the request must be continuous, any release starts over
                self.request_start_ms = None;
            }
        } else if height_cm < high_alt_cm {
            self.request_start_ms = None;
            self.state = LandingState::AltitudeLow;
        } else {
            self.state = LandingState::AltitudeHigh;
        }
        LandingOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_modes::test_input::flying_at;
    use crate::hw_abstraction::mock::*;

    struct Fixture {
        detector: LandingDetector,
        land_seq: LandSequence,
        cfg: LandingConfig,
        pos: MockPositionControl,
        att: MockAttitudeControl,
        motors: MockMotors,
        arming: MockArming,
        precland: MockPrecLand,
        avoid: MockAvoidance,
        events: MockEvents,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                detector: LandingDetector::new(),
                land_seq: LandSequence::new(),
                cfg: LandingConfig::default(),
                pos: MockPositionControl::default(),
                att: MockAttitudeControl::default(),
                motors: MockMotors::default(),
                arming: MockArming::default(),
                precland: MockPrecLand::default(),
                avoid: MockAvoidance::default(),
                events: MockEvents::default(),
            }
        }

        fn update(&mut self, input: &ModeInput, alt_hold_state: AltHoldState) -> LandingOutcome {
            let mut deps = ModeDeps {
                pos: &mut self.pos,
                att: &mut self.att,
                motors: &mut self.motors,
                arming: &mut self.arming,
                precland: &self.precland,
                avoid: &mut self.avoid,
                events: &mut self.events,
            };
            self.detector
                .update(input, &self.cfg, alt_hold_state, &mut self.land_seq, &mut deps)
        }
    }

    // default config plus 10 cm clearance: low threshold 60, guard band to
    // 90, high threshold 160

    #[test]
    fn high_altitude_stays_high() {
        let mut fix = Fixture::new();
        let input = flying_at(500.0);
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeHigh);
    }

    #[test]
    fn below_high_threshold_is_low() {
        let mut fix = Fixture::new();
        let input = flying_at(120.0);
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);
    }

    #[test]
    fn regime_is_monotonic_in_height() {
        // walking the height down must never make the regime "less landed"
        fn rank(state: LandingState) -> u8 {
            match state {
                LandingState::AltitudeHigh => 0,
                LandingState::AltitudeLow => 1,
                LandingState::Landing => 2,
            }
        }
        let mut previous_rank = 2;
        for height in [30.0_f32, 70.0, 95.0, 140.0, 200.0, 1000.0] {
            let mut fix = Fixture::new();
            let input = flying_at(height);
            fix.update(&input, AltHoldState::Flying);
            let r = rank(fix.detector.state());
            assert!(
                r <= previous_rank,
                "regime inverted at height {height}: rank {r} > {previous_rank}"
            );
            previous_rank = r;
        }
    }

    #[test]
    fn landing_commit_requires_sustained_throttle() {
        let mut fix = Fixture::new();
        let mut input = flying_at(40.0);
        input.pilot.throttle = -0.95;

        // request starts at t=0; at t=1999 still below the dwell time
        input.now_ms = 0;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 1999;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);

        // the 2000 ms tick commits, exactly once
        input.now_ms = 2000;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::Landing);
        assert_eq!(fix.events.events, [FlightEvent::LandStart]);
        assert_eq!(fix.att.reset_yaw_calls, 1);

        input.now_ms = 2010;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.events.events, [FlightEvent::LandStart]);
    }

    #[test]
    fn single_tick_release_resets_the_timer() {
        let mut fix = Fixture::new();
        let mut input = flying_at(40.0);

        input.pilot.throttle = -0.95;
        input.now_ms = 0;
        fix.update(&input, AltHoldState::Flying);

        // a single tick above the commit threshold restarts the window
        input.pilot.throttle = -0.5;
        input.now_ms = 1500;
        fix.update(&input, AltHoldState::Flying);

        input.pilot.throttle = -0.95;
        input.now_ms = 1600;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 3500;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);

        input.now_ms = 3600;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::Landing);
    }

    #[test]
    fn dwell_timer_tolerates_clock_wraparound() {
        let mut fix = Fixture::new();
        let mut input = flying_at(40.0);
        input.pilot.throttle = -0.95;

        input.now_ms = u32::MAX - 500;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 1600; // 2101 ms later, past the rollover
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::Landing);
    }

    #[test]
    fn out_of_range_high_artifact_is_suppressed() {
        let mut fix = Fixture::new();
        let mut input = flying_at(70.0);
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);

        input.rangefinder.status = RangefinderStatus::OutOfRangeHigh;
        input.pilot.throttle = 0.0;
        for _ in 0..5 {
            fix.update(&input, AltHoldState::Flying);
            assert_eq!(fix.detector.state(), LandingState::AltitudeLow);
        }

        // once the pilot climbs away the reading is taken at face value
        input.pilot.throttle = 0.5;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeHigh);
    }

    #[test]
    fn unhealthy_rangefinder_forces_high() {
        let mut fix = Fixture::new();
        let mut input = flying_at(70.0);
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);

        input.rangefinder.status = RangefinderStatus::NoData;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::AltitudeHigh);
    }

    #[test]
    fn only_runs_while_flying() {
        let mut fix = Fixture::new();
        let mut input = flying_at(40.0);
        input.pilot.throttle = -0.95;
        input.now_ms = 0;
        fix.update(&input, AltHoldState::Flying);

        // leaving the Flying regime clears the pending request
        input.now_ms = 1000;
        fix.update(&input, AltHoldState::LandedGroundIdle);
        assert_eq!(fix.detector.state(), LandingState::AltitudeHigh);

        input.now_ms = 2500;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 2600;
        fix.update(&input, AltHoldState::Flying);
        // only 100 ms accumulated since re-arming the request
        assert_eq!(fix.detector.state(), LandingState::AltitudeLow);
    }

    fn committed_fixture() -> (Fixture, ModeInput) {
        let mut fix = Fixture::new();
        let mut input = flying_at(40.0);
        input.pilot.throttle = -0.95;
        input.now_ms = 0;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 2000;
        fix.update(&input, AltHoldState::Flying);
        assert_eq!(fix.detector.state(), LandingState::Landing);
        (fix, input)
    }

    #[test]
    fn landing_is_sticky_without_abort() {
        let (mut fix, mut input) = committed_fixture();

        // rangefinder loss does not leave the landing regime
        input.rangefinder.status = RangefinderStatus::NoData;
        input.now_ms = 2100;
        let outcome = fix.update(&input, AltHoldState::Flying);
        assert_eq!(outcome, LandingOutcome::Continue);
        assert_eq!(fix.detector.state(), LandingState::Landing);
    }

    #[test]
    fn pilot_abort_fires_once() {
        let (mut fix, mut input) = committed_fixture();

        input.pilot.throttle = 0.2;
        input.now_ms = 2100;
        let outcome = fix.update(&input, AltHoldState::Flying);
        assert_eq!(outcome, LandingOutcome::Aborted);
        assert_eq!(
            fix.events.events,
            [FlightEvent::LandStart, FlightEvent::LandAbort]
        );
    }

    #[test]
    fn abort_requires_height_recovery() {
        let (mut fix, mut input) = committed_fixture();

        // still settled on the ground: throttle up does not abort
        input.landed.complete = true;
        input.pilot.throttle = 0.2;
        input.now_ms = 2100;
        assert_eq!(fix.update(&input, AltHoldState::Flying), LandingOutcome::Continue);
        assert_eq!(fix.detector.state(), LandingState::Landing);
    }

    #[test]
    fn settled_landing_requests_disarm() {
        let (mut fix, mut input) = committed_fixture();

        input.landed.complete = true;
        fix.motors.spool = SpoolState::GroundIdle;
        input.now_ms = 2100;
        assert_eq!(fix.update(&input, AltHoldState::Flying), LandingOutcome::Continue);
        assert_eq!(fix.arming.disarm_requests, [DisarmReason::Landed]);

        // once the motors report disarmed the mode re-initializes
        fix.motors.is_armed = false;
        assert_eq!(
            fix.update(&input, AltHoldState::Flying),
            LandingOutcome::Disarmed
        );
    }

    #[test]
    fn commit_clears_landing_sequence_flags() {
        let mut fix = Fixture::new();
        fix.land_seq.repo_active = true;
        fix.land_seq.prec_active = true;

        let mut input = flying_at(40.0);
        input.pilot.throttle = -0.95;
        input.now_ms = 0;
        fix.update(&input, AltHoldState::Flying);
        input.now_ms = 2000;
        fix.update(&input, AltHoldState::Flying);

        assert!(!fix.land_seq.repo_active);
        assert!(!fix.land_seq.prec_active);
        // the desired spool state is untouched by the detector itself
        assert_eq!(fix.motors.desired, None);
    }
}
