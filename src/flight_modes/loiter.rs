//! Loiter mode: GPS position hold with pilot repositioning, pilot-initiated
//! landing and optional precision loiter.
//!
//! The run loop evaluates the landing detector first, derives the descent
//! and lean-angle limits from the landing regime, then dispatches on the
//! altitude-hold regime. Every tick ends with a vertical controller update;
//! a committed landing hands the whole tick to the shared landing sequence
//! instead.

#[allow(unused_imports)]
use num_traits::Float;

use crate::errors::ModeError;
use crate::flight_modes::alt_hold::{AltHoldControl, AltHoldState};
use crate::flight_modes::land_sequence::LandSequence;
use crate::flight_modes::landing::{LandingDetector, LandingOutcome, LandingState};
use crate::flight_modes::surface_tracking::SurfaceTracking;
use crate::flight_modes::{FlightMode, ModeCapabilities, ModeDeps, ModeInput};
use crate::types::actuators::DesiredSpoolState;
use crate::types::config::LoiterConfig;
use crate::types::measurements::RangefinderStatus;
use crate::utils::func::{linear_interpolate, sqrt_controller};

/// Pilot acceleration demand above which the precision loiter yields to the
/// pilot, in cm/s^2.
const PRECISION_LOITER_MAX_PILOT_ACCEL: f32 = 50.0;

pub struct ModeLoiter {
    cfg: LoiterConfig,
    alt_hold: AltHoldControl,
    landing: LandingDetector,
    land_seq: LandSequence,
    surface: SurfaceTracking,
    /// Flight regime of the previous tick, consumed by the landing detector
    /// before this tick's regime is known.
    alt_hold_state: AltHoldState,
    precision_active: bool,
}

impl ModeLoiter {
    pub fn new(cfg: LoiterConfig, dt: f32) -> Self {
        Self {
            cfg,
            alt_hold: AltHoldControl::new(cfg.alt),
            landing: LandingDetector::new(),
            land_seq: LandSequence::new(),
            surface: SurfaceTracking::new(dt),
            alt_hold_state: AltHoldState::MotorStopped,
            precision_active: false,
        }
    }

    pub fn landing_state(&self) -> LandingState {
        self.landing.state()
    }

    pub fn alt_hold_state(&self) -> AltHoldState {
        self.alt_hold_state
    }

    /// Shared by mode entry and the in-flight re-initializations the
    /// landing detector requests (post-disarm, pilot abort).
    fn reinit(&mut self, input: &ModeInput, deps: &mut ModeDeps) {
        if !input.rc_failsafe {
            let (roll_cd, pitch_cd) = input
                .pilot
                .lean_angles_cd(deps.pos.horizontal_angle_max_cd(), deps.att.lean_angle_max_cd());
            deps.pos.set_pilot_acceleration(roll_cd, pitch_cd);
        } else {
            deps.pos.clear_pilot_acceleration();
        }
        deps.pos.init_horizontal_target();
        self.alt_hold.init(deps);
        self.landing.reset();
        self.land_seq.reset();
        self.surface.reset();
        self.alt_hold_state = AltHoldState::MotorStopped;
        self.precision_active = false;
    }

    fn precision_loiter_wanted(&self, input: &ModeInput, deps: &ModeDeps) -> bool {
        if !self.cfg.precision_loiter || !deps.precland.enabled() {
            return false;
        }
        // don't chase a target while possibly sitting on the ground
        if input.landed.maybe {
            return false;
        }
        // if the pilot really wants to move the vehicle, let them
        if deps.pos.pilot_acceleration().norm() > PRECISION_LOITER_MAX_PILOT_ACCEL {
            return false;
        }
        deps.precland.target_acquired()
    }

    fn precision_loiter_xy(&self, input: &ModeInput, deps: &mut ModeDeps) {
        deps.pos.clear_pilot_acceleration();
        let target_pos = deps
            .precland
            .target_position_cm()
            .unwrap_or(input.position_ne_cm);
        let target_vel = deps.precland.target_velocity_cms(input.velocity_xy_cms);
        deps.pos.input_horizontal_target(target_pos, target_vel);
        deps.pos.update_horizontal();
    }
}

impl FlightMode for ModeLoiter {
    fn init(&mut self, input: &ModeInput, deps: &mut ModeDeps) -> Result<(), ModeError> {
        if !input.position_ok {
            return Err(ModeError::PositionUnavailable);
        }
        self.reinit(input, deps);
        Ok(())
    }

    fn run(&mut self, input: &ModeInput, deps: &mut ModeDeps) {
        let land_speed = self.cfg.land.land_speed(&self.cfg.alt);
        let pilot_speed_dn = self.cfg.alt.pilot_speed_dn();
        let pilot_speed_up = self.cfg.alt.pilot_speed_up_cms;

        // landing regime first, using the previous tick's flight regime
        match self.landing.update(
            input,
            &self.cfg.land,
            self.alt_hold_state,
            &mut self.land_seq,
            deps,
        ) {
            LandingOutcome::Continue => {}
            LandingOutcome::Disarmed => self.reinit(input, deps),
            LandingOutcome::Aborted => {
                self.reinit(input, deps);
                self.landing.force(LandingState::AltitudeLow);
            }
        }

        let clearance_cm = input.rangefinder.ground_clearance_cm;
        let low_alt_cm = self.cfg.land.pilot_land_low_alt_cm + clearance_cm;
        let high_alt_cm = self.cfg.land.pilot_land_alt_cm + clearance_cm;
        let height_cm = input.height_above_ground_cm();

        let mut angle_limit_cd = deps.pos.horizontal_angle_max_cd();
        let max_speed_down = match self.landing.state() {
            LandingState::AltitudeHigh => {
                if input.rangefinder.status == RangefinderStatus::OutOfRangeHigh {
                    // height unknown upwards, keep full descent authority
                    -pilot_speed_dn
                } else {
                    // approach the slow-down altitude with bounded deceleration
                    sqrt_controller(
                        self.cfg.land.land_alt_low_cm - height_cm,
                        deps.pos.vertical_p_gain(),
                        deps.pos.max_vertical_accel(),
                        input.dt,
                    )
                    .max(-pilot_speed_dn)
                    .min(-land_speed)
                }
            }
            LandingState::AltitudeLow => {
                // reduce pilot authority close to the ground
                if self.cfg.land.repositioning > 1 && high_alt_cm > low_alt_cm {
                    angle_limit_cd =
                        linear_interpolate(0.0, angle_limit_cd, height_cm, low_alt_cm, high_alt_cm);
                }
                sqrt_controller(
                    low_alt_cm - height_cm,
                    deps.pos.vertical_p_gain(),
                    deps.pos.max_vertical_accel(),
                    input.dt,
                )
                .max(-land_speed)
                .min(0.0)
            }
            LandingState::Landing => {
                // the landing sequence owns the rest of this tick
                self.land_seq.run(input, &self.cfg, deps);
                return;
            }
        };

        // pilot inputs, unless the radio link is gone
        let mut target_roll_cd = 0.0;
        let mut target_pitch_cd = 0.0;
        let mut target_yaw_rate_cds = 0.0;
        let mut target_climb_rate_cms = 0.0;
        if !input.rc_failsafe {
            (target_roll_cd, target_pitch_cd) = input
                .pilot
                .lean_angles_cd(angle_limit_cd, deps.att.lean_angle_max_cd());
            target_yaw_rate_cds = input.pilot.yaw_rate_cds(&self.cfg.alt);
            target_climb_rate_cms = input
                .pilot
                .climb_rate_cms(&self.cfg.alt)
                .max(max_speed_down)
                .min(pilot_speed_up);
        } else {
            deps.pos.clear_pilot_acceleration();
        }

        // keep the target from winding away while resting on the ground
        if input.landed.maybe {
            deps.pos.soften_for_landing();
        }

        self.alt_hold_state = self
            .alt_hold
            .determine_state(input, target_climb_rate_cms, deps.motors);

        match self.alt_hold_state {
            AltHoldState::MotorStopped => {
                self.alt_hold.handle_motor_stopped(deps);
                deps.pos.init_horizontal_target();
                deps.att
                    .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), target_yaw_rate_cds);
            }
            state @ (AltHoldState::LandedGroundIdle | AltHoldState::LandedPreTakeoff) => {
                self.alt_hold
                    .handle_grounded(state, input, deps, max_speed_down);
                deps.pos.init_horizontal_target();
                deps.att
                    .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), target_yaw_rate_cds);
            }
            AltHoldState::Takeoff => {
                if !self.alt_hold.takeoff.running() {
                    self.alt_hold.takeoff.start(
                        self.cfg.alt.pilot_takeoff_alt_cm,
                        input,
                        deps.events,
                    );
                }
                deps.pos.set_vertical_limits(
                    max_speed_down,
                    pilot_speed_up,
                    self.alt_hold.takeoff_accel_limit(),
                );
                let climb = deps.avoid.adjust_climb_rate(target_climb_rate_cms);
                self.alt_hold
                    .takeoff
                    .do_pilot_takeoff(climb, input, deps.pos, deps.events);

                // repositioning above normal holds position during takeoff
                if self.cfg.land.repositioning > 1 {
                    deps.pos.clear_pilot_acceleration();
                } else {
                    deps.pos.set_pilot_acceleration(target_roll_cd, target_pitch_cd);
                }
                deps.pos.update_horizontal();
                deps.att
                    .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), target_yaw_rate_cds);
            }
            AltHoldState::Flying => {
                deps.motors
                    .request_spool_state(DesiredSpoolState::ThrottleUnlimited);
                if !input.rc_failsafe {
                    deps.pos.set_pilot_acceleration(target_roll_cd, target_pitch_cd);
                }
                deps.pos
                    .set_vertical_limits(max_speed_down, pilot_speed_up, self.cfg.alt.pilot_accel_z_cmss);

                let precision_was_active = self.precision_active;
                if self.precision_loiter_wanted(input, deps) {
                    self.precision_loiter_xy(input, deps);
                    self.precision_active = true;
                } else {
                    self.precision_active = false;
                }
                if precision_was_active && !self.precision_active {
                    // the pilot takes over, restart from the current position
                    deps.pos.init_horizontal_target();
                }
                if !self.precision_active {
                    deps.pos.update_horizontal();
                }
                deps.att
                    .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), target_yaw_rate_cds);

                let climb = deps.avoid.adjust_climb_rate(target_climb_rate_cms);
                self.surface.update(input, deps.pos);
                deps.pos.input_climb_rate(climb);
            }
        }

        deps.pos.update_vertical();
    }

    fn exit(&mut self, _deps: &mut ModeDeps) {
        self.alt_hold.takeoff.stop();
        self.precision_active = false;
    }

    fn capabilities(&self) -> ModeCapabilities {
        ModeCapabilities::REQUIRES_POSITION
    }

    fn name(&self) -> &'static str {
        "Loiter"
    }
}
