//! Shared landing sequence.
//!
//! Once the landing detector commits, the mode run loop hands the whole tick
//! to this controller: horizontal position hold with optional pilot
//! repositioning or a precision-landing target override, and a shaped
//! vertical descent at the configured land speed. Every landing-capable mode
//! delegates here instead of duplicating the sequence.

use crate::flight_modes::{is_disarmed_or_landed, ModeDeps, ModeInput};
use crate::types::actuators::DesiredSpoolState;
use crate::types::config::LoiterConfig;
use crate::utils::func::sqrt_controller;

/// Below this height the descent target stops being shaped and the land
/// speed applies directly.
const LAND_DESCENT_MIN_ALT_CM: f32 = 100.0;

#[derive(Debug, Default)]
pub struct LandSequence {
    /// The pilot has applied roll/pitch input during this landing. Once set,
    /// the precision-landing override stays disabled until the sequence is
    /// reset; the pilot wins.
    pub repo_active: bool,
    /// A precision-landing target steered the horizontal axes last tick.
    pub prec_active: bool,
}

impl LandSequence {
    pub const fn new() -> Self {
        Self {
            repo_active: false,
            prec_active: false,
        }
    }

    pub fn reset(&mut self) {
        self.repo_active = false;
        self.prec_active = false;
    }

    /// Run one full landing tick. Owns both controller updates, the caller
    /// returns immediately afterwards.
    pub fn run(&mut self, input: &ModeInput, cfg: &LoiterConfig, deps: &mut ModeDeps) {
        if is_disarmed_or_landed(input, deps.motors) {
            make_safe_ground_handling(deps);
            return;
        }

        deps.motors
            .request_spool_state(DesiredSpoolState::ThrottleUnlimited);
        self.run_horizontal(input, cfg, deps);
        self.run_vertical(input, cfg, deps);
    }

    fn run_horizontal(&mut self, input: &ModeInput, cfg: &LoiterConfig, deps: &mut ModeDeps) {
        let mut yaw_rate_cds = 0.0;
        if !input.rc_failsafe && cfg.land.repositioning > 0 {
            let (roll_cd, pitch_cd) = input
                .pilot
                .lean_angles_cd(deps.pos.horizontal_angle_max_cd(), deps.att.lean_angle_max_cd());
            if roll_cd != 0.0 || pitch_cd != 0.0 {
                self.repo_active = true;
            }
            deps.pos.set_pilot_acceleration(roll_cd, pitch_cd);
            yaw_rate_cds = input.pilot.yaw_rate_cds(&cfg.alt);
        }

        let precland_usable =
            deps.precland.enabled() && deps.precland.target_acquired() && !self.repo_active;
        if precland_usable {
            let target_pos = deps
                .precland
                .target_position_cm()
                .unwrap_or(input.position_ne_cm);
            let target_vel = deps.precland.target_velocity_cms(input.velocity_xy_cms);
            deps.pos.clear_pilot_acceleration();
            deps.pos.input_horizontal_target(target_pos, target_vel);
            self.prec_active = true;
        } else {
            if self.prec_active {
                // target lost or pilot took over, restart from here
                deps.pos.init_horizontal_target();
            }
            self.prec_active = false;
        }

        deps.pos.update_horizontal();
        deps.att
            .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), yaw_rate_cds);
    }

    fn run_vertical(&mut self, input: &ModeInput, cfg: &LoiterConfig, deps: &mut ModeDeps) {
        let land_speed = cfg.land.land_speed(&cfg.alt);
        let max_descent = cfg.alt.pilot_speed_dn();

        let error_cm =
            cfg.land.land_alt_low_cm.max(LAND_DESCENT_MIN_ALT_CM) - input.height_above_ground_cm();
        let shaped = sqrt_controller(
            error_cm,
            deps.pos.vertical_p_gain(),
            deps.pos.max_vertical_accel(),
            input.dt,
        );
        let climb_rate = shaped.max(-max_descent).min(-land_speed);

        deps.pos.input_climb_rate(climb_rate);
        deps.pos.update_vertical();
    }
}

/// Neutralize the vehicle while it is disarmed or settled on the ground:
/// idle the motors, bleed the integrators and let both controllers decay.
pub fn make_safe_ground_handling(deps: &mut ModeDeps) {
    deps.motors
        .request_spool_state(DesiredSpoolState::GroundIdle);
    deps.att.reset_rate_integrators_smoothly();
    deps.att
        .input_thrust_vector_yaw_rate(deps.pos.thrust_vector(), 0.0);
    deps.pos.relax_horizontal();
    deps.pos.update_horizontal();
    deps.pos.relax_vertical(0.0);
    deps.pos.update_vertical();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_modes::test_input::flying_at;
    use crate::hw_abstraction::mock::*;
    use nalgebra::Vector2;

    struct Fixture {
        seq: LandSequence,
        cfg: LoiterConfig,
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
                seq: LandSequence::new(),
                cfg: LoiterConfig::default(),
                pos: MockPositionControl::default(),
                att: MockAttitudeControl::default(),
                motors: MockMotors::default(),
                arming: MockArming::default(),
                precland: MockPrecLand::default(),
                avoid: MockAvoidance::default(),
                events: MockEvents::default(),
            }
        }

        fn run(&mut self, input: &ModeInput) {
            let mut deps = ModeDeps {
                pos: &mut self.pos,
                att: &mut self.att,
                motors: &mut self.motors,
                arming: &mut self.arming,
                precland: &self.precland,
                avoid: &mut self.avoid,
                events: &mut self.events,
            };
            self.seq.run(input, &self.cfg, &mut deps);
        }
    }

    #[test]
    fn descends_at_land_speed_near_ground() {
        let mut fix = Fixture::new();
        let input = flying_at(40.0);
        fix.run(&input);

        // at 40 cm the shaped demand saturates against the land speed
        assert_eq!(fix.pos.climb_rate_input, Some(-50.0));
        assert_eq!(
            fix.motors.desired,
            Some(DesiredSpoolState::ThrottleUnlimited)
        );
        assert_eq!(fix.pos.update_vertical_calls, 1);
        assert_eq!(fix.pos.update_horizontal_calls, 1);
    }

    #[test]
    fn descent_never_exceeds_pilot_speed() {
        let mut fix = Fixture::new();
        let input = flying_at(3000.0);
        fix.run(&input);

        let rate = fix.pos.climb_rate_input.unwrap();
        assert!(rate >= -fix.cfg.alt.pilot_speed_dn());
        assert!(rate <= -fix.cfg.land.land_speed_cms);
    }

    #[test]
    fn grounded_vehicle_gets_safe_handling() {
        let mut fix = Fixture::new();
        let mut input = flying_at(0.0);
        input.landed.complete = true;
        fix.run(&input);

        assert_eq!(fix.motors.desired, Some(DesiredSpoolState::GroundIdle));
        assert_eq!(fix.pos.relax_vertical_calls, 1);
        assert_eq!(fix.pos.relax_horizontal_calls, 1);
        assert_eq!(fix.att.reset_integrator_smooth_calls, 1);
    }

    #[test]
    fn precland_overrides_horizontal_target() {
        let mut fix = Fixture::new();
        fix.precland.is_enabled = true;
        fix.precland.acquired = true;
        fix.precland.position_cm = Some(Vector2::new(120.0, -40.0));
        fix.precland.velocity_cms = Vector2::new(5.0, 0.0);

        let input = flying_at(40.0);
        fix.run(&input);

        assert!(fix.seq.prec_active);
        let (pos, vel) = fix.pos.horizontal_target.unwrap();
        assert_eq!(pos, Vector2::new(120.0, -40.0));
        assert_eq!(vel, Vector2::new(5.0, 0.0));
    }

    #[test]
    fn pilot_repositioning_blocks_precland() {
        let mut fix = Fixture::new();
        fix.precland.is_enabled = true;
        fix.precland.acquired = true;
        fix.precland.position_cm = Some(Vector2::new(120.0, -40.0));

        let mut input = flying_at(40.0);
        input.pilot.roll = 0.5;
        fix.run(&input);

        assert!(fix.seq.repo_active);
        assert!(!fix.seq.prec_active);
        assert!(fix.pos.horizontal_target.is_none());
    }

    #[test]
    fn losing_the_target_reinitializes_horizontal() {
        let mut fix = Fixture::new();
        fix.precland.is_enabled = true;
        fix.precland.acquired = true;
        fix.precland.position_cm = Some(Vector2::new(10.0, 10.0));

        let input = flying_at(40.0);
        fix.run(&input);
        assert!(fix.seq.prec_active);
        assert_eq!(fix.pos.init_horizontal_calls, 0);

        fix.precland.acquired = false;
        fix.run(&input);
        assert!(!fix.seq.prec_active);
        assert_eq!(fix.pos.init_horizontal_calls, 1);
    }
}
