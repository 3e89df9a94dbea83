//! Altitude-hold machinery shared by all vertical-position-holding modes.
//!
//! [`AltHoldControl`] bundles the flight-regime classifier, the takeoff
//! helper and the grounded-handling interlocks. Modes embed one instance and
//! call into it from their run loop; none of this state is global.

use crate::flight_modes::takeoff::Takeoff;
use crate::flight_modes::{FlightMode, ModeCapabilities, ModeDeps, ModeInput};
use crate::hw_abstraction::MotorControl;
use crate::types::actuators::{DesiredSpoolState, DisarmReason, SpoolState};
use crate::types::config::AltHoldConfig;
use crate::types::status::Severity;
use crate::errors::ModeError;

/// Flight regime of an altitude-holding mode. Recomputed every tick from the
/// current inputs; unlike the landing regime it carries no memory of its
/// own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AltHoldState {
    MotorStopped,
    LandedGroundIdle,
    LandedPreTakeoff,
    Takeoff,
    Flying,
}

/// Horizontal speed above which a grounded vehicle is considered to be
/// tipping or sliding, forcing a disarm.
const MAX_GROUNDED_SPEED_CMS: f32 = 30.0;

/// Fraction of the vertical acceleration limit applied while on or near the
/// ground.
const GROUNDED_ACCEL_FRACTION: f32 = 0.25;

pub struct AltHoldControl {
    pub cfg: AltHoldConfig,
    pub takeoff: Takeoff,
    overspeed_latched: bool,
}

impl AltHoldControl {
    pub fn new(cfg: AltHoldConfig) -> Self {
        Self {
            cfg,
            takeoff: Takeoff::new(),
            overspeed_latched: false,
        }
    }

    /// Prepare the vertical controller for mode entry.
    pub fn init(&mut self, deps: &mut ModeDeps) {
        if !deps.pos.vertical_active() {
            deps.pos.init_vertical();
        }
        deps.pos.set_vertical_limits(
            -self.cfg.pilot_speed_dn(),
            self.cfg.pilot_speed_up_cms,
            self.cfg.pilot_accel_z_cmss,
        );
        self.takeoff.stop();
        self.overspeed_latched = false;
    }

    /// Classify the current flight regime. First match wins; desired
    /// spool-state requests are issued along the way so the motors ramp
    /// towards the stage the regime implies.
    pub fn determine_state(
        &self,
        input: &ModeInput,
        target_climb_rate_cms: f32,
        motors: &mut dyn MotorControl,
    ) -> AltHoldState {
        if !motors.armed() {
            motors.request_spool_state(DesiredSpoolState::ShutDown);
            // classify by how far the spool-down has progressed
            match motors.spool_state() {
                SpoolState::ShutDown => AltHoldState::MotorStopped,
                SpoolState::GroundIdle => AltHoldState::LandedGroundIdle,
                _ => AltHoldState::LandedPreTakeoff,
            }
        } else if self.takeoff.running()
            || self.takeoff.triggered(input, motors, target_climb_rate_cms)
        {
            AltHoldState::Takeoff
        } else if input.landed.complete {
            if target_climb_rate_cms < 0.0 {
                motors.request_spool_state(DesiredSpoolState::GroundIdle);
            } else {
                motors.request_spool_state(DesiredSpoolState::ThrottleUnlimited);
            }
            if motors.spool_state() == SpoolState::GroundIdle {
                AltHoldState::LandedGroundIdle
            } else {
                AltHoldState::LandedPreTakeoff
            }
        } else {
            motors.request_spool_state(DesiredSpoolState::ThrottleUnlimited);
            AltHoldState::Flying
        }
    }

    /// Shared handling for the `MotorStopped` regime: kill the integrators
    /// and let the vertical controller decay the throttle to zero. The mode
    /// keeps its horizontal target locked separately.
    pub fn handle_motor_stopped(&mut self, deps: &mut ModeDeps) {
        deps.att.reset_rate_integrators();
        deps.att.reset_yaw_target();
        deps.pos.relax_vertical(0.0);
    }

    /// Shared handling for both landed regimes. Invoked explicitly by each
    /// mode for `LandedGroundIdle` and `LandedPreTakeoff` so the two paths
    /// cannot drift apart.
    pub fn handle_grounded(
        &mut self,
        state: AltHoldState,
        input: &ModeInput,
        deps: &mut ModeDeps,
        max_speed_down_cms: f32,
    ) {
        if state == AltHoldState::LandedGroundIdle
            || deps.motors.spool_state() == SpoolState::SpoolingUp
        {
            deps.att.reset_yaw_target();
        }
        deps.att.reset_rate_integrators_smoothly();
        deps.pos.set_vertical_limits(
            max_speed_down_cms,
            self.cfg.pilot_speed_up_cms,
            self.cfg.pilot_accel_z_cmss * GROUNDED_ACCEL_FRACTION,
        );
        deps.pos.relax_vertical(0.0);

        // A grounded vehicle must not be moving. This is a hard safety
        // interlock, not a warning: the vehicle is likely tipping over or
        // being dragged, and spinning motors make that worse.
        if input.velocity_xy_cms.norm() > MAX_GROUNDED_SPEED_CMS {
            if !self.overspeed_latched {
                self.overspeed_latched = true;
                deps.arming.disarm(DisarmReason::SafetyInterlock);
                deps.events
                    .send_text(Severity::Emergency, "Grounded overspeed, disarming");
            }
        } else {
            self.overspeed_latched = false;
        }
    }

    /// Reduced vertical acceleration limit used during takeoff.
    pub fn takeoff_accel_limit(&self) -> f32 {
        self.cfg.pilot_accel_z_cmss * GROUNDED_ACCEL_FRACTION
    }
}

/// Plain altitude-hold mode: vertical position hold with direct pilot lean
/// angles on the horizontal axes. The smallest consumer of the shared
/// machinery.
pub struct ModeAltHold {
    alt_hold: AltHoldControl,
    state: AltHoldState,
}

impl ModeAltHold {
    pub fn new(cfg: AltHoldConfig) -> Self {
        Self {
            alt_hold: AltHoldControl::new(cfg),
            state: AltHoldState::MotorStopped,
        }
    }

    pub fn state(&self) -> AltHoldState {
        self.state
    }
}

impl FlightMode for ModeAltHold {
    fn init(&mut self, _input: &ModeInput, deps: &mut ModeDeps) -> Result<(), ModeError> {
        self.alt_hold.init(deps);
        self.state = AltHoldState::MotorStopped;
        Ok(())
    }

    fn run(&mut self, input: &ModeInput, deps: &mut ModeDeps) {
        let cfg = self.alt_hold.cfg;
        deps.pos.set_vertical_limits(
            -cfg.pilot_speed_dn(),
            cfg.pilot_speed_up_cms,
            cfg.pilot_accel_z_cmss,
        );

        let mut target_roll_cd = 0.0;
        let mut target_pitch_cd = 0.0;
        let mut target_yaw_rate_cds = 0.0;
        let mut target_climb_rate_cms = 0.0;
        if !input.rc_failsafe {
            let angle_max_cd = deps.att.lean_angle_max_cd();
            (target_roll_cd, target_pitch_cd) =
                input.pilot.lean_angles_cd(angle_max_cd, angle_max_cd);
            target_yaw_rate_cds = input.pilot.yaw_rate_cds(&cfg);
            target_climb_rate_cms = input
                .pilot
                .climb_rate_cms(&cfg)
                .max(-cfg.pilot_speed_dn())
                .min(cfg.pilot_speed_up_cms);
        }

        self.state = self
            .alt_hold
            .determine_state(input, target_climb_rate_cms, deps.motors);

        match self.state {
            AltHoldState::MotorStopped => {
                self.alt_hold.handle_motor_stopped(deps);
            }
            state @ (AltHoldState::LandedGroundIdle | AltHoldState::LandedPreTakeoff) => {
                self.alt_hold
                    .handle_grounded(state, input, deps, -cfg.pilot_speed_dn());
            }
            AltHoldState::Takeoff => {
                if !self.alt_hold.takeoff.running() {
                    self.alt_hold
                        .takeoff
                        .start(cfg.pilot_takeoff_alt_cm, input, deps.events);
                }
                deps.pos.set_vertical_limits(
                    -cfg.pilot_speed_dn(),
                    cfg.pilot_speed_up_cms,
                    self.alt_hold.takeoff_accel_limit(),
                );
                let climb = deps.avoid.adjust_climb_rate(target_climb_rate_cms);
                self.alt_hold
                    .takeoff
                    .do_pilot_takeoff(climb, input, deps.pos, deps.events);
            }
            AltHoldState::Flying => {
                let climb = deps.avoid.adjust_climb_rate(target_climb_rate_cms);
                deps.pos.input_climb_rate(climb);
            }
        }

        deps.att
            .input_euler_angles_yaw_rate(target_roll_cd, target_pitch_cd, target_yaw_rate_cds);
        deps.pos.update_vertical();
    }

    fn exit(&mut self, _deps: &mut ModeDeps) {
        self.alt_hold.takeoff.stop();
    }

    fn capabilities(&self) -> ModeCapabilities {
        ModeCapabilities::empty()
    }

    fn name(&self) -> &'static str {
        "AltHold"
    }
}
