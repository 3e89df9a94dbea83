//! Contracts of the controller and vehicle subsystems the flight modes talk
//! to. The mode core receives these as explicit references at construction
//! or call time, which keeps it testable without a live vehicle.

use nalgebra::{Vector2, Vector3};

use crate::types::actuators::{DesiredSpoolState, DisarmReason, SpoolState};
use crate::types::status::{FlightEvent, Severity};

/// Combined horizontal/vertical position controller. Vertical quantities are
/// in cm, cm/s and cm/s^2, angles in centidegrees.
pub trait PositionControl {
    // Vertical axis
    fn set_vertical_limits(&mut self, speed_down_cms: f32, speed_up_cms: f32, accel_cmss: f32);
    fn vertical_active(&self) -> bool;
    fn init_vertical(&mut self);
    /// Decay the vertical controller output towards `throttle`.
    fn relax_vertical(&mut self, throttle: f32);
    /// Move the vertical position target with the given climb rate.
    fn input_climb_rate(&mut self, climb_rate_cms: f32);
    /// Drive the vertical target towards an absolute altitude with a
    /// feed-forward velocity.
    fn input_vertical_pos_vel(&mut self, pos_cm: f32, vel_cms: f32);
    /// Run the vertical controller, producing the collective thrust command.
    fn update_vertical(&mut self) -> f32;
    /// Proportional gain of the vertical position loop.
    fn vertical_p_gain(&self) -> f32;
    /// Configured vertical acceleration limit in cm/s^2.
    fn max_vertical_accel(&self) -> f32;
    /// Vertical offset tracking the terrain below the vehicle.
    fn set_terrain_offset(&mut self, offset_cm: f32);

    // Horizontal axis
    /// Lock the horizontal target to the current position.
    fn init_horizontal_target(&mut self);
    /// Loosen the horizontal target while ground contact is suspected, so
    /// the integrators do not wind up against the ground.
    fn soften_for_landing(&mut self);
    fn set_pilot_acceleration(&mut self, roll_cd: f32, pitch_cd: f32);
    fn clear_pilot_acceleration(&mut self);
    /// Current pilot acceleration demand in cm/s^2.
    fn pilot_acceleration(&self) -> Vector2<f32>;
    /// Override the horizontal target with an absolute position and
    /// feed-forward velocity.
    fn input_horizontal_target(&mut self, pos_ne_cm: Vector2<f32>, vel_ne_cms: Vector2<f32>);
    fn relax_horizontal(&mut self);
    fn update_horizontal(&mut self);
    /// Thrust vector computed by the horizontal controller.
    fn thrust_vector(&self) -> Vector3<f32>;
    /// Lean angle limit of the horizontal controller in centidegrees.
    fn horizontal_angle_max_cd(&self) -> f32;
}

/// Attitude controller command surface.
pub trait AttitudeControl {
    fn input_thrust_vector_yaw_rate(&mut self, thrust: Vector3<f32>, yaw_rate_cds: f32);
    fn input_euler_angles_yaw_rate(&mut self, roll_cd: f32, pitch_cd: f32, yaw_rate_cds: f32);
    fn reset_rate_integrators(&mut self);
    fn reset_rate_integrators_smoothly(&mut self);
    fn reset_yaw_target(&mut self);
    /// Lean angle limit of the altitude-hold controller in centidegrees.
    fn lean_angle_max_cd(&self) -> f32;
}

pub trait MotorControl {
    fn armed(&self) -> bool;
    fn spool_state(&self) -> SpoolState;
    fn request_spool_state(&mut self, desired: DesiredSpoolState);
}

pub trait ArmingControl {
    /// Request a disarm. Returns false when the request was rejected.
    fn disarm(&mut self, reason: DisarmReason) -> bool;
}

/// Precision-landing target provider. Implementations read an asynchronously
/// updated snapshot and must never block the control loop; "no data" is the
/// answer when nothing fresh is available.
pub trait PrecisionLanding {
    fn enabled(&self) -> bool;
    fn target_acquired(&self) -> bool;
    /// Target position in the north-east frame, if one is available.
    fn target_position_cm(&self) -> Option<Vector2<f32>>;
    /// Estimated target velocity, given the current vehicle velocity.
    fn target_velocity_cms(&self, vehicle_vel_cms: Vector2<f32>) -> Vector2<f32>;
}

/// Obstacle-avoidance hook applied to climb-rate demands.
pub trait Avoidance {
    fn adjust_climb_rate(&mut self, climb_rate_cms: f32) -> f32;
}

/// Fire-and-forget event and operator-text emission. Implementations drop
/// messages when the downstream link is saturated; the mode core never
/// treats that as an error.
pub trait EventSink {
    fn event(&mut self, event: FlightEvent);
    fn send_text(&mut self, severity: Severity, text: &str);
}
