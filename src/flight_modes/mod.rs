//! Flight mode framework.
//!
//! Each mode implements [`FlightMode`] with init/run/exit hooks and declares
//! its requirements through [`ModeCapabilities`]. The altitude-hold and
//! landing machinery lives in shared, composable state objects
//! ([`alt_hold::AltHoldControl`], [`landing::LandingDetector`],
//! [`land_sequence::LandSequence`]) which modes embed rather than inherit.
//!
//! The mode run loop is invoked once per control-loop tick by the
//! [`mode_runner`](crate::tasks::mode_runner) task and must complete without
//! blocking; all collaborator access happens through the references in
//! [`ModeDeps`].

pub mod alt_hold;
pub mod land_sequence;
pub mod landing;
pub mod loiter;
pub mod surface_tracking;
pub mod takeoff;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::errors::ModeError;
use crate::hw_abstraction::{
    ArmingControl, AttitudeControl, Avoidance, EventSink, MotorControl, PositionControl,
    PrecisionLanding,
};
use crate::types::control::PilotInput;
use crate::types::measurements::{RangefinderData, RangefinderStatus};
use crate::types::status::LandedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeCapabilities(u8);

bitflags::bitflags! {
    impl ModeCapabilities: u8 {
        /// The mode needs a healthy horizontal position estimate to run.
        const REQUIRES_POSITION = 1 << 0;

        /// The mode needs a connected downward rangefinder.
        const REQUIRES_RANGEFINDER = 1 << 1;
    }
}

/// Selectable flight modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightModeKind {
    AltHold,
    Loiter,
}

/// Snapshot of every input a mode consumes during one tick. Assembled by the
/// mode runner from the signal channels; stale values are carried forward
/// when a producer has not published since the previous tick.
#[derive(Debug, Clone, Copy)]
pub struct ModeInput {
    /// Monotonic timestamp in ms. Wraps; elapsed-time math must use
    /// `wrapping_sub`.
    pub now_ms: u32,
    /// Tick period in seconds.
    pub dt: f32,
    pub pilot: PilotInput,
    /// Pilot input is ignored while the radio link is in failsafe.
    pub rc_failsafe: bool,
    pub rangefinder: RangefinderData,
    pub position_ne_cm: Vector2<f32>,
    pub alt_above_home_cm: f32,
    pub velocity_xy_cms: Vector2<f32>,
    pub landed: LandedState,
    /// Whether the position estimator output is currently trustworthy.
    pub position_ok: bool,
}

impl ModeInput {
    /// Best available height above ground in cm. Prefers the rangefinder,
    /// clamps the out-of-range states to their respective bound, and falls
    /// back to the altitude above home when no rangefinder data exists.
    pub fn height_above_ground_cm(&self) -> f32 {
        match self.rangefinder.status {
            RangefinderStatus::Good => self.rangefinder.distance_cm,
            RangefinderStatus::OutOfRangeLow => 0.0,
            RangefinderStatus::OutOfRangeHigh => self.rangefinder.max_distance_cm,
            RangefinderStatus::NotConnected | RangefinderStatus::NoData => self.alt_above_home_cm,
        }
    }
}

/// Mutable references to the collaborators a mode drives during a tick.
pub struct ModeDeps<'a> {
    pub pos: &'a mut dyn PositionControl,
    pub att: &'a mut dyn AttitudeControl,
    pub motors: &'a mut dyn MotorControl,
    pub arming: &'a mut dyn ArmingControl,
    pub precland: &'a dyn PrecisionLanding,
    pub avoid: &'a mut dyn Avoidance,
    pub events: &'a mut dyn EventSink,
}

/// Common interface of all flight modes.
pub trait FlightMode {
    /// Prepare the mode for activation. Returning an error refuses mode
    /// entry and leaves the vehicle in its previous mode.
    fn init(&mut self, input: &ModeInput, deps: &mut ModeDeps) -> Result<(), ModeError>;

    /// Advance the mode by one control-loop tick.
    fn run(&mut self, input: &ModeInput, deps: &mut ModeDeps);

    /// Release any claims before another mode takes over.
    fn exit(&mut self, deps: &mut ModeDeps);

    fn capabilities(&self) -> ModeCapabilities;

    fn name(&self) -> &'static str;
}

/// Whether the vehicle should be treated as on the ground for control
/// purposes.
pub fn is_disarmed_or_landed(input: &ModeInput, motors: &dyn MotorControl) -> bool {
    !motors.armed() || input.landed.complete
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_modes::test_input::*;

    #[test]
    fn height_prefers_rangefinder() {
        let mut input = flying_at(120.0);
        input.alt_above_home_cm = 500.0;
        assert_eq!(input.height_above_ground_cm(), 120.0);
    }

    #[test]
    fn height_clamps_out_of_range_low() {
        let mut input = flying_at(120.0);
        input.rangefinder.status = RangefinderStatus::OutOfRangeLow;
        assert_eq!(input.height_above_ground_cm(), 0.0);
    }

    #[test]
    fn height_clamps_out_of_range_high() {
        let mut input = flying_at(120.0);
        input.rangefinder.status = RangefinderStatus::OutOfRangeHigh;
        assert_eq!(input.height_above_ground_cm(), 4000.0);
    }

    #[test]
    fn height_falls_back_without_rangefinder() {
        let mut input = flying_at(120.0);
        input.rangefinder.status = RangefinderStatus::NoData;
        input.alt_above_home_cm = 321.0;
        assert_eq!(input.height_above_ground_cm(), 321.0);
    }
}
