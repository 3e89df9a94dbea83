use serde::{Deserialize, Serialize};

/// Output ramp stage reported by the motor subsystem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpoolState {
    ShutDown,
    GroundIdle,
    SpoolingUp,
    ThrottleUnlimited,
    SpoolingDown,
}

/// Target ramp stage requested from the motor subsystem. The motors move
/// towards the requested stage through the intermediate spooling states.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesiredSpoolState {
    ShutDown,
    GroundIdle,
    ThrottleUnlimited,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisarmReason {
    /// The landing sequence completed and the vehicle settled on the ground
    Landed,
    /// A safety interlock tripped and terminated vehicle operation
    SafetyInterlock,
    RadioFailsafe,
    UserCommand,
}
