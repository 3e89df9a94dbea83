use serde::{Deserialize, Serialize};

/// Pilot-facing vertical control parameters shared by all altitude-holding
/// modes.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltHoldConfig {
    /// Maximum commanded climb rate in cm/s.
    pub pilot_speed_up_cms: f32,
    /// Maximum commanded descent rate in cm/s. Zero selects
    /// `pilot_speed_up_cms` for descent as well.
    pub pilot_speed_dn_cms: f32,
    /// Vertical acceleration limit in cm/s^2.
    pub pilot_accel_z_cmss: f32,
    /// Target altitude for pilot-initiated takeoff in cm, clamped to
    /// `[0, 1000]` when used.
    pub pilot_takeoff_alt_cm: f32,
    /// Full-deflection yaw rate in centidegrees per second.
    pub pilot_yaw_rate_cds: f32,
}

impl AltHoldConfig {
    /// Effective descent speed, falling back to the climb speed when no
    /// separate descent speed is configured.
    pub fn pilot_speed_dn(&self) -> f32 {
        if self.pilot_speed_dn_cms > 0.0 {
            self.pilot_speed_dn_cms
        } else {
            self.pilot_speed_up_cms
        }
    }
}

impl Default for AltHoldConfig {
    fn default() -> Self {
        Self {
            pilot_speed_up_cms: 250.0,
            pilot_speed_dn_cms: 0.0,
            pilot_accel_z_cmss: 250.0,
            pilot_takeoff_alt_cm: 0.0,
            pilot_yaw_rate_cds: 20000.0,
        }
    }
}

/// Parameters of the landing detector and the shared landing sequence.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LandingConfig {
    /// Descent speed during the final landing stage in cm/s. Zero selects
    /// the pilot descent speed.
    pub land_speed_cms: f32,
    /// Altitude in cm below which descent is slowed towards the land speed.
    pub land_alt_low_cm: f32,
    /// Upper pilot-land altitude threshold in cm (ground clearance is added
    /// on top).
    pub pilot_land_alt_cm: f32,
    /// Lower pilot-land altitude threshold in cm (ground clearance is added
    /// on top).
    pub pilot_land_low_alt_cm: f32,
    /// Pilot repositioning during landing: 0 disables, 1 enables, values
    /// above 1 additionally shrink the lean-angle limit near the ground.
    pub repositioning: u8,
}

impl LandingConfig {
    /// Effective landing descent speed.
    pub fn land_speed(&self, cfg: &AltHoldConfig) -> f32 {
        let speed = self.land_speed_cms.abs();
        if speed > 0.0 {
            speed
        } else {
            cfg.pilot_speed_dn()
        }
    }
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            land_speed_cms: 50.0,
            land_alt_low_cm: 1000.0,
            pilot_land_alt_cm: 150.0,
            pilot_land_low_alt_cm: 50.0,
            repositioning: 1,
        }
    }
}

/// Full parameter set of the loiter mode.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoiterConfig {
    pub alt: AltHoldConfig,
    pub land: LandingConfig,
    /// Allow the precision-landing pipeline to steer the horizontal target
    /// while loitering.
    pub precision_loiter: bool,
}

/// Parameters of the mode runner task.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeRunnerConfig {
    /// Control loop rate in Hz.
    pub freq_hz: u16,
}

impl Default for ModeRunnerConfig {
    fn default() -> Self {
        Self { freq_hz: 100 }
    }
}
