#[allow(unused_imports)]
use num_traits::Float;

use crate::types::config::AltHoldConfig;

/// Normalized pilot stick input. Roll, pitch and yaw are in `[-1, 1]`,
/// throttle is in `[-1, 1]` around the hover midpoint. Deadzone and trim
/// handling happen upstream in the RC mapping layer.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PilotInput {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub throttle: f32,
}

impl PilotInput {
    /// Convert roll/pitch stick position into lean angle demands in
    /// centidegrees. The combined demand is limited circularly, to the
    /// smaller of the configured maximum and the altitude-controller limit
    /// `angle_limit_cd`.
    pub fn lean_angles_cd(&self, angle_max_cd: f32, angle_limit_cd: f32) -> (f32, f32) {
        let limit = angle_max_cd.min(angle_limit_cd).max(0.0);
        let mut roll_cd = self.roll * angle_max_cd;
        let mut pitch_cd = self.pitch * angle_max_cd;
        let total = (roll_cd * roll_cd + pitch_cd * pitch_cd).sqrt();
        if total > limit {
            let scale = limit / total;
            roll_cd *= scale;
            pitch_cd *= scale;
        }
        (roll_cd, pitch_cd)
    }

    /// Requested climb rate in cm/s, scaled by the configured pilot climb
    /// and descent speeds.
    pub fn climb_rate_cms(&self, cfg: &AltHoldConfig) -> f32 {
        if self.throttle >= 0.0 {
            self.throttle * cfg.pilot_speed_up_cms
        } else {
            self.throttle * cfg.pilot_speed_dn()
        }
    }

    /// Requested yaw rate in centidegrees per second.
    pub fn yaw_rate_cds(&self, cfg: &AltHoldConfig) -> f32 {
        self.yaw * cfg.pilot_yaw_rate_cds
    }

    /// Magnitude of the combined roll/pitch deflection, in `[0, sqrt(2)]`.
    pub fn lateral_deflection(&self) -> f32 {
        (self.roll * self.roll + self.pitch * self.pitch).sqrt()
    }
}
