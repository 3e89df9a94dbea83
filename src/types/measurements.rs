use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Health and range classification reported by the rangefinder driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangefinderStatus {
    NotConnected,
    NoData,
    OutOfRangeLow,
    OutOfRangeHigh,
    Good,
}

/// Downward rangefinder snapshot as published by the sensor driver task.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangefinderData {
    pub status: RangefinderStatus,
    /// Filtered distance along the sensor axis in cm. Only meaningful while
    /// `status` is `Good`.
    pub distance_cm: f32,
    /// Upper limit of the measurement range in cm.
    pub max_distance_cm: f32,
    /// Mounting offset between the sensor and the lowest point of the
    /// vehicle (landing gear) in cm.
    pub ground_clearance_cm: f32,
}

impl RangefinderData {
    pub const fn not_connected() -> Self {
        Self {
            status: RangefinderStatus::NotConnected,
            distance_cm: 0.0,
            max_distance_cm: 0.0,
            ground_clearance_cm: 0.0,
        }
    }

    /// Whether the reading can be used for altitude-above-ground estimation.
    pub fn usable(&self) -> bool {
        matches!(self.status, RangefinderStatus::Good)
    }
}

/// Fused position/velocity estimate published by the state estimator.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionEstimate {
    /// Whether the estimator currently considers its output trustworthy.
    pub healthy: bool,
    /// Horizontal position in the north-east frame relative to home, in cm.
    pub position_ne_cm: [f32; 2],
    /// Altitude above the home (arming) position in cm.
    pub alt_above_home_cm: f32,
    /// Velocity in the north-east-up frame in cm/s.
    pub velocity_neu_cms: [f32; 3],
}

impl PositionEstimate {
    pub fn position_xy_cm(&self) -> Vector2<f32> {
        Vector2::new(self.position_ne_cm[0], self.position_ne_cm[1])
    }

    pub fn velocity_xy_cms(&self) -> Vector2<f32> {
        Vector2::new(self.velocity_neu_cms[0], self.velocity_neu_cms[1])
    }
}

/// Precision-landing target snapshot, produced asynchronously by the vision
/// or beacon pipeline and read without blocking by the control loop.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrecLandTarget {
    pub timestamp_ms: u32,
    pub acquired: bool,
    /// Target position in the north-east frame in cm.
    pub position_ne_cm: [f32; 2],
    /// Target velocity in the north-east frame in cm/s.
    pub velocity_ne_cms: [f32; 2],
}
