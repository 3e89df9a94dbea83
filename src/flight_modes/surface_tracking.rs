//! Rangefinder-based terrain offset estimation.
//!
//! While flying, the vertical position controller can follow the surface
//! below the vehicle instead of the home-relative altitude. This module
//! maintains that offset: the difference between the estimated altitude and
//! the measured ground distance, low-pass filtered to keep rangefinder noise
//! out of the vertical loop.

use crate::filters::Lowpass;
use crate::flight_modes::ModeInput;
use crate::hw_abstraction::PositionControl;

const OFFSET_FILTER_TAU_S: f32 = 0.25;

#[derive(Debug)]
pub struct SurfaceTracking {
    filter: Lowpass,
}

impl SurfaceTracking {
    pub fn new(dt: f32) -> Self {
        Self {
            filter: Lowpass::new(OFFSET_FILTER_TAU_S, dt),
        }
    }

    /// Update the terrain offset from the current rangefinder reading. Does
    /// nothing while the rangefinder is unusable, leaving the previous
    /// offset in place.
    pub fn update(&mut self, input: &ModeInput, pos: &mut dyn PositionControl) {
        if !input.rangefinder.usable() {
            return;
        }
        let ground_height_cm = input.alt_above_home_cm - input.rangefinder.distance_cm;
        pos.set_terrain_offset(self.filter.update(ground_height_cm));
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}
