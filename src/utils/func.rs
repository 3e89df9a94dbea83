#[allow(unused_imports)]
use num_traits::Float;

/// Square-root velocity shaping law. Computes a velocity demand which closes
/// the position error `error` with proportional gain `p` close to the target,
/// transitioning to a square-root profile further out so that the implied
/// deceleration never exceeds `accel_max`.
///
/// When `dt` is positive the output is additionally limited to the rate that
/// would close the full error within a single step, which prevents
/// overshooting oscillations at low update rates.
pub fn sqrt_controller(error: f32, p: f32, accel_max: f32, dt: f32) -> f32 {
    let correction = if accel_max <= 0.0 {
        // no acceleration limit, plain proportional response
        error * p
    } else if p == 0.0 {
        if error > 0.0 {
            safe_sqrt(2.0 * accel_max * error)
        } else if error < 0.0 {
            -safe_sqrt(2.0 * accel_max * -error)
        } else {
            0.0
        }
    } else {
        // below `linear_dist` the proportional term dominates, beyond it
        // the square-root profile keeps deceleration within `accel_max`
        let linear_dist = accel_max / (p * p);
        if error > linear_dist {
            safe_sqrt(2.0 * accel_max * (error - linear_dist / 2.0))
        } else if error < -linear_dist {
            -safe_sqrt(2.0 * accel_max * (-error - linear_dist / 2.0))
        } else {
            error * p
        }
    };

    if dt > 0.0 {
        correction.clamp(-error.abs() / dt, error.abs() / dt)
    } else {
        correction
    }
}

/// Linearly interpolate between `out_low` and `out_high` as `value` moves
/// from `value_low` to `value_high`, clamping outside that range.
pub fn linear_interpolate(
    out_low: f32,
    out_high: f32,
    value: f32,
    value_low: f32,
    value_high: f32,
) -> f32 {
    if value <= value_low {
        return out_low;
    }
    if value >= value_high {
        return out_high;
    }
    let scale = (value - value_low) / (value_high - value_low);
    out_low + scale * (out_high - out_low)
}

/// Square root which treats negative inputs as zero rather than NaN.
pub fn safe_sqrt(value: f32) -> f32 {
    if value <= 0.0 {
        0.0
    } else {
        value.sqrt()
    }
}
