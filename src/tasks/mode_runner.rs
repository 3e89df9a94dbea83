//! The mode runner: invokes the active flight mode once per control-loop
//! tick, assembles the per-tick input snapshot from the signal channels and
//! handles mode-switch requests.
//!
//! The task is generic over the controller and vehicle implementations, so
//! device crates pass in their hardware-backed types and the SITL passes in
//! simulated ones.

use embassy_time::{Duration, Instant, Ticker};
use nalgebra::Vector2;

use crate::errors::ModeError;
use crate::flight_modes::alt_hold::ModeAltHold;
use crate::flight_modes::loiter::ModeLoiter;
use crate::flight_modes::{FlightMode, FlightModeKind, ModeCapabilities, ModeDeps, ModeInput};
use crate::hw_abstraction::{
    ArmingControl, AttitudeControl, Avoidance, EventSink, MotorControl, PositionControl,
    PrecisionLanding,
};
use crate::signals as s;
use crate::types::config::{AltHoldConfig, LoiterConfig, ModeRunnerConfig};
use crate::types::measurements::{PrecLandTarget, RangefinderData, RangefinderStatus};
use crate::types::status::{FlightEvent, OperatorMessage, Severity};

/// Event sink backed by the global channels. Messages are dropped when the
/// consumer falls behind; emission never blocks the control loop.
struct SignalEvents;

impl EventSink for SignalEvents {
    fn event(&mut self, event: FlightEvent) {
        let _ = s::FLIGHT_EVENTS.try_send(event);
    }

    fn send_text(&mut self, severity: Severity, text: &str) {
        let _ = s::OPERATOR_MESSAGES.try_send(OperatorMessage::new(severity, text));
    }
}

/// Precision-landing provider over the asynchronously written target
/// snapshot. A missing or stale snapshot reads as "no target".
struct SignalPrecLand {
    enabled: bool,
    target: Option<PrecLandTarget>,
}

impl PrecisionLanding for SignalPrecLand {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn target_acquired(&self) -> bool {
        self.target.is_some_and(|t| t.acquired)
    }

    fn target_position_cm(&self) -> Option<Vector2<f32>> {
        self.target
            .filter(|t| t.acquired)
            .map(|t| Vector2::new(t.position_ne_cm[0], t.position_ne_cm[1]))
    }

    fn target_velocity_cms(&self, _vehicle_vel_cms: Vector2<f32>) -> Vector2<f32> {
        match self.target {
            Some(t) if t.acquired => Vector2::new(t.velocity_ne_cms[0], t.velocity_ne_cms[1]),
            _ => Vector2::zeros(),
        }
    }
}

fn try_enter(
    mode: &mut dyn FlightMode,
    input: &ModeInput,
    deps: &mut ModeDeps,
) -> Result<(), ModeError> {
    let caps = mode.capabilities();
    if caps.contains(ModeCapabilities::REQUIRES_POSITION) && !input.position_ok {
        return Err(ModeError::PositionUnavailable);
    }
    if caps.contains(ModeCapabilities::REQUIRES_RANGEFINDER)
        && input.rangefinder.status == RangefinderStatus::NotConnected
    {
        return Err(ModeError::RangefinderUnavailable);
    }
    mode.init(input, deps)
}

pub async fn main(
    config: ModeRunnerConfig,
    mut pos: impl PositionControl,
    mut att: impl AttitudeControl,
    mut motors: impl MotorControl,
    mut arming: impl ArmingControl,
    mut avoid: impl Avoidance,
) -> ! {
    const ID: &str = "mode_runner";
    info!("{}: Task started", ID);

    // Task inputs
    let mut rcv_pilot = s::PILOT_INPUT.receiver().unwrap();
    let mut rcv_rc_status = s::RC_STATUS.receiver().unwrap();
    let mut rcv_rangefinder = s::RANGEFINDER_DATA.receiver().unwrap();
    let mut rcv_position = s::POSITION_ESTIMATE.receiver().unwrap();
    let mut rcv_landed = s::LANDED_STATE.receiver().unwrap();
    let mut rcv_precland = s::PRECLAND_TARGET.receiver().unwrap();
    let mut rcv_cmd_mode = s::CMD_FLIGHT_MODE.receiver().unwrap();

    // Task outputs
    let snd_active_mode = s::ACTIVE_FLIGHT_MODE.sender();

    let dt = 1.0 / config.freq_hz as f32;
    let mut loiter = ModeLoiter::new(LoiterConfig::default(), dt);
    let mut alt_hold = ModeAltHold::new(AltHoldConfig::default());

    // Wait for the essential producers before the first tick. The
    // rangefinder and precision-landing pipeline are optional equipment.
    let mut pilot = rcv_pilot.get().await;
    let mut rc_status = rcv_rc_status.get().await;
    let mut position = rcv_position.get().await;
    let mut landed = rcv_landed.get().await;
    let mut rangefinder = rcv_rangefinder
        .try_get()
        .unwrap_or(RangefinderData::not_connected());
    let mut precland_target = rcv_precland.try_get();

    let mut active = FlightModeKind::AltHold;
    snd_active_mode.send(active);
    let mut first_tick = true;

    let mut ticker = Ticker::every(Duration::from_hz(config.freq_hz as u64));
    info!("{}: Entering main loop at {} Hz", ID, config.freq_hz);
    loop {
        ticker.next().await;

        // Freshen the cached inputs, carrying stale values forward
        pilot = rcv_pilot.try_get().unwrap_or(pilot);
        rc_status = rcv_rc_status.try_get().unwrap_or(rc_status);
        rangefinder = rcv_rangefinder.try_get().unwrap_or(rangefinder);
        position = rcv_position.try_get().unwrap_or(position);
        landed = rcv_landed.try_get().unwrap_or(landed);
        precland_target = rcv_precland.try_changed().or(precland_target);

        let input = ModeInput {
            now_ms: Instant::now().as_millis() as u32,
            dt,
            pilot,
            rc_failsafe: rc_status.failsafe,
            rangefinder,
            position_ne_cm: position.position_xy_cm(),
            alt_above_home_cm: position.alt_above_home_cm,
            velocity_xy_cms: position.velocity_xy_cms(),
            landed,
            position_ok: position.healthy,
        };

        let precland = SignalPrecLand {
            enabled: true,
            target: precland_target,
        };
        let mut events = SignalEvents;
        let mut deps = ModeDeps {
            pos: &mut pos,
            att: &mut att,
            motors: &mut motors,
            arming: &mut arming,
            precland: &precland,
            avoid: &mut avoid,
            events: &mut events,
        };

        if first_tick {
            first_tick = false;
            // the default mode has no entry requirements
            let _ = try_enter(&mut alt_hold, &input, &mut deps);
        }

        // Handle mode-switch requests. A refused entry leaves the previous
        // mode active.
        if let Some(requested) = rcv_cmd_mode.try_changed() {
            if requested != active {
                let entered = match requested {
                    FlightModeKind::AltHold => try_enter(&mut alt_hold, &input, &mut deps),
                    FlightModeKind::Loiter => try_enter(&mut loiter, &input, &mut deps),
                };
                match entered {
                    Ok(()) => {
                        match active {
                            FlightModeKind::AltHold => alt_hold.exit(&mut deps),
                            FlightModeKind::Loiter => loiter.exit(&mut deps),
                        }
                        active = requested;
                        snd_active_mode.send(active);
                        info!("{}: Switched to {:?} mode", ID, active);
                    }
                    Err(error) => {
                        warn!("{}: Refusing {:?} mode: {:?}", ID, requested, error);
                        deps.events
                            .send_text(Severity::Warning, "Mode change refused");
                    }
                }
            }
        }

        match active {
            FlightModeKind::AltHold => alt_hold.run(&input, &mut deps),
            FlightModeKind::Loiter => loiter.run(&input, &mut deps),
        }
    }
}
