//! Static channels connecting producer tasks (RC mapping, sensor readers,
//! estimators, the vision pipeline) to the mode run loop. Producers are free
//! to run at their own rates; the control loop reads with `try_get` and
//! carries stale values forward, it never blocks on a peripheral.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::flight_modes::FlightModeKind;
use crate::types::control::PilotInput;
use crate::types::measurements::{PositionEstimate, PrecLandTarget, RangefinderData};
use crate::types::status::{FlightEvent, LandedState, OperatorMessage, RcStatus};

macro_rules! watch {
    ($name:ident, $datatype:ty, $num:literal, $doc:expr) => {
        #[doc = $doc]
        pub static $name: embassy_sync::watch::Watch<CriticalSectionRawMutex, $datatype, $num> =
            embassy_sync::watch::Watch::new();
    };
}

watch!(PILOT_INPUT, PilotInput, 2, "Normalized pilot stick input, published by the RC mapping layer.");
watch!(RC_STATUS, RcStatus, 2, "Link quality and failsafe state of the RC receiver.");
watch!(RANGEFINDER_DATA, RangefinderData, 2, "Filtered downward rangefinder snapshot, published by the sensor driver.");
watch!(POSITION_ESTIMATE, PositionEstimate, 2, "Fused position and velocity estimate, published by the state estimator.");
watch!(LANDED_STATE, LandedState, 2, "Ground-contact flags, published by the landed detector.");
watch!(PRECLAND_TARGET, PrecLandTarget, 2, "Precision-landing target, written asynchronously by the vision pipeline.");
watch!(CMD_FLIGHT_MODE, FlightModeKind, 2, "Requested flight mode, written by the RC mapping or GCS layer.");
watch!(ACTIVE_FLIGHT_MODE, FlightModeKind, 3, "Currently active flight mode, owned by the mode runner.");

/// Discrete flight events for logging and telemetry. Producers use
/// `try_send` and drop the event when the channel is full.
pub static FLIGHT_EVENTS: Channel<CriticalSectionRawMutex, FlightEvent, 8> = Channel::new();

/// Severity-tagged operator text. Same best-effort policy as the events.
pub static OPERATOR_MESSAGES: Channel<CriticalSectionRawMutex, OperatorMessage, 4> = Channel::new();
