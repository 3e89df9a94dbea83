//! Drains the flight-event and operator-message channels into the log. A
//! flying vehicle additionally forwards both to the telemetry link; routing
//! them here keeps the bounded channels from backing up when no link is
//! connected.

use embassy_futures::select::{select, Either};

use crate::signals as s;
use crate::types::status::Severity;

#[embassy_executor::task]
pub async fn main() -> ! {
    const ID: &str = "event_router";
    info!("{}: Task started", ID);

    loop {
        match select(s::FLIGHT_EVENTS.receive(), s::OPERATOR_MESSAGES.receive()).await {
            Either::First(event) => {
                info!("{}: Flight event: {:?}", ID, event);
            }
            Either::Second(msg) => match msg.severity {
                Severity::Emergency | Severity::Critical => {
                    error!("{}: {}", ID, msg.text.as_str())
                }
                Severity::Warning => warn!("{}: {}", ID, msg.text.as_str()),
                Severity::Notice | Severity::Info => info!("{}: {}", ID, msg.text.as_str()),
            },
        }
    }
}
