use heapless::String;
use serde::{Deserialize, Serialize};

/// Ground-contact flags from the external landed detector. This crate only
/// consumes these, it never computes them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LandedState {
    /// The detector is certain the vehicle is on the ground.
    pub complete: bool,
    /// The detector suspects ground contact but is not certain yet.
    pub maybe: bool,
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RcStatus {
    pub failsafe: bool,
    pub quality: u8,
}

/// Discrete flight events published for logging and telemetry. Consumers are
/// best effort, the producer never blocks on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightEvent {
    LandStart,
    LandAbort,
    TakeoffStart,
    TakeoffComplete,
}

/// Severity levels for operator-facing text, ordered from most to least
/// severe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    Emergency,
    Critical,
    Warning,
    Notice,
    Info,
}

/// Severity-tagged text message for the ground station. Bounded so it can
/// travel through a static channel without allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMessage {
    pub severity: Severity,
    pub text: String<64>,
}

impl OperatorMessage {
    /// Build a message, truncating text that does not fit the buffer.
    pub fn new(severity: Severity, text: &str) -> Self {
        let mut buffer = String::new();
        for ch in text.chars() {
            if buffer.push(ch).is_err() {
                break;
            }
        }
        Self {
            severity,
            text: buffer,
        }
    }
}
