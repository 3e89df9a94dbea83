use thiserror::Error;

/// Reasons a flight mode may refuse to be entered. The vehicle stays in its
/// previous mode when entry is refused.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    #[error("No healthy position estimate is available")]
    PositionUnavailable,
    #[error("The rangefinder is not connected")]
    RangefinderUnavailable,
    #[error("A feature required by the mode is disabled")]
    FeatureDisabled,
}
