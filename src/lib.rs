#![cfg_attr(not(any(test, feature = "arch-std")), no_std)]

// Export the logging macros for either defmt or log
#[macro_use]
pub mod logging;

pub mod errors;
pub mod filters;
pub mod flight_modes;
pub mod hw_abstraction;
pub mod signals;
pub mod tasks;
pub mod types;
pub mod utils;

// Re-exported for implementors
pub use embassy_executor;
pub use embassy_futures;
pub use embassy_sync;
pub use embassy_time;
pub use heapless;
pub use nalgebra;
