pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{SimulatedActuator, SystemClock};
pub use config::DispenserConfig;
pub use crate::core::{
    fulfillment::{FulfillmentLoop, OrderOutcome},
    shutdown::{Shutdown, ShutdownSignal},
};
pub use utils::error::{DispenserError, Result};
