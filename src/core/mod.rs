pub mod auth;
pub mod blacklist;
pub mod bump;
pub mod dispense;
pub mod fulfillment;
pub mod orders;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{AuthToken, DispenseRequest, LineItem, Order};
pub use crate::domain::ports::{ActuatorDriver, Clock, Dispenser, OrderAcknowledger, OrderSource};
pub use crate::utils::error::Result;
