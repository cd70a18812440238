use crate::core::shutdown::Shutdown;
use crate::domain::model::Order;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 實體出料裝置；呼叫會阻塞到動作完成
pub trait ActuatorDriver: Send + Sync {
    fn dispense_ingredient(&self, product_name: &str, quantity: u32) -> Result<()>;
    fn dispense_cups(&self, quantity: u32) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Waits until the server reports at least one order.
    async fn poll_orders(&self, shutdown: &Shutdown) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait OrderAcknowledger: Send + Sync {
    async fn bump(&self, order: &Order, shutdown: &Shutdown) -> Result<()>;
}

#[async_trait]
pub trait Dispenser: Send + Sync {
    async fn dispense(&self, order: &Order) -> Result<()>;
}
