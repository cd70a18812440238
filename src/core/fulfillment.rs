use crate::config::DispenserConfig;
use crate::core::auth::AuthTokenProvider;
use crate::core::blacklist::BlacklistRegistry;
use crate::core::bump::OrderBumpClient;
use crate::core::dispense::DispenseCoordinator;
use crate::core::orders::OrderQueueClient;
use crate::core::shutdown::Shutdown;
use crate::core::{ActuatorDriver, Clock, Dispenser, Order, OrderAcknowledger, OrderSource};
use crate::utils::error::{DispenserError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// 單張訂單的處理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Already bumped earlier in this process.
    Skipped,
    Bumped,
    /// Dispensed but never acknowledged; the next poll may list it again.
    BumpFailed,
    DispenseFailed,
}

/// poll → filter → dispense → bump → cooldown，直到收到關機訊號
pub struct FulfillmentLoop<Q, B, D>
where
    Q: OrderSource,
    B: OrderAcknowledger,
    D: Dispenser,
{
    orders: Q,
    bumper: B,
    dispenser: D,
    blacklist: BlacklistRegistry,
    poll_interval: Duration,
    collect_delay: Duration,
}

impl<Q, B, D> FulfillmentLoop<Q, B, D>
where
    Q: OrderSource,
    B: OrderAcknowledger,
    D: Dispenser,
{
    pub fn new(orders: Q, bumper: B, dispenser: D) -> Self {
        Self {
            orders,
            bumper,
            dispenser,
            blacklist: BlacklistRegistry::new(),
            poll_interval: Duration::from_secs(1),
            collect_delay: Duration::from_secs(5),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_collect_delay(mut self, collect_delay: Duration) -> Self {
        self.collect_delay = collect_delay;
        self
    }

    pub fn blacklist(&self) -> &BlacklistRegistry {
        &self.blacklist
    }

    /// Runs until shutdown. Per-order failures are logged and never end the loop.
    pub async fn run(&mut self, shutdown: &Shutdown) -> Result<()> {
        tracing::info!("🚀 Fulfillment loop started");

        loop {
            match self.run_cycle(shutdown).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    tracing::info!(
                        "🛑 Fulfillment loop stopped ({} order(s) bumped)",
                        self.blacklist.len()
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("❌ Cycle failed: {}", e);
                    if !shutdown.sleep(self.poll_interval).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One POLLING → PROCESSING_ORDER… → COOLDOWN pass.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> Result<()> {
        let orders = self.orders.poll_orders(shutdown).await?;
        self.process_batch(&orders, shutdown).await?;

        tracing::debug!("Cooling down for {:?}", self.poll_interval);
        if !shutdown.sleep(self.poll_interval).await {
            return Err(DispenserError::Cancelled);
        }
        Ok(())
    }

    /// 依伺服器回傳順序逐一處理；只有關機會中斷
    pub async fn process_batch(
        &mut self,
        orders: &[Order],
        shutdown: &Shutdown,
    ) -> Result<Vec<OrderOutcome>> {
        let mut outcomes = Vec::with_capacity(orders.len());
        for order in orders {
            outcomes.push(self.process_order(order, shutdown).await?);
        }
        Ok(outcomes)
    }

    pub async fn process_order(&mut self, order: &Order, shutdown: &Shutdown) -> Result<OrderOutcome> {
        tracing::info!("🔍 Reviewing order: {}", order.order_id);

        if self.blacklist.contains(&order.order_id) {
            tracing::debug!("Order {} already bumped, skipping", order.order_id);
            return Ok(OrderOutcome::Skipped);
        }

        if let Err(e) = self.dispenser.dispense(order).await {
            tracing::error!("❌ Order {} not dispensed: {}", order.order_id, e);
            return Ok(OrderOutcome::DispenseFailed);
        }

        let outcome = match self.bumper.bump(order, shutdown).await {
            Ok(()) => {
                self.blacklist.add(order.order_id.clone());
                OrderOutcome::Bumped
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                // 已出料但未 bump：若伺服器仍列出此單，下一輪會再次出料
                tracing::error!("❌ {}", e);
                OrderOutcome::BumpFailed
            }
        };

        tracing::info!("⏳ Waiting {:?} for customer to collect", self.collect_delay);
        if !shutdown.sleep(self.collect_delay).await {
            return Err(DispenserError::Cancelled);
        }

        Ok(outcome)
    }
}

impl FulfillmentLoop<OrderQueueClient, OrderBumpClient, DispenseCoordinator> {
    /// 以 HTTP client 與指定的致動器組出完整控制迴圈
    pub fn from_config(
        config: &DispenserConfig,
        driver: Arc<dyn ActuatorDriver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let client = Client::new();
        let auth = Arc::new(AuthTokenProvider::new(client.clone(), config, clock));

        let orders = OrderQueueClient::new(client.clone(), config, Arc::clone(&auth));
        let bumper = OrderBumpClient::new(client, config, auth);
        let dispenser = DispenseCoordinator::new(driver, config.actuators.capsules.keys().cloned());

        FulfillmentLoop::new(orders, bumper, dispenser)
            .with_poll_interval(config.timing.poll_interval())
            .with_collect_delay(config.timing.collect_delay())
    }
}
