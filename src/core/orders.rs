use crate::config::DispenserConfig;
use crate::core::auth::AuthTokenProvider;
use crate::core::shutdown::Shutdown;
use crate::core::{Order, OrderSource};
use crate::domain::model::OrdersResponse;
use crate::utils::error::{DispenserError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub struct OrderQueueClient {
    client: Client,
    orders_url: String,
    auth: Arc<AuthTokenProvider>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl OrderQueueClient {
    pub fn new(client: Client, config: &DispenserConfig, auth: Arc<AuthTokenProvider>) -> Self {
        Self {
            client,
            orders_url: config.server.orders_url.clone(),
            auth,
            poll_interval: config.timing.poll_interval(),
            timeout: config.request_timeout(),
        }
    }

    /// 單次查詢待處理訂單；回應無法使用時回傳 `PollFailure`
    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let mut request = self.client.get(&self.orders_url);

        if let Some(token) = self.auth.get_token().await {
            request = request.bearer_auth(&token.value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| DispenserError::PollFailure {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(DispenserError::PollFailure {
                message: format!("orders endpoint returned status {}", response.status()),
            });
        }

        let body: OrdersResponse =
            response
                .json()
                .await
                .map_err(|e| DispenserError::PollFailure {
                    message: format!("malformed orders response: {}", e),
                })?;

        Ok(body.orders)
    }
}

#[async_trait]
impl OrderSource for OrderQueueClient {
    async fn poll_orders(&self, shutdown: &Shutdown) -> Result<Vec<Order>> {
        tracing::info!("📡 Getting orders");

        loop {
            if shutdown.is_triggered() {
                return Err(DispenserError::Cancelled);
            }

            match self.fetch_orders().await {
                Ok(orders) if !orders.is_empty() => {
                    let order_ids = orders
                        .iter()
                        .map(|order| order.order_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    tracing::info!("📥 Got orders: [{}]", order_ids);
                    return Ok(orders);
                }
                Ok(_) => tracing::debug!("No pending orders"),
                Err(e) => tracing::warn!("⚠️ {}", e),
            }

            if !shutdown.sleep(self.poll_interval).await {
                return Err(DispenserError::Cancelled);
            }
        }
    }
}
