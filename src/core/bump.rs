use crate::config::DispenserConfig;
use crate::core::auth::AuthTokenProvider;
use crate::core::shutdown::Shutdown;
use crate::core::{Order, OrderAcknowledger};
use crate::domain::model::BumpRequest;
use crate::utils::error::{DispenserError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// 向 KDS 回報訂單完成（bump），失敗時以固定間隔重試
pub struct OrderBumpClient {
    client: Client,
    bump_url: String,
    auth: Arc<AuthTokenProvider>,
    max_attempts: u32,
    retry_delay: Duration,
    timeout: Option<Duration>,
}

impl OrderBumpClient {
    pub fn new(client: Client, config: &DispenserConfig, auth: Arc<AuthTokenProvider>) -> Self {
        Self {
            client,
            bump_url: config.server.bump_url.clone(),
            auth,
            max_attempts: config.timing.bump_attempts.max(1),
            retry_delay: config.timing.bump_retry_delay(),
            timeout: config.request_timeout(),
        }
    }

    async fn try_bump(&self, order: &Order) -> Result<()> {
        let body = BumpRequest {
            kds_order_id: &order.internal_id,
        };

        let mut request = self.client.post(&self.bump_url).json(&body);
        if let Some(token) = self.auth.get_token().await {
            request = request.bearer_auth(&token.value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl OrderAcknowledger for OrderBumpClient {
    async fn bump(&self, order: &Order, shutdown: &Shutdown) -> Result<()> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.try_bump(order).await {
                Ok(()) => {
                    tracing::info!("✅ Bumped order {}", order.order_id);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Bump attempt {}/{} for order {} failed: {}",
                        attempt,
                        self.max_attempts,
                        order.order_id,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            // 固定間隔，不做指數退避
            if attempt < self.max_attempts && !shutdown.sleep(self.retry_delay).await {
                return Err(DispenserError::Cancelled);
            }
        }

        Err(DispenserError::BumpFailure {
            order_id: order.order_id.clone(),
            attempts: self.max_attempts,
            message: last_error,
        })
    }
}
