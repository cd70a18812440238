use crate::core::{ActuatorDriver, DispenseRequest, Dispenser, Order};
use crate::utils::error::{DispenserError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

/// 將一張訂單轉成並行的出料動作，全部完成後才返回
pub struct DispenseCoordinator {
    driver: Arc<dyn ActuatorDriver>,
    recognized: HashSet<String>,
}

impl DispenseCoordinator {
    pub fn new<I, S>(driver: Arc<dyn ActuatorDriver>, recognized: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            driver,
            recognized: recognized.into_iter().map(Into::into).collect(),
        }
    }

    /// One request per recognized line item, followed by one cup request whose
    /// quantity is the number of ingredient requests (not the unit total).
    pub fn plan(&self, order: &Order) -> Vec<DispenseRequest> {
        let mut requests: Vec<DispenseRequest> = order
            .line_items
            .iter()
            .filter(|item| self.recognized.contains(&item.product_name))
            .map(|item| DispenseRequest::Ingredient {
                product_name: item.product_name.clone(),
                quantity: item.quantity,
            })
            .collect();

        let cups = requests.len() as u32;
        requests.push(DispenseRequest::Cups { quantity: cups });
        requests
    }
}

#[async_trait]
impl Dispenser for DispenseCoordinator {
    async fn dispense(&self, order: &Order) -> Result<()> {
        let requests = self.plan(order);
        let mut tasks = JoinSet::new();

        for request in requests {
            match &request {
                DispenseRequest::Ingredient {
                    product_name,
                    quantity,
                } => tracing::info!("☕ dropping {} {}", quantity, product_name),
                DispenseRequest::Cups { quantity } => {
                    tracing::debug!("dropping {} cup(s)", quantity)
                }
            }

            let driver = Arc::clone(&self.driver);
            tasks.spawn_blocking(move || match request {
                DispenseRequest::Ingredient {
                    product_name,
                    quantity,
                } => driver.dispense_ingredient(&product_name, quantity),
                DispenseRequest::Cups { quantity } => driver.dispense_cups(quantity),
            });
        }

        // 即使有動作失敗也要等全部結束，避免 servo 停在半途
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(e) => Err(DispenserError::DispenseFailure {
                    message: format!("dispense task aborted: {}", e),
                }),
            };

            if let Err(e) = outcome {
                tracing::error!("❌ Dispensing order {} failed: {}", order.order_id, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => Ok(()),
            Some(e @ DispenserError::DispenseFailure { .. }) => Err(e),
            Some(other) => Err(DispenserError::DispenseFailure {
                message: other.to_string(),
            }),
        }
    }
}
