use crate::config::toml_config::{
    CredentialsConfig, DeviceConfig, ServerConfig, TimingConfig,
};
use crate::config::DispenserConfig;
use crate::core::{ActuatorDriver, Clock, LineItem, Order};
use crate::utils::error::{DispenserError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()),
        }
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ActuatorCall {
    Cups(u32),
    Ingredient(String, u32),
}

/// 記錄每次呼叫的假致動器
pub(crate) struct RecordingActuator {
    calls: Mutex<Vec<ActuatorCall>>,
    delay: Duration,
    failing_product: Option<String>,
}

impl RecordingActuator {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            failing_product: None,
        }
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub(crate) fn failing_on(product_name: &str) -> Self {
        Self {
            failing_product: Some(product_name.to_string()),
            ..Self::new()
        }
    }

    pub(crate) fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ActuatorDriver for RecordingActuator {
    fn dispense_ingredient(&self, product_name: &str, quantity: u32) -> Result<()> {
        std::thread::sleep(self.delay);
        self.calls
            .lock()
            .unwrap()
            .push(ActuatorCall::Ingredient(product_name.to_string(), quantity));
        if self.failing_product.as_deref() == Some(product_name) {
            return Err(DispenserError::DispenseFailure {
                message: format!("{} servo jammed", product_name),
            });
        }
        Ok(())
    }

    fn dispense_cups(&self, quantity: u32) -> Result<()> {
        std::thread::sleep(self.delay);
        self.calls.lock().unwrap().push(ActuatorCall::Cups(quantity));
        Ok(())
    }
}

pub(crate) fn sample_order(order_id: &str, internal_id: &str, items: &[(&str, u32)]) -> Order {
    Order {
        order_id: order_id.to_string(),
        internal_id: internal_id.to_string(),
        line_items: items
            .iter()
            .map(|(name, quantity)| LineItem {
                product_name: name.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

pub(crate) fn config_for(base_url: &str) -> DispenserConfig {
    DispenserConfig {
        server: ServerConfig {
            login_url: format!("{}/login", base_url),
            orders_url: format!("{}/orders", base_url),
            bump_url: format!("{}/bump", base_url),
            request_timeout_seconds: Some(5),
        },
        credentials: CredentialsConfig {
            username: "kiosk".to_string(),
            password: "secret".to_string(),
        },
        device: DeviceConfig::default(),
        timing: TimingConfig::default(),
        actuators: Default::default(),
    }
}

/// 毫秒級間隔，讓測試不用等真實秒數
pub(crate) fn fast_config(base_url: &str) -> DispenserConfig {
    let mut config = config_for(base_url);
    config.timing.poll_interval_ms = 10;
    config.timing.collect_delay_ms = 10;
    config.timing.bump_retry_delay_ms = 10;
    config
}
