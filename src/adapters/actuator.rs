use crate::config::toml_config::{ActuatorsConfig, ServoTimingConfig};
use crate::core::ActuatorDriver;
use crate::utils::error::{DispenserError, Result};
use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::Duration;

/// 沒有 GPIO 時使用的 servo 模擬器：記錄每個脈衝並阻塞實際動作所需時間
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    capsule_channels: BTreeMap<String, u8>,
    cup_channel: u8,
    timing: ServoTimingConfig,
}

impl SimulatedActuator {
    pub fn new(config: &ActuatorsConfig) -> Self {
        Self {
            capsule_channels: config.capsules.clone(),
            cup_channel: config.cup_channel,
            timing: config.timing.clone(),
        }
    }
}

impl ActuatorDriver for SimulatedActuator {
    fn dispense_ingredient(&self, product_name: &str, quantity: u32) -> Result<()> {
        let channel = *self.capsule_channels.get(product_name).ok_or_else(|| {
            DispenserError::DispenseFailure {
                message: format!("no servo channel configured for '{}'", product_name),
            }
        })?;

        for n in 1..=quantity {
            tracing::debug!("servo {} -> min ({} {}/{})", channel, product_name, n, quantity);
            sleep(Duration::from_millis(self.timing.capsule_press_ms));
            tracing::debug!("servo {} -> max", channel);
            sleep(Duration::from_millis(self.timing.capsule_release_ms));
        }
        Ok(())
    }

    fn dispense_cups(&self, quantity: u32) -> Result<()> {
        let channel = self.cup_channel;

        for n in 1..=quantity {
            tracing::debug!("servo {} -> -90° (cup {}/{})", channel, n, quantity);
            sleep(Duration::from_millis(self.timing.cup_open_ms));
            // 抖動讓杯子脫離疊杯
            for _ in 0..self.timing.cup_shakes {
                sleep(Duration::from_millis(self.timing.cup_shake_ms));
                sleep(Duration::from_millis(self.timing.cup_shake_ms));
            }
            tracing::debug!("servo {} -> 90°", channel);
            sleep(Duration::from_millis(self.timing.cup_close_ms));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn instant_config() -> ActuatorsConfig {
        ActuatorsConfig {
            timing: ServoTimingConfig {
                capsule_press_ms: 0,
                capsule_release_ms: 0,
                cup_open_ms: 0,
                cup_shake_ms: 0,
                cup_shakes: 5,
                cup_close_ms: 0,
            },
            ..ActuatorsConfig::default()
        }
    }

    #[test]
    fn test_unknown_product_is_dispense_failure() {
        let actuator = SimulatedActuator::new(&instant_config());

        let err = actuator.dispense_ingredient("Unknown", 1).unwrap_err();
        assert!(matches!(err, DispenserError::DispenseFailure { .. }));
    }

    #[test]
    fn test_dispense_blocks_for_each_unit() {
        let mut config = instant_config();
        config.timing.capsule_press_ms = 10;
        config.timing.capsule_release_ms = 10;
        let actuator = SimulatedActuator::new(&config);

        let started = Instant::now();
        actuator.dispense_ingredient("Ristretto", 3).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(60));

        assert!(actuator.dispense_cups(0).is_ok());
    }
}
