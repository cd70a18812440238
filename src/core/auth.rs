use crate::config::toml_config::{CredentialsConfig, DeviceConfig};
use crate::config::DispenserConfig;
use crate::core::{AuthToken, Clock};
use crate::domain::model::{LoginCredentials, LoginRequest, LoginResponse};
use crate::utils::error::{DispenserError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// 取得並快取 KDS 的 bearer token
///
/// 過期時在呼叫端的路徑上同步重新登入。快取鎖在登入期間持有，
/// 同時間只會有一個登入請求，其他呼叫者等待並沿用其結果。
pub struct AuthTokenProvider {
    client: Client,
    login_url: String,
    credentials: CredentialsConfig,
    device: DeviceConfig,
    ttl: chrono::Duration,
    timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<AuthToken>>,
}

impl AuthTokenProvider {
    pub fn new(client: Client, config: &DispenserConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            login_url: config.server.login_url.clone(),
            credentials: config.credentials.clone(),
            device: config.device.clone(),
            ttl: config.timing.token_ttl(),
            timeout: config.request_timeout(),
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Returns a fresh token, logging in first when none is cached or the cached one expired.
    ///
    /// A failed login is logged and the previous token (possibly stale, possibly absent)
    /// is returned; the downstream request surfaces the authorization failure.
    pub async fn get_token(&self) -> Option<AuthToken> {
        let mut cached = self.cached.lock().await;

        let needs_login = match cached.as_ref() {
            Some(token) => token.is_expired(self.clock.now(), self.ttl),
            None => true,
        };

        if needs_login {
            tracing::info!("🔑 Logging in to KDS...");
            match self.login().await {
                Ok(value) => {
                    tracing::debug!("Token acquired");
                    *cached = Some(AuthToken::new(value, self.clock.now()));
                }
                Err(e) => {
                    tracing::error!("❌ {}", e);
                    if cached.is_some() {
                        tracing::warn!("⚠️ Falling back to previous token");
                    }
                }
            }
        }

        cached.as_ref().cloned()
    }

    async fn login(&self) -> Result<String> {
        let body = LoginRequest {
            device: &self.device.device,
            os: &self.device.os,
            imei: &self.device.imei,
            protocol: &self.device.protocol,
            language: &self.device.language,
            version: &self.device.version,
            pdr_app_type: &self.device.app_type,
            auth: LoginCredentials {
                username: &self.credentials.username,
                password: &self.credentials.password,
            },
        };

        let mut request = self.client.post(&self.login_url).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| DispenserError::AuthFailure {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(DispenserError::AuthFailure {
                message: format!("login returned status {}", response.status()),
            });
        }

        let login: LoginResponse =
            response
                .json()
                .await
                .map_err(|e| DispenserError::AuthFailure {
                    message: format!("response has no auth.access: {}", e),
                })?;

        Ok(login.auth.access)
    }
}
