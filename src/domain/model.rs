use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Bearer token 與其取得時間
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(value: String, issued_at: DateTime<Utc>) -> Self {
        Self { value, issued_at }
    }

    /// 超過 `issued_at + ttl` 才算過期；到期時間超出可表示範圍時視為永不過期
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.issued_at.checked_add_signed(ttl) {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "name")]
    pub product_name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    #[serde(rename = "_id")]
    pub internal_id: String,
    #[serde(rename = "kds_items", default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispenseRequest {
    Ingredient { product_name: String, quantity: u32 },
    Cups { quantity: u32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub auth: LoginAuth,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginAuth {
    pub access: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub device: &'a str,
    pub os: &'a str,
    pub imei: &'a str,
    pub protocol: &'a str,
    pub language: &'a str,
    pub version: &'a str,
    pub pdr_app_type: &'a str,
    pub auth: LoginCredentials<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BumpRequest<'a> {
    pub kds_order_id: &'a str,
}

// KDS 有時以數字、有時以字串回傳 order_id
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "order_id must be a string or number, got {}",
            other
        ))),
    }
}
